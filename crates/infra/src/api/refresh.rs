//! Refresh endpoint client
//!
//! Talks to the bare [`Transport`] underneath the middleware pipeline, so a
//! 401 from the refresh endpoint is a refresh failure and never triggers
//! another refresh.

use std::sync::Arc;

use async_trait::async_trait;
use marketlink_core::http::{ApiRequest, HttpMethod, Transport};
use marketlink_core::session::TokenRefresher;
use marketlink_domain::{MarketLinkError, RefreshRequest, Result, TokenGrant};
use tracing::{debug, instrument};

use crate::errors::InfraError;

/// [`TokenRefresher`] posting `{ refreshToken }` to the refresh endpoint
pub struct HttpRefreshClient {
    transport: Arc<dyn Transport>,
    refresh_path: String,
}

impl HttpRefreshClient {
    pub fn new(transport: Arc<dyn Transport>, refresh_path: impl Into<String>) -> Self {
        Self { transport, refresh_path: refresh_path.into() }
    }
}

#[async_trait]
impl TokenRefresher for HttpRefreshClient {
    #[instrument(skip_all, fields(path = %self.refresh_path))]
    async fn refresh(&self, refresh_token: &str) -> Result<TokenGrant> {
        let body = serde_json::to_value(RefreshRequest { refresh_token: refresh_token.to_string() })
            .map_err(|err| MarketLinkError::from(InfraError::from(err)))?;
        let request = ApiRequest::new(HttpMethod::Post, self.refresh_path.clone()).with_body(body);

        let response = self.transport.send(request).await?;
        if !response.is_success() {
            debug!(status = response.status, "refresh endpoint rejected the refresh token");
            return Err(MarketLinkError::Auth(format!(
                "session refresh rejected with HTTP {}",
                response.status
            )));
        }

        response
            .json::<TokenGrant>()
            .map_err(|err| MarketLinkError::Auth(format!("malformed refresh response: {err}")))
    }
}
