//! Session middlewares
//!
//! [`BearerAuth`] attaches the stored access token. [`SessionRefresh`] turns
//! a 401 into at most one refresh-and-retry per request.

use std::sync::Arc;

use async_trait::async_trait;
use marketlink_domain::Result;
use tracing::debug;

use super::manager::{Renewal, SessionManager};
use crate::http::{ApiRequest, ApiResponse, Middleware, Next};

/// Adds `Authorization: Bearer <access token>` when a token is stored.
pub struct BearerAuth {
    session: Arc<SessionManager>,
}

impl BearerAuth {
    pub fn new(session: Arc<SessionManager>) -> Self {
        Self { session }
    }
}

#[async_trait]
impl Middleware for BearerAuth {
    async fn handle(&self, mut request: ApiRequest, next: Next<'_>) -> Result<ApiResponse> {
        if let Some(token) = self.session.access_token().await? {
            request.set_bearer(&token);
        }
        next.run(request).await
    }
}

/// Refreshes the session on a 401 and re-issues the request once.
///
/// Surfaces the response unchanged when the request was already retried,
/// when the path is exempt, or when no refresh token is stored.
pub struct SessionRefresh {
    session: Arc<SessionManager>,
}

impl SessionRefresh {
    pub fn new(session: Arc<SessionManager>) -> Self {
        Self { session }
    }
}

#[async_trait]
impl Middleware for SessionRefresh {
    async fn handle(&self, mut request: ApiRequest, next: Next<'_>) -> Result<ApiResponse> {
        let response = next.run(request.clone()).await?;

        if !response.is_unauthorized() || request.retried || self.session.is_exempt(request.route())
        {
            return Ok(response);
        }

        request.retried = true;
        match self.session.renew(request.bearer_token()).await? {
            Renewal::Retry { access_token } => {
                debug!(request_id = %request.id, route = request.route(), "re-issuing after 401");
                request.set_bearer(&access_token);
                next.run(request).await
            }
            Renewal::SignedOut => Ok(response),
        }
    }
}
