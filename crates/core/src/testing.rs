//! Test doubles for the HTTP and session ports
//!
//! Compiled for this crate's tests and, with the `test-utils` feature, for
//! downstream crates.

use std::time::Duration;

use async_trait::async_trait;
use marketlink_domain::{MarketLinkError, Result, TokenGrant};
use parking_lot::Mutex;

use crate::http::{ApiRequest, ApiResponse, Transport};
use crate::session::{Navigator, TokenRefresher};

type Responder = dyn Fn(&ApiRequest) -> Result<ApiResponse> + Send + Sync;

/// Transport answering from a closure and recording every request it sees
pub struct ScriptedTransport {
    responder: Box<Responder>,
    delay: Duration,
    requests: Mutex<Vec<ApiRequest>>,
}

impl ScriptedTransport {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&ApiRequest) -> Result<ApiResponse> + Send + Sync + 'static,
    {
        Self { responder: Box::new(responder), delay: Duration::ZERO, requests: Mutex::new(Vec::new()) }
    }

    /// Answer every request with an empty response of `status`.
    pub fn always(status: u16) -> Self {
        Self::new(move |_| Ok(ApiResponse::new(status)))
    }

    /// Fail every request as if the connection dropped.
    pub fn unreachable() -> Self {
        Self::new(|_| Err(MarketLinkError::Network("connection refused".into())))
    }

    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().len()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        self.requests.lock().push(request.clone());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        (self.responder)(&request)
    }
}

/// Refresher with a fixed outcome that counts its calls
pub struct StubRefresher {
    outcome: Result<TokenGrant>,
    delay: Duration,
    seen: Mutex<Vec<String>>,
}

impl StubRefresher {
    /// Grants `access_token`, rotating the refresh token when one is given.
    pub fn granting(access_token: &str, refresh_token: Option<&str>) -> Self {
        Self::with_outcome(Ok(TokenGrant {
            access_token: access_token.to_string(),
            refresh_token: refresh_token.map(str::to_string),
        }))
    }

    pub fn failing(error: MarketLinkError) -> Self {
        Self::with_outcome(Err(error))
    }

    fn with_outcome(outcome: Result<TokenGrant>) -> Self {
        Self { outcome, delay: Duration::ZERO, seen: Mutex::new(Vec::new()) }
    }

    /// Hold each refresh open for `delay` before answering.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.seen.lock().len()
    }

    /// Refresh tokens presented, in call order.
    pub fn seen_tokens(&self) -> Vec<String> {
        self.seen.lock().clone()
    }
}

#[async_trait]
impl TokenRefresher for StubRefresher {
    async fn refresh(&self, refresh_token: &str) -> Result<TokenGrant> {
        self.seen.lock().push(refresh_token.to_string());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.outcome.clone()
    }
}

/// Navigator that records the routes it was sent to
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    routes: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn routes(&self) -> Vec<String> {
        self.routes.lock().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn redirect(&self, route: &str) {
        self.routes.lock().push(route.to_string());
    }
}
