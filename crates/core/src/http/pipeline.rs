//! Middleware pipeline around a base transport
//!
//! Each [`Middleware`] receives the request and a [`Next`] continuation that
//! runs the remaining middlewares and finally the [`Transport`]. `Next` is
//! `Copy`, so a middleware may run the rest of the chain more than once
//! (the session layer does this to re-issue a request after a refresh).

use std::sync::Arc;

use async_trait::async_trait;
use marketlink_domain::Result;

use super::message::{ApiRequest, ApiResponse};

/// Sends a request over the wire
///
/// Returns `Ok` for every HTTP status. `Err` means no response was received
/// (connection failure, timeout).
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse>;
}

/// Request/response transformer composed around a transport
#[async_trait]
pub trait Middleware: Send + Sync {
    async fn handle(&self, request: ApiRequest, next: Next<'_>) -> Result<ApiResponse>;
}

/// The remainder of a pipeline, as seen from one middleware
#[derive(Clone, Copy)]
pub struct Next<'a> {
    transport: &'a dyn Transport,
    middlewares: &'a [Arc<dyn Middleware>],
}

impl<'a> Next<'a> {
    /// Run the remaining middlewares, then the transport.
    ///
    /// # Errors
    /// Propagates whatever the remaining chain returns.
    pub async fn run(self, request: ApiRequest) -> Result<ApiResponse> {
        match self.middlewares.split_first() {
            Some((current, rest)) => {
                current.handle(request, Next { transport: self.transport, middlewares: rest }).await
            }
            None => self.transport.send(request).await,
        }
    }
}

/// Ordered middlewares wrapped around a transport
///
/// The first middleware added is the outermost one.
#[derive(Clone)]
pub struct Pipeline {
    transport: Arc<dyn Transport>,
    middlewares: Vec<Arc<dyn Middleware>>,
}

impl Pipeline {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport, middlewares: Vec::new() }
    }

    #[must_use]
    pub fn with(mut self, middleware: Arc<dyn Middleware>) -> Self {
        self.middlewares.push(middleware);
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.middlewares.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.middlewares.is_empty()
    }

    /// Send `request` through every middleware and the transport.
    ///
    /// # Errors
    /// Returns the first error produced by a middleware or the transport.
    pub async fn execute(&self, request: ApiRequest) -> Result<ApiResponse> {
        Next { transport: self.transport.as_ref(), middlewares: &self.middlewares }
            .run(request)
            .await
    }
}

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;

    use super::*;
    use crate::http::HttpMethod;
    use crate::testing::ScriptedTransport;

    /// Appends its tag to `x-trail` on the way in and records it on the way out.
    struct Tagger {
        tag: &'static str,
        unwound: Arc<Mutex<Vec<&'static str>>>,
    }

    #[async_trait]
    impl Middleware for Tagger {
        async fn handle(&self, mut request: ApiRequest, next: Next<'_>) -> Result<ApiResponse> {
            let trail = request.header("x-trail").map(str::to_owned).unwrap_or_default();
            request.set_header("x-trail", format!("{trail}{}", self.tag));
            let response = next.run(request).await;
            self.unwound.lock().push(self.tag);
            response
        }
    }

    /// Runs the rest of the chain twice and returns the second response.
    struct Twice;

    #[async_trait]
    impl Middleware for Twice {
        async fn handle(&self, request: ApiRequest, next: Next<'_>) -> Result<ApiResponse> {
            next.run(request.clone()).await?;
            next.run(request).await
        }
    }

    #[tokio::test]
    async fn middlewares_run_outermost_first() {
        let transport = Arc::new(ScriptedTransport::always(200));
        let unwound = Arc::new(Mutex::new(Vec::new()));
        let pipeline = Pipeline::new(transport.clone())
            .with(Arc::new(Tagger { tag: "a", unwound: unwound.clone() }))
            .with(Arc::new(Tagger { tag: "b", unwound: unwound.clone() }));

        let response = pipeline.execute(ApiRequest::new(HttpMethod::Get, "/jobs")).await.unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(transport.requests()[0].header("x-trail"), Some("ab"));
        assert_eq!(*unwound.lock(), vec!["b", "a"]);
        assert_eq!(pipeline.len(), 2);
    }

    #[tokio::test]
    async fn next_can_be_reused() {
        let transport = Arc::new(ScriptedTransport::always(204));
        let pipeline = Pipeline::new(transport.clone()).with(Arc::new(Twice));

        pipeline.execute(ApiRequest::new(HttpMethod::Delete, "/gigs/1")).await.unwrap();

        assert_eq!(transport.call_count(), 2);
    }

    #[tokio::test]
    async fn empty_pipeline_goes_straight_to_transport() {
        let transport = Arc::new(ScriptedTransport::always(404));
        let pipeline = Pipeline::new(transport.clone());

        let response = pipeline.execute(ApiRequest::new(HttpMethod::Get, "/nope")).await.unwrap();

        assert!(pipeline.is_empty());
        assert_eq!(response.status, 404);
        assert_eq!(transport.call_count(), 1);
    }
}
