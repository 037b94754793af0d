//! Authenticated API client
//!
//! Every call runs through the middleware pipeline
//! `[BearerAuth, SessionRefresh] -> HttpClient`: the stored access token is
//! attached and a 401 triggers at most one shared session refresh followed
//! by a single re-issue of the call.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use marketlink_core::http::{ApiRequest, ApiResponse, HttpMethod, Pipeline, Transport};
use marketlink_core::session::{
    BearerAuth, CredentialStore, MemoryCredentialStore, Navigator, SessionManager,
    SessionRefresh, TokenRefresher,
};
use marketlink_domain::Config;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, instrument};

use super::errors::ApiError;
use super::refresh::HttpRefreshClient;
use crate::http::HttpClient;
use crate::storage::FileCredentialStore;

/// Longest response body excerpt kept in an error message
const ERROR_BODY_LIMIT: usize = 512;

/// Per-call options
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    /// Deadline for the whole call, including a refresh and the re-issue
    pub timeout: Option<Duration>,
}

impl RequestOptions {
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// API client with bearer authentication and session refresh
pub struct ApiClient {
    pipeline: Pipeline,
    session: Arc<SessionManager>,
}

impl ApiClient {
    /// Create a builder for fluent configuration
    pub fn builder(config: Config) -> ApiClientBuilder {
        ApiClientBuilder::new(config)
    }

    /// Client with the stores and ports implied by `config`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Config` if the configuration is invalid.
    pub fn from_config(config: Config) -> Result<Self, ApiError> {
        Self::builder(config).build()
    }

    /// Session shared by every call made through this client
    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    /// Send a call and decode its 2xx body.
    ///
    /// Empty bodies (including 204/205) decode from JSON `null`.
    ///
    /// # Errors
    ///
    /// - `ApiError::Network` when no response arrived
    /// - the status category for a non-2xx response (a 401 only after the
    ///   refresh-and-retry protocol gave up on it)
    /// - the refresh error when the session could not be renewed
    /// - `ApiError::Decode` when the body does not match `R`
    #[instrument(skip(self, body, options), fields(method = %method, path = %path))]
    pub async fn request<B, R>(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&B>,
        options: RequestOptions,
    ) -> Result<R, ApiError>
    where
        B: Serialize + ?Sized + Sync,
        R: DeserializeOwned,
    {
        let mut request = ApiRequest::new(method, path);
        if let Some(body) = body {
            let value = serde_json::to_value(body)
                .map_err(|e| ApiError::Internal(format!("Failed to serialize body: {e}")))?;
            request = request.with_body(value);
        }
        for (key, value) in options.query {
            request = request.with_query(key, value);
        }
        for (name, value) in &options.headers {
            request.set_header(name, value.clone());
        }

        let response = self.execute(request, options.timeout).await?;

        response.json().map_err(|e| ApiError::Decode(format!("{method} {path}: {e}")))
    }

    /// Run a prepared request through the pipeline.
    ///
    /// # Errors
    ///
    /// Same as [`ApiClient::request`], minus decoding.
    pub async fn execute(
        &self,
        request: ApiRequest,
        timeout: Option<Duration>,
    ) -> Result<ApiResponse, ApiError> {
        let request_id = request.id;
        let method = request.method;
        let path = request.path.clone();

        let outcome = match timeout {
            Some(limit) => tokio::time::timeout(limit, self.pipeline.execute(request))
                .await
                .map_err(|_| ApiError::Timeout(limit))?,
            None => self.pipeline.execute(request).await,
        };
        let response = outcome?;

        if !response.is_success() {
            debug!(%request_id, status = response.status, "request failed");
            return Err(map_status_error(method, &path, &response));
        }

        debug!(%request_id, status = response.status, "request successful");
        Ok(response)
    }

    /// Execute a GET request
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn get<R: DeserializeOwned>(&self, path: &str) -> Result<R, ApiError> {
        self.request::<(), R>(HttpMethod::Get, path, None, RequestOptions::default()).await
    }

    /// Execute a POST request
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn post<T, R>(&self, path: &str, body: &T) -> Result<R, ApiError>
    where
        T: Serialize + ?Sized + Sync,
        R: DeserializeOwned,
    {
        self.request(HttpMethod::Post, path, Some(body), RequestOptions::default()).await
    }

    /// Execute a PUT request
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn put<T, R>(&self, path: &str, body: &T) -> Result<R, ApiError>
    where
        T: Serialize + ?Sized + Sync,
        R: DeserializeOwned,
    {
        self.request(HttpMethod::Put, path, Some(body), RequestOptions::default()).await
    }

    /// Execute a PATCH request
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn patch<T, R>(&self, path: &str, body: &T) -> Result<R, ApiError>
    where
        T: Serialize + ?Sized + Sync,
        R: DeserializeOwned,
    {
        self.request(HttpMethod::Patch, path, Some(body), RequestOptions::default()).await
    }

    /// Execute a DELETE request
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn delete<R: DeserializeOwned>(&self, path: &str) -> Result<R, ApiError> {
        self.request::<(), R>(HttpMethod::Delete, path, None, RequestOptions::default()).await
    }
}

fn map_status_error(method: HttpMethod, path: &str, response: &ApiResponse) -> ApiError {
    let detail = error_detail(response);
    let message = if detail.is_empty() {
        format!("{method} {path} returned status {}", response.status)
    } else {
        format!("{method} {path} returned status {}: {detail}", response.status)
    };
    ApiError::from_status(response.status, message)
}

/// `message` (or `error`) from a JSON error body, otherwise the raw text.
fn error_detail(response: &ApiResponse) -> String {
    if let Ok(serde_json::Value::Object(body)) = response.json::<serde_json::Value>() {
        for key in ["message", "error"] {
            if let Some(serde_json::Value::String(text)) = body.get(key) {
                return text.clone();
            }
        }
    }
    let text = response.text();
    let trimmed = text.trim();
    match trimmed.char_indices().nth(ERROR_BODY_LIMIT) {
        Some((cut, _)) => format!("{}...", &trimmed[..cut]),
        None => trimmed.to_string(),
    }
}

/// Builder for API client
pub struct ApiClientBuilder {
    config: Config,
    store: Option<Arc<dyn CredentialStore>>,
    refresher: Option<Arc<dyn TokenRefresher>>,
    navigator: Option<Arc<dyn Navigator>>,
    transport: Option<Arc<dyn Transport>>,
}

impl ApiClientBuilder {
    fn new(config: Config) -> Self {
        Self { config, store: None, refresher: None, navigator: None, transport: None }
    }

    /// Use `store` instead of the one `storage.path` selects
    #[must_use]
    pub fn store(mut self, store: Arc<dyn CredentialStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Use `refresher` instead of calling the configured refresh endpoint
    #[must_use]
    pub fn refresher(mut self, refresher: Arc<dyn TokenRefresher>) -> Self {
        self.refresher = Some(refresher);
        self
    }

    /// Redirect through `navigator` when the session cannot be renewed
    #[must_use]
    pub fn navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    /// Send calls, including the refresh call, through `transport`
    /// instead of reqwest
    #[must_use]
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Build the API client
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Config` if the configuration is invalid or the
    /// HTTP client cannot be created.
    pub fn build(self) -> Result<ApiClient, ApiError> {
        let Self { config, store, refresher, navigator, transport } = self;
        config.validate()?;

        let transport: Arc<dyn Transport> = match transport {
            Some(transport) => transport,
            None => Arc::new(HttpClient::from_config(&config.api)?),
        };

        let store: Arc<dyn CredentialStore> = match (store, &config.storage.path) {
            (Some(store), _) => store,
            (None, Some(path)) => Arc::new(FileCredentialStore::new(PathBuf::from(path))),
            (None, None) => Arc::new(MemoryCredentialStore::new()),
        };
        let refresher: Arc<dyn TokenRefresher> = match refresher {
            Some(refresher) => refresher,
            None => Arc::new(HttpRefreshClient::new(
                transport.clone(),
                config.session.refresh_path.clone(),
            )),
        };

        let mut session = SessionManager::new(store, refresher, config.session.clone());
        if let Some(navigator) = navigator {
            session = session.with_navigator(navigator);
        }
        let session = Arc::new(session);

        let pipeline = Pipeline::new(transport)
            .with(Arc::new(BearerAuth::new(session.clone())))
            .with(Arc::new(SessionRefresh::new(session.clone())));

        info!(
            base_url = %config.api.base_url,
            persistent = config.storage.path.is_some(),
            "API client ready"
        );
        Ok(ApiClient { pipeline, session })
    }
}
