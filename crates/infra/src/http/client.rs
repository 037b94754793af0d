use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use marketlink_core::http::{ApiRequest, ApiResponse, HttpMethod, Transport};
use marketlink_domain::{ApiConfig, MarketLinkError, Result};
use reqwest::{Client as ReqwestClient, Method, Response};
use tracing::debug;

use crate::errors::InfraError;

/// reqwest-backed [`Transport`] bound to one base URL.
///
/// Sends exactly once: a network failure is returned, never retried.
#[derive(Clone)]
pub struct HttpClient {
    client: ReqwestClient,
    base_url: String,
}

impl HttpClient {
    /// Start building a new HTTP client.
    pub fn builder(base_url: impl Into<String>) -> HttpClientBuilder {
        HttpClientBuilder::new(base_url)
    }

    /// Client configured from the `api` section.
    ///
    /// # Errors
    /// Returns `MarketLinkError::Config` when reqwest rejects the settings.
    pub fn from_config(config: &ApiConfig) -> Result<Self> {
        Self::builder(config.base_url.clone())
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .build()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for `path` under the base URL.
    pub fn url_for(&self, path: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        if path.starts_with('/') {
            format!("{base}{path}")
        } else {
            format!("{base}/{path}")
        }
    }

    async fn into_api_response(response: Response) -> Result<ApiResponse> {
        let status = response.status().as_u16();
        let headers: BTreeMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value.to_str().ok().map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();
        let body = response.bytes().await.map_err(|err| MarketLinkError::from(InfraError::from(err)))?;

        Ok(ApiResponse { status, headers, body: body.to_vec() })
    }
}

#[async_trait]
impl Transport for HttpClient {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        let url = self.url_for(&request.path);
        let method = to_reqwest_method(request.method);

        let mut builder = self.client.request(method.clone(), &url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        debug!(request_id = %request.id, %method, %url, retried = request.retried, "sending HTTP request");

        match builder.send().await {
            Ok(response) => {
                let status = response.status();
                debug!(request_id = %request.id, %method, %url, %status, "received HTTP response");
                Self::into_api_response(response).await
            }
            Err(err) => {
                debug!(request_id = %request.id, %method, %url, error = %err, "HTTP request failed");
                let infra: InfraError = err.into();
                Err(MarketLinkError::from(infra))
            }
        }
    }
}

const fn to_reqwest_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Delete => Method::DELETE,
    }
}

/// Builder for [`HttpClient`].
#[derive(Debug)]
pub struct HttpClientBuilder {
    base_url: String,
    timeout: Duration,
    user_agent: Option<String>,
    default_headers: Option<reqwest::header::HeaderMap>,
}

impl HttpClientBuilder {
    fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(marketlink_domain::constants::DEFAULT_TIMEOUT_SECS),
            user_agent: None,
            default_headers: None,
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    pub fn default_headers(mut self, headers: reqwest::header::HeaderMap) -> Self {
        self.default_headers = Some(headers);
        self
    }

    /// # Errors
    /// Returns `MarketLinkError::Config` when reqwest rejects the settings.
    pub fn build(self) -> Result<HttpClient> {
        let mut builder = ReqwestClient::builder().timeout(self.timeout).no_proxy();

        if let Some(agent) = self.user_agent {
            builder = builder.user_agent(agent);
        }

        if let Some(headers) = self.default_headers {
            builder = builder.default_headers(headers);
        }

        let client = builder.build().map_err(|err| {
            let infra: InfraError = err.into();
            MarketLinkError::from(infra)
        })?;

        Ok(HttpClient { client, base_url: self.base_url })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[tokio::test]
    async fn sends_method_path_query_headers_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/jobs"))
            .and(query_param("draft", "true"))
            .and(header("authorization", "Bearer at1"))
            .and(body_json(json!({ "title": "Logo design" })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": "job-1" })))
            .expect(1)
            .mount(&server)
            .await;

        let client = HttpClient::builder(format!("{}/api/", server.uri())).build().unwrap();
        let request = ApiRequest::new(HttpMethod::Post, "/jobs")
            .with_query("draft", "true")
            .with_header("Authorization", "Bearer at1")
            .with_body(json!({ "title": "Logo design" }));

        let response = client.send(request).await.unwrap();

        assert_eq!(response.status, 201);
        let body: serde_json::Value = response.json().unwrap();
        assert_eq!(body["id"], "job-1");
    }

    #[tokio::test]
    async fn error_statuses_are_responses_not_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .expect(1)
            .mount(&server)
            .await;

        let client = HttpClient::builder(server.uri()).build().unwrap();
        let response = client.send(ApiRequest::new(HttpMethod::Get, "/gigs")).await.unwrap();

        assert_eq!(response.status, 500);
        assert_eq!(response.text(), "boom");
    }

    #[tokio::test]
    async fn connection_failure_is_a_network_error() {
        let client = HttpClient::builder("http://127.0.0.1:9").build().unwrap();

        let err = client.send(ApiRequest::new(HttpMethod::Get, "/jobs")).await.unwrap_err();

        assert!(matches!(err, MarketLinkError::Network(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn user_agent_from_config() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header("user-agent", "marketlink-test/1.0"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let mut config = ApiConfig::new(server.uri());
        config.user_agent = "marketlink-test/1.0".into();
        let client = HttpClient::from_config(&config).unwrap();

        let response = client.send(ApiRequest::new(HttpMethod::Get, "/health")).await.unwrap();
        assert!(response.is_empty());
    }

    #[test]
    fn joins_paths_onto_base_url() {
        let client = HttpClient::builder("https://api.example.com/v1/").build().unwrap();

        assert_eq!(client.url_for("/jobs"), "https://api.example.com/v1/jobs");
        assert_eq!(client.url_for("jobs/1"), "https://api.example.com/v1/jobs/1");
        assert_eq!(client.base_url(), "https://api.example.com/v1/");
    }
}
