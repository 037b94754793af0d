//! Transport-neutral request and response messages
//!
//! Header names are stored lowercase so lookups are case-insensitive.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use marketlink_domain::constants::BEARER_PREFIX;
use serde::de::DeserializeOwned;
use uuid::Uuid;

pub const AUTHORIZATION: &str = "authorization";

/// HTTP method of an outbound call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "PATCH" => Ok(Self::Patch),
            "DELETE" => Ok(Self::Delete),
            _ => Err(format!("Invalid HttpMethod: {s}")),
        }
    }
}

/// An in-flight outbound call
///
/// `retried` is set once the session layer has re-issued the call after a
/// 401; a second 401 on the same request is then surfaced as-is.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub id: Uuid,
    pub method: HttpMethod,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: BTreeMap<String, String>,
    pub body: Option<serde_json::Value>,
    pub retried: bool,
}

impl ApiRequest {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            method,
            path: path.into(),
            query: Vec::new(),
            headers: BTreeMap::new(),
            body: None,
            retried: false,
        }
    }

    #[must_use]
    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    #[must_use]
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_header(name, value);
        self
    }

    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
    }

    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    /// Attach `Authorization: Bearer <token>`, replacing any previous value.
    pub fn set_bearer(&mut self, token: &str) {
        self.set_header(AUTHORIZATION, format!("{BEARER_PREFIX}{token}"));
    }

    /// Token of the `Authorization: Bearer` header, if one is attached.
    #[must_use]
    pub fn bearer_token(&self) -> Option<&str> {
        self.header(AUTHORIZATION).and_then(|value| value.strip_prefix(BEARER_PREFIX))
    }

    /// Path with any inline query string and trailing slash removed.
    #[must_use]
    pub fn route(&self) -> &str {
        let path = self.path.split(['?', '#']).next().unwrap_or_default();
        match path.trim_end_matches('/') {
            "" => "/",
            trimmed => trimmed,
        }
    }
}

/// A response as received from the transport, whatever its status
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub body: Vec<u8>,
}

impl ApiResponse {
    pub fn new(status: u16) -> Self {
        Self { status, headers: BTreeMap::new(), body: Vec::new() }
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// JSON response; the content type header is set accordingly.
    #[must_use]
    pub fn with_json(mut self, value: &serde_json::Value) -> Self {
        self.headers.insert("content-type".into(), "application/json".into());
        self.body = value.to_string().into_bytes();
        self
    }

    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        self.status == 401
    }

    /// Responses that carry no body by definition (204, 205) or an empty one.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.status == 204 || self.status == 205 || self.body.iter().all(u8::is_ascii_whitespace)
    }

    /// Deserialize the body. Empty bodies deserialize from JSON `null`.
    ///
    /// # Errors
    /// Returns the serde error when the body does not match `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        if self.is_empty() {
            serde_json::from_value(serde_json::Value::Null)
        } else {
            serde_json::from_slice(&self.body)
        }
    }

    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_lookup_ignores_case() {
        let request = ApiRequest::new(HttpMethod::Get, "/jobs").with_header("X-Trace", "abc");

        assert_eq!(request.header("x-trace"), Some("abc"));
        assert_eq!(request.header("X-TRACE"), Some("abc"));
    }

    #[test]
    fn set_bearer_replaces_previous_token() {
        let mut request = ApiRequest::new(HttpMethod::Get, "/orders");
        request.set_bearer("at1");
        request.set_bearer("at2");

        assert_eq!(request.header("Authorization"), Some("Bearer at2"));
        assert_eq!(request.bearer_token(), Some("at2"));
        assert_eq!(request.headers.len(), 1);
    }

    #[test]
    fn route_strips_query_and_trailing_slash() {
        assert_eq!(ApiRequest::new(HttpMethod::Get, "/jobs/?page=2").route(), "/jobs");
        assert_eq!(ApiRequest::new(HttpMethod::Post, "/auth/login#x").route(), "/auth/login");
        assert_eq!(ApiRequest::new(HttpMethod::Get, "/").route(), "/");
    }

    #[test]
    fn empty_bodies_deserialize_as_null() {
        assert!(ApiResponse::new(204).json::<()>().is_ok());
        let missing: Option<String> = ApiResponse::new(200).json().unwrap();

        assert!(missing.is_none());
    }

    #[test]
    fn json_bodies_deserialize() {
        let response = ApiResponse::new(200).with_json(&serde_json::json!({ "id": "job-1" }));
        let value: serde_json::Value = response.json().unwrap();

        assert_eq!(value["id"], "job-1");
        assert!(response.is_success());
        assert!(!response.is_unauthorized());
    }

    #[test]
    fn method_names() {
        assert_eq!(HttpMethod::Patch.to_string(), "PATCH");
        assert_eq!("delete".parse::<HttpMethod>().unwrap(), HttpMethod::Delete);
    }
}
