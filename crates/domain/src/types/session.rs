//! Session credential types
//!
//! Wire names are camelCase to match the backend (`accessToken`,
//! `refreshToken`). `Debug` output redacts token values.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::user::UserRecord;

const REDACTED: &str = "<redacted>";

/// Access token plus the refresh token it can be renewed with
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialPair {
    pub access_token: String,
    pub refresh_token: String,
}

impl CredentialPair {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self { access_token: access_token.into(), refresh_token: refresh_token.into() }
    }
}

impl fmt::Debug for CredentialPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialPair")
            .field("access_token", &REDACTED)
            .field("refresh_token", &REDACTED)
            .finish()
    }
}

/// Body sent to the refresh endpoint
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

impl fmt::Debug for RefreshRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefreshRequest").field("refresh_token", &REDACTED).finish()
    }
}

/// Tokens issued by the refresh or login endpoints
///
/// The backend may omit `refreshToken`, in which case the stored one stays
/// valid.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenGrant {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

impl TokenGrant {
    /// Combine with the refresh token that was exchanged for this grant.
    #[must_use]
    pub fn into_credentials(self, previous_refresh_token: &str) -> CredentialPair {
        CredentialPair {
            access_token: self.access_token,
            refresh_token: self.refresh_token.unwrap_or_else(|| previous_refresh_token.to_string()),
        }
    }
}

impl fmt::Debug for TokenGrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenGrant")
            .field("access_token", &REDACTED)
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| REDACTED))
            .finish()
    }
}

/// Everything client-local storage holds for one session
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredSession {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl StoredSession {
    /// Session holding a fresh credential pair.
    #[must_use]
    pub fn with_credentials(credentials: &CredentialPair) -> Self {
        let mut session = Self::default();
        session.apply_credentials(credentials);
        session
    }

    /// Overwrite both tokens and stamp the update time.
    pub fn apply_credentials(&mut self, credentials: &CredentialPair) {
        self.access_token = Some(credentials.access_token.clone());
        self.refresh_token = Some(credentials.refresh_token.clone());
        self.updated_at = Some(Utc::now());
    }

    /// Both tokens, when both are present.
    #[must_use]
    pub fn credentials(&self) -> Option<CredentialPair> {
        match (&self.access_token, &self.refresh_token) {
            (Some(access), Some(refresh)) => Some(CredentialPair::new(access, refresh)),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.access_token.is_none() && self.refresh_token.is_none() && self.user.is_none()
    }
}

impl fmt::Debug for StoredSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoredSession")
            .field("access_token", &self.access_token.as_ref().map(|_| REDACTED))
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| REDACTED))
            .field("user", &self.user)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grant_without_refresh_token_keeps_previous_one() {
        let grant: TokenGrant = serde_json::from_str(r#"{ "accessToken": "at2" }"#).unwrap();
        let credentials = grant.into_credentials("rt1");

        assert_eq!(credentials, CredentialPair::new("at2", "rt1"));
    }

    #[test]
    fn grant_with_refresh_token_replaces_it() {
        let grant: TokenGrant =
            serde_json::from_str(r#"{ "accessToken": "at2", "refreshToken": "rt2" }"#).unwrap();

        assert_eq!(grant.into_credentials("rt1"), CredentialPair::new("at2", "rt2"));
    }

    #[test]
    fn refresh_request_uses_camel_case() {
        let body = serde_json::to_value(RefreshRequest { refresh_token: "rt1".into() }).unwrap();
        assert_eq!(body, serde_json::json!({ "refreshToken": "rt1" }));
    }

    #[test]
    fn debug_output_never_contains_tokens() {
        let session = StoredSession::with_credentials(&CredentialPair::new("secret-a", "secret-r"));
        let rendered = format!("{session:?} {:?}", session.credentials());

        assert!(!rendered.contains("secret-a"));
        assert!(!rendered.contains("secret-r"));
        assert!(rendered.contains(REDACTED));
    }

    #[test]
    fn credentials_require_both_tokens() {
        let session = StoredSession { access_token: Some("at".into()), ..Default::default() };

        assert!(session.credentials().is_none());
        assert!(!session.is_empty());
        assert!(StoredSession::default().is_empty());
    }
}
