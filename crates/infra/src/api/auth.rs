//! Account and authentication flows
//!
//! Login, registration, email verification and password reset calls. Their
//! paths are exempt from session refresh, so a 401 here is always surfaced
//! to the caller.

use std::fmt;
use std::sync::Arc;

use marketlink_domain::constants::{
    FORGOT_PASSWORD_PATH, LOGIN_PATH, REGISTER_PATH, RESEND_VERIFICATION_PATH,
    RESET_PASSWORD_PATH, VERIFY_EMAIL_PATH,
};
use marketlink_domain::{CredentialPair, UserRecord, UserRole};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use super::client::ApiClient;
use super::errors::ApiError;

/// Credentials posted to the login endpoint
#[derive(Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest").field("email", &self.email).finish_non_exhaustive()
    }
}

/// New account details
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub role: UserRole,
}

impl fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("email", &self.email)
            .field("name", &self.name)
            .field("role", &self.role)
            .finish_non_exhaustive()
    }
}

/// Body returned by login and registration
///
/// Registration may return no tokens when the account needs email
/// verification first.
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub user: Option<UserRecord>,
    #[serde(default)]
    pub message: Option<String>,
}

impl AuthResponse {
    fn credentials(&self) -> Option<CredentialPair> {
        match (&self.access_token, &self.refresh_token) {
            (Some(access), Some(refresh)) => Some(CredentialPair::new(access, refresh)),
            _ => None,
        }
    }
}

impl fmt::Debug for AuthResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthResponse")
            .field("has_tokens", &self.credentials().is_some())
            .field("user", &self.user)
            .field("message", &self.message)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Serialize)]
struct TokenBody<'a> {
    token: &'a str,
}

#[derive(Serialize)]
struct EmailBody<'a> {
    email: &'a str,
}

#[derive(Serialize)]
struct ResetPasswordBody<'a> {
    token: &'a str,
    password: &'a str,
}

/// Authentication service over the shared [`ApiClient`]
pub struct AuthApi {
    client: Arc<ApiClient>,
}

impl AuthApi {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    /// Sign in and persist the returned session.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Auth` for rejected credentials and
    /// `ApiError::Decode` when the response carries no tokens.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn login(&self, email: &str, password: &str) -> Result<Option<UserRecord>, ApiError> {
        let request = LoginRequest { email: email.to_string(), password: password.to_string() };
        let response: AuthResponse = self.client.post(LOGIN_PATH, &request).await?;

        let credentials = response
            .credentials()
            .ok_or_else(|| ApiError::Decode("login response carried no tokens".into()))?;
        self.client.session().establish(&credentials, response.user.clone()).await?;

        info!("Login successful");
        Ok(response.user)
    }

    /// Create an account. The session is established when the backend
    /// returns tokens right away.
    ///
    /// # Errors
    ///
    /// Returns error if API request fails
    #[instrument(skip(self, request), fields(email = %request.email, role = %request.role))]
    pub async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse, ApiError> {
        let response: AuthResponse = self.client.post(REGISTER_PATH, request).await?;

        if let Some(credentials) = response.credentials() {
            self.client.session().establish(&credentials, response.user.clone()).await?;
            info!("Registration successful, session established");
        } else {
            info!("Registration accepted, verification pending");
        }
        Ok(response)
    }

    /// # Errors
    ///
    /// Returns error if the token is rejected or the request fails
    #[instrument(skip_all)]
    pub async fn verify_email(&self, token: &str) -> Result<Option<String>, ApiError> {
        self.post_for_message(VERIFY_EMAIL_PATH, &TokenBody { token }).await
    }

    /// # Errors
    ///
    /// Returns error if API request fails
    #[instrument(skip(self))]
    pub async fn resend_verification(&self, email: &str) -> Result<Option<String>, ApiError> {
        self.post_for_message(RESEND_VERIFICATION_PATH, &EmailBody { email }).await
    }

    /// # Errors
    ///
    /// Returns error if API request fails
    #[instrument(skip(self))]
    pub async fn forgot_password(&self, email: &str) -> Result<Option<String>, ApiError> {
        self.post_for_message(FORGOT_PASSWORD_PATH, &EmailBody { email }).await
    }

    /// # Errors
    ///
    /// Returns error if the reset token is rejected or the request fails
    #[instrument(skip_all)]
    pub async fn reset_password(
        &self,
        token: &str,
        password: &str,
    ) -> Result<Option<String>, ApiError> {
        self.post_for_message(RESET_PASSWORD_PATH, &ResetPasswordBody { token, password }).await
    }

    /// Drop the local session. The backend keeps no server-side session to
    /// revoke.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Storage` if the stored session cannot be removed
    pub async fn logout(&self) -> Result<(), ApiError> {
        self.client.session().logout().await?;
        Ok(())
    }

    /// User cached with the current session, if any.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Storage` if the stored session cannot be read
    pub async fn current_user(&self) -> Result<Option<UserRecord>, ApiError> {
        Ok(self.client.session().cached_user().await?)
    }

    async fn post_for_message<T: Serialize + Sync>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<Option<String>, ApiError> {
        let response: Option<MessageResponse> = self.client.post(path, body).await?;
        Ok(response.and_then(|r| r.message))
    }
}

#[cfg(test)]
mod tests {
    use marketlink_domain::Config;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn auth_for(server: &MockServer) -> AuthApi {
        let client = ApiClient::from_config(Config::for_base_url(server.uri())).unwrap();
        AuthApi::new(Arc::new(client))
    }

    #[tokio::test]
    async fn login_establishes_session() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .and(body_json(json!({ "email": "ana@example.com", "password": "hunter2" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "accessToken": "at1",
                "refreshToken": "rt1",
                "user": { "id": "u-1", "email": "ana@example.com", "role": "freelancer" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let auth = auth_for(&server);
        let user = auth.login("ana@example.com", "hunter2").await.unwrap().unwrap();

        assert_eq!(user.role, UserRole::Freelancer);
        assert_eq!(auth.client.session().access_token().await.unwrap().as_deref(), Some("at1"));
        assert_eq!(auth.current_user().await.unwrap().map(|u| u.id), Some("u-1".into()));
    }

    #[tokio::test]
    async fn rejected_login_is_not_refreshed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({ "message": "Invalid credentials" })),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(path("/auth/refresh"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let auth = auth_for(&server);
        auth.client.session().establish(&CredentialPair::new("at0", "rt0"), None).await.unwrap();

        let err = auth.login("ana@example.com", "wrong").await.unwrap_err();

        assert!(err.is_unauthorized());
        assert!(err.to_string().contains("Invalid credentials"));
        // Blocklisted 401s leave the stored session alone
        assert_eq!(auth.client.session().refresh_token().await.unwrap().as_deref(), Some("rt0"));
    }

    #[tokio::test]
    async fn register_without_tokens_leaves_session_empty() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/register"))
            .and(body_json(json!({ "email": "bo@example.com", "password": "pw", "role": "client" })))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(json!({ "message": "Check your inbox" })),
            )
            .mount(&server)
            .await;

        let auth = auth_for(&server);
        let request = RegisterRequest {
            email: "bo@example.com".into(),
            password: "pw".into(),
            name: None,
            role: UserRole::Client,
        };
        let response = auth.register(&request).await.unwrap();

        assert_eq!(response.message.as_deref(), Some("Check your inbox"));
        assert!(!auth.client.session().is_authenticated().await.unwrap());
    }

    #[tokio::test]
    async fn password_reset_flow() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/forgot-password"))
            .and(body_json(json!({ "email": "ana@example.com" })))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/auth/reset-password"))
            .and(body_json(json!({ "token": "reset-1", "password": "new-pw" })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "message": "Password updated" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let auth = auth_for(&server);

        assert_eq!(auth.forgot_password("ana@example.com").await.unwrap(), None);
        assert_eq!(
            auth.reset_password("reset-1", "new-pw").await.unwrap().as_deref(),
            Some("Password updated")
        );
    }

    #[tokio::test]
    async fn verification_calls() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/verify-email"))
            .and(body_json(json!({ "token": "verify-1" })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "message": "Verified" })),
            )
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/auth/resend-verification"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;

        let auth = auth_for(&server);

        assert_eq!(auth.verify_email("verify-1").await.unwrap().as_deref(), Some("Verified"));
        assert_eq!(auth.resend_verification("ana@example.com").await.unwrap(), None);
    }

    #[tokio::test]
    async fn logout_clears_local_session() {
        let server = MockServer::start().await;
        let auth = auth_for(&server);
        auth.client.session().establish(&CredentialPair::new("at1", "rt1"), None).await.unwrap();

        auth.logout().await.unwrap();

        assert!(!auth.client.session().is_authenticated().await.unwrap());
        assert!(auth.current_user().await.unwrap().is_none());
    }

    #[test]
    fn debug_output_hides_passwords() {
        let request = LoginRequest { email: "ana@example.com".into(), password: "hunter2".into() };

        assert!(!format!("{request:?}").contains("hunter2"));
    }
}
