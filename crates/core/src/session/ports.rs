//! Port interfaces for session handling
//!
//! These traits define the boundaries between the session logic and the
//! infrastructure that persists credentials, talks to the refresh endpoint,
//! and moves the UI to a signed-out view.

use async_trait::async_trait;
use marketlink_domain::{Result, StoredSession, TokenGrant};

/// Client-local persisted storage for the session
///
/// Last writer wins; callers do read-modify-write with [`load`] and
/// [`save`].
///
/// [`load`]: CredentialStore::load
/// [`save`]: CredentialStore::save
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Current stored session; an empty session when nothing is stored
    async fn load(&self) -> Result<StoredSession>;

    /// Replace the stored session
    async fn save(&self, session: &StoredSession) -> Result<()>;

    /// Remove tokens and the cached user
    async fn clear(&self) -> Result<()>;
}

/// Exchanges a refresh token for new credentials
///
/// Implementations must not route through the session middleware: a 401
/// from the refresh endpoint is a refresh failure, never a reason to
/// refresh again.
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    async fn refresh(&self, refresh_token: &str) -> Result<TokenGrant>;
}

/// Moves the client to an unauthenticated route
pub trait Navigator: Send + Sync {
    fn redirect(&self, route: &str);
}
