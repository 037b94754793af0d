//! Session state and the single-flight token refresh
//!
//! - [`ports`]: storage, refresh, and navigation boundaries
//! - [`manager`]: [`SessionManager`], owner of tokens and the refresh slot
//! - [`middleware`]: bearer attachment and 401 handling for the pipeline
//! - [`store`]: in-memory [`CredentialStore`]

pub mod manager;
pub mod middleware;
pub mod ports;
pub mod store;

pub use manager::{Renewal, SessionManager};
pub use middleware::{BearerAuth, SessionRefresh};
pub use ports::{CredentialStore, Navigator, TokenRefresher};
pub use store::MemoryCredentialStore;
