//! Domain types and models

pub mod resource;
pub mod session;
pub mod user;

pub use resource::{ListResponse, Resource};
pub use session::{CredentialPair, RefreshRequest, StoredSession, TokenGrant};
pub use user::{UserRecord, UserRole};
