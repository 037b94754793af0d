//! In-memory credential store

use async_trait::async_trait;
use marketlink_domain::{Result, StoredSession};
use parking_lot::RwLock;

use super::ports::CredentialStore;

/// Process-local [`CredentialStore`]; nothing survives a restart
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    session: RwLock<StoredSession>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with `session`.
    pub fn with_session(session: StoredSession) -> Self {
        Self { session: RwLock::new(session) }
    }

    /// Synchronous view of the stored session, for assertions and diagnostics.
    pub fn snapshot(&self) -> StoredSession {
        self.session.read().clone()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn load(&self) -> Result<StoredSession> {
        Ok(self.session.read().clone())
    }

    async fn save(&self, session: &StoredSession) -> Result<()> {
        *self.session.write() = session.clone();
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        *self.session.write() = StoredSession::default();
        Ok(())
    }
}
