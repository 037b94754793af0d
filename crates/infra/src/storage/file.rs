//! JSON file credential store
//!
//! The whole session is one JSON document. Writes go to a sibling temp file
//! that is renamed over the target, so readers never see a partial file.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use marketlink_core::session::CredentialStore;
use marketlink_domain::{MarketLinkError, Result, StoredSession};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::errors::InfraError;

/// [`CredentialStore`] persisted to a JSON file
#[derive(Debug)]
pub struct FileCredentialStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), write_lock: Mutex::new(()) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().map(ToOwned::to_owned).unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

fn storage_error(err: impl Into<InfraError>) -> MarketLinkError {
    let infra: InfraError = err.into();
    match MarketLinkError::from(infra) {
        MarketLinkError::InvalidInput(msg) => {
            MarketLinkError::Storage(format!("stored session is corrupt: {msg}"))
        }
        other => other,
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn load(&self) -> Result<StoredSession> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(StoredSession::default()),
            Err(err) => return Err(storage_error(err)),
        };

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(StoredSession::default());
        }

        serde_json::from_slice(&bytes).map_err(storage_error)
    }

    async fn save(&self, session: &StoredSession) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(storage_error)?;
        }

        let contents = serde_json::to_vec_pretty(session).map_err(storage_error)?;
        let temp = self.temp_path();
        tokio::fs::write(&temp, contents).await.map_err(storage_error)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let owner_only = std::fs::Permissions::from_mode(0o600);
            if let Err(err) = tokio::fs::set_permissions(&temp, owner_only).await {
                warn!(error = %err, "could not restrict session file permissions");
            }
        }

        tokio::fs::rename(&temp, &self.path).await.map_err(storage_error)?;
        debug!(path = %self.path.display(), "session saved");
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                debug!(path = %self.path.display(), "session file removed");
                Ok(())
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(storage_error(err)),
        }
    }
}
