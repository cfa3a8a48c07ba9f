//! Credential store adapters.
//!
//! - `FileCredentialStore`: JSON file keyed by `token`, owner-only on Unix,
//!   replaced atomically on save
//! - `MemoryCredentialStore`: process-local, for tests and `--no-persist`
//!
//! # Mutex Behavior
//!
//! The memory store recovers from a poisoned lock instead of panicking; the
//! stored value is a single `Option` and cannot be left half-written.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tempfile::NamedTempFile;
use zeroize::Zeroizing;

use crate::domain::Credential;
use crate::ports::{CredentialStore, CREDENTIAL_KEY};

/// Error type for credential store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Credential file I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Credential file {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl From<std::convert::Infallible> for StoreError {
    fn from(never: std::convert::Infallible) -> Self {
        match never {}
    }
}

/// Credential persisted as `{"token": "..."}` in a local file.
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_err(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl CredentialStore for FileCredentialStore {
    type Error = StoreError;

    fn load(&self) -> Result<Option<Credential>, Self::Error> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => Zeroizing::new(raw),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io_err(e)),
        };
        if raw.trim().is_empty() {
            return Ok(None);
        }

        let mut entries: BTreeMap<String, String> =
            serde_json::from_str(&raw).map_err(|source| StoreError::Corrupt {
                path: self.path.clone(),
                source,
            })?;
        Ok(entries.remove(CREDENTIAL_KEY).and_then(Credential::new))
    }

    fn save(&self, credential: &Credential) -> Result<(), Self::Error> {
        let dir = match self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(parent) => {
                fs::create_dir_all(parent).map_err(|e| self.io_err(e))?;
                parent
            }
            None => Path::new("."),
        };

        let mut entries = BTreeMap::new();
        entries.insert(CREDENTIAL_KEY, credential.expose());
        let body = Zeroizing::new(serde_json::to_string(&entries).map_err(|source| {
            StoreError::Corrupt {
                path: self.path.clone(),
                source,
            }
        })?);

        // Sibling temp file so the rename stays on one filesystem.
        let mut file = NamedTempFile::new_in(dir).map_err(|e| self.io_err(e))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(file.path(), fs::Permissions::from_mode(0o600))
                .map_err(|e| self.io_err(e))?;
        }
        file.write_all(body.as_bytes()).map_err(|e| self.io_err(e))?;
        file.as_file().sync_all().map_err(|e| self.io_err(e))?;
        file.persist(&self.path).map_err(|e| self.io_err(e.error))?;
        Ok(())
    }

    fn clear(&self) -> Result<(), Self::Error> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_err(e)),
        }
    }
}

/// Credential held only for the life of the process.
#[derive(Default)]
pub struct MemoryCredentialStore {
    slot: Mutex<Option<Credential>>,
}

impl MemoryCredentialStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with a credential.
    #[must_use]
    pub fn with(credential: Credential) -> Self {
        Self {
            slot: Mutex::new(Some(credential)),
        }
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<Credential>> {
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl CredentialStore for MemoryCredentialStore {
    type Error = std::convert::Infallible;

    fn load(&self) -> Result<Option<Credential>, Self::Error> {
        Ok(self.slot().clone())
    }

    fn save(&self, credential: &Credential) -> Result<(), Self::Error> {
        *self.slot() = Some(credential.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), Self::Error> {
        *self.slot() = None;
        Ok(())
    }
}
