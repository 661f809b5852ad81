//! Credential token persistence.
//!
//! DESIGN
//! ======
//! The token is a single opaque string stored under the fixed key
//! [`AUTH_TOKEN_KEY`]. Its absence is the only signal of a logged-out
//! client at startup. The session store is the only writer; the API client
//! reads it before every authenticated call.
//!
//! LIMITATIONS
//! ===========
//! The file store has no cross-process coordination. Two clients sharing a
//! token directory see last-writer-wins and are not notified of changes.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Storage key (file name) of the persisted credential token.
pub const AUTH_TOKEN_KEY: &str = "auth_token";

/// Errors produced by a [`TokenStore`].
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("token storage I/O failed at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("token storage unavailable: {0}")]
    Unavailable(String),
}

/// Durable key-value slot holding the credential token.
pub trait TokenStore: Send + Sync {
    /// Read the token, `None` when absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be read.
    fn get(&self) -> Result<Option<String>, StorageError>;

    /// Persist `token`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be written.
    fn set(&self, token: &str) -> Result<(), StorageError>;

    /// Delete the token. Deleting an absent token is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be modified.
    fn remove(&self) -> Result<(), StorageError>;
}

// =============================================================================
// FILE STORE
// =============================================================================

/// Token persisted as `<dir>/auth_token`.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    #[must_use]
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self { path: dir.as_ref().join(AUTH_TOKEN_KEY) }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StorageError {
        StorageError::Io { path: self.path.clone(), source }
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self) -> Result<Option<String>, StorageError> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => {
                let token = raw.trim();
                Ok((!token.is_empty()).then(|| token.to_owned()))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(self.io_error(e)),
        }
    }

    fn set(&self, token: &str) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        std::fs::write(&self.path, token).map_err(|e| self.io_error(e))
    }

    fn remove(&self) -> Result<(), StorageError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_error(e)),
        }
    }
}

// =============================================================================
// MEMORY STORE
// =============================================================================

/// Process-local token slot. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_token(token: &str) -> Self {
        Self { token: Mutex::new(Some(token.to_owned())) }
    }

    fn slot(&self) -> Result<std::sync::MutexGuard<'_, Option<String>>, StorageError> {
        self.token
            .lock()
            .map_err(|_| StorageError::Unavailable("token mutex poisoned".into()))
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self) -> Result<Option<String>, StorageError> {
        Ok(self.slot()?.clone())
    }

    fn set(&self, token: &str) -> Result<(), StorageError> {
        *self.slot()? = Some(token.to_owned());
        Ok(())
    }

    fn remove(&self) -> Result<(), StorageError> {
        *self.slot()? = None;
        Ok(())
    }
}

#[cfg(test)]
#[path = "token_test.rs"]
mod token_test;
