//! Identity signal
//!
//! Answers a single question for the session controller: is a user signed in?
//! Sessions receive an explicit [`AuthSnapshot`] when they are created and
//! again whenever the host asks for a refresh; nothing reads identity from
//! ambient state behind the controller's back.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Point-in-time view of the authentication state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AuthSnapshot {
    pub is_authenticated: bool,
}

impl AuthSnapshot {
    pub fn authenticated() -> Self {
        Self {
            is_authenticated: true,
        }
    }

    pub fn anonymous() -> Self {
        Self {
            is_authenticated: false,
        }
    }
}

/// Source of the authenticated-identity signal
pub trait IdentitySignal: Send + Sync {
    /// Read the current snapshot. Never fails: anything unreadable counts as signed out.
    fn snapshot(&self) -> AuthSnapshot;
}

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("failed to read identity file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse identity file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// On-disk record written by the sign-in flow
#[derive(Debug, Deserialize)]
struct PersistedUser {
    #[serde(default)]
    user_id: Option<String>,
}

/// Identity backed by a persisted user identifier on disk
#[derive(Debug, Clone)]
pub struct PersistedIdentity {
    path: PathBuf,
}

impl PersistedIdentity {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the stored user id, if any.
    ///
    /// A missing file is `Ok(None)`; blank ids are treated as absent.
    pub fn load_user_id(&self) -> Result<Option<String>, IdentityError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(IdentityError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        if raw.trim().is_empty() {
            return Ok(None);
        }

        let user: PersistedUser =
            serde_json::from_str(&raw).map_err(|source| IdentityError::Parse {
                path: self.path.clone(),
                source,
            })?;

        Ok(user
            .user_id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty()))
    }
}

impl IdentitySignal for PersistedIdentity {
    fn snapshot(&self) -> AuthSnapshot {
        match self.load_user_id() {
            Ok(Some(_)) => AuthSnapshot::authenticated(),
            Ok(None) => AuthSnapshot::anonymous(),
            Err(e) => {
                tracing::warn!(error = %e, "Unreadable identity, treating as signed out");
                AuthSnapshot::anonymous()
            }
        }
    }
}

/// Fixed identity, switchable at runtime
#[cfg(test)]
#[derive(Debug, Default)]
pub struct StaticIdentity {
    authenticated: std::sync::atomic::AtomicBool,
}

#[cfg(test)]
impl StaticIdentity {
    pub fn new(snapshot: AuthSnapshot) -> Self {
        Self {
            authenticated: std::sync::atomic::AtomicBool::new(snapshot.is_authenticated),
        }
    }

    pub fn set(&self, snapshot: AuthSnapshot) {
        self.authenticated
            .store(snapshot.is_authenticated, std::sync::atomic::Ordering::SeqCst);
    }
}

#[cfg(test)]
impl IdentitySignal for StaticIdentity {
    fn snapshot(&self) -> AuthSnapshot {
        AuthSnapshot {
            is_authenticated: self
                .authenticated
                .load(std::sync::atomic::Ordering::SeqCst),
        }
    }
}

impl<T: IdentitySignal + ?Sized> IdentitySignal for std::sync::Arc<T> {
    fn snapshot(&self) -> AuthSnapshot {
        (**self).snapshot()
    }
}
