//! Persistent application identity
//!
//! The identity is a random UUID created on first start and stored as
//! `{"id": "<uuid>"}`. Every later start reads it back unchanged; the file is
//! never rewritten. It ends up as the constant `app_id` label on every series.

use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("failed to read identity file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write identity file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("identity file {path} is not valid: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("identity file {path} contains an empty id")]
    EmptyId { path: PathBuf },
}

/// On-disk representation
#[derive(Debug, Deserialize)]
struct IdentityFile {
    id: String,
}

/// Identifier of this exporter installation
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AppIdentity(String);

impl AppIdentity {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh random identity
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AppIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Loads the identity from disk, creating it on first run
#[derive(Debug, Clone)]
pub struct IdentityStore {
    path: PathBuf,
}

impl IdentityStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Return the stored identity, or generate and persist a new one if the
    /// file does not exist. A file that exists but cannot be parsed is an
    /// error; it is never silently replaced.
    pub async fn load_or_create(&self) -> Result<AppIdentity, IdentityError> {
        match fs::read_to_string(&self.path).await {
            Ok(content) => self.parse(&content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => self.create().await,
            Err(source) => Err(IdentityError::Read {
                path: self.path.clone(),
                source,
            }),
        }
    }

    fn parse(&self, content: &str) -> Result<AppIdentity, IdentityError> {
        let file: IdentityFile =
            serde_json::from_str(content).map_err(|source| IdentityError::Parse {
                path: self.path.clone(),
                source,
            })?;

        if file.id.trim().is_empty() {
            return Err(IdentityError::EmptyId {
                path: self.path.clone(),
            });
        }

        Ok(AppIdentity(file.id))
    }

    async fn create(&self) -> Result<AppIdentity, IdentityError> {
        let identity = AppIdentity::generate();
        let write_err = |source| IdentityError::Write {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(write_err)?;
        }

        let content = serde_json::json!({ "id": identity.as_str() }).to_string();
        fs::write(&self.path, content).await.map_err(write_err)?;

        info!(path = %self.path.display(), app_id = %identity, "Created new application identity");
        Ok(identity)
    }
}
