//! Durable storage for the last authenticated identity
//!
//! The hint is only a fallback for rebuilding a session after a restart when
//! the identity probe is inconclusive. It is stored as a small JSON file:
//!
//! ```text
//! { "identity": "librarian_jane", "saved_at": "2025-03-10T09:12:44Z" }
//! ```

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::sync::Mutex;

use crate::error::AppResult;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedHint {
    pub identity: String,
    pub saved_at: DateTime<Utc>,
}

impl PersistedHint {
    pub fn new(identity: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            saved_at: Utc::now(),
        }
    }
}

#[async_trait]
pub trait HintStore: Send + Sync {
    async fn load(&self) -> AppResult<Option<PersistedHint>>;
    async fn save(&self, hint: &PersistedHint) -> AppResult<()>;
    async fn clear(&self) -> AppResult<()>;
}

/// Hint kept in a JSON file, written atomically (temp file, then rename)
#[derive(Debug, Clone)]
pub struct FileHintStore {
    path: PathBuf,
}

impl FileHintStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn temp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "hint".to_string());
        self.path.with_file_name(format!(".{}.tmp", name))
    }
}

#[async_trait]
impl HintStore for FileHintStore {
    async fn load(&self) -> AppResult<Option<PersistedHint>> {
        let json = match fs::read_to_string(&self.path).await {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_str::<PersistedHint>(&json) {
            Ok(hint) if !hint.identity.trim().is_empty() => Ok(Some(hint)),
            Ok(_) => Ok(None),
            Err(e) => {
                tracing::warn!("Ignoring unreadable identity hint {}: {}", self.path.display(), e);
                Ok(None)
            }
        }
    }

    async fn save(&self, hint: &PersistedHint) -> AppResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(hint)?;
        let temp_path = self.temp_path();
        fs::write(&temp_path, json).await?;
        fs::rename(&temp_path, &self.path).await?;
        Ok(())
    }

    async fn clear(&self) -> AppResult<()> {
        match fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-process hint, for tests and ephemeral clients
#[derive(Debug, Default)]
pub struct MemoryHintStore {
    hint: Mutex<Option<PersistedHint>>,
}

impl MemoryHintStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_identity(identity: impl Into<String>) -> Self {
        Self {
            hint: Mutex::new(Some(PersistedHint::new(identity))),
        }
    }
}

#[async_trait]
impl HintStore for MemoryHintStore {
    async fn load(&self) -> AppResult<Option<PersistedHint>> {
        Ok(self.hint.lock().await.clone())
    }

    async fn save(&self, hint: &PersistedHint) -> AppResult<()> {
        *self.hint.lock().await = Some(hint.clone());
        Ok(())
    }

    async fn clear(&self) -> AppResult<()> {
        *self.hint.lock().await = None;
        Ok(())
    }
}
