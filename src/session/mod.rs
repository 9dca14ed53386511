//! Session module - conversation state and long-term memory.
//!
//! A [`Session`] is the ordered message history of one conversation. The
//! [`SessionStore`] keeps sessions in memory and, when long-term memory is
//! enabled, mirrors them to JSON files under `~/.deepagent/sessions/` so a
//! conversation survives across runs.

pub mod types;

pub use types::{Message, Role, Session, ToolCall};

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::config::Config;
use crate::error::Result;

/// Storage for conversation sessions.
///
/// Cloning is cheap and clones share the same in-memory state
/// (`Arc<RwLock>` internally), so the store can be handed to async tasks
/// freely.
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
    /// Persistence directory; `None` keeps sessions in memory only.
    storage_path: Option<PathBuf>,
}

impl SessionStore {
    /// A store that persists sessions under `~/.deepagent/sessions/`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn persistent() -> Result<Self> {
        Self::with_path(Config::dir().join("sessions"))
    }

    /// A store with a custom persistence directory.
    pub fn with_path(path: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&path)?;
        Ok(Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            storage_path: Some(path),
        })
    }

    /// A memory-only store; sessions vanish when the process exits.
    pub fn in_memory() -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            storage_path: None,
        }
    }

    /// Fetch the session for `key`, loading it from disk if persisted,
    /// or create a fresh one.
    pub async fn get_or_create(&self, key: &str) -> Result<Session> {
        {
            let sessions = self.sessions.read().await;
            if let Some(session) = sessions.get(key) {
                return Ok(session.clone());
            }
        }

        if let Some(path) = self.file_path(key) {
            if path.exists() {
                let content = tokio::fs::read_to_string(&path).await?;
                let session: Session = serde_json::from_str(&content)?;
                let mut sessions = self.sessions.write().await;
                sessions.insert(key.to_string(), session.clone());
                return Ok(session);
            }
        }

        let session = Session::new(key);
        let mut sessions = self.sessions.write().await;
        sessions.insert(key.to_string(), session.clone());
        Ok(session)
    }

    /// Save a session to memory, and to disk when persistence is enabled.
    pub async fn save(&self, session: &Session) -> Result<()> {
        {
            let mut sessions = self.sessions.write().await;
            sessions.insert(session.key.clone(), session.clone());
        }

        if let Some(path) = self.file_path(&session.key) {
            let content = serde_json::to_string_pretty(session)?;
            tokio::fs::write(&path, content).await?;
        }

        Ok(())
    }

    /// Keys of the sessions currently loaded, sorted.
    pub async fn list(&self) -> Vec<String> {
        let sessions = self.sessions.read().await;
        let mut keys: Vec<String> = sessions.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Drop a session from memory and disk.
    pub async fn delete(&self, key: &str) -> Result<()> {
        {
            let mut sessions = self.sessions.write().await;
            sessions.remove(key);
        }

        if let Some(path) = self.file_path(key) {
            if path.exists() {
                tokio::fs::remove_file(&path).await?;
            }
        }

        Ok(())
    }

    fn file_path(&self, key: &str) -> Option<PathBuf> {
        self.storage_path
            .as_ref()
            .map(|dir| dir.join(format!("{}.json", sanitize_key(key))))
    }
}

impl Clone for SessionStore {
    fn clone(&self) -> Self {
        Self {
            sessions: Arc::clone(&self.sessions),
            storage_path: self.storage_path.clone(),
        }
    }
}

/// Make a session key safe to use as a filename.
fn sanitize_key(key: &str) -> String {
    key.replace(['/', '\\', ':', '*', '?', '"', '<', '>', '|'], "_")
}
