use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use prepkart_core::session::{SessionStore, SessionUser};
use serde_json::{Map, Value};

/// The fixed key the session user record lives under.
const SESSION_KEY: &str = "user";

/// File-backed key-value store for the session user: one JSON object file,
/// the user record as plain JSON under a fixed key. A missing file, missing
/// key or corrupt record reads as "not logged in"; only real I/O failures
/// surface as errors.
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    async fn read_map(&self) -> Result<Map<String, Value>, Box<dyn std::error::Error + Send + Sync>> {
        let text = match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_str::<Value>(&text) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) | Err(_) => {
                tracing::warn!(path = %self.path.display(), "session file is not a JSON object, treating as empty");
                Ok(Map::new())
            }
        }
    }

    async fn write_map(
        &self,
        map: &Map<String, Value>,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let text = serde_json::to_string_pretty(map)?;
        tokio::fs::write(&self.path, text).await?;
        Ok(())
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn load(
        &self,
    ) -> Result<Option<SessionUser>, Box<dyn std::error::Error + Send + Sync>> {
        let map = self.read_map().await?;
        let Some(raw) = map.get(SESSION_KEY) else {
            return Ok(None);
        };

        match serde_json::from_value::<SessionUser>(raw.clone()) {
            Ok(user) => Ok(Some(user)),
            Err(e) => {
                tracing::warn!(error = %e, "stored session record is corrupt, treating as logged out");
                Ok(None)
            }
        }
    }

    async fn save(
        &self,
        user: &SessionUser,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let mut map = self.read_map().await?;
        map.insert(SESSION_KEY.to_string(), serde_json::to_value(user)?);
        self.write_map(&map).await
    }

    async fn clear(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let mut map = self.read_map().await?;
        if map.remove(SESSION_KEY).is_some() {
            self.write_map(&map).await?;
        }
        Ok(())
    }
}
