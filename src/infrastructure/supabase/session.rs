//! Session model and session stores

use std::fmt::Debug;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;

use crate::domain::DomainError;

fn default_token_type() -> String {
    "bearer".to_string()
}

/// User record as returned by the auth API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Tokens issued by the auth API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
    /// Unix timestamp (seconds)
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub user: ProviderUser,
}

impl Session {
    /// Fill in `expires_at` from `expires_in` when the server omitted it
    pub fn with_computed_expiry(mut self) -> Self {
        if self.expires_at.is_none() {
            if let Some(expires_in) = self.expires_in {
                self.expires_at = Some(Utc::now().timestamp() + expires_in);
            }
        }
        self
    }

    /// Whether the access token is expired or will be within `margin`
    pub fn expires_within(&self, margin: Duration) -> bool {
        match self.expires_at {
            Some(expires_at) => expires_at <= (Utc::now() + margin).timestamp(),
            None => false,
        }
    }
}

/// Everything the repository persists between calls
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredAuthState {
    #[serde(default)]
    pub session: Option<Session>,
    /// PKCE verifier of an OAuth flow that has not been completed yet
    #[serde(default)]
    pub code_verifier: Option<String>,
}

/// Persistence for the auth state
#[async_trait]
pub trait SessionStore: Send + Sync + Debug {
    async fn load(&self) -> Result<StoredAuthState, DomainError>;

    async fn save(&self, state: &StoredAuthState) -> Result<(), DomainError>;

    async fn clear(&self) -> Result<(), DomainError> {
        self.save(&StoredAuthState::default()).await
    }
}

/// Process-local session store
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    state: Arc<RwLock<StoredAuthState>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: StoredAuthState) -> Self {
        Self {
            state: Arc::new(RwLock::new(state)),
        }
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn load(&self) -> Result<StoredAuthState, DomainError> {
        Ok(self.state.read().await.clone())
    }

    async fn save(&self, state: &StoredAuthState) -> Result<(), DomainError> {
        *self.state.write().await = state.clone();
        Ok(())
    }
}

/// Mode of the session file; it holds live tokens
#[cfg(unix)]
const SESSION_FILE_MODE: u32 = 0o600;

/// Session store backed by a JSON file
///
/// A missing file reads as an empty state. On unix the file is only
/// readable by its owner.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn load(&self) -> Result<StoredAuthState, DomainError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(StoredAuthState::default()),
            Err(e) => {
                return Err(DomainError::storage(format!(
                    "Failed to read session file '{}': {}",
                    self.path.display(),
                    e
                )));
            }
        };

        serde_json::from_slice(&bytes).map_err(|e| {
            DomainError::storage(format!(
                "Failed to parse session file '{}': {}",
                self.path.display(),
                e
            ))
        })
    }

    async fn save(&self, state: &StoredAuthState) -> Result<(), DomainError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                DomainError::storage(format!(
                    "Failed to create directory '{}': {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let json = serde_json::to_vec_pretty(state)
            .map_err(|e| DomainError::storage(format!("Failed to serialize session: {}", e)))?;

        // Readers only ever see a complete file
        let tmp_path = self.path.with_extension("tmp");
        write_private(&tmp_path, &json).await.map_err(|e| {
            DomainError::storage(format!(
                "Failed to write session file '{}': {}",
                tmp_path.display(),
                e
            ))
        })?;

        tokio::fs::rename(&tmp_path, &self.path).await.map_err(|e| {
            DomainError::storage(format!(
                "Failed to replace session file '{}': {}",
                self.path.display(),
                e
            ))
        })
    }
}

async fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let mut options = tokio::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(SESSION_FILE_MODE);

    let mut file = options.open(path).await?;
    file.write_all(contents).await?;
    file.sync_all().await?;

    // `mode` only applies on creation; a leftover tmp file keeps its own
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(SESSION_FILE_MODE))
            .await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_session(expires_at: Option<i64>) -> Session {
        Session {
            access_token: "access".to_string(),
            refresh_token: "refresh".to_string(),
            token_type: "bearer".to_string(),
            expires_in: Some(3600),
            expires_at,
            user: ProviderUser {
                id: "123".to_string(),
                email: Some("test@example.com".to_string()),
            },
        }
    }

    #[test]
    fn test_session_expiry() {
        let now = Utc::now().timestamp();

        assert!(create_test_session(Some(now - 1)).expires_within(Duration::zero()));
        assert!(create_test_session(Some(now + 5)).expires_within(Duration::seconds(10)));
        assert!(!create_test_session(Some(now + 3600)).expires_within(Duration::seconds(10)));
        assert!(!create_test_session(None).expires_within(Duration::seconds(10)));
    }

    #[test]
    fn test_computed_expiry() {
        let session = create_test_session(None).with_computed_expiry();
        let expires_at = session.expires_at.unwrap();

        assert!(expires_at >= Utc::now().timestamp() + 3590);
    }

    #[test]
    fn test_session_deserializes_token_response() {
        let session: Session = serde_json::from_str(
            r#"{
                "access_token": "a",
                "refresh_token": "r",
                "expires_in": 3600,
                "user": {"id": "u1", "email": "u1@example.com", "aud": "authenticated"}
            }"#,
        )
        .unwrap();

        assert_eq!(session.token_type, "bearer");
        assert_eq!(session.user.id, "u1");
        assert!(session.expires_at.is_none());
    }

    #[tokio::test]
    async fn test_in_memory_store() {
        let store = InMemorySessionStore::new();
        assert_eq!(store.load().await.unwrap(), StoredAuthState::default());

        let state = StoredAuthState {
            session: Some(create_test_session(Some(1))),
            code_verifier: Some("verifier".to_string()),
        };
        store.save(&state).await.unwrap();
        assert_eq!(store.load().await.unwrap(), state);

        store.clear().await.unwrap();
        assert_eq!(store.load().await.unwrap(), StoredAuthState::default());
    }

    #[tokio::test]
    async fn test_file_store_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("session.json"));

        assert_eq!(store.load().await.unwrap(), StoredAuthState::default());
    }

    #[tokio::test]
    async fn test_file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");

        let state = StoredAuthState {
            session: Some(create_test_session(Some(42))),
            code_verifier: None,
        };
        FileSessionStore::new(&path).save(&state).await.unwrap();

        let reopened = FileSessionStore::new(&path);
        assert_eq!(reopened.load().await.unwrap(), state);
        assert!(!path.with_extension("tmp").exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_file_store_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let state = StoredAuthState {
            session: Some(create_test_session(Some(42))),
            code_verifier: Some("verifier".to_string()),
        };

        let store = FileSessionStore::new(&path);
        store.save(&state).await.unwrap();
        assert_eq!(std::fs::metadata(&path).unwrap().permissions().mode() & 0o777, 0o600);

        // An existing world-readable file is tightened on the next save
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();
        std::fs::write(path.with_extension("tmp"), "stale").unwrap();
        std::fs::set_permissions(
            path.with_extension("tmp"),
            std::fs::Permissions::from_mode(0o644),
        )
        .unwrap();
        store.save(&state).await.unwrap();
        assert_eq!(std::fs::metadata(&path).unwrap().permissions().mode() & 0o777, 0o600);
        assert_eq!(store.load().await.unwrap(), state);
    }

    #[tokio::test]
    async fn test_file_store_rejects_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "not json").unwrap();

        let error = FileSessionStore::new(&path).load().await.unwrap_err();
        assert!(matches!(error, DomainError::Storage { .. }));
    }
}
