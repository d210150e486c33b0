use async_trait::async_trait;
use std::{
    collections::{BTreeMap, HashMap},
    fmt,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};

use crate::models::{Role, SessionSummary};

/// Storage key holding the bearer token.
pub const TOKEN_KEY: &str = "token";
/// Storage key holding the cached role record.
pub const ROLE_KEY: &str = "role";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("session storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("session storage file is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
    #[error("session storage unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("a session requires a non-empty token")]
    EmptyToken,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

// 1. SessionStorage Contract
/// SessionStorage
///
/// A persistent string key-value store, the console's equivalent of browser local
/// storage. The session store only ever touches [`TOKEN_KEY`] and [`ROLE_KEY`].
#[async_trait]
pub trait SessionStorage: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    async fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// StorageState
///
/// The shared handle to whichever storage backend the console was started with.
pub type StorageState = Arc<dyn SessionStorage>;

// 2. The Real Implementation (JSON file on disk)
/// FileStorage
///
/// Keeps all keys in a single JSON object file. Writes go to a sibling temp file that
/// is then renamed over the original, so a crash never leaves a half-written session.
pub struct FileStorage {
    path: PathBuf,
    // Serializes read-modify-write cycles.
    lock: Mutex<()>,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_entries(&self) -> Result<BTreeMap<String, String>, StorageError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) if raw.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(err) => Err(err.into()),
        }
    }

    async fn write_entries(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, serde_json::to_vec_pretty(entries)?).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl SessionStorage for FileStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let _guard = self.lock.lock().await;
        Ok(self.read_entries().await?.remove(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let _guard = self.lock.lock().await;
        let mut entries = self.read_entries().await?;
        entries.insert(key.to_string(), value.to_string());
        self.write_entries(&entries).await
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let _guard = self.lock.lock().await;
        let mut entries = self.read_entries().await?;
        if entries.remove(key).is_some() {
            self.write_entries(&entries).await?;
        }
        Ok(())
    }
}

// 3. The In-Memory Implementation (For Tests)
/// MemoryStorage
///
/// Volatile storage used by tests and by consoles started without a session file.
#[derive(Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
    /// When true, every write fails.
    should_fail: bool,
    /// Writes (`set`) to this key fail; everything else succeeds.
    rejected_key: Option<String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    pub fn new_rejecting(key: &str) -> Self {
        Self {
            rejected_key: Some(key.to_string()),
            ..Self::default()
        }
    }

    /// Seeds a key before the storage is shared, e.g. to simulate a previous run.
    pub fn with_entry(mut self, key: &str, value: &str) -> Self {
        self.entries
            .get_mut()
            .insert(key.to_string(), value.to_string());
        self
    }
}

#[async_trait]
impl SessionStorage for MemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.should_fail || self.rejected_key.as_deref() == Some(key) {
            return Err(StorageError::Unavailable("simulated write failure".to_string()));
        }
        self.entries
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        if self.should_fail {
            return Err(StorageError::Unavailable("simulated write failure".to_string()));
        }
        self.entries.lock().await.remove(key);
        Ok(())
    }
}

// --- Session ---

/// Session
///
/// An authenticated operator: bearer token plus role. The token is never empty.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    token: String,
    role: Role,
}

impl Session {
    pub fn new(token: impl Into<String>, role: Role) -> Result<Self, SessionError> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(SessionError::EmptyToken);
        }
        Ok(Self { token, role })
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn role(&self) -> Role {
        self.role
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &"<redacted>")
            .field("role", &self.role)
            .finish()
    }
}

/// SessionStore
///
/// Owns the console's single session: restores it from storage at start, replaces it on
/// login and clears it on logout or when the backend reports it expired.
///
/// Every transition bumps an epoch. Requests capture the epoch before they go out and
/// compare it when the response comes back, which is how stale responses are detected.
/// The epoch only changes while the `current` write lock is held.
pub struct SessionStore {
    storage: StorageState,
    current: RwLock<Option<Session>>,
    epoch: AtomicU64,
}

/// SessionState
///
/// The shared handle injected into the guard middleware, the API client and handlers.
pub type SessionState = Arc<SessionStore>;

impl SessionStore {
    pub fn new(storage: StorageState) -> Self {
        Self {
            storage,
            current: RwLock::new(None),
            epoch: AtomicU64::new(0),
        }
    }

    /// Reloads the session persisted by a previous run. A token without a (recognised)
    /// role record yields an anonymous session.
    pub async fn restore(&self) -> Result<Option<Session>, SessionError> {
        let mut current = self.current.write().await;

        let token = self
            .storage
            .get(TOKEN_KEY)
            .await?
            .filter(|token| !token.trim().is_empty());

        let restored = match token {
            None => None,
            Some(token) => {
                let role = match self.storage.get(ROLE_KEY).await? {
                    Some(raw) => raw.parse().unwrap_or_else(|err| {
                        tracing::warn!(%err, "stored role not recognised, falling back to anonymous");
                        Role::Anonymous
                    }),
                    None => Role::Anonymous,
                };
                Some(Session::new(token, role)?)
            }
        };

        if let Some(session) = &restored {
            tracing::info!(role = %session.role(), "session restored from storage");
        }
        *current = restored.clone();
        self.epoch.fetch_add(1, Ordering::SeqCst);
        Ok(restored)
    }

    pub async fn current(&self) -> Option<Session> {
        self.current.read().await.clone()
    }

    pub async fn summary(&self) -> SessionSummary {
        let session = self.current().await;
        SessionSummary {
            authenticated: session.is_some(),
            role: session.map(|s| s.role()),
        }
    }

    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    /// Persists and activates a fresh session. Without a role record only the token is
    /// stored and the session is anonymous.
    ///
    /// The previous role record is dropped before the new token is written and the new
    /// role goes last, so storage never pairs a token with another session's role. If any
    /// write fails the console ends up logged out, in memory and on disk.
    pub async fn login(&self, token: String, role: Option<Role>) -> Result<Session, SessionError> {
        let session = Session::new(token, role.unwrap_or(Role::Anonymous))?;
        let mut current = self.current.write().await;

        if let Err(err) = self.persist(&session, role).await {
            tracing::warn!(error = %err, "session could not be stored, logging out");
            *current = None;
            self.epoch.fetch_add(1, Ordering::SeqCst);
            for key in [TOKEN_KEY, ROLE_KEY] {
                if let Err(cleanup) = self.storage.remove(key).await {
                    tracing::error!(key, error = %cleanup, "stale session key left in storage");
                }
            }
            return Err(err.into());
        }

        *current = Some(session.clone());
        self.epoch.fetch_add(1, Ordering::SeqCst);
        tracing::info!(role = %session.role(), "session started");
        Ok(session)
    }

    /// Clears both keys from storage and drops the in-memory session.
    pub async fn logout(&self) -> Result<(), SessionError> {
        let mut current = self.current.write().await;
        self.clear(&mut current).await?;
        tracing::info!("session closed");
        Ok(())
    }

    /// Clears the session only if it is still the one that was active at `observed_epoch`.
    /// Returns whether anything was cleared. A 401 for a request issued before a re-login
    /// must not log the new session out.
    pub async fn expire(&self, observed_epoch: u64) -> Result<bool, SessionError> {
        let mut current = self.current.write().await;
        if self.epoch() != observed_epoch || current.is_none() {
            return Ok(false);
        }
        self.clear(&mut current).await?;
        tracing::warn!("backend rejected the session credential, session cleared");
        Ok(true)
    }

    async fn persist(&self, session: &Session, role: Option<Role>) -> Result<(), StorageError> {
        self.storage.remove(ROLE_KEY).await?;
        self.storage.set(TOKEN_KEY, session.token()).await?;
        if let Some(role) = role {
            self.storage.set(ROLE_KEY, role.as_str()).await?;
        }
        Ok(())
    }

    async fn clear(&self, current: &mut Option<Session>) -> Result<(), SessionError> {
        // Drop the in-memory session first so a storage failure still logs the operator out.
        *current = None;
        self.epoch.fetch_add(1, Ordering::SeqCst);
        self.storage.remove(TOKEN_KEY).await?;
        self.storage.remove(ROLE_KEY).await?;
        Ok(())
    }
}
