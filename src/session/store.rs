//! Persisted bearer token and first-launch flag

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use super::storage::{FileStorage, Storage};
use crate::config::{loader::default_storage_path, StorageConfig};
use crate::error::{Error, Result};

const TOKEN_KEY: &str = "userToken";
const LAUNCHED_KEY: &str = "hasLaunched";

/// Opaque bearer credential. Never parsed, never logged.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Token(String);

impl Token {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Value for the `Authorization` header
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Token(<redacted>)")
    }
}

impl From<&str> for Token {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Token {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Holder for the one session token a device may have.
///
/// Cheap to clone; clones share the same backing storage.
#[derive(Clone)]
pub struct SessionStore {
    storage: Arc<dyn Storage>,
}

impl SessionStore {
    pub fn new(storage: impl Storage + 'static) -> Self {
        Self {
            storage: Arc::new(storage),
        }
    }

    pub fn from_arc(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// File-backed store at the configured (or platform default) location
    pub fn open(config: &StorageConfig) -> Result<Self> {
        let path = match &config.path {
            Some(path) => path.clone(),
            None => default_storage_path()?,
        };
        tracing::debug!(path = %path.display(), "Opening session store");
        Ok(Self::new(FileStorage::new(path)))
    }

    /// Current token, or `None` when signed out
    pub async fn get(&self) -> Result<Option<Token>> {
        let value = self.storage.get_item(TOKEN_KEY).await?;
        Ok(value.filter(|v| !v.is_empty()).map(Token))
    }

    /// Store a token, replacing any previous one
    pub async fn set(&self, token: &Token) -> Result<()> {
        if token.is_empty() {
            return Err(Error::Validation("Refusing to store an empty token".to_string()));
        }
        self.storage.set_item(TOKEN_KEY, token.as_str()).await
    }

    /// Forget the token. Succeeds when there is none.
    pub async fn clear(&self) -> Result<()> {
        self.storage.remove_item(TOKEN_KEY).await
    }

    /// Returns `true` the first time it is called on a device, `false` after
    pub async fn check_first_launch(&self) -> Result<bool> {
        if self.storage.get_item(LAUNCHED_KEY).await?.is_some() {
            return Ok(false);
        }
        self.storage.set_item(LAUNCHED_KEY, "true").await?;
        Ok(true)
    }
}

impl fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionStore").finish_non_exhaustive()
    }
}
