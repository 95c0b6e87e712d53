//! Persistent credential store.
//!
//! # Design
//! Device storage is modelled as a flat string key-value store
//! (`KeyValueStore`). `CredentialStore` layers the session semantics on top:
//! it derives an absolute `expires_at` when saving and turns it back into a
//! remaining `expires_in` when reading. Storage is best-effort: every backend
//! error is logged and swallowed here, so callers never see `StoreError`.

use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tracing::warn;

use crate::clock::Clock;
use crate::country::Country;
use crate::types::AuthSession;

pub const ACCESS_TOKEN_KEY: &str = "access_token";
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";
pub const TOKEN_TYPE_KEY: &str = "token_type";
pub const EXPIRES_AT_KEY: &str = "expires_at";
pub const SELECTED_COUNTRY_KEY: &str = "selected_country";
pub const LANGUAGE_KEY: &str = "language";

const SESSION_KEYS: [&str; 5] = [
    ACCESS_TOKEN_KEY,
    REFRESH_TOKEN_KEY,
    TOKEN_TYPE_KEY,
    EXPIRES_AT_KEY,
    SELECTED_COUNTRY_KEY,
];

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage io error: {0}")]
    Io(#[from] io::Error),

    #[error("storage encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// Flat string key-value storage.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// A JSON object on disk, rewritten in full after every mutation.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: HashMap<String, String>,
}

impl FileStore {
    /// Open `path`, starting empty if the file does not exist yet. A file
    /// that no longer parses is logged and replaced on the next write; the
    /// user simply has to sign in again.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let entries = match fs::read_to_string(&path) {
            Ok(raw) if raw.trim().is_empty() => HashMap::new(),
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "discarding corrupt credential file");
                    HashMap::new()
                }
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self { path, entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write to a sibling temp file and rename it over `path`, so a crash
    /// mid-write leaves the previous contents in place.
    fn flush(&self) -> Result<(), StoreError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;
        let raw = serde_json::to_vec_pretty(&self.entries)?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(&raw)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        self.flush()
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        if self.entries.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }
}

/// Session tokens, selected country and UI language on top of a
/// `KeyValueStore`.
pub struct CredentialStore<S> {
    store: S,
    clock: Arc<dyn Clock>,
}

impl<S: KeyValueStore> CredentialStore<S> {
    pub fn new(store: S, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub fn inner(&self) -> &S {
        &self.store
    }

    /// Persist all four session fields plus `expires_at = now + expires_in`.
    pub fn save(&mut self, session: &AuthSession) {
        let expires_at = self
            .clock
            .now_millis()
            .saturating_add(i64::try_from(session.expires_in).unwrap_or(i64::MAX).saturating_mul(1000));
        self.write(ACCESS_TOKEN_KEY, &session.access_token);
        self.write(REFRESH_TOKEN_KEY, &session.refresh_token);
        self.write(TOKEN_TYPE_KEY, &session.token_type);
        self.write(EXPIRES_AT_KEY, &expires_at.to_string());
    }

    /// Rebuild the stored session with the remaining lifetime in
    /// `expires_in`. `None` if any field is missing or unreadable.
    pub fn get(&self) -> Option<AuthSession> {
        let access_token = self.read(ACCESS_TOKEN_KEY)?;
        let refresh_token = self.read(REFRESH_TOKEN_KEY)?;
        let token_type = self.read(TOKEN_TYPE_KEY)?;
        let expires_at: i64 = match self.read(EXPIRES_AT_KEY)?.parse() {
            Ok(v) => v,
            Err(_) => {
                warn!(key = EXPIRES_AT_KEY, "stored expiry is not a number");
                return None;
            }
        };
        let remaining_ms = expires_at.saturating_sub(self.clock.now_millis()).max(0);
        Some(AuthSession {
            access_token,
            refresh_token,
            token_type,
            expires_in: (remaining_ms / 1000) as u64,
        })
    }

    pub fn access_token(&self) -> Option<String> {
        self.read(ACCESS_TOKEN_KEY)
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.read(REFRESH_TOKEN_KEY)
    }

    pub fn selected_country(&self) -> Option<Country> {
        let raw = self.read(SELECTED_COUNTRY_KEY)?;
        match raw.parse() {
            Ok(country) => Some(country),
            Err(e) => {
                warn!(error = %e, "ignoring stored country");
                None
            }
        }
    }

    pub fn set_selected_country(&mut self, country: Country) {
        self.write(SELECTED_COUNTRY_KEY, country.code());
    }

    pub fn language(&self) -> Option<String> {
        self.read(LANGUAGE_KEY)
    }

    pub fn set_language(&mut self, language: &str) {
        self.write(LANGUAGE_KEY, language);
    }

    /// Drop the session and the selected country. The UI language survives
    /// logout.
    pub fn clear(&mut self) {
        for key in SESSION_KEYS {
            if let Err(e) = self.store.remove(key) {
                warn!(key, error = %e, "failed to remove stored credential");
            }
        }
    }

    fn read(&self, key: &str) -> Option<String> {
        match self.store.get(key) {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "failed to read stored credential");
                None
            }
        }
    }

    fn write(&mut self, key: &str, value: &str) {
        if let Err(e) = self.store.set(key, value) {
            warn!(key, error = %e, "failed to persist credential");
        }
    }
}
