//! Persisted, insertion-ordered store of `otpauth://` URI strings.
//!
//! Each URI maps to a monotonically increasing index; listing sorts by index.
//! Re-adding a URI gives it a fresh index, which moves it to the end. The whole
//! index map is written through a [`StoreBackend`] after every change.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::totp::types::*;

/// Shared store handle for the display model and the registrar.
pub type SharedOtpUriStore = Arc<Mutex<OtpUriStore>>;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Backends
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Where the URI → index map lives.
pub trait StoreBackend: Send {
    fn load(&self) -> Result<HashMap<String, u64>, TotpError>;
    fn save(&mut self, indices: &HashMap<String, u64>) -> Result<(), TotpError>;
}

/// Non-persistent backend.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    indices: HashMap<String, u64>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StoreBackend for MemoryBackend {
    fn load(&self) -> Result<HashMap<String, u64>, TotpError> {
        Ok(self.indices.clone())
    }

    fn save(&mut self, indices: &HashMap<String, u64>) -> Result<(), TotpError> {
        self.indices = indices.clone();
        Ok(())
    }
}

/// Pretty-printed JSON object on disk. A missing file is an empty store.
#[derive(Debug, Clone)]
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StoreBackend for JsonFileBackend {
    fn load(&self) -> Result<HashMap<String, u64>, TotpError> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }
        let data = fs::read_to_string(&self.path)?;
        if data.trim().is_empty() {
            return Ok(HashMap::new());
        }
        Ok(serde_json::from_str(&data)?)
    }

    fn save(&mut self, indices: &HashMap<String, u64>) -> Result<(), TotpError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(indices)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Store
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Ordered collection of OTP URI strings.
pub struct OtpUriStore {
    backend: Box<dyn StoreBackend>,
    indices: HashMap<String, u64>,
    next_index: u64,
}

impl OtpUriStore {
    /// Open a store, reading existing entries from `backend`.
    pub fn open(backend: impl StoreBackend + 'static) -> Result<Self, TotpError> {
        let indices = backend.load()?;
        let next_index = match indices.values().max() {
            Some(&max) => index_after(max)?,
            None => 0,
        };
        tracing::debug!(entries = indices.len(), next_index, "opened OTP URI store");
        Ok(Self {
            backend: Box::new(backend),
            indices,
            next_index,
        })
    }

    /// In-memory store, mostly for tests and ephemeral hosts.
    pub fn in_memory() -> Self {
        Self {
            backend: Box::new(MemoryBackend::new()),
            indices: HashMap::new(),
            next_index: 0,
        }
    }

    /// Wrap in `Arc<Mutex<_>>` for sharing between tasks.
    pub fn into_shared(self) -> SharedOtpUriStore {
        Arc::new(Mutex::new(self))
    }

    /// Add a URI at the end. An existing URI is moved to the end.
    /// Nothing changes if the backend fails to save.
    pub fn add(&mut self, otp_uri: &str) -> Result<(), TotpError> {
        let next_index = index_after(self.next_index)?;
        let mut updated = self.indices.clone();
        let moved = updated.insert(otp_uri.to_string(), self.next_index).is_some();
        self.commit(updated)?;
        self.next_index = next_index;
        tracing::debug!(moved, entries = self.indices.len(), "stored OTP URI");
        Ok(())
    }

    /// Remove a URI. Unknown URIs are ignored.
    pub fn remove(&mut self, otp_uri: &str) -> Result<(), TotpError> {
        if !self.indices.contains_key(otp_uri) {
            return Ok(());
        }
        let mut updated = self.indices.clone();
        updated.remove(otp_uri);
        self.commit(updated)?;
        tracing::debug!(entries = self.indices.len(), "removed OTP URI");
        Ok(())
    }

    /// All URIs, oldest addition first.
    pub fn list(&self) -> Vec<String> {
        let mut entries: Vec<(&String, &u64)> = self.indices.iter().collect();
        entries.sort_by_key(|(_, index)| **index);
        entries.into_iter().map(|(uri, _)| uri.clone()).collect()
    }

    pub fn contains(&self, otp_uri: &str) -> bool {
        self.indices.contains_key(otp_uri)
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    fn commit(&mut self, updated: HashMap<String, u64>) -> Result<(), TotpError> {
        self.backend.save(&updated)?;
        self.indices = updated;
        Ok(())
    }
}

fn index_after(index: u64) -> Result<u64, TotpError> {
    index
        .checked_add(1)
        .ok_or_else(|| TotpError::new(TotpErrorKind::Storage, "OTP URI store has run out of indices"))
}
