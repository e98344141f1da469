//! Write-through persistence with graceful degradation.
//!
//! Reads that fail or return malformed JSON fall back to the caller's
//! default. Writes that fail flip the status to
//! [`PersistenceStatus::InMemoryOnly`]; the next successful write flips it
//! back. Nothing here returns an error to the store.

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::backend::{KeyValueBackend, StorageKeys, StoreKey};
use crate::error::BackendError;

/// Whether recent writes reached the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistenceStatus {
    /// The last write succeeded.
    Durable,
    /// The last write failed; state lives only in memory until a write
    /// succeeds again.
    InMemoryOnly,
}

/// Backend handle plus key names and health status.
#[derive(Debug)]
pub(crate) struct Persistence<B> {
    pub(crate) backend: B,
    pub(crate) keys: StorageKeys,
    pub(crate) status: PersistenceStatus,
}

impl<B: KeyValueBackend> Persistence<B> {
    pub(crate) const fn new(backend: B, keys: StorageKeys) -> Self {
        Self {
            backend,
            keys,
            status: PersistenceStatus::Durable,
        }
    }

    /// Read and decode `key`; `None` when absent, unreadable, or malformed.
    pub(crate) fn load<T: DeserializeOwned>(&self, key: StoreKey) -> Option<T> {
        let name = self.keys.name(key);
        let raw = match self.backend.get(name) {
            Ok(Some(raw)) if !raw.is_empty() => raw,
            Ok(_) => return None,
            Err(e) => {
                warn!(key = name, error = %e, "persisted read failed, using fallback");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key = name, error = %e, "malformed persisted data, using fallback");
                None
            }
        }
    }

    /// Encode `value` and write it to `key`.
    pub(crate) fn save<T: Serialize + ?Sized>(&mut self, key: StoreKey, value: &T) {
        let name = self.keys.name(key);
        let json = match serde_json::to_string(value) {
            Ok(json) => json,
            Err(e) => {
                warn!(key = name, error = %e, "failed to encode collection, write skipped");
                return;
            }
        };
        let result = self.backend.set(name, &json);
        record(&mut self.status, name, result);
    }

    /// Delete `key`.
    pub(crate) fn remove(&mut self, key: StoreKey) {
        let name = self.keys.name(key);
        let result = self.backend.remove(name);
        record(&mut self.status, name, result);
    }
}

fn record(status: &mut PersistenceStatus, key: &str, result: Result<(), BackendError>) {
    match (result, *status) {
        (Ok(()), PersistenceStatus::Durable) => {}
        (Ok(()), PersistenceStatus::InMemoryOnly) => {
            info!(key, "persistence restored");
            *status = PersistenceStatus::Durable;
        }
        (Err(e), PersistenceStatus::Durable) => {
            warn!(key, error = %e, "persistence write failed, continuing in memory only");
            *status = PersistenceStatus::InMemoryOnly;
        }
        (Err(e), PersistenceStatus::InMemoryOnly) => {
            debug!(key, error = %e, "persistence still unavailable");
        }
    }
}
