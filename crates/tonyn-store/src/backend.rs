//! Persistence backends: a narrow string key-value interface.
//!
//! The store is the only writer of its key space. Each collection lives
//! under one key as a JSON document; see [`StorageKeys`].
//!
//! # Key Layout
//!
//! | Key | Value |
//! |-----|-------|
//! | `{prefix}identity` | `Identity` object |
//! | `{prefix}posts` | array of `Post` |
//! | `{prefix}circles` | array of `Circle` |
//! | `{prefix}moments` | array of `Moment` |
//! | `{prefix}viewedImages` | array of post ids (durable tier) |
//! | `{prefix}session` | `SessionRecord` while a session is open |

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::BackendError;

/// Default key prefix, matching the browser pages.
pub const DEFAULT_KEY_PREFIX: &str = "tonyn.";

/// A synchronous string key-value store.
///
/// Mirrors the browser local storage contract. Implementations report
/// failures; the store decides how to degrade.
pub trait KeyValueBackend: Send {
    /// Read the value at `key`, or `None` if absent.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, BackendError>;

    /// Store `value` at `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] if the write is refused or fails.
    fn set(&mut self, key: &str, value: &str) -> Result<(), BackendError>;

    /// Delete `key`. Deleting an absent key is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] if the delete fails.
    fn remove(&mut self, key: &str) -> Result<(), BackendError>;
}

/// Fully-qualified key names for every persisted collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKeys {
    /// Identity record.
    pub identity: String,
    /// Post collection.
    pub posts: String,
    /// Circle collection.
    pub circles: String,
    /// Moment collection.
    pub moments: String,
    /// Durable viewed-image set.
    pub viewed_images: String,
    /// Open-session marker.
    pub session: String,
}

impl StorageKeys {
    /// Build the key set under `prefix`.
    pub fn new(prefix: &str) -> Self {
        Self {
            identity: format!("{prefix}identity"),
            posts: format!("{prefix}posts"),
            circles: format!("{prefix}circles"),
            moments: format!("{prefix}moments"),
            viewed_images: format!("{prefix}viewedImages"),
            session: format!("{prefix}session"),
        }
    }
}

/// One persisted collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreKey {
    /// Identity record.
    Identity,
    /// Post collection.
    Posts,
    /// Circle collection.
    Circles,
    /// Moment collection.
    Moments,
    /// Durable viewed-image set.
    ViewedImages,
    /// Open-session marker.
    Session,
}

impl StorageKeys {
    /// Fully-qualified key for `key`.
    pub fn name(&self, key: StoreKey) -> &str {
        match key {
            StoreKey::Identity => &self.identity,
            StoreKey::Posts => &self.posts,
            StoreKey::Circles => &self.circles,
            StoreKey::Moments => &self.moments,
            StoreKey::ViewedImages => &self.viewed_images,
            StoreKey::Session => &self.session,
        }
    }
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self::new(DEFAULT_KEY_PREFIX)
    }
}

// =========================================================================
// In-memory backend
// =========================================================================

/// In-memory backend with an optional byte quota.
///
/// Clones share one key space, the way every page of an origin shares
/// browser local storage. Holding a clone lets a caller inspect what the
/// store wrote, or reopen the same data after the store is dropped.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    entries: Arc<Mutex<BTreeMap<String, String>>>,
    quota_bytes: Option<usize>,
    offline: Arc<AtomicBool>,
}

impl MemoryBackend {
    /// Create an empty backend without a quota.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty backend that refuses writes once the total size of
    /// keys and values would exceed `quota_bytes`.
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            quota_bytes: Some(quota_bytes),
            ..Self::default()
        }
    }

    /// Simulate the backend becoming unreachable (or reachable again).
    /// Affects every clone.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::Release);
    }

    /// Total bytes currently held (keys plus values).
    pub fn used_bytes(&self) -> usize {
        self.entries
            .lock()
            .map(|entries| entry_bytes(&entries))
            .unwrap_or(0)
    }

    /// Keys currently present, in sorted order.
    pub fn keys(&self) -> Vec<String> {
        self.entries
            .lock()
            .map(|entries| entries.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn check_online(&self) -> Result<(), BackendError> {
        if self.offline.load(Ordering::Acquire) {
            return Err(BackendError::Unavailable("memory backend offline".to_owned()));
        }
        Ok(())
    }
}

fn entry_bytes(entries: &BTreeMap<String, String>) -> usize {
    entries
        .iter()
        .fold(0_usize, |acc, (k, v)| {
            acc.saturating_add(k.len()).saturating_add(v.len())
        })
}

fn lock_poisoned<T>(_err: T) -> BackendError {
    BackendError::Unavailable("memory backend lock poisoned".to_owned())
}

impl KeyValueBackend for MemoryBackend {
    fn get(&self, key: &str) -> Result<Option<String>, BackendError> {
        self.check_online()?;
        let entries = self.entries.lock().map_err(lock_poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), BackendError> {
        self.check_online()?;
        let mut entries = self.entries.lock().map_err(lock_poisoned)?;

        if let Some(limit) = self.quota_bytes {
            let previous = entries
                .get(key)
                .map_or(0, |old| key.len().saturating_add(old.len()));
            let needed = entry_bytes(&entries)
                .saturating_sub(previous)
                .saturating_add(key.len())
                .saturating_add(value.len());
            if needed > limit {
                return Err(BackendError::QuotaExceeded {
                    key: key.to_owned(),
                    needed,
                    limit,
                });
            }
        }

        entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), BackendError> {
        self.check_online()?;
        let mut entries = self.entries.lock().map_err(lock_poisoned)?;
        entries.remove(key);
        Ok(())
    }
}

// =========================================================================
// File backend
// =========================================================================

/// Directory-backed store: one `<key>.json` file per key.
///
/// Writes go to a temporary sibling first and are renamed into place, so a
/// crash mid-write leaves the previous value intact.
#[derive(Debug, Clone)]
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    /// Open (creating if needed) the data directory at `dir`.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Io`] if the directory cannot be created.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, BackendError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|source| BackendError::Io {
            key: dir.display().to_string(),
            source,
        })?;
        tracing::debug!(dir = %dir.display(), "file backend opened");
        Ok(Self { dir })
    }

    /// The data directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let file: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{file}.json"))
    }
}

impl KeyValueBackend for FileBackend {
    fn get(&self, key: &str) -> Result<Option<String>, BackendError> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(BackendError::Io {
                key: key.to_owned(),
                source,
            }),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), BackendError> {
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        let io_err = |source| BackendError::Io {
            key: key.to_owned(),
            source,
        };
        std::fs::write(&tmp, value).map_err(io_err)?;
        std::fs::rename(&tmp, &path).map_err(io_err)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), BackendError> {
        match std::fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(BackendError::Io {
                key: key.to_owned(),
                source,
            }),
        }
    }
}
