//! Error types for the ephemeral store.
//!
//! Only input rejections surface to callers as [`StoreError`]. Backend
//! failures ([`BackendError`]) are caught inside the store, logged, and
//! downgrade persistence to in-memory-only; they never abort an operation.

/// Errors raised by a [`KeyValueBackend`](crate::backend::KeyValueBackend).
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// Reading or writing the underlying file failed.
    #[error("I/O error on key {key}: {source}")]
    Io {
        /// The key being accessed.
        key: String,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The write would exceed the backend's storage quota.
    #[error("quota exceeded writing {key}: {needed} bytes needed, limit {limit}")]
    QuotaExceeded {
        /// The key being written.
        key: String,
        /// Total bytes the key space would occupy after the write.
        needed: usize,
        /// Configured quota in bytes.
        limit: usize,
    },

    /// The backend cannot be reached at all.
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

/// Rejections for store operations with invalid input.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum StoreError {
    /// Post text was empty after trimming.
    #[error("post content is empty")]
    EmptyContent,

    /// Image post without image data.
    #[error("image post has no image data")]
    MissingImage,

    /// Circle or moment title was empty after trimming.
    #[error("title is empty")]
    EmptyTitle,

    /// Time-to-live must be at least one second.
    #[error("invalid ttl: {ttl_seconds}s (must be at least 1)")]
    InvalidTtl {
        /// The rejected value.
        ttl_seconds: u64,
    },

    /// Moment duration must be at least one second.
    #[error("invalid duration: {duration_seconds}s (must be at least 1)")]
    InvalidDuration {
        /// The rejected value.
        duration_seconds: u64,
    },

    /// Adding the lifetime to `now` left the representable time range.
    #[error("timestamp overflow computing expiry")]
    TimestampOverflow,
}
