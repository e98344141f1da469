//! Error types for the runtime binary.
//!
//! [`RuntimeError`] wraps every failure mode during startup and the
//! session run so `main` can propagate with `?`.

/// Top-level error for the runtime binary.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: tonyn_core::config::ConfigError,
    },

    /// The data directory could not be opened.
    #[error("backend error: {source}")]
    Backend {
        /// The underlying backend error.
        #[from]
        source: tonyn_store::BackendError,
    },

    /// The tick loop failed.
    #[error("runner error: {source}")]
    Runner {
        /// The underlying runner error.
        #[from]
        source: tonyn_core::runner::RunnerError,
    },
}
