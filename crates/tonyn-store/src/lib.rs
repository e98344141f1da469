//! Ephemeral store for the Tonyn feed.
//!
//! Owns posts, circles and moments with TTL expiry, reconciles persisted
//! state with the built-in starting feed at load, and tracks view-once
//! image reveals across a session tier and a durable tier.
//!
//! # Modules
//!
//! - [`backend`] -- [`KeyValueBackend`] trait, in-memory and file backends
//! - [`countdown`] -- Remaining-time labels for posts and moments
//! - [`error`] -- Backend and validation errors
//! - [`id_gen`] -- Monotonic time-based id allocation
//! - [`listener`] -- Change notifications handed to the render layer
//! - [`merge`] -- Merge-by-id of seed and persisted collections
//! - [`seed`] -- The default starting feed
//! - [`store`] -- [`EphemeralStore`], the lifecycle owner
//! - [`view_once`] -- Two-tier viewed-image tracking
//!
//! [`KeyValueBackend`]: backend::KeyValueBackend
//! [`EphemeralStore`]: store::EphemeralStore

pub mod backend;
pub mod countdown;
pub mod error;
pub mod id_gen;
pub mod listener;
pub mod merge;
mod persist;
pub mod seed;
pub mod store;
pub mod view_once;

pub use backend::{DEFAULT_KEY_PREFIX, FileBackend, KeyValueBackend, MemoryBackend, StorageKeys};
pub use countdown::{Countdown, CountdownStyle, format_countdown, format_short_countdown};
pub use error::{BackendError, StoreError};
pub use listener::{Change, ChangeListener, ListenerId, Snapshot};
pub use persist::PersistenceStatus;
pub use seed::{SeedData, starting_feed};
pub use store::{
    EphemeralStore, FeedScope, IdentityForm, PostContent, SessionSummary, StoreOptions,
    SweepReport,
};
pub use view_once::{RevealOutcome, ViewedImages};
