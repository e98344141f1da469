//! Shared type definitions for the Tonyn ephemeral feed.
//!
//! This crate is the single source of truth for the records the store
//! persists and the render layer draws. Types flow downstream to
//! `TypeScript` via `ts-rs` so the browser pages consume the same shapes.
//!
//! # Modules
//!
//! - [`ids`] -- Typed identifiers for posts, comments, circles, moments, sessions
//! - [`enums`] -- Containers, post kinds, identity modes, view-once states
//! - [`structs`] -- Posts, comments, circles, moments, identity, session marker

pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{ContainerType, IdentityMode, ImagePresentation, PostKind, ViewOnceState};
pub use ids::{CircleId, CommentId, MomentId, PostId, SessionId};
pub use structs::{
    ANONYMOUS_NAME, Circle, Comment, DEFAULT_REAL_NAME, DEFAULT_TEMP_NAME, Identity, Moment, Post,
    REACTION_OPTIONS, SELF_REACTOR, SessionRecord,
};
