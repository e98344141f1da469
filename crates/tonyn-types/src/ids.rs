//! Type-safe identifier wrappers.
//!
//! Feed entities (posts, comments, circles, moments) carry integer ids so
//! that records written by the browser pages, which used
//! `Date.now()` values and small seed numbers, deserialize unchanged.
//! Sessions are identified by UUID v7.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Generates a transparent newtype wrapper around a `u64` entity id.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[serde(transparent)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(pub u64);

        impl $name {
            /// Return the inner integer value.
            pub const fn into_inner(self) -> u64 {
                self.0
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for u64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Unique identifier for a post in any container.
    PostId
}

define_id! {
    /// Identifier for a comment, unique within its parent post.
    CommentId
}

define_id! {
    /// Unique identifier for a circle (long-lived named group).
    CircleId
}

define_id! {
    /// Unique identifier for a moment (time-boxed named group).
    MomentId
}

/// Identifier for one browsing session (page load to page unload).
///
/// View-once reveals are tracked per session and only become durable
/// when the session with this id ends cleanly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(transparent)]
#[ts(export, export_to = "bindings/")]
pub struct SessionId(pub Uuid);

impl SessionId {
    /// Create a new session identifier using UUID v7 (time-ordered).
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Return the inner [`Uuid`] value.
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for SessionId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for SessionId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_ids_serialize_as_bare_numbers() {
        let json = serde_json::to_string(&PostId(101)).ok();
        assert_eq!(json.as_deref(), Some("101"));

        let restored: Result<CircleId, _> = serde_json::from_str("1700000000000");
        assert_eq!(restored.ok(), Some(CircleId(1_700_000_000_000)));
    }

    #[test]
    fn session_ids_are_unique() {
        let a = SessionId::new();
        let b = SessionId::new();
        assert_ne!(a, b);
        assert_ne!(a.into_inner(), Uuid::nil());
    }

    #[test]
    fn id_display_matches_inner() {
        assert_eq!(MomentId(7).to_string(), "7");
        let session = SessionId::new();
        assert_eq!(session.to_string(), session.into_inner().to_string());
    }
}
