//! Core entity structs for the Tonyn feed.
//!
//! Field names serialize in camelCase and timestamps as epoch
//! milliseconds, which is the record shape kept in browser local storage.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{ContainerType, IdentityMode, PostKind};
use crate::ids::{CircleId, CommentId, MomentId, PostId, SessionId};

/// Reaction symbols offered on every post.
pub const REACTION_OPTIONS: [&str; 3] = ["🙂", "🔥", "🫶"];

/// Reactor id used for the local user.
pub const SELF_REACTOR: &str = "you";

/// Fallback temporary handle.
pub const DEFAULT_TEMP_NAME: &str = "TempName";

/// Fallback real name.
pub const DEFAULT_REAL_NAME: &str = "Real Name";

/// Name shown for anonymous authors.
pub const ANONYMOUS_NAME: &str = "Anonymous";

// ---------------------------------------------------------------------------
// Comment
// ---------------------------------------------------------------------------

/// A comment attached to a post. Lives and dies with its parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct Comment {
    /// Identifier within the parent post.
    pub id: CommentId,
    /// Display name of the commenter.
    pub author: String,
    /// Comment text.
    pub content: String,
    /// When the comment was written.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    #[ts(type = "number")]
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Post
// ---------------------------------------------------------------------------

/// An ephemeral post.
///
/// A post is live while `now < expires_at`. Liveness is derived on every
/// read and never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct Post {
    /// Unique post id.
    pub id: PostId,
    /// Which feed the post belongs to.
    pub container_type: ContainerType,
    /// Owning circle, for circle posts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub circle_id: Option<CircleId>,
    /// Owning moment, for moment posts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub moment_id: Option<MomentId>,
    /// Text or image. Records without a type are text posts.
    #[serde(rename = "type", default)]
    pub kind: PostKind,
    /// Author name as resolved from the identity at creation time.
    pub author_display_name: String,
    /// Text content (caption for image posts).
    #[serde(default)]
    pub content: String,
    /// Creation time.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    #[ts(type = "number")]
    pub created_at: DateTime<Utc>,
    /// Expiry time; always strictly after `created_at`.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    #[ts(type = "number")]
    pub expires_at: DateTime<Utc>,
    /// Comments in display order.
    #[serde(default)]
    pub comments: Vec<Comment>,
    /// Reaction symbol to the set of reactor ids.
    #[serde(default)]
    pub reactions: BTreeMap<String, BTreeSet<String>>,
    /// Whether the image may be revealed only once (image posts only).
    #[serde(default)]
    pub view_once: bool,
    /// Opaque encoded image payload (image posts only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub image_data: Option<String>,
}

impl Post {
    /// Whether the post is still visible at `now`.
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }

    /// Whether this is an image post gated by a single reveal.
    pub fn is_view_once_image(&self) -> bool {
        self.kind == PostKind::Image && self.view_once
    }

    /// Whether `actor` has reacted with any symbol from the palette.
    pub fn reacted_by(&self, actor: &str) -> bool {
        REACTION_OPTIONS.iter().any(|symbol| {
            self.reactions
                .get(*symbol)
                .is_some_and(|reactors| reactors.contains(actor))
        })
    }

    /// Number of reactors for `symbol`.
    pub fn reaction_count(&self, symbol: &str) -> usize {
        self.reactions.get(symbol).map_or(0, BTreeSet::len)
    }

    /// Whether the post belongs to the given circle.
    pub fn in_circle(&self, circle: CircleId) -> bool {
        self.container_type == ContainerType::Circle && self.circle_id == Some(circle)
    }

    /// Whether the post belongs to the given moment.
    pub fn in_moment(&self, moment: MomentId) -> bool {
        self.container_type == ContainerType::Moment && self.moment_id == Some(moment)
    }
}

// ---------------------------------------------------------------------------
// Circle / Moment
// ---------------------------------------------------------------------------

/// A long-lived named group. Circles never expire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct Circle {
    /// Unique circle id.
    pub id: CircleId,
    /// Circle name.
    pub title: String,
    /// Member display names.
    #[serde(default)]
    pub members: Vec<String>,
}

/// A time-boxed named group, swept when `ends_at` passes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct Moment {
    /// Unique moment id.
    pub id: MomentId,
    /// Moment name.
    pub title: String,
    /// When the moment closes.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    #[ts(type = "number")]
    pub ends_at: DateTime<Utc>,
    /// Number of people inside.
    #[serde(default)]
    pub member_count: u32,
}

impl Moment {
    /// Whether the moment is still open at `now`.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        now < self.ends_at
    }
}

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// How the local user appears on the posts they write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct Identity {
    /// Display mode.
    #[serde(default)]
    pub mode: IdentityMode,
    /// Handle used in temporary mode.
    #[serde(default)]
    pub temp_name: String,
    /// Name used in real mode, inside circles only.
    #[serde(default)]
    pub real_name: String,
}

impl Default for Identity {
    fn default() -> Self {
        Self {
            mode: IdentityMode::Anonymous,
            temp_name: DEFAULT_TEMP_NAME.to_owned(),
            real_name: DEFAULT_REAL_NAME.to_owned(),
        }
    }
}

impl Identity {
    /// Author name for a post created in `container`.
    ///
    /// Real names are only disclosed inside circles.
    pub fn display_name(&self, container: ContainerType) -> String {
        match (self.mode, container) {
            (IdentityMode::Temporary, _) => non_empty_or(&self.temp_name, DEFAULT_TEMP_NAME),
            (IdentityMode::Real, ContainerType::Circle) => {
                non_empty_or(&self.real_name, DEFAULT_REAL_NAME)
            }
            _ => ANONYMOUS_NAME.to_owned(),
        }
    }

    /// One-line summary of the current mode.
    pub fn summary(&self) -> String {
        match self.mode {
            IdentityMode::Anonymous => "Mode: Anonymous".to_owned(),
            IdentityMode::Temporary => {
                format!("Mode: {}", non_empty_or(&self.temp_name, DEFAULT_TEMP_NAME))
            }
            IdentityMode::Real => "Mode: Real name (circles)".to_owned(),
        }
    }
}

fn non_empty_or(value: &str, fallback: &str) -> String {
    if value.is_empty() {
        fallback.to_owned()
    } else {
        value.to_owned()
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Marker persisted while a session is open.
///
/// Finding one at load time means the previous session never ended
/// cleanly and its view-once reveals were dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct SessionRecord {
    /// Session identifier.
    pub id: SessionId,
    /// When the session opened.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    #[ts(type = "number")]
    pub started_at: DateTime<Utc>,
}
