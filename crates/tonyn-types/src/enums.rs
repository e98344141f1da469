//! Enumeration types for the Tonyn feed.
//!
//! Wire names match the strings the browser pages wrote to local
//! storage (`"home"`, `"anonymous"`, ...), so existing records parse.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Containers and post kinds
// ---------------------------------------------------------------------------

/// The container a post belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum ContainerType {
    /// The shared home feed.
    Home,
    /// A circle's feed (requires a circle id on the post).
    Circle,
    /// A moment's feed (requires a moment id on the post).
    Moment,
}

/// What a post carries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum PostKind {
    /// Plain text content.
    #[default]
    Text,
    /// An encoded image, optionally view-once.
    Image,
}

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// How the current user is displayed on posts they author.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum IdentityMode {
    /// Always shown as "Anonymous".
    #[default]
    Anonymous,
    /// Shown under a temporary handle.
    Temporary,
    /// Real name inside circles, anonymous everywhere else.
    Real,
}

// ---------------------------------------------------------------------------
// View-once images
// ---------------------------------------------------------------------------

/// Disclosure state of a view-once image.
///
/// Transitions only move forward:
/// `Unrevealed -> RevealedThisSession -> RevealedDurable`. The second
/// transition happens exclusively at clean session end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum ViewOnceState {
    /// Not yet revealed in any session.
    Unrevealed,
    /// Revealed during the open session; not yet durable.
    RevealedThisSession,
    /// Recorded in the persisted viewed set.
    RevealedDurable,
}

/// How the render layer should present an image post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum ImagePresentation {
    /// Ordinary image, always visible.
    Visible,
    /// View-once image offering a single reveal.
    TapToReveal,
    /// View-once image revealed in this session; shown until session end.
    Showing,
    /// View-once image already consumed; permanently hidden.
    Viewed,
}

impl ImagePresentation {
    /// Presentation for a view-once image in the given disclosure state.
    pub const fn for_view_once(state: ViewOnceState) -> Self {
        match state {
            ViewOnceState::Unrevealed => Self::TapToReveal,
            ViewOnceState::RevealedThisSession => Self::Showing,
            ViewOnceState::RevealedDurable => Self::Viewed,
        }
    }

    /// Placeholder label shown instead of the image, if any.
    pub const fn placeholder(self) -> Option<&'static str> {
        match self {
            Self::Visible | Self::Showing => None,
            Self::TapToReveal => Some("Tap to view once"),
            Self::Viewed => Some("Image viewed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_names_match_stored_strings() {
        let home = serde_json::to_string(&ContainerType::Home).ok();
        assert_eq!(home.as_deref(), Some("\"home\""));
        let mode: Result<IdentityMode, _> = serde_json::from_str("\"temporary\"");
        assert_eq!(mode.ok(), Some(IdentityMode::Temporary));
        let kind: Result<PostKind, _> = serde_json::from_str("\"image\"");
        assert_eq!(kind.ok(), Some(PostKind::Image));
    }

    #[test]
    fn durable_reveal_is_never_offered_again() {
        let presentation = ImagePresentation::for_view_once(ViewOnceState::RevealedDurable);
        assert_eq!(presentation, ImagePresentation::Viewed);
        assert_eq!(presentation.placeholder(), Some("Image viewed"));
    }

    #[test]
    fn view_once_states_are_ordered() {
        assert!(ViewOnceState::Unrevealed < ViewOnceState::RevealedThisSession);
        assert!(ViewOnceState::RevealedThisSession < ViewOnceState::RevealedDurable);
    }
}
