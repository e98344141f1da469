//! Two-tier tracking of view-once image reveals.
//!
//! Reveals land in a per-session set first and are folded into the durable
//! set only by [`ViewedImages::commit_session`]. If the process dies before
//! that, the session set is gone and the image can be revealed again on the
//! next load. The store persists the durable set only at commit, which
//! avoids a storage write on every reveal.

use std::collections::BTreeSet;

use tonyn_types::{PostId, ViewOnceState};

/// Result of a reveal attempt. None of these are errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealOutcome {
    /// First reveal; the image may be shown now.
    Revealed,
    /// Already revealed this session or in an earlier one.
    AlreadyRevealed,
    /// No live post with that id.
    NotFound,
    /// The post is not a view-once image.
    NotViewOnce,
    /// The session id is not the store's open session.
    SessionMismatch,
}

/// Durable and session tiers of revealed post ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewedImages {
    durable: BTreeSet<PostId>,
    session: BTreeSet<PostId>,
}

impl ViewedImages {
    /// Start from a persisted durable set with an empty session tier.
    pub const fn from_durable(durable: BTreeSet<PostId>) -> Self {
        Self {
            durable,
            session: BTreeSet::new(),
        }
    }

    /// Disclosure state of `post`.
    pub fn state(&self, post: PostId) -> ViewOnceState {
        if self.durable.contains(&post) {
            ViewOnceState::RevealedDurable
        } else if self.session.contains(&post) {
            ViewOnceState::RevealedThisSession
        } else {
            ViewOnceState::Unrevealed
        }
    }

    /// Move `post` from unrevealed to revealed-this-session.
    ///
    /// Returns `false` without changing anything if the post was already
    /// revealed in either tier.
    pub fn reveal(&mut self, post: PostId) -> bool {
        if self.state(post) != ViewOnceState::Unrevealed {
            return false;
        }
        self.session.insert(post)
    }

    /// Fold the session tier into the durable tier. Returns how many ids
    /// became durable.
    pub fn commit_session(&mut self) -> usize {
        let committed = self.session.len();
        self.durable.append(&mut self.session);
        committed
    }

    /// The durable tier.
    pub const fn durable(&self) -> &BTreeSet<PostId> {
        &self.durable
    }

    /// The session tier.
    pub const fn session(&self) -> &BTreeSet<PostId> {
        &self.session
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reveal_is_single_fire() {
        let mut viewed = ViewedImages::default();
        assert!(viewed.reveal(PostId(1)));
        assert!(!viewed.reveal(PostId(1)));
        assert_eq!(viewed.state(PostId(1)), ViewOnceState::RevealedThisSession);
    }

    #[test]
    fn commit_moves_session_to_durable() {
        let mut viewed = ViewedImages::default();
        viewed.reveal(PostId(1));
        viewed.reveal(PostId(2));
        assert_eq!(viewed.commit_session(), 2);
        assert!(viewed.session().is_empty());
        assert_eq!(viewed.state(PostId(2)), ViewOnceState::RevealedDurable);
        assert_eq!(viewed.commit_session(), 0);
    }

    #[test]
    fn durable_reveal_cannot_be_repeated() {
        let mut viewed = ViewedImages::from_durable(BTreeSet::from([PostId(9)]));
        assert!(!viewed.reveal(PostId(9)));
        assert!(viewed.session().is_empty());
    }
}
