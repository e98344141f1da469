//! Change notification for the render layer.
//!
//! After every mutation the store hands each subscribed [`ChangeListener`]
//! a borrowed [`Snapshot`] of its collections. Listeners redraw from the
//! snapshot; they never mutate the store.

use std::collections::BTreeSet;

use tonyn_types::{Circle, CircleId, Identity, Moment, MomentId, Post, PostId};

/// What triggered a notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    /// A sweep removed expired content.
    Swept {
        /// Removed post ids, in collection order.
        posts: Vec<PostId>,
        /// Removed moment ids, in collection order.
        moments: Vec<MomentId>,
    },
    /// A post was created.
    PostCreated(PostId),
    /// A reaction was added or removed.
    ReactionToggled {
        /// Target post.
        post: PostId,
        /// Reaction symbol.
        symbol: String,
        /// Whether the actor now holds the reaction.
        active: bool,
    },
    /// A view-once image was revealed for this session.
    ImageRevealed(PostId),
    /// A circle was created.
    CircleCreated(CircleId),
    /// A moment was created.
    MomentCreated(MomentId),
    /// The identity record changed.
    IdentityUpdated,
}

/// Read-only view of the store passed to listeners.
#[derive(Debug, Clone, Copy)]
pub struct Snapshot<'a> {
    /// The mutation that produced this snapshot.
    pub change: &'a Change,
    /// Current identity.
    pub identity: &'a Identity,
    /// Posts, most recent first. Expired posts stay here until the next
    /// sweep; check [`Post::is_live`].
    pub posts: &'a [Post],
    /// Circles.
    pub circles: &'a [Circle],
    /// Moments. Ended moments stay here until the next sweep.
    pub moments: &'a [Moment],
    /// Durable viewed-image ids.
    pub viewed_durable: &'a BTreeSet<PostId>,
    /// Ids revealed in the open session.
    pub viewed_session: &'a BTreeSet<PostId>,
}

/// Receiver of store change notifications.
pub trait ChangeListener: Send {
    /// Called after a mutation completes.
    fn on_change(&mut self, snapshot: &Snapshot<'_>);
}

impl<F> ChangeListener for F
where
    F: FnMut(&Snapshot<'_>) + Send,
{
    fn on_change(&mut self, snapshot: &Snapshot<'_>) {
        self(snapshot);
    }
}

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(pub(crate) u64);
