//! Change listener that stands in for the render layer.
//!
//! The headless runtime has no pages to redraw, so each notification is
//! written to the log with the counts a page would display.

use tonyn_store::{Change, ChangeListener, Snapshot, format_countdown};
use tracing::{debug, info};

/// Logs every store change.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogListener;

/// Short name of a change for log fields.
pub const fn change_kind(change: &Change) -> &'static str {
    match change {
        Change::Swept { .. } => "swept",
        Change::PostCreated(_) => "post_created",
        Change::ReactionToggled { .. } => "reaction_toggled",
        Change::ImageRevealed(_) => "image_revealed",
        Change::CircleCreated(_) => "circle_created",
        Change::MomentCreated(_) => "moment_created",
        Change::IdentityUpdated => "identity_updated",
    }
}

impl ChangeListener for LogListener {
    fn on_change(&mut self, snapshot: &Snapshot<'_>) {
        let kind = change_kind(snapshot.change);

        match snapshot.change {
            Change::Swept { posts, moments } => info!(
                kind,
                removed_posts = posts.len(),
                removed_moments = moments.len(),
                live_posts = snapshot.posts.len(),
                open_moments = snapshot.moments.len(),
                "Feed redraw"
            ),
            Change::PostCreated(id) => {
                if let Some(post) = snapshot.posts.iter().find(|p| p.id == *id) {
                    info!(
                        kind,
                        post_id = %id,
                        author = %post.author_display_name,
                        lifetime = %format_countdown(post.expires_at, post.created_at),
                        "Feed redraw"
                    );
                }
            }
            _ => debug!(
                kind,
                live_posts = snapshot.posts.len(),
                viewed_this_session = snapshot.viewed_session.len(),
                identity = %snapshot.identity.summary(),
                "Feed redraw"
            ),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{TimeZone, Utc};
    use tonyn_store::{
        EphemeralStore, FeedScope, MemoryBackend, PostContent, SeedData, StoreOptions,
    };
    use tonyn_types::PostId;

    use super::*;

    #[test]
    fn change_kinds_are_distinct() {
        let kinds = [
            change_kind(&Change::Swept {
                posts: Vec::new(),
                moments: Vec::new(),
            }),
            change_kind(&Change::PostCreated(PostId(1))),
            change_kind(&Change::ImageRevealed(PostId(1))),
            change_kind(&Change::IdentityUpdated),
        ];
        let unique: std::collections::BTreeSet<_> = kinds.iter().collect();
        assert_eq!(unique.len(), kinds.len());
    }

    #[test]
    fn listens_to_a_store() {
        let now = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();
        let mut store = EphemeralStore::initialize(
            MemoryBackend::new(),
            SeedData::empty(),
            &StoreOptions::default(),
            now,
        );
        let id = store.subscribe(LogListener);
        let post = store
            .create_post(FeedScope::Home, PostContent::Text("hi".to_owned()), 60, now)
            .unwrap();
        assert!(store.toggle_reaction(post, "🙂", "you", now).is_some());
        let expiry = now.checked_add_signed(chrono::TimeDelta::seconds(60)).unwrap();
        assert_eq!(store.sweep(expiry).removed_posts, vec![post]);
        assert!(store.unsubscribe(id));
    }
}
