//! The ephemeral store.
//!
//! [`EphemeralStore`] owns the feed collections, enforces expiry, merges
//! persisted data over seed data at load, and gates view-once reveals.
//! Every operation takes `now` explicitly; the store has no clock of its
//! own. Mutations write through to the backend immediately (except
//! reveals, which become durable at [`EphemeralStore::end_session`]) and
//! then notify subscribed listeners.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, TimeDelta, Utc};
use tonyn_types::{
    Circle, CircleId, ContainerType, IdentityMode, Identity, ImagePresentation, Moment, MomentId,
    Post, PostId, PostKind, SessionId, SessionRecord, ViewOnceState, DEFAULT_REAL_NAME,
    DEFAULT_TEMP_NAME,
};
use tracing::{debug, info, warn};

use crate::backend::{DEFAULT_KEY_PREFIX, KeyValueBackend, StorageKeys, StoreKey};
use crate::error::StoreError;
use crate::id_gen::IdGenerator;
use crate::listener::{Change, ChangeListener, ListenerId, Snapshot};
use crate::merge::merge_by_id;
use crate::persist::{Persistence, PersistenceStatus};
use crate::seed::SeedData;
use crate::view_once::{RevealOutcome, ViewedImages};

/// Member list used when a new circle names nobody.
const DEFAULT_CIRCLE_MEMBER: &str = "You";

/// Store construction options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreOptions {
    /// Prefix for every persisted key.
    pub key_prefix: String,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            key_prefix: DEFAULT_KEY_PREFIX.to_owned(),
        }
    }
}

/// Which feed a query or new post targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedScope {
    /// The home feed.
    Home,
    /// A circle's feed.
    Circle(CircleId),
    /// A moment's feed.
    Moment(MomentId),
}

impl FeedScope {
    /// Container type stored on posts in this scope.
    pub const fn container_type(self) -> ContainerType {
        match self {
            Self::Home => ContainerType::Home,
            Self::Circle(_) => ContainerType::Circle,
            Self::Moment(_) => ContainerType::Moment,
        }
    }

    /// Whether `post` belongs to this scope.
    pub fn contains(self, post: &Post) -> bool {
        match self {
            Self::Home => post.container_type == ContainerType::Home,
            Self::Circle(id) => post.in_circle(id),
            Self::Moment(id) => post.in_moment(id),
        }
    }
}

/// Body of a new post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostContent {
    /// Text post; trimmed, must not be empty.
    Text(String),
    /// Image post.
    Image {
        /// Opaque encoded image (e.g. a data URL).
        data: String,
        /// Optional caption.
        caption: String,
        /// Whether the image may be revealed only once.
        view_once: bool,
    },
}

/// Fields submitted from an identity form.
///
/// `None` leaves a name untouched; an empty string resets it to the
/// default handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityForm {
    /// New display mode.
    pub mode: IdentityMode,
    /// Temporary handle, if the form carried one.
    pub temp_name: Option<String>,
    /// Real name, if the form carried one.
    pub real_name: Option<String>,
}

/// What a sweep removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Removed post ids, in collection order.
    pub removed_posts: Vec<PostId>,
    /// Removed moment ids, in collection order.
    pub removed_moments: Vec<MomentId>,
}

impl SweepReport {
    /// Whether anything was removed.
    pub fn changed(&self) -> bool {
        !self.removed_posts.is_empty() || !self.removed_moments.is_empty()
    }
}

/// Result of ending a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    /// The session that ended.
    pub session_id: SessionId,
    /// When it started.
    pub started_at: DateTime<Utc>,
    /// When it ended.
    pub ended_at: DateTime<Utc>,
    /// Reveals that became durable.
    pub committed_reveals: usize,
}

/// Feed state with TTL expiry, merge-on-load and view-once tracking.
pub struct EphemeralStore<B> {
    persistence: Persistence<B>,
    identity: Identity,
    posts: Vec<Post>,
    circles: Vec<Circle>,
    moments: Vec<Moment>,
    viewed: ViewedImages,
    session: SessionRecord,
    ids: IdGenerator,
    listeners: Vec<(ListenerId, Box<dyn ChangeListener>)>,
    next_listener: u64,
}

impl<B: KeyValueBackend> EphemeralStore<B> {
    /// Load persisted state over `seed` and open a new session at `now`.
    ///
    /// Each collection is merged by id with persisted records winning.
    /// Missing or malformed persisted values fall back to the seed (or to
    /// empty / defaults) without error. Expired content is dropped, the
    /// reconciled state is written back, and a session marker is stored.
    pub fn initialize(backend: B, seed: SeedData, options: &StoreOptions, now: DateTime<Utc>) -> Self {
        let persistence = Persistence::new(backend, StorageKeys::new(&options.key_prefix));

        let identity = persistence
            .load::<Identity>(StoreKey::Identity)
            .unwrap_or(seed.identity);
        let posts = merge_by_id(
            seed.posts,
            persistence.load(StoreKey::Posts).unwrap_or_default(),
        );
        let circles = merge_by_id(
            seed.circles,
            persistence.load(StoreKey::Circles).unwrap_or_default(),
        );
        let moments = merge_by_id(
            seed.moments,
            persistence.load(StoreKey::Moments).unwrap_or_default(),
        );
        let durable: BTreeSet<PostId> = persistence
            .load(StoreKey::ViewedImages)
            .unwrap_or_default();

        if let Some(stale) = persistence.load::<SessionRecord>(StoreKey::Session) {
            warn!(
                session_id = %stale.id,
                started_at = %stale.started_at,
                "previous session did not end cleanly, its view-once reveals were not kept"
            );
        }

        let floor = posts
            .iter()
            .map(|p| p.id.into_inner())
            .chain(circles.iter().map(|c| c.id.into_inner()))
            .chain(moments.iter().map(|m| m.id.into_inner()))
            .max()
            .unwrap_or(0);

        let session = SessionRecord {
            id: SessionId::new(),
            started_at: now,
        };

        let mut store = Self {
            persistence,
            identity,
            posts,
            circles,
            moments,
            viewed: ViewedImages::from_durable(durable),
            session,
            ids: IdGenerator::starting_after(floor),
            listeners: Vec::new(),
            next_listener: 0,
        };

        let expired = store.remove_expired(now);
        store.persist_all();
        store
            .persistence
            .save(StoreKey::Session, &store.session);

        info!(
            session_id = %store.session.id,
            posts = store.posts.len(),
            circles = store.circles.len(),
            moments = store.moments.len(),
            viewed_images = store.viewed.durable().len(),
            expired_posts = expired.removed_posts.len(),
            expired_moments = expired.removed_moments.len(),
            "ephemeral store initialized"
        );

        store
    }

    // =========================================================================
    // Subscriptions
    // =========================================================================

    /// Register a listener for change notifications.
    pub fn subscribe(&mut self, listener: impl ChangeListener + 'static) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener = self.next_listener.saturating_add(1);
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a listener. Returns `false` if it was not subscribed.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() != before
    }

    fn notify(&mut self, change: Change) {
        if self.listeners.is_empty() {
            return;
        }
        let snapshot = Snapshot {
            change: &change,
            identity: &self.identity,
            posts: &self.posts,
            circles: &self.circles,
            moments: &self.moments,
            viewed_durable: self.viewed.durable(),
            viewed_session: self.viewed.session(),
        };
        for (_, listener) in &mut self.listeners {
            listener.on_change(&snapshot);
        }
    }

    // =========================================================================
    // Expiry
    // =========================================================================

    /// Remove every post and moment whose expiry is at or before `now`.
    ///
    /// Survivors keep their order. Sweeping again at the same `now` removes
    /// nothing. Persists and notifies only when something was removed.
    pub fn sweep(&mut self, now: DateTime<Utc>) -> SweepReport {
        let report = self.remove_expired(now);
        if !report.changed() {
            return report;
        }

        if !report.removed_posts.is_empty() {
            self.persistence.save(StoreKey::Posts, &self.posts);
        }
        if !report.removed_moments.is_empty() {
            self.persistence.save(StoreKey::Moments, &self.moments);
        }
        debug!(
            removed_posts = report.removed_posts.len(),
            removed_moments = report.removed_moments.len(),
            "swept expired content"
        );
        self.notify(Change::Swept {
            posts: report.removed_posts.clone(),
            moments: report.removed_moments.clone(),
        });
        report
    }

    fn remove_expired(&mut self, now: DateTime<Utc>) -> SweepReport {
        let mut report = SweepReport::default();
        self.posts.retain(|post| {
            let live = post.is_live(now);
            if !live {
                report.removed_posts.push(post.id);
            }
            live
        });
        self.moments.retain(|moment| {
            let active = moment.is_active(now);
            if !active {
                report.removed_moments.push(moment.id);
            }
            active
        });
        report
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Create a post in `scope` that lives for `ttl_seconds`.
    ///
    /// The post goes to the front of the collection and is persisted
    /// immediately. The author name comes from the current identity.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidTtl`] for a zero TTL,
    /// [`StoreError::EmptyContent`] for blank text,
    /// [`StoreError::MissingImage`] for an image post without data, and
    /// [`StoreError::TimestampOverflow`] if the expiry is unrepresentable.
    pub fn create_post(
        &mut self,
        scope: FeedScope,
        content: PostContent,
        ttl_seconds: u64,
        now: DateTime<Utc>,
    ) -> Result<PostId, StoreError> {
        if ttl_seconds == 0 {
            return Err(StoreError::InvalidTtl { ttl_seconds });
        }
        let expires_at = offset_seconds(now, ttl_seconds)?;

        let (kind, text, image_data, view_once) = match content {
            PostContent::Text(text) => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    return Err(StoreError::EmptyContent);
                }
                (PostKind::Text, trimmed.to_owned(), None, false)
            }
            PostContent::Image {
                data,
                caption,
                view_once,
            } => {
                if data.is_empty() {
                    return Err(StoreError::MissingImage);
                }
                (PostKind::Image, caption.trim().to_owned(), Some(data), view_once)
            }
        };

        let container_type = scope.container_type();
        let id = PostId(self.ids.next(now));
        let post = Post {
            id,
            container_type,
            circle_id: match scope {
                FeedScope::Circle(circle) => Some(circle),
                _ => None,
            },
            moment_id: match scope {
                FeedScope::Moment(moment) => Some(moment),
                _ => None,
            },
            kind,
            author_display_name: self.identity.display_name(container_type),
            content: text,
            created_at: now,
            expires_at,
            comments: Vec::new(),
            reactions: BTreeMap::new(),
            view_once,
            image_data,
        };

        self.posts.insert(0, post);
        self.persistence.save(StoreKey::Posts, &self.posts);
        info!(
            post_id = %id,
            container = ?container_type,
            kind = ?kind,
            view_once,
            ttl_seconds,
            "post created"
        );
        self.notify(Change::PostCreated(id));
        Ok(id)
    }

    /// Add `actor` to the reactors of `symbol` on a post, or remove them if
    /// already present.
    ///
    /// Returns whether the actor now holds the reaction, or `None` when
    /// the post does not exist or has expired at `now`, swept or not. A
    /// symbol left with no reactors is dropped, so toggling twice restores
    /// the record exactly.
    pub fn toggle_reaction(
        &mut self,
        post_id: PostId,
        symbol: &str,
        actor: &str,
        now: DateTime<Utc>,
    ) -> Option<bool> {
        let Some(post) = self
            .posts
            .iter_mut()
            .find(|p| p.id == post_id && p.is_live(now))
        else {
            debug!(post_id = %post_id, symbol, "reaction target not found or expired, ignoring");
            return None;
        };

        let reactors = post.reactions.entry(symbol.to_owned()).or_default();
        let active = if reactors.remove(actor) {
            false
        } else {
            reactors.insert(actor.to_owned());
            true
        };
        if reactors.is_empty() {
            post.reactions.remove(symbol);
        }

        self.persistence.save(StoreKey::Posts, &self.posts);
        debug!(post_id = %post_id, symbol, active, "reaction toggled");
        self.notify(Change::ReactionToggled {
            post: post_id,
            symbol: symbol.to_owned(),
            active,
        });
        Some(active)
    }

    /// Reveal a view-once image for the open session.
    ///
    /// Only the first reveal of a post returns [`RevealOutcome::Revealed`].
    /// The reveal stays in the session tier until [`Self::end_session`];
    /// nothing is written to the backend here. A post that has expired at
    /// `now` is [`RevealOutcome::NotFound`] even before the next sweep.
    pub fn reveal_view_once_image(
        &mut self,
        post_id: PostId,
        session_id: SessionId,
        now: DateTime<Utc>,
    ) -> RevealOutcome {
        if session_id != self.session.id {
            warn!(
                post_id = %post_id,
                session_id = %session_id,
                open_session = %self.session.id,
                "reveal requested for a session that is not open"
            );
            return RevealOutcome::SessionMismatch;
        }
        let Some(post) = self.post(post_id).filter(|p| p.is_live(now)) else {
            return RevealOutcome::NotFound;
        };
        if !post.is_view_once_image() {
            return RevealOutcome::NotViewOnce;
        }
        if !self.viewed.reveal(post_id) {
            debug!(post_id = %post_id, "view-once image already revealed");
            return RevealOutcome::AlreadyRevealed;
        }

        info!(post_id = %post_id, session_id = %session_id, "view-once image revealed");
        self.notify(Change::ImageRevealed(post_id));
        RevealOutcome::Revealed
    }

    /// Create a circle. Members are parsed from a comma-separated list;
    /// an empty list becomes just `"You"`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::EmptyTitle`] if the title is blank.
    pub fn create_circle(
        &mut self,
        title: &str,
        members_csv: &str,
        now: DateTime<Utc>,
    ) -> Result<CircleId, StoreError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(StoreError::EmptyTitle);
        }
        let mut members = parse_members(members_csv);
        if members.is_empty() {
            members.push(DEFAULT_CIRCLE_MEMBER.to_owned());
        }

        let id = CircleId(self.ids.next(now));
        self.circles.push(Circle {
            id,
            title: title.to_owned(),
            members,
        });
        self.persistence.save(StoreKey::Circles, &self.circles);
        info!(circle_id = %id, title, "circle created");
        self.notify(Change::CircleCreated(id));
        Ok(id)
    }

    /// Create a moment that ends `duration_seconds` after `now`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::EmptyTitle`] for a blank title,
    /// [`StoreError::InvalidDuration`] for a zero duration, and
    /// [`StoreError::TimestampOverflow`] if the end time is unrepresentable.
    pub fn create_moment(
        &mut self,
        title: &str,
        duration_seconds: u64,
        member_count: u32,
        now: DateTime<Utc>,
    ) -> Result<MomentId, StoreError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(StoreError::EmptyTitle);
        }
        if duration_seconds == 0 {
            return Err(StoreError::InvalidDuration { duration_seconds });
        }
        let ends_at = offset_seconds(now, duration_seconds)?;

        let id = MomentId(self.ids.next(now));
        self.moments.push(Moment {
            id,
            title: title.to_owned(),
            ends_at,
            member_count,
        });
        self.persistence.save(StoreKey::Moments, &self.moments);
        info!(moment_id = %id, title, duration_seconds, "moment created");
        self.notify(Change::MomentCreated(id));
        Ok(id)
    }

    /// Apply an identity form.
    pub fn update_identity(&mut self, form: IdentityForm) {
        self.identity.mode = form.mode;
        if let Some(name) = form.temp_name {
            self.identity.temp_name = non_blank_or(name, DEFAULT_TEMP_NAME);
        }
        if let Some(name) = form.real_name {
            self.identity.real_name = non_blank_or(name, DEFAULT_REAL_NAME);
        }
        self.persistence.save(StoreKey::Identity, &self.identity);
        info!(mode = ?self.identity.mode, "identity updated");
        self.notify(Change::IdentityUpdated);
    }

    /// End the session: fold this session's reveals into the durable set,
    /// persist it, and clear the session marker.
    ///
    /// This is the only place reveals become durable. A store dropped
    /// without calling this forgets the session's reveals.
    pub fn end_session(mut self, now: DateTime<Utc>) -> SessionSummary {
        let committed_reveals = self.viewed.commit_session();
        self.persistence
            .save(StoreKey::ViewedImages, self.viewed.durable());
        self.persistence.remove(StoreKey::Session);

        info!(
            session_id = %self.session.id,
            committed_reveals,
            durable_viewed = self.viewed.durable().len(),
            "session ended"
        );

        SessionSummary {
            session_id: self.session.id,
            started_at: self.session.started_at,
            ended_at: now,
            committed_reveals,
        }
    }

    fn persist_all(&mut self) {
        self.persistence.save(StoreKey::Identity, &self.identity);
        self.persistence.save(StoreKey::Posts, &self.posts);
        self.persistence.save(StoreKey::Circles, &self.circles);
        self.persistence.save(StoreKey::Moments, &self.moments);
        self.persistence
            .save(StoreKey::ViewedImages, self.viewed.durable());
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Sweep at `now`, then return the posts in `scope`, newest first.
    pub fn feed(&mut self, scope: FeedScope, now: DateTime<Utc>) -> Vec<&Post> {
        self.sweep(now);
        let mut posts: Vec<&Post> = self.posts.iter().filter(|p| scope.contains(p)).collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        posts
    }

    /// Whether the post exists and is live at `now`.
    pub fn is_live(&self, post_id: PostId, now: DateTime<Utc>) -> bool {
        self.post(post_id).is_some_and(|p| p.is_live(now))
    }

    /// Look up a post.
    pub fn post(&self, post_id: PostId) -> Option<&Post> {
        self.posts.iter().find(|p| p.id == post_id)
    }

    /// The circle with `id`, or the first circle if there is none.
    pub fn circle_or_first(&self, id: CircleId) -> Option<&Circle> {
        self.circles
            .iter()
            .find(|c| c.id == id)
            .or_else(|| self.circles.first())
    }

    /// The moment with `id`, or the first moment if there is none.
    pub fn moment_or_first(&self, id: MomentId) -> Option<&Moment> {
        self.moments
            .iter()
            .find(|m| m.id == id)
            .or_else(|| self.moments.first())
    }

    /// Moments still open at `now`.
    pub fn active_moments(&self, now: DateTime<Utc>) -> Vec<&Moment> {
        self.moments.iter().filter(|m| m.is_active(now)).collect()
    }

    /// Whether the moment has ended at `now`. A moment that has already
    /// been swept counts as ended.
    pub fn moment_has_ended(&self, id: MomentId, now: DateTime<Utc>) -> bool {
        self.moments
            .iter()
            .find(|m| m.id == id)
            .is_none_or(|m| !m.is_active(now))
    }

    /// Disclosure state of a post's view-once image.
    pub fn view_once_state(&self, post_id: PostId) -> ViewOnceState {
        self.viewed.state(post_id)
    }

    /// How to present a post's image, or `None` for missing, expired, or
    /// text posts.
    pub fn image_presentation(
        &self,
        post_id: PostId,
        now: DateTime<Utc>,
    ) -> Option<ImagePresentation> {
        let post = self.post(post_id).filter(|p| p.is_live(now))?;
        if post.kind != PostKind::Image {
            return None;
        }
        if !post.view_once {
            return Some(ImagePresentation::Visible);
        }
        Some(ImagePresentation::for_view_once(self.viewed.state(post_id)))
    }

    /// Current identity.
    pub const fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Posts, most recent first.
    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    /// Circles in creation order.
    pub fn circles(&self) -> &[Circle] {
        &self.circles
    }

    /// Moments in creation order.
    pub fn moments(&self) -> &[Moment] {
        &self.moments
    }

    /// Viewed-image tiers.
    pub const fn viewed_images(&self) -> &ViewedImages {
        &self.viewed
    }

    /// The open session's id.
    pub const fn session_id(&self) -> SessionId {
        self.session.id
    }

    /// The open session's record.
    pub const fn session(&self) -> &SessionRecord {
        &self.session
    }

    /// Whether recent writes reached the backend.
    pub const fn persistence_status(&self) -> PersistenceStatus {
        self.persistence.status
    }

    /// The backend.
    pub const fn backend(&self) -> &B {
        &self.persistence.backend
    }
}

fn offset_seconds(now: DateTime<Utc>, seconds: u64) -> Result<DateTime<Utc>, StoreError> {
    i64::try_from(seconds)
        .ok()
        .and_then(TimeDelta::try_seconds)
        .and_then(|delta| now.checked_add_signed(delta))
        .ok_or(StoreError::TimestampOverflow)
}

fn parse_members(csv: &str) -> Vec<String> {
    csv.split(',')
        .map(str::trim)
        .filter(|member| !member.is_empty())
        .map(str::to_owned)
        .collect()
}

fn non_blank_or(value: String, fallback: &str) -> String {
    if value.trim().is_empty() {
        fallback.to_owned()
    } else {
        value
    }
}
