//! Integration tests for the `tonyn-store` lifecycle.
//!
//! Each test drives an [`EphemeralStore`] through load, mutation, sweep and
//! session end against a shared backend, then reopens the backend to check
//! what survived.

#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::missing_panics_doc,
    clippy::too_many_lines,
    clippy::indexing_slicing
)]

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use tonyn_store::{
    EphemeralStore, FeedScope, FileBackend, KeyValueBackend, MemoryBackend, PersistenceStatus,
    PostContent, RevealOutcome, SeedData, StoreOptions, format_countdown, starting_feed,
};
use tonyn_types::{ImagePresentation, Post, PostId, SELF_REACTOR, ViewOnceState};

fn t0() -> DateTime<Utc> {
    Utc.timestamp_millis_opt(1_700_000_000_000).unwrap()
}

fn at(seconds: i64) -> DateTime<Utc> {
    t0().checked_add_signed(TimeDelta::seconds(seconds)).unwrap()
}

fn open<B: KeyValueBackend>(backend: B, seed: SeedData, now: DateTime<Utc>) -> EphemeralStore<B> {
    EphemeralStore::initialize(backend, seed, &StoreOptions::default(), now)
}

fn persisted_posts(backend: &MemoryBackend) -> Vec<Post> {
    let raw = backend.get("tonyn.posts").unwrap().expect("posts key written");
    serde_json::from_str(&raw).unwrap()
}

fn view_once_image() -> PostContent {
    PostContent::Image {
        data: "data:image/png;base64,AAAA".to_owned(),
        caption: "just once".to_owned(),
        view_once: true,
    }
}

#[test]
fn post_expires_and_disappears_from_storage() {
    let backend = MemoryBackend::new();
    let mut store = open(backend.clone(), SeedData::empty(), t0());

    let id = store
        .create_post(FeedScope::Home, PostContent::Text("brief".to_owned()), 60, t0())
        .unwrap();
    assert!(persisted_posts(&backend).iter().any(|p| p.id == id));
    assert_eq!(
        format_countdown(store.post(id).unwrap().expires_at, t0()),
        "1m left"
    );
    assert!(store.is_live(id, at(59)));

    let report = store.sweep(at(61));
    assert_eq!(report.removed_posts, vec![id]);
    assert!(store.post(id).is_none());
    assert!(persisted_posts(&backend).iter().all(|p| p.id != id));

    // A reload does not bring it back.
    let reloaded = open(backend, SeedData::empty(), at(62));
    assert!(reloaded.post(id).is_none());
}

#[test]
fn sweep_is_idempotent_and_keeps_survivor_order() {
    let mut store = open(MemoryBackend::new(), starting_feed(t0()), t0());
    let minutes_30 = t0().checked_add_signed(TimeDelta::minutes(30)).unwrap();

    let first = store.sweep(minutes_30);
    // 103 (+25m) and 104 (+18m) are gone; moments end at +42m and +85m.
    assert_eq!(first.removed_posts, vec![PostId(103), PostId(104)]);
    assert!(first.removed_moments.is_empty());

    let order: Vec<PostId> = store.posts().iter().map(|p| p.id).collect();
    assert_eq!(
        order,
        vec![PostId(101), PostId(102), PostId(105), PostId(106), PostId(107)]
    );
    assert!(!store.sweep(minutes_30).changed());
    assert_eq!(store.posts().len(), 5);
}

#[test]
fn persisted_records_win_over_seed_on_reload() {
    let backend = MemoryBackend::new();
    let mut store = open(backend.clone(), starting_feed(t0()), t0());
    assert_eq!(store.toggle_reaction(PostId(107), "🔥", SELF_REACTOR, t0()), Some(true));
    let mine = store
        .create_post(FeedScope::Home, PostContent::Text("mine".to_owned()), 3600, at(1))
        .unwrap();
    drop(store);

    let reloaded = open(backend, starting_feed(at(10)), at(10));
    let seeded = reloaded.post(PostId(107)).unwrap();
    assert!(seeded.reacted_by(SELF_REACTOR));
    // Persisted timestamps win too: the seed rebuilt at +10s is ignored.
    assert_eq!(
        Some(seeded.created_at),
        t0().checked_sub_signed(TimeDelta::minutes(2))
    );

    let ids: Vec<PostId> = reloaded.posts().iter().map(|p| p.id).collect();
    // Persisted order: the new post was inserted at the front, but the
    // merge keeps seed order first and appends unseen ids.
    assert_eq!(ids.len(), 8);
    assert_eq!(ids.last(), Some(&mine));
    assert_eq!(ids.iter().filter(|id| **id == PostId(107)).count(), 1);
}

#[test]
fn expired_seed_post_returns_fresh_on_next_load() {
    let backend = MemoryBackend::new();
    let mut store = open(backend.clone(), starting_feed(t0()), t0());
    let later = t0().checked_add_signed(TimeDelta::minutes(20)).unwrap();
    store.sweep(later);
    assert!(store.post(PostId(104)).is_none());
    drop(store);

    let reloaded = open(backend, starting_feed(later), later);
    let post = reloaded.post(PostId(104)).unwrap();
    assert!(post.is_live(later));
}

#[test]
fn reaction_toggle_round_trips_through_storage() {
    let backend = MemoryBackend::new();
    let mut store = open(backend.clone(), starting_feed(t0()), t0());
    let before = persisted_posts(&backend);

    store.toggle_reaction(PostId(101), "🫶", SELF_REACTOR, t0());
    assert_ne!(persisted_posts(&backend), before);
    store.toggle_reaction(PostId(101), "🫶", SELF_REACTOR, t0());
    assert_eq!(persisted_posts(&backend), before);
}

#[test]
fn reveal_is_single_fire_and_durable_after_clean_end() {
    let backend = MemoryBackend::new();
    let mut store = open(backend.clone(), SeedData::empty(), t0());
    let id = store
        .create_post(FeedScope::Home, view_once_image(), 600, t0())
        .unwrap();
    let session = store.session_id();

    assert_eq!(store.view_once_state(id), ViewOnceState::Unrevealed);
    assert_eq!(
        store.reveal_view_once_image(id, session, t0()),
        RevealOutcome::Revealed
    );
    assert_eq!(
        store.reveal_view_once_image(id, session, t0()),
        RevealOutcome::AlreadyRevealed
    );
    assert_eq!(store.view_once_state(id), ViewOnceState::RevealedThisSession);
    // Reveals are not written until the session ends.
    assert_eq!(backend.get("tonyn.viewedImages").unwrap().as_deref(), Some("[]"));
    assert!(backend.get("tonyn.session").unwrap().is_some());

    let summary = store.end_session(at(5));
    assert_eq!(summary.session_id, session);
    assert_eq!(summary.committed_reveals, 1);
    assert!(backend.get("tonyn.session").unwrap().is_none());

    let mut next = open(backend, SeedData::empty(), at(10));
    assert_ne!(next.session_id(), session);
    assert_eq!(next.view_once_state(id), ViewOnceState::RevealedDurable);
    let presentation = next.image_presentation(id, at(10)).unwrap();
    assert_eq!(presentation, ImagePresentation::Viewed);
    assert_eq!(presentation.placeholder(), Some("Image viewed"));
    assert_eq!(
        next.reveal_view_once_image(id, next.session_id(), at(10)),
        RevealOutcome::AlreadyRevealed
    );
}

#[test]
fn reveal_is_lost_when_session_never_ends() {
    let backend = MemoryBackend::new();
    let mut store = open(backend.clone(), SeedData::empty(), t0());
    let id = store
        .create_post(FeedScope::Home, view_once_image(), 600, t0())
        .unwrap();
    let session = store.session_id();
    assert_eq!(
        store.reveal_view_once_image(id, session, t0()),
        RevealOutcome::Revealed
    );

    // Simulated crash: no end_session.
    drop(store);
    assert!(backend.get("tonyn.session").unwrap().is_some());

    let mut next = open(backend.clone(), SeedData::empty(), at(10));
    assert_eq!(next.view_once_state(id), ViewOnceState::Unrevealed);
    assert_eq!(
        next.image_presentation(id, at(10)),
        Some(ImagePresentation::TapToReveal)
    );
    assert_eq!(
        next.reveal_view_once_image(id, next.session_id(), at(10)),
        RevealOutcome::Revealed
    );
    // The new session's marker replaced the stale one.
    let marker = backend.get("tonyn.session").unwrap().unwrap();
    assert!(marker.contains(&next.session_id().to_string()));
}

#[test]
fn expired_view_once_image_cannot_be_revealed_before_the_sweep() {
    let backend = MemoryBackend::new();
    let mut store = open(backend.clone(), SeedData::empty(), t0());
    let id = store
        .create_post(FeedScope::Home, view_once_image(), 60, t0())
        .unwrap();
    let session = store.session_id();
    let expires_at = store.post(id).unwrap().expires_at;
    let late = expires_at.checked_add_signed(TimeDelta::seconds(1)).unwrap();

    assert_eq!(
        store.reveal_view_once_image(id, session, late),
        RevealOutcome::NotFound
    );
    assert_eq!(store.image_presentation(id, late), None);
    assert_eq!(store.toggle_reaction(id, "🙂", SELF_REACTOR, late), None);
    assert_eq!(store.view_once_state(id), ViewOnceState::Unrevealed);

    let summary = store.end_session(late);
    assert_eq!(summary.committed_reveals, 0);
    assert_eq!(backend.get("tonyn.viewedImages").unwrap().as_deref(), Some("[]"));
}

#[test]
fn malformed_storage_falls_back_to_seed() {
    let mut backend = MemoryBackend::new();
    backend.set("tonyn.posts", "{not json").unwrap();
    backend.set("tonyn.identity", "").unwrap();
    backend.set("tonyn.viewedImages", "\"oops\"").unwrap();

    let store = open(backend.clone(), starting_feed(t0()), t0());
    assert_eq!(store.posts().len(), 7);
    assert!(store.viewed_images().durable().is_empty());
    assert_eq!(store.identity().summary(), "Mode: Anonymous");
    // The reconciled state replaced the malformed value.
    assert_eq!(persisted_posts(&backend).len(), 7);
}

#[test]
fn quota_exhaustion_degrades_to_memory_only() {
    let backend = MemoryBackend::with_quota(64);
    let mut store = open(backend.clone(), starting_feed(t0()), t0());
    assert_eq!(store.persistence_status(), PersistenceStatus::InMemoryOnly);

    // Everything still works in memory.
    let id = store
        .create_post(FeedScope::Home, PostContent::Text("kept".to_owned()), 60, t0())
        .unwrap();
    assert!(store.post(id).is_some());
    assert_eq!(store.persistence_status(), PersistenceStatus::InMemoryOnly);
    assert_eq!(store.toggle_reaction(id, "🙂", SELF_REACTOR, t0()), Some(true));
    assert!(store.sweep(at(60)).removed_posts.contains(&id));
    assert!(backend.used_bytes() <= 64);
}

#[test]
fn offline_backend_recovers_on_next_write() {
    let backend = MemoryBackend::new();
    let mut store = open(backend.clone(), SeedData::empty(), t0());
    assert_eq!(store.persistence_status(), PersistenceStatus::Durable);

    backend.set_offline(true);
    let lost = store
        .create_post(FeedScope::Home, PostContent::Text("lost".to_owned()), 60, t0())
        .unwrap();
    assert_eq!(store.persistence_status(), PersistenceStatus::InMemoryOnly);

    backend.set_offline(false);
    let kept = store
        .create_post(FeedScope::Home, PostContent::Text("kept".to_owned()), 60, at(1))
        .unwrap();
    assert_eq!(store.persistence_status(), PersistenceStatus::Durable);

    // The recovering write carries the whole collection.
    let ids: Vec<PostId> = persisted_posts(&backend).iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![kept, lost]);
}

#[test]
fn file_backend_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let backend = FileBackend::open(dir.path()).unwrap();
    let mut store = open(backend, starting_feed(t0()), t0());
    let circle = store.create_circle("Book Club", "Ana, Bo", t0()).unwrap();
    let id = store
        .create_post(
            FeedScope::Circle(circle),
            PostContent::Text("chapter 3".to_owned()),
            600,
            t0(),
        )
        .unwrap();
    store.end_session(at(1));
    assert!(dir.path().join("tonyn.posts.json").exists());
    assert!(!dir.path().join("tonyn.session.json").exists());

    let backend = FileBackend::open(dir.path()).unwrap();
    let mut reopened = open(backend, starting_feed(at(2)), at(2));
    assert_eq!(reopened.circles().len(), 4);
    let feed: Vec<PostId> = reopened
        .feed(FeedScope::Circle(circle), at(2))
        .iter()
        .map(|p| p.id)
        .collect();
    assert_eq!(feed, vec![id]);
}

#[test]
fn custom_prefix_isolates_key_space() {
    let backend = MemoryBackend::new();
    let options = StoreOptions {
        key_prefix: "alt:".to_owned(),
    };
    let store = EphemeralStore::initialize(backend.clone(), SeedData::empty(), &options, t0());
    store.end_session(at(1));
    assert!(backend.keys().iter().all(|k| k.starts_with("alt:")));
    assert!(backend.get("tonyn.posts").unwrap().is_none());
}
