//! Default starting feed shown on first load.
//!
//! Three circles, two moments and seven posts spread across the home,
//! circle and moment feeds. Timestamps are relative to the load time, so a
//! seed record that was never persisted always arrives fresh. Persisted
//! copies win over these during the merge.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, TimeDelta, Utc};
use tonyn_types::{
    Circle, CircleId, Comment, CommentId, ContainerType, Identity, Moment, MomentId, Post, PostId,
    PostKind,
};

/// Seed collections merged under persisted data at initialization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedData {
    /// Identity used when none is persisted.
    pub identity: Identity,
    /// Seed posts.
    pub posts: Vec<Post>,
    /// Seed circles.
    pub circles: Vec<Circle>,
    /// Seed moments.
    pub moments: Vec<Moment>,
}

impl SeedData {
    /// No seed content; only the default identity.
    pub fn empty() -> Self {
        Self::default()
    }
}

/// `now` shifted by `minutes` (negative for the past).
fn minutes_from(now: DateTime<Utc>, minutes: i64) -> DateTime<Utc> {
    TimeDelta::try_minutes(minutes)
        .and_then(|delta| now.checked_add_signed(delta))
        .unwrap_or(now)
}

fn members(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| (*name).to_owned()).collect()
}

fn reaction(symbol: &str, reactors: &[&str]) -> BTreeMap<String, BTreeSet<String>> {
    BTreeMap::from([(
        symbol.to_owned(),
        reactors.iter().map(|r| (*r).to_owned()).collect(),
    )])
}

fn comment(id: u64, author: &str, content: &str, created_at: DateTime<Utc>) -> Comment {
    Comment {
        id: CommentId(id),
        author: author.to_owned(),
        content: content.to_owned(),
        created_at,
    }
}

/// Template for one seed post; offsets are in minutes relative to load.
struct SeedPost<'a> {
    id: u64,
    container: (ContainerType, Option<u64>),
    author: &'a str,
    content: &'a str,
    age_minutes: i64,
    ttl_minutes_left: i64,
    comments: Vec<Comment>,
    reactions: BTreeMap<String, BTreeSet<String>>,
}

impl SeedPost<'_> {
    fn build(self, now: DateTime<Utc>) -> Post {
        let (container_type, scope) = self.container;
        Post {
            id: PostId(self.id),
            container_type,
            circle_id: scope
                .filter(|_| container_type == ContainerType::Circle)
                .map(CircleId),
            moment_id: scope
                .filter(|_| container_type == ContainerType::Moment)
                .map(MomentId),
            kind: PostKind::Text,
            author_display_name: self.author.to_owned(),
            content: self.content.to_owned(),
            created_at: minutes_from(now, self.age_minutes.saturating_neg()),
            expires_at: minutes_from(now, self.ttl_minutes_left),
            comments: self.comments,
            reactions: self.reactions,
            view_once: false,
            image_data: None,
        }
    }
}

/// Build the default starting feed as seen at `now`.
pub fn starting_feed(now: DateTime<Utc>) -> SeedData {
    let circles = vec![
        Circle {
            id: CircleId(1),
            title: "Quiet Creators".to_owned(),
            members: members(&["You", "Anon", "TempName"]),
        },
        Circle {
            id: CircleId(2),
            title: "Night Owls".to_owned(),
            members: members(&["You", "Beacon", "Anon"]),
        },
        Circle {
            id: CircleId(3),
            title: "Soft Launch".to_owned(),
            members: members(&["You", "Studio", "TempName"]),
        },
    ];

    let moments = vec![
        Moment {
            id: MomentId(1),
            title: "Morning Check-in".to_owned(),
            ends_at: minutes_from(now, 42),
            member_count: 8,
        },
        Moment {
            id: MomentId(2),
            title: "Evening Reset".to_owned(),
            ends_at: minutes_from(now, 85),
            member_count: 5,
        },
    ];

    let templates = vec![
        SeedPost {
            id: 101,
            container: (ContainerType::Home, None),
            author: "Anon",
            content: "Keeping today quiet. Taking small steps.",
            age_minutes: 12,
            ttl_minutes_left: 48,
            comments: vec![comment(1, "TempName", "Same here.", minutes_from(now, -8))],
            reactions: reaction("🙂", &["anon"]),
        },
        SeedPost {
            id: 102,
            container: (ContainerType::Circle, Some(1)),
            author: "Studio",
            content: "New idea drop: short audio-only updates.",
            age_minutes: 30,
            ttl_minutes_left: 120,
            comments: Vec::new(),
            reactions: reaction("🔥", &["anon"]),
        },
        SeedPost {
            id: 103,
            container: (ContainerType::Moment, Some(1)),
            author: "Beacon",
            content: "Moment goal: one honest sentence.",
            age_minutes: 10,
            ttl_minutes_left: 25,
            comments: vec![comment(2, "Anon", "Here for it.", minutes_from(now, -6))],
            reactions: reaction("🫶", &["anon"]),
        },
        SeedPost {
            id: 104,
            container: (ContainerType::Home, None),
            author: "TempName",
            content: "No notifications. Just presence.",
            age_minutes: 5,
            ttl_minutes_left: 18,
            comments: Vec::new(),
            reactions: BTreeMap::new(),
        },
        SeedPost {
            id: 105,
            container: (ContainerType::Circle, Some(2)),
            author: "Anon",
            content: "Night Owls: write your one line for today.",
            age_minutes: 40,
            ttl_minutes_left: 200,
            comments: vec![comment(3, "You", "Done.", minutes_from(now, -4))],
            reactions: reaction("🙂", &["anon", "temp"]),
        },
        SeedPost {
            id: 106,
            container: (ContainerType::Moment, Some(2)),
            author: "TempName",
            content: "Reset: breathe in, breathe out.",
            age_minutes: 22,
            ttl_minutes_left: 35,
            comments: Vec::new(),
            reactions: reaction("🫶", &["anon"]),
        },
        SeedPost {
            id: 107,
            container: (ContainerType::Home, None),
            author: "Studio",
            content: "Remember: moments end, meaning stays.",
            age_minutes: 2,
            ttl_minutes_left: 78,
            comments: Vec::new(),
            reactions: BTreeMap::new(),
        },
    ];

    SeedData {
        identity: Identity::default(),
        posts: templates.into_iter().map(|t| t.build(now)).collect(),
        circles,
        moments,
    }
}
