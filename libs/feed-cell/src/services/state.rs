//! Feed view-state store with typed actions.
//!
//! User actions are applied optimistically and tagged with a correlation id;
//! the authoritative change stream is merged afterwards, last-writer-wins
//! keyed by record id. A remote event carrying a correlation id that was
//! already applied locally is the echo of our own write and is dropped, so
//! an action is never counted twice however the races land.

use std::collections::{BTreeMap, HashSet};
use uuid::Uuid;

use crate::models::{ChangeEvent, ChangeKind, FeedTable};

#[derive(Debug, Clone, PartialEq)]
pub struct PostSnapshot {
    pub id: Uuid,
    pub body: String,
    pub like_count: i64,
    pub comment_count: i64,
}

impl PostSnapshot {
    fn from_record(record: &serde_json::Value) -> Option<Self> {
        Some(Self {
            id: record.get("id")?.as_str().and_then(|s| Uuid::parse_str(s).ok())?,
            body: record.get("body")?.as_str()?.to_string(),
            like_count: record.get("like_count").and_then(|v| v.as_i64()).unwrap_or(0),
            comment_count: record.get("comment_count").and_then(|v| v.as_i64()).unwrap_or(0),
        })
    }
}

#[derive(Debug, Clone)]
pub enum FeedMutation {
    PostCreated(PostSnapshot),
    LikeAdded { activity_id: Uuid },
    LikeRemoved { activity_id: Uuid },
    CommentAdded { activity_id: Uuid },
}

#[derive(Debug, Clone)]
pub enum FeedAction {
    /// Reflect a user action immediately, before the backend confirms it.
    Optimistic {
        correlation_id: Uuid,
        mutation: FeedMutation,
    },
    /// Merge one event from the authoritative change stream.
    Remote(ChangeEvent),
}

#[derive(Debug, Default)]
pub struct FeedState {
    posts: BTreeMap<Uuid, PostSnapshot>,
    applied_tags: HashSet<Uuid>,
}

impl FeedState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn post(&self, id: Uuid) -> Option<&PostSnapshot> {
        self.posts.get(&id)
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    /// Seed the store from a fetched page.
    pub fn load(&mut self, posts: impl IntoIterator<Item = PostSnapshot>) {
        for post in posts {
            self.posts.insert(post.id, post);
        }
    }

    pub fn apply(&mut self, action: FeedAction) {
        match action {
            FeedAction::Optimistic { correlation_id, mutation } => {
                self.applied_tags.insert(correlation_id);
                self.apply_mutation(mutation);
            }
            FeedAction::Remote(event) => self.apply_remote(event),
        }
    }

    fn apply_mutation(&mut self, mutation: FeedMutation) {
        match mutation {
            FeedMutation::PostCreated(post) => {
                self.posts.entry(post.id).or_insert(post);
            }
            FeedMutation::LikeAdded { activity_id } => {
                if let Some(post) = self.posts.get_mut(&activity_id) {
                    post.like_count += 1;
                }
            }
            FeedMutation::LikeRemoved { activity_id } => {
                if let Some(post) = self.posts.get_mut(&activity_id) {
                    post.like_count = (post.like_count - 1).max(0);
                }
            }
            FeedMutation::CommentAdded { activity_id } => {
                if let Some(post) = self.posts.get_mut(&activity_id) {
                    post.comment_count += 1;
                }
            }
        }
    }

    fn apply_remote(&mut self, event: ChangeEvent) {
        // Echo of an already-applied optimistic write: drop it. Each tag is
        // consumed once; the set stays bounded at in-flight actions.
        if let Some(tag) = event.client_tag() {
            if self.applied_tags.remove(&tag) {
                return;
            }
        }

        match event.table {
            FeedTable::Activities => self.apply_activity_event(&event),
            FeedTable::ActivityLikes => self.apply_counter_event(&event, Counter::Likes),
            FeedTable::ActivityComments => self.apply_counter_event(&event, Counter::Comments),
            FeedTable::Notifications => {}
        }
    }

    fn apply_activity_event(&mut self, event: &ChangeEvent) {
        let Some(id) = event.record_id() else { return };

        match event.kind {
            ChangeKind::Insert => {
                // Id-presence dedup: a post already in the store stays as-is
                if !self.posts.contains_key(&id) {
                    if let Some(post) = PostSnapshot::from_record(&event.record) {
                        self.posts.insert(id, post);
                    }
                }
            }
            ChangeKind::Update => {
                // Last-writer-wins by record id
                if let Some(post) = PostSnapshot::from_record(&event.record) {
                    self.posts.insert(id, post);
                }
            }
            ChangeKind::Delete => {
                self.posts.remove(&id);
            }
        }
    }

    fn apply_counter_event(&mut self, event: &ChangeEvent, counter: Counter) {
        let Some(activity_id) = event.activity_id() else { return };
        let Some(post) = self.posts.get_mut(&activity_id) else { return };

        let delta = match event.kind {
            ChangeKind::Insert => 1,
            ChangeKind::Delete => -1,
            ChangeKind::Update => 0,
        };

        match counter {
            Counter::Likes => post.like_count = (post.like_count + delta).max(0),
            Counter::Comments => post.comment_count = (post.comment_count + delta).max(0),
        }
    }
}

enum Counter {
    Likes,
    Comments,
}
