use uuid::Uuid;

use vidtube_types::models::{Comment, Like, LikeKind, LikeTarget, Playlist, Subscription, Tweet, User, Video};

use crate::error::StoreResult;

/// Result of a conditional edge insert.
#[derive(Debug, Clone, PartialEq)]
pub enum InsertOutcome<T> {
    /// The row was written.
    Inserted(T),
    /// A row with the same edge key already exists. Carries that row, or
    /// `None` if it was deleted again before it could be read back.
    AlreadyPresent(Option<T>),
}

/// Equality filter over likes. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LikeFilter {
    pub liked_by: Option<Uuid>,
    pub kind: Option<LikeKind>,
    /// Restricts to these target ids (`IN` semantics). Requires `kind`.
    pub target_ids: Option<Vec<Uuid>>,
}

impl LikeFilter {
    pub fn by(user: Uuid) -> Self {
        Self {
            liked_by: Some(user),
            ..Self::default()
        }
    }

    pub fn kind(mut self, kind: LikeKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Likes on exactly this target.
    pub fn on(mut self, target: LikeTarget) -> Self {
        self.kind = Some(target.kind());
        self.target_ids = Some(vec![target.id()]);
        self
    }

    /// Likes on any of these videos, by anyone.
    pub fn on_videos(ids: &[Uuid]) -> Self {
        Self {
            liked_by: None,
            kind: Some(LikeKind::Video),
            target_ids: Some(ids.to_vec()),
        }
    }

    pub fn matches(&self, like: &Like) -> bool {
        self.liked_by.is_none_or(|u| like.liked_by == u)
            && self.kind.is_none_or(|k| like.target.kind() == k)
            && self
                .target_ids
                .as_ref()
                .is_none_or(|ids| ids.contains(&like.target.id()))
    }
}

/// Equality filter over subscriptions. Unset fields match everything.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SubscriptionFilter {
    pub subscriber: Option<Uuid>,
    pub channel: Option<Uuid>,
}

impl SubscriptionFilter {
    pub fn channel(channel: Uuid) -> Self {
        Self {
            subscriber: None,
            channel: Some(channel),
        }
    }

    pub fn subscriber(subscriber: Uuid) -> Self {
        Self {
            subscriber: Some(subscriber),
            channel: None,
        }
    }

    pub fn edge(subscriber: Uuid, channel: Uuid) -> Self {
        Self {
            subscriber: Some(subscriber),
            channel: Some(channel),
        }
    }

    pub fn matches(&self, sub: &Subscription) -> bool {
        self.subscriber.is_none_or(|s| sub.subscriber == s)
            && self.channel.is_none_or(|c| sub.channel == c)
    }
}

/// Read/edge-write port the toggle engine and view builder run against.
///
/// Batch lookups (`*_by_ids`) return matches in any order and silently omit
/// unknown ids; joins re-key the result themselves. Listing methods return
/// rows in insertion order.
pub trait EntityStore: Send + Sync {
    /// Join lookup. `watch_history` may come back empty; `user_by_id` carries it.
    fn users_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<User>>;

    /// `username` is compared against the stored (lowercased) value.
    fn user_by_username(&self, username: &str) -> StoreResult<Option<User>>;

    fn videos_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Video>>;
    fn videos_by_owner(&self, owner: Uuid) -> StoreResult<Vec<Video>>;

    fn comments_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Comment>>;
    fn comments_by_videos(&self, video_ids: &[Uuid]) -> StoreResult<Vec<Comment>>;

    fn tweets_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Tweet>>;

    fn playlists_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Playlist>>;
    fn playlists_by_owner(&self, owner: Uuid) -> StoreResult<Vec<Playlist>>;

    fn likes(&self, filter: &LikeFilter) -> StoreResult<Vec<Like>>;
    fn subscriptions(&self, filter: &SubscriptionFilter) -> StoreResult<Vec<Subscription>>;

    /// Insert unless a like for the same `(liked_by, target)` exists.
    fn insert_like(&self, like: &Like) -> StoreResult<InsertOutcome<Like>>;
    /// Returns whether a row was deleted.
    fn delete_like(&self, id: Uuid) -> StoreResult<bool>;

    /// Insert unless a subscription for the same `(subscriber, channel)` exists.
    fn insert_subscription(&self, sub: &Subscription) -> StoreResult<InsertOutcome<Subscription>>;
    /// Returns whether a row was deleted.
    fn delete_subscription(&self, id: Uuid) -> StoreResult<bool>;

    fn user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.users_by_ids(&[id])?.into_iter().next())
    }

    fn video_by_id(&self, id: Uuid) -> StoreResult<Option<Video>> {
        Ok(self.videos_by_ids(&[id])?.into_iter().next())
    }

    fn comment_by_id(&self, id: Uuid) -> StoreResult<Option<Comment>> {
        Ok(self.comments_by_ids(&[id])?.into_iter().next())
    }

    fn tweet_by_id(&self, id: Uuid) -> StoreResult<Option<Tweet>> {
        Ok(self.tweets_by_ids(&[id])?.into_iter().next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn like(liked_by: Uuid, target: LikeTarget) -> Like {
        Like {
            id: Uuid::new_v4(),
            liked_by,
            target,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn like_filter_combines_fields() {
        let user = Uuid::new_v4();
        let video = Uuid::new_v4();
        let on_video = like(user, LikeTarget::Video(video));
        let on_comment = like(user, LikeTarget::Comment(video));

        assert!(LikeFilter::by(user).matches(&on_comment));
        assert!(LikeFilter::by(user).kind(LikeKind::Video).matches(&on_video));
        assert!(!LikeFilter::by(user).kind(LikeKind::Video).matches(&on_comment));
        assert!(LikeFilter::by(user).on(LikeTarget::Video(video)).matches(&on_video));
        assert!(!LikeFilter::by(Uuid::new_v4()).matches(&on_video));
        assert!(!LikeFilter::on_videos(&[]).matches(&on_video));
        assert!(LikeFilter::default().matches(&on_comment));
    }

    #[test]
    fn subscription_filter_edge() {
        let sub = Subscription {
            id: Uuid::new_v4(),
            subscriber: Uuid::new_v4(),
            channel: Uuid::new_v4(),
            created_at: Utc::now(),
        };
        assert!(SubscriptionFilter::edge(sub.subscriber, sub.channel).matches(&sub));
        assert!(!SubscriptionFilter::edge(sub.channel, sub.subscriber).matches(&sub));
        assert!(SubscriptionFilter::channel(sub.channel).matches(&sub));
    }
}
