use anyhow::anyhow;
use chrono::Utc;
use uuid::Uuid;

use vidtube_types::models::{Comment, Like, Playlist, Subscription, Tweet, User, Video};

use crate::error::{StoreError, StoreResult};
use crate::memory::MemoryStore;
use crate::store::{EntityStore, InsertOutcome, LikeFilter, SubscriptionFilter};

pub struct World {
    pub owner: User,
    pub viewer: User,
    pub video: Video,
    pub comment: Comment,
    pub tweet: Tweet,
}

pub fn user(username: &str) -> User {
    let now = Utc::now();
    User {
        id: Uuid::new_v4(),
        username: username.to_string(),
        email: format!("{username}@example.com"),
        full_name: format!("{username} full"),
        avatar: format!("avatars/{username}.png"),
        cover_image: None,
        password_hash: "hash".to_string(),
        refresh_token: Some("refresh".to_string()),
        watch_history: Vec::new(),
        created_at: now,
        updated_at: now,
    }
}

pub fn video(owner: Uuid, title: &str) -> Video {
    let now = Utc::now();
    Video {
        id: Uuid::new_v4(),
        owner_id: owner,
        video_ref: format!("videos/{title}.mp4"),
        thumbnail_ref: format!("thumbs/{title}.jpg"),
        title: title.to_string(),
        description: format!("about {title}"),
        duration: 42.0,
        is_published: true,
        created_at: now,
        updated_at: now,
    }
}

pub fn comment(video: Uuid, owner: Uuid, content: &str) -> Comment {
    let now = Utc::now();
    Comment {
        id: Uuid::new_v4(),
        video_id: video,
        owner_id: owner,
        content: content.to_string(),
        created_at: now,
        updated_at: now,
    }
}

pub fn playlist(owner: Uuid, name: &str, videos: Vec<Uuid>) -> Playlist {
    let now = Utc::now();
    Playlist {
        id: Uuid::new_v4(),
        owner_id: owner,
        name: name.to_string(),
        description: format!("{name} picks"),
        videos,
        created_at: now,
        updated_at: now,
    }
}

/// An owner with one video, a viewer who commented on it, and a tweet.
pub fn seeded() -> (MemoryStore, World) {
    let store = MemoryStore::new();
    let owner = user("owner");
    let viewer = user("viewer");
    let video = video(owner.id, "intro");
    let comment = comment(video.id, viewer.id, "nice");
    let now = Utc::now();
    let tweet = Tweet {
        id: Uuid::new_v4(),
        owner_id: owner.id,
        content: "new upload".to_string(),
        created_at: now,
        updated_at: now,
    };

    store.add_user(owner.clone()).unwrap();
    store.add_user(viewer.clone()).unwrap();
    store.add_video(video.clone()).unwrap();
    store.add_comment(comment.clone()).unwrap();
    store.add_tweet(tweet.clone()).unwrap();

    (
        store,
        World {
            owner,
            viewer,
            video,
            comment,
            tweet,
        },
    )
}

fn down<T>() -> StoreResult<T> {
    Err(StoreError::from(anyhow!("connection refused")))
}

/// Every call fails, as a store with a dead connection would.
pub struct FailingStore;

impl EntityStore for FailingStore {
    fn users_by_ids(&self, _: &[Uuid]) -> StoreResult<Vec<User>> {
        down()
    }
    fn user_by_username(&self, _: &str) -> StoreResult<Option<User>> {
        down()
    }
    fn videos_by_ids(&self, _: &[Uuid]) -> StoreResult<Vec<Video>> {
        down()
    }
    fn videos_by_owner(&self, _: Uuid) -> StoreResult<Vec<Video>> {
        down()
    }
    fn comments_by_ids(&self, _: &[Uuid]) -> StoreResult<Vec<Comment>> {
        down()
    }
    fn comments_by_videos(&self, _: &[Uuid]) -> StoreResult<Vec<Comment>> {
        down()
    }
    fn tweets_by_ids(&self, _: &[Uuid]) -> StoreResult<Vec<Tweet>> {
        down()
    }
    fn playlists_by_ids(&self, _: &[Uuid]) -> StoreResult<Vec<Playlist>> {
        down()
    }
    fn playlists_by_owner(&self, _: Uuid) -> StoreResult<Vec<Playlist>> {
        down()
    }
    fn likes(&self, _: &LikeFilter) -> StoreResult<Vec<Like>> {
        down()
    }
    fn subscriptions(&self, _: &SubscriptionFilter) -> StoreResult<Vec<Subscription>> {
        down()
    }
    fn insert_like(&self, _: &Like) -> StoreResult<InsertOutcome<Like>> {
        down()
    }
    fn delete_like(&self, _: Uuid) -> StoreResult<bool> {
        down()
    }
    fn insert_subscription(&self, _: &Subscription) -> StoreResult<InsertOutcome<Subscription>> {
        down()
    }
    fn delete_subscription(&self, _: Uuid) -> StoreResult<bool> {
        down()
    }
}

/// Delegates to a [`MemoryStore`] but never sees existing likes, like a
/// toggle whose read ran just before a concurrent insert committed.
pub struct StaleLikeReads<'a>(pub &'a MemoryStore);

impl EntityStore for StaleLikeReads<'_> {
    fn users_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<User>> {
        self.0.users_by_ids(ids)
    }
    fn user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        self.0.user_by_username(username)
    }
    fn videos_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Video>> {
        self.0.videos_by_ids(ids)
    }
    fn videos_by_owner(&self, owner: Uuid) -> StoreResult<Vec<Video>> {
        self.0.videos_by_owner(owner)
    }
    fn comments_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Comment>> {
        self.0.comments_by_ids(ids)
    }
    fn comments_by_videos(&self, ids: &[Uuid]) -> StoreResult<Vec<Comment>> {
        self.0.comments_by_videos(ids)
    }
    fn tweets_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Tweet>> {
        self.0.tweets_by_ids(ids)
    }
    fn playlists_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Playlist>> {
        self.0.playlists_by_ids(ids)
    }
    fn playlists_by_owner(&self, owner: Uuid) -> StoreResult<Vec<Playlist>> {
        self.0.playlists_by_owner(owner)
    }
    fn likes(&self, _: &LikeFilter) -> StoreResult<Vec<Like>> {
        Ok(Vec::new())
    }
    fn subscriptions(&self, filter: &SubscriptionFilter) -> StoreResult<Vec<Subscription>> {
        self.0.subscriptions(filter)
    }
    fn insert_like(&self, like: &Like) -> StoreResult<InsertOutcome<Like>> {
        self.0.insert_like(like)
    }
    fn delete_like(&self, id: Uuid) -> StoreResult<bool> {
        self.0.delete_like(id)
    }
    fn insert_subscription(&self, sub: &Subscription) -> StoreResult<InsertOutcome<Subscription>> {
        self.0.insert_subscription(sub)
    }
    fn delete_subscription(&self, id: Uuid) -> StoreResult<bool> {
        self.0.delete_subscription(id)
    }
}
