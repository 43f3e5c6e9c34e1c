use uuid::Uuid;

use vidtube_core::{EntityStore, InsertOutcome, LikeFilter, StoreError, StoreResult, SubscriptionFilter};
use vidtube_types::models::{Comment, Like, Playlist, Subscription, Tweet, User, Video};

use crate::Database;
use crate::queries::{
    delete_by_id, insert_like_if_absent, insert_subscription_if_absent, query_comments, query_likes, query_playlists,
    query_subscriptions, query_tweets_by_ids, query_user_by_id, query_user_by_username, query_users_by_ids,
    query_videos,
};

impl EntityStore for Database {
    fn users_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<User>> {
        self.with_conn(|conn| query_users_by_ids(conn, ids)).map_err(StoreError::from)
    }

    fn user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        self.with_conn(|conn| query_user_by_id(conn, id)).map_err(StoreError::from)
    }

    fn user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        self.with_conn(|conn| query_user_by_username(conn, username)).map_err(StoreError::from)
    }

    fn videos_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Video>> {
        self.with_conn(|conn| query_videos(conn, "id", ids)).map_err(StoreError::from)
    }

    fn videos_by_owner(&self, owner: Uuid) -> StoreResult<Vec<Video>> {
        self.with_conn(|conn| query_videos(conn, "owner_id", &[owner])).map_err(StoreError::from)
    }

    fn comments_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Comment>> {
        self.with_conn(|conn| query_comments(conn, "id", ids)).map_err(StoreError::from)
    }

    fn comments_by_videos(&self, video_ids: &[Uuid]) -> StoreResult<Vec<Comment>> {
        self.with_conn(|conn| query_comments(conn, "video_id", video_ids)).map_err(StoreError::from)
    }

    fn tweets_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Tweet>> {
        self.with_conn(|conn| query_tweets_by_ids(conn, ids)).map_err(StoreError::from)
    }

    fn playlists_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Playlist>> {
        self.with_conn(|conn| query_playlists(conn, "id", ids)).map_err(StoreError::from)
    }

    fn playlists_by_owner(&self, owner: Uuid) -> StoreResult<Vec<Playlist>> {
        self.with_conn(|conn| query_playlists(conn, "owner_id", &[owner])).map_err(StoreError::from)
    }

    fn likes(&self, filter: &LikeFilter) -> StoreResult<Vec<Like>> {
        self.with_conn(|conn| query_likes(conn, filter)).map_err(StoreError::from)
    }

    fn subscriptions(&self, filter: &SubscriptionFilter) -> StoreResult<Vec<Subscription>> {
        self.with_conn(|conn| query_subscriptions(conn, filter)).map_err(StoreError::from)
    }

    fn insert_like(&self, like: &Like) -> StoreResult<InsertOutcome<Like>> {
        self.with_conn_mut(|conn| insert_like_if_absent(conn, like)).map_err(StoreError::from)
    }

    fn delete_like(&self, id: Uuid) -> StoreResult<bool> {
        self.with_conn_mut(|conn| delete_by_id(conn, "likes", id)).map_err(StoreError::from)
    }

    fn insert_subscription(&self, sub: &Subscription) -> StoreResult<InsertOutcome<Subscription>> {
        self.with_conn_mut(|conn| insert_subscription_if_absent(conn, sub)).map_err(StoreError::from)
    }

    fn delete_subscription(&self, id: Uuid) -> StoreResult<bool> {
        self.with_conn_mut(|conn| delete_by_id(conn, "subscriptions", id)).map_err(StoreError::from)
    }
}
