//! In-process [`EntityStore`] backed by vectors in insertion order.
//!
//! Enforces the same edge uniqueness and self-subscription rules as the
//! SQLite adapter, so views and toggles can be exercised without a database.

use std::sync::{Mutex, MutexGuard};

use anyhow::anyhow;
use uuid::Uuid;

use vidtube_types::models::{Comment, Like, Playlist, Subscription, Tweet, User, Video};

use crate::error::{StoreError, StoreResult};
use crate::store::{EntityStore, InsertOutcome, LikeFilter, SubscriptionFilter};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    videos: Vec<Video>,
    comments: Vec<Comment>,
    tweets: Vec<Tweet>,
    playlists: Vec<Playlist>,
    likes: Vec<Like>,
    subscriptions: Vec<Subscription>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|e| StoreError::from(anyhow!("memory store lock poisoned: {}", e)))
    }

    pub fn add_user(&self, user: User) -> StoreResult<()> {
        self.lock()?.users.push(user);
        Ok(())
    }

    pub fn add_video(&self, video: Video) -> StoreResult<()> {
        self.lock()?.videos.push(video);
        Ok(())
    }

    pub fn add_comment(&self, comment: Comment) -> StoreResult<()> {
        self.lock()?.comments.push(comment);
        Ok(())
    }

    pub fn add_tweet(&self, tweet: Tweet) -> StoreResult<()> {
        self.lock()?.tweets.push(tweet);
        Ok(())
    }

    pub fn add_playlist(&self, playlist: Playlist) -> StoreResult<()> {
        self.lock()?.playlists.push(playlist);
        Ok(())
    }

    /// Removes the video only, leaving dangling references behind the way a
    /// partially cascaded delete would.
    pub fn remove_video(&self, id: Uuid) -> StoreResult<bool> {
        let mut tables = self.lock()?;
        let before = tables.videos.len();
        tables.videos.retain(|v| v.id != id);
        Ok(tables.videos.len() != before)
    }

    /// Appends to a user's watch history.
    pub fn push_watch(&self, user: Uuid, video: Uuid) -> StoreResult<bool> {
        let mut tables = self.lock()?;
        match tables.users.iter_mut().find(|u| u.id == user) {
            Some(u) => {
                u.watch_history.push(video);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

fn by_ids<T: Clone>(rows: &[T], ids: &[Uuid], id: impl Fn(&T) -> Uuid) -> Vec<T> {
    rows.iter().filter(|r| ids.contains(&id(r))).cloned().collect()
}

impl EntityStore for MemoryStore {
    fn users_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<User>> {
        Ok(by_ids(&self.lock()?.users, ids, |u| u.id))
    }

    fn user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        Ok(self.lock()?.users.iter().find(|u| u.username == username).cloned())
    }

    fn videos_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Video>> {
        Ok(by_ids(&self.lock()?.videos, ids, |v| v.id))
    }

    fn videos_by_owner(&self, owner: Uuid) -> StoreResult<Vec<Video>> {
        Ok(by_ids(&self.lock()?.videos, &[owner], |v| v.owner_id))
    }

    fn comments_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Comment>> {
        Ok(by_ids(&self.lock()?.comments, ids, |c| c.id))
    }

    fn comments_by_videos(&self, video_ids: &[Uuid]) -> StoreResult<Vec<Comment>> {
        Ok(by_ids(&self.lock()?.comments, video_ids, |c| c.video_id))
    }

    fn tweets_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Tweet>> {
        Ok(by_ids(&self.lock()?.tweets, ids, |t| t.id))
    }

    fn playlists_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Playlist>> {
        Ok(by_ids(&self.lock()?.playlists, ids, |p| p.id))
    }

    fn playlists_by_owner(&self, owner: Uuid) -> StoreResult<Vec<Playlist>> {
        Ok(by_ids(&self.lock()?.playlists, &[owner], |p| p.owner_id))
    }

    fn likes(&self, filter: &LikeFilter) -> StoreResult<Vec<Like>> {
        Ok(self.lock()?.likes.iter().filter(|l| filter.matches(l)).cloned().collect())
    }

    fn subscriptions(&self, filter: &SubscriptionFilter) -> StoreResult<Vec<Subscription>> {
        Ok(self
            .lock()?
            .subscriptions
            .iter()
            .filter(|s| filter.matches(s))
            .cloned()
            .collect())
    }

    fn insert_like(&self, like: &Like) -> StoreResult<InsertOutcome<Like>> {
        let mut tables = self.lock()?;
        let existing = tables
            .likes
            .iter()
            .find(|l| l.liked_by == like.liked_by && l.target == like.target)
            .cloned();
        if existing.is_some() {
            return Ok(InsertOutcome::AlreadyPresent(existing));
        }
        tables.likes.push(like.clone());
        Ok(InsertOutcome::Inserted(like.clone()))
    }

    fn delete_like(&self, id: Uuid) -> StoreResult<bool> {
        let mut tables = self.lock()?;
        let before = tables.likes.len();
        tables.likes.retain(|l| l.id != id);
        Ok(tables.likes.len() != before)
    }

    fn insert_subscription(&self, sub: &Subscription) -> StoreResult<InsertOutcome<Subscription>> {
        if sub.subscriber == sub.channel {
            return Err(anyhow!("subscription {} points at its own subscriber", sub.id).into());
        }
        let mut tables = self.lock()?;
        let existing = tables
            .subscriptions
            .iter()
            .find(|s| s.subscriber == sub.subscriber && s.channel == sub.channel)
            .cloned();
        if existing.is_some() {
            return Ok(InsertOutcome::AlreadyPresent(existing));
        }
        tables.subscriptions.push(sub.clone());
        Ok(InsertOutcome::Inserted(sub.clone()))
    }

    fn delete_subscription(&self, id: Uuid) -> StoreResult<bool> {
        let mut tables = self.lock()?;
        let before = tables.subscriptions.len();
        tables.subscriptions.retain(|s| s.id != id);
        Ok(tables.subscriptions.len() != before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::seeded;
    use chrono::Utc;
    use vidtube_types::models::LikeTarget;

    #[test]
    fn duplicate_like_insert_reports_existing() {
        let (store, w) = seeded();
        let first = Like {
            id: Uuid::new_v4(),
            liked_by: w.viewer.id,
            target: LikeTarget::Video(w.video.id),
            created_at: Utc::now(),
        };
        let second = Like {
            id: Uuid::new_v4(),
            ..first.clone()
        };

        assert_eq!(store.insert_like(&first).unwrap(), InsertOutcome::Inserted(first.clone()));
        assert_eq!(
            store.insert_like(&second).unwrap(),
            InsertOutcome::AlreadyPresent(Some(first.clone()))
        );
        assert_eq!(store.likes(&LikeFilter::default()).unwrap(), vec![first]);
    }

    #[test]
    fn self_subscription_insert_fails() {
        let (store, w) = seeded();
        let sub = Subscription {
            id: Uuid::new_v4(),
            subscriber: w.owner.id,
            channel: w.owner.id,
            created_at: Utc::now(),
        };
        assert!(store.insert_subscription(&sub).is_err());
    }

    #[test]
    fn delete_reports_whether_row_existed() {
        let (store, w) = seeded();
        assert!(!store.delete_like(Uuid::new_v4()).unwrap());
        assert!(store.remove_video(w.video.id).unwrap());
        assert!(!store.remove_video(w.video.id).unwrap());
        assert!(store.video_by_id(w.video.id).unwrap().is_none());
    }
}
