use std::collections::HashMap;

use anyhow::Result;
use chrono::Utc;
use rusqlite::{Connection, Row, ToSql, params};
use uuid::Uuid;

use vidtube_core::{InsertOutcome, LikeFilter, SubscriptionFilter};
use vidtube_types::models::{Comment, Like, Playlist, Subscription, Tweet, User, Video};

use crate::Database;
use crate::models::{
    COMMENT_COLUMNS, LIKE_COLUMNS, PLAYLIST_COLUMNS, SUBSCRIPTION_COLUMNS, TWEET_COLUMNS, USER_COLUMNS,
    VIDEO_COLUMNS, comment_from_row, like_from_row, playlist_from_row, subscription_from_row, timestamp,
    tweet_from_row, user_from_row, uuid_at, video_from_row,
};

impl Database {
    // -- Users --

    pub fn create_user(&self, user: &User) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                &format!("INSERT INTO users ({USER_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"),
                params![
                    user.id.to_string(),
                    user.username,
                    user.email,
                    user.full_name,
                    user.avatar,
                    user.cover_image,
                    user.password_hash,
                    user.refresh_token,
                    timestamp(user.created_at),
                    timestamp(user.updated_at),
                ],
            )?;
            Ok(())
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.with_conn(|conn| query_user_where(conn, "username = ?1", username))
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.with_conn(|conn| query_user_where(conn, "email = ?1", email))
    }

    /// `login` may be either the username or the email.
    pub fn get_user_by_login(&self, login: &str) -> Result<Option<User>> {
        self.with_conn(|conn| query_user_where(conn, "username = ?1 OR email = ?1", login))
    }

    pub fn get_user_by_refresh_token(&self, token_hash: &str) -> Result<Option<User>> {
        self.with_conn(|conn| query_user_where(conn, "refresh_token = ?1", token_hash))
    }

    pub fn set_refresh_token(&self, user_id: Uuid, token_hash: Option<&str>) -> Result<bool> {
        self.touch_user(user_id, "refresh_token = ?2", &token_hash)
    }

    pub fn set_password(&self, user_id: Uuid, password_hash: &str) -> Result<bool> {
        self.touch_user(user_id, "password = ?2", &password_hash)
    }

    pub fn set_avatar(&self, user_id: Uuid, avatar: &str) -> Result<bool> {
        self.touch_user(user_id, "avatar = ?2", &avatar)
    }

    pub fn set_cover_image(&self, user_id: Uuid, cover_image: &str) -> Result<bool> {
        self.touch_user(user_id, "cover_image = ?2", &cover_image)
    }

    pub fn update_account(&self, user_id: Uuid, full_name: &str, email: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE users SET full_name = ?2, email = ?3, updated_at = ?4 WHERE id = ?1",
                params![user_id.to_string(), full_name, email, timestamp(Utc::now())],
            )?;
            Ok(changed > 0)
        })
    }

    /// Single-column user update that also bumps `updated_at`.
    fn touch_user(&self, user_id: Uuid, assignment: &str, value: &dyn ToSql) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                &format!("UPDATE users SET {assignment}, updated_at = ?3 WHERE id = ?1"),
                params![user_id.to_string(), value, timestamp(Utc::now())],
            )?;
            Ok(changed > 0)
        })
    }

    pub fn push_watch_history(&self, user_id: Uuid, video_id: Uuid) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO watch_history (user_id, video_id, watched_at) VALUES (?1, ?2, ?3)",
                params![user_id.to_string(), video_id.to_string(), timestamp(Utc::now())],
            )?;
            Ok(())
        })
    }

    // -- Videos --

    pub fn insert_video(&self, video: &Video) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                &format!("INSERT INTO videos ({VIDEO_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"),
                params![
                    video.id.to_string(),
                    video.owner_id.to_string(),
                    video.video_ref,
                    video.thumbnail_ref,
                    video.title,
                    video.description,
                    video.duration,
                    video.is_published,
                    timestamp(video.created_at),
                    timestamp(video.updated_at),
                ],
            )?;
            Ok(())
        })
    }

    pub fn update_video(&self, id: Uuid, title: &str, description: &str, thumbnail_ref: Option<&str>) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE videos
                 SET title = ?2, description = ?3, thumbnail_ref = COALESCE(?4, thumbnail_ref), updated_at = ?5
                 WHERE id = ?1",
                params![id.to_string(), title, description, thumbnail_ref, timestamp(Utc::now())],
            )?;
            Ok(changed > 0)
        })
    }

    pub fn set_video_published(&self, id: Uuid, published: bool) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE videos SET is_published = ?2, updated_at = ?3 WHERE id = ?1",
                params![id.to_string(), published, timestamp(Utc::now())],
            )?;
            Ok(changed > 0)
        })
    }

    /// Deletes the video, its comments, and every like on either.
    pub fn delete_video(&self, id: Uuid) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let tx = conn.unchecked_transaction()?;
            let id = id.to_string();
            tx.execute(
                "DELETE FROM likes WHERE target_kind = 'comment'
                 AND target_id IN (SELECT id FROM comments WHERE video_id = ?1)",
                [&id],
            )?;
            tx.execute("DELETE FROM likes WHERE target_kind = 'video' AND target_id = ?1", [&id])?;
            // comments go with the video via ON DELETE CASCADE
            let changed = tx.execute("DELETE FROM videos WHERE id = ?1", [&id])?;
            tx.commit()?;
            Ok(changed > 0)
        })
    }

    // -- Comments --

    pub fn insert_comment(&self, comment: &Comment) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                &format!("INSERT INTO comments ({COMMENT_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6)"),
                params![
                    comment.id.to_string(),
                    comment.video_id.to_string(),
                    comment.owner_id.to_string(),
                    comment.content,
                    timestamp(comment.created_at),
                    timestamp(comment.updated_at),
                ],
            )?;
            Ok(())
        })
    }

    pub fn update_comment(&self, id: Uuid, content: &str) -> Result<bool> {
        self.update_content("comments", id, content)
    }

    pub fn delete_comment(&self, id: Uuid) -> Result<bool> {
        self.delete_liked("comments", "comment", id)
    }

    // -- Tweets --

    pub fn insert_tweet(&self, tweet: &Tweet) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                &format!("INSERT INTO tweets ({TWEET_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5)"),
                params![
                    tweet.id.to_string(),
                    tweet.owner_id.to_string(),
                    tweet.content,
                    timestamp(tweet.created_at),
                    timestamp(tweet.updated_at),
                ],
            )?;
            Ok(())
        })
    }

    pub fn get_tweets_by_owner(&self, owner: Uuid) -> Result<Vec<Tweet>> {
        self.with_conn(|conn| {
            query_rows(
                conn,
                &format!("SELECT {TWEET_COLUMNS} FROM tweets WHERE owner_id = ?1 ORDER BY rowid"),
                &[&owner.to_string()],
                tweet_from_row,
            )
        })
    }

    pub fn update_tweet(&self, id: Uuid, content: &str) -> Result<bool> {
        self.update_content("tweets", id, content)
    }

    pub fn delete_tweet(&self, id: Uuid) -> Result<bool> {
        self.delete_liked("tweets", "tweet", id)
    }

    fn update_content(&self, table: &str, id: Uuid, content: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                &format!("UPDATE {table} SET content = ?2, updated_at = ?3 WHERE id = ?1"),
                params![id.to_string(), content, timestamp(Utc::now())],
            )?;
            Ok(changed > 0)
        })
    }

    /// Deletes a like target row together with the likes pointing at it.
    fn delete_liked(&self, table: &str, kind: &str, id: Uuid) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let tx = conn.unchecked_transaction()?;
            let id = id.to_string();
            tx.execute(
                "DELETE FROM likes WHERE target_kind = ?1 AND target_id = ?2",
                params![kind, id],
            )?;
            let changed = tx.execute(&format!("DELETE FROM {table} WHERE id = ?1"), [&id])?;
            tx.commit()?;
            Ok(changed > 0)
        })
    }

    // -- Playlists --

    pub fn insert_playlist(&self, playlist: &Playlist) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.unchecked_transaction()?;
            tx.execute(
                &format!("INSERT INTO playlists ({PLAYLIST_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6)"),
                params![
                    playlist.id.to_string(),
                    playlist.owner_id.to_string(),
                    playlist.name,
                    playlist.description,
                    timestamp(playlist.created_at),
                    timestamp(playlist.updated_at),
                ],
            )?;
            for video in &playlist.videos {
                tx.execute(
                    "INSERT INTO playlist_videos (playlist_id, video_id) VALUES (?1, ?2)",
                    params![playlist.id.to_string(), video.to_string()],
                )?;
            }
            tx.commit()?;
            Ok(())
        })
    }

    pub fn update_playlist(&self, id: Uuid, name: &str, description: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE playlists SET name = ?2, description = ?3, updated_at = ?4 WHERE id = ?1",
                params![id.to_string(), name, description, timestamp(Utc::now())],
            )?;
            Ok(changed > 0)
        })
    }

    pub fn delete_playlist(&self, id: Uuid) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute("DELETE FROM playlists WHERE id = ?1", [id.to_string()])?;
            Ok(changed > 0)
        })
    }

    /// Appends `video_id`; the same video may appear more than once.
    pub fn add_playlist_video(&self, playlist_id: Uuid, video_id: Uuid) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.unchecked_transaction()?;
            tx.execute(
                "INSERT INTO playlist_videos (playlist_id, video_id) VALUES (?1, ?2)",
                params![playlist_id.to_string(), video_id.to_string()],
            )?;
            tx.execute(
                "UPDATE playlists SET updated_at = ?2 WHERE id = ?1",
                params![playlist_id.to_string(), timestamp(Utc::now())],
            )?;
            tx.commit()?;
            Ok(())
        })
    }

    /// Removes the most recently added occurrence of `video_id`.
    pub fn remove_playlist_video(&self, playlist_id: Uuid, video_id: Uuid) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let tx = conn.unchecked_transaction()?;
            let changed = tx.execute(
                "DELETE FROM playlist_videos WHERE id = (
                     SELECT MAX(id) FROM playlist_videos WHERE playlist_id = ?1 AND video_id = ?2
                 )",
                params![playlist_id.to_string(), video_id.to_string()],
            )?;
            if changed > 0 {
                tx.execute(
                    "UPDATE playlists SET updated_at = ?2 WHERE id = ?1",
                    params![playlist_id.to_string(), timestamp(Utc::now())],
                )?;
            }
            tx.commit()?;
            Ok(changed > 0)
        })
    }
}

// -- Shared read helpers (also used by the EntityStore impl) --

/// `?start, ?start+1, ...` for `count` parameters.
fn placeholders(start: usize, count: usize) -> String {
    (start..start + count)
        .map(|i| format!("?{}", i))
        .collect::<Vec<_>>()
        .join(", ")
}

fn query_rows<T>(
    conn: &Connection,
    sql: &str,
    params: &[&dyn ToSql],
    map: fn(&Row<'_>) -> rusqlite::Result<T>,
) -> Result<Vec<T>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, map)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// `SELECT <columns> FROM <table> WHERE <column> IN (ids) ORDER BY rowid`.
fn query_in<T>(
    conn: &Connection,
    columns: &str,
    table: &str,
    column: &str,
    ids: &[Uuid],
    map: fn(&Row<'_>) -> rusqlite::Result<T>,
) -> Result<Vec<T>> {
    if ids.is_empty() {
        return Ok(vec![]);
    }
    let sql = format!(
        "SELECT {columns} FROM {table} WHERE {column} IN ({}) ORDER BY rowid",
        placeholders(1, ids.len())
    );
    let keys: Vec<String> = ids.iter().map(Uuid::to_string).collect();
    let params: Vec<&dyn ToSql> = keys.iter().map(|k| k as &dyn ToSql).collect();
    query_rows(conn, &sql, &params, map)
}

fn query_user_where(conn: &Connection, condition: &str, value: &str) -> Result<Option<User>> {
    let mut stmt = conn.prepare(&format!("SELECT {USER_COLUMNS} FROM users WHERE {condition}"))?;
    let row = stmt.query_row([value], user_from_row).optional()?;
    match row {
        Some(user) => Ok(with_watch_history(conn, vec![user])?.into_iter().next()),
        None => Ok(None),
    }
}

/// Fills `watch_history` for each user, in append order.
fn with_watch_history(conn: &Connection, mut users: Vec<User>) -> Result<Vec<User>> {
    let ids: Vec<Uuid> = users.iter().map(|u| u.id).collect();
    let pairs = query_in(conn, "user_id, video_id", "watch_history", "user_id", &ids, |row| {
        Ok((uuid_at(row, 0)?, uuid_at(row, 1)?))
    })?;
    let mut history: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
    for (user, video) in pairs {
        history.entry(user).or_default().push(video);
    }
    for user in &mut users {
        user.watch_history = history.remove(&user.id).unwrap_or_default();
    }
    Ok(users)
}

/// Fills `videos` for each playlist, in insertion order.
fn with_playlist_videos(conn: &Connection, mut playlists: Vec<Playlist>) -> Result<Vec<Playlist>> {
    let ids: Vec<Uuid> = playlists.iter().map(|p| p.id).collect();
    let pairs = query_in(conn, "playlist_id, video_id", "playlist_videos", "playlist_id", &ids, |row| {
        Ok((uuid_at(row, 0)?, uuid_at(row, 1)?))
    })?;
    let mut videos: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
    for (playlist, video) in pairs {
        videos.entry(playlist).or_default().push(video);
    }
    for playlist in &mut playlists {
        playlist.videos = videos.remove(&playlist.id).unwrap_or_default();
    }
    Ok(playlists)
}

/// Users without their watch history.
pub(crate) fn query_users_by_ids(conn: &Connection, ids: &[Uuid]) -> Result<Vec<User>> {
    query_in(conn, USER_COLUMNS, "users", "id", ids, user_from_row)
}

pub(crate) fn query_user_by_id(conn: &Connection, id: Uuid) -> Result<Option<User>> {
    query_user_where(conn, "id = ?1", &id.to_string())
}

pub(crate) fn query_user_by_username(conn: &Connection, username: &str) -> Result<Option<User>> {
    query_user_where(conn, "username = ?1", username)
}

pub(crate) fn query_videos(conn: &Connection, column: &str, ids: &[Uuid]) -> Result<Vec<Video>> {
    query_in(conn, VIDEO_COLUMNS, "videos", column, ids, video_from_row)
}

pub(crate) fn query_comments(conn: &Connection, column: &str, ids: &[Uuid]) -> Result<Vec<Comment>> {
    query_in(conn, COMMENT_COLUMNS, "comments", column, ids, comment_from_row)
}

pub(crate) fn query_tweets_by_ids(conn: &Connection, ids: &[Uuid]) -> Result<Vec<Tweet>> {
    query_in(conn, TWEET_COLUMNS, "tweets", "id", ids, tweet_from_row)
}

pub(crate) fn query_playlists(conn: &Connection, column: &str, ids: &[Uuid]) -> Result<Vec<Playlist>> {
    let playlists = query_in(conn, PLAYLIST_COLUMNS, "playlists", column, ids, playlist_from_row)?;
    with_playlist_videos(conn, playlists)
}

pub(crate) fn query_likes(conn: &Connection, filter: &LikeFilter) -> Result<Vec<Like>> {
    let mut clauses = Vec::new();
    let mut values: Vec<String> = Vec::new();

    if let Some(user) = filter.liked_by {
        values.push(user.to_string());
        clauses.push(format!("liked_by = ?{}", values.len()));
    }
    if let Some(kind) = filter.kind {
        values.push(kind.as_str().to_string());
        clauses.push(format!("target_kind = ?{}", values.len()));
    }
    if let Some(ids) = &filter.target_ids {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        let start = values.len() + 1;
        values.extend(ids.iter().map(Uuid::to_string));
        clauses.push(format!("target_id IN ({})", placeholders(start, ids.len())));
    }

    let condition = if clauses.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", clauses.join(" AND "))
    };
    let sql = format!("SELECT {LIKE_COLUMNS} FROM likes {condition} ORDER BY rowid");
    let params: Vec<&dyn ToSql> = values.iter().map(|v| v as &dyn ToSql).collect();
    query_rows(conn, &sql, &params, like_from_row)
}

pub(crate) fn query_subscriptions(conn: &Connection, filter: &SubscriptionFilter) -> Result<Vec<Subscription>> {
    let mut clauses = Vec::new();
    let mut values: Vec<String> = Vec::new();

    if let Some(subscriber) = filter.subscriber {
        values.push(subscriber.to_string());
        clauses.push(format!("subscriber = ?{}", values.len()));
    }
    if let Some(channel) = filter.channel {
        values.push(channel.to_string());
        clauses.push(format!("channel = ?{}", values.len()));
    }

    let condition = if clauses.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", clauses.join(" AND "))
    };
    let sql = format!("SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions {condition} ORDER BY rowid");
    let params: Vec<&dyn ToSql> = values.iter().map(|v| v as &dyn ToSql).collect();
    query_rows(conn, &sql, &params, subscription_from_row)
}

/// Conditional insert: a uniqueness conflict on `(liked_by, target)` is not
/// an error, the surviving row is read back instead.
pub(crate) fn insert_like_if_absent(conn: &Connection, like: &Like) -> Result<InsertOutcome<Like>> {
    let changed = conn.execute(
        &format!(
            "INSERT INTO likes ({LIKE_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(liked_by, target_kind, target_id) DO NOTHING"
        ),
        params![
            like.id.to_string(),
            like.liked_by.to_string(),
            like.target.kind().as_str(),
            like.target.id().to_string(),
            timestamp(like.created_at),
        ],
    )?;
    if changed > 0 {
        return Ok(InsertOutcome::Inserted(like.clone()));
    }
    let existing = query_likes(conn, &LikeFilter::by(like.liked_by).on(like.target))?;
    Ok(InsertOutcome::AlreadyPresent(existing.into_iter().next()))
}

pub(crate) fn insert_subscription_if_absent(
    conn: &Connection,
    sub: &Subscription,
) -> Result<InsertOutcome<Subscription>> {
    let changed = conn.execute(
        &format!(
            "INSERT INTO subscriptions ({SUBSCRIPTION_COLUMNS}) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(subscriber, channel) DO NOTHING"
        ),
        params![
            sub.id.to_string(),
            sub.subscriber.to_string(),
            sub.channel.to_string(),
            timestamp(sub.created_at),
        ],
    )?;
    if changed > 0 {
        return Ok(InsertOutcome::Inserted(sub.clone()));
    }
    let existing = query_subscriptions(conn, &SubscriptionFilter::edge(sub.subscriber, sub.channel))?;
    Ok(InsertOutcome::AlreadyPresent(existing.into_iter().next()))
}

pub(crate) fn delete_by_id(conn: &Connection, table: &str, id: Uuid) -> Result<bool> {
    let changed = conn.execute(&format!("DELETE FROM {table} WHERE id = ?1"), [id.to_string()])?;
    Ok(changed > 0)
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
