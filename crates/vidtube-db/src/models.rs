//! Row mapping between SQLite columns and `vidtube_types::models`.
//!
//! Ids are stored as hyphenated UUID text and timestamps as RFC 3339 text.
//! Column lists are kept next to their mappers so the two cannot drift.

use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::Row;
use rusqlite::types::Type;
use uuid::Uuid;

use vidtube_types::models::{Comment, Like, LikeKind, LikeTarget, Playlist, Subscription, Tweet, User, Video};

pub const USER_COLUMNS: &str =
    "id, username, email, full_name, avatar, cover_image, password, refresh_token, created_at, updated_at";
pub const VIDEO_COLUMNS: &str =
    "id, owner_id, video_ref, thumbnail_ref, title, description, duration, is_published, created_at, updated_at";
pub const COMMENT_COLUMNS: &str = "id, video_id, owner_id, content, created_at, updated_at";
pub const TWEET_COLUMNS: &str = "id, owner_id, content, created_at, updated_at";
pub const PLAYLIST_COLUMNS: &str = "id, owner_id, name, description, created_at, updated_at";
pub const LIKE_COLUMNS: &str = "id, liked_by, target_kind, target_id, created_at";
pub const SUBSCRIPTION_COLUMNS: &str = "id, subscriber, channel, created_at";

pub fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339()
}

fn conversion_error(idx: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, message.into())
}

pub fn uuid_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Uuid> {
    let raw: String = row.get(idx)?;
    raw.parse()
        .map_err(|e| conversion_error(idx, format!("bad uuid '{}': {}", raw, e)))
}

pub fn time_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            // Rows written by SQLite's datetime('now') carry no timezone.
            NaiveDateTime::parse_from_str(&raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .map_err(|e| conversion_error(idx, format!("bad timestamp '{}': {}", raw, e)))
}

/// Maps a `USER_COLUMNS` row. Watch history is loaded separately.
pub fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: uuid_at(row, 0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        full_name: row.get(3)?,
        avatar: row.get(4)?,
        cover_image: row.get(5)?,
        password_hash: row.get(6)?,
        refresh_token: row.get(7)?,
        watch_history: Vec::new(),
        created_at: time_at(row, 8)?,
        updated_at: time_at(row, 9)?,
    })
}

pub fn video_from_row(row: &Row<'_>) -> rusqlite::Result<Video> {
    Ok(Video {
        id: uuid_at(row, 0)?,
        owner_id: uuid_at(row, 1)?,
        video_ref: row.get(2)?,
        thumbnail_ref: row.get(3)?,
        title: row.get(4)?,
        description: row.get(5)?,
        duration: row.get(6)?,
        is_published: row.get(7)?,
        created_at: time_at(row, 8)?,
        updated_at: time_at(row, 9)?,
    })
}

pub fn comment_from_row(row: &Row<'_>) -> rusqlite::Result<Comment> {
    Ok(Comment {
        id: uuid_at(row, 0)?,
        video_id: uuid_at(row, 1)?,
        owner_id: uuid_at(row, 2)?,
        content: row.get(3)?,
        created_at: time_at(row, 4)?,
        updated_at: time_at(row, 5)?,
    })
}

pub fn tweet_from_row(row: &Row<'_>) -> rusqlite::Result<Tweet> {
    Ok(Tweet {
        id: uuid_at(row, 0)?,
        owner_id: uuid_at(row, 1)?,
        content: row.get(2)?,
        created_at: time_at(row, 3)?,
        updated_at: time_at(row, 4)?,
    })
}

/// Maps a `PLAYLIST_COLUMNS` row. Video ids are loaded separately.
pub fn playlist_from_row(row: &Row<'_>) -> rusqlite::Result<Playlist> {
    Ok(Playlist {
        id: uuid_at(row, 0)?,
        owner_id: uuid_at(row, 1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        videos: Vec::new(),
        created_at: time_at(row, 4)?,
        updated_at: time_at(row, 5)?,
    })
}

pub fn like_from_row(row: &Row<'_>) -> rusqlite::Result<Like> {
    let kind: String = row.get(2)?;
    let kind = LikeKind::parse(&kind)
        .ok_or_else(|| conversion_error(2, format!("unknown like target kind '{}'", kind)))?;
    Ok(Like {
        id: uuid_at(row, 0)?,
        liked_by: uuid_at(row, 1)?,
        target: LikeTarget::new(kind, uuid_at(row, 3)?),
        created_at: time_at(row, 4)?,
    })
}

pub fn subscription_from_row(row: &Row<'_>) -> rusqlite::Result<Subscription> {
    Ok(Subscription {
        id: uuid_at(row, 0)?,
        subscriber: uuid_at(row, 1)?,
        channel: uuid_at(row, 2)?,
        created_at: time_at(row, 3)?,
    })
}
