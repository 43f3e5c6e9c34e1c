//! Read-model shapes produced by the view builder.
//!
//! Each struct is a projection: it carries only the fields a response is
//! allowed to expose. Password hashes and refresh tokens never appear here.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelProfile {
    pub id: Uuid,
    pub username: String,
    pub full_name: String,
    pub email: String,
    pub avatar: String,
    pub cover_image: Option<String>,
    pub subscriber_count: u64,
    pub subscribed_count: u64,
    pub is_subscribed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelStats {
    pub video_count: u64,
    pub total_likes: u64,
    pub subscriber_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentSummary {
    pub content: String,
    pub owner: Uuid,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelVideo {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub video_ref: String,
    pub thumbnail_ref: String,
    pub is_published: bool,
    pub like_count: u64,
    pub comment_count: u64,
    pub comments: Vec<CommentSummary>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Owner as shown next to a watched video.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerContact {
    pub full_name: String,
    pub email: String,
    pub avatar: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchHistoryEntry {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub video_ref: String,
    pub thumbnail_ref: String,
    pub duration: f64,
    pub owner: OwnerContact,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikedVideo {
    pub like_id: Uuid,
    pub video_id: Uuid,
    pub thumbnail_ref: String,
    pub video_ref: String,
}

/// One side of a subscription edge.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelMember {
    pub id: Uuid,
    pub full_name: String,
    pub username: String,
    pub avatar: String,
    pub cover_image: Option<String>,
}

/// Owner as shown next to a playlist or a video listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicOwner {
    pub id: Uuid,
    pub full_name: String,
    pub username: String,
    pub avatar: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistView {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub videos: Vec<Uuid>,
    pub owner: PublicOwner,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoView {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub video_ref: String,
    pub thumbnail_ref: String,
    pub duration: f64,
    pub is_published: bool,
    pub owner: PublicOwner,
    pub created_at: DateTime<Utc>,
}

/// Account as returned to its own holder.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountView {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub avatar: String,
    pub cover_image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&crate::models::User> for AccountView {
    fn from(user: &crate::models::User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            avatar: user.avatar.clone(),
            cover_image: user.cover_image.clone(),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}
