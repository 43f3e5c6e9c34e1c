use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Full account record. Never serialized to clients as-is: views project
/// it down to the fields a response is allowed to carry.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub avatar: String,
    pub cover_image: Option<String>,
    pub password_hash: String,
    pub refresh_token: Option<String>,
    /// Video ids in append order.
    pub watch_history: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub video_ref: String,
    pub thumbnail_ref: String,
    pub title: String,
    pub description: String,
    pub duration: f64,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Video {
    /// Unpublished videos exist only for their owner.
    pub fn visible_to(&self, viewer: Uuid) -> bool {
        self.is_published || self.owner_id == viewer
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: Uuid,
    pub video_id: Uuid,
    pub owner_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tweet {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Playlist {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub description: String,
    /// Duplicates allowed.
    pub videos: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// What a like points at. Exactly one target per like.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum LikeTarget {
    Video(Uuid),
    Comment(Uuid),
    Tweet(Uuid),
}

impl LikeTarget {
    pub fn new(kind: LikeKind, id: Uuid) -> Self {
        match kind {
            LikeKind::Video => Self::Video(id),
            LikeKind::Comment => Self::Comment(id),
            LikeKind::Tweet => Self::Tweet(id),
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            Self::Video(id) | Self::Comment(id) | Self::Tweet(id) => *id,
        }
    }

    pub fn kind(&self) -> LikeKind {
        match self {
            Self::Video(_) => LikeKind::Video,
            Self::Comment(_) => LikeKind::Comment,
            Self::Tweet(_) => LikeKind::Tweet,
        }
    }

    pub fn video_id(&self) -> Option<Uuid> {
        match self {
            Self::Video(id) => Some(*id),
            _ => None,
        }
    }
}

/// Discriminator of a [`LikeTarget`], as stored in the `target_kind` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LikeKind {
    Video,
    Comment,
    Tweet,
}

impl LikeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Comment => "comment",
            Self::Tweet => "tweet",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "video" => Some(Self::Video),
            "comment" => Some(Self::Comment),
            "tweet" => Some(Self::Tweet),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Like {
    pub id: Uuid,
    pub liked_by: Uuid,
    pub target: LikeTarget,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub id: Uuid,
    pub subscriber: Uuid,
    pub channel: Uuid,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_target_parts() {
        let id = Uuid::new_v4();
        let target = LikeTarget::Comment(id);
        assert_eq!(target.kind(), LikeKind::Comment);
        assert_eq!(target.id(), id);
        assert_eq!(LikeTarget::new(LikeKind::parse("comment").unwrap(), id), target);
        assert_eq!(LikeKind::parse("playlist"), None);
        assert_eq!(target.video_id(), None);
    }

    #[test]
    fn like_target_serializes_tagged() {
        let id = Uuid::nil();
        let json = serde_json::to_value(LikeTarget::Video(id)).unwrap();
        assert_eq!(json["kind"], "video");
        assert_eq!(json["id"], id.to_string());
    }
}
