//! Existence toggles for like and subscription edges.
//!
//! A toggle looks up the edge for `(actor, target, kind)`, deletes it when
//! present and inserts it when absent. Inserts are conditional on the
//! store's edge uniqueness, so two racing toggles can never leave two rows
//! behind: the loser observes the winner's row and reports it as created.

use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use vidtube_types::models::{Like, LikeKind, LikeTarget, Subscription};

use crate::error::{CoreError, CoreResult};
use crate::pipeline::Pipeline;
use crate::store::{EntityStore, InsertOutcome, LikeFilter, SubscriptionFilter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeKind {
    LikeOnVideo,
    LikeOnComment,
    LikeOnTweet,
    Subscription,
}

impl EdgeKind {
    fn like_kind(self) -> Option<LikeKind> {
        match self {
            Self::LikeOnVideo => Some(LikeKind::Video),
            Self::LikeOnComment => Some(LikeKind::Comment),
            Self::LikeOnTweet => Some(LikeKind::Tweet),
            Self::Subscription => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToggleState {
    Created,
    Removed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Edge {
    Like(Like),
    Subscription(Subscription),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ToggleOutcome {
    pub state: ToggleState,
    /// The created edge, or the one that was just deleted.
    pub edge: Edge,
}

impl ToggleOutcome {
    pub fn is_active(&self) -> bool {
        self.state == ToggleState::Created
    }
}

/// Flip the edge `(actor, target, kind)` and report the new state.
///
/// `target` is the video, comment or tweet id for likes, and the channel's
/// user id for subscriptions. Nothing is written when a precondition fails.
pub fn toggle_edge<S>(store: &S, actor: Uuid, target: Uuid, kind: EdgeKind) -> CoreResult<ToggleOutcome>
where
    S: EntityStore + ?Sized,
{
    if actor.is_nil() {
        return Err(CoreError::invalid("acting user id is required"));
    }
    if target.is_nil() {
        return Err(CoreError::invalid("target id is required"));
    }

    match kind.like_kind() {
        Some(like_kind) => toggle_like(store, actor, LikeTarget::new(like_kind, target)),
        None => toggle_subscription(store, actor, target),
    }
}

fn toggle_like<S>(store: &S, actor: Uuid, target: LikeTarget) -> CoreResult<ToggleOutcome>
where
    S: EntityStore + ?Sized,
{
    // A hidden video, or a comment under one, does not exist for `actor`.
    let exists = match target {
        LikeTarget::Video(id) => store.video_by_id(id)?.is_some_and(|v| v.visible_to(actor)),
        LikeTarget::Comment(id) => match store.comment_by_id(id)? {
            Some(comment) => store
                .video_by_id(comment.video_id)?
                .is_some_and(|v| v.visible_to(actor)),
            None => false,
        },
        LikeTarget::Tweet(id) => store.tweet_by_id(id)?.is_some(),
    };
    if !exists {
        return Err(CoreError::not_found(target.kind().as_str(), target.id()));
    }

    let existing = Pipeline::new(store.likes(&LikeFilter::by(actor).on(target))?).first();
    if let Some(like) = existing {
        store.delete_like(like.id)?;
        return Ok(ToggleOutcome {
            state: ToggleState::Removed,
            edge: Edge::Like(like),
        });
    }

    let like = Like {
        id: Uuid::new_v4(),
        liked_by: actor,
        target,
        created_at: Utc::now(),
    };
    let stored = settle(store.insert_like(&like)?, || {
        format!("like on {} {} changed concurrently", target.kind().as_str(), target.id())
    })?;
    Ok(ToggleOutcome {
        state: ToggleState::Created,
        edge: Edge::Like(stored),
    })
}

fn toggle_subscription<S>(store: &S, actor: Uuid, channel: Uuid) -> CoreResult<ToggleOutcome>
where
    S: EntityStore + ?Sized,
{
    if actor == channel {
        return Err(CoreError::invalid("cannot subscribe to your own channel"));
    }
    if store.user_by_id(channel)?.is_none() {
        return Err(CoreError::not_found("channel", channel));
    }

    let existing = Pipeline::new(store.subscriptions(&SubscriptionFilter::edge(actor, channel))?).first();
    if let Some(sub) = existing {
        store.delete_subscription(sub.id)?;
        return Ok(ToggleOutcome {
            state: ToggleState::Removed,
            edge: Edge::Subscription(sub),
        });
    }

    let sub = Subscription {
        id: Uuid::new_v4(),
        subscriber: actor,
        channel,
        created_at: Utc::now(),
    };
    let stored = settle(store.insert_subscription(&sub)?, || {
        format!("subscription to {channel} changed concurrently")
    })?;
    Ok(ToggleOutcome {
        state: ToggleState::Created,
        edge: Edge::Subscription(stored),
    })
}

/// A conditional insert that lost a race still leaves the edge present;
/// only a row that vanished in between is reported as a conflict.
fn settle<T>(outcome: InsertOutcome<T>, conflict: impl FnOnce() -> String) -> CoreResult<T> {
    match outcome {
        InsertOutcome::Inserted(row) | InsertOutcome::AlreadyPresent(Some(row)) => Ok(row),
        InsertOutcome::AlreadyPresent(None) => Err(CoreError::Conflict(conflict())),
    }
}
