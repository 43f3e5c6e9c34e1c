//! Read-only aggregate views.
//!
//! Each view is one [`Pipeline`] composition: filter rows by an equality
//! predicate, join related entities by foreign key, project, fold. An
//! empty result is always `Ok`; only a referenced entity that does not
//! exist produces [`CoreError::NotFound`].

use uuid::Uuid;

use vidtube_types::models::{Comment, Like, LikeKind, Playlist, User, Video};
use vidtube_types::views::{
    ChannelMember, ChannelProfile, ChannelStats, ChannelVideo, CommentSummary, LikedVideo,
    OwnerContact, PlaylistView, PublicOwner, VideoView, WatchHistoryEntry,
};

use crate::error::{CoreError, CoreResult};
use crate::pipeline::Pipeline;
use crate::store::{EntityStore, LikeFilter, SubscriptionFilter};

fn public_owner(user: &User) -> PublicOwner {
    PublicOwner {
        id: user.id,
        full_name: user.full_name.clone(),
        username: user.username.clone(),
        avatar: user.avatar.clone(),
    }
}

fn member(user: &User) -> ChannelMember {
    ChannelMember {
        id: user.id,
        full_name: user.full_name.clone(),
        username: user.username.clone(),
        avatar: user.avatar.clone(),
        cover_image: user.cover_image.clone(),
    }
}

fn require_user<S>(store: &S, id: Uuid, kind: &'static str) -> CoreResult<User>
where
    S: EntityStore + ?Sized,
{
    store.user_by_id(id)?.ok_or_else(|| CoreError::not_found(kind, id))
}

/// Channel page for `username`, as seen by `viewer`.
pub fn channel_profile<S>(store: &S, username: &str, viewer: Uuid) -> CoreResult<ChannelProfile>
where
    S: EntityStore + ?Sized,
{
    let username = username.trim().to_lowercase();
    if username.is_empty() {
        return Err(CoreError::invalid("username is required"));
    }
    let user = store
        .user_by_username(&username)?
        .ok_or_else(|| CoreError::not_found("channel", &username))?;

    let subscribers = Pipeline::new(store.subscriptions(&SubscriptionFilter::channel(user.id))?);
    let subscribed = Pipeline::new(store.subscriptions(&SubscriptionFilter::subscriber(user.id))?);

    Ok(ChannelProfile {
        id: user.id,
        subscriber_count: subscribers.count(),
        subscribed_count: subscribed.count(),
        is_subscribed: subscribers.any(|s| s.subscriber == viewer),
        username: user.username,
        full_name: user.full_name,
        email: user.email,
        avatar: user.avatar,
        cover_image: user.cover_image,
    })
}

/// Dashboard totals for the channel owned by `owner`.
pub fn channel_stats<S>(store: &S, owner: Uuid) -> CoreResult<ChannelStats>
where
    S: EntityStore + ?Sized,
{
    let videos = Pipeline::new(store.videos_by_owner(owner)?);
    let video_count = videos.count();
    let total_likes = videos
        .join_many(|v| v.id, |ids| store.likes(&LikeFilter::on_videos(ids)), |l: &Like| l.target.video_id())?
        .fold(0, |acc, (_, likes)| acc + likes.len() as u64);
    let subscriber_count = Pipeline::new(store.subscriptions(&SubscriptionFilter::channel(owner))?).count();

    Ok(ChannelStats {
        video_count,
        total_likes,
        subscriber_count,
    })
}

/// Every video owned by `owner` with like/comment counts and comment bodies.
pub fn channel_videos<S>(store: &S, owner: Uuid) -> CoreResult<Vec<ChannelVideo>>
where
    S: EntityStore + ?Sized,
{
    let rows = Pipeline::new(store.videos_by_owner(owner)?)
        .join_many(|v| v.id, |ids| store.likes(&LikeFilter::on_videos(ids)), |l: &Like| l.target.video_id())?
        .join_many(|(v, _)| v.id, |ids| store.comments_by_videos(ids), |c: &Comment| Some(c.video_id))?
        .project(|((video, likes), comments)| ChannelVideo {
            id: video.id,
            like_count: likes.len() as u64,
            comment_count: comments.len() as u64,
            comments: comments
                .into_iter()
                .map(|c| CommentSummary {
                    content: c.content,
                    owner: c.owner_id,
                })
                .collect(),
            title: video.title,
            description: video.description,
            video_ref: video.video_ref,
            thumbnail_ref: video.thumbnail_ref,
            is_published: video.is_published,
            created_at: video.created_at,
            updated_at: video.updated_at,
        });
    Ok(rows.collect())
}

/// Videos `user` has watched, latest view first, each video once.
///
/// Ids of deleted videos, videos whose owner is gone, and videos since
/// unpublished by someone else are skipped.
pub fn watch_history<S>(store: &S, user: Uuid) -> CoreResult<Vec<WatchHistoryEntry>>
where
    S: EntityStore + ?Sized,
{
    let user = require_user(store, user, "user")?;
    let viewer = user.id;

    let latest_first: Vec<Uuid> = user.watch_history.into_iter().rev().collect();
    let rows = Pipeline::new(latest_first)
        .dedup_by_key(|id| *id)
        .join(|id| Some(*id), |ids| store.videos_by_ids(ids), |v: &Video| v.id)?
        .filter(|(_, v)| v.visible_to(viewer))
        .join(|(_, v)| Some(v.owner_id), |ids| store.users_by_ids(ids), |u: &User| u.id)?
        .project(|((_, video), owner)| WatchHistoryEntry {
            id: video.id,
            title: video.title,
            description: video.description,
            video_ref: video.video_ref,
            thumbnail_ref: video.thumbnail_ref,
            duration: video.duration,
            owner: OwnerContact {
                full_name: owner.full_name,
                email: owner.email,
                avatar: owner.avatar,
            },
        });
    Ok(rows.collect())
}

/// Videos `user` has liked, in like order.
pub fn liked_videos<S>(store: &S, user: Uuid) -> CoreResult<Vec<LikedVideo>>
where
    S: EntityStore + ?Sized,
{
    let rows = Pipeline::new(store.likes(&LikeFilter::by(user).kind(LikeKind::Video))?)
        .join(|l| l.target.video_id(), |ids| store.videos_by_ids(ids), |v: &Video| v.id)?
        .filter(|(_, v)| v.visible_to(user))
        .project(|(like, video)| LikedVideo {
            like_id: like.id,
            video_id: video.id,
            thumbnail_ref: video.thumbnail_ref,
            video_ref: video.video_ref,
        });
    Ok(rows.collect())
}

/// Users subscribed to `channel`.
pub fn subscribers<S>(store: &S, channel: Uuid) -> CoreResult<Vec<ChannelMember>>
where
    S: EntityStore + ?Sized,
{
    require_user(store, channel, "channel")?;
    let rows = Pipeline::new(store.subscriptions(&SubscriptionFilter::channel(channel))?)
        .join(|s| Some(s.subscriber), |ids| store.users_by_ids(ids), |u: &User| u.id)?
        .project(|(_, user)| member(&user));
    Ok(rows.collect())
}

/// Channels `subscriber` is subscribed to.
pub fn subscribed_channels<S>(store: &S, subscriber: Uuid) -> CoreResult<Vec<ChannelMember>>
where
    S: EntityStore + ?Sized,
{
    require_user(store, subscriber, "subscriber")?;
    let rows = Pipeline::new(store.subscriptions(&SubscriptionFilter::subscriber(subscriber))?)
        .join(|s| Some(s.channel), |ids| store.users_by_ids(ids), |u: &User| u.id)?
        .project(|(_, user)| member(&user));
    Ok(rows.collect())
}

fn playlist_pipeline<S>(
    store: &S,
    playlists: Vec<Playlist>,
) -> CoreResult<Pipeline<PlaylistView>>
where
    S: EntityStore + ?Sized,
{
    Ok(Pipeline::new(playlists)
        .join(|p| Some(p.owner_id), |ids| store.users_by_ids(ids), |u: &User| u.id)?
        .project(|(playlist, owner)| PlaylistView {
            id: playlist.id,
            name: playlist.name,
            description: playlist.description,
            videos: playlist.videos,
            owner: public_owner(&owner),
            created_at: playlist.created_at,
            updated_at: playlist.updated_at,
        }))
}

pub fn user_playlists<S>(store: &S, user: Uuid) -> CoreResult<Vec<PlaylistView>>
where
    S: EntityStore + ?Sized,
{
    require_user(store, user, "user")?;
    Ok(playlist_pipeline(store, store.playlists_by_owner(user)?)?.collect())
}

pub fn playlist_by_id<S>(store: &S, id: Uuid) -> CoreResult<PlaylistView>
where
    S: EntityStore + ?Sized,
{
    playlist_pipeline(store, store.playlists_by_ids(&[id])?)?
        .first()
        .ok_or_else(|| CoreError::not_found("playlist", id))
}

fn video_pipeline<S>(store: &S, videos: Vec<Video>, viewer: Uuid) -> CoreResult<Pipeline<VideoView>>
where
    S: EntityStore + ?Sized,
{
    Ok(Pipeline::new(videos)
        .filter(|v| v.visible_to(viewer))
        .join(|v| Some(v.owner_id), |ids| store.users_by_ids(ids), |u: &User| u.id)?
        .project(|(video, owner)| VideoView {
            id: video.id,
            title: video.title,
            description: video.description,
            video_ref: video.video_ref,
            thumbnail_ref: video.thumbnail_ref,
            duration: video.duration,
            is_published: video.is_published,
            owner: public_owner(&owner),
            created_at: video.created_at,
        }))
}

/// A single video with its owner. Unpublished videos exist only for their owner.
pub fn video_by_id<S>(store: &S, id: Uuid, viewer: Uuid) -> CoreResult<VideoView>
where
    S: EntityStore + ?Sized,
{
    video_pipeline(store, store.videos_by_ids(&[id])?, viewer)?
        .first()
        .ok_or_else(|| CoreError::not_found("video", id))
}

/// Videos of `owner` visible to `viewer`.
pub fn videos_by_owner<S>(store: &S, owner: Uuid, viewer: Uuid) -> CoreResult<Vec<VideoView>>
where
    S: EntityStore + ?Sized,
{
    require_user(store, owner, "user")?;
    Ok(video_pipeline(store, store.videos_by_owner(owner)?, viewer)?.collect())
}

pub fn video_comments<S>(store: &S, video: Uuid) -> CoreResult<Vec<Comment>>
where
    S: EntityStore + ?Sized,
{
    if store.video_by_id(video)?.is_none() {
        return Err(CoreError::not_found("video", video));
    }
    Ok(store.comments_by_videos(&[video])?)
}
