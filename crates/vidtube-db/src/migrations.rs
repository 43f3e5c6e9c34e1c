use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| {
        r.get(0)
    })?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(
            "
            BEGIN;

            CREATE TABLE users (
                id              TEXT PRIMARY KEY,
                username        TEXT NOT NULL UNIQUE,
                email           TEXT NOT NULL UNIQUE,
                full_name       TEXT NOT NULL,
                avatar          TEXT NOT NULL,
                cover_image     TEXT,
                password        TEXT NOT NULL,
                refresh_token   TEXT,
                created_at      TEXT NOT NULL,
                updated_at      TEXT NOT NULL
            );

            CREATE INDEX idx_users_refresh_token ON users(refresh_token);

            -- Append-only; video_id is not a foreign key so history survives
            -- video deletion and readers skip the dangling ids.
            CREATE TABLE watch_history (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id     TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                video_id    TEXT NOT NULL,
                watched_at  TEXT NOT NULL
            );

            CREATE INDEX idx_watch_history_user ON watch_history(user_id, id);

            CREATE TABLE videos (
                id              TEXT PRIMARY KEY,
                owner_id        TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                video_ref       TEXT NOT NULL,
                thumbnail_ref   TEXT NOT NULL,
                title           TEXT NOT NULL,
                description     TEXT NOT NULL,
                duration        REAL NOT NULL DEFAULT 0,
                is_published    INTEGER NOT NULL DEFAULT 1,
                created_at      TEXT NOT NULL,
                updated_at      TEXT NOT NULL
            );

            CREATE INDEX idx_videos_owner ON videos(owner_id);

            CREATE TABLE comments (
                id          TEXT PRIMARY KEY,
                video_id    TEXT NOT NULL REFERENCES videos(id) ON DELETE CASCADE,
                owner_id    TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                content     TEXT NOT NULL,
                created_at  TEXT NOT NULL,
                updated_at  TEXT NOT NULL
            );

            CREATE INDEX idx_comments_video ON comments(video_id);

            CREATE TABLE tweets (
                id          TEXT PRIMARY KEY,
                owner_id    TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                content     TEXT NOT NULL,
                created_at  TEXT NOT NULL,
                updated_at  TEXT NOT NULL
            );

            CREATE INDEX idx_tweets_owner ON tweets(owner_id);

            CREATE TABLE playlists (
                id          TEXT PRIMARY KEY,
                owner_id    TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                name        TEXT NOT NULL,
                description TEXT NOT NULL,
                created_at  TEXT NOT NULL,
                updated_at  TEXT NOT NULL
            );

            CREATE INDEX idx_playlists_owner ON playlists(owner_id);

            -- Ordered, duplicates allowed.
            CREATE TABLE playlist_videos (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                playlist_id TEXT NOT NULL REFERENCES playlists(id) ON DELETE CASCADE,
                video_id    TEXT NOT NULL
            );

            CREATE INDEX idx_playlist_videos_playlist ON playlist_videos(playlist_id, id);

            CREATE TABLE likes (
                id          TEXT PRIMARY KEY,
                liked_by    TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                target_kind TEXT NOT NULL CHECK (target_kind IN ('video', 'comment', 'tweet')),
                target_id   TEXT NOT NULL,
                created_at  TEXT NOT NULL,
                UNIQUE(liked_by, target_kind, target_id)
            );

            CREATE INDEX idx_likes_target ON likes(target_kind, target_id);

            CREATE TABLE subscriptions (
                id          TEXT PRIMARY KEY,
                subscriber  TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                channel     TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                created_at  TEXT NOT NULL,
                UNIQUE(subscriber, channel),
                CHECK (subscriber <> channel)
            );

            CREATE INDEX idx_subscriptions_channel ON subscriptions(channel);

            INSERT INTO schema_version (version) VALUES (1);

            COMMIT;
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run(&conn).unwrap();
        run(&conn).unwrap();

        let version: i64 = conn
            .query_row("SELECT MAX(version) FROM schema_version", [], |r| r.get(0))
            .unwrap();
        assert_eq!(version, 1);
    }

    #[test]
    fn self_subscription_violates_check() {
        let conn = Connection::open_in_memory().unwrap();
        run(&conn).unwrap();
        conn.execute(
            "INSERT INTO users (id, username, email, full_name, avatar, password, created_at, updated_at)
             VALUES ('u1', 'a', 'a@x', 'A', 'av', 'pw', 'now', 'now')",
            [],
        )
        .unwrap();

        let result = conn.execute(
            "INSERT INTO subscriptions (id, subscriber, channel, created_at) VALUES ('s1', 'u1', 'u1', 'now')",
            [],
        );
        assert!(result.is_err());
    }
}
