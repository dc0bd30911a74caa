use rusqlite::Connection;
use tracing::debug;
use warbler_types::models::User;

use crate::queries::map_user;
use crate::{Database, Result, StoreError};

impl Database {
    /// Add the edge `follower -> target`. Following someone twice is a
    /// no-op; returns whether a new edge was written.
    pub fn follow(&self, follower_id: i64, target_id: i64) -> Result<bool> {
        if follower_id == target_id {
            return Err(StoreError::SelfFollow);
        }

        self.with_conn(|conn| {
            let added = conn.execute(
                "INSERT OR IGNORE INTO follows (follower_id, followed_id) VALUES (?1, ?2)",
                [follower_id, target_id],
            )?;
            debug!("follow {} -> {} (added: {})", follower_id, target_id, added > 0);
            Ok(added > 0)
        })
    }

    /// Remove the edge `follower -> target` if it exists.
    pub fn unfollow(&self, follower_id: i64, target_id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let removed = conn.execute(
                "DELETE FROM follows WHERE follower_id = ?1 AND followed_id = ?2",
                [follower_id, target_id],
            )?;
            debug!("unfollow {} -> {} (removed: {})", follower_id, target_id, removed > 0);
            Ok(removed > 0)
        })
    }

    /// Is `a` following `b`?
    pub fn is_following(&self, a: i64, b: i64) -> Result<bool> {
        self.with_conn(|conn| edge_exists(conn, a, b))
    }

    /// Is `a` followed by `b`?
    pub fn is_followed_by(&self, a: i64, b: i64) -> Result<bool> {
        self.with_conn(|conn| edge_exists(conn, b, a))
    }

    /// Users following `user_id`.
    pub fn followers(&self, user_id: i64) -> Result<Vec<User>> {
        self.with_conn(|conn| {
            query_related(
                conn,
                "SELECT u.id, u.username, u.email, u.password, u.image_url, u.created_at
                 FROM follows f JOIN users u ON u.id = f.follower_id
                 WHERE f.followed_id = ?1
                 ORDER BY u.id",
                user_id,
            )
        })
    }

    /// Users that `user_id` follows.
    pub fn following(&self, user_id: i64) -> Result<Vec<User>> {
        self.with_conn(|conn| {
            query_related(
                conn,
                "SELECT u.id, u.username, u.email, u.password, u.image_url, u.created_at
                 FROM follows f JOIN users u ON u.id = f.followed_id
                 WHERE f.follower_id = ?1
                 ORDER BY u.id",
                user_id,
            )
        })
    }
}

fn edge_exists(conn: &Connection, follower_id: i64, followed_id: i64) -> Result<bool> {
    let exists = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM follows WHERE follower_id = ?1 AND followed_id = ?2)",
        [follower_id, followed_id],
        |row| row.get(0),
    )?;
    Ok(exists)
}

fn query_related(conn: &Connection, sql: &str, user_id: i64) -> Result<Vec<User>> {
    let mut stmt = conn.prepare(sql)?;
    let users = stmt
        .query_map([user_id], map_user)?
        .map(|row| row.map(User::from))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(users)
}
