use rusqlite::{Connection, OptionalExtension};
use tracing::debug;
use warbler_types::models::{User, UserStats};

use crate::models::{LikeOutcome, MessageRow, NewUser, UserRow};
use crate::{Database, Result};

const USER_COLUMNS: &str = "id, username, email, password, image_url, created_at";

const MESSAGE_SELECT: &str = "SELECT m.id, m.text, m.user_id, u.username, u.image_url, m.created_at
     FROM messages m
     JOIN users u ON m.user_id = u.id";

impl Database {
    // -- Users --

    /// Insert a user row. Uniqueness and required fields are left to the
    /// schema, so a failed insert surfaces as `Uniqueness` or
    /// `RequiredField` and leaves nothing behind.
    pub fn create_user(&self, new: &NewUser<'_>) -> Result<User> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (username, email, password, image_url) VALUES (?1, ?2, ?3, ?4)",
                (new.username, new.email, new.password, new.image_url),
            )?;
            let id = conn.last_insert_rowid();
            debug!("Inserted user #{}", id);

            let row = query_user(conn, "id = ?1", id)?.ok_or_else(|| {
                anyhow::anyhow!("User #{} vanished right after insert", id)
            })?;
            Ok(row.into())
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "username = ?1", username))
    }

    pub fn get_user_by_id(&self, id: i64) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id = ?1", id))
    }

    /// Users whose username contains `term`, ASCII case-insensitive, in
    /// signup order. A blank term lists everyone.
    pub fn search_users(&self, term: &str) -> Result<Vec<User>> {
        let pattern = format!("%{}%", escape_like(term.trim()));

        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {} FROM users WHERE username LIKE ?1 ESCAPE '\\' ORDER BY id",
                USER_COLUMNS
            );
            let mut stmt = conn.prepare(&sql)?;
            let users = stmt
                .query_map([&pattern], map_user)?
                .map(|row| row.map(User::from))
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(users)
        })
    }

    pub fn user_stats(&self, user_id: i64) -> Result<UserStats> {
        self.with_conn(|conn| {
            let stats = conn.query_row(
                "SELECT
                    (SELECT COUNT(*) FROM messages WHERE user_id = ?1),
                    (SELECT COUNT(*) FROM follows WHERE follower_id = ?1),
                    (SELECT COUNT(*) FROM follows WHERE followed_id = ?1),
                    (SELECT COUNT(*) FROM likes WHERE user_id = ?1)",
                [user_id],
                |row| {
                    Ok(UserStats {
                        messages: row.get(0)?,
                        following: row.get(1)?,
                        followers: row.get(2)?,
                        likes: row.get(3)?,
                    })
                },
            )?;
            Ok(stats)
        })
    }

    // -- Messages --

    pub fn insert_message(&self, author_id: i64, text: &str) -> Result<MessageRow> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO messages (text, user_id) VALUES (?1, ?2)",
                rusqlite::params![text, author_id],
            )?;
            let id = conn.last_insert_rowid();

            query_message(conn, id)?
                .ok_or_else(|| anyhow::anyhow!("Message #{} vanished right after insert", id).into())
        })
    }

    pub fn get_message(&self, id: i64) -> Result<Option<MessageRow>> {
        self.with_conn(|conn| query_message(conn, id))
    }

    /// Deletes the message only when `author_id` wrote it.
    /// Returns whether a row was removed.
    pub fn delete_message(&self, id: i64, author_id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let removed = conn.execute(
                "DELETE FROM messages WHERE id = ?1 AND user_id = ?2",
                [id, author_id],
            )?;
            Ok(removed > 0)
        })
    }

    pub fn get_user_messages(&self, user_id: i64, limit: u32) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| {
            query_messages(
                conn,
                "WHERE m.user_id = ?1 ORDER BY m.created_at DESC, m.id DESC LIMIT ?2",
                rusqlite::params![user_id, limit],
            )
        })
    }

    /// Home feed: the user's own messages plus those of everyone they follow.
    pub fn get_timeline(&self, user_id: i64, limit: u32) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| {
            query_messages(
                conn,
                "WHERE m.user_id = ?1
                    OR m.user_id IN (SELECT followed_id FROM follows WHERE follower_id = ?1)
                 ORDER BY m.created_at DESC, m.id DESC
                 LIMIT ?2",
                rusqlite::params![user_id, limit],
            )
        })
    }

    // -- Likes --

    /// Like the message if not yet liked, otherwise remove the like.
    pub fn toggle_like(&self, user_id: i64, message_id: i64) -> Result<LikeOutcome> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let author: Option<i64> = tx
                .query_row("SELECT user_id FROM messages WHERE id = ?1", [message_id], |row| {
                    row.get(0)
                })
                .optional()?;

            let outcome = match author {
                None => LikeOutcome::NoMessage,
                Some(author) if author == user_id => LikeOutcome::OwnMessage,
                Some(_) => {
                    let removed = tx.execute(
                        "DELETE FROM likes WHERE user_id = ?1 AND message_id = ?2",
                        [user_id, message_id],
                    )?;
                    if removed > 0 {
                        LikeOutcome::Unliked
                    } else {
                        tx.execute(
                            "INSERT INTO likes (user_id, message_id) VALUES (?1, ?2)",
                            [user_id, message_id],
                        )?;
                        LikeOutcome::Liked
                    }
                }
            };

            tx.commit()?;
            Ok(outcome)
        })
    }

    pub fn get_liked_messages(&self, user_id: i64) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| {
            query_messages(
                conn,
                "JOIN likes l ON l.message_id = m.id
                 WHERE l.user_id = ?1
                 ORDER BY l.created_at DESC, m.id DESC",
                [user_id],
            )
        })
    }

    /// Ids of every message the user has liked, for rendering like toggles.
    pub fn get_liked_ids(&self, user_id: i64) -> Result<Vec<i64>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT message_id FROM likes WHERE user_id = ?1")?;
            let ids = stmt
                .query_map([user_id], |row| row.get(0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(ids)
        })
    }
}

pub(crate) fn map_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password: row.get(3)?,
        image_url: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn query_user<P: rusqlite::ToSql>(
    conn: &Connection,
    condition: &str,
    param: P,
) -> Result<Option<UserRow>> {
    let sql = format!("SELECT {} FROM users WHERE {}", USER_COLUMNS, condition);
    let row = conn.query_row(&sql, [param], map_user).optional()?;
    Ok(row)
}

fn query_message(conn: &Connection, id: i64) -> Result<Option<MessageRow>> {
    let mut rows = query_messages(conn, "WHERE m.id = ?1", [id])?;
    Ok(rows.pop())
}

fn query_messages<P: rusqlite::Params>(
    conn: &Connection,
    tail: &str,
    params: P,
) -> Result<Vec<MessageRow>> {
    // JOIN users to fetch the author in a single query
    let sql = format!("{} {}", MESSAGE_SELECT, tail);
    let mut stmt = conn.prepare(&sql)?;

    let rows = stmt
        .query_map(params, |row| {
            Ok(MessageRow {
                id: row.get(0)?,
                text: row.get(1)?,
                user_id: row.get(2)?,
                author_username: row.get(3)?,
                author_image_url: row.get(4)?,
                created_at: row.get(5)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

/// Escape LIKE wildcards so the term matches literally.
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
