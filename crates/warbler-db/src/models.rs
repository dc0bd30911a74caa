//! Database row types. These map directly to SQLite rows and are kept
//! apart from the warbler-types models so the credential never leaks out.

use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::warn;
use warbler_types::models::{Message, User};

pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password: String,
    pub image_url: Option<String>,
    pub created_at: String,
}

pub struct MessageRow {
    pub id: i64,
    pub text: String,
    pub user_id: i64,
    pub author_username: String,
    pub author_image_url: Option<String>,
    pub created_at: String,
}

/// Raw insert payload for `Database::create_user`. The password is stored
/// exactly as given, so it must already be a credential. Untrusted input
/// goes through signup instead.
#[derive(Debug, Clone, Copy)]
pub struct NewUser<'a> {
    pub username: Option<&'a str>,
    pub email: Option<&'a str>,
    pub password: &'a str,
    pub image_url: Option<&'a str>,
}

impl<'a> NewUser<'a> {
    pub fn new(username: &'a str, email: &'a str, password: &'a str) -> Self {
        Self {
            username: Some(username),
            email: Some(email),
            password,
            image_url: None,
        }
    }
}

/// Result of toggling a like.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeOutcome {
    Liked,
    Unliked,
    NoMessage,
    OwnMessage,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        let created_at = parse_timestamp(&row.created_at, "user", row.id);
        User {
            id: row.id,
            username: row.username,
            email: row.email,
            image_url: row.image_url,
            created_at,
        }
    }
}

impl From<MessageRow> for Message {
    fn from(row: MessageRow) -> Self {
        let created_at = parse_timestamp(&row.created_at, "message", row.id);
        Message {
            id: row.id,
            text: row.text,
            user_id: row.user_id,
            author_username: row.author_username,
            author_image_url: row.author_image_url,
            created_at,
        }
    }
}

/// SQLite stores timestamps as "YYYY-MM-DD HH:MM:SS" without timezone.
/// Parse as naive UTC.
fn parse_timestamp(raw: &str, kind: &str, id: i64) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc()))
        .unwrap_or_else(|e| {
            warn!("Corrupt created_at '{}' on {} {}: {}", raw, kind, id, e);
            DateTime::default()
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn sqlite_timestamps_parse_as_utc() {
        let ts = parse_timestamp("2024-03-05 14:07:09", "message", 1);
        assert_eq!((ts.year(), ts.month(), ts.day()), (2024, 3, 5));
        assert_eq!((ts.hour(), ts.minute(), ts.second()), (14, 7, 9));
    }

    #[test]
    fn corrupt_timestamp_falls_back_to_epoch() {
        assert_eq!(parse_timestamp("yesterday", "user", 3), DateTime::<Utc>::default());
    }
}
