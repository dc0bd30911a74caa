use rusqlite::ffi;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

/// Store failures callers are expected to tell apart. Constraint
/// violations are detected by SQLite at write time and translated here.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A UNIQUE index rejected the write (duplicate username or email).
    #[error("{field} already taken")]
    Uniqueness { field: String },

    /// A NOT NULL column was left empty.
    #[error("{field} is required")]
    RequiredField { field: String },

    #[error("users cannot follow themselves")]
    SelfFollow,

    #[error("database error: {0}")]
    Sqlite(#[source] rusqlite::Error),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(code, Some(msg)) = &err {
            match code.extended_code {
                ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                    return StoreError::Uniqueness {
                        field: constraint_column(msg),
                    };
                }
                ffi::SQLITE_CONSTRAINT_NOTNULL => {
                    return StoreError::RequiredField {
                        field: constraint_column(msg),
                    };
                }
                _ => {}
            }
        }
        StoreError::Sqlite(err)
    }
}

/// Pulls `username` out of "UNIQUE constraint failed: users.username".
/// Composite keys report their first column.
fn constraint_column(msg: &str) -> String {
    let columns = msg.rsplit(": ").next().unwrap_or(msg);
    let first = columns.split(", ").next().unwrap_or(columns);
    first.rsplit('.').next().unwrap_or(first).to_string()
}
