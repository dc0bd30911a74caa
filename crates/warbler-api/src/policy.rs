//! Authorization decisions. Each check runs before the action it guards
//! and fails closed with `AppError::Unauthorized`.

use tracing::warn;

use warbler_db::MessageRow;
use warbler_types::api::Claims;

use crate::error::AppError;
use crate::middleware::CurrentUser;

/// Any logged-in user passes; anonymous callers do not.
pub fn require_login(current: &CurrentUser) -> Result<Claims, AppError> {
    current.claims().cloned().ok_or(AppError::Unauthorized)
}

/// Only a message's author may delete it.
pub fn ensure_author(claims: &Claims, message: &MessageRow) -> Result<(), AppError> {
    if message.user_id == claims.sub {
        return Ok(());
    }

    warn!(
        "User #{} tried to modify message #{} owned by #{}",
        claims.sub, message.id, message.user_id
    );
    Err(AppError::Unauthorized)
}
