use axum::{
    Extension, Form,
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;
use tracing::info;

use warbler_types::api::{Claims, MessageForm};

use crate::auth::{AppState, with_db};
use crate::error::AppError;
use crate::flash::{self, Flash};
use crate::middleware::CurrentUser;
use crate::pages::{self, Frame};
use crate::policy;

pub const MAX_MESSAGE_LEN: usize = 140;

/// GET /messages/new
pub async fn new_message_form(
    Extension(claims): Extension<Claims>,
    jar: CookieJar,
) -> impl IntoResponse {
    let (jar, flash) = flash::take(jar);
    (jar, Html(pages::new_message(&Frame::new(Some(&claims), flash), "")))
}

/// POST /messages/new — the author is always the session user.
pub async fn create_message(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    jar: CookieJar,
    Form(form): Form<MessageForm>,
) -> Result<Response, AppError> {
    let text = form.text.trim().to_string();
    let len = text.chars().count();
    if len == 0 || len > MAX_MESSAGE_LEN {
        let (jar, _) = flash::take(jar);
        let msg = format!("Messages must be between 1 and {} characters.", MAX_MESSAGE_LEN);
        let frame = Frame::new(Some(&claims), Some(Flash::danger(msg)));
        return Ok((jar, Html(pages::new_message(&frame, &form.text))).into_response());
    }

    let author = claims.sub;
    let message = with_db(&state, move |db| db.insert_message(author, &text)).await?;
    info!("User #{} posted message #{}", author, message.id);

    Ok(Redirect::to(&format!("/users/{}", author)).into_response())
}

/// GET /messages/{message_id}
pub async fn show_message(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(message_id): Path<i64>,
    jar: CookieJar,
) -> Result<impl IntoResponse, AppError> {
    let (jar, flash) = flash::take(jar);

    let message = with_db(&state, move |db| db.get_message(message_id))
        .await?
        .ok_or(AppError::NotFound)?;

    let frame = Frame::new(current.claims(), flash);
    Ok((jar, Html(pages::message_show(&frame, &message))))
}

/// POST /messages/{message_id}/delete — author only.
pub async fn delete_message(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(message_id): Path<i64>,
) -> Result<Redirect, AppError> {
    let message = with_db(&state, move |db| db.get_message(message_id))
        .await?
        .ok_or(AppError::NotFound)?;

    policy::ensure_author(&claims, &message)?;

    let author = claims.sub;
    let removed = with_db(&state, move |db| db.delete_message(message_id, author)).await?;
    if removed {
        info!("User #{} deleted message #{}", author, message_id);
    }

    Ok(Redirect::to(&format!("/users/{}", author)))
}
