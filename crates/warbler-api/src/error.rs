use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;
use thiserror::Error;
use tracing::error;

use warbler_db::StoreError;

use crate::flash::{self, Flash};
use crate::pages;

pub const UNAUTHORIZED_MESSAGE: &str = "Access unauthorized.";

#[derive(Debug, Error)]
pub enum AppError {
    /// No session, or the session does not own the resource.
    #[error("access unauthorized")]
    Unauthorized,

    #[error("not found")]
    NotFound,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Unauthorized => {
                let jar = flash::push(CookieJar::new(), &Flash::danger(UNAUTHORIZED_MESSAGE));
                (jar, Redirect::to("/")).into_response()
            }
            AppError::NotFound => (StatusCode::NOT_FOUND, Html(pages::not_found())).into_response(),
            other => {
                error!("Request failed: {}", other);
                (StatusCode::INTERNAL_SERVER_ERROR, Html(pages::server_error())).into_response()
            }
        }
    }
}
