use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::CookieJar;
use jsonwebtoken::{DecodingKey, Validation, decode};
use tracing::{debug, info};

use warbler_types::api::Claims;

use crate::auth::{AppState, SESSION_COOKIE, end_session, with_db};
use crate::error::AppError;
use crate::policy;

/// Identity attached to every request by `load_session`. `None` means
/// the caller is anonymous.
#[derive(Debug, Clone, Default)]
pub struct CurrentUser(pub Option<Claims>);

impl CurrentUser {
    pub fn claims(&self) -> Option<&Claims> {
        self.0.as_ref()
    }
}

/// Decode the session cookie, if any, into a `CurrentUser` extension.
/// An expired or forged token counts as no session.
pub async fn load_session(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Response {
    let claims = jar
        .get(SESSION_COOKIE)
        .and_then(|cookie| decode_token(&state.session_secret, cookie.value()));

    req.extensions_mut().insert(CurrentUser(claims));
    next.run(req).await
}

/// Gate for HTML routes: anonymous callers, and sessions whose account is
/// gone, are redirected with "Access unauthorized." before the handler runs.
pub async fn require_auth(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, Response> {
    let current = req.extensions().get::<CurrentUser>().cloned().unwrap_or_default();
    let claims = policy::require_login(&current).map_err(IntoResponse::into_response)?;

    if !account_exists(&state, claims.sub).await.map_err(IntoResponse::into_response)? {
        return Err((end_session(jar), AppError::Unauthorized).into_response());
    }

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

/// Gate for JSON routes: anonymous callers get a bare 401.
pub async fn require_api_auth(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, Response> {
    let claims = req
        .extensions()
        .get::<CurrentUser>()
        .and_then(|current| current.0.clone())
        .ok_or_else(|| StatusCode::UNAUTHORIZED.into_response())?;

    if !account_exists(&state, claims.sub).await.map_err(IntoResponse::into_response)? {
        return Err((end_session(jar), StatusCode::UNAUTHORIZED).into_response());
    }

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

/// A token can outlive the account it was issued for.
async fn account_exists(state: &AppState, user_id: i64) -> Result<bool, AppError> {
    let exists = with_db(state, move |db| Ok(db.get_user_by_id(user_id)?.is_some())).await?;
    if !exists {
        info!("Dropping session for deleted user #{}", user_id);
    }
    Ok(exists)
}

fn decode_token(secret: &str, token: &str) -> Option<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| debug!("Rejected session token: {}", e))
    .ok()
}
