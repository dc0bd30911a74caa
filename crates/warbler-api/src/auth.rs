use std::sync::Arc;

use axum::{
    Form,
    extract::State,
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use jsonwebtoken::{EncodingKey, Header, encode};
use tracing::{error, info, warn};

use warbler_crypto::credentials::{hash_password, verify_against_dummy, verify_password};
use warbler_db::{Database, NewUser, StoreError};
use warbler_types::api::{Claims, LoginForm, SignupForm};
use warbler_types::models::User;

use crate::error::AppError;
use crate::flash::{self, Flash};
use crate::pages::{self, Frame};

pub const SESSION_COOKIE: &str = "warbler_session";
pub const INVALID_CREDENTIALS: &str = "Invalid credentials.";
const MIN_PASSWORD_LEN: usize = 6;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub session_secret: String,
    pub session_days: i64,
}

impl AppStateInner {
    /// Also prepares the dummy credential, so the first failed login for an
    /// unknown user costs the same as a wrong password.
    pub fn new(db: Database, session_secret: String, session_days: i64) -> Self {
        warbler_crypto::credentials::warm_up();
        Self { db, session_secret, session_days }
    }
}

/// Run a database closure on the blocking pool.
pub(crate) async fn with_db<F, T>(state: &AppState, f: F) -> Result<T, AppError>
where
    F: FnOnce(&Database) -> warbler_db::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state.db))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            AppError::Internal(e.into())
        })?
        .map_err(AppError::from)
}

// -- Service --

/// Create an account from untrusted form input. Blank username or email
/// is passed on as missing so the store reports `RequiredField`;
/// duplicates come back as `Uniqueness`.
pub fn signup(db: &Database, form: &SignupForm) -> warbler_db::Result<User> {
    let credential = hash_password(&form.password)?;

    db.create_user(&NewUser {
        username: non_blank(form.username.as_deref()),
        email: non_blank(form.email.as_deref()),
        password: &credential,
        image_url: non_blank(form.image_url.as_deref()),
    })
}

/// Look up `username` and check `password`. Unknown user and wrong
/// password are indistinguishable to the caller.
pub fn authenticate(db: &Database, username: &str, password: &str) -> warbler_db::Result<Option<User>> {
    let Some(row) = db.get_user_by_username(username)? else {
        verify_against_dummy(password);
        return Ok(None);
    };

    if verify_password(&row.password, password) {
        Ok(Some(row.into()))
    } else {
        Ok(None)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

// -- Handlers --

pub async fn login_form(jar: CookieJar) -> impl IntoResponse {
    let (jar, flash) = flash::take(jar);
    (jar, Html(pages::login(&Frame::new(None, flash))))
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let LoginForm { username, password } = form;
    let attempted = username.clone();
    let user = with_db(&state, move |db| authenticate(db, &username, &password)).await?;

    let Some(user) = user else {
        warn!("Failed login for '{}'", attempted);
        let (jar, _) = flash::take(jar);
        let frame = Frame::new(None, Some(Flash::danger(INVALID_CREDENTIALS)));
        return Ok((jar, Html(pages::login(&frame))).into_response());
    };

    info!("User #{} logged in", user.id);
    let jar = start_session(&state, jar, &user)?;
    let jar = flash::push(jar, &Flash::success(format!("Hello, {}!", user.username)));
    Ok((jar, Redirect::to("/")).into_response())
}

pub async fn signup_form(jar: CookieJar) -> impl IntoResponse {
    let (jar, flash) = flash::take(jar);
    (jar, Html(pages::signup(&Frame::new(None, flash), &SignupForm::default())))
}

pub async fn signup_submit(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<SignupForm>,
) -> Result<Response, AppError> {
    if form.password.chars().count() < MIN_PASSWORD_LEN {
        let msg = format!("Password must be at least {} characters.", MIN_PASSWORD_LEN);
        return Ok(rerender_signup(jar, &form, msg));
    }

    let submitted = form.clone();
    let outcome = with_db(&state, move |db| signup(db, &submitted)).await;

    let user = match outcome {
        Ok(user) => user,
        Err(AppError::Store(StoreError::Uniqueness { field })) => {
            info!("Signup rejected: duplicate {}", field);
            return Ok(rerender_signup(jar, &form, format!("{} already taken", capitalize(&field))));
        }
        Err(AppError::Store(StoreError::RequiredField { field })) => {
            return Ok(rerender_signup(jar, &form, format!("{} is required", capitalize(&field))));
        }
        Err(e) => return Err(e),
    };

    info!("New user #{} signed up as '{}'", user.id, user.username);
    let jar = start_session(&state, jar, &user)?;
    Ok((jar, Redirect::to("/")).into_response())
}

pub async fn logout(jar: CookieJar) -> impl IntoResponse {
    let jar = end_session(jar);
    let jar = flash::push(jar, &Flash::success("You have successfully logged out."));
    (jar, Redirect::to("/login"))
}

fn rerender_signup(jar: CookieJar, form: &SignupForm, msg: String) -> Response {
    let (jar, _) = flash::take(jar);
    let frame = Frame::new(None, Some(Flash::danger(msg)));
    (jar, Html(pages::signup(&frame, form))).into_response()
}

fn capitalize(field: &str) -> String {
    let mut chars = field.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub(crate) fn end_session(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build(SESSION_COOKIE).path("/"))
}

fn start_session(state: &AppState, jar: CookieJar, user: &User) -> Result<CookieJar, AppError> {
    let token = create_token(&state.session_secret, state.session_days, user)?;
    Ok(jar.add(
        Cookie::build((SESSION_COOKIE, token))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax),
    ))
}

fn create_token(secret: &str, days: i64, user: &User) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user.id,
        username: user.username.clone(),
        exp: (chrono::Utc::now() + chrono::Duration::days(days)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}
