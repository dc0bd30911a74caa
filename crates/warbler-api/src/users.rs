use axum::{
    Extension,
    extract::{Path, Query, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use tracing::info;

use warbler_db::{Database, StoreError};
use warbler_types::api::{Claims, SearchQuery};
use warbler_types::models::{User, UserStats};

use crate::auth::{AppState, end_session, with_db};
use crate::error::AppError;
use crate::flash::{self, Flash};
use crate::middleware::CurrentUser;
use crate::pages::{self, Frame};

/// Home feed shows at most this many messages.
const TIMELINE_LIMIT: u32 = 100;
const PROFILE_LIMIT: u32 = 100;

fn load_profile(db: &Database, user_id: i64) -> warbler_db::Result<Option<(User, UserStats)>> {
    let Some(row) = db.get_user_by_id(user_id)? else {
        return Ok(None);
    };
    let stats = db.user_stats(user_id)?;
    Ok(Some((row.into(), stats)))
}

/// GET / — welcome page for visitors, timeline for members.
pub async fn home(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    jar: CookieJar,
) -> Result<Response, AppError> {
    let (jar, flash) = flash::take(jar);

    let Some(claims) = current.claims() else {
        return Ok((jar, Html(pages::home_anon(&Frame::new(None, flash)))).into_response());
    };

    let uid = claims.sub;
    let (profile, messages, liked) = with_db(&state, move |db| {
        let profile = load_profile(db, uid)?;
        let messages = db.get_timeline(uid, TIMELINE_LIMIT)?;
        let liked = db.get_liked_ids(uid)?;
        Ok((profile, messages, liked))
    })
    .await?;

    // Session outlived its account: drop it and show the visitor page.
    let Some((user, stats)) = profile else {
        let jar = end_session(jar);
        return Ok((jar, Html(pages::home_anon(&Frame::new(None, flash)))).into_response());
    };

    let frame = Frame::new(Some(claims), flash);
    Ok((jar, Html(pages::home(&frame, &user, &stats, &messages, &liked))).into_response())
}

/// GET /users — everyone, or usernames matching `?q=`.
pub async fn list_users(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Query(query): Query<SearchQuery>,
    jar: CookieJar,
) -> Result<impl IntoResponse, AppError> {
    let (jar, flash) = flash::take(jar);

    let term = query.q.clone().unwrap_or_default();
    let users = with_db(&state, move |db| db.search_users(&term)).await?;

    let frame = Frame::new(current.claims(), flash);
    Ok((jar, Html(pages::users_index(&frame, &users, query.q.as_deref()))))
}

/// GET /users/{user_id} — public profile with the user's messages.
pub async fn show_user(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(user_id): Path<i64>,
    jar: CookieJar,
) -> Result<impl IntoResponse, AppError> {
    let (jar, flash) = flash::take(jar);
    let viewer = current.claims().map(|c| c.sub);

    let (profile, messages, is_following, liked) = with_db(&state, move |db| {
        let profile = load_profile(db, user_id)?;
        let messages = db.get_user_messages(user_id, PROFILE_LIMIT)?;
        let (is_following, liked) = match viewer {
            Some(me) if me != user_id => (Some(db.is_following(me, user_id)?), db.get_liked_ids(me)?),
            Some(me) => (None, db.get_liked_ids(me)?),
            None => (None, Vec::new()),
        };
        Ok((profile, messages, is_following, liked))
    })
    .await?;

    let (user, stats) = profile.ok_or(AppError::NotFound)?;
    let frame = Frame::new(current.claims(), flash);
    Ok((jar, Html(pages::user_show(&frame, &user, &stats, is_following, &messages, &liked))))
}

/// GET /users/{user_id}/following
pub async fn show_following(
    state: State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(user_id): Path<i64>,
    jar: CookieJar,
) -> Result<impl IntoResponse, AppError> {
    connections(state, claims, user_id, jar, "following").await
}

/// GET /users/{user_id}/followers
pub async fn show_followers(
    state: State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(user_id): Path<i64>,
    jar: CookieJar,
) -> Result<impl IntoResponse, AppError> {
    connections(state, claims, user_id, jar, "followers").await
}

async fn connections(
    State(state): State<AppState>,
    claims: Claims,
    user_id: i64,
    jar: CookieJar,
    section: &'static str,
) -> Result<(CookieJar, Html<String>), AppError> {
    let (jar, flash) = flash::take(jar);

    let (profile, users) = with_db(&state, move |db| {
        let profile = load_profile(db, user_id)?;
        let users = match section {
            "following" => db.following(user_id)?,
            _ => db.followers(user_id)?,
        };
        Ok((profile, users))
    })
    .await?;

    let (user, stats) = profile.ok_or(AppError::NotFound)?;
    let frame = Frame::new(Some(&claims), flash);
    Ok((jar, Html(pages::user_connections(&frame, &user, &stats, section, &users))))
}

/// GET /users/{user_id}/likes
pub async fn show_likes(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(user_id): Path<i64>,
    jar: CookieJar,
) -> Result<impl IntoResponse, AppError> {
    let (jar, flash) = flash::take(jar);
    let me = claims.sub;

    let (profile, messages, liked) = with_db(&state, move |db| {
        let profile = load_profile(db, user_id)?;
        let messages = db.get_liked_messages(user_id)?;
        let liked = db.get_liked_ids(me)?;
        Ok((profile, messages, liked))
    })
    .await?;

    let (user, stats) = profile.ok_or(AppError::NotFound)?;
    let frame = Frame::new(Some(&claims), flash);
    Ok((jar, Html(pages::user_likes(&frame, &user, &stats, &messages, &liked))))
}

/// POST /users/follow/{user_id}
pub async fn follow(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(target_id): Path<i64>,
    jar: CookieJar,
) -> Result<Response, AppError> {
    let me = claims.sub;
    let outcome = with_db(&state, move |db| {
        if db.get_user_by_id(target_id)?.is_none() {
            return Ok(None);
        }
        db.follow(me, target_id).map(Some)
    })
    .await;

    match outcome {
        Ok(Some(added)) => {
            if added {
                info!("User #{} now follows #{}", me, target_id);
            }
            Ok(Redirect::to(&format!("/users/{}/following", me)).into_response())
        }
        Ok(None) => Err(AppError::NotFound),
        Err(AppError::Store(StoreError::SelfFollow)) => {
            let jar = flash::push(jar, &Flash::danger("You cannot follow yourself."));
            Ok((jar, Redirect::to(&format!("/users/{}", me))).into_response())
        }
        Err(e) => Err(e),
    }
}

/// POST /users/stop-following/{user_id}
pub async fn stop_following(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(target_id): Path<i64>,
) -> Result<Redirect, AppError> {
    let me = claims.sub;
    let removed = with_db(&state, move |db| db.unfollow(me, target_id)).await?;
    if removed {
        info!("User #{} stopped following #{}", me, target_id);
    }
    Ok(Redirect::to(&format!("/users/{}/following", me)))
}
