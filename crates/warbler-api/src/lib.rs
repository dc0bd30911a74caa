pub mod auth;
pub mod error;
pub mod flash;
pub mod likes;
pub mod messages;
pub mod middleware;
pub mod pages;
pub mod policy;
pub mod users;

pub use auth::{AppState, AppStateInner};
pub use error::AppError;

use axum::{
    Router, middleware as axum_mw,
    routing::{get, post},
};

use crate::middleware::{load_session, require_api_auth, require_auth};

/// Build the application router. Static files and tracing layers are
/// added by the binary.
pub fn create_app(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/", get(users::home))
        .route("/signup", get(auth::signup_form).post(auth::signup_submit))
        .route("/login", get(auth::login_form).post(auth::login))
        .route("/logout", get(auth::logout))
        .route("/users", get(users::list_users))
        .route("/users/{user_id}", get(users::show_user))
        .route("/messages/{message_id}", get(messages::show_message));

    let protected_routes = Router::new()
        .route("/users/{user_id}/following", get(users::show_following))
        .route("/users/{user_id}/followers", get(users::show_followers))
        .route("/users/{user_id}/likes", get(users::show_likes))
        .route("/users/follow/{user_id}", post(users::follow))
        .route("/users/stop-following/{user_id}", post(users::stop_following))
        .route(
            "/messages/new",
            get(messages::new_message_form).post(messages::create_message),
        )
        .route("/messages/{message_id}/delete", post(messages::delete_message))
        .route_layer(axum_mw::from_fn_with_state(state.clone(), require_auth));

    let api_routes = Router::new()
        .route("/api/messages/{message_id}/toggle_like", post(likes::toggle_like))
        .route_layer(axum_mw::from_fn_with_state(state.clone(), require_api_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .merge(api_routes)
        .layer(axum_mw::from_fn_with_state(state.clone(), load_session))
        .with_state(state)
}
