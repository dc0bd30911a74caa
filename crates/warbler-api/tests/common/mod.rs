#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
    response::Response,
};
use http_body_util::BodyExt;
use tower::ServiceExt;

use warbler_api::{AppState, AppStateInner, auth};
use warbler_db::Database;
use warbler_types::api::SignupForm;
use warbler_types::models::User;

pub const SESSION_SECRET: &str = "test-secret";

/// Drives the router in-process and keeps cookies between requests,
/// like a browser would.
pub struct TestApp {
    pub state: AppState,
    router: Router,
    cookies: HashMap<String, String>,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub location: Option<String>,
    pub body: String,
}

impl TestApp {
    pub fn new() -> Self {
        let state: AppState = Arc::new(AppStateInner::new(
            Database::open_in_memory().unwrap(),
            SESSION_SECRET.into(),
            1,
        ));
        let router = warbler_api::create_app(state.clone());
        Self { state, router, cookies: HashMap::new() }
    }

    /// Sign up through the service layer, bypassing HTTP.
    pub fn signup(&self, username: &str, email: &str, password: &str) -> User {
        let form = SignupForm {
            username: Some(username.into()),
            email: Some(email.into()),
            password: password.into(),
            image_url: Some("http://google.com".into()),
        };
        auth::signup(&self.state.db, &form).unwrap()
    }

    pub async fn get(&mut self, uri: &str) -> TestResponse {
        let req = Request::builder().method("GET").uri(uri);
        self.send(req.body(Body::empty()).unwrap()).await
    }

    pub async fn post_form(&mut self, uri: &str, body: &str) -> TestResponse {
        let req = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        self.send(req.body(Body::from(body.to_string())).unwrap()).await
    }

    pub async fn post_empty(&mut self, uri: &str) -> TestResponse {
        self.post_form(uri, "").await
    }

    /// Follow redirects with GET, carrying cookies, until a non-redirect.
    pub async fn follow(&mut self, mut resp: TestResponse) -> TestResponse {
        for _ in 0..5 {
            let Some(location) = resp.location.clone() else {
                return resp;
            };
            resp = self.get(&location).await;
        }
        panic!("too many redirects");
    }

    pub async fn login(&mut self, username: &str, password: &str) -> TestResponse {
        let body = format!("username={}&password={}", username, password);
        let resp = self.post_form("/login", &body).await;
        self.follow(resp).await
    }

    pub fn logout_locally(&mut self) {
        self.cookies.clear();
    }

    pub fn set_cookie(&mut self, name: &str, value: &str) {
        self.cookies.insert(name.into(), value.into());
    }

    pub fn has_cookie(&self, name: &str) -> bool {
        self.cookies.contains_key(name)
    }

    /// Remove the account out from under any session that points at it.
    pub fn delete_user(&self, user_id: i64) {
        self.state
            .db
            .with_conn(|conn| {
                conn.execute("DELETE FROM users WHERE id = ?1", [user_id])?;
                Ok(())
            })
            .unwrap();
    }

    async fn send(&mut self, mut req: Request<Body>) -> TestResponse {
        if !self.cookies.is_empty() {
            let cookie = self
                .cookies
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect::<Vec<_>>()
                .join("; ");
            req.headers_mut().insert(header::COOKIE, cookie.parse().unwrap());
        }

        let resp = self.router.clone().oneshot(req).await.unwrap();
        self.store_cookies(&resp);

        let status = resp.status();
        let location = resp
            .headers()
            .get(header::LOCATION)
            .map(|v| v.to_str().unwrap().to_string());
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();

        TestResponse {
            status,
            location,
            body: String::from_utf8(bytes.to_vec()).unwrap(),
        }
    }

    fn store_cookies(&mut self, resp: &Response) {
        for value in resp.headers().get_all(header::SET_COOKIE) {
            let raw = value.to_str().unwrap();
            let pair = raw.split(';').next().unwrap_or_default();
            let Some((name, value)) = pair.split_once('=') else {
                continue;
            };
            if value.is_empty() {
                self.cookies.remove(name.trim());
            } else {
                self.cookies.insert(name.trim().to_string(), value.to_string());
            }
        }
    }
}
