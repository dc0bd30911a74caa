mod common;

use axum::http::StatusCode;
use common::TestApp;
use warbler_types::api::LikeResponse;

fn setup() -> (TestApp, i64, i64) {
    let app = TestApp::new();
    let u1 = app.signup("testuser", "test@test.com", "PASSWORD");
    let u2 = app.signup("testuser2", "test2@test.com", "PASSWORD2");
    (app, u1.id, u2.id)
}

#[tokio::test]
async fn logged_out_cannot_add_or_delete() {
    let (mut app, _, u2) = setup();
    let msg = app.state.db.insert_message(u2, "still here").unwrap();

    let resp = app.get("/messages/new").await;
    assert_eq!(resp.location.as_deref(), Some("/"));

    let resp = app.post_form("/messages/new", "text=hello").await;
    assert_eq!(resp.status, StatusCode::SEE_OTHER);
    let resp = app.follow(resp).await;
    assert!(resp.body.contains("Access unauthorized."));
    assert!(app.state.db.get_user_messages(u2, 10).unwrap().len() == 1);

    let resp = app.post_empty(&format!("/messages/{}/delete", msg.id)).await;
    assert_eq!(resp.location.as_deref(), Some("/"));
    assert!(app.state.db.get_message(msg.id).unwrap().is_some());
}

#[tokio::test]
async fn add_message_as_self() {
    let (mut app, u1, _) = setup();
    app.login("testuser", "PASSWORD").await;

    let resp = app.get("/messages/new").await;
    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.body.contains(r#"id="message_form""#));

    let resp = app.post_form("/messages/new", "text=Hello+world").await;
    assert_eq!(resp.location, Some(format!("/users/{}", u1)));

    let messages = app.state.db.get_user_messages(u1, 10).unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].text, "Hello world");

    let resp = app.follow(resp).await;
    assert!(resp.body.contains("Hello world"));
}

#[tokio::test]
async fn cannot_add_message_as_another_user() {
    let (mut app, u1, u2) = setup();
    app.login("testuser", "PASSWORD").await;

    app.post_form("/messages/new", &format!("text=sneaky&user_id={}", u2)).await;

    assert!(app.state.db.get_user_messages(u2, 10).unwrap().is_empty());
    let mine = app.state.db.get_user_messages(u1, 10).unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].text, "sneaky");
}

#[tokio::test]
async fn message_length_is_validated() {
    let (mut app, u1, _) = setup();
    app.login("testuser", "PASSWORD").await;

    let resp = app.post_form("/messages/new", "text=+++").await;
    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.body.contains("Messages must be between 1 and 140 characters."));

    let long = "a".repeat(141);
    let resp = app.post_form("/messages/new", &format!("text={}", long)).await;
    assert!(resp.body.contains("Messages must be between 1 and 140 characters."));

    assert!(app.state.db.get_user_messages(u1, 10).unwrap().is_empty());
}

#[tokio::test]
async fn delete_own_message_only() {
    let (mut app, u1, u2) = setup();
    let mine = app.state.db.insert_message(u1, "mine").unwrap();
    let theirs = app.state.db.insert_message(u2, "theirs").unwrap();

    app.login("testuser", "PASSWORD").await;

    let resp = app.post_empty(&format!("/messages/{}/delete", theirs.id)).await;
    assert_eq!(resp.location.as_deref(), Some("/"));
    let resp = app.follow(resp).await;
    assert!(resp.body.contains("Access unauthorized."));
    assert!(app.state.db.get_message(theirs.id).unwrap().is_some());

    let resp = app.post_empty(&format!("/messages/{}/delete", mine.id)).await;
    assert_eq!(resp.location, Some(format!("/users/{}", u1)));
    assert!(app.state.db.get_message(mine.id).unwrap().is_none());

    let resp = app.post_empty(&format!("/messages/{}/delete", mine.id)).await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn show_message_page() {
    let (mut app, u1, _) = setup();
    let msg = app.state.db.insert_message(u1, "<script>alert(1)</script>").unwrap();

    let resp = app.get(&format!("/messages/{}", msg.id)).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.body.contains("@testuser"));
    assert!(resp.body.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
    assert!(!resp.body.contains("/delete"));

    app.login("testuser", "PASSWORD").await;
    let resp = app.get(&format!("/messages/{}", msg.id)).await;
    assert!(resp.body.contains(&format!("/messages/{}/delete", msg.id)));

    let resp = app.get("/messages/9999").await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn home_timeline_shows_followed_messages() {
    let (mut app, u1, u2) = setup();
    app.state.db.insert_message(u2, "from testuser2").unwrap();

    app.login("testuser", "PASSWORD").await;
    let resp = app.get("/").await;
    assert!(!resp.body.contains("from testuser2"));

    app.state.db.follow(u1, u2).unwrap();
    let resp = app.get("/").await;
    assert!(resp.body.contains("from testuser2"));
}

#[tokio::test]
async fn toggle_like_api() {
    let (mut app, u1, u2) = setup();
    let theirs = app.state.db.insert_message(u2, "like me").unwrap();
    let mine = app.state.db.insert_message(u1, "my own").unwrap();
    let uri = format!("/api/messages/{}/toggle_like", theirs.id);

    let resp = app.post_empty(&uri).await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);

    app.login("testuser", "PASSWORD").await;

    let message = |body: &str| serde_json::from_str::<LikeResponse>(body).unwrap().message;

    let resp = app.post_empty(&uri).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(message(&resp.body), "Liked");
    assert_eq!(app.state.db.get_liked_ids(u1).unwrap(), [theirs.id]);

    let resp = app.post_empty(&uri).await;
    assert_eq!(message(&resp.body), "Unliked");

    let resp = app.post_empty(&format!("/api/messages/{}/toggle_like", mine.id)).await;
    assert_eq!(message(&resp.body), "You cannot like your own message");

    let resp = app.post_empty("/api/messages/9999/toggle_like").await;
    assert_eq!(message(&resp.body), "There is no message");
}

#[tokio::test]
async fn likes_page_lists_liked_messages() {
    let (mut app, u1, u2) = setup();
    let theirs = app.state.db.insert_message(u2, "worth a like").unwrap();
    app.state.db.toggle_like(u1, theirs.id).unwrap();

    let resp = app.get(&format!("/users/{}/likes", u1)).await;
    assert_eq!(resp.location.as_deref(), Some("/"));

    app.login("testuser2", "PASSWORD2").await;
    let resp = app.get(&format!("/users/{}/likes", u1)).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.body.contains("worth a like"));
}
