//! Minimal server-side HTML. Every interpolated value goes through
//! `escape`; markup is otherwise kept to what the views need.

use warbler_db::MessageRow;
use warbler_types::api::{Claims, SignupForm};
use warbler_types::models::{DEFAULT_IMAGE_URL, User, UserStats};

use crate::flash::Flash;

/// What every page needs besides its own content: who is looking and
/// the pending flash message.
pub struct Frame<'a> {
    pub current: Option<&'a Claims>,
    pub flash: Option<Flash>,
}

impl<'a> Frame<'a> {
    pub fn new(current: Option<&'a Claims>, flash: Option<Flash>) -> Self {
        Self { current, flash }
    }
}

pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

fn layout(frame: &Frame<'_>, title: &str, body: &str) -> String {
    let nav = match frame.current {
        Some(claims) => format!(
            r#"<li><a href="/users/{id}">@{name}</a></li>
      <li><a href="/messages/new">New Message</a></li>
      <li><a href="/logout">Log out</a></li>"#,
            id = claims.sub,
            name = escape(&claims.username),
        ),
        None => r#"<li><a href="/signup">Sign up</a></li>
      <li><a href="/login">Log in</a></li>"#
            .to_string(),
    };

    let flash = frame
        .flash
        .as_ref()
        .map(|f| format!(r#"<div class="alert alert-{}">{}</div>"#, escape(&f.category), escape(&f.text)))
        .unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>{title} | Warbler</title>
  <link rel="stylesheet" href="/static/stylesheets/style.css">
</head>
<body>
  <nav class="navbar">
    <a href="/" class="navbar-brand">Warbler</a>
    <form class="navbar-form" action="/users">
      <input name="q" placeholder="Search Warbler" id="search">
    </form>
    <ul class="nav">
      {nav}
    </ul>
  </nav>
  <div class="container">
    {flash}
    {body}
  </div>
  <script src="/static/likes.js"></script>
</body>
</html>
"#,
        title = escape(title),
    )
}

pub fn not_found() -> String {
    layout(&Frame::new(None, None), "Not Found", "<h1>404</h1><p>Page not found.</p>")
}

pub fn server_error() -> String {
    layout(
        &Frame::new(None, None),
        "Error",
        "<h1>500</h1><p>Something went wrong.</p>",
    )
}

// -- Auth --

pub fn login(frame: &Frame<'_>) -> String {
    let body = r#"<h2 class="join-message">Welcome back.</h2>
    <form method="POST" id="login_form" action="/login">
      <input name="username" placeholder="Username" required>
      <input name="password" type="password" placeholder="Password" required>
      <button class="btn btn-primary">Log in</button>
    </form>"#;
    layout(frame, "Log in", body)
}

pub fn signup(frame: &Frame<'_>, form: &SignupForm) -> String {
    let value = |v: &Option<String>| escape(v.as_deref().unwrap_or_default());
    let body = format!(
        r#"<h2 class="join-message">Join Warbler today.</h2>
    <form method="POST" id="user_form" action="/signup">
      <input name="username" placeholder="Username" value="{username}">
      <input name="email" type="email" placeholder="E-mail" value="{email}">
      <input name="password" type="password" placeholder="Password">
      <input name="image_url" placeholder="(Optional) Image URL" value="{image_url}">
      <button class="btn btn-primary">Sign me up!</button>
    </form>"#,
        username = value(&form.username),
        email = value(&form.email),
        image_url = value(&form.image_url),
    );
    layout(frame, "Sign up", &body)
}

// -- Home --

pub fn home_anon(frame: &Frame<'_>) -> String {
    let body = r#"<div class="home-hero">
      <h1>What's Happening?</h1>
      <h4>New to Warbler?</h4>
      <a href="/signup" class="btn btn-primary">Sign up now</a>
    </div>"#;
    layout(frame, "Home", body)
}

pub fn home(frame: &Frame<'_>, user: &User, stats: &UserStats, messages: &[MessageRow], liked: &[i64]) -> String {
    let body = format!(
        r#"<aside class="col-md-4" id="home-aside">
      <div class="card user-card">
        <img src="{image}" alt="Image for {name}" class="card-image">
        <a href="/users/{id}"><p>@{name}</p></a>
        <ul class="user-stats">
          <li><a href="/users/{id}">Messages {messages}</a></li>
          <li><a href="/users/{id}/following">Following {following}</a></li>
          <li><a href="/users/{id}/followers">Followers {followers}</a></li>
        </ul>
      </div>
    </aside>
    <div class="col-lg-6">
      {list}
    </div>"#,
        image = escape(user.image_url_or_default()),
        name = escape(&user.username),
        id = user.id,
        messages = stats.messages,
        following = stats.following,
        followers = stats.followers,
        list = message_list(frame, messages, liked),
    );
    layout(frame, "Home", &body)
}

// -- Users --

pub fn users_index(frame: &Frame<'_>, users: &[User], query: Option<&str>) -> String {
    let cards = if users.is_empty() {
        r#"<h3>Sorry, no users found</h3>"#.to_string()
    } else {
        users.iter().map(user_card).collect::<String>()
    };
    let heading = match query {
        Some(q) if !q.trim().is_empty() => format!("<h2>Users matching &quot;{}&quot;</h2>", escape(q)),
        _ => "<h2>All users</h2>".to_string(),
    };
    layout(frame, "Users", &format!(r#"{heading}<div class="row" id="users">{cards}</div>"#))
}

/// `is_following` is `None` when there is no follow button to draw
/// (anonymous visitor or own profile).
pub fn user_show(
    frame: &Frame<'_>,
    user: &User,
    stats: &UserStats,
    is_following: Option<bool>,
    messages: &[MessageRow],
    liked: &[i64],
) -> String {
    let section = message_list(frame, messages, liked);
    let body = profile(user, stats, is_following, &section);
    layout(frame, &format!("@{}", user.username), &body)
}

/// Following / followers page. `section_id` is "following" or "followers".
pub fn user_connections(
    frame: &Frame<'_>,
    user: &User,
    stats: &UserStats,
    section_id: &str,
    users: &[User],
) -> String {
    let cards = users.iter().map(user_card).collect::<String>();
    let section = format!(r#"<div class="row" id="{section_id}">{cards}</div>"#);
    let body = profile(user, stats, None, &section);
    layout(frame, &format!("@{} {}", user.username, section_id), &body)
}

pub fn user_likes(frame: &Frame<'_>, user: &User, stats: &UserStats, messages: &[MessageRow], liked: &[i64]) -> String {
    let section = format!(r#"<div id="likes">{}</div>"#, message_list(frame, messages, liked));
    let body = profile(user, stats, None, &section);
    layout(frame, &format!("@{} likes", user.username), &body)
}

fn profile(user: &User, stats: &UserStats, is_following: Option<bool>, section: &str) -> String {
    let button = match is_following {
        Some(true) => format!(
            r#"<form method="POST" action="/users/stop-following/{}"><button class="btn btn-primary">Unfollow</button></form>"#,
            user.id
        ),
        Some(false) => format!(
            r#"<form method="POST" action="/users/follow/{}"><button class="btn btn-outline-primary">Follow</button></form>"#,
            user.id
        ),
        None => String::new(),
    };

    format!(
        r#"<div class="profile-header">
      <img src="{image}" alt="Image for {name}" id="profile-avatar">
      <h4 id="sidebar-username">@{name}</h4>
      <ul class="user-stats">
        <li><a href="/users/{id}">Messages <span>{messages}</span></a></li>
        <li><a href="/users/{id}/following">Following <span>{following}</span></a></li>
        <li><a href="/users/{id}/followers">Followers <span>{followers}</span></a></li>
        <li><a href="/users/{id}/likes">Likes <span>{likes}</span></a></li>
      </ul>
      {button}
    </div>
    <div class="col-sm-9">
      {section}
    </div>"#,
        image = escape(user.image_url_or_default()),
        name = escape(&user.username),
        id = user.id,
        messages = stats.messages,
        following = stats.following,
        followers = stats.followers,
        likes = stats.likes,
    )
}

fn user_card(user: &User) -> String {
    format!(
        r#"<div class="card user-card">
        <a href="/users/{id}"><img src="{image}" alt="Image for {name}" class="card-image"></a>
        <a href="/users/{id}"><p>@{name}</p></a>
      </div>"#,
        id = user.id,
        image = escape(user.image_url_or_default()),
        name = escape(&user.username),
    )
}

// -- Messages --

fn message_list(frame: &Frame<'_>, messages: &[MessageRow], liked: &[i64]) -> String {
    let items = messages
        .iter()
        .map(|m| message_item(frame, m, liked.contains(&m.id)))
        .collect::<String>();
    format!(r#"<ul class="list-group" id="messages">{items}</ul>"#)
}

fn message_item(frame: &Frame<'_>, message: &MessageRow, liked: bool) -> String {
    // Own messages get no like toggle.
    let like = match frame.current {
        Some(claims) if claims.sub != message.user_id => format!(
            r#"<i class="{} fa-heart" data-msg-id="{}"></i>"#,
            if liked { "fas" } else { "far" },
            message.id
        ),
        _ => String::new(),
    };

    format!(
        r#"<li class="list-group-item">
        <a href="/messages/{id}" class="message-link"></a>
        <a href="/users/{uid}"><img src="{image}" alt="" class="timeline-image"></a>
        <div class="message-area">
          <a href="/users/{uid}">@{name}</a>
          <span class="text-muted">{date}</span>
          <p>{text}</p>
          {like}
        </div>
      </li>"#,
        id = message.id,
        uid = message.user_id,
        image = escape(message.author_image_url.as_deref().unwrap_or(DEFAULT_IMAGE_URL)),
        name = escape(&message.author_username),
        date = escape(&message.created_at),
        text = escape(&message.text),
    )
}

pub fn new_message(frame: &Frame<'_>, text: &str) -> String {
    let body = format!(
        r#"<form method="POST" id="message_form" action="/messages/new">
      <textarea name="text" placeholder="What's happening?" maxlength="140">{}</textarea>
      <button class="btn btn-success">Add my message!</button>
    </form>"#,
        escape(text)
    );
    layout(frame, "New Message", &body)
}

pub fn message_show(frame: &Frame<'_>, message: &MessageRow) -> String {
    let delete = match frame.current {
        Some(claims) if claims.sub == message.user_id => format!(
            r#"<form method="POST" action="/messages/{}/delete"><button class="btn btn-outline-danger">Delete</button></form>"#,
            message.id
        ),
        _ => String::new(),
    };

    let body = format!(
        r#"<div class="message-detail" id="message">
      <a href="/users/{uid}"><img src="{image}" alt="" class="timeline-image"></a>
      <a href="/users/{uid}">@{name}</a>
      <span class="text-muted">{date}</span>
      <p class="single-message">{text}</p>
      {delete}
    </div>"#,
        uid = message.user_id,
        image = escape(message.author_image_url.as_deref().unwrap_or(DEFAULT_IMAGE_URL)),
        name = escape(&message.author_username),
        date = escape(&message.created_at),
        text = escape(&message.text),
    );
    layout(frame, "Message", &body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_covers_markup_characters() {
        assert_eq!(
            escape(r#"<b onclick="x">'&'</b>"#),
            "&lt;b onclick=&quot;x&quot;&gt;&#x27;&amp;&#x27;&lt;/b&gt;"
        );
    }

    #[test]
    fn layout_shows_handle_and_flash() {
        let claims = Claims { sub: 3, username: "testuser".into(), exp: 0 };
        let frame = Frame::new(Some(&claims), Some(Flash::success("Hello, testuser!")));
        let html = home_anon(&frame);

        assert!(html.contains("@testuser"));
        assert!(html.contains(r#"<div class="alert alert-success">Hello, testuser!</div>"#));
    }

    #[test]
    fn login_page_has_form_marker() {
        assert!(login(&Frame::new(None, None)).contains(r#"id="login_form""#));
    }
}
