use axum_extra::extract::cookie::{Cookie, CookieJar};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD as B64;

pub const FLASH_COOKIE: &str = "warbler_flash";

/// One-shot message shown on the next rendered page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flash {
    pub category: String,
    pub text: String,
}

impl Flash {
    pub fn success(text: impl Into<String>) -> Self {
        Self { category: "success".into(), text: text.into() }
    }

    pub fn danger(text: impl Into<String>) -> Self {
        Self { category: "danger".into(), text: text.into() }
    }

    fn encode(&self) -> String {
        B64.encode(format!("{}|{}", self.category, self.text))
    }

    fn decode(raw: &str) -> Option<Self> {
        let bytes = B64.decode(raw).ok()?;
        let decoded = String::from_utf8(bytes).ok()?;
        let (category, text) = decoded.split_once('|')?;
        Some(Self { category: category.into(), text: text.into() })
    }
}

/// Queue a flash for the next page.
pub fn push(jar: CookieJar, flash: &Flash) -> CookieJar {
    jar.add(
        Cookie::build((FLASH_COOKIE, flash.encode()))
            .path("/")
            .http_only(true),
    )
}

/// Read the pending flash, clearing it so it shows once. A cookie that
/// does not decode is cleared too.
pub fn take(jar: CookieJar) -> (CookieJar, Option<Flash>) {
    let Some(cookie) = jar.get(FLASH_COOKIE) else {
        return (jar, None);
    };
    let flash = Flash::decode(cookie.value());
    (jar.remove(Cookie::build(FLASH_COOKIE).path("/")), flash)
}
