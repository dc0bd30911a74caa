use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::warn;

/// Runtime settings, read from the environment (and `.env` if present).
#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: PathBuf,
    pub host: String,
    pub port: u16,
    pub session_secret: String,
    pub session_days: i64,
    pub static_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let port = get("WARBLER_PORT")
            .unwrap_or_else(|| "5000".into())
            .parse()
            .context("WARBLER_PORT must be a port number")?;

        let session_days = get("WARBLER_SESSION_DAYS")
            .unwrap_or_else(|| "7".into())
            .parse()
            .context("WARBLER_SESSION_DAYS must be a whole number of days")?;

        let session_secret = match get("WARBLER_SECRET_KEY").filter(|s| !s.is_empty()) {
            Some(secret) => secret,
            None => {
                warn!("WARBLER_SECRET_KEY not set; generated a random key, sessions will not survive a restart");
                warbler_crypto::keys::generate_session_secret()
            }
        };

        Ok(Self {
            db_path: get("WARBLER_DB_PATH").unwrap_or_else(|| "warbler.db".into()).into(),
            host: get("WARBLER_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            session_secret,
            session_days,
            static_dir: get("WARBLER_STATIC_DIR").unwrap_or_else(|| "static".into()).into(),
        })
    }

    pub fn addr(&self) -> Result<SocketAddr> {
        let addr = format!("{}:{}", self.host, self.port).parse()?;
        Ok(addr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.db_path, PathBuf::from("warbler.db"));
        assert_eq!(config.port, 5000);
        assert_eq!(config.session_days, 7);
        assert!(!config.session_secret.is_empty());
        assert_eq!(config.addr().unwrap().to_string(), "0.0.0.0:5000");
    }

    #[test]
    fn overrides() {
        let config = Config::from_lookup(lookup(&[
            ("WARBLER_PORT", "8080"),
            ("WARBLER_HOST", "127.0.0.1"),
            ("WARBLER_SECRET_KEY", "s3cret"),
        ]))
        .unwrap();
        assert_eq!(config.session_secret, "s3cret");
        assert_eq!(config.addr().unwrap().to_string(), "127.0.0.1:8080");
    }

    #[test]
    fn bad_port_is_an_error() {
        assert!(Config::from_lookup(lookup(&[("WARBLER_PORT", "http")])).is_err());
    }
}
