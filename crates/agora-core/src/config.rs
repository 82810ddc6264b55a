use std::path::PathBuf;
use std::time::Duration as StdDuration;

use chrono::Duration;

use crate::error::{BoardError, Result};
use crate::expiry::ShareTtl;

/// Runtime configuration, read from `AGORA_*` environment variables.
#[derive(Debug, Clone)]
pub struct AgoraConfig {
    pub share_origin: String,
    pub share_path: String,
    pub share_ttl: ShareTtl,
    pub cache_ttl: Duration,
    pub namespace: String,
    pub db_path: PathBuf,
    pub store_dir: PathBuf,
    pub sync_interval: StdDuration,
}

impl Default for AgoraConfig {
    fn default() -> Self {
        Self {
            share_origin: "https://localhost".into(),
            share_path: "/".into(),
            share_ttl: ShareTtl::default(),
            cache_ttl: Duration::days(7),
            namespace: "collab_board".into(),
            db_path: "agora.db".into(),
            store_dir: "./agora-store".into(),
            sync_interval: StdDuration::from_secs(5),
        }
    }
}

impl AgoraConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any variable source; unset variables keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(origin) = lookup("AGORA_SHARE_ORIGIN") {
            let origin = origin.trim_end_matches('/').to_string();
            if !(origin.starts_with("https://") || origin.starts_with("http://")) {
                return Err(BoardError::validation(format!(
                    "AGORA_SHARE_ORIGIN must be an http(s) origin, got {:?}",
                    origin
                )));
            }
            config.share_origin = origin;
        }
        if let Some(path) = lookup("AGORA_SHARE_PATH") {
            config.share_path = if path.starts_with('/') { path } else { format!("/{}", path) };
        }
        if let Some(days) = lookup("AGORA_SHARE_TTL_DAYS") {
            config.share_ttl = ShareTtl::from_days(parse_number("AGORA_SHARE_TTL_DAYS", &days)?)?;
        }
        if let Some(days) = lookup("AGORA_CACHE_TTL_DAYS") {
            let days = parse_number("AGORA_CACHE_TTL_DAYS", &days)?;
            if days == 0 {
                return Err(BoardError::validation("AGORA_CACHE_TTL_DAYS must be at least 1"));
            }
            config.cache_ttl = i64::try_from(days)
                .ok()
                .and_then(Duration::try_days)
                .ok_or_else(|| {
                    BoardError::validation(format!(
                        "AGORA_CACHE_TTL_DAYS is out of range: {}",
                        days
                    ))
                })?;
        }
        if let Some(namespace) = lookup("AGORA_NAMESPACE") {
            let valid = |c: char| c.is_ascii_alphanumeric() || c == '_';
            if namespace.is_empty() || !namespace.chars().all(valid) {
                return Err(BoardError::validation(
                    "AGORA_NAMESPACE must be non-empty [A-Za-z0-9_]",
                ));
            }
            config.namespace = namespace;
        }
        if let Some(path) = lookup("AGORA_DB_PATH") {
            config.db_path = path.into();
        }
        if let Some(dir) = lookup("AGORA_STORE_DIR") {
            config.store_dir = dir.into();
        }
        if let Some(secs) = lookup("AGORA_SYNC_INTERVAL_SECS") {
            let secs = parse_number("AGORA_SYNC_INTERVAL_SECS", &secs)?;
            if secs == 0 {
                return Err(BoardError::validation("AGORA_SYNC_INTERVAL_SECS must be at least 1"));
            }
            config.sync_interval = StdDuration::from_secs(secs);
        }

        Ok(config)
    }

    /// `origin + path`, the part of a share URL before `?board=`.
    pub fn share_base(&self) -> String {
        format!("{}{}", self.share_origin, self.share_path)
    }
}

fn parse_number(name: &str, value: &str) -> Result<u64> {
    value
        .trim()
        .parse()
        .map_err(|_| {
            BoardError::validation(format!("{} must be a whole number, got {:?}", name, value))
        })
}
