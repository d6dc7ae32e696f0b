use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use serde::Deserialize;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Settings {
    pub server_bind: String,
    pub database_url: String,
    /// Externally reachable origin used for post urls and placeholder images.
    pub public_url: String,
    pub asset_base_url: String,
    pub asset_bucket: String,
    pub generation_url: Option<String>,
    pub share_base_url: String,
    pub profile_base_url: String,
    pub derivative_owner: String,
    pub max_body_bytes: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_bind: "127.0.0.1:3000".into(),
            database_url: "sqlite://./data/artcast.db".into(),
            public_url: "http://localhost:3000".into(),
            asset_base_url: "http://localhost:54321/storage/v1/object/public".into(),
            asset_bucket: "artcast_images".into(),
            generation_url: None,
            share_base_url: "https://artcast.ai".into(),
            profile_base_url: "https://warpcast.com".into(),
            derivative_owner: "artcast".into(),
            max_body_bytes: 64 * 1024,
        }
    }
}

/// Parsed form of the url-valued settings.
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub public_url: Url,
    pub asset_base_url: Url,
    pub generation_url: Option<Url>,
    pub share_base_url: Url,
    pub profile_base_url: Url,
}

impl Settings {
    pub fn endpoints(&self) -> anyhow::Result<Endpoints> {
        Ok(Endpoints {
            public_url: parse_url("public_url", &self.public_url)?,
            asset_base_url: parse_url("asset_base_url", &self.asset_base_url)?,
            generation_url: self
                .generation_url
                .as_deref()
                .map(str::trim)
                .filter(|raw| !raw.is_empty())
                .map(|raw| parse_url("generation_url", raw))
                .transpose()?,
            share_base_url: parse_url("share_base_url", &self.share_base_url)?,
            profile_base_url: parse_url("profile_base_url", &self.profile_base_url)?,
        })
    }
}

fn parse_url(name: &str, raw: &str) -> anyhow::Result<Url> {
    Url::parse(raw.trim()).with_context(|| format!("invalid {name} '{raw}'"))
}

pub fn load_settings() -> Settings {
    let file = fs::read_to_string("server.toml").ok();
    load_settings_from(file.as_deref(), |key| std::env::var(key).ok())
}

/// Defaults, then `server.toml`, then environment variables.
pub fn load_settings_from<F>(file: Option<&str>, env: F) -> Settings
where
    F: Fn(&str) -> Option<String>,
{
    let mut settings = Settings::default();

    if let Some(raw) = file {
        if let Ok(file_cfg) = toml::from_str::<HashMap<String, toml::Value>>(raw) {
            let get = |key: &str| file_value(&file_cfg, key);
            if let Some(v) = get("bind_addr") {
                settings.server_bind = v;
            }
            if let Some(v) = get("database_url") {
                settings.database_url = v;
            }
            if let Some(v) = get("public_url") {
                settings.public_url = v;
            }
            if let Some(v) = get("asset_base_url") {
                settings.asset_base_url = v;
            }
            if let Some(v) = get("asset_bucket") {
                settings.asset_bucket = v;
            }
            if let Some(v) = get("generation_url") {
                settings.generation_url = Some(v);
            }
            if let Some(v) = get("share_base_url") {
                settings.share_base_url = v;
            }
            if let Some(v) = get("profile_base_url") {
                settings.profile_base_url = v;
            }
            if let Some(v) = get("derivative_owner") {
                settings.derivative_owner = v;
            }
            if let Some(v) = get("max_body_bytes").and_then(|v| v.parse().ok()) {
                settings.max_body_bytes = v;
            }
        }
    }

    if let Some(v) = env("SERVER_BIND") {
        settings.server_bind = v;
    }
    if let Some(v) = env("APP__BIND_ADDR") {
        settings.server_bind = v;
    }

    if let Some(v) = env("DATABASE_URL") {
        settings.database_url = v;
    }
    if let Some(v) = env("APP__DATABASE_URL") {
        settings.database_url = v;
    }

    if let Some(v) = env("APP__PUBLIC_URL") {
        settings.public_url = v;
    }
    if let Some(v) = env("APP__ASSET_BASE_URL") {
        settings.asset_base_url = v;
    }
    if let Some(v) = env("APP__ASSET_BUCKET") {
        settings.asset_bucket = v;
    }
    if let Some(v) = env("APP__GENERATION_URL") {
        settings.generation_url = Some(v);
    }
    if let Some(v) = env("APP__SHARE_BASE_URL") {
        settings.share_base_url = v;
    }
    if let Some(v) = env("APP__PROFILE_BASE_URL") {
        settings.profile_base_url = v;
    }
    if let Some(v) = env("APP__DERIVATIVE_OWNER") {
        settings.derivative_owner = v;
    }
    if let Some(v) = env("APP__MAX_BODY_BYTES") {
        if let Ok(parsed) = v.parse::<usize>() {
            settings.max_body_bytes = parsed;
        }
    }

    settings
}

fn file_value(cfg: &HashMap<String, toml::Value>, key: &str) -> Option<String> {
    match cfg.get(key)? {
        toml::Value::String(v) => Some(v.clone()),
        toml::Value::Integer(v) => Some(v.to_string()),
        _ => None,
    }
}

pub fn prepare_database_url(raw_database_url: &str) -> anyhow::Result<String> {
    let database_url = normalize_database_url(raw_database_url);
    ensure_parent_dir_exists(&database_url)?;
    Ok(database_url)
}

pub(crate) fn normalize_database_url(raw_database_url: &str) -> String {
    let raw_database_url = raw_database_url.trim();

    if raw_database_url.is_empty() {
        return Settings::default().database_url;
    }

    if raw_database_url.starts_with("sqlite::memory:")
        || raw_database_url.starts_with("sqlite://")
        || raw_database_url.contains("://")
    {
        return raw_database_url.to_string();
    }

    if let Some(path) = raw_database_url.strip_prefix("sqlite:") {
        let path = path.replace('\\', "/");
        return format!("sqlite://{path}");
    }

    format!("sqlite://{}", raw_database_url.replace('\\', "/"))
}

fn ensure_parent_dir_exists(database_url: &str) -> anyhow::Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };
    if parent.as_os_str().is_empty() {
        return Ok(());
    }

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url.starts_with("sqlite::memory:") || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
