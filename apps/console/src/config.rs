use std::{collections::HashMap, fs};

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub server_url: String,
    pub database_url: String,
    pub archive_scope: String,
    pub author_name: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:8443".into(),
            database_url: "sqlite://./data/board.db".into(),
            archive_scope: "default".into(),
            author_name: "supplier".into(),
        }
    }
}

/// Defaults, overridden by `portal.toml`, overridden by environment
/// variables (both bare and `APP__` prefixed forms are accepted).
pub fn load_settings() -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string("portal.toml") {
        if let Ok(file_cfg) = toml::from_str::<HashMap<String, String>>(&raw) {
            if let Some(v) = file_cfg.get("server_url") {
                settings.server_url = v.clone();
            }
            if let Some(v) = file_cfg.get("database_url") {
                settings.database_url = v.clone();
            }
            if let Some(v) = file_cfg.get("archive_scope") {
                settings.archive_scope = v.clone();
            }
            if let Some(v) = file_cfg.get("author_name") {
                settings.author_name = v.clone();
            }
        }
    }

    if let Ok(v) = std::env::var("SERVER_URL") {
        settings.server_url = v;
    }
    if let Ok(v) = std::env::var("APP__SERVER_URL") {
        settings.server_url = v;
    }

    if let Ok(v) = std::env::var("DATABASE_URL") {
        settings.database_url = v;
    }
    if let Ok(v) = std::env::var("APP__DATABASE_URL") {
        settings.database_url = v;
    }

    if let Ok(v) = std::env::var("ARCHIVE_SCOPE") {
        settings.archive_scope = v;
    }
    if let Ok(v) = std::env::var("APP__ARCHIVE_SCOPE") {
        settings.archive_scope = v;
    }

    if let Ok(v) = std::env::var("AUTHOR_NAME") {
        settings.author_name = v;
    }
    if let Ok(v) = std::env::var("APP__AUTHOR_NAME") {
        settings.author_name = v;
    }

    settings
}

/// Accepts a bare file path and turns it into a sqlite URL; URLs pass
/// through untouched.
pub fn normalize_database_url(raw_database_url: &str) -> String {
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
