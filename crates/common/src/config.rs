use anyhow::{Result, anyhow};
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub listen_addr: String,
    pub media_root: PathBuf,
    pub media_url: String,
    pub db_max_connections: u32,
    pub notes_enabled: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        // Load .env early so process env reads pick it up.
        let _ = dotenvy::dotenv();

        let database_url =
            env::var("DATABASE_URL").map_err(|_| anyhow!("DATABASE_URL is required"))?;
        let listen_addr = env::var("LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:8000".to_string());
        let media_root = env::var("MEDIA_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("data/media"));
        let media_url = normalize_media_url(
            &env::var("MEDIA_URL").unwrap_or_else(|_| "/media/".to_string()),
        )?;
        let db_max_connections = env_u64("DB_MAX_CONNECTIONS", 10) as u32;
        let notes_enabled = env_bool("NOTES_ENABLED", true);

        Ok(Self {
            database_url,
            listen_addr,
            media_root,
            media_url,
            db_max_connections,
            notes_enabled,
        })
    }
}

fn env_bool(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(value) => matches!(value.as_str(), "1" | "true" | "TRUE" | "yes" | "YES"),
        Err(_) => default,
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default)
}

/// MEDIA_URL 必须是以 `/` 开头和结尾的路径前缀
fn normalize_media_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        return Err(anyhow!("MEDIA_URL must not be the site root"));
    }
    if trimmed.contains("//") || trimmed.contains(' ') {
        return Err(anyhow!("MEDIA_URL invalid path {}", raw));
    }
    Ok(format!("/{}/", trimmed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_media_url() {
        assert_eq!(normalize_media_url("/media/").unwrap(), "/media/");
        assert_eq!(normalize_media_url("media").unwrap(), "/media/");
        assert_eq!(normalize_media_url(" /uploads/files ").unwrap(), "/uploads/files/");
        assert!(normalize_media_url("/").is_err());
        assert!(normalize_media_url("a//b").is_err());
    }
}
