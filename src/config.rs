use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://api.mozambiquehe.re/bridge";
const DEFAULT_PLATFORM: &str = "PC";
const DEFAULT_TIMEOUT_SECS: u64 = 10;
const CACHE_DIR: &str = "legend_cache";
const DB_FILE: &str = "legend_stats.sqlite";

#[derive(Debug, Clone)]
pub struct TrackerConfig {
    pub api_key: Option<String>,
    pub api_url: String,
    pub platform: String,
    pub timeout: Duration,
    pub fixture_path: Option<PathBuf>,
    pub db_path: Option<PathBuf>,
}

impl TrackerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let api_key = get("APEX_API_KEY").or_else(|| get("API_KEY"));
        let api_url = get("APEX_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let platform = get("APEX_PLATFORM")
            .unwrap_or_else(|| DEFAULT_PLATFORM.to_string())
            .to_ascii_uppercase();
        let timeout_secs = get("APEX_API_TIMEOUT_SECS")
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS)
            .clamp(1, 120);
        let fixture_path = get("APEX_FIXTURE_PATH").map(PathBuf::from);
        let db_path = get("LEGEND_DB_PATH")
            .map(PathBuf::from)
            .or_else(|| get("DB_URL").and_then(|url| sqlite_path_from_url(&url)));

        let home = get("HOME");
        let db_path = db_path.or_else(|| default_db_path(get("XDG_CACHE_HOME"), home));

        Self {
            api_key,
            api_url,
            platform,
            timeout: Duration::from_secs(timeout_secs),
            fixture_path,
            db_path,
        }
    }
}

/// Accepts SQLAlchemy-style `sqlite:///relative.db` / `sqlite:////abs/path.db` or a bare
/// path. Other schemes are ignored.
fn sqlite_path_from_url(url: &str) -> Option<PathBuf> {
    let stripped = url
        .strip_prefix("sqlite:///")
        .or_else(|| url.strip_prefix("sqlite://"));
    if let Some(rest) = stripped {
        let rest = rest.trim();
        if rest.is_empty() || rest == "/" {
            return None;
        }
        return Some(PathBuf::from(rest));
    }
    if url.contains("://") {
        return None;
    }
    Some(PathBuf::from(url))
}

fn default_db_path(xdg_cache: Option<String>, home: Option<String>) -> Option<PathBuf> {
    let base = match xdg_cache {
        Some(base) => PathBuf::from(base),
        None => PathBuf::from(home?).join(".cache"),
    };
    Some(base.join(CACHE_DIR).join(DB_FILE))
}
