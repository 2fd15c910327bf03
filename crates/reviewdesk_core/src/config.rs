//! Runtime configuration shared by the bridge API and the CLI.
//!
//! Values come from the environment; every key has a default so a bare
//! process can still start.

use crate::auth::DEFAULT_SESSION_TTL;
use crate::logging::default_log_level;
use std::path::PathBuf;
use std::time::Duration;

pub const ENV_DB_PATH: &str = "REVIEWDESK_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "REVIEWDESK_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "REVIEWDESK_LOG_DIR";
pub const ENV_SESSION_TTL_SECS: &str = "REVIEWDESK_SESSION_TTL_SECS";

const DEFAULT_DB_FILE_NAME: &str = "reviewdesk.sqlite3";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeskConfig {
    pub db_path: PathBuf,
    pub log_level: String,
    /// File logging stays off when unset.
    pub log_dir: Option<PathBuf>,
    pub session_ttl: Duration,
}

impl Default for DeskConfig {
    fn default() -> Self {
        Self {
            db_path: std::env::temp_dir().join(DEFAULT_DB_FILE_NAME),
            log_level: default_log_level().to_string(),
            log_dir: None,
            session_ttl: DEFAULT_SESSION_TTL,
        }
    }
}

impl DeskConfig {
    /// Reads configuration from process environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup.
    ///
    /// Blank values fall back to defaults; an unparsable TTL is ignored.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let value = |key: &str| {
            lookup(key)
                .map(|raw| raw.trim().to_string())
                .filter(|raw| !raw.is_empty())
        };
        let defaults = Self::default();

        Self {
            db_path: value(ENV_DB_PATH)
                .map(PathBuf::from)
                .unwrap_or(defaults.db_path),
            log_level: value(ENV_LOG_LEVEL).unwrap_or(defaults.log_level),
            log_dir: value(ENV_LOG_DIR).map(PathBuf::from),
            session_ttl: value(ENV_SESSION_TTL_SECS)
                .and_then(|raw| raw.parse::<u64>().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.session_ttl),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{DeskConfig, ENV_DB_PATH, ENV_LOG_DIR, ENV_SESSION_TTL_SECS};
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::time::Duration;

    #[test]
    fn empty_environment_uses_defaults() {
        let config = DeskConfig::from_lookup(|_| None);
        assert_eq!(config, DeskConfig::default());
        assert!(config.log_dir.is_none());
    }

    #[test]
    fn environment_overrides_defaults() {
        let env = HashMap::from([
            (ENV_DB_PATH, "/var/lib/reviewdesk/desk.db"),
            (ENV_LOG_DIR, " /var/log/reviewdesk "),
            (ENV_SESSION_TTL_SECS, "3600"),
        ]);
        let config = DeskConfig::from_lookup(|key| env.get(key).map(|v| v.to_string()));
        assert_eq!(config.db_path, PathBuf::from("/var/lib/reviewdesk/desk.db"));
        assert_eq!(config.log_dir, Some(PathBuf::from("/var/log/reviewdesk")));
        assert_eq!(config.session_ttl, Duration::from_secs(3600));
    }

    #[test]
    fn invalid_ttl_falls_back_to_default() {
        let config = DeskConfig::from_lookup(|key| {
            (key == ENV_SESSION_TTL_SECS).then(|| "soon".to_string())
        });
        assert_eq!(config.session_ttl, DeskConfig::default().session_ttl);
    }
}
