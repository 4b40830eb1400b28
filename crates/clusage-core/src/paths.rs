//! Locations under the clusage data directory
//!
//! Everything lives below `~/.claudeusage` unless `CLUSAGE_HOME` points
//! somewhere else:
//!
//! ```text
//! ~/.claudeusage/
//! ├── config/settings.json
//! ├── data/daily/YYYY-MM-DD.json
//! └── logs/
//! ```

use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{ClusageError, Result};

/// Name of the directory created under the home directory
pub const DATA_DIR_NAME: &str = ".claudeusage";

/// Environment variable overriding the base directory
pub const HOME_ENV_VAR: &str = "CLUSAGE_HOME";

/// Resolve the base data directory
pub fn base_data_dir() -> Result<PathBuf> {
    if let Ok(custom) = std::env::var(HOME_ENV_VAR)
        && !custom.is_empty()
    {
        debug!("Using data directory from {}: {}", HOME_ENV_VAR, custom);
        return Ok(PathBuf::from(custom));
    }

    dirs::home_dir()
        .map(|home| home.join(DATA_DIR_NAME))
        .ok_or_else(|| ClusageError::Config("could not determine home directory".to_string()))
}

pub fn daily_dir(base: &Path) -> PathBuf {
    base.join("data").join("daily")
}

pub fn daily_file_path(base: &Path, date: NaiveDate) -> PathBuf {
    daily_dir(base).join(format!("{}.json", date.format("%Y-%m-%d")))
}

pub fn settings_path(base: &Path) -> PathBuf {
    base.join("config").join("settings.json")
}

pub fn logs_dir(base: &Path) -> PathBuf {
    base.join("logs")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{ENV_MUTEX, EnvVarGuard};

    #[test]
    fn test_daily_file_path_layout() {
        let base = Path::new("/tmp/usage");
        let date = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        assert_eq!(
            daily_file_path(base, date),
            PathBuf::from("/tmp/usage/data/daily/2026-01-05.json")
        );
        assert_eq!(
            settings_path(base),
            PathBuf::from("/tmp/usage/config/settings.json")
        );
    }

    #[tokio::test]
    async fn test_base_dir_env_override() {
        let _lock = ENV_MUTEX.lock().await;
        let mut guard = EnvVarGuard::new();
        guard.set(HOME_ENV_VAR, "/srv/usage");
        assert_eq!(base_data_dir().unwrap(), PathBuf::from("/srv/usage"));
    }
}
