use crate::error::{PocError, Result};
use dotenvy::dotenv;
use serde::Deserialize;
use std::env;
use std::path::PathBuf;

/// Runtime configuration, loaded once at startup.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Directory holding the per-year output tree (`<year>/<CVE-ID>.json`).
    pub output_dir: PathBuf,
    /// Directory holding the checked-out upstream sources.
    pub datasources_dir: PathBuf,
    /// Worker count for the harvester pool.
    pub workers: usize,
    /// Symmetric key for the git-date cache files. Absent key disables cache
    /// persistence, not in-memory caching.
    pub cache_key: Option<Vec<u8>>,
    /// Write logs to daily files in `log_dir` instead of stdout.
    pub log_to_file: bool,
    /// Directory for rolling log files.
    pub log_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let output_dir = PathBuf::from(env::var("OPENPOC_OUTPUT_DIR").unwrap_or_else(|_| ".".into()));
        let datasources_dir =
            PathBuf::from(env::var("OPENPOC_DATASOURCES_DIR").unwrap_or_else(|_| "datasources".into()));

        let workers = match env::var("OPENPOC_WORKERS") {
            Ok(raw) => raw
                .parse::<usize>()
                .map_err(|_| PocError::config(format!("OPENPOC_WORKERS is not a number: {raw}")))?,
            Err(_) => 8,
        };
        if workers == 0 {
            return Err(PocError::config("OPENPOC_WORKERS must be at least 1"));
        }

        // It takes hours to recompute the git-date cache, so it is worth
        // shipping encrypted alongside the repository.
        let cache_key = env::var("OPENPOC_CACHE_KEY")
            .ok()
            .filter(|k| !k.is_empty())
            .map(|k| k.into_bytes());

        let log_to_file = env::var("OPENPOC_LOG_TO_FILE")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        let log_dir = PathBuf::from(env::var("OPENPOC_LOG_DIR").unwrap_or_else(|_| "logs".into()));

        Ok(Self {
            output_dir,
            datasources_dir,
            workers,
            cache_key,
            log_to_file,
            log_dir,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_env() {
        // Only assert on values no test environment is expected to override.
        let config = Config {
            output_dir: PathBuf::from("."),
            datasources_dir: PathBuf::from("datasources"),
            workers: 8,
            cache_key: None,
            log_to_file: false,
            log_dir: PathBuf::from("logs"),
        };
        assert!(config.cache_key.is_none());
        assert!(config.workers >= 1);
    }
}
