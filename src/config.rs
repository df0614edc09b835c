// src/config.rs

use std::{
    env,
    path::{Path, PathBuf},
    time::Duration,
};

/// Environment variable that overrides the default data directory.
pub const HOME_ENV: &str = "NEMDATA_HOME";

const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_USER_AGENT: &str = concat!("nemdata/", env!("CARGO_PKG_VERSION"));

/// Runtime settings shared by the downloader and the CLI.
#[derive(Debug, Clone)]
pub struct Config {
    /// Root of the on-disk cache: `<base>/<table>/<YYYY-MM>/...`
    pub base_directory: PathBuf,
    /// Upper bound for the advisory HEAD probe of sibling files.
    pub probe_timeout: Duration,
    pub user_agent: String,
}

impl Config {
    /// Resolve the base directory: explicit override, then `NEMDATA_HOME`,
    /// then `$HOME/nem-data/data`.
    pub fn resolve(base_override: Option<&Path>) -> Self {
        let base_directory = match base_override {
            Some(p) => p.to_path_buf(),
            None => env::var_os(HOME_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(default_base_directory),
        };
        Self::with_base_directory(base_directory)
    }

    pub fn with_base_directory(base_directory: impl Into<PathBuf>) -> Self {
        Self {
            base_directory: base_directory.into(),
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

fn default_base_directory() -> PathBuf {
    let home = env::var_os("HOME")
        .or_else(|| env::var_os("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    home.join("nem-data").join("data")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_override_wins() {
        let cfg = Config::resolve(Some(Path::new("/tmp/somewhere")));
        assert_eq!(cfg.base_directory, PathBuf::from("/tmp/somewhere"));
        assert_eq!(cfg.probe_timeout, Duration::from_secs(10));
        assert!(cfg.user_agent.starts_with("nemdata/"));
    }

    #[test]
    fn default_lives_under_nem_data() {
        assert!(default_base_directory().ends_with("nem-data/data"));
    }
}
