use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::logstream::DEFAULT_LOG_CAPACITY;
use crate::timeseries::DEFAULT_WINDOW;

pub const CONFIG_ENV: &str = "DOCKWATCH_CONFIG";
const CONFIG_NAMES: [&str; 4] = [
    "dockwatch.yml",
    "dockwatch.yaml",
    ".dockwatch.yml",
    ".dockwatch.yaml",
];

/// How to reach the container runtime
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// CLI binary speaking the docker command syntax (`docker`, `podman`, ...)
    pub binary: String,
    /// List stopped containers too (`ps -a`)
    pub show_all: bool,
    /// Delete with `rm -f` instead of `rm`
    pub force_delete: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            binary: "docker".into(),
            show_all: true,
            force_delete: false,
        }
    }
}

/// Root configuration file structure
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Refresh period in milliseconds
    pub refresh_interval_ms: u64,
    /// Points kept per entity and metric
    pub history_window: usize,
    /// Lines kept in the log panel
    pub log_buffer_lines: usize,
    pub runtime: RuntimeConfig,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            refresh_interval_ms: 5_000,
            history_window: DEFAULT_WINDOW,
            log_buffer_lines: DEFAULT_LOG_CAPACITY,
            runtime: RuntimeConfig::default(),
        }
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid configuration: {message}")]
    Invalid { message: String },
}

impl DashboardConfig {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_str(&content)
    }

    /// Load configuration from a string (useful for testing)
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let config: DashboardConfig = if content.trim().is_empty() {
            DashboardConfig::default()
        } else {
            serde_yaml::from_str(content)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Search for a config file: `$DOCKWATCH_CONFIG` first, then the standard
    /// names in `dir`. `Ok(None)` means "use defaults".
    pub fn discover(dir: &Path) -> Result<Option<(PathBuf, Self)>, ConfigError> {
        if let Ok(env_path) = std::env::var(CONFIG_ENV) {
            let path = PathBuf::from(env_path);
            return Self::load(&path).map(|c| Some((path, c)));
        }

        for name in CONFIG_NAMES {
            let path = dir.join(name);
            if path.is_file() {
                return Self::load(&path).map(|c| Some((path, c)));
            }
        }
        Ok(None)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |message: &str| {
            Err(ConfigError::Invalid {
                message: message.to_string(),
            })
        };
        if self.refresh_interval_ms == 0 {
            return invalid("refresh_interval_ms must be greater than zero");
        }
        if self.history_window == 0 {
            return invalid("history_window must be greater than zero");
        }
        if self.log_buffer_lines == 0 {
            return invalid("log_buffer_lines must be greater than zero");
        }
        if self.runtime.binary.trim().is_empty() {
            return invalid("runtime.binary must not be empty");
        }
        Ok(())
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DashboardConfig::default();
        assert_eq!(config.refresh_interval(), Duration::from_secs(5));
        assert_eq!(config.history_window, 20);
        assert_eq!(config.runtime.binary, "docker");
        assert!(config.runtime.show_all);
        assert!(!config.runtime.force_delete);
        assert_eq!(DashboardConfig::from_str("").unwrap(), config);
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let yaml = r#"
refresh_interval_ms: 1000
runtime:
  binary: podman
"#;
        let config = DashboardConfig::from_str(yaml).unwrap();
        assert_eq!(config.refresh_interval_ms, 1000);
        assert_eq!(config.history_window, 20);
        assert_eq!(config.runtime.binary, "podman");
        assert!(config.runtime.show_all);
    }

    #[test]
    fn test_rejects_zero_interval() {
        let result = DashboardConfig::from_str("refresh_interval_ms: 0\n");
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
        let result = DashboardConfig::from_str("history_window: 0\n");
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn test_rejects_bad_yaml() {
        let result = DashboardConfig::from_str("refresh_interval_ms: [fast]\n");
        assert!(matches!(result, Err(ConfigError::Yaml(_))));
    }

    #[test]
    fn test_discover_in_dir() {
        if std::env::var_os(CONFIG_ENV).is_some() {
            return;
        }
        let dir = std::env::temp_dir().join(format!("dockwatch-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        assert!(DashboardConfig::discover(&dir).unwrap().is_none());

        std::fs::write(dir.join(".dockwatch.yml"), "history_window: 30\n").unwrap();
        let (path, config) = DashboardConfig::discover(&dir).unwrap().unwrap();
        assert_eq!(path, dir.join(".dockwatch.yml"));
        assert_eq!(config.history_window, 30);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_load_missing_file() {
        let result = DashboardConfig::load(Path::new("/nonexistent/dockwatch.yml"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }
}
