//! Application configuration and XDG path resolution.
//!
//! Configuration lives at `$XDG_CONFIG_HOME/pageturn/config.toml` (falling
//! back to `~/.config/pageturn/config.toml`). A missing file means
//! defaults; `PAGETURN_BACKEND_URL` overrides the backend URL without
//! touching the file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use miette::Diagnostic;
use serde::Deserialize;
use thiserror::Error;

/// Errors from configuration loading.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("cannot determine home directory")]
    #[diagnostic(
        code(pageturn::config::no_home),
        help("Set the HOME environment variable or ensure a valid user profile exists.")
    )]
    NoHome,

    #[error("failed to read config file: {path}")]
    #[diagnostic(
        code(pageturn::config::unreadable),
        help("Check that the file exists and you have read permissions.")
    )]
    Unreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {message}")]
    #[diagnostic(
        code(pageturn::config::parse),
        help("Fix the TOML syntax, or delete the file to fall back to defaults.")
    )]
    Parse { path: String, message: String },
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

fn default_backend_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_dpi() -> u32 {
    150
}

fn default_timeout_secs() -> u64 {
    10
}

/// Application settings.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Base URL of the reader backend.
    #[serde(default = "default_backend_url")]
    pub backend_url: String,
    /// DPI for rendered page images.
    #[serde(default = "default_dpi")]
    pub dpi: u32,
    /// Per-request HTTP timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend_url: default_backend_url(),
            dpi: default_dpi(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl AppConfig {
    /// Load from the XDG config file, then apply environment overrides.
    pub fn load() -> ConfigResult<Self> {
        let mut config = Self::load_from(&config_file()?)?;
        if let Ok(url) = std::env::var("PAGETURN_BACKEND_URL") {
            config.backend_url = url;
        }
        Ok(config)
    }

    /// Load from an explicit path; a missing file yields defaults.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(path).map_err(|source| ConfigError::Unreadable {
            path: path.display().to_string(),
            source,
        })?;
        toml::from_str(&data).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// `$XDG_CONFIG_HOME/pageturn/`, falling back to `~/.config/pageturn/`.
pub fn config_dir() -> ConfigResult<PathBuf> {
    let dir = match std::env::var("XDG_CONFIG_HOME") {
        Ok(xdg) => PathBuf::from(xdg),
        Err(_) => {
            let home = std::env::var("HOME")
                .map(PathBuf::from)
                .map_err(|_| ConfigError::NoHome)?;
            home.join(".config")
        }
    };
    Ok(dir.join("pageturn"))
}

/// Path to the config file.
pub fn config_file() -> ConfigResult<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let config = AppConfig::load_from(Path::new("/nonexistent/config.toml")).unwrap();
        assert_eq!(config.backend_url, "http://127.0.0.1:8000");
        assert_eq!(config.dpi, 150);
        assert_eq!(config.timeout(), Duration::from_secs(10));
    }

    #[test]
    fn partial_file_keeps_defaults_for_the_rest() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "backend_url = \"http://reader.lan:9000\"\n").unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.backend_url, "http://reader.lan:9000");
        assert_eq!(config.dpi, 150);
    }

    #[test]
    fn full_file_parses() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "backend_url = \"http://10.0.0.2:8000\"\ndpi = 220\ntimeout_secs = 3\n",
        )
        .unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.dpi, 220);
        assert_eq!(config.timeout(), Duration::from_secs(3));
    }

    #[test]
    fn invalid_toml_is_a_parse_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "backend_url = [not toml").unwrap();

        let err = AppConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
