//! Configuration loading and resolution
//!
//! Each setting resolves in priority order:
//! 1. Command-line argument or environment variable (both arrive as [`ConfigOverrides`])
//! 2. TOML config file
//! 3. Compiled default
//!
//! A missing config file is not an error; the service starts on defaults.

use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, warn};

use crate::{Error, Result};

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 3007;
pub const DEFAULT_UPSTREAM_URL: &str = "https://api.tvmaze.com";
pub const DEFAULT_SESSION_TTL_SECS: u64 = 14 * 24 * 60 * 60;
/// Longest session lifetime accepted; browsers clamp cookie `Max-Age` to 400 days
pub const MAX_SESSION_TTL_SECS: u64 = 400 * 24 * 60 * 60;
const DEV_SESSION_SECRET: &str = "showfav-development-secret";

/// Deployment mode; selects cookie policy and response caching
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeploymentMode {
    #[default]
    Development,
    Production,
}

impl DeploymentMode {
    pub fn is_production(self) -> bool {
        matches!(self, DeploymentMode::Production)
    }
}

impl FromStr for DeploymentMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Ok(DeploymentMode::Production),
            "development" | "dev" | "test" => Ok(DeploymentMode::Development),
            other => Err(Error::Config(format!("Unknown deployment mode: {}", other))),
        }
    }
}

impl fmt::Display for DeploymentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeploymentMode::Development => f.write_str("development"),
            DeploymentMode::Production => f.write_str("production"),
        }
    }
}

/// Contents of `config.toml`; every key is optional
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct TomlConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub upstream_url: Option<String>,
    pub database_url: Option<String>,
    pub mode: Option<String>,
    pub session_secret: Option<String>,
    pub session_ttl_secs: Option<u64>,
    pub upstream_timeout_secs: Option<u64>,
}

/// Values supplied on the command line or through the environment
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub upstream_url: Option<String>,
    pub database_url: Option<String>,
    pub mode: Option<String>,
    pub session_secret: Option<String>,
}

/// Fully resolved server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub upstream_url: String,
    pub database_url: String,
    pub mode: DeploymentMode,
    pub session_secret: String,
    pub session_ttl: Duration,
    /// `None` leaves request timeouts to the transport defaults
    pub upstream_timeout: Option<Duration>,
}

impl ServerConfig {
    /// Merge overrides over the file config over compiled defaults
    pub fn resolve(overrides: ConfigOverrides, file: TomlConfig) -> Result<Self> {
        let mode = match overrides.mode.or(file.mode) {
            Some(raw) => raw.parse()?,
            None => DeploymentMode::default(),
        };

        let session_secret = match overrides.session_secret.or(file.session_secret) {
            Some(secret) if !secret.trim().is_empty() => secret,
            Some(_) => return Err(Error::Config("session secret must not be empty".to_string())),
            None => {
                if mode.is_production() {
                    warn!("No session secret configured in production mode; using the development default");
                }
                DEV_SESSION_SECRET.to_string()
            }
        };

        let mut session_ttl_secs = file.session_ttl_secs.unwrap_or(DEFAULT_SESSION_TTL_SECS);
        if session_ttl_secs == 0 {
            return Err(Error::Config("session_ttl_secs must be positive".to_string()));
        }
        if session_ttl_secs > MAX_SESSION_TTL_SECS {
            warn!(
                "session_ttl_secs {} exceeds the maximum; using {}",
                session_ttl_secs, MAX_SESSION_TTL_SECS
            );
            session_ttl_secs = MAX_SESSION_TTL_SECS;
        }

        Ok(Self {
            host: overrides
                .host
                .or(file.host)
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: overrides.port.or(file.port).unwrap_or(DEFAULT_PORT),
            upstream_url: overrides
                .upstream_url
                .or(file.upstream_url)
                .unwrap_or_else(|| DEFAULT_UPSTREAM_URL.to_string()),
            database_url: overrides
                .database_url
                .or(file.database_url)
                .unwrap_or_else(default_database_url),
            mode,
            session_secret,
            session_ttl: Duration::from_secs(session_ttl_secs),
            upstream_timeout: file.upstream_timeout_secs.map(Duration::from_secs),
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Locate the config file: explicit path first, then the per-user default
pub fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    dirs::config_dir()
        .map(|d| d.join("showfav").join("config.toml"))
        .filter(|path| path.exists())
}

/// Read a TOML config file
///
/// A missing file yields defaults with a warning; a file that exists but
/// does not parse is a configuration error.
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!("Config file not found at {}; using defaults", path.display());
            return Ok(TomlConfig::default());
        }
        Err(e) => return Err(Error::Io(e)),
    };

    let config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Invalid config file {}: {}", path.display(), e)))?;

    info!("Loaded config file {}", path.display());
    Ok(config)
}

/// Default data folder for the session database
fn default_data_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("showfav"))
        .unwrap_or_else(|| PathBuf::from("./showfav_data"))
}

fn default_database_url() -> String {
    let db_path = default_data_folder().join("showfav.db");
    format!("sqlite://{}?mode=rwc", db_path.display())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_when_nothing_configured() {
        let config = ServerConfig::resolve(ConfigOverrides::default(), TomlConfig::default()).unwrap();
        assert_eq!(config.host, DEFAULT_HOST);
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.upstream_url, DEFAULT_UPSTREAM_URL);
        assert_eq!(config.mode, DeploymentMode::Development);
        assert_eq!(config.session_ttl, Duration::from_secs(DEFAULT_SESSION_TTL_SECS));
        assert!(config.upstream_timeout.is_none());
        assert!(config.database_url.starts_with("sqlite://"));
    }

    #[test]
    fn overrides_beat_file_values() {
        let file = TomlConfig {
            port: Some(8000),
            mode: Some("production".to_string()),
            upstream_url: Some("http://file.example".to_string()),
            ..Default::default()
        };
        let overrides = ConfigOverrides {
            port: Some(9000),
            ..Default::default()
        };

        let config = ServerConfig::resolve(overrides, file).unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.mode, DeploymentMode::Production);
        assert_eq!(config.upstream_url, "http://file.example");
        assert_eq!(config.bind_addr(), "127.0.0.1:9000");
    }

    #[test]
    fn rejects_unknown_mode_and_blank_secret() {
        let bad_mode = ConfigOverrides {
            mode: Some("staging".to_string()),
            ..Default::default()
        };
        assert!(ServerConfig::resolve(bad_mode, TomlConfig::default()).is_err());

        let blank_secret = ConfigOverrides {
            session_secret: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(ServerConfig::resolve(blank_secret, TomlConfig::default()).is_err());
    }

    #[test]
    fn oversized_session_ttl_is_capped() {
        let file = TomlConfig {
            session_ttl_secs: Some(10_000_000_000_000),
            ..Default::default()
        };
        let config = ServerConfig::resolve(ConfigOverrides::default(), file).unwrap();
        assert_eq!(config.session_ttl, Duration::from_secs(MAX_SESSION_TTL_SECS));

        let zero = TomlConfig {
            session_ttl_secs: Some(0),
            ..Default::default()
        };
        assert!(ServerConfig::resolve(ConfigOverrides::default(), zero).is_err());
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_toml_config(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, TomlConfig::default());
    }

    #[test]
    fn parses_file_and_reports_garbage() {
        let dir = tempfile::tempdir().unwrap();

        let good = dir.path().join("good.toml");
        let mut f = std::fs::File::create(&good).unwrap();
        writeln!(f, "port = 4100\nsession_ttl_secs = 60\nupstream_timeout_secs = 5").unwrap();
        let config = load_toml_config(&good).unwrap();
        assert_eq!(config.port, Some(4100));
        assert_eq!(config.session_ttl_secs, Some(60));
        assert_eq!(config.upstream_timeout_secs, Some(5));

        let bad = dir.path().join("bad.toml");
        std::fs::write(&bad, "port = \"not a number\"").unwrap();
        assert!(matches!(load_toml_config(&bad), Err(Error::Config(_))));
    }

    #[test]
    fn explicit_config_path_wins() {
        let path = PathBuf::from("/tmp/explicit.toml");
        assert_eq!(resolve_config_path(Some(&path)), Some(path));
    }
}
