use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use desk_core::{CoordinatorSettings, PollSettings, DEFAULT_PAGE_SIZE, DEFAULT_POLL_INTERVAL};
use desk_engine::GatewaySettings;
use desk_logging::{desk_debug, desk_info};
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::logging::LogDestination;

pub const CONFIG_FILENAME: &str = "query_desk.ron";
pub const TOKEN_ENV: &str = "QUERY_DESK_TOKEN";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not parse config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ron::error::SpannedError,
    },
    #[error("invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeskConfig {
    pub base_url: String,
    pub token: Option<String>,
    pub connect_timeout_ms: u64,
    pub request_timeout_ms: u64,
    pub poll_interval_ms: u64,
    pub max_consecutive_poll_failures: Option<u32>,
    pub page_size: u64,
    pub log_destination: LogDestination,
    pub log_level: String,
}

impl Default for DeskConfig {
    fn default() -> Self {
        let gateway = GatewaySettings::default();
        Self {
            base_url: gateway.base_url,
            token: None,
            connect_timeout_ms: gateway.connect_timeout.as_millis() as u64,
            request_timeout_ms: gateway.request_timeout.as_millis() as u64,
            poll_interval_ms: DEFAULT_POLL_INTERVAL.as_millis() as u64,
            max_consecutive_poll_failures: None,
            page_size: DEFAULT_PAGE_SIZE,
            log_destination: LogDestination::default(),
            log_level: "warn".to_string(),
        }
    }
}

impl DeskConfig {
    /// Reads `explicit` when given, otherwise `query_desk.ron` in the working
    /// directory if it exists. The token environment variable wins over the file.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => {
                let path = PathBuf::from(CONFIG_FILENAME);
                if path.exists() {
                    Self::from_file(&path)?
                } else {
                    desk_debug!("no {CONFIG_FILENAME} found, using defaults");
                    Self::default()
                }
            }
        };
        let config = config.with_token_override(std::env::var(TOKEN_ENV).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = ron::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        desk_info!("loaded config from {:?}", path);
        Ok(config)
    }

    pub fn with_token_override(mut self, token: Option<String>) -> Self {
        if let Some(token) = token.filter(|token| !token.trim().is_empty()) {
            self.token = Some(token);
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "base_url",
                reason: "must not be empty".into(),
            });
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "poll_interval_ms",
                reason: "must be greater than zero".into(),
            });
        }
        if self.page_size == 0 {
            return Err(ConfigError::Invalid {
                field: "page_size",
                reason: "must be greater than zero".into(),
            });
        }
        if self.max_consecutive_poll_failures == Some(0) {
            return Err(ConfigError::Invalid {
                field: "max_consecutive_poll_failures",
                reason: "use None to retry without limit".into(),
            });
        }
        if self.log_level_filter().is_none() {
            return Err(ConfigError::Invalid {
                field: "log_level",
                reason: format!("unknown level {:?}", self.log_level),
            });
        }
        Ok(())
    }

    pub fn log_level_filter(&self) -> Option<LevelFilter> {
        desk_logging::parse_level(&self.log_level)
    }

    pub fn gateway_settings(&self) -> GatewaySettings {
        GatewaySettings {
            base_url: self.base_url.clone(),
            token: self.token.clone(),
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            request_timeout: Duration::from_millis(self.request_timeout_ms),
        }
    }

    pub fn coordinator_settings(&self) -> CoordinatorSettings {
        CoordinatorSettings {
            poll: PollSettings {
                interval: Duration::from_millis(self.poll_interval_ms),
                max_consecutive_failures: self.max_consecutive_poll_failures,
            },
            page_size: self.page_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn missing_fields_take_defaults() {
        let file = write_config(
            r#"(
                base_url: "https://desk.example.com",
                poll_interval_ms: 500,
                log_destination: Both,
            )"#,
        );
        let config = DeskConfig::from_file(file.path()).unwrap();

        assert_eq!(config.base_url, "https://desk.example.com");
        assert_eq!(config.poll_interval_ms, 500);
        assert_eq!(config.log_destination, LogDestination::Both);
        assert_eq!(config.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(config.token, None);
        assert_eq!(
            config.coordinator_settings().poll.interval,
            Duration::from_millis(500)
        );
    }

    #[test]
    fn optional_ceiling_is_read() {
        let file = write_config("(max_consecutive_poll_failures: Some(5), token: Some(\"abc\"))");
        let config = DeskConfig::from_file(file.path()).unwrap();
        assert_eq!(config.max_consecutive_poll_failures, Some(5));
        assert_eq!(config.gateway_settings().token.as_deref(), Some("abc"));
    }

    #[test]
    fn environment_token_overrides_file() {
        let config = DeskConfig {
            token: Some("from-file".into()),
            ..DeskConfig::default()
        };
        assert_eq!(
            config.clone().with_token_override(Some("from-env".into())).token,
            Some("from-env".into())
        );
        assert_eq!(
            config.with_token_override(Some("  ".into())).token,
            Some("from-file".into())
        );
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = DeskConfig::load(Some(&dir.path().join("nope.ron"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn malformed_file_reports_parse_error() {
        let file = write_config("(page_size: \"twenty\")");
        let err = DeskConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn zero_values_are_rejected() {
        let config = DeskConfig {
            page_size: 0,
            ..DeskConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid {
                field: "page_size",
                ..
            })
        ));

        let config = DeskConfig {
            log_level: "chatty".into(),
            ..DeskConfig::default()
        };
        assert!(config.validate().is_err());
        assert!(DeskConfig::default().validate().is_ok());
    }
}
