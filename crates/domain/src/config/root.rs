use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

use super::errors::ConfigError;
use super::local_records::LocalDnsRecord;
use super::logging::LoggingConfig;
use super::pool::PoolConfig;
use super::server::{ServerConfig, MIN_UDP_PAYLOAD};

const LOCAL_CONFIG_PATH: &str = "quickdns.toml";
const SYSTEM_CONFIG_PATH: &str = "/etc/quickdns/config.toml";

/// Main configuration structure for quickdns
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    /// Domain appended to local records that do not set their own
    #[serde(default)]
    pub local_domain: Option<String>,

    /// Listener configuration (address, port, workers, TCP)
    #[serde(default)]
    pub server: ServerConfig,

    /// Message pool sizing
    #[serde(default)]
    pub pool: PoolConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Statically served records
    #[serde(default)]
    pub records: Vec<LocalDnsRecord>,
}

impl Config {
    /// Load configuration from file or use defaults
    ///
    /// Priority order:
    /// 1. Explicitly provided path
    /// 2. quickdns.toml in current directory
    /// 3. /etc/quickdns/config.toml
    /// 4. Default configuration
    pub fn load(path: Option<&str>, cli_overrides: CliOverrides) -> Result<Self, ConfigError> {
        let mut config = match Self::resolve_path(path) {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };

        config.apply_cli_overrides(cli_overrides);
        Ok(config)
    }

    /// The file `load` would read, if any.
    pub fn resolve_path(path: Option<&str>) -> Option<String> {
        if let Some(path) = path {
            Some(path.to_string())
        } else if Path::new(LOCAL_CONFIG_PATH).exists() {
            Some(LOCAL_CONFIG_PATH.to_string())
        } else if Path::new(SYSTEM_CONFIG_PATH).exists() {
            Some(SYSTEM_CONFIG_PATH.to_string())
        } else {
            None
        }
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(path.to_string(), e.to_string()))?;
        contents.parse()
    }

    fn apply_cli_overrides(&mut self, overrides: CliOverrides) {
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        if let Some(bind) = overrides.bind_address {
            self.server.bind_address = bind;
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("DNS port cannot be 0".to_string()));
        }

        self.server.socket_addr()?;

        if self.server.udp_workers == 0 {
            return Err(ConfigError::Validation(
                "At least one UDP worker is required".to_string(),
            ));
        }

        if self.server.max_udp_payload < MIN_UDP_PAYLOAD || self.server.max_udp_payload > 65535 {
            return Err(ConfigError::Validation(format!(
                "max_udp_payload must be between {} and 65535",
                MIN_UDP_PAYLOAD
            )));
        }

        if self.server.tcp_enabled && self.server.tcp_idle_timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "tcp_idle_timeout_secs cannot be 0".to_string(),
            ));
        }

        for record in &self.records {
            record.validate()?;
        }

        Ok(())
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}

/// Command-line overrides for configuration
#[derive(Debug, Default)]
pub struct CliOverrides {
    pub port: Option<u16>,
    pub bind_address: Option<String>,
    pub log_level: Option<String>,
}
