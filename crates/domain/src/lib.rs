//! quickdns domain layer: configuration model shared by the server and the CLI.
pub mod config;

pub use config::{
    CliOverrides, Config, ConfigError, LocalDnsRecord, LocalRecordKind, LogFormat,
    LoggingConfig, PoolConfig, ServerConfig,
};
