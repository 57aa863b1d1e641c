pub mod errors;
pub mod local_records;
pub mod logging;
pub mod pool;
pub mod root;
pub mod server;

pub use errors::ConfigError;
pub use local_records::{LocalDnsRecord, LocalRecordKind};
pub use logging::{LogFormat, LoggingConfig};
pub use pool::PoolConfig;
pub use root::{CliOverrides, Config};
pub use server::ServerConfig;
