use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};

use super::errors::ConfigError;

/// Smallest payload every DNS implementation must accept over UDP.
pub const MIN_UDP_PAYLOAD: usize = 512;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Number of `SO_REUSEPORT` UDP sockets, each served by its own task.
    #[serde(default = "default_udp_workers")]
    pub udp_workers: usize,

    #[serde(default = "default_true")]
    pub tcp_enabled: bool,

    #[serde(default = "default_tcp_idle_timeout_secs")]
    pub tcp_idle_timeout_secs: u64,

    #[serde(default = "default_max_udp_payload")]
    pub max_udp_payload: usize,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip: IpAddr = self.bind_address.parse().map_err(|_| {
            ConfigError::Validation(format!("Invalid bind address '{}'", self.bind_address))
        })?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            udp_workers: default_udp_workers(),
            tcp_enabled: true,
            tcp_idle_timeout_secs: default_tcp_idle_timeout_secs(),
            max_udp_payload: default_max_udp_payload(),
        }
    }
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    53
}

fn default_udp_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

fn default_true() -> bool {
    true
}

fn default_tcp_idle_timeout_secs() -> u64 {
    10
}

fn default_max_udp_payload() -> usize {
    4096
}
