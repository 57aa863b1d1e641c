use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, Ipv6Addr};

use super::errors::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalRecordKind {
    A,
    Aaaa,
    Cname,
}

impl LocalRecordKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "A" => Some(Self::A),
            "AAAA" => Some(Self::Aaaa),
            "CNAME" => Some(Self::Cname),
            _ => None,
        }
    }
}

/// A statically configured record served by the local-records handler.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LocalDnsRecord {
    pub hostname: String,

    #[serde(default)]
    pub domain: Option<String>,

    /// Address for A/AAAA records, canonical name for CNAME records.
    #[serde(alias = "target")]
    pub ip: String,

    pub record_type: String,

    #[serde(default)]
    pub ttl: Option<u32>,
}

impl LocalDnsRecord {
    pub fn fqdn(&self, default_domain: &Option<String>) -> String {
        if let Some(ref domain) = self.domain {
            format!("{}.{}", self.hostname, domain)
        } else if let Some(ref default) = default_domain {
            format!("{}.{}", self.hostname, default)
        } else {
            self.hostname.clone()
        }
    }

    pub fn ttl_or_default(&self) -> u32 {
        self.ttl.unwrap_or(300)
    }

    pub fn kind(&self) -> Option<LocalRecordKind> {
        LocalRecordKind::parse(&self.record_type)
    }

    pub fn validate(&self) -> Result<LocalRecordKind, ConfigError> {
        if self.hostname.is_empty() {
            return Err(ConfigError::Validation(
                "Local record with empty hostname".to_string(),
            ));
        }

        let kind = self.kind().ok_or_else(|| {
            ConfigError::Validation(format!(
                "Local record '{}' has unsupported type '{}'",
                self.hostname, self.record_type
            ))
        })?;

        let valid = match kind {
            LocalRecordKind::A => self.ip.parse::<Ipv4Addr>().is_ok(),
            LocalRecordKind::Aaaa => self.ip.parse::<Ipv6Addr>().is_ok(),
            LocalRecordKind::Cname => {
                let target = self.ip.trim_end_matches('.');
                !target.is_empty() && target.split('.').all(|l| !l.is_empty() && l.len() <= 63)
            }
        };
        if !valid {
            return Err(ConfigError::Validation(format!(
                "Local record '{}' has invalid {} value '{}'",
                self.hostname, self.record_type, self.ip
            )));
        }

        Ok(kind)
    }
}
