use async_trait::async_trait;
use quickdns_domain::{Config, ConfigError, LocalRecordKind};
use quickdns_wire::{Class, Message, Opcode, Rcode, RecordName, Type, WireError};
use std::collections::HashMap;
use std::net::IpAddr;
use tracing::{debug, info, warn};

use crate::handler::{Handler, RequestContext};
use crate::response::{self, ResponseBuilder};

/// Longest CNAME chain followed inside the local table.
const MAX_CNAME_CHAIN: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq)]
enum LocalEntry {
    Address { addr: IpAddr, ttl: u32 },
    Cname { target: String, ttl: u32 },
}

/// Answers queries for statically configured names.
///
/// Unknown names get NXDOMAIN, known names without a record of the asked
/// type get an empty NOERROR. CNAMEs are followed while their targets are
/// also local.
#[derive(Debug, Default)]
pub struct LocalRecordsHandler {
    records: HashMap<String, Vec<LocalEntry>>,
}

fn normalize(name: &str) -> String {
    name.trim_end_matches('.').to_ascii_lowercase()
}

impl LocalRecordsHandler {
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let mut records: HashMap<String, Vec<LocalEntry>> = HashMap::new();

        for record in &config.records {
            let kind = record.validate()?;
            let ttl = record.ttl_or_default();
            let entry = match kind {
                LocalRecordKind::A | LocalRecordKind::Aaaa => {
                    let addr = record.ip.parse().map_err(|_| {
                        ConfigError::Validation(format!("Invalid IP address '{}'", record.ip))
                    })?;
                    LocalEntry::Address { addr, ttl }
                }
                LocalRecordKind::Cname => LocalEntry::Cname {
                    target: normalize(&record.ip),
                    ttl,
                },
            };
            records
                .entry(normalize(&record.fqdn(&config.local_domain)))
                .or_default()
                .push(entry);
        }

        info!(names = records.len(), records = config.records.len(), "Loaded local DNS records");
        Ok(Self { records })
    }

    /// Number of distinct names served.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn answer(&self, request: &Message<'_>, response: &mut Vec<u8>) -> Result<Rcode, WireError> {
        if request.header.flags.opcode() != Opcode::Query {
            response::error(response, request, Rcode::NotImp)?;
            return Ok(Rcode::NotImp);
        }
        if request.question.qclass != Class::IN {
            response::error(response, request, Rcode::Refused)?;
            return Ok(Rcode::Refused);
        }

        let Some(entries) = self.records.get(&normalize(request.domain())) else {
            response::error(response, request, Rcode::NxDomain)?;
            return Ok(Rcode::NxDomain);
        };

        let mut builder = ResponseBuilder::new(response, request, Rcode::NoError, true)?;
        if let Err(e) = self.fill(&mut builder, entries, request.question.qtype) {
            builder.abort();
            return Err(e);
        }
        Ok(Rcode::NoError)
    }

    fn fill<'a>(
        &'a self,
        builder: &mut ResponseBuilder<'_>,
        mut entries: &'a [LocalEntry],
        qtype: Type,
    ) -> Result<(), WireError> {
        let mut owner = RecordName::QUESTION;

        for _ in 0..MAX_CNAME_CHAIN {
            let cname = entries.iter().find_map(|entry| match entry {
                LocalEntry::Cname { target, ttl } => Some((target.as_str(), *ttl)),
                LocalEntry::Address { .. } => None,
            });

            if let Some((target, ttl)) = cname {
                if qtype != Type::CNAME {
                    builder.cname(owner, target, ttl)?;
                    owner = RecordName::Domain(target);
                    match self.records.get(target) {
                        Some(next) => {
                            entries = next;
                            continue;
                        }
                        None => return Ok(()),
                    }
                }
            }

            for entry in entries {
                match entry {
                    LocalEntry::Address { addr, ttl } if wants_address(qtype, addr) => {
                        builder.address(owner, *addr, *ttl)?;
                    }
                    LocalEntry::Cname { target, ttl } if qtype == Type::CNAME => {
                        builder.cname(owner, target, *ttl)?;
                    }
                    _ => {}
                }
            }
            return Ok(());
        }

        debug!(max = MAX_CNAME_CHAIN, "Local CNAME chain too long, answer cut short");
        Ok(())
    }
}

fn wants_address(qtype: Type, addr: &IpAddr) -> bool {
    match qtype {
        Type::ANY => true,
        Type::A => addr.is_ipv4(),
        Type::AAAA => addr.is_ipv6(),
        _ => false,
    }
}

#[async_trait]
impl Handler for LocalRecordsHandler {
    async fn handle(&self, ctx: &RequestContext, request: &Message<'_>, response: &mut Vec<u8>) {
        match self.answer(request, response) {
            Ok(rcode) => {
                debug!(
                    client = %ctx.client,
                    domain = %request.domain(),
                    record_type = %request.question.qtype,
                    rcode = %rcode,
                    "Local answer"
                );
            }
            Err(e) => {
                warn!(domain = %request.domain(), error = %e, "Failed to build local answer");
                response.clear();
                if let Err(e) = response::error(response, request, Rcode::ServFail) {
                    warn!(error = %e, "Failed to build SERVFAIL response");
                    response.clear();
                }
            }
        }
    }
}
