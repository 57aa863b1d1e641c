#![allow(dead_code)]

use quickdns_domain::{Config, LocalDnsRecord};
use quickdns_wire::{Class, Header, Message, Type};
use std::ops::ControlFlow;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    pub name: String,
    pub rtype: Type,
    pub ttl: u32,
    pub rdata: Vec<u8>,
}

pub fn build_query(domain: &str, qtype: Type, qclass: Class) -> Vec<u8> {
    let mut rng = fastrand::Rng::with_seed(0x5eed);
    let mut msg = Message::new();
    msg.set_question(domain, qtype, qclass, &mut rng).unwrap();
    msg.raw().to_vec()
}

pub fn parse_query(packet: &[u8]) -> Message<'_> {
    let mut msg = Message::new();
    msg.parse(packet, false).unwrap();
    msg
}

/// Header and decoded answer records of a reply.
pub fn read_reply(packet: &[u8]) -> (Header, Vec<Answer>) {
    let mut msg = Message::new();
    msg.parse(packet, false).unwrap();

    let mut answers = Vec::new();
    if msg.header.ancount != 0 {
        msg.visit_answers(|rr| {
            answers.push(Answer {
                name: msg.decode_name_to_string(rr.name).unwrap(),
                rtype: rr.rtype,
                ttl: rr.ttl,
                rdata: rr.rdata.to_vec(),
            });
            ControlFlow::Continue(())
        })
        .unwrap();
    }
    (msg.header, answers)
}

pub fn record(hostname: &str, ip: &str, record_type: &str) -> LocalDnsRecord {
    LocalDnsRecord {
        hostname: hostname.to_string(),
        domain: None,
        ip: ip.to_string(),
        record_type: record_type.to_string(),
        ttl: None,
    }
}

pub fn local_config() -> Config {
    let mut config = Config::default();
    config.local_domain = Some("lan".to_string());
    config.records = vec![
        record("nas", "192.168.1.10", "A"),
        record("nas", "fd00::10", "AAAA"),
        record("files", "nas.lan", "CNAME"),
        record("docs", "files.lan", "CNAME"),
        record("external", "example.com", "CNAME"),
        LocalDnsRecord {
            ttl: Some(42),
            ..record("printer", "192.168.1.20", "A")
        },
    ];
    config
}

/// Loopback server config on an ephemeral port.
pub fn server_config() -> Config {
    let mut config = local_config();
    config.server.bind_address = "127.0.0.1".to_string();
    config.server.port = 0;
    config.server.udp_workers = 2;
    config.server.tcp_enabled = true;
    config.server.tcp_idle_timeout_secs = 2;
    config
}
