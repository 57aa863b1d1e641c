use async_trait::async_trait;
use quickdns_wire::Message;
use std::fmt;
use std::net::SocketAddr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Udp,
    Tcp,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Udp => f.write_str("udp"),
            Protocol::Tcp => f.write_str("tcp"),
        }
    }
}

/// Per-request metadata handed to the handler next to the parsed message.
#[derive(Debug, Clone, Copy)]
pub struct RequestContext {
    pub client: SocketAddr,
    pub protocol: Protocol,
    /// Largest reply the transport will carry; UDP replies above this are
    /// replaced by a truncated (TC) response.
    pub max_response_size: usize,
}

/// Answers one parsed query.
///
/// The reply is written into `response`, which arrives empty. Leaving it
/// empty drops the query without replying.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn handle(&self, ctx: &RequestContext, request: &Message<'_>, response: &mut Vec<u8>);
}
