//! quickdns server: UDP/TCP listeners that parse packets with
//! `quickdns-wire`, dispatch them to a [`Handler`] and write the reply.
pub mod handler;
pub mod local_records;
pub mod response;
pub mod server;
pub mod stats;

mod tcp;
mod udp;

pub use handler::{Handler, Protocol, RequestContext};
pub use local_records::LocalRecordsHandler;
pub use server::{BoundServer, DnsServer};
pub use stats::{ServerStats, ServerStatsSnapshot};
