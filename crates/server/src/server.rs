use quickdns_domain::{Config, ServerConfig};
use quickdns_wire::{Header, Message, MessagePool, Rcode, Type};
use std::net::SocketAddr;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, UdpSocket};
use tokio::task::JoinSet;
use tracing::{debug, error, info, trace, warn};

use crate::handler::{Handler, Protocol, RequestContext};
use crate::response;
use crate::stats::ServerStats;
use crate::{tcp, udp};

/// UDP payload limit for clients that do not advertise one.
const DEFAULT_UDP_PAYLOAD: usize = 512;

/// State shared by every listener task.
pub(crate) struct Shared<H> {
    pub(crate) handler: Arc<H>,
    pub(crate) pool: MessagePool,
    pub(crate) stats: Arc<ServerStats>,
    pub(crate) max_udp_payload: usize,
    pub(crate) tcp_idle_timeout: Duration,
}

pub struct DnsServer<H> {
    config: ServerConfig,
    pool_max_idle: usize,
    handler: Arc<H>,
    stats: Arc<ServerStats>,
}

impl<H: Handler + 'static> DnsServer<H> {
    pub fn new(config: &Config, handler: H) -> Self {
        Self {
            config: config.server.clone(),
            pool_max_idle: config.pool.max_idle,
            handler: Arc::new(handler),
            stats: Arc::new(ServerStats::new()),
        }
    }

    pub fn stats(&self) -> Arc<ServerStats> {
        self.stats.clone()
    }

    /// Creates every socket without serving yet. Must be called from within
    /// a tokio runtime.
    ///
    /// With port 0 the first UDP socket picks the port and every other
    /// socket reuses it.
    pub fn bind(self) -> anyhow::Result<BoundServer<H>> {
        let requested = self.config.socket_addr()?;
        let workers = self.config.udp_workers.max(1);

        let first = udp::bind_udp(requested)?;
        let local_addr = first.local_addr()?;
        let mut udp_sockets = Vec::with_capacity(workers);
        udp_sockets.push(first);
        for _ in 1..workers {
            udp_sockets.push(udp::bind_udp(local_addr)?);
        }

        let tcp_listener = if self.config.tcp_enabled {
            Some(tcp::bind_tcp(local_addr)?)
        } else {
            None
        };

        let shared = Arc::new(Shared {
            handler: self.handler,
            pool: MessagePool::new(self.pool_max_idle),
            stats: self.stats,
            max_udp_payload: self.config.max_udp_payload,
            tcp_idle_timeout: Duration::from_secs(self.config.tcp_idle_timeout_secs),
        });

        Ok(BoundServer {
            shared,
            udp_sockets,
            tcp_listener,
            local_addr,
        })
    }

    /// Binds and serves until every listener task has stopped.
    pub async fn run(self) -> anyhow::Result<()> {
        self.bind()?.run().await
    }
}

pub struct BoundServer<H> {
    shared: Arc<Shared<H>>,
    udp_sockets: Vec<UdpSocket>,
    tcp_listener: Option<TcpListener>,
    local_addr: SocketAddr,
}

impl<H: Handler + 'static> BoundServer<H> {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn stats(&self) -> Arc<ServerStats> {
        self.shared.stats.clone()
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let num_workers = self.udp_sockets.len();
        info!(
            bind_address = %self.local_addr,
            num_workers,
            tcp = self.tcp_listener.is_some(),
            "Starting DNS server with SO_REUSEPORT"
        );

        let mut join_set: JoinSet<()> = JoinSet::new();
        for (i, socket) in self.udp_sockets.into_iter().enumerate() {
            let shared = self.shared.clone();
            join_set.spawn(async move {
                udp::run_udp_worker(socket, shared, i).await;
            });
        }
        if let Some(listener) = self.tcp_listener {
            let shared = self.shared.clone();
            join_set.spawn(async move {
                tcp::run_tcp_listener(listener, shared).await;
            });
        }

        info!("DNS server ready: {} workers on {}", num_workers, self.local_addr);

        while let Some(result) = join_set.join_next().await {
            if let Err(e) = result {
                error!(error = %e, "DNS listener task failed");
            }
        }
        Ok(())
    }
}

/// Parses one packet, runs the handler and leaves the reply in `response`
/// (empty when nothing should be sent).
///
/// Packets without a full header and packets with QR set are dropped. A
/// readable header with an unparsable question gets a header-only FORMERR.
pub(crate) async fn process<H: Handler>(
    shared: &Shared<H>,
    client: SocketAddr,
    protocol: Protocol,
    packet: &[u8],
    response: &mut Vec<u8>,
) {
    response.clear();
    shared.stats.record_received();

    let header = match Header::decode(packet) {
        Ok(header) => header,
        Err(_) => {
            trace!(client = %client, len = packet.len(), "Dropping runt packet");
            shared.stats.record_dropped();
            return;
        }
    };
    if header.flags.qr() {
        trace!(client = %client, id = header.id, "Ignoring response sent to server");
        shared.stats.record_dropped();
        return;
    }

    let mut msg = shared.pool.acquire();
    match msg.parse_borrowed(packet) {
        Ok(()) => {
            let max_response_size = match protocol {
                Protocol::Udp => udp_payload_limit(&msg, shared.max_udp_payload),
                Protocol::Tcp => u16::MAX as usize,
            };
            let ctx = RequestContext {
                client,
                protocol,
                max_response_size,
            };

            debug!(
                client = %client,
                protocol = %protocol,
                domain = %msg.domain(),
                record_type = %msg.question.qtype,
                "DNS query received"
            );
            shared.handler.handle(&ctx, &msg, response).await;

            if response.len() > max_response_size {
                response.clear();
                match response::truncated(response, &msg) {
                    Ok(()) => shared.stats.record_truncated(),
                    Err(e) => {
                        warn!(domain = %msg.domain(), error = %e, "Failed to build truncated response");
                        response.clear();
                    }
                }
            }
        }
        Err(e) => {
            shared.stats.record_malformed();
            debug!(client = %client, error = %e, "Malformed DNS packet");
            response::error_from_header(response, &header, Rcode::FormErr);
        }
    }
    shared.pool.release(msg);

    if response.is_empty() {
        shared.stats.record_dropped();
    } else {
        shared.stats.record_answered();
    }
}

/// The requestor's advertised UDP payload size from an OPT pseudo-record
/// (carried in its CLASS field), bounded by our own limit.
fn udp_payload_limit(msg: &Message<'_>, max_udp_payload: usize) -> usize {
    let mut limit = DEFAULT_UDP_PAYLOAD;
    if msg.header.arcount != 0 {
        let walk = msg.visit_additionals(|rr| {
            if rr.rtype == Type::OPT {
                limit = (rr.class.to_u16() as usize).max(DEFAULT_UDP_PAYLOAD);
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        });
        if let Err(e) = walk {
            trace!(error = %e, "Unreadable additional section, assuming 512 byte limit");
        }
    }
    limit.min(max_udp_payload.max(DEFAULT_UDP_PAYLOAD))
}
