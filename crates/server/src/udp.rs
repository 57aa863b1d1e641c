use socket2::{Domain, Protocol as SockProtocol, Socket, Type};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::UdpSocket;
use tracing::{debug, error};

use crate::handler::{Handler, Protocol};
use crate::server::{process, Shared};

const SOCKET_BUFFER_SIZE: usize = 512 * 1024;

pub(crate) fn bind_udp(socket_addr: SocketAddr) -> anyhow::Result<UdpSocket> {
    let domain = if socket_addr.is_ipv4() {
        Domain::IPV4
    } else {
        Domain::IPV6
    };
    let socket = Socket::new(domain, Type::DGRAM, Some(SockProtocol::UDP))?;
    if socket_addr.is_ipv6() {
        socket.set_only_v6(false)?;
    }
    socket.set_reuse_address(true)?;
    #[cfg(unix)]
    socket.set_reuse_port(true)?;
    socket.set_recv_buffer_size(SOCKET_BUFFER_SIZE)?;
    socket.set_send_buffer_size(SOCKET_BUFFER_SIZE)?;
    socket.bind(&socket_addr.into())?;
    socket.set_nonblocking(true)?;
    let std_socket: std::net::UdpSocket = socket.into();
    Ok(UdpSocket::from_std(std_socket)?)
}

/// Serves one `SO_REUSEPORT` socket. The receive buffer is sized to the
/// configured payload limit; longer datagrams are truncated by the kernel
/// and then fail to parse.
pub(crate) async fn run_udp_worker<H: Handler>(
    socket: UdpSocket,
    shared: Arc<Shared<H>>,
    worker_id: usize,
) {
    let mut recv_buf = vec![0u8; shared.max_udp_payload];
    let mut response = Vec::with_capacity(shared.max_udp_payload);

    loop {
        let (n, from) = match socket.recv_from(&mut recv_buf).await {
            Ok(v) => v,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) if e.kind() == io::ErrorKind::ConnectionReset => {
                debug!(worker = worker_id, error = %e, "UDP peer unreachable");
                continue;
            }
            Err(e) => {
                error!(worker = worker_id, error = %e, "UDP recv error");
                break;
            }
        };

        process(&shared, from, Protocol::Udp, &recv_buf[..n], &mut response).await;
        if response.is_empty() {
            continue;
        }

        if let Err(e) = socket.send_to(&response, from).await {
            debug!(worker = worker_id, client = %from, error = %e, "UDP send failed");
        }
    }
}
