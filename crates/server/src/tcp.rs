use socket2::{Domain, Protocol as SockProtocol, Socket, Type};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tracing::{debug, trace, warn};

use crate::handler::{Handler, Protocol};
use crate::server::{process, Shared};

const LISTEN_BACKLOG: i32 = 1024;

pub(crate) fn bind_tcp(socket_addr: SocketAddr) -> anyhow::Result<TcpListener> {
    let domain = if socket_addr.is_ipv4() {
        Domain::IPV4
    } else {
        Domain::IPV6
    };
    let socket = Socket::new(domain, Type::STREAM, Some(SockProtocol::TCP))?;
    if socket_addr.is_ipv6() {
        socket.set_only_v6(false)?;
    }
    socket.set_reuse_address(true)?;
    #[cfg(unix)]
    socket.set_reuse_port(true)?;
    socket.bind(&socket_addr.into())?;
    socket.listen(LISTEN_BACKLOG)?;
    socket.set_nonblocking(true)?;
    let std_listener: std::net::TcpListener = socket.into();
    Ok(TcpListener::from_std(std_listener)?)
}

pub(crate) async fn run_tcp_listener<H: Handler + 'static>(
    listener: TcpListener,
    shared: Arc<Shared<H>>,
) {
    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "TCP accept error");
                continue;
            }
        };

        let shared = shared.clone();
        tokio::spawn(async move {
            if let Err(e) = serve_connection(stream, peer, &shared).await {
                debug!(client = %peer, error = %e, "TCP connection closed with error");
            }
        });
    }
}

/// Reads length-prefixed messages (RFC 1035 §4.2.2) until the client
/// closes the connection or stays idle past the configured timeout.
async fn serve_connection<H: Handler>(
    mut stream: TcpStream,
    peer: SocketAddr,
    shared: &Shared<H>,
) -> io::Result<()> {
    let idle = shared.tcp_idle_timeout;
    let mut len_buf = [0u8; 2];
    let mut packet = Vec::with_capacity(512);
    let mut response = Vec::with_capacity(512);

    loop {
        match timeout(idle, stream.read_exact(&mut len_buf)).await {
            Err(_) => {
                trace!(client = %peer, "TCP connection idle, closing");
                return Ok(());
            }
            Ok(Err(e)) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(()),
            Ok(Err(e)) => return Err(e),
            Ok(Ok(_)) => {}
        }

        let len = u16::from_be_bytes(len_buf) as usize;
        packet.resize(len, 0);
        timeout(idle, stream.read_exact(&mut packet))
            .await
            .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "partial DNS message"))??;

        process(shared, peer, Protocol::Tcp, &packet, &mut response).await;
        if response.is_empty() {
            continue;
        }

        let Ok(response_len) = u16::try_from(response.len()) else {
            warn!(client = %peer, len = response.len(), "TCP response too large, dropping");
            continue;
        };
        let mut framed = Vec::with_capacity(response.len() + 2);
        framed.extend_from_slice(&response_len.to_be_bytes());
        framed.extend_from_slice(&response);
        stream.write_all(&framed).await?;
    }
}
