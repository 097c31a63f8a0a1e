use std::io::{Read, Write};
use std::net::{Ipv4Addr, SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::os::fd::{AsRawFd, RawFd};

use tracing::{debug, info};

use crate::error::{Result, TransportError};

/// One established TCP tunnel connection.
///
/// The stream is non-blocking; readers see `WouldBlock` when no data is
/// available and a zero-length read when the peer is gone. There is no
/// reconnection: peer loss ends the tunnel.
pub struct TcpTunnel {
    stream: TcpStream,
    peer: SocketAddr,
}

impl TcpTunnel {
    /// Dial `host:port`, trying each resolved candidate address in order.
    pub fn connect(addr: &str) -> Result<Self> {
        let candidates = addr
            .to_socket_addrs()
            .map_err(|source| TransportError::Resolve {
                addr: addr.to_string(),
                source,
            })?;

        let mut last_err = None;
        for candidate in candidates {
            match TcpStream::connect(candidate) {
                Ok(stream) => {
                    info!(peer = %candidate, "tunnel connected");
                    return Self::from_stream(stream, candidate);
                }
                Err(err) => {
                    debug!(%candidate, %err, "connect attempt failed");
                    last_err = Some(err);
                }
            }
        }

        Err(TransportError::Connect {
            addr: addr.to_string(),
            source: last_err.unwrap_or_else(|| {
                std::io::Error::new(
                    std::io::ErrorKind::AddrNotAvailable,
                    "address resolved to no candidates",
                )
            }),
        })
    }

    fn from_stream(stream: TcpStream, peer: SocketAddr) -> Result<Self> {
        let _ = stream.set_nodelay(true);
        stream.set_nonblocking(true)?;
        Ok(Self { stream, peer })
    }

    /// Address of the remote tunnel peer.
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }
}

impl Read for TcpTunnel {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.stream.read(buf)
    }
}

impl Write for TcpTunnel {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.stream.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.stream.flush()
    }
}

impl AsRawFd for TcpTunnel {
    fn as_raw_fd(&self) -> RawFd {
        self.stream.as_raw_fd()
    }
}

impl std::fmt::Debug for TcpTunnel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TcpTunnel").field("peer", &self.peer).finish()
    }
}

/// Accepts exactly one tunnel peer.
pub struct TcpTunnelListener {
    listener: TcpListener,
    local: SocketAddr,
}

impl TcpTunnelListener {
    /// Bind the listen port on all interfaces.
    pub fn bind(port: u16) -> Result<Self> {
        let listener = TcpListener::bind((Ipv4Addr::UNSPECIFIED, port))
            .map_err(|source| TransportError::Bind { port, source })?;
        let local = listener.local_addr().map_err(TransportError::Io)?;
        info!(%local, "listening for tunnel peer");
        Ok(Self { listener, local })
    }

    /// The bound address (useful when port 0 was requested).
    pub fn local_addr(&self) -> SocketAddr {
        self.local
    }

    /// Block until one peer connects, then close the listener.
    ///
    /// The single accepted connection is the tunnel for the rest of the
    /// process lifetime.
    pub fn accept_one(self) -> Result<TcpTunnel> {
        let (stream, peer) = self.listener.accept().map_err(TransportError::Accept)?;
        info!(%peer, "tunnel peer connected");
        TcpTunnel::from_stream(stream, peer)
    }
}

#[cfg(test)]
mod tests {
    use std::io::ErrorKind;

    use super::*;

    #[test]
    fn connect_and_accept_loopback() {
        let listener = TcpTunnelListener::bind(0).unwrap();
        let addr = format!("127.0.0.1:{}", listener.local_addr().port());

        let dialer = std::thread::spawn(move || TcpTunnel::connect(&addr).unwrap());
        let mut server = listener.accept_one().unwrap();
        let mut client = dialer.join().unwrap();

        client.write_all(b"ping").unwrap();
        let mut buf = [0u8; 4];
        // Non-blocking: spin until the bytes arrive.
        loop {
            match server.read(&mut buf) {
                Ok(4) => break,
                Ok(n) => panic!("short read: {n}"),
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => panic!("read failed: {err}"),
            }
        }
        assert_eq!(&buf, b"ping");
    }

    #[test]
    fn accepted_stream_is_non_blocking() {
        let listener = TcpTunnelListener::bind(0).unwrap();
        let addr = format!("127.0.0.1:{}", listener.local_addr().port());

        let dialer = std::thread::spawn(move || TcpTunnel::connect(&addr).unwrap());
        let mut server = listener.accept_one().unwrap();
        let _client = dialer.join().unwrap();

        let mut buf = [0u8; 1];
        let err = server.read(&mut buf).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::WouldBlock);
    }

    #[test]
    fn connect_refused_reports_connect_error() {
        // Bind then drop to find a port that refuses connections.
        let port = {
            let probe = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).unwrap();
            probe.local_addr().unwrap().port()
        };
        let err = TcpTunnel::connect(&format!("127.0.0.1:{port}")).unwrap_err();
        assert!(matches!(err, TransportError::Connect { .. }));
    }

    #[test]
    fn unresolvable_host_reports_resolve_error() {
        let err = TcpTunnel::connect("definitely-not-a-host.invalid:60001").unwrap_err();
        assert!(matches!(err, TransportError::Resolve { .. }));
    }

    #[test]
    fn peer_disconnect_reads_zero() {
        let listener = TcpTunnelListener::bind(0).unwrap();
        let addr = format!("127.0.0.1:{}", listener.local_addr().port());

        let dialer = std::thread::spawn(move || TcpTunnel::connect(&addr).unwrap());
        let mut server = listener.accept_one().unwrap();
        let client = dialer.join().unwrap();
        drop(client);

        let mut buf = [0u8; 1];
        loop {
            match server.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => panic!("unexpected data: {n}"),
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => panic!("read failed: {err}"),
            }
        }
    }
}
