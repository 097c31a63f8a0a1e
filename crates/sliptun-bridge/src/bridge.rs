use std::io::{ErrorKind, Read, Write};
use std::os::fd::AsRawFd;

use tracing::{info, trace};

use sliptun_codec::{OutputBuffer, SlipDecoder, MAX_FRAME};
use sliptun_transport::{Interest, PollSet};

use crate::error::{BridgeError, Result};
use crate::route::{route, DiagnosticSink, LogSink};
use crate::shutdown::ShutdownSignal;

const READ_CHUNK_SIZE: usize = 2048;

/// Relays frames between a SLIP serial line and a tunnel connection.
///
/// Generic over the endpoints so tests can substitute socketpairs; in the
/// binary, `S` is a `SerialPort` and `N` a `TcpTunnel`. Both must be
/// non-blocking.
pub struct Bridge<S, N> {
    serial: S,
    tunnel: N,
    decoder: SlipDecoder,
    outbuf: OutputBuffer,
    sink: Box<dyn DiagnosticSink + Send>,
    frames_to_tunnel: u64,
    frames_to_serial: u64,
}

impl<S, N> Bridge<S, N>
where
    S: Read + Write + AsRawFd,
    N: Read + Write + AsRawFd,
{
    pub fn new(serial: S, tunnel: N) -> Self {
        Self::with_sink(serial, tunnel, Box::new(LogSink))
    }

    pub fn with_sink(serial: S, tunnel: N, sink: Box<dyn DiagnosticSink + Send>) -> Self {
        Self {
            serial,
            tunnel,
            decoder: SlipDecoder::new(),
            outbuf: OutputBuffer::new(),
            sink,
            frames_to_tunnel: 0,
            frames_to_serial: 0,
        }
    }

    /// Queue a bare frame delimiter for the serial line.
    ///
    /// Sent once at startup so the device discards any half-received junk
    /// predating this process.
    pub fn queue_line_flush(&mut self) -> Result<()> {
        self.outbuf.queue(&[])?;
        Ok(())
    }

    /// Run until the shutdown signal trips or a fatal error occurs.
    ///
    /// Per iteration: watch serial for read always, serial for write only
    /// while output is pending, and the tunnel for read only while the
    /// output slot is free — a tunnel message is never accepted while a
    /// previous one is still draining. Dispatch order is fixed: the serial
    /// line has no flow control and unread device bytes risk being
    /// overwritten, so serial reads come first; a pending tunnel message
    /// can wait an iteration.
    pub fn run(&mut self, shutdown: &mut ShutdownSignal) -> Result<()> {
        let mut poll = PollSet::new();
        info!("bridge running");

        loop {
            if shutdown.is_triggered() {
                break;
            }

            poll.clear();
            let wake = poll.register(shutdown.wake_fd(), Interest::READ);
            let serial = poll.register(
                self.serial.as_raw_fd(),
                Interest {
                    read: true,
                    write: !self.outbuf.is_empty(),
                },
            );
            let tunnel = if self.outbuf.is_empty() {
                Some(poll.register(self.tunnel.as_raw_fd(), Interest::READ))
            } else {
                None
            };

            poll.wait(None)?;

            if shutdown.is_triggered() || poll.readiness(wake).readable {
                shutdown.drain();
                break;
            }

            let serial_ready = poll.readiness(serial);
            if serial_ready.readable {
                self.pump_serial(serial_ready.hangup)?;
            }
            if serial_ready.writable {
                self.flush_serial()?;
            }
            if let Some(token) = tunnel {
                if poll.readiness(token).readable {
                    self.pump_tunnel()?;
                }
            }
        }

        info!(
            to_tunnel = self.frames_to_tunnel,
            to_serial = self.frames_to_serial,
            dropped = self.decoder.frames_dropped(),
            "bridge stopped"
        );
        Ok(())
    }

    /// Serial bytes → decoder → tunnel or diagnostic sink.
    ///
    /// A zero-length read after the line reported hangup means the endpoint
    /// is gone; without hangup it is just a temporary end of input.
    fn pump_serial(&mut self, hangup: bool) -> Result<()> {
        let mut chunk = [0u8; READ_CHUNK_SIZE];
        loop {
            let read = match self.serial.read(&mut chunk) {
                Ok(0) if hangup => return Err(BridgeError::SerialClosed),
                Ok(0) => break,
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::WouldBlock => break,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(BridgeError::Io(err)),
            };

            for frame in self.decoder.decode(&chunk[..read]) {
                if let Some(payload) = route(&frame, self.sink.as_mut()) {
                    self.write_tunnel(payload)?;
                    self.frames_to_tunnel += 1;
                    trace!(len = payload.len(), "frame forwarded to tunnel");
                }
            }
        }
        Ok(())
    }

    fn write_tunnel(&mut self, payload: &[u8]) -> Result<()> {
        let mut offset = 0usize;
        let mut poll = PollSet::new();
        while offset < payload.len() {
            match self.tunnel.write(&payload[offset..]) {
                Ok(0) => return Err(BridgeError::PeerDisconnected),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => {
                    // Park until the socket can take more.
                    poll.clear();
                    poll.register(self.tunnel.as_raw_fd(), Interest::WRITE);
                    poll.wait(None)?;
                }
                Err(err) => return Err(BridgeError::Io(err)),
            }
        }
        Ok(())
    }

    /// Drain as much of the pending encoded frame as the line accepts.
    fn flush_serial(&mut self) -> Result<()> {
        if self.outbuf.is_empty() {
            return Ok(());
        }
        match self.serial.write(self.outbuf.pending()) {
            Ok(n) => {
                self.outbuf.consume(n);
                trace!(written = n, "serial drain");
            }
            Err(err) if err.kind() == ErrorKind::WouldBlock => {}
            Err(err) if err.kind() == ErrorKind::Interrupted => {}
            Err(err) => return Err(BridgeError::Io(err)),
        }
        Ok(())
    }

    /// One tunnel message → encoded into the single output slot.
    fn pump_tunnel(&mut self) -> Result<()> {
        debug_assert!(self.outbuf.is_empty());

        let mut msg = [0u8; MAX_FRAME];
        let read = match self.tunnel.read(&mut msg) {
            Ok(0) => return Err(BridgeError::PeerDisconnected),
            Ok(n) => n,
            Err(err) if err.kind() == ErrorKind::WouldBlock => return Ok(()),
            Err(err) if err.kind() == ErrorKind::Interrupted => return Ok(()),
            Err(err) => return Err(BridgeError::Io(err)),
        };

        self.outbuf.queue(&msg[..read])?;
        self.frames_to_serial += 1;
        trace!(len = read, "tunnel message queued for serial");

        // Opportunistic drain; the poll loop picks up any remainder.
        self.flush_serial()
    }

    /// Frames forwarded serial → tunnel.
    pub fn frames_to_tunnel(&self) -> u64 {
        self.frames_to_tunnel
    }

    /// Tunnel messages queued toward the serial line.
    pub fn frames_to_serial(&self) -> u64 {
        self.frames_to_serial
    }

    /// Undrained bytes of the pending outbound frame.
    pub fn output_pending(&self) -> usize {
        self.outbuf.pending().len()
    }
}

#[cfg(test)]
mod tests {
    use std::os::unix::net::UnixStream;

    use super::*;
    use crate::shutdown::shutdown_pair;

    fn pair() -> (UnixStream, UnixStream) {
        let (a, b) = UnixStream::pair().unwrap();
        a.set_nonblocking(true).unwrap();
        (a, b)
    }

    #[test]
    fn startup_flush_queues_single_delimiter() {
        let (serial, _serial_peer) = pair();
        let (tunnel, _tunnel_peer) = pair();

        let mut bridge = Bridge::new(serial, tunnel);
        bridge.queue_line_flush().unwrap();
        assert_eq!(bridge.output_pending(), 1);
    }

    #[test]
    fn second_queue_while_pending_is_rejected() {
        let (serial, _serial_peer) = pair();
        let (tunnel, _tunnel_peer) = pair();

        let mut bridge = Bridge::new(serial, tunnel);
        bridge.queue_line_flush().unwrap();
        let err = bridge.queue_line_flush().unwrap_err();
        assert!(matches!(err, BridgeError::Codec(_)));
    }

    #[test]
    fn run_returns_immediately_when_already_triggered() {
        let (serial, _serial_peer) = pair();
        let (tunnel, _tunnel_peer) = pair();
        let (mut signal, trigger) = shutdown_pair().unwrap();

        trigger.trigger();
        let mut bridge = Bridge::new(serial, tunnel);
        bridge.run(&mut signal).unwrap();
        assert_eq!(bridge.frames_to_tunnel(), 0);
    }
}
