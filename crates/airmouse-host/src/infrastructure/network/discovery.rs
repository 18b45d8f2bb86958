//! UDP discovery responder.
//!
//! Devices locate the host by broadcasting `RS-AirMouse discover` on the
//! well-known discovery port. The responder answers each valid probe, and
//! only valid probes, with `RS-AirMouse <ip> <tcp-port>` sent back to the
//! probe's source address, where `<tcp-port>` is whatever the connection
//! manager is currently listening on.
//!
//! The loop runs on a dedicated thread. The socket carries a 500 ms read
//! timeout; on each timeout the running flag is checked, so shutdown never
//! waits on a datagram that may never come.

use std::net::{IpAddr, SocketAddr, UdpSocket};
use std::sync::atomic::{AtomicBool, AtomicU16, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use airmouse_core::protocol::discovery;
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Error type for the discovery responder.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// The UDP socket could not be bound.
    #[error("failed to bind discovery socket on {addr}: {source}")]
    BindFailed {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
}

/// Handle to a running discovery responder.
pub struct DiscoveryResponder {
    port: u16,
    handle: Option<JoinHandle<()>>,
}

impl DiscoveryResponder {
    /// The UDP port the responder is bound to.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Waits for the responder thread to exit. The caller clears the shared
    /// running flag first; the thread notices within one read timeout.
    pub fn join(&mut self) {
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("discovery thread panicked");
            }
        }
    }
}

/// Binds the discovery socket and spawns the responder thread.
///
/// `tcp_port` is read on every reply, so a restarted connection manager is
/// advertised correctly as soon as the caller updates the shared value.
///
/// # Errors
///
/// Returns [`DiscoveryError::BindFailed`] if the socket cannot be bound,
/// e.g. when another host instance already owns the discovery port.
pub fn start_discovery_responder(
    discovery_port: u16,
    bind_address: IpAddr,
    tcp_port: Arc<AtomicU16>,
    running: Arc<AtomicBool>,
) -> Result<DiscoveryResponder, DiscoveryError> {
    let addr = SocketAddr::new(bind_address, discovery_port);
    let socket =
        UdpSocket::bind(addr).map_err(|source| DiscoveryError::BindFailed { addr, source })?;
    socket
        .set_read_timeout(Some(Duration::from_millis(500)))
        .ok();
    let port = socket.local_addr().map(|a| a.port()).unwrap_or(discovery_port);

    let handle = std::thread::Builder::new()
        .name("airmouse-discovery".to_string())
        .spawn(move || discovery_loop(socket, tcp_port, running))
        .expect("failed to spawn discovery thread");

    info!("discovery responder listening on UDP {}:{}", bind_address, port);
    Ok(DiscoveryResponder {
        port,
        handle: Some(handle),
    })
}

/// The main receive loop executed on the discovery thread.
fn discovery_loop(socket: UdpSocket, tcp_port: Arc<AtomicU16>, running: Arc<AtomicBool>) {
    let mut buf = vec![0u8; 2048];

    while running.load(Ordering::Relaxed) {
        let (len, src) = match socket.recv_from(&mut buf) {
            Ok(pair) => pair,
            Err(e) if is_timeout_error(&e) => continue,
            Err(e) => {
                error!("discovery recv error: {e}");
                continue;
            }
        };

        if !discovery::is_probe(&buf[..len]) {
            debug!("ignoring non-probe datagram from {src}");
            continue;
        }

        debug!("discovery probe from {src}");
        send_reply(&socket, src, tcp_port.load(Ordering::Relaxed));
    }

    info!("discovery responder stopped");
}

/// Sends the discovery reply for one probe. Failures are logged only.
fn send_reply(socket: &UdpSocket, dest: SocketAddr, tcp_port: u16) {
    let local = match reply_address(dest) {
        Ok(addr) => addr,
        Err(e) => {
            warn!("could not determine a reply address for {dest}: {e}");
            return;
        }
    };

    let reply = discovery::format_reply(local, tcp_port);
    match socket.send_to(reply.as_bytes(), dest) {
        Ok(_) => debug!("replied to {dest}: {reply}"),
        Err(e) => warn!("failed to send discovery reply to {dest}: {e}"),
    }
}

/// The local address a device should connect back to: the source address
/// the OS picks for the route toward the prober. No datagram is sent by the
/// route probe; `connect` on UDP only fixes the destination.
fn reply_address(dest: SocketAddr) -> std::io::Result<IpAddr> {
    let probe = UdpSocket::bind(("0.0.0.0", 0))?;
    probe.connect(dest)?;
    Ok(probe.local_addr()?.ip())
}

/// Returns `true` for OS timeout / would-block errors that just mean "no
/// datagram yet".
fn is_timeout_error(e: &std::io::Error) -> bool {
    matches!(
        e.kind(),
        std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
    )
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_timeout_error_recognises_timeouts() {
        assert!(is_timeout_error(&std::io::Error::new(
            std::io::ErrorKind::TimedOut,
            "timed out"
        )));
        assert!(is_timeout_error(&std::io::Error::new(
            std::io::ErrorKind::WouldBlock,
            "would block"
        )));
    }

    #[test]
    fn test_is_timeout_error_rejects_other_errors() {
        assert!(!is_timeout_error(&std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "refused"
        )));
    }

    #[test]
    fn test_reply_address_for_loopback_is_loopback() {
        let addr = reply_address("127.0.0.1:9999".parse().unwrap()).expect("route probe");
        assert!(addr.is_loopback());
    }

    #[test]
    fn test_responder_binds_an_ephemeral_port_when_asked_for_zero() {
        let running = Arc::new(AtomicBool::new(false)); // exits immediately
        let tcp_port = Arc::new(AtomicU16::new(4242));

        let responder = start_discovery_responder(
            0,
            "127.0.0.1".parse().unwrap(),
            tcp_port,
            running,
        )
        .expect("bind");

        assert!(responder.port() > 0);
    }
}
