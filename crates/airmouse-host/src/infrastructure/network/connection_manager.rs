//! ConnectionManager: accepts at most one device session at a time.
//!
//! The listener binds an ephemeral port (devices learn it through the
//! discovery responder) and a dedicated thread accepts connections. Each
//! accepted connection runs a fresh
//! [`SessionProtocol`](airmouse_core::protocol::SessionProtocol) to
//! completion *on the accept thread itself*, so sessions are strictly
//! sequential: a second device is only accepted after the first session is
//! fully torn down.
//!
//! Decoded events flow to the application layer over a Tokio `mpsc` channel
//! (`blocking_send` from the thread side). Cancellation is cooperative: the
//! listener is non-blocking and polled against the running flag, and
//! `disconnect` shuts down the active session's socket to unblock its read.

use std::io::BufReader;
use std::net::{IpAddr, Shutdown, SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use airmouse_core::protocol::{SessionEvent, SessionProtocol};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Error type for the connection manager.
#[derive(Debug, Error)]
pub enum NetworkError {
    /// The TCP listener could not be bound.
    #[error("bind failed on {addr}: {source}")]
    BindFailed {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
}

/// How often the accept loop re-checks the running flag while idle.
const ACCEPT_POLL: Duration = Duration::from_millis(100);

/// Accepts device sessions and runs their protocol to completion.
pub struct ConnectionManager {
    bind_address: IpAddr,
    event_tx: mpsc::Sender<SessionEvent>,
    running: Arc<AtomicBool>,
    connected: Arc<AtomicBool>,
    /// Cloned handle of the active session's stream, kept so `disconnect`
    /// can shut it down from another thread.
    active_stream: Arc<Mutex<Option<TcpStream>>>,
    local_port: Option<u16>,
    accept_thread: Option<JoinHandle<()>>,
}

impl ConnectionManager {
    /// Creates a manager and returns it together with the event receiver.
    pub fn new(bind_address: IpAddr) -> (Self, mpsc::Receiver<SessionEvent>) {
        let (tx, rx) = mpsc::channel(64);
        let mgr = Self {
            bind_address,
            event_tx: tx,
            running: Arc::new(AtomicBool::new(false)),
            connected: Arc::new(AtomicBool::new(false)),
            active_stream: Arc::new(Mutex::new(None)),
            local_port: None,
            accept_thread: None,
        };
        (mgr, rx)
    }

    /// Binds the listener on an ephemeral port and spawns the accept loop.
    /// Restarts cleanly if already running. Returns the bound port.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::BindFailed`] when the listener cannot be
    /// bound or configured. Not retried; the caller decides.
    pub fn start(&mut self) -> Result<u16, NetworkError> {
        self.stop();

        let addr = SocketAddr::new(self.bind_address, 0);
        let listener =
            TcpListener::bind(addr).map_err(|source| NetworkError::BindFailed { addr, source })?;
        listener
            .set_nonblocking(true)
            .map_err(|source| NetworkError::BindFailed { addr, source })?;
        let port = listener
            .local_addr()
            .map_err(|source| NetworkError::BindFailed { addr, source })?
            .port();

        self.running.store(true, Ordering::Relaxed);
        let tx = self.event_tx.clone();
        let running = Arc::clone(&self.running);
        let connected = Arc::clone(&self.connected);
        let active = Arc::clone(&self.active_stream);
        let handle = std::thread::Builder::new()
            .name("airmouse-accept".to_string())
            .spawn(move || accept_loop(listener, tx, running, connected, active))
            .expect("failed to spawn accept thread");
        self.accept_thread = Some(handle);
        self.local_port = Some(port);

        info!("listening for devices on TCP {}:{}", self.bind_address, port);
        Ok(port)
    }

    /// The port the listener is bound to, or `None` when stopped.
    pub fn local_port(&self) -> Option<u16> {
        self.local_port
    }

    /// Returns `true` while the accept loop is alive.
    pub fn is_listening(&self) -> bool {
        self.accept_thread.is_some() && self.running.load(Ordering::Relaxed)
    }

    /// Returns `true` while a device session is active.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }

    /// Disconnects the active session, if any, leaving the listener bound
    /// and ready to accept the next device.
    pub fn disconnect(&self) {
        let guard = self.active_stream.lock().unwrap();
        if let Some(stream) = guard.as_ref() {
            debug!("shutting down active session stream");
            if let Err(e) = stream.shutdown(Shutdown::Both) {
                debug!("session stream shutdown failed: {e}");
            }
        }
    }

    /// Stops the listener and any active session, joining the accept
    /// thread before returning. Idempotent, callable from any thread.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        self.disconnect();
        if let Some(handle) = self.accept_thread.take() {
            if handle.join().is_err() {
                error!("accept loop thread panicked");
            }
        }
        self.local_port = None;
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        self.stop();
    }
}

/// The accept loop body, executed on the dedicated thread.
fn accept_loop(
    listener: TcpListener,
    tx: mpsc::Sender<SessionEvent>,
    running: Arc<AtomicBool>,
    connected: Arc<AtomicBool>,
    active: Arc<Mutex<Option<TcpStream>>>,
) {
    while running.load(Ordering::Relaxed) {
        let (stream, peer) = match listener.accept() {
            Ok(pair) => pair,
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                std::thread::sleep(ACCEPT_POLL);
                continue;
            }
            Err(e) => {
                error!("accept failed: {e}");
                std::thread::sleep(ACCEPT_POLL);
                continue;
            }
        };

        info!("device connected from {peer}");

        // The listener is non-blocking; the session read loop must not be.
        if let Err(e) = stream.set_nonblocking(false) {
            warn!("failed to configure session stream: {e}");
            continue;
        }
        match stream.try_clone() {
            Ok(clone) => *active.lock().unwrap() = Some(clone),
            Err(e) => warn!("session stream cannot be cloned; disconnect() will not reach it: {e}"),
        }
        connected.store(true, Ordering::Relaxed);

        run_session(stream, peer, &tx);

        connected.store(false, Ordering::Relaxed);
        *active.lock().unwrap() = None;
        // Straight back to accept: the next device gets its turn only now.
    }
    info!("accept loop stopped");
}

/// Runs one session's protocol to completion, forwarding its events.
fn run_session(stream: TcpStream, peer: SocketAddr, tx: &mpsc::Sender<SessionEvent>) {
    let reader = BufReader::new(stream);
    let mut protocol = SessionProtocol::new(reader, peer);

    let result = protocol.run(&mut |event| {
        if tx.blocking_send(event).is_err() {
            debug!("event receiver dropped; discarding session event");
        }
    });

    if let Err(e) = result {
        // Rejected handshake or pre-handshake transport failure: surface it
        // the same way mid-session failures surface.
        warn!("session from {peer} aborted: {e}");
        let _ = tx.blocking_send(SessionEvent::ConnectionError {
            cause: e.to_string(),
        });
    }
    // The stream (inside the reader) closes on drop here.
}

// ── Tests ─────────────────────────────────────────────────────────────────────
