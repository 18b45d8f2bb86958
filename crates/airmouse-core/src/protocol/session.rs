//! The session state machine: handshake, then the command loop.
//!
//! One instance drives one connection from first byte to teardown. The
//! reader is any [`BufRead`], so the connection manager hands it a buffered
//! TCP stream and the tests hand it a `Cursor`. Events are pushed into a
//! caller-provided sink closure in strict arrival order; the machine never
//! buffers or reorders.

use std::io::BufRead;
use std::net::SocketAddr;

use tracing::{debug, warn};

use crate::domain::session::SessionState;

use super::line::{self, Command};
use super::{ProtocolError, SessionEvent};

/// Line-based protocol state machine for one connection.
pub struct SessionProtocol<R> {
    reader: R,
    peer: SocketAddr,
    state: SessionState,
}

impl<R: BufRead> SessionProtocol<R> {
    /// Binds the state machine to one connection's byte stream.
    pub fn new(reader: R, peer: SocketAddr) -> Self {
        Self {
            reader,
            peer,
            state: SessionState::Idle,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Runs the session to completion: handshake, then the command loop.
    ///
    /// Transport failures *during* the command loop are not returned; they
    /// surface as a [`SessionEvent::ConnectionError`] followed by the
    /// terminal [`SessionEvent::ClientDisconnected`], and `run` still
    /// returns `Ok(())`.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Handshake`] when the first line is not a
    /// valid handshake, or [`ProtocolError::Io`] when the transport fails
    /// before the handshake completes. In both cases no event has been
    /// emitted and the session never reached `Active`.
    pub fn run(&mut self, sink: &mut dyn FnMut(SessionEvent)) -> Result<(), ProtocolError> {
        self.handshake(sink)?;
        self.command_loop(sink);
        Ok(())
    }

    /// Reads and validates the handshake line, emitting `ClientConnected`.
    fn handshake(&mut self, sink: &mut dyn FnMut(SessionEvent)) -> Result<(), ProtocolError> {
        self.state = SessionState::Handshaking;

        let line = self.read_line()?.ok_or_else(|| {
            ProtocolError::Handshake("connection closed before handshake".to_string())
        })?;

        let handshake = line::parse_handshake(&line)?;
        debug!(
            "handshake from {}: device={}, sensor type {}",
            self.peer, handshake.device_name, handshake.sensor_type_id
        );

        sink(SessionEvent::ClientConnected {
            peer: self.peer,
            device_name: handshake.device_name,
            sensor_type_id: handshake.sensor_type_id,
        });
        self.state = SessionState::Active;
        Ok(())
    }

    /// Dispatches command lines until quit, end-of-stream, or a transport
    /// failure.
    fn command_loop(&mut self, sink: &mut dyn FnMut(SessionEvent)) {
        while self.state == SessionState::Active {
            let line = match self.read_line() {
                Ok(Some(line)) => line,
                Ok(None) => {
                    debug!("{} closed the stream", self.peer);
                    self.close(sink);
                    return;
                }
                Err(e) => {
                    self.state = SessionState::Closing;
                    sink(SessionEvent::ConnectionError {
                        cause: e.to_string(),
                    });
                    self.close(sink);
                    return;
                }
            };

            match line::parse_command(&line) {
                Command::Data(values) => sink(SessionEvent::SensorSampleReceived { values }),
                Command::Type(sensor_type_id) => {
                    sink(SessionEvent::SensorTypeChanged { sensor_type_id })
                }
                Command::Reset => sink(SessionEvent::RecalibrationRequested),
                Command::Tap { is_release } => sink(SessionEvent::ClickRequested { is_release }),
                Command::Quit => {
                    debug!("{} quit gracefully", self.peer);
                    self.close(sink);
                }
                Command::Empty => {}
                Command::Malformed { command, reason } => {
                    // A bad payload is a no-op for this line, never fatal.
                    warn!("{}: malformed {command} payload: {reason}", self.peer);
                }
                Command::Unknown(command) => {
                    // Unknown commands are skipped for forward compatibility.
                    debug!("{}: skipping unknown command {command:?}", self.peer);
                }
            }
        }
    }

    /// Enters the terminal state, firing `ClientDisconnected` exactly once.
    fn close(&mut self, sink: &mut dyn FnMut(SessionEvent)) {
        if self.state == SessionState::Closed {
            return;
        }
        self.state = SessionState::Closing;
        sink(SessionEvent::ClientDisconnected);
        self.state = SessionState::Closed;
    }

    /// Reads one line, stripping the trailing newline. `None` on
    /// end-of-stream.
    fn read_line(&mut self) -> std::io::Result<Option<String>> {
        let mut buf = String::new();
        if self.reader.read_line(&mut buf)? == 0 {
            return Ok(None);
        }
        while buf.ends_with('\n') || buf.ends_with('\r') {
            buf.pop();
        }
        Ok(Some(buf))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
