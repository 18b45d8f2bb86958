//! The AirMouse wire protocol.
//!
//! The protocol is plain ASCII, one command per line, in the style of IRC:
//! the first whitespace-delimited word of a line is the command, the rest is
//! its argument. The very first line of a connection is the handshake; every
//! line after it is dispatched by [`line::parse_command`].
//!
//! Nothing in this module touches a socket. [`session::SessionProtocol`] is
//! generic over [`std::io::BufRead`], so the host runs it over a buffered
//! TCP stream while tests drive it with an in-memory cursor.

use std::net::SocketAddr;

use thiserror::Error;

pub mod discovery;
pub mod line;
pub mod session;

pub use session::SessionProtocol;

/// Magic token identifying the protocol; the first word of the handshake
/// line and of every discovery datagram.
pub const MAGIC_TOKEN: &str = "RS-AirMouse";

/// Error type for protocol execution.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The first line of the connection was not a valid handshake.
    #[error("handshake rejected: {0}")]
    Handshake(String),
    /// The transport failed while reading.
    #[error("session read failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Decoded events emitted by a running session, in strict arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// A device completed its handshake.
    ClientConnected {
        peer: SocketAddr,
        device_name: String,
        /// Raw sensor type id as declared on the wire; may be unknown.
        sensor_type_id: i32,
    },
    /// A `data` line carrying 2–3 raw sensor values.
    SensorSampleReceived { values: Vec<f64> },
    /// A `type` line switching the active sensor.
    SensorTypeChanged { sensor_type_id: i32 },
    /// A `reset` line; the active filter should drop its calibration origin.
    RecalibrationRequested,
    /// A `tap` line. `is_release` is `false` for `tap on` (press-start) and
    /// `true` for any other remainder.
    ClickRequested { is_release: bool },
    /// The transport failed mid-session; teardown follows.
    ConnectionError { cause: String },
    /// The session reached its terminal state. Fires exactly once.
    ClientDisconnected,
}
