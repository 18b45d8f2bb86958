//! The session entity: one end-to-end connected-device interaction.
//!
//! Exactly one session exists at a time. It is created when the connection
//! manager accepts a device and destroyed on disconnect, error, or explicit
//! drop; a new accept only happens after the prior session is fully torn
//! down, so the states below never overlap between two devices.

use std::net::SocketAddr;

use uuid::Uuid;

use crate::filter::SensorType;

/// Session identifier, used to correlate log lines across threads.
pub type SessionId = Uuid;

/// Connection-state lifecycle of a session.
///
/// The protocol state machine drives the transitions:
///
/// ```text
/// Idle ──► Handshaking ──► Active ──► Closing ──► Closed
///               │                                   ▲
///               └── malformed handshake ────────────┘
/// ```
///
/// `Closed` is terminal; no further reads occur once it is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Connection accepted; no bytes read yet.
    Idle,
    /// Waiting for (or validating) the handshake line.
    Handshaking,
    /// Handshake accepted; command lines are being processed.
    Active,
    /// Teardown in progress (graceful quit, EOF, or transport failure).
    Closing,
    /// Terminal. The disconnect notification has fired.
    Closed,
}

/// One connected device.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: SessionId,
    /// Network address of the device.
    pub peer: SocketAddr,
    /// Name the device declared in its handshake (hostname or model name).
    pub device_name: String,
    /// Currently selected sensor, or `None` when the device declared an
    /// unknown sensor type id.
    pub sensor_type: Option<SensorType>,
    pub state: SessionState,
}

impl Session {
    /// Creates a session for a device that completed its handshake.
    pub fn new(peer: SocketAddr, device_name: String, sensor_type: Option<SensorType>) -> Self {
        Self {
            id: Uuid::new_v4(),
            peer,
            device_name,
            sensor_type,
            state: SessionState::Active,
        }
    }
}
