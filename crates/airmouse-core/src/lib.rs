//! # airmouse-core
//!
//! Shared library for AirMouse containing the line-oriented wire protocol,
//! the sensor heading filters, and the session domain entities.
//!
//! This crate is the host's socket-free foundation: everything in it runs
//! against in-memory readers and plain values, so the protocol state machine
//! and the filters are fully testable without a network or a desktop.
//!
//! - **`protocol`** – how bytes travel over the network: the handshake and
//!   command grammar, the session state machine (generic over any
//!   [`std::io::BufRead`]), and the UDP discovery probe/reply payloads.
//!
//! - **`filter`** – pure per-sample transforms turning raw sensor readings
//!   into a 2D pointer [`Heading`], one variant per supported sensor.
//!
//! - **`domain`** – the session entity and its connection-state lifecycle.

pub mod domain;
pub mod filter;
pub mod protocol;

pub use domain::session::{Session, SessionId, SessionState};
pub use domain::Heading;
pub use filter::{create_filter, FilterError, HeadingFilter, SensorType};
pub use protocol::{ProtocolError, SessionEvent};
