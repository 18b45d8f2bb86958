//! Discovery probe/reply payloads.
//!
//! A device locates the host by broadcasting a UDP probe on the well-known
//! discovery port; the host answers with its reachable address and the TCP
//! port its connection manager happens to be listening on. Both payloads
//! are ASCII and carry the same magic token as the TCP handshake.

use std::net::IpAddr;

use super::MAGIC_TOKEN;

/// Well-known UDP port devices broadcast probes to.
///
/// This has to stay fixed for discovery to work; the TCP port in the reply
/// is ephemeral.
pub const DISCOVERY_PORT: u16 = 8337;

/// Returns `true` when a datagram payload is a discovery probe.
///
/// The payload must equal `RS-AirMouse discover` exactly after trimming
/// ASCII whitespace and trailing NULs (devices may send fixed-size buffers).
pub fn is_probe(payload: &[u8]) -> bool {
    match std::str::from_utf8(payload) {
        Ok(text) => text.trim_matches(|c: char| c.is_whitespace() || c == '\0')
            == format!("{MAGIC_TOKEN} discover"),
        Err(_) => false,
    }
}

/// Composes the reply payload: `RS-AirMouse <ip> <tcp-port>`.
pub fn format_reply(addr: IpAddr, tcp_port: u16) -> String {
    format!("{MAGIC_TOKEN} {addr} {tcp_port}")
}

// ── Tests ─────────────────────────────────────────────────────────────────────
