//! Line grammar: handshake and command parsing.
//!
//! Parsing is separated from the state machine in [`super::session`] so each
//! rule of the grammar is testable as a pure function.

use super::{ProtocolError, MAGIC_TOKEN};

/// A decoded handshake line: `RS-AirMouse <device-name> <sensor-type-id>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handshake {
    pub device_name: String,
    /// Raw wire id; validated against the known sensor types by the
    /// coordinator, not here. An unknown id is still a valid handshake.
    pub sensor_type_id: i32,
}

/// A decoded command line.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// `data <n1>,<n2>[,<n3>]`
    Data(Vec<f64>),
    /// `type <sensor-type-id>`
    Type(i32),
    /// `reset`
    Reset,
    /// `tap on` (press) or `tap <anything else>` (release)
    Tap { is_release: bool },
    /// `quit`, matched against the whole line
    Quit,
    /// Blank line; skipped without comment.
    Empty,
    /// A known command with an unparseable payload; logged and skipped.
    Malformed { command: String, reason: String },
    /// An unknown command; skipped silently for forward compatibility.
    Unknown(String),
}

/// Parses the handshake line.
///
/// # Errors
///
/// Returns [`ProtocolError::Handshake`] when the magic token is missing or
/// wrong, when fields are missing, or when the sensor type id is not an
/// integer. Extra trailing tokens are tolerated.
pub fn parse_handshake(input: &str) -> Result<Handshake, ProtocolError> {
    let mut tokens = input.split_whitespace();

    match tokens.next() {
        Some(token) if token == MAGIC_TOKEN => {}
        _ => {
            return Err(ProtocolError::Handshake(format!(
                "line does not start with {MAGIC_TOKEN:?}: {input:?}"
            )))
        }
    }

    let device_name = tokens
        .next()
        .ok_or_else(|| ProtocolError::Handshake("missing device name".to_string()))?
        .to_string();

    let sensor_type_id = tokens
        .next()
        .ok_or_else(|| ProtocolError::Handshake("missing sensor type id".to_string()))?
        .parse::<i32>()
        .map_err(|e| ProtocolError::Handshake(format!("sensor type id: {e}")))?;

    Ok(Handshake {
        device_name,
        sensor_type_id,
    })
}

/// Parses one command line from an active session.
///
/// Never fails: anything unparseable is folded into [`Command::Malformed`]
/// or [`Command::Unknown`] and left to the session loop's logging policy.
pub fn parse_command(input: &str) -> Command {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Command::Empty;
    }
    if trimmed.eq_ignore_ascii_case("quit") {
        return Command::Quit;
    }

    let (command, remainder) = match trimmed.split_once(char::is_whitespace) {
        Some((cmd, rest)) => (cmd, rest.trim()),
        None => (trimmed, ""),
    };

    match command.to_ascii_lowercase().as_str() {
        "data" => parse_data_payload(remainder),
        "type" => match remainder.parse::<i32>() {
            Ok(id) => Command::Type(id),
            Err(e) => Command::Malformed {
                command: "type".to_string(),
                reason: format!("sensor type id {remainder:?}: {e}"),
            },
        },
        "reset" => Command::Reset,
        "tap" => Command::Tap {
            is_release: !remainder.eq_ignore_ascii_case("on"),
        },
        other => Command::Unknown(other.to_string()),
    }
}

/// Parses the comma-separated payload of a `data` line.
fn parse_data_payload(payload: &str) -> Command {
    let mut values = Vec::with_capacity(3);
    for field in payload.split(',') {
        match field.trim().parse::<f64>() {
            Ok(v) => values.push(v),
            Err(e) => {
                return Command::Malformed {
                    command: "data".to_string(),
                    reason: format!("value {:?}: {e}", field.trim()),
                }
            }
        }
    }

    if !(2..=3).contains(&values.len()) {
        return Command::Malformed {
            command: "data".to_string(),
            reason: format!("expected 2-3 values, got {}", values.len()),
        };
    }

    Command::Data(values)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
