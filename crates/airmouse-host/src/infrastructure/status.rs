//! Tracing-backed status listener.
//!
//! The real status window lives outside this crate; headless runs still
//! want connection and heading activity visible, so this adapter forwards
//! every notification to the log.

use airmouse_core::{Heading, Session};
use tracing::{info, trace, warn};

use crate::application::coordinator::StatusListener;

/// Reports status notifications through `tracing`.
pub struct TracingStatusListener;

impl StatusListener for TracingStatusListener {
    fn client_connected(&self, session: &Session) {
        let sensor = session
            .sensor_type
            .map(|t| t.to_string())
            .unwrap_or_else(|| "unknown sensor".to_string());
        info!(
            "connected: {} from {} using {}",
            session.device_name, session.peer, sensor
        );
    }

    fn client_disconnected(&self) {
        info!("disconnected");
    }

    fn connection_error(&self, cause: &str) {
        warn!("connection error: {cause}");
    }

    fn heading_changed(&self, heading: Heading) {
        trace!("heading ({:+.2}, {:+.2})", heading.x, heading.y);
    }
}
