//! Headless pointer actuator.
//!
//! Tracks the pointer over an in-memory screen of the configured size and
//! logs every actuation. This is what the binary runs with when no OS
//! backend is wired in, and it keeps the whole host exercisable on servers
//! and in CI.

use std::sync::Mutex;

use tracing::debug;

use crate::application::motion::{ActuatorError, PointerActuator};

/// An in-memory pointer over a configured screen size.
pub struct HeadlessPointerActuator {
    screen: (u32, u32),
    position: Mutex<(i32, i32)>,
}

impl HeadlessPointerActuator {
    /// Creates the actuator with the pointer centred on the screen.
    pub fn new(screen: (u32, u32)) -> Self {
        let centre = (screen.0 as i32 / 2, screen.1 as i32 / 2);
        Self {
            screen,
            position: Mutex::new(centre),
        }
    }
}

impl PointerActuator for HeadlessPointerActuator {
    fn current_position(&self) -> Result<(i32, i32), ActuatorError> {
        Ok(*self.position.lock().unwrap())
    }

    fn screen_size(&self) -> Result<(u32, u32), ActuatorError> {
        Ok(self.screen)
    }

    fn move_to(&self, x: i32, y: i32) -> Result<(), ActuatorError> {
        *self.position.lock().unwrap() = (x, y);
        debug!("pointer -> ({x}, {y})");
        Ok(())
    }

    fn press(&self) -> Result<(), ActuatorError> {
        debug!("pointer button pressed");
        Ok(())
    }

    fn release(&self) -> Result<(), ActuatorError> {
        debug!("pointer button released");
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
