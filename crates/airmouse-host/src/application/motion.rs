//! The motion controller: turns heading setpoints into smooth pointer
//! movement.
//!
//! Sensor updates arrive irregularly and can be sparse or bursty. Moving the
//! pointer directly on every sample would make the cursor jump; instead the
//! controller holds the latest heading as a setpoint and animates toward it
//! on a fixed short cadence from a dedicated thread. A setpoint that has not
//! been refreshed for a second is considered stale and stops the animation,
//! so a frozen or disconnected device cannot produce runaway motion.
//!
//! The pointer itself is reached only through the [`PointerActuator`]
//! capability, which keeps OS input injection out of this crate and lets
//! tests substitute a recording mock.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use airmouse_core::Heading;
use thiserror::Error;
use tracing::{debug, warn};

/// Error type for pointer actuation.
#[derive(Debug, Error)]
pub enum ActuatorError {
    /// The underlying pointer backend rejected the operation.
    #[error("pointer actuator failure: {0}")]
    Backend(String),
}

/// Capability for reading and driving the on-screen pointer.
///
/// Real implementations wrap an OS input API; the crate ships a headless
/// implementation and a recording mock.
pub trait PointerActuator: Send + Sync {
    /// Current pointer position in pixels, origin at the top-left.
    fn current_position(&self) -> Result<(i32, i32), ActuatorError>;

    /// Screen dimensions in pixels.
    fn screen_size(&self) -> Result<(u32, u32), ActuatorError>;

    /// Moves the pointer to an absolute position.
    fn move_to(&self, x: i32, y: i32) -> Result<(), ActuatorError>;

    /// Presses the primary pointer button.
    fn press(&self) -> Result<(), ActuatorError>;

    /// Releases the primary pointer button.
    fn release(&self) -> Result<(), ActuatorError>;
}

/// A setpoint older than this is stale: the loop idles instead of moving.
const STALE_AFTER: Duration = Duration::from_millis(1000);

/// Re-check interval while the setpoint is stale.
const STALE_POLL: Duration = Duration::from_millis(100);

/// Animation cadence while the setpoint is fresh.
const STEP_INTERVAL: Duration = Duration::from_millis(10);

/// The heading setpoint together with its freshness timestamp.
///
/// `updated_at` is `None` until the first `set_heading` call, which reads
/// as "stale" without needing a fake epoch.
#[derive(Debug, Clone, Copy, Default)]
struct Setpoint {
    heading: Heading,
    updated_at: Option<Instant>,
}

/// State shared between the controller handle and its loop thread.
struct Shared {
    setpoint: Mutex<Setpoint>,
    running: AtomicBool,
}

/// Owns the smoothing loop and the current heading setpoint.
pub struct MotionController {
    actuator: Arc<dyn PointerActuator>,
    shared: Arc<Shared>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl MotionController {
    /// Creates a controller over the given actuator. The loop is not
    /// started; the first `set_heading` (or an explicit `start`) does that.
    pub fn new(actuator: Arc<dyn PointerActuator>) -> Self {
        Self {
            actuator,
            shared: Arc::new(Shared {
                setpoint: Mutex::new(Setpoint::default()),
                running: AtomicBool::new(false),
            }),
            worker: Mutex::new(None),
        }
    }

    /// Stores a new heading setpoint and refreshes its timestamp, starting
    /// the background loop if it is not already running. Non-blocking.
    pub fn set_heading(&self, x: f64, y: f64) {
        {
            let mut setpoint = self.shared.setpoint.lock().unwrap();
            setpoint.heading = Heading::new(x, y);
            setpoint.updated_at = Some(Instant::now());
        }
        self.start();
    }

    /// Presses the pointer button immediately; the loop need not be running.
    ///
    /// # Errors
    ///
    /// Propagates the actuator failure; callers log and carry on.
    pub fn press(&self) -> Result<(), ActuatorError> {
        self.actuator.press()
    }

    /// Releases the pointer button immediately; the loop need not be
    /// running.
    ///
    /// # Errors
    ///
    /// Propagates the actuator failure; callers log and carry on.
    pub fn release(&self) -> Result<(), ActuatorError> {
        self.actuator.release()
    }

    /// Starts the smoothing loop. Idempotent.
    pub fn start(&self) {
        let mut worker = self.worker.lock().unwrap();
        if worker.is_some() {
            return;
        }
        self.shared.running.store(true, Ordering::Relaxed);

        let actuator = Arc::clone(&self.actuator);
        let shared = Arc::clone(&self.shared);
        let handle = std::thread::Builder::new()
            .name("airmouse-motion".to_string())
            .spawn(move || motion_loop(actuator, shared))
            .expect("failed to spawn motion thread");
        *worker = Some(handle);
    }

    /// Stops the smoothing loop and joins its thread, so no background
    /// activity survives the call. Idempotent, callable from any thread.
    pub fn stop(&self) {
        self.shared.running.store(false, Ordering::Relaxed);
        let handle = self.worker.lock().unwrap().take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                warn!("motion loop thread panicked");
            }
        }
    }

    /// Returns `true` while the smoothing loop is running.
    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::Relaxed) && self.worker.lock().unwrap().is_some()
    }
}

/// The smoothing loop body, executed on the dedicated thread.
fn motion_loop(actuator: Arc<dyn PointerActuator>, shared: Arc<Shared>) {
    debug!("motion loop started");
    while shared.running.load(Ordering::Relaxed) {
        let setpoint = *shared.setpoint.lock().unwrap();

        let fresh = setpoint
            .updated_at
            .is_some_and(|at| at.elapsed() <= STALE_AFTER);
        if !fresh {
            // No input recently: idle without touching the pointer.
            std::thread::sleep(STALE_POLL);
            continue;
        }

        if let Err(e) = step(actuator.as_ref(), setpoint.heading) {
            // One failed actuation must not end the smoothing loop.
            warn!("pointer actuation failed: {e}");
        }
        std::thread::sleep(STEP_INTERVAL);
    }
    debug!("motion loop stopped");
}

/// One animation step: read the pointer, advance it by the heading, wrap.
fn step(actuator: &dyn PointerActuator, heading: Heading) -> Result<(), ActuatorError> {
    let position = actuator.current_position()?;
    let screen = actuator.screen_size()?;
    let (x, y) = next_position(position, screen, heading);
    actuator.move_to(x, y)
}

/// Advances a position by a heading, wrapping modulo the screen size.
///
/// A negative wrap clamps to the screen dimension itself rather than
/// producing a negative coordinate.
pub(crate) fn next_position(
    position: (i32, i32),
    screen: (u32, u32),
    heading: Heading,
) -> (i32, i32) {
    fn advance(pos: i32, delta: f64, dim: u32) -> i32 {
        let next = ((pos as f64 + delta).round() as i64) % i64::from(dim);
        if next < 0 {
            dim as i32
        } else {
            next as i32
        }
    }
    (
        advance(position.0, heading.x, screen.0),
        advance(position.1, heading.y, screen.1),
    )
}

// ── Tests ─────────────────────────────────────────────────────────────────────
