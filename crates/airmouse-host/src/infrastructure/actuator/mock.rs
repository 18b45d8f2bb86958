//! Mock pointer actuator for unit testing.
//!
//! A real actuator moves the cursor on the machine running the tests and
//! cannot be observed from test code, so the mock replaces the OS calls
//! with in-memory recording: every emitted move and button event is pushed
//! into a `Mutex<Vec<...>>` for later assertions, and `move_to` feeds back
//! into `current_position` so the motion loop integrates over it like a
//! real screen.
//!
//! Flip `should_fail` to make every call return an error and exercise the
//! callers' error-handling paths.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::application::motion::{ActuatorError, PointerActuator};

/// A pointer actuator that records all calls instead of touching the OS.
pub struct MockPointerActuator {
    screen: (u32, u32),
    position: Mutex<(i32, i32)>,
    /// Every position passed to `move_to`, in order.
    pub moves: Mutex<Vec<(i32, i32)>>,
    /// Button events, in order: `true` for press, `false` for release.
    pub buttons: Mutex<Vec<bool>>,
    should_fail: AtomicBool,
}

impl MockPointerActuator {
    /// Creates a mock over a virtual screen, pointer at the origin.
    pub fn new(screen: (u32, u32)) -> Self {
        Self::with_position(screen, (0, 0))
    }

    /// Creates a mock with the pointer at a given starting position.
    pub fn with_position(screen: (u32, u32), position: (i32, i32)) -> Self {
        Self {
            screen,
            position: Mutex::new(position),
            moves: Mutex::new(Vec::new()),
            buttons: Mutex::new(Vec::new()),
            should_fail: AtomicBool::new(false),
        }
    }

    /// Makes every subsequent call fail (or succeed again with `false`).
    pub fn set_should_fail(&self, fail: bool) {
        self.should_fail.store(fail, Ordering::Relaxed);
    }

    /// The pointer position as of the last `move_to`.
    pub fn position(&self) -> (i32, i32) {
        *self.position.lock().unwrap()
    }

    fn check(&self) -> Result<(), ActuatorError> {
        if self.should_fail.load(Ordering::Relaxed) {
            return Err(ActuatorError::Backend("mock failure".to_string()));
        }
        Ok(())
    }
}

impl PointerActuator for MockPointerActuator {
    fn current_position(&self) -> Result<(i32, i32), ActuatorError> {
        self.check()?;
        Ok(*self.position.lock().unwrap())
    }

    fn screen_size(&self) -> Result<(u32, u32), ActuatorError> {
        self.check()?;
        Ok(self.screen)
    }

    fn move_to(&self, x: i32, y: i32) -> Result<(), ActuatorError> {
        self.check()?;
        *self.position.lock().unwrap() = (x, y);
        self.moves.lock().unwrap().push((x, y));
        Ok(())
    }

    fn press(&self) -> Result<(), ActuatorError> {
        self.check()?;
        self.buttons.lock().unwrap().push(true);
        Ok(())
    }

    fn release(&self) -> Result<(), ActuatorError> {
        self.check()?;
        self.buttons.lock().unwrap().push(false);
        Ok(())
    }
}
