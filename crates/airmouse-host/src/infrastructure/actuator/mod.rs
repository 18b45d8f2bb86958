//! Pointer actuator backends.
//!
//! Real OS input injection (X11, Windows, macOS) lives outside this crate;
//! any backend that implements
//! [`PointerActuator`](crate::application::motion::PointerActuator) plugs in
//! at construction time. Shipped here are the headless backend the binary
//! wires in and the recording mock the tests use.

pub mod headless;
pub mod mock;
