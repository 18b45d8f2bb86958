//! Application layer: the motion controller and the session coordinator,
//! plus the capability traits they consume. OS and socket specifics live in
//! the infrastructure layer.

pub mod coordinator;
pub mod motion;
