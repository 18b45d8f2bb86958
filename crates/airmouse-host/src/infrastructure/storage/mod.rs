//! Persistence: the TOML configuration file.

pub mod config;
