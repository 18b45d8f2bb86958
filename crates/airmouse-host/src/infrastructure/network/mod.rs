//! Network services: the TCP connection manager and the UDP discovery
//! responder. Both run their blocking socket loops on dedicated threads and
//! are cancelled cooperatively through a shared running flag.

pub mod connection_manager;
pub mod discovery;
