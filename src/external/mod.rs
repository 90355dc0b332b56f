//! Clients for the remote services the watcher talks to.

pub mod client;
pub mod reviews;
