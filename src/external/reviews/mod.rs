//! dvmn.org review API
//!
//! The watcher sees the API only through [`ReviewSource`]; [`DvmnClient`] is
//! the HTTP implementation.

mod client;
mod error;
mod provider;
mod types;

pub use client::DvmnClient;
pub use error::PollError;
pub use provider::ReviewSource;
pub use types::{Attempt, Cursor, PollResult};
