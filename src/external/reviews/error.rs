use std::error::Error as _;
use std::io;

use thiserror::Error;

/// Failure of a single long-polling request
#[derive(Error, Debug)]
pub enum PollError {
    /// Timeouts and dropped connections, expected during long polling
    #[error("transient network error: {0}")]
    Transient(#[source] anyhow::Error),

    /// HTTP errors, undecodable payloads and everything else
    #[error("unexpected polling error: {0}")]
    Unexpected(#[source] anyhow::Error),
}

impl PollError {
    pub fn is_transient(&self) -> bool {
        matches!(self, PollError::Transient(_))
    }
}

impl From<reqwest::Error> for PollError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() || error.is_connect() || is_connection_drop(&error) {
            PollError::Transient(error.into())
        } else {
            PollError::Unexpected(error.into())
        }
    }
}

/// The peer went away mid-request
fn is_connection_drop(error: &reqwest::Error) -> bool {
    let mut source = error.source();
    while let Some(cause) = source {
        if let Some(io) = cause.downcast_ref::<io::Error>()
            && matches!(
                io.kind(),
                io::ErrorKind::ConnectionReset
                    | io::ErrorKind::ConnectionAborted
                    | io::ErrorKind::BrokenPipe
                    | io::ErrorKind::UnexpectedEof
            )
        {
            return true;
        }
        source = cause.source();
    }
    false
}
