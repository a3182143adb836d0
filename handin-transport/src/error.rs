//! Transport errors

use std::io;
use std::time::Duration;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Not connected")]
    NotConnected,

    #[error("Already connected")]
    AlreadyConnected,

    #[error("Connection to {addr} timed out after {after:?}")]
    ConnectionTimeout { addr: String, after: Duration },

    #[error("Could not connect to {host}: {tried} address(es) tried, last error: {last}")]
    Unreachable {
        host: String,
        tried: usize,
        last: String,
    },

    #[error("No response within {0:?}")]
    ReadTimeout(Duration),

    #[error("Connection closed by server")]
    ConnectionClosed,

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),
}

impl Error {
    /// Check if the server stopped answering rather than the link failing
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::ConnectionTimeout { .. } | Self::ReadTimeout(_))
    }
}
