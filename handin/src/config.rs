//! Client configuration
//!
//! Centralized configuration with sensible defaults.

use std::time::Duration;

use handin_core::constants::{
    DEFAULT_CONNECT_TIMEOUT, DEFAULT_READ_TIMEOUT, MAX_RESPONSE_SIZE, RECEIVE_CHUNK_SIZE,
};

/// Client configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Server host name or address
    pub host: String,

    /// Server port
    pub port: u16,

    /// Time allowed to establish the connection, per resolved address
    pub connect_timeout: Duration,

    /// Time allowed for each read while waiting on a response
    pub read_timeout: Duration,

    /// Bytes requested per socket read
    pub receive_buffer_size: usize,

    /// Largest response accepted before giving up
    pub max_response_size: usize,
}

impl ClientConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT),
            read_timeout: Duration::from_secs(DEFAULT_READ_TIMEOUT),
            receive_buffer_size: RECEIVE_CHUNK_SIZE,
            max_response_size: MAX_RESPONSE_SIZE,
        }
    }

    /// Set connection timeout
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set read timeout
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Set read chunk size
    pub fn with_receive_buffer_size(mut self, size: usize) -> Self {
        self.receive_buffer_size = size;
        self
    }

    /// Set response size cap
    pub fn with_max_response_size(mut self, size: usize) -> Self {
        self.max_response_size = size;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new("127.0.0.1", 0)
    }
}
