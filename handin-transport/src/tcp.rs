//! TCP transport

use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use bytes::BytesMut;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, trace, warn};

use crate::{error::*, Transport};

/// Bytes requested per read when not configured
const DEFAULT_RECEIVE_BUFFER: usize = 256;

/// TCP transport to a submission server
pub struct TcpTransport {
    host: String,
    port: u16,
    peer: Option<SocketAddr>,
    stream: Option<TcpStream>,
    connect_timeout: Duration,
    read_timeout: Duration,
    receive_buffer_size: usize,
}

impl TcpTransport {
    /// Create new TCP transport
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            peer: None,
            stream: None,
            connect_timeout: Duration::from_secs(5),
            read_timeout: Duration::from_secs(5),
            receive_buffer_size: DEFAULT_RECEIVE_BUFFER,
        }
    }

    /// Set connection timeout (per address tried)
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the read timeout used when `receive` is given none
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Set how many bytes one read may return
    pub fn with_receive_buffer_size(mut self, size: usize) -> Self {
        self.receive_buffer_size = size.max(1);
        self
    }

    fn target(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Resolve host to every candidate address
    async fn resolve_addrs(&self) -> Result<Vec<SocketAddr>> {
        let target = self.target();

        let addrs: Vec<SocketAddr> = tokio::net::lookup_host(&target)
            .await
            .map_err(|e| Error::InvalidAddress(format!("{}: {}", target, e)))?
            .collect();

        if addrs.is_empty() {
            return Err(Error::InvalidAddress(format!("No addresses found for {}", target)));
        }

        Ok(addrs)
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn connect(&mut self) -> Result<()> {
        if self.is_connected() {
            return Err(Error::AlreadyConnected);
        }

        let addrs = self.resolve_addrs().await?;
        let mut timeouts = 0;
        let mut last = String::new();

        // Try each resolved address in order until one accepts
        for addr in &addrs {
            debug!("Connecting to {}...", addr);

            match timeout(self.connect_timeout, TcpStream::connect(*addr)).await {
                Ok(Ok(stream)) => {
                    // Disable Nagle's algorithm, requests are single small writes
                    stream.set_nodelay(true)?;

                    debug!("Connected to {}", addr);

                    self.peer = Some(*addr);
                    self.stream = Some(stream);
                    return Ok(());
                }
                Ok(Err(e)) => {
                    warn!("Connection to {} failed: {}", addr, e);
                    last = e.to_string();
                }
                Err(_) => {
                    warn!("Connection to {} timed out", addr);
                    timeouts += 1;
                    last = format!("timed out after {:?}", self.connect_timeout);
                }
            }
        }

        if timeouts == addrs.len() {
            return Err(Error::ConnectionTimeout {
                addr: self.target(),
                after: self.connect_timeout,
            });
        }

        Err(Error::Unreachable {
            host: self.target(),
            tried: addrs.len(),
            last,
        })
    }

    async fn disconnect(&mut self) -> Result<()> {
        if let Some(mut stream) = self.stream.take() {
            debug!("Disconnecting from {}...", self.remote_addr());

            // Graceful shutdown
            let _ = stream.shutdown().await;
        }

        self.peer = None;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    async fn send(&mut self, data: &[u8]) -> Result<()> {
        let stream = self.stream.as_mut().ok_or(Error::NotConnected)?;

        trace!("Sending {} bytes: {}", data.len(), hex::encode(&data[..data.len().min(16)]));

        stream.write_all(data).await?;
        stream.flush().await?;

        Ok(())
    }

    async fn receive(&mut self, timeout_duration: Duration) -> Result<BytesMut> {
        let timeout_duration = if timeout_duration.is_zero() {
            self.read_timeout
        } else {
            timeout_duration
        };

        let stream = self.stream.as_mut().ok_or(Error::NotConnected)?;

        let mut buf = BytesMut::with_capacity(self.receive_buffer_size);

        let n = timeout(timeout_duration, stream.read_buf(&mut buf))
            .await
            .map_err(|_| Error::ReadTimeout(timeout_duration))?
            .map_err(Error::Io)?;

        if n == 0 {
            return Err(Error::ConnectionClosed);
        }

        trace!("Received {} bytes: {}", n, hex::encode(&buf[..n.min(16)]));

        Ok(buf)
    }

    fn remote_addr(&self) -> String {
        self.peer
            .map(|addr| addr.to_string())
            .unwrap_or_else(|| self.target())
    }
}

impl Drop for TcpTransport {
    fn drop(&mut self) {
        if self.is_connected() {
            warn!("TCP transport dropped while still connected");
        }
    }
}
