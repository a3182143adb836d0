//! High-level submission client

use bytes::BytesMut;
use tracing::{debug, info, trace, warn};

use handin_core::{Credentials, Request, Session, SessionState, pending_bytes, timestamp_now};
use handin_transport::{TcpTransport, Transport};

use crate::config::ClientConfig;
use crate::error::{Error, Result};

/// What a completed exchange returned
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    /// Token issued for the submission
    pub token: String,

    /// Reason text sent with the logout acknowledgement
    pub logout_reason: String,
}

/// Submission client
///
/// Runs one login → submit → logout exchange per call to [`Client::run`].
///
/// # Examples
///
/// ```no_run
/// use handin::{Client, ClientConfig, Credentials};
///
/// #[tokio::main]
/// async fn main() -> handin::Result<()> {
///     let mut client = Client::new(ClientConfig::new("submit.example.org", 4000));
///
///     let credentials = Credentials::new("ada@example.org", "secret", "Ada", "https://git/ada");
///     let receipt = client.run(credentials).await?;
///     println!("Token: {}", receipt.token);
///
///     Ok(())
/// }
/// ```
pub struct Client {
    transport: Box<dyn Transport>,
    config: ClientConfig,
    session: Option<Session>,
}

impl Client {
    /// Create a client using TCP transport
    pub fn new(config: ClientConfig) -> Self {
        let transport = TcpTransport::new(config.host.clone(), config.port)
            .with_connect_timeout(config.connect_timeout)
            .with_read_timeout(config.read_timeout)
            .with_receive_buffer_size(config.receive_buffer_size);

        Self::with_transport(Box::new(transport), config)
    }

    /// Create a client over an existing transport
    pub fn with_transport(transport: Box<dyn Transport>, config: ClientConfig) -> Self {
        Self {
            transport,
            config,
            session: None,
        }
    }

    /// Check if connected
    pub fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }

    /// The most recent session, if any
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// State of the most recent session
    pub fn session_state(&self) -> Option<SessionState> {
        self.session.as_ref().map(Session::state)
    }

    /// Run the full exchange
    ///
    /// The connection is closed before returning, whatever the outcome.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - The connection cannot be made or drops
    /// - The server does not answer within the read timeout
    /// - The server rejects the login or the submission
    /// - A value does not fit its protocol field
    pub async fn run(&mut self, credentials: Credentials) -> Result<Receipt> {
        info!("Connecting to {}...", self.transport.remote_addr());

        let mut session = Session::new(credentials);
        let result = self.exchange(&mut session).await;

        if let Err(e) = &result {
            session.fail(e.to_string());
        }

        if let Err(e) = self.transport.disconnect().await {
            warn!("Failed to disconnect: {}", e);
        }

        self.session = Some(session);
        result
    }

    async fn exchange(&mut self, session: &mut Session) -> Result<Receipt> {
        self.transport.connect().await?;
        info!("Connected to {}", self.transport.remote_addr());

        while !session.is_finished() {
            let request = session.next_request()?;
            self.send_request(&request).await?;

            let response = self.read_response(session).await?;
            let outcome = session.handle_response(&response)?;

            debug!("Step complete: {:?}", outcome);
        }

        Ok(Receipt {
            token: session.token().unwrap_or_default().to_string(),
            logout_reason: session.logout_reason().unwrap_or_default().to_string(),
        })
    }

    // Helper methods

    async fn send_request(&mut self, request: &Request) -> Result<()> {
        trace!("Sending: {:?}", request);

        let frame = request.encode(timestamp_now())?;
        self.transport.send(&frame).await?;

        info!("{} request sent", request.kind().name());
        Ok(())
    }

    /// Read until the buffer holds only whole frames
    ///
    /// Stops early once the frames read so far settle the step, so bytes
    /// trailing a deciding frame are not waited for.
    async fn read_response(&mut self, session: &Session) -> Result<BytesMut> {
        let mut buf = BytesMut::new();

        loop {
            let chunk = self.transport.receive(self.config.read_timeout).await?;
            buf.extend_from_slice(&chunk);

            if buf.len() > self.config.max_response_size {
                return Err(Error::ResponseTooLarge {
                    max: self.config.max_response_size,
                });
            }

            let missing = pending_bytes(&buf);
            if missing == 0 {
                trace!("Received {} response bytes", buf.len());
                return Ok(buf);
            }

            if session.is_settled_by(&buf) {
                debug!(
                    received = buf.len(),
                    missing,
                    "Response settled, ignoring trailing bytes"
                );
                return Ok(buf);
            }

            debug!(received = buf.len(), missing, "Partial response, reading more");
        }
    }
}
