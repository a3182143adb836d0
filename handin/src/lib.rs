//! # handin
//!
//! Client for the assignment submission protocol: log in, submit a
//! repository, log out, over one TCP connection.
//!
//! ## Features
//!
//! - Fixed-layout binary frames with one's-complement checksums
//! - Multi-frame response scanning that survives corrupt frames
//! - Explicit session state machine
//! - Async/await API using Tokio, with read timeouts
//!
//! ## Quick Start
//!
//! ```no_run
//! use handin::{Client, ClientConfig, Credentials};
//!
//! #[tokio::main]
//! async fn main() -> handin::Result<()> {
//!     let mut client = Client::new(ClientConfig::new("submit.example.org", 4000));
//!
//!     let receipt = client
//!         .run(Credentials::new("ada@example.org", "secret", "Ada", "https://git/ada"))
//!         .await?;
//!
//!     println!("Token: {}", receipt.token);
//!     println!("{}", receipt.logout_reason);
//!
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;

// Re-exports
pub use client::{Client, Receipt};
pub use config::ClientConfig;
pub use error::{Error, Result};

// Re-export protocol types
pub use handin_core::{Credentials, Request, ResponseBody, Session, SessionState};
