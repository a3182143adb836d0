//! # handin-core
//!
//! Core protocol implementation for the assignment submission exchange.
//!
//! This crate provides the protocol primitives, with no I/O:
//! - Checksum calculation
//! - Message types and the frame layout table
//! - Request encoding and response decoding
//! - Scanning of multi-frame response buffers
//! - The login → submit → logout session state machine

pub mod checksum;
pub mod constants;
pub mod error;
pub mod frame;
pub mod message;
pub mod scanner;
pub mod session;

pub use checksum::checksum16;
pub use error::{Error, Result};
pub use frame::{FrameHeader, Request, ResponseBody, ResponseFrame, timestamp_now};
pub use message::MessageType;
pub use scanner::{FrameScanner, pending_bytes, scan};
pub use session::{Credentials, Outcome, Session, SessionState};
