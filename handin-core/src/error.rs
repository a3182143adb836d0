//! Error types for handin-core



/// Result type alias for handin operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core protocol errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Target buffer cannot hold the frame being encoded
    #[error("Buffer too small: frame needs {needed} bytes, buffer holds {capacity} bytes")]
    BufferTooSmall {
        needed: usize,
        capacity: usize,
    },

    /// Text value does not fit its fixed-width slot
    #[error("Field '{field}' too long: {len} bytes (max: {max} bytes)")]
    FieldTooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },

    /// Frame is shorter than the common header
    #[error("Frame too short: expected at least {expected} bytes, got {actual} bytes")]
    FrameTooShort {
        expected: usize,
        actual: usize,
    },

    /// Declared length runs past the bytes available
    #[error("Frame truncated: declared {declared} bytes, only {available} available")]
    FrameTruncated {
        declared: usize,
        available: usize,
    },

    /// Checksum verification failed
    #[error("Checksum mismatch: expected 0x{expected:04X}, received 0x{received:04X}")]
    ChecksumMismatch {
        expected: u16,
        received: u16,
    },

    /// Unknown message type tag
    #[error("Unknown message type: 0x{0:02X}")]
    UnknownMessageType(u8),

    /// Known tag, but not with this length or not in this direction
    #[error("Unrecognized frame: {kind} with length {length}")]
    UnrecognizedFrame {
        kind: crate::message::MessageType,
        length: usize,
    },

    /// Login acknowledgement without the success flag
    #[error("Login not accepted (flag 0x{flag:02X})")]
    LoginNotAccepted {
        flag: u8,
    },

    /// Server answered with a reason frame instead of an acknowledgement
    #[error("Rejected by server: {reason}")]
    Rejected {
        reason: String,
    },

    /// Response contained no frame that settles the current step
    #[error("No {expected} in response")]
    MissingResponse {
        expected: &'static str,
    },

    /// Invalid session state
    #[error("Invalid session state: {0}")]
    InvalidSessionState(String),
}

impl Error {
    /// Server-supplied reason text, if this is a rejection
    pub fn rejection_reason(&self) -> Option<&str> {
        match self {
            Self::Rejected { reason } => Some(reason),
            _ => None,
        }
    }
}
