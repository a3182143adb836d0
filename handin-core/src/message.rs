//! Message type tags

use std::fmt;

use crate::constants::frame_len;
use crate::error::{Error, Result};

/// Single-byte message type carried at offset 0 of every frame
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MessageType {
    // Requests (client to server)
    Login = b'L',
    Submission = b'S',
    Logout = b'O',

    // Responses (server to client)
    LoginAck = b'E',
    /// Rejection on login/submission, and the logout acknowledgement
    Reason = b'G',
    SubmissionAck = b'R',
}

impl MessageType {
    /// Check if this is a request (from client to server)
    pub fn is_request(self) -> bool {
        matches!(self, Self::Login | Self::Submission | Self::Logout)
    }

    /// Check if this is a response (from server to client)
    pub fn is_response(self) -> bool {
        !self.is_request()
    }

    /// The fixed total length of frames of this type
    pub fn frame_len(self) -> usize {
        match self {
            Self::Login => frame_len::LOGIN,
            Self::Submission => frame_len::SUBMISSION,
            Self::Logout => frame_len::LOGOUT,
            Self::LoginAck => frame_len::LOGIN_ACK,
            Self::Reason => frame_len::REASON,
            Self::SubmissionAck => frame_len::SUBMISSION_ACK,
        }
    }

    /// Get message name
    pub fn name(self) -> &'static str {
        match self {
            Self::Login => "LOGIN",
            Self::Submission => "SUBMISSION",
            Self::Logout => "LOGOUT",
            Self::LoginAck => "LOGIN_ACK",
            Self::Reason => "REASON",
            Self::SubmissionAck => "SUBMISSION_ACK",
        }
    }
}

impl From<MessageType> for u8 {
    fn from(kind: MessageType) -> u8 {
        kind as u8
    }
}

impl TryFrom<u8> for MessageType {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            b'L' => Ok(Self::Login),
            b'S' => Ok(Self::Submission),
            b'O' => Ok(Self::Logout),
            b'E' => Ok(Self::LoginAck),
            b'G' => Ok(Self::Reason),
            b'R' => Ok(Self::SubmissionAck),
            _ => Err(Error::UnknownMessageType(value)),
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}('{}')", self.name(), *self as u8 as char)
    }
}
