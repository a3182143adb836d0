//! Protocol constants

/// Default connection timeout (seconds)
pub const DEFAULT_CONNECT_TIMEOUT: u64 = 5;

/// Default read timeout (seconds)
pub const DEFAULT_READ_TIMEOUT: u64 = 5;

/// Bytes requested per socket read
pub const RECEIVE_CHUNK_SIZE: usize = 256;

/// Upper bound on one accumulated response
pub const MAX_RESPONSE_SIZE: usize = 64 * 1024;

/// Login acknowledgement flag meaning "accepted"
pub const LOGIN_ACCEPTED: u8 = b'Y';

/// Frame field layout
///
/// Every frame starts with the same 13-byte header:
///
/// ```text
/// ┌────────┬─────────────────┬──────────────────────────┬──────────┬───────────┐
/// │  Type  │ Length (LE u16) │    Timestamp (LE u64)    │ Checksum │  Payload  │
/// │ 0:1    │ 1:2             │ 3:8                      │ 11:2     │ 13:...    │
/// └────────┴─────────────────┴──────────────────────────┴──────────┴───────────┘
/// ```
///
/// The length is written as a 4-byte word at offset 1 and the timestamp
/// written afterwards overlays its upper half, so only bytes 1..3 carry
/// the length on the wire. Readers use [`DECLARED_LENGTH`](layout::DECLARED_LENGTH).
pub mod layout {
    use std::ops::Range;

    /// A fixed-width byte range within a frame
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Slot {
        pub name: &'static str,
        pub offset: usize,
        pub width: usize,
    }

    impl Slot {
        pub const fn new(name: &'static str, offset: usize, width: usize) -> Self {
            Self { name, offset, width }
        }

        pub const fn end(&self) -> usize {
            self.offset + self.width
        }

        pub fn range(&self) -> Range<usize> {
            self.offset..self.end()
        }
    }

    pub const TYPE: Slot = Slot::new("type", 0, 1);

    /// Length as written by the encoder
    pub const LENGTH: Slot = Slot::new("length", 1, 4);

    /// Length as it survives on the wire
    pub const DECLARED_LENGTH: Slot = Slot::new("length", 1, 2);

    pub const TIMESTAMP: Slot = Slot::new("timestamp", 3, 8);
    pub const CHECKSUM: Slot = Slot::new("checksum", 11, 2);

    /// Common header size
    pub const HEADER_LEN: usize = 13;

    // Login request
    pub const LOGIN_EMAIL: Slot = Slot::new("email", 13, 64);
    pub const LOGIN_PASSWORD: Slot = Slot::new("password", 77, 32);

    // Submission request
    pub const SUBMISSION_NAME: Slot = Slot::new("name", 13, 64);
    pub const SUBMISSION_EMAIL: Slot = Slot::new("email", 77, 64);
    pub const SUBMISSION_REPO: Slot = Slot::new("repo", 141, 64);

    // Responses
    pub const LOGIN_FLAG: Slot = Slot::new("flag", 13, 1);
    pub const REASON: Slot = Slot::new("reason", 13, 32);
    pub const TOKEN: Slot = Slot::new("token", 13, 32);
}

/// Total frame lengths
pub mod frame_len {
    pub const LOGIN: usize = 109;
    pub const SUBMISSION: usize = 205;
    pub const LOGOUT: usize = 13;
    pub const LOGIN_ACK: usize = 46;
    pub const REASON: usize = 45;
    pub const SUBMISSION_ACK: usize = 45;
}
