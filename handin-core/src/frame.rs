//! Frame codec: request encoding and response decoding

use byteorder::{ByteOrder, LittleEndian};
use bytes::BytesMut;
use std::fmt;
use tracing::{debug, trace};

use crate::{
    checksum,
    constants::{LOGIN_ACCEPTED, layout::{self, Slot}},
    error::{Error, Result},
    message::MessageType,
};

/// Timestamp for a new frame
///
/// The nanosecond component of the current wall-clock time. Only used to
/// make frames distinct, never interpreted as an absolute time.
pub fn timestamp_now() -> u64 {
    chrono::Utc::now().timestamp_subsec_nanos() as u64
}

/// Peek at the declared length of the frame starting at `buf[0]`
///
/// Returns `None` while fewer than three bytes are available.
pub fn declared_length(buf: &[u8]) -> Option<usize> {
    buf.get(layout::DECLARED_LENGTH.range())
        .map(|raw| LittleEndian::read_u16(raw) as usize)
}

/// Header common to every frame
///
/// # Frame Structure
///
/// ```text
/// ┌────────┬──────────┬─────────────┬──────────┬──────────────────────┐
/// │  Type  │  Length  │  Timestamp  │ Checksum │  Fixed-width slots   │
/// │ 1 byte │ 2 bytes  │   8 bytes   │ 2 bytes  │  (type-dependent)    │
/// └────────┴──────────┴─────────────┴──────────┴──────────────────────┘
/// ```
///
/// All multi-byte values are in little-endian format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub kind: MessageType,
    pub length: u16,
    pub timestamp: u64,
    pub checksum: u16,
}

impl FrameHeader {
    /// Parse the header fields without validating the frame
    pub fn parse(frame: &[u8]) -> Result<Self> {
        if frame.len() < layout::HEADER_LEN {
            return Err(Error::FrameTooShort {
                expected: layout::HEADER_LEN,
                actual: frame.len(),
            });
        }

        Ok(Self {
            kind: MessageType::try_from(frame[layout::TYPE.offset])?,
            length: LittleEndian::read_u16(&frame[layout::DECLARED_LENGTH.range()]),
            timestamp: LittleEndian::read_u64(&frame[layout::TIMESTAMP.range()]),
            checksum: checksum::stored(frame),
        })
    }

    /// Parse and validate one whole frame
    ///
    /// The declared length must be the fixed length of the type and must
    /// match the slice exactly, and the checksum must verify.
    pub fn validate(frame: &[u8]) -> Result<Self> {
        let header = Self::parse(frame)?;
        let declared = header.length as usize;

        if declared != header.kind.frame_len() {
            return Err(Error::UnrecognizedFrame {
                kind: header.kind,
                length: declared,
            });
        }

        if frame.len() < declared {
            return Err(Error::FrameTruncated {
                declared,
                available: frame.len(),
            });
        }

        if frame.len() > declared {
            return Err(Error::UnrecognizedFrame {
                kind: header.kind,
                length: frame.len(),
            });
        }

        checksum::verify_frame(frame)?;

        Ok(header)
    }
}

/// Write one frame into `buf`
///
/// Zeroes the frame region, writes the header and the text slots, then
/// seals it with the checksum. The checksum slot is still zero from the
/// initial clear when the sum is taken.
fn write_frame(
    buf: &mut [u8],
    kind: MessageType,
    timestamp: u64,
    fields: &[(Slot, &[u8])],
) -> Result<usize> {
    let len = kind.frame_len();

    if buf.len() < len {
        return Err(Error::BufferTooSmall {
            needed: len,
            capacity: buf.len(),
        });
    }

    // Reject before touching the buffer
    for (slot, value) in fields {
        if value.len() > slot.width {
            return Err(Error::FieldTooLong {
                field: slot.name,
                len: value.len(),
                max: slot.width,
            });
        }
    }

    let frame = &mut buf[..len];
    frame.fill(0);

    frame[layout::TYPE.offset] = kind.into();
    LittleEndian::write_u32(&mut frame[layout::LENGTH.range()], len as u32);
    // Overlays the upper half of the length word
    LittleEndian::write_u64(&mut frame[layout::TIMESTAMP.range()], timestamp);

    for (slot, value) in fields {
        frame[slot.offset..slot.offset + value.len()].copy_from_slice(value);
    }

    let sum = checksum::checksum16(frame);
    LittleEndian::write_u16(&mut frame[layout::CHECKSUM.range()], sum);

    trace!(kind = %kind, len, frame = %hex::encode(&frame[..layout::HEADER_LEN]), "Encoded frame header");

    Ok(len)
}

/// Read a NUL-padded text slot
///
/// Stops at the first NUL or at the slot end, whichever comes first.
fn read_text(frame: &[u8], slot: Slot) -> String {
    let raw = &frame[slot.range()];
    let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
    String::from_utf8_lossy(&raw[..end]).into_owned()
}

/// Client request
///
/// # Examples
///
/// ```
/// use handin_core::Request;
///
/// let request = Request::login("a@b.com", "pw");
/// let frame = request.encode(0).unwrap();
/// assert_eq!(frame.len(), 109);
///
/// let decoded = Request::decode(&frame).unwrap();
/// assert_eq!(decoded, request);
/// ```
#[derive(Clone, PartialEq, Eq)]
pub enum Request {
    Login {
        email: String,
        password: String,
    },
    Submission {
        name: String,
        email: String,
        repo: String,
    },
    Logout,
}

impl Request {
    pub fn login(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self::Login {
            email: email.into(),
            password: password.into(),
        }
    }

    pub fn submission(
        name: impl Into<String>,
        email: impl Into<String>,
        repo: impl Into<String>,
    ) -> Self {
        Self::Submission {
            name: name.into(),
            email: email.into(),
            repo: repo.into(),
        }
    }

    pub fn kind(&self) -> MessageType {
        match self {
            Self::Login { .. } => MessageType::Login,
            Self::Submission { .. } => MessageType::Submission,
            Self::Logout => MessageType::Logout,
        }
    }

    /// Total encoded length
    pub fn frame_len(&self) -> usize {
        self.kind().frame_len()
    }

    fn fields(&self) -> Vec<(Slot, &[u8])> {
        match self {
            Self::Login { email, password } => vec![
                (layout::LOGIN_EMAIL, email.as_bytes()),
                (layout::LOGIN_PASSWORD, password.as_bytes()),
            ],
            Self::Submission { name, email, repo } => vec![
                (layout::SUBMISSION_NAME, name.as_bytes()),
                (layout::SUBMISSION_EMAIL, email.as_bytes()),
                (layout::SUBMISSION_REPO, repo.as_bytes()),
            ],
            Self::Logout => Vec::new(),
        }
    }

    /// Encode into the front of `buf`, returning the frame length
    ///
    /// # Errors
    ///
    /// - [`Error::BufferTooSmall`] if `buf` cannot hold the frame
    /// - [`Error::FieldTooLong`] if a text value exceeds its slot
    ///
    /// Nothing is written when an error is returned.
    pub fn encode_into(&self, buf: &mut [u8], timestamp: u64) -> Result<usize> {
        write_frame(buf, self.kind(), timestamp, &self.fields())
    }

    /// Encode to a freshly allocated frame
    pub fn encode(&self, timestamp: u64) -> Result<BytesMut> {
        let mut buf = BytesMut::zeroed(self.frame_len());
        self.encode_into(&mut buf, timestamp)?;
        Ok(buf)
    }

    /// Decode and validate one request frame
    pub fn decode(frame: &[u8]) -> Result<Self> {
        let header = FrameHeader::validate(frame)?;

        let request = match header.kind {
            MessageType::Login => Self::Login {
                email: read_text(frame, layout::LOGIN_EMAIL),
                password: read_text(frame, layout::LOGIN_PASSWORD),
            },
            MessageType::Submission => Self::Submission {
                name: read_text(frame, layout::SUBMISSION_NAME),
                email: read_text(frame, layout::SUBMISSION_EMAIL),
                repo: read_text(frame, layout::SUBMISSION_REPO),
            },
            MessageType::Logout => Self::Logout,
            kind => {
                return Err(Error::UnrecognizedFrame {
                    kind,
                    length: frame.len(),
                });
            }
        };

        debug!("Decoded {}", request);

        Ok(request)
    }
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Login { email, .. } => f
                .debug_struct("Login")
                .field("email", email)
                .field("password", &"<redacted>")
                .finish(),
            Self::Submission { name, email, repo } => f
                .debug_struct("Submission")
                .field("name", name)
                .field("email", email)
                .field("repo", repo)
                .finish(),
            Self::Logout => f.write_str("Logout"),
        }
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Request[{}](len={})", self.kind(), self.frame_len())
    }
}

/// Decoded response payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseBody {
    /// Login acknowledged with the success flag
    LoginAccepted,

    /// Reason text: a rejection, or the logout acknowledgement
    Rejected { reason: String },

    /// Submission acknowledged with a token
    SubmissionAccepted { token: String },
}

impl ResponseBody {
    pub fn kind(&self) -> MessageType {
        match self {
            Self::LoginAccepted => MessageType::LoginAck,
            Self::Rejected { .. } => MessageType::Reason,
            Self::SubmissionAccepted { .. } => MessageType::SubmissionAck,
        }
    }

    /// Encode as a server would send it
    pub fn encode(&self, timestamp: u64) -> Result<BytesMut> {
        let flag = [LOGIN_ACCEPTED];
        let fields: Vec<(Slot, &[u8])> = match self {
            Self::LoginAccepted => vec![(layout::LOGIN_FLAG, &flag[..])],
            Self::Rejected { reason } => vec![(layout::REASON, reason.as_bytes())],
            Self::SubmissionAccepted { token } => vec![(layout::TOKEN, token.as_bytes())],
        };

        let kind = self.kind();
        let mut buf = BytesMut::zeroed(kind.frame_len());
        write_frame(&mut buf, kind, timestamp, &fields)?;
        Ok(buf)
    }
}

/// One validated response frame
#[derive(Clone, PartialEq, Eq)]
pub struct ResponseFrame {
    pub header: FrameHeader,
    pub body: ResponseBody,
}

impl ResponseFrame {
    /// Decode and validate one response frame
    ///
    /// `frame` must be exactly one frame.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The frame is shorter than the header or than its declared length
    /// - The type is unknown, a request, or has the wrong length
    /// - Checksum verification fails
    /// - A login acknowledgement carries a flag other than `'Y'`
    pub fn decode(frame: &[u8]) -> Result<Self> {
        let header = FrameHeader::validate(frame)?;

        let body = match header.kind {
            MessageType::LoginAck => {
                let flag = frame[layout::LOGIN_FLAG.offset];
                if flag != LOGIN_ACCEPTED {
                    return Err(Error::LoginNotAccepted { flag });
                }
                ResponseBody::LoginAccepted
            }
            MessageType::Reason => ResponseBody::Rejected {
                reason: read_text(frame, layout::REASON),
            },
            MessageType::SubmissionAck => ResponseBody::SubmissionAccepted {
                token: read_text(frame, layout::TOKEN),
            },
            kind => {
                return Err(Error::UnrecognizedFrame {
                    kind,
                    length: frame.len(),
                });
            }
        };

        Ok(Self { header, body })
    }

    pub fn kind(&self) -> MessageType {
        self.header.kind
    }
}

impl fmt::Debug for ResponseFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseFrame")
            .field("kind", &self.header.kind)
            .field("length", &self.header.length)
            .field("timestamp", &self.header.timestamp)
            .field("checksum", &format!("0x{:04X}", self.header.checksum))
            .field("body", &self.body)
            .finish()
    }
}

impl fmt::Display for ResponseFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Response[{}](len={})", self.header.kind, self.header.length)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn sealed(mut frame: Vec<u8>) -> Vec<u8> {
        let sum = checksum::calculate_frame(&frame);
        frame[11..13].copy_from_slice(&sum.to_le_bytes());
        frame
    }

    #[test]
    fn test_login_frame_layout() {
        let frame = Request::login("a@b.com", "pw").encode(0x1122_3344).unwrap();

        assert_eq!(frame.len(), 109);
        assert_eq!(frame[0], b'L');
        assert_eq!(&frame[1..3], &109u16.to_le_bytes());
        assert_eq!(&frame[3..11], &0x1122_3344u64.to_le_bytes());
        assert_eq!(&frame[13..20], b"a@b.com");
        assert!(frame[20..77].iter().all(|&b| b == 0));
        assert_eq!(&frame[77..79], b"pw");
        assert!(frame[79..109].iter().all(|&b| b == 0));

        let stored = u16::from_le_bytes([frame[11], frame[12]]);
        assert_eq!(stored, checksum::calculate_frame(&frame));
    }

    #[test]
    fn test_length_word_overlaid_by_timestamp() {
        // Upper half of the 4-byte length lands under the timestamp
        let frame = Request::Logout.encode(u64::MAX).unwrap();

        assert_eq!(frame.len(), 13);
        assert_eq!(declared_length(&frame), Some(13));
        assert_eq!(&frame[3..5], &[0xFF, 0xFF]);
    }

    #[test]
    fn test_zero_timestamp_keeps_full_length_word() {
        let frame = Request::Logout.encode(0).unwrap();
        assert_eq!(&frame[1..5], &13u32.to_le_bytes());
    }

    #[test]
    fn test_submission_frame_layout() {
        let frame = Request::submission("Ada", "ada@example.com", "https://git/ada")
            .encode(7)
            .unwrap();

        assert_eq!(frame.len(), 205);
        assert_eq!(frame[0], b'S');
        assert_eq!(&frame[13..16], b"Ada");
        assert_eq!(&frame[77..92], b"ada@example.com");
        assert_eq!(&frame[141..156], b"https://git/ada");
        assert!(checksum::verify_frame(&frame).is_ok());
    }

    #[test]
    fn test_logout_frame() {
        let frame = Request::Logout.encode(42).unwrap();
        assert_eq!(frame[0], b'O');
        assert!(checksum::verify_frame(&frame).is_ok());
    }

    #[test]
    fn test_encode_into_buffer_too_small() {
        let mut buf = [0xAAu8; 100];
        let result = Request::login("a@b.com", "pw").encode_into(&mut buf, 0);

        assert_eq!(
            result,
            Err(Error::BufferTooSmall {
                needed: 109,
                capacity: 100
            })
        );
        // Nothing written
        assert!(buf.iter().all(|&b| b == 0xAA));
    }

    #[test]
    fn test_encode_into_larger_buffer() {
        let mut buf = [0xAAu8; 256];
        let len = Request::Logout.encode_into(&mut buf, 0).unwrap();

        assert_eq!(len, 13);
        assert!(buf[13..].iter().all(|&b| b == 0xAA));
    }

    #[test]
    fn test_field_exactly_slot_width() {
        let email = "e".repeat(64);
        let frame = Request::login(email.clone(), "pw").encode(0).unwrap();

        // No terminator: the slot runs straight into the password
        assert_eq!(&frame[13..77], email.as_bytes());
        assert_eq!(&frame[77..79], b"pw");

        match Request::decode(&frame).unwrap() {
            Request::Login { email: decoded, .. } => assert_eq!(decoded, email),
            other => panic!("Expected login, got {:?}", other),
        }
    }

    #[test]
    fn test_field_one_byte_too_long() {
        let mut buf = [0xAAu8; 109];
        let result = Request::login("e".repeat(65), "pw").encode_into(&mut buf, 0);

        assert_eq!(
            result,
            Err(Error::FieldTooLong {
                field: "email",
                len: 65,
                max: 64
            })
        );
        assert!(buf.iter().all(|&b| b == 0xAA));
    }

    #[test]
    fn test_password_too_long() {
        let result = Request::login("a@b.com", "p".repeat(33)).encode(0);
        assert!(matches!(result, Err(Error::FieldTooLong { field: "password", .. })));
    }

    #[test]
    fn test_request_decode_rejects_corruption() {
        let mut frame = Request::login("a@b.com", "pw").encode(0).unwrap();
        frame[20] ^= 0x01;

        let result = Request::decode(&frame);
        assert!(matches!(result, Err(Error::ChecksumMismatch { .. })));
    }

    #[test]
    fn test_request_decode_rejects_response() {
        let frame = ResponseBody::LoginAccepted.encode(0).unwrap();
        let result = Request::decode(&frame);

        assert!(matches!(result, Err(Error::UnrecognizedFrame { .. })));
    }

    #[test]
    fn test_login_ack_decode() {
        let frame = ResponseBody::LoginAccepted.encode(9).unwrap();
        let decoded = ResponseFrame::decode(&frame).unwrap();

        assert_eq!(decoded.kind(), MessageType::LoginAck);
        assert_eq!(decoded.header.length, 46);
        assert_eq!(decoded.header.timestamp, 9);
        assert_eq!(decoded.body, ResponseBody::LoginAccepted);
    }

    #[test]
    fn test_login_ack_without_flag() {
        let mut raw = vec![0u8; 46];
        raw[0] = b'E';
        raw[1] = 46;
        raw[13] = b'N';
        let frame = sealed(raw);

        let result = ResponseFrame::decode(&frame);
        assert_eq!(result, Err(Error::LoginNotAccepted { flag: b'N' }));
    }

    #[test]
    fn test_reason_decode() {
        let mut raw = vec![0u8; 45];
        raw[0] = b'G';
        raw[1] = 45;
        raw[13..22].copy_from_slice(b"bad creds");
        let frame = sealed(raw);

        let decoded = ResponseFrame::decode(&frame).unwrap();
        assert_eq!(
            decoded.body,
            ResponseBody::Rejected {
                reason: "bad creds".into()
            }
        );
    }

    #[test]
    fn test_token_fills_slot() {
        let token = "t".repeat(32);
        let frame = ResponseBody::SubmissionAccepted { token: token.clone() }
            .encode(0)
            .unwrap();

        let decoded = ResponseFrame::decode(&frame).unwrap();
        assert_eq!(decoded.body, ResponseBody::SubmissionAccepted { token });
    }

    #[test]
    fn test_response_wrong_length() {
        let mut raw = vec![0u8; 46];
        raw[0] = b'G';
        raw[1] = 46;
        let frame = sealed(raw);

        let result = ResponseFrame::decode(&frame);
        assert_eq!(
            result,
            Err(Error::UnrecognizedFrame {
                kind: MessageType::Reason,
                length: 46
            })
        );
    }

    #[test]
    fn test_response_truncated() {
        let frame = ResponseBody::LoginAccepted.encode(0).unwrap();
        let result = ResponseFrame::decode(&frame[..30]);

        assert_eq!(
            result,
            Err(Error::FrameTruncated {
                declared: 46,
                available: 30
            })
        );
    }

    #[test]
    fn test_response_too_short() {
        let result = ResponseFrame::decode(&[b'E', 46, 0]);
        assert!(matches!(result, Err(Error::FrameTooShort { .. })));
    }

    #[test]
    fn test_response_decode_rejects_request() {
        let frame = Request::Logout.encode(0).unwrap();
        let result = ResponseFrame::decode(&frame);

        assert!(matches!(result, Err(Error::UnrecognizedFrame { .. })));
    }

    #[test]
    fn test_declared_length_needs_three_bytes() {
        assert_eq!(declared_length(&[b'E', 46]), None);
        assert_eq!(declared_length(&[b'E', 46, 0]), Some(46));
    }

    #[test]
    fn test_debug_redacts_password() {
        let rendered = format!("{:?}", Request::login("a@b.com", "hunter2"));
        assert!(!rendered.contains("hunter2"));
    }

    proptest! {
        #[test]
        fn prop_login_fields_survive_encoding(
            email in "[a-z0-9@.]{0,64}",
            password in "[ -~]{0,32}",
            timestamp in any::<u64>(),
        ) {
            let frame = Request::login(email.clone(), password.clone()).encode(timestamp).unwrap();

            prop_assert_eq!(&frame[13..13 + email.len()], email.as_bytes());
            prop_assert_eq!(&frame[77..77 + password.len()], password.as_bytes());
            prop_assert!(checksum::verify_frame(&frame).is_ok());
        }
    }
}
