//! Response scanner
//!
//! A single read may carry several frames back to back. The scanner walks
//! them by their declared lengths and validates each one on its own.
//!
//! A frame that fails validation is skipped and scanning carries on. The
//! cursor always moves forward by the declared length, clamped to at least
//! one byte and at most what is left, so any input terminates.

use tracing::{debug, warn};

use crate::{
    constants::layout,
    error::{Error, Result},
    frame::{self, ResponseFrame},
};

/// Iterator over the frames of a response buffer
///
/// Yields one item per frame in buffer order: `Ok` for a valid frame,
/// `Err` for one that was skipped.
///
/// # Examples
///
/// ```
/// use handin_core::{FrameScanner, ResponseBody};
///
/// let mut buf = ResponseBody::LoginAccepted.encode(0).unwrap();
/// buf.extend_from_slice(&ResponseBody::Rejected { reason: "bye".into() }.encode(0).unwrap());
///
/// let frames: Vec<_> = FrameScanner::new(&buf).collect();
/// assert_eq!(frames.len(), 2);
/// assert!(frames.iter().all(|f| f.is_ok()));
/// ```
#[derive(Debug, Clone)]
pub struct FrameScanner<'a> {
    buf: &'a [u8],
    cursor: usize,
}

impl<'a> FrameScanner<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, cursor: 0 }
    }

    /// Offset of the next frame
    pub fn offset(&self) -> usize {
        self.cursor
    }
}

impl Iterator for FrameScanner<'_> {
    type Item = Result<ResponseFrame>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor >= self.buf.len() {
            return None;
        }

        let rest = &self.buf[self.cursor..];

        if rest.len() < layout::HEADER_LEN {
            // Trailing fragment, nothing further can be framed
            self.cursor = self.buf.len();
            return Some(Err(Error::FrameTooShort {
                expected: layout::HEADER_LEN,
                actual: rest.len(),
            }));
        }

        let declared = frame::declared_length(rest).unwrap_or(0);
        let advance = declared.clamp(1, rest.len());
        let offset = self.cursor;
        self.cursor += advance;

        let result = ResponseFrame::decode(&rest[..advance]);

        match &result {
            Ok(frame) => debug!(offset, "Scanned {}", frame),
            Err(e) => debug!(offset, declared, advance, "Skipping frame: {}", e),
        }

        Some(result)
    }
}

/// Scan a response buffer, keeping only the frames that validate
pub fn scan(buf: &[u8]) -> Vec<ResponseFrame> {
    let mut frames = Vec::new();
    let mut scanner = FrameScanner::new(buf);

    loop {
        let offset = scanner.offset();
        match scanner.next() {
            Some(Ok(frame)) => frames.push(frame),
            Some(Err(e)) => warn!(offset, "Discarded response frame: {}", e),
            None => break,
        }
    }

    frames
}

/// Bytes still missing before `buf` holds only whole frames
///
/// Returns 0 once every declared length is satisfied. A declared length
/// shorter than the header also returns 0: more bytes cannot repair it,
/// and the scanner will report it.
pub fn pending_bytes(buf: &[u8]) -> usize {
    let mut cursor = 0;

    if buf.is_empty() {
        return layout::DECLARED_LENGTH.end();
    }

    while cursor < buf.len() {
        let rest = &buf[cursor..];

        let Some(declared) = frame::declared_length(rest) else {
            return layout::DECLARED_LENGTH.end() - rest.len();
        };

        if declared < layout::HEADER_LEN {
            return 0;
        }

        if declared > rest.len() {
            return declared - rest.len();
        }

        cursor += declared;
    }

    0
}
