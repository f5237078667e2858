//! Line framing for the chat stream.
//!
//! Bytes are buffered until a `\n` arrives, so one command split across
//! several writes is reassembled and several commands in one write are
//! yielded one by one.

use bytes::{BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::{strip_line_ending, DEFAULT_MAX_LINE_LENGTH, LINE_TERMINATOR};

#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("line exceeds {max} bytes")]
    LineTooLong { max: usize },
    #[error("line is not valid UTF-8")]
    InvalidUtf8,
}

#[derive(Debug, Clone)]
pub struct LineCodec {
    /// Index in the buffer already scanned for a newline.
    next_index: usize,
    max_length: usize,
}

impl LineCodec {
    pub fn new() -> Self {
        Self::with_max_length(DEFAULT_MAX_LINE_LENGTH)
    }

    pub fn with_max_length(max_length: usize) -> Self {
        Self {
            next_index: 0,
            max_length,
        }
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    /// True once an unterminated line can no longer fit, allowing only a
    /// pending `\r` past `max_length`.
    fn overflows(&self, buf: &BytesMut) -> bool {
        match buf.len().checked_sub(self.max_length) {
            Some(0) | None => false,
            Some(1) => buf[self.max_length] != b'\r',
            Some(_) => true,
        }
    }

    fn take_line(&mut self, buf: &mut BytesMut, len: usize) -> Result<String, ProtocolError> {
        self.next_index = 0;
        let raw = buf.split_to(len);
        let text = std::str::from_utf8(&raw).map_err(|_| ProtocolError::InvalidUtf8)?;
        Ok(strip_line_ending(text).to_string())
    }
}

impl Default for LineCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for LineCodec {
    type Item = String;
    type Error = ProtocolError;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<String>, ProtocolError> {
        // Leaves room for a `\r\n` after `max_length` bytes of content.
        let read_to = buf.len().min(self.max_length.saturating_add(2));

        match buf[self.next_index..read_to]
            .iter()
            .position(|byte| *byte == b'\n')
        {
            Some(offset) => {
                let line_len = self.next_index + offset + 1;
                if content_len(&buf[..line_len]) > self.max_length {
                    return Err(ProtocolError::LineTooLong {
                        max: self.max_length,
                    });
                }
                self.take_line(buf, line_len).map(Some)
            }
            None if self.overflows(buf) => Err(ProtocolError::LineTooLong {
                max: self.max_length,
            }),
            None => {
                self.next_index = read_to;
                Ok(None)
            }
        }
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<String>, ProtocolError> {
        match self.decode(buf)? {
            Some(line) => Ok(Some(line)),
            None if buf.is_empty() => Ok(None),
            None => {
                let len = buf.len();
                self.take_line(buf, len).map(Some)
            }
        }
    }
}

/// Length of `raw` without its trailing `\r`/`\n` bytes
fn content_len(raw: &[u8]) -> usize {
    raw.iter()
        .rposition(|byte| *byte != b'\r' && *byte != b'\n')
        .map_or(0, |last| last + 1)
}

impl<T> Encoder<T> for LineCodec
where
    T: AsRef<str>,
{
    type Error = ProtocolError;

    fn encode(&mut self, line: T, buf: &mut BytesMut) -> Result<(), ProtocolError> {
        let line = line.as_ref();
        buf.reserve(line.len() + LINE_TERMINATOR.len());
        buf.put_slice(line.as_bytes());
        buf.put_slice(LINE_TERMINATOR.as_bytes());
        Ok(())
    }
}
