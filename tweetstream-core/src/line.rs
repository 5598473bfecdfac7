use bytes::BytesMut;
use tweetstream_types::{DecodeErrorKind, StreamError};

use crate::source::ByteSource;
use crate::types::RawLine;

/// Splits a [`ByteSource`] into records delimited by `\n` or `\r\n`.
///
/// Behavior:
/// - Delimiters may straddle chunk boundaries; no bytes are lost.
/// - Blank lines come back as zero-length [`RawLine`]s, not as end of stream.
/// - A trailing fragment without a delimiter is returned as the last line
///   once the body ends.
/// - With a length limit, an oversized record is reported once as a
///   `LineTooLong` decode error and skipped up to its delimiter; reading
///   continues afterwards.
pub struct LineReader<S> {
    source: S,
    buf: BytesMut,
    // Bytes of `buf` already searched for a delimiter.
    scanned: usize,
    max_line_bytes: Option<usize>,
    discarding: bool,
    eof: bool,
}

impl<S: ByteSource> LineReader<S> {
    /// Wrap a byte source without a line length limit.
    pub fn new(source: S) -> Self {
        Self::with_max_line_bytes(source, None)
    }

    /// Wrap a byte source, rejecting records longer than `max_line_bytes`.
    pub fn with_max_line_bytes(source: S, max_line_bytes: Option<usize>) -> Self {
        Self {
            source,
            buf: BytesMut::new(),
            scanned: 0,
            max_line_bytes,
            discarding: false,
            eof: false,
        }
    }

    /// Read the next record.
    ///
    /// Returns `Ok(None)` once the body is exhausted.
    ///
    /// # Errors
    /// Returns the source's transport error, or a `LineTooLong` decode error
    /// for an oversized record. Only the former ends the stream.
    pub async fn next_line(&mut self) -> Result<Option<RawLine>, StreamError> {
        loop {
            if let Some(pos) = self.buf[self.scanned..].iter().position(|b| *b == b'\n') {
                let end = self.scanned + pos;
                let mut line = self.buf.split_to(end + 1);
                self.scanned = 0;
                line.truncate(end);
                if self.discarding {
                    self.discarding = false;
                    continue;
                }
                return self.finish(line).map(Some);
            }
            self.scanned = self.buf.len();

            // A trailing `\r` may be the first half of a split `\r\n`.
            let pending_len = self.buf.len() - usize::from(self.buf.last() == Some(&b'\r'));
            if let Some(max) = self.max_line_bytes
                && pending_len > max
            {
                let pending = self.buf.split();
                self.scanned = 0;
                if !self.discarding {
                    self.discarding = true;
                    #[cfg(feature = "tracing")]
                    tracing::warn!(pending = pending.len(), max, "record exceeds line limit; skipping to next delimiter");
                    return Err(too_long(&pending, max));
                }
            }

            if self.eof {
                if self.buf.is_empty() || self.discarding {
                    self.buf.clear();
                    self.scanned = 0;
                    self.discarding = false;
                    return Ok(None);
                }
                let tail = self.buf.split();
                self.scanned = 0;
                return self.finish(tail).map(Some);
            }

            match self.source.next_chunk().await? {
                Some(chunk) => self.buf.extend_from_slice(&chunk),
                None => self.eof = true,
            }
        }
    }

    /// Consume the reader and return the source.
    pub fn into_inner(self) -> S {
        self.source
    }

    fn finish(&self, mut line: BytesMut) -> Result<RawLine, StreamError> {
        if line.last() == Some(&b'\r') {
            line.truncate(line.len() - 1);
        }
        if let Some(max) = self.max_line_bytes
            && line.len() > max
        {
            return Err(too_long(&line, max));
        }
        Ok(RawLine::new(line.freeze()))
    }
}

fn too_long(line: &[u8], max: usize) -> StreamError {
    StreamError::decode(
        DecodeErrorKind::LineTooLong,
        format!("record exceeds {max} bytes"),
        line,
    )
}
