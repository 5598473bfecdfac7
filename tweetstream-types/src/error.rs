use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Longest line excerpt (in bytes) kept inside a decode error for diagnostics.
pub const LINE_EXCERPT_MAX: usize = 256;

/// Reason a single stream record could not be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum DecodeErrorKind {
    /// The record is not valid UTF-8.
    InvalidUtf8,
    /// The record is not valid JSON.
    MalformedJson,
    /// The record is valid JSON but not a JSON object.
    NotAnObject,
    /// The object carries neither a data payload nor a known notice field.
    UnrecognizedEnvelope,
    /// A recognized envelope has a payload of the wrong shape.
    InvalidPayload,
    /// A notice `sent` field is not an RFC 3339 timestamp.
    InvalidTimestamp,
    /// The record exceeded the configured maximum line length.
    LineTooLong,
}

impl fmt::Display for DecodeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::InvalidUtf8 => "invalid utf-8",
            Self::MalformedJson => "malformed json",
            Self::NotAnObject => "not a json object",
            Self::UnrecognizedEnvelope => "unrecognized envelope",
            Self::InvalidPayload => "invalid payload",
            Self::InvalidTimestamp => "invalid timestamp",
            Self::LineTooLong => "line too long",
        };
        f.write_str(s)
    }
}

/// Unified error type for the tweetstream workspace.
///
/// Transport failures and policy trips end a stream; decode errors describe a
/// single bad record and leave the stream running.
#[derive(Debug, Error, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum StreamError {
    /// Reading the response body failed.
    #[error("transport error: {0}")]
    Transport(String),

    /// One record could not be decoded.
    #[error("decode error ({kind}): {detail}; line: {line:?}")]
    Decode {
        /// What went wrong.
        kind: DecodeErrorKind,
        /// Human-readable detail, usually from the JSON parser.
        detail: String,
        /// Excerpt of the offending record.
        line: String,
    },

    /// The server answered the streaming request with a non-success status.
    #[error("unexpected status {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body or reason phrase.
        message: String,
    },

    /// Invalid input argument or configuration.
    #[error("invalid argument: {0}")]
    InvalidArg(String),

    /// The configured decode error policy ended the stream.
    #[error("decode error policy exceeded after {consecutive} consecutive failures")]
    DecodePolicyExceeded {
        /// Number of consecutive decode errors observed.
        consecutive: u32,
    },
}

impl StreamError {
    /// Helper: build a `Transport` error from any displayable cause.
    pub fn transport(cause: impl fmt::Display) -> Self {
        Self::Transport(cause.to_string())
    }

    /// Helper: build a `Decode` error, keeping a bounded excerpt of `line`.
    pub fn decode(kind: DecodeErrorKind, detail: impl Into<String>, line: &[u8]) -> Self {
        Self::Decode {
            kind,
            detail: detail.into(),
            line: excerpt(line),
        }
    }

    /// Helper: build a `Status` error.
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: message.into(),
        }
    }

    /// Returns the decode error kind when this is a `Decode` error.
    #[must_use]
    pub const fn decode_kind(&self) -> Option<DecodeErrorKind> {
        match self {
            Self::Decode { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// Returns true for per-record decode errors.
    #[must_use]
    pub const fn is_decode(&self) -> bool {
        matches!(self, Self::Decode { .. })
    }

    /// Returns true if this error ends the stream it was reported on.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        !self.is_decode()
    }
}

fn excerpt(line: &[u8]) -> String {
    let text = String::from_utf8_lossy(line);
    if text.len() <= LINE_EXCERPT_MAX {
        return text.into_owned();
    }
    let mut end = LINE_EXCERPT_MAX;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}
