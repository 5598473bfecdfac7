//! tweetstream-core
//!
//! Building blocks for decoding a newline-delimited tweet stream.
//!
//! - `source`: the `ByteSource` trait over an already-open response body.
//! - `line`: `LineReader`, which cuts the body into records.
//! - `classify`: turns one record into a data message, a system notice, or a
//!   decode error.
//! - `types`: the decoded record types.
//! - `stream`: lifecycle state and stop/abort primitives for stream handles.
//!
//! Async runtime (Tokio)
//! ---------------------
//! `stream` is built on `tokio::sync::watch` and `tokio::task::JoinHandle`,
//! so code that opens streams must run under a Tokio 1.x runtime.
#![warn(missing_docs)]

/// Record classification.
pub mod classify;
/// Line splitting over a byte source.
pub mod line;
/// Transport abstraction.
pub mod source;
/// Stream lifecycle primitives used by stream handles and tests.
pub mod stream;
pub mod types;

pub use classify::classify;
pub use line::LineReader;
pub use source::ByteSource;
pub use stream::StreamState;
pub use tweetstream_types::{
    DEFAULT_MAX_LINE_BYTES, DecodeErrorKind, DecodeErrorPolicy, StreamConfig, StreamError,
};
pub use types::*;
