//! Error and configuration primitives shared by the tweetstream crates.
#![warn(missing_docs)]

mod config;
mod error;

pub use config::{DEFAULT_MAX_LINE_BYTES, DecodeErrorPolicy, StreamConfig};
pub use error::{DecodeErrorKind, LINE_EXCERPT_MAX, StreamError};
