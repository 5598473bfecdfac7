//! tweetstream decodes a long-lived newline-delimited tweet stream and fans
//! it out to typed channels.
//!
//! Overview
//! - Takes an already-open response body through the `ByteSource` trait
//!   (`tweetstream-http` adapts a `reqwest::Response`).
//! - Splits the body into records on `\r\n` or `\n`, whatever the chunking.
//! - Classifies each record as a data message, a system notice, or a decode
//!   error; blank keep-alive records are counted and dropped.
//! - Delivers each kind on its own bounded channel, in source order.
//!
//! Key behaviors and trade-offs
//! - Backpressure: a full channel pauses the dispatcher and with it the body
//!   reads. Drain all three channels, or drop the ones you do not need.
//! - Decode errors are non-terminal by default; pick `FailFast` or
//!   `FailAfterConsecutive(n)` to end the stream on bad input.
//! - Transport errors end the stream and are reported once on the error
//!   channel. A clean end of body and a caller close report nothing.
//! - Reconnection is left to the caller: issue a new request and open a new
//!   stream.
//!
//! Examples
//! Consuming a stream:
//! ```rust,ignore
//! use tweetstream::{StreamEvent, Streamer};
//! use tweetstream_http::HttpBody;
//!
//! let resp = reqwest::Client::new().get(url).bearer_auth(token).send().await?;
//! let body = HttpBody::from_response(resp).await?;
//! let mut stream = Streamer::builder().build()?.open(body)?;
//! while let Some(ev) = stream.next_event().await {
//!     match ev {
//!         StreamEvent::Data(msg) => println!("{:?}", msg.tweets),
//!         StreamEvent::Notice(n) => println!("{}: {}", n.kind(), n.body().message),
//!         StreamEvent::Error(e) => eprintln!("{e}"),
//!     }
//! }
//! ```
//!
//! Closing from another task:
//! ```rust,ignore
//! let closer = stream.closer();
//! tokio::spawn(async move { closer.close().await });
//! ```
//!
//! See `tweetstream/examples/` for runnable clients.
#![warn(missing_docs)]

pub(crate) mod core;
mod dispatch;
mod handle;
mod stats;

pub use core::{Streamer, StreamerBuilder};
pub use handle::{StreamCloser, StreamEvent, StreamReceivers, TweetStream};
pub use stats::StatsSnapshot;

pub use tweetstream_core::{
    ByteSource, DataMessage, DecodeErrorKind, MatchingRule, NoticeBody, NoticeKind, StreamState,
    SystemNotice, Tweet,
};
pub use tweetstream_types::{DEFAULT_MAX_LINE_BYTES, DecodeErrorPolicy, StreamConfig, StreamError};
