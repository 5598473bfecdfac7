//! Configuration types for opening streams.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// What the dispatcher does when records fail to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[non_exhaustive]
pub enum DecodeErrorPolicy {
    /// Report every decode error and keep reading.
    #[default]
    Continue,
    /// End the stream on the first decode error.
    FailFast,
    /// End the stream once this many decode errors arrive back to back.
    /// A successfully classified record resets the count.
    FailAfterConsecutive(u32),
}

impl DecodeErrorPolicy {
    /// Returns true when `consecutive` decode errors should end the stream.
    #[must_use]
    pub const fn trips(&self, consecutive: u32) -> bool {
        match self {
            Self::Continue => false,
            Self::FailFast => consecutive >= 1,
            Self::FailAfterConsecutive(limit) => consecutive >= *limit,
        }
    }
}

/// Per-stream configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Capacity of the data message channel.
    pub data_capacity: usize,
    /// Capacity of the system notice channel.
    pub notice_capacity: usize,
    /// Capacity of the error channel.
    pub error_capacity: usize,
    /// Longest accepted record in bytes; `None` disables the limit.
    pub max_line_bytes: Option<usize>,
    /// Policy applied to decode errors.
    pub decode_error_policy: DecodeErrorPolicy,
    /// How long `close` waits for the dispatcher before aborting it.
    pub close_timeout: Duration,
}

/// Default cap on a single record (1 MiB).
pub const DEFAULT_MAX_LINE_BYTES: usize = 1024 * 1024;

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            data_capacity: 1024,
            notice_capacity: 64,
            error_capacity: 64,
            max_line_bytes: Some(DEFAULT_MAX_LINE_BYTES),
            decode_error_policy: DecodeErrorPolicy::Continue,
            close_timeout: Duration::from_secs(5),
        }
    }
}
