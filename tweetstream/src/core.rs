use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tweetstream_core::{
    ByteSource, DecodeErrorPolicy, LineReader, StreamConfig, StreamError, StreamState,
};

use crate::dispatch::{Dispatcher, Outputs};
use crate::handle::{StreamCloser, StreamReceivers, TweetStream};
use crate::stats::StreamStats;

static NEXT_STREAM_ID: AtomicU64 = AtomicU64::new(1);

/// Opens streams over already-established response bodies.
///
/// A `Streamer` only holds configuration; it is cheap to clone and every
/// stream it opens is independent.
#[derive(Debug, Clone, Default)]
pub struct Streamer {
    cfg: StreamConfig,
}

/// Builder for a [`Streamer`].
#[derive(Debug, Clone, Default)]
pub struct StreamerBuilder {
    cfg: StreamConfig,
}

impl StreamerBuilder {
    /// Start from [`StreamConfig::default`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole configuration.
    #[must_use]
    pub fn config(mut self, cfg: StreamConfig) -> Self {
        self.cfg = cfg;
        self
    }

    /// Capacity of the data message channel.
    ///
    /// Behavior and trade-offs:
    /// - When the channel is full the dispatcher waits, which in turn stops
    ///   reading the body; a slow consumer applies backpressure to the server.
    /// - Larger values absorb bursts at the cost of memory.
    #[must_use]
    pub const fn data_capacity(mut self, n: usize) -> Self {
        self.cfg.data_capacity = n;
        self
    }

    /// Capacity of the system notice channel.
    #[must_use]
    pub const fn notice_capacity(mut self, n: usize) -> Self {
        self.cfg.notice_capacity = n;
        self
    }

    /// Capacity of the error channel.
    #[must_use]
    pub const fn error_capacity(mut self, n: usize) -> Self {
        self.cfg.error_capacity = n;
        self
    }

    /// Longest accepted record in bytes; `None` removes the limit.
    ///
    /// Behavior and trade-offs:
    /// - A longer record is reported once as a `LineTooLong` decode error and
    ///   skipped up to the next delimiter.
    /// - Without a limit, a server that never sends a delimiter grows the
    ///   buffer without bound.
    #[must_use]
    pub const fn max_line_bytes(mut self, max: Option<usize>) -> Self {
        self.cfg.max_line_bytes = max;
        self
    }

    /// Policy applied when records fail to decode.
    #[must_use]
    pub const fn decode_error_policy(mut self, policy: DecodeErrorPolicy) -> Self {
        self.cfg.decode_error_policy = policy;
        self
    }

    /// How long `close` waits for the dispatcher before aborting it.
    #[must_use]
    pub const fn close_timeout(mut self, timeout: Duration) -> Self {
        self.cfg.close_timeout = timeout;
        self
    }

    /// Validate and build.
    ///
    /// # Errors
    /// Returns `StreamError::InvalidArg` when a channel capacity is zero, when
    /// `max_line_bytes` is `Some(0)`, or when the decode policy is
    /// `FailAfterConsecutive(0)`.
    pub fn build(self) -> Result<Streamer, StreamError> {
        Streamer::new(self.cfg)
    }
}

impl Streamer {
    /// Start building a streamer.
    #[must_use]
    pub fn builder() -> StreamerBuilder {
        StreamerBuilder::new()
    }

    /// Create a streamer from a configuration.
    ///
    /// # Errors
    /// See [`StreamerBuilder::build`].
    pub fn new(cfg: StreamConfig) -> Result<Self, StreamError> {
        for (name, cap) in [
            ("data_capacity", cfg.data_capacity),
            ("notice_capacity", cfg.notice_capacity),
            ("error_capacity", cfg.error_capacity),
        ] {
            if cap == 0 {
                return Err(StreamError::InvalidArg(format!("{name} must be at least 1")));
            }
        }
        if cfg.max_line_bytes == Some(0) {
            return Err(StreamError::InvalidArg(
                "max_line_bytes must be at least 1 (use None to disable the limit)".into(),
            ));
        }
        if cfg.decode_error_policy == DecodeErrorPolicy::FailAfterConsecutive(0) {
            return Err(StreamError::InvalidArg(
                "FailAfterConsecutive needs a limit of at least 1".into(),
            ));
        }
        Ok(Self { cfg })
    }

    /// The configuration used for new streams.
    #[must_use]
    pub const fn config(&self) -> &StreamConfig {
        &self.cfg
    }

    /// Start decoding `source` and return the stream handle.
    ///
    /// The body is owned by the stream from here on. It is read by a spawned
    /// dispatcher task and released exactly once, before the stream reports
    /// [`StreamState::Closed`].
    ///
    /// # Errors
    /// Returns `StreamError::InvalidArg` when called outside a Tokio runtime.
    pub fn open<S>(&self, source: S) -> Result<TweetStream, StreamError>
    where
        S: ByteSource + 'static,
    {
        if tokio::runtime::Handle::try_current().is_err() {
            return Err(StreamError::InvalidArg(
                "streams must be opened inside a Tokio runtime".into(),
            ));
        }

        let id = NEXT_STREAM_ID.fetch_add(1, Ordering::Relaxed);
        let (data_tx, data_rx) = mpsc::channel(self.cfg.data_capacity);
        let (notice_tx, notice_rx) = mpsc::channel(self.cfg.notice_capacity);
        let (error_tx, error_rx) = mpsc::channel(self.cfg.error_capacity);
        let (state_tx, stop_rx) = watch::channel(StreamState::Open);
        let state = Arc::new(state_tx);
        let stats = Arc::new(StreamStats::default());

        #[cfg(feature = "tracing")]
        tracing::debug!(
            stream = id,
            max_line_bytes = ?self.cfg.max_line_bytes,
            policy = ?self.cfg.decode_error_policy,
            "opening stream"
        );

        let join = Dispatcher {
            id,
            reader: LineReader::with_max_line_bytes(source, self.cfg.max_line_bytes),
            out: Outputs {
                data: data_tx,
                notices: notice_tx,
                errors: error_tx,
            },
            state: Arc::clone(&state),
            stop_rx,
            policy: self.cfg.decode_error_policy,
            stats: Arc::clone(&stats),
        }
        .spawn();

        let closer = StreamCloser::new(id, state, join, self.cfg.close_timeout, stats);
        Ok(TweetStream::new(
            StreamReceivers {
                tweets: data_rx,
                notices: notice_rx,
                errors: error_rx,
            },
            closer,
        ))
    }
}
