//! Test doubles for tweetstream.
//!
//! - [`ScriptedSource`]: replays a fixed script of chunks, delays, and failures.
//! - [`ManualSource`]: fed chunk by chunk from the test through a [`ManualFeed`].
//! - [`ReleaseProbe`]: observes when (and how often) a source was dropped.
//! - [`fixtures`]: canned stream records.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::mpsc;
use tweetstream_core::{ByteSource, StreamError};

pub mod fixtures;

/// Counts how many times the source it was taken from has been dropped.
#[derive(Debug, Clone, Default)]
pub struct ReleaseProbe(Arc<AtomicUsize>);

impl ReleaseProbe {
    /// True once the source has been dropped.
    #[must_use]
    pub fn released(&self) -> bool {
        self.release_count() > 0
    }

    /// Number of times the source has been dropped (0 or 1 for a sound owner).
    #[must_use]
    pub fn release_count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }

    fn mark(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone)]
enum Step {
    Chunk(Bytes),
    Delay(Duration),
    Fail(String),
}

/// A byte source that replays a fixed script.
///
/// After the script runs out the source reports end of body, or never
/// returns again when built with [`ScriptedSourceBuilder::hold_open`].
#[derive(Debug)]
pub struct ScriptedSource {
    steps: VecDeque<Step>,
    hold_open: bool,
    reads: Arc<AtomicUsize>,
    probe: ReleaseProbe,
}

impl ScriptedSource {
    /// Start building a script.
    #[must_use]
    pub fn builder() -> ScriptedSourceBuilder {
        ScriptedSourceBuilder::default()
    }

    /// Source that yields `body` in one chunk and ends.
    #[must_use]
    pub fn from_body(body: impl AsRef<[u8]>) -> Self {
        Self::builder().chunk(body).build()
    }

    /// Probe that observes when this source is dropped.
    #[must_use]
    pub fn probe(&self) -> ReleaseProbe {
        self.probe.clone()
    }

    /// Shared counter of `next_chunk` calls made so far.
    #[must_use]
    pub fn read_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.reads)
    }
}

impl Drop for ScriptedSource {
    fn drop(&mut self) {
        self.probe.mark();
    }
}

#[async_trait]
impl ByteSource for ScriptedSource {
    async fn next_chunk(&mut self) -> Result<Option<Bytes>, StreamError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        loop {
            match self.steps.pop_front() {
                Some(Step::Chunk(b)) => return Ok(Some(b)),
                Some(Step::Delay(d)) => tokio::time::sleep(d).await,
                Some(Step::Fail(msg)) => return Err(StreamError::transport(msg)),
                None if self.hold_open => std::future::pending::<()>().await,
                None => return Ok(None),
            }
        }
    }
}

/// Builder for [`ScriptedSource`].
#[derive(Debug, Default)]
pub struct ScriptedSourceBuilder {
    steps: Vec<Step>,
    hold_open: bool,
}

impl ScriptedSourceBuilder {
    /// Append a raw chunk.
    #[must_use]
    pub fn chunk(mut self, bytes: impl AsRef<[u8]>) -> Self {
        self.steps
            .push(Step::Chunk(Bytes::copy_from_slice(bytes.as_ref())));
        self
    }

    /// Append one record followed by `\r\n`.
    #[must_use]
    pub fn line(self, record: &str) -> Self {
        self.chunk(format!("{record}\r\n"))
    }

    /// Append several records, one chunk each.
    #[must_use]
    pub fn lines<'a>(self, records: impl IntoIterator<Item = &'a str>) -> Self {
        records.into_iter().fold(self, Self::line)
    }

    /// Append `n` blank keep-alive lines.
    #[must_use]
    pub fn keep_alives(self, n: usize) -> Self {
        (0..n).fold(self, |b, _| b.chunk("\r\n"))
    }

    /// Append `body` cut into chunks of at most `size` bytes.
    ///
    /// # Panics
    /// Panics if `size` is zero.
    #[must_use]
    pub fn chunked(self, body: impl AsRef<[u8]>, size: usize) -> Self {
        assert!(size > 0, "chunk size must be positive");
        body.as_ref().chunks(size).fold(self, |b, c| b.chunk(c))
    }

    /// Pause before the next step.
    #[must_use]
    pub fn delay(mut self, d: Duration) -> Self {
        self.steps.push(Step::Delay(d));
        self
    }

    /// Fail the next read with a transport error.
    #[must_use]
    pub fn fail(mut self, msg: impl Into<String>) -> Self {
        self.steps.push(Step::Fail(msg.into()));
        self
    }

    /// Never report end of body once the script is exhausted.
    #[must_use]
    pub const fn hold_open(mut self) -> Self {
        self.hold_open = true;
        self
    }

    /// Finish the script.
    #[must_use]
    pub fn build(self) -> ScriptedSource {
        ScriptedSource {
            steps: self.steps.into(),
            hold_open: self.hold_open,
            reads: Arc::new(AtomicUsize::new(0)),
            probe: ReleaseProbe::default(),
        }
    }
}

/// A byte source driven from the test through a [`ManualFeed`].
///
/// The body ends when every feed is dropped.
#[derive(Debug)]
pub struct ManualSource {
    rx: mpsc::UnboundedReceiver<Result<Bytes, StreamError>>,
    probe: ReleaseProbe,
}

/// Sending half of a [`ManualSource`].
#[derive(Debug, Clone)]
pub struct ManualFeed {
    tx: mpsc::UnboundedSender<Result<Bytes, StreamError>>,
}

impl ManualSource {
    /// Create a connected feed and source.
    #[must_use]
    pub fn new() -> (ManualFeed, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            ManualFeed { tx },
            Self {
                rx,
                probe: ReleaseProbe::default(),
            },
        )
    }

    /// Probe that observes when this source is dropped.
    #[must_use]
    pub fn probe(&self) -> ReleaseProbe {
        self.probe.clone()
    }
}

impl Drop for ManualSource {
    fn drop(&mut self) {
        self.probe.mark();
    }
}

#[async_trait]
impl ByteSource for ManualSource {
    async fn next_chunk(&mut self) -> Result<Option<Bytes>, StreamError> {
        self.rx.recv().await.transpose()
    }
}

impl ManualFeed {
    /// Push a raw chunk. Returns false once the source is gone.
    pub fn chunk(&self, bytes: impl AsRef<[u8]>) -> bool {
        self.tx
            .send(Ok(Bytes::copy_from_slice(bytes.as_ref())))
            .is_ok()
    }

    /// Push one record followed by `\r\n`.
    pub fn line(&self, record: &str) -> bool {
        self.chunk(format!("{record}\r\n"))
    }

    /// Make the next read fail with a transport error.
    pub fn fail(&self, msg: impl Into<String>) -> bool {
        self.tx.send(Err(StreamError::Transport(msg.into()))).is_ok()
    }

    /// True once the source has been dropped.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
