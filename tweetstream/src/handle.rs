use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use futures::Stream;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tweetstream_core::stream::{Stoppable, closed, drop_impl};
use tweetstream_core::{DataMessage, StreamError, StreamState, SystemNotice};

use crate::stats::{StatsSnapshot, StreamStats};

/// One item received from a stream.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// A data message from the data channel.
    Data(DataMessage),
    /// A system notice from the notice channel.
    Notice(SystemNotice),
    /// An error from the error channel.
    Error(StreamError),
}

struct Shared {
    id: u64,
    state: Arc<watch::Sender<StreamState>>,
    join: Mutex<Option<JoinHandle<()>>>,
    close_timeout: Duration,
    stats: Arc<StreamStats>,
}

impl Drop for Shared {
    fn drop(&mut self) {
        let mut join = self
            .join
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        drop_impl(&mut join, &*self.state);
    }
}

/// Cloneable close/inspect handle for an open stream.
///
/// Every clone controls the same stream; closing through any of them closes it
/// for all. Dropping the last clone (and the owning [`TweetStream`]) without
/// closing requests a stop and aborts the dispatcher if it is still running.
#[derive(Clone)]
pub struct StreamCloser {
    inner: Arc<Shared>,
}

impl fmt::Debug for StreamCloser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamCloser")
            .field("id", &self.inner.id)
            .field("state", &self.state())
            .finish()
    }
}

impl StreamCloser {
    pub(crate) fn new(
        id: u64,
        state: Arc<watch::Sender<StreamState>>,
        join: JoinHandle<()>,
        close_timeout: Duration,
        stats: Arc<StreamStats>,
    ) -> Self {
        Self {
            inner: Arc::new(Shared {
                id,
                state,
                join: Mutex::new(Some(join)),
                close_timeout,
                stats,
            }),
        }
    }

    /// Close the stream.
    ///
    /// Behavior:
    /// - Idempotent; safe to call repeatedly and from several tasks at once.
    /// - Returns once the dispatcher has exited and the response body has been
    ///   released. A dispatcher that does not exit within the configured close
    ///   timeout is aborted.
    /// - No error is reported for a caller-initiated close. Records already
    ///   buffered in the channels stay receivable; the channels then report
    ///   closed.
    pub async fn close(&self) {
        let initiated = self.inner.state.request_stop();
        #[cfg(feature = "tracing")]
        if initiated {
            tracing::debug!(stream = self.inner.id, "close requested");
        }
        #[cfg(not(feature = "tracing"))]
        let _ = initiated;

        let mut rx = self.inner.state.subscribe();
        if tokio::time::timeout(self.inner.close_timeout, closed(&mut rx))
            .await
            .is_ok()
        {
            return;
        }

        let join = self
            .inner
            .join
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match join {
            Some(join) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(stream = self.inner.id, timeout = ?self.inner.close_timeout, "dispatcher did not stop in time; aborting");
                join.abort();
                let _ = join.await;
                self.inner.state.send_replace(StreamState::Closed);
            }
            // Another caller is aborting the dispatcher.
            None => closed(&mut rx).await,
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> StreamState {
        *self.inner.state.borrow()
    }

    /// True once the dispatcher has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.state().is_closed()
    }

    /// Counters for the stream so far.
    #[must_use]
    pub fn stats(&self) -> StatsSnapshot {
        self.inner.stats.snapshot()
    }

    /// Process-unique identifier of the stream, as used in log fields.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.inner.id
    }
}

/// Receivers of a stream, split from its [`StreamCloser`].
#[derive(Debug)]
pub struct StreamReceivers {
    /// Data messages, in stream order.
    pub tweets: mpsc::Receiver<DataMessage>,
    /// System notices, in stream order.
    pub notices: mpsc::Receiver<SystemNotice>,
    /// Decode errors, then at most one terminal error.
    pub errors: mpsc::Receiver<StreamError>,
}

/// Handle for one open stream.
///
/// Exposes the data, notice, and error channels and the close operation.
/// Each channel delivers in source order; ordering across channels is only
/// what receive order shows. All three channels report closed once the
/// dispatcher exits (end of body, transport error, or close).
#[derive(Debug)]
pub struct TweetStream {
    receivers: StreamReceivers,
    closer: StreamCloser,
}

impl TweetStream {
    pub(crate) const fn new(receivers: StreamReceivers, closer: StreamCloser) -> Self {
        Self { receivers, closer }
    }

    /// Data message receiver.
    pub fn tweets(&mut self) -> &mut mpsc::Receiver<DataMessage> {
        &mut self.receivers.tweets
    }

    /// System notice receiver.
    pub fn notices(&mut self) -> &mut mpsc::Receiver<SystemNotice> {
        &mut self.receivers.notices
    }

    /// Error receiver.
    pub fn errors(&mut self) -> &mut mpsc::Receiver<StreamError> {
        &mut self.receivers.errors
    }

    /// Receive the next item from whichever channel has one ready.
    ///
    /// Returns `None` once all three channels are closed and drained.
    pub async fn next_event(&mut self) -> Option<StreamEvent> {
        let r = &mut self.receivers;
        tokio::select! {
            Some(m) = r.tweets.recv() => Some(StreamEvent::Data(m)),
            Some(n) = r.notices.recv() => Some(StreamEvent::Notice(n)),
            Some(e) = r.errors.recv() => Some(StreamEvent::Error(e)),
            else => None,
        }
    }

    /// Turn the handle into a `Stream` of events; dropping it closes the stream.
    pub fn into_events(self) -> impl Stream<Item = StreamEvent> + Send {
        futures::stream::unfold(self, |mut s| async move {
            s.next_event().await.map(|ev| (ev, s))
        })
    }

    /// A cloneable closer for this stream.
    #[must_use]
    pub fn closer(&self) -> StreamCloser {
        self.closer.clone()
    }

    /// Split into the closer and the three receivers.
    ///
    /// Keep the closer alive while reading: dropping its last clone stops
    /// the stream.
    #[must_use]
    pub fn into_parts(self) -> (StreamCloser, StreamReceivers) {
        (self.closer, self.receivers)
    }

    /// Close the stream; see [`StreamCloser::close`].
    pub async fn close(&self) {
        self.closer.close().await;
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> StreamState {
        self.closer.state()
    }

    /// True once the dispatcher has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.closer.is_finished()
    }

    /// Counters for the stream so far.
    #[must_use]
    pub fn stats(&self) -> StatsSnapshot {
        self.closer.stats()
    }
}
