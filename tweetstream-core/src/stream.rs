use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Lifecycle of one open stream: `Open -> Closing -> Closed`, or
/// `Open -> Closed` when the body ends on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StreamState {
    /// The dispatcher is running.
    #[default]
    Open,
    /// A close was requested; the dispatcher has not exited yet.
    Closing,
    /// The dispatcher exited and the body was released.
    Closed,
}

impl StreamState {
    /// True while no stop has been requested and the dispatcher is running.
    #[must_use]
    pub const fn is_open(self) -> bool {
        matches!(self, Self::Open)
    }

    /// True once the dispatcher has exited.
    #[must_use]
    pub const fn is_closed(self) -> bool {
        matches!(self, Self::Closed)
    }
}

/// Abstraction over a handle that can be queried for completion and aborted.
pub trait Abortable {
    /// Abort the underlying task if it is still running.
    fn abort(&mut self);
    /// Return `true` if the underlying task has completed.
    fn is_finished(&self) -> bool;
}

impl Abortable for JoinHandle<()> {
    fn abort(&mut self) {
        // JoinHandle::abort takes &self
        Self::abort(self);
    }

    fn is_finished(&self) -> bool {
        Self::is_finished(self)
    }
}

/// Abstraction over a shared stop signal.
pub trait Stoppable {
    /// Request a graceful stop.
    ///
    /// Returns `true` only for the call that moved the stream out of `Open`;
    /// repeated or concurrent calls return `false`.
    fn request_stop(&self) -> bool;
}

impl Stoppable for watch::Sender<StreamState> {
    fn request_stop(&self) -> bool {
        self.send_if_modified(|state| {
            if state.is_open() {
                *state = StreamState::Closing;
                true
            } else {
                false
            }
        })
    }
}

/// Resolve once a stop has been requested or the state sender is gone.
pub async fn stop_requested(rx: &mut watch::Receiver<StreamState>) {
    let _ = rx.wait_for(|state| !state.is_open()).await;
}

/// Resolve once the stream reached `Closed` or the state sender is gone.
pub async fn closed(rx: &mut watch::Receiver<StreamState>) {
    let _ = rx.wait_for(|state| state.is_closed()).await;
}

/// Drop-time logic for stream handles:
/// - request a graceful stop
/// - abort the task if it hasn't finished yet
pub fn drop_impl<H, S>(inner: &mut Option<H>, stop: &S)
where
    H: Abortable,
    S: Stoppable,
{
    stop.request_stop();
    if let Some(mut h) = inner.take()
        && !h.is_finished()
    {
        h.abort();
    }
}
