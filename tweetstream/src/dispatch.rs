use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tweetstream_core::stream::stop_requested;
use tweetstream_core::{
    ByteSource, Classified, DataMessage, DecodeErrorPolicy, LineReader, RawLine, StreamError,
    StreamState, SystemNotice, classify,
};

use crate::stats::{Counter, StreamStats};

/// Sending halves of the three consumer channels.
pub(crate) struct Outputs {
    pub data: mpsc::Sender<DataMessage>,
    pub notices: mpsc::Sender<SystemNotice>,
    pub errors: mpsc::Sender<StreamError>,
}

impl Outputs {
    fn all_closed(&self) -> bool {
        self.data.is_closed() && self.notices.is_closed() && self.errors.is_closed()
    }

    async fn closed(&self) {
        tokio::join!(
            self.data.closed(),
            self.notices.closed(),
            self.errors.closed()
        );
    }
}

enum Delivery {
    Sent,
    ReceiverGone,
    Stopped,
}

#[derive(PartialEq, Eq)]
enum Flow {
    Continue,
    Stop,
}

/// Reader -> classifier -> channel pipeline for one stream.
///
/// Owns the body until it exits; the body is dropped before the shared
/// state is set to `Closed`.
pub(crate) struct Dispatcher<S> {
    pub id: u64,
    pub reader: LineReader<S>,
    pub out: Outputs,
    pub state: Arc<watch::Sender<StreamState>>,
    pub stop_rx: watch::Receiver<StreamState>,
    pub policy: DecodeErrorPolicy,
    pub stats: Arc<StreamStats>,
}

impl<S: ByteSource + 'static> Dispatcher<S> {
    pub(crate) fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    async fn run(mut self) {
        #[cfg(feature = "tracing")]
        tracing::debug!(stream = self.id, "dispatcher started");
        let mut consecutive: u32 = 0;

        loop {
            let next = tokio::select! {
                biased;
                () = stop_requested(&mut self.stop_rx) => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(stream = self.id, "stop requested");
                    break;
                }
                () = self.out.closed() => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(stream = self.id, "all receivers dropped");
                    break;
                }
                res = self.reader.next_line() => res,
            };

            let flow = match next {
                Ok(Some(line)) => self.handle_line(&line, &mut consecutive).await,
                Ok(None) => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(stream = self.id, "end of body");
                    Flow::Stop
                }
                Err(e) if e.is_decode() => {
                    self.stats.bump(Counter::Line);
                    self.handle_decode_error(e, &mut consecutive).await
                }
                Err(e) => {
                    #[cfg(feature = "tracing")]
                    tracing::error!(stream = self.id, error = %e, "transport failed");
                    self.deliver_error(e).await;
                    Flow::Stop
                }
            };
            if flow == Flow::Stop {
                break;
            }
        }

        self.finish();
    }

    async fn handle_line(&mut self, line: &RawLine, consecutive: &mut u32) -> Flow {
        self.stats.bump(Counter::Line);
        match classify(line.as_bytes()) {
            Ok(None) => {
                self.stats.bump(Counter::KeepAlive);
                #[cfg(feature = "tracing")]
                tracing::trace!(stream = self.id, "keep-alive");
                Flow::Continue
            }
            Ok(Some(Classified::Data(msg))) => {
                *consecutive = 0;
                self.stats.bump(Counter::Data);
                let delivery = deliver(&self.out.data, &mut self.stop_rx, msg).await;
                self.after_delivery(delivery, "data")
            }
            Ok(Some(Classified::Notice(notice))) => {
                *consecutive = 0;
                self.stats.bump(Counter::Notice);
                #[cfg(feature = "tracing")]
                tracing::debug!(stream = self.id, kind = %notice.kind(), message = %notice.body().message, "system notice");
                let delivery = deliver(&self.out.notices, &mut self.stop_rx, notice).await;
                self.after_delivery(delivery, "notice")
            }
            Err(e) => self.handle_decode_error(e, consecutive).await,
        }
    }

    async fn handle_decode_error(&mut self, err: StreamError, consecutive: &mut u32) -> Flow {
        *consecutive = consecutive.saturating_add(1);
        self.stats.bump(Counter::DecodeError);
        #[cfg(feature = "tracing")]
        tracing::warn!(stream = self.id, error = %err, consecutive = *consecutive, "record failed to decode");

        let delivery = deliver(&self.out.errors, &mut self.stop_rx, err).await;
        if self.after_delivery(delivery, "decode error") == Flow::Stop {
            return Flow::Stop;
        }

        if self.policy.trips(*consecutive) {
            #[cfg(feature = "tracing")]
            tracing::warn!(stream = self.id, consecutive = *consecutive, policy = ?self.policy, "decode error policy ends stream");
            self.deliver_error(StreamError::DecodePolicyExceeded {
                consecutive: *consecutive,
            })
            .await;
            return Flow::Stop;
        }
        Flow::Continue
    }

    async fn deliver_error(&mut self, err: StreamError) {
        let _ = deliver(&self.out.errors, &mut self.stop_rx, err).await;
    }

    fn after_delivery(&self, delivery: Delivery, what: &'static str) -> Flow {
        match delivery {
            Delivery::Sent => Flow::Continue,
            Delivery::Stopped => Flow::Stop,
            Delivery::ReceiverGone => {
                self.stats.bump(Counter::Dropped);
                #[cfg(feature = "tracing")]
                tracing::warn!(stream = self.id, what, "receiver dropped; discarding record");
                #[cfg(not(feature = "tracing"))]
                let _ = what;
                if self.out.all_closed() {
                    Flow::Stop
                } else {
                    Flow::Continue
                }
            }
        }
    }

    fn finish(self) {
        let Self {
            id,
            reader,
            out,
            state,
            ..
        } = self;
        // Release the body and close the channels before reporting Closed.
        drop(reader);
        drop(out);
        state.send_replace(StreamState::Closed);
        #[cfg(feature = "tracing")]
        tracing::debug!(stream = id, "dispatcher exited");
        #[cfg(not(feature = "tracing"))]
        let _ = id;
    }
}

async fn deliver<T>(
    tx: &mpsc::Sender<T>,
    stop_rx: &mut watch::Receiver<StreamState>,
    item: T,
) -> Delivery {
    if tx.is_closed() {
        return Delivery::ReceiverGone;
    }
    tokio::select! {
        biased;
        () = stop_requested(stop_rx) => Delivery::Stopped,
        res = tx.send(item) => match res {
            Ok(()) => Delivery::Sent,
            Err(_) => Delivery::ReceiverGone,
        },
    }
}
