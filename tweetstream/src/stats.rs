use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Live counters for one stream, updated by its dispatcher.
#[derive(Debug, Default)]
pub(crate) struct StreamStats {
    lines: AtomicU64,
    keep_alives: AtomicU64,
    data_messages: AtomicU64,
    notices: AtomicU64,
    decode_errors: AtomicU64,
    dropped: AtomicU64,
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum Counter {
    Line,
    KeepAlive,
    Data,
    Notice,
    DecodeError,
    Dropped,
}

impl StreamStats {
    pub(crate) fn bump(&self, counter: Counter) {
        let cell = match counter {
            Counter::Line => &self.lines,
            Counter::KeepAlive => &self.keep_alives,
            Counter::Data => &self.data_messages,
            Counter::Notice => &self.notices,
            Counter::DecodeError => &self.decode_errors,
            Counter::Dropped => &self.dropped,
        };
        cell.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            lines: self.lines.load(Ordering::Relaxed),
            keep_alives: self.keep_alives.load(Ordering::Relaxed),
            data_messages: self.data_messages.load(Ordering::Relaxed),
            notices: self.notices.load(Ordering::Relaxed),
            decode_errors: self.decode_errors.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of a stream's counters.
///
/// Counts are taken when a record is classified, before delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatsSnapshot {
    /// Records read from the body, keep-alives included.
    pub lines: u64,
    /// Blank keep-alive records.
    pub keep_alives: u64,
    /// Records classified as data messages.
    pub data_messages: u64,
    /// Records classified as system notices.
    pub notices: u64,
    /// Records that failed to decode.
    pub decode_errors: u64,
    /// Classified records discarded because their receiver was dropped.
    pub dropped: u64,
}
