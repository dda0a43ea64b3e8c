//! Rate-limited warnings for records the writer gives up on.
//!
//! Records are lost in three places: the producer side evicts the oldest
//! record when the buffer is full, and the delivery loop drops a record when
//! it cannot dial the collector or when the write fails. Each cause keeps its
//! own counter so the summaries stay meaningful during long outages.

use std::time::Duration;

use log::warn;

use crate::rate_limited_warner::RateLimitedWarner;

/// Categorises why a record was dropped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum DropReason {
    Evicted,
    DialFailed,
    WriteFailed,
}

/// Tracks dropped records and emits rate-limited warnings.
#[derive(Debug)]
pub(crate) struct DropWarner {
    evicted: RateLimitedWarner,
    dial_failed: RateLimitedWarner,
    write_failed: RateLimitedWarner,
}

impl DropWarner {
    pub(crate) fn new(interval: Duration) -> Self {
        Self {
            evicted: RateLimitedWarner::new(interval),
            dial_failed: RateLimitedWarner::new(interval),
            write_failed: RateLimitedWarner::new(interval),
        }
    }

    pub(crate) fn record(&self, reason: DropReason) {
        self.record_many(reason, 1);
    }

    pub(crate) fn record_many(&self, reason: DropReason, count: usize) {
        if count == 0 {
            return;
        }
        let warner = self.warner(reason);
        for _ in 0..count {
            warner.record_drop();
        }
        warner.warn_if_due(|count| emit(reason, count));
    }

    /// Report every pending count regardless of the interval.
    pub(crate) fn flush(&self) {
        for reason in [
            DropReason::Evicted,
            DropReason::DialFailed,
            DropReason::WriteFailed,
        ] {
            self.warner(reason).flush(|count| emit(reason, count));
        }
    }

    fn warner(&self, reason: DropReason) -> &RateLimitedWarner {
        match reason {
            DropReason::Evicted => &self.evicted,
            DropReason::DialFailed => &self.dial_failed,
            DropReason::WriteFailed => &self.write_failed,
        }
    }
}

fn emit(reason: DropReason, count: u64) {
    match reason {
        DropReason::Evicted => {
            warn!("AsyncWriter: {count} log records evicted because the buffer was full");
        }
        DropReason::DialFailed => {
            warn!("AsyncWriter: {count} log records dropped; no connection to the collector");
        }
        DropReason::WriteFailed => {
            warn!("AsyncWriter: {count} log records dropped due to write errors");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_are_kept_per_reason() {
        let warner = DropWarner::new(Duration::from_secs(60));
        warner.record_many(DropReason::Evicted, 3);
        warner.record(DropReason::Evicted);
        warner.record(DropReason::WriteFailed);
        // The first report per reason is immediate; later ones wait.
        assert_eq!(warner.evicted.pending(), 1);
        assert_eq!(warner.write_failed.pending(), 0);
        assert_eq!(warner.dial_failed.pending(), 0);
        warner.flush();
        assert_eq!(warner.evicted.pending(), 0);
    }

    #[test]
    fn zero_count_is_ignored() {
        let warner = DropWarner::new(Duration::from_secs(60));
        warner.record_many(DropReason::DialFailed, 0);
        warner.record(DropReason::DialFailed);
        assert_eq!(warner.dial_failed.pending(), 0);
    }
}
