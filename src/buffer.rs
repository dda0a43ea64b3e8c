//! Bounded record queue with drop-oldest overflow.
//!
//! The queue is a `crossbeam_channel` bounded channel, so pushes from many
//! producers and pops from the delivery loop are already synchronised. The
//! buffer keeps its own receiver next to the sender so a producer that finds
//! the channel full can take the oldest record off the front and put its own
//! record on the back.

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};
use parking_lot::Mutex;

/// Fixed-capacity FIFO of opaque, already-serialised records.
///
/// `len() <= capacity()` always holds. When full, [`push`](Self::push)
/// discards the oldest record to admit the new one.
#[derive(Debug)]
pub struct RecordBuffer {
    tx: Sender<Vec<u8>>,
    rx: Receiver<Vec<u8>>,
    // Serialises evict-then-insert across producers. The normal path never
    // takes it.
    overflow_gate: Mutex<()>,
    capacity: usize,
}

impl RecordBuffer {
    /// Create a buffer holding up to `capacity` records.
    ///
    /// A capacity of zero is raised to one: a zero-sized channel would hand
    /// records straight to a waiting consumer and refuse them otherwise.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (tx, rx) = bounded(capacity);
        Self {
            tx,
            rx,
            overflow_gate: Mutex::new(()),
            capacity,
        }
    }

    /// Enqueue `record` without blocking, evicting from the front if needed.
    ///
    /// Returns the number of records evicted to make room, normally zero or
    /// one.
    pub fn push(&self, record: Vec<u8>) -> usize {
        let record = match self.tx.try_send(record) {
            Ok(()) => return 0,
            Err(TrySendError::Full(record)) => record,
            Err(TrySendError::Disconnected(_)) => return 0,
        };
        self.push_evicting(record)
    }

    fn push_evicting(&self, mut record: Vec<u8>) -> usize {
        let _gate = self.overflow_gate.lock();
        let mut evicted = 0;
        loop {
            if self.rx.try_recv().is_ok() {
                evicted += 1;
            }
            match self.tx.try_send(record) {
                Ok(()) => return evicted,
                // A producer on the normal path took the freed slot.
                Err(TrySendError::Full(back)) => record = back,
                Err(TrySendError::Disconnected(_)) => return evicted,
            }
        }
    }

    /// Remove the oldest record, if any, without blocking.
    pub fn try_pop(&self) -> Option<Vec<u8>> {
        self.rx.try_recv().ok()
    }

    /// Remove and return every record currently buffered, oldest first.
    pub fn drain(&self) -> Vec<Vec<u8>> {
        self.rx.try_iter().collect()
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Consumer handle for the delivery loop.
    pub(crate) fn receiver(&self) -> Receiver<Vec<u8>> {
        self.rx.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(buffer: &RecordBuffer) -> Vec<String> {
        buffer
            .drain()
            .into_iter()
            .map(|r| String::from_utf8(r).expect("utf8 record"))
            .collect()
    }

    #[test]
    fn keeps_insertion_order_below_capacity() {
        let buffer = RecordBuffer::new(4);
        for name in ["a", "b", "c"] {
            assert_eq!(buffer.push(name.into()), 0);
        }
        assert_eq!(buffer.len(), 3);
        assert_eq!(records(&buffer), ["a", "b", "c"]);
        assert!(buffer.is_empty());
    }

    #[test]
    fn overflow_evicts_the_oldest_record() {
        let buffer = RecordBuffer::new(3);
        for name in ["r1", "r2", "r3"] {
            buffer.push(name.into());
        }
        assert_eq!(buffer.push("r4".into()), 1);
        assert_eq!(buffer.len(), 3);
        assert_eq!(buffer.try_pop().as_deref(), Some(&b"r2"[..]));
        buffer.push("r5".into());
        assert_eq!(buffer.push("r6".into()), 1);
        assert_eq!(records(&buffer), ["r4", "r5", "r6"]);
    }

    #[test]
    fn successive_overflows_slide_the_window() {
        let buffer = RecordBuffer::new(2);
        let evicted: usize = (1..=5).map(|i| buffer.push(format!("r{i}").into())).sum();
        assert_eq!(evicted, 3);
        assert_eq!(records(&buffer), ["r4", "r5"]);
    }

    #[test]
    fn zero_capacity_is_raised_to_one() {
        let buffer = RecordBuffer::new(0);
        assert_eq!(buffer.capacity(), 1);
        buffer.push("first".into());
        assert_eq!(buffer.push("second".into()), 1);
        assert_eq!(records(&buffer), ["second"]);
    }
}
