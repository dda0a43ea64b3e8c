//! Public writer type exported by the crate.

use std::{
    io::{self, Write},
    thread::JoinHandle,
    time::Duration,
};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, bounded};
use parking_lot::Mutex;

use crate::{
    buffer::RecordBuffer,
    config::WriterConfig,
    connector::{Dialer, EndpointDialer},
    delivery::{DeliveryLoop, spawn_delivery},
    drop_warner::{DropReason, DropWarner},
    error::BuildError,
};

/// Fire-and-forget writer forwarding records to a remote log collector.
///
/// Delivery is **at-most-once, best-effort, oldest-dropped-first**:
///
/// * [`submit`](Self::submit) never blocks on the network and always reports
///   success. The caller receives no backpressure and no confirmation.
/// * When the buffer is full the oldest unsent record is discarded to admit
///   the new one.
/// * A record is written at most once. Records lost to a failed dial or a
///   failed write are not retried.
/// * Records that survive are delivered in submission order.
///
/// Dropping the writer lets the delivery loop drain what is left in the
/// buffer and exit. Use the [`CancelHandle`] returned alongside it to stop
/// delivery without draining.
#[derive(Debug)]
pub struct AsyncWriter {
    buffer: RecordBuffer,
    warner: DropWarner,
}

impl AsyncWriter {
    /// Start a writer for the endpoint described by `config`.
    pub fn new(config: WriterConfig) -> Result<(Self, CancelHandle), BuildError> {
        config.validate()?;
        let dialer = EndpointDialer::new(config.endpoint.clone(), config.write_timeout);
        Self::with_dialer(config, dialer)
    }

    /// Start a writer that opens connections through `dialer`.
    ///
    /// The endpoint in `config` is ignored; the buffer, retry and warning
    /// settings still apply.
    pub fn with_dialer<D: Dialer>(
        config: WriterConfig,
        dialer: D,
    ) -> Result<(Self, CancelHandle), BuildError> {
        if config.buffer_size == 0 {
            return Err(BuildError::InvalidConfig(
                "buffer_size must be greater than zero".into(),
            ));
        }
        let buffer = RecordBuffer::new(config.buffer_size);
        let (cancel_tx, cancel_rx) = bounded::<()>(1);
        let (stopped_tx, stopped_rx) = bounded::<()>(1);
        let delivery = DeliveryLoop::new(
            dialer,
            config.retry,
            buffer.receiver(),
            cancel_rx,
            DropWarner::new(config.warn_interval),
        );
        let worker = spawn_delivery(delivery, stopped_tx, cancel_tx.clone())?;
        let writer = Self {
            buffer,
            warner: DropWarner::new(config.warn_interval),
        };
        let cancel = CancelHandle {
            signal: Mutex::new(Some(cancel_tx)),
            stopped: stopped_rx,
            worker: Mutex::new(Some(worker)),
        };
        Ok((writer, cancel))
    }

    /// Queue one record for delivery and report its full length as accepted.
    ///
    /// The bytes are sent exactly as given; framing (for example a trailing
    /// newline) is the caller's job.
    pub fn submit(&self, record: impl Into<Vec<u8>>) -> usize {
        let record = record.into();
        let len = record.len();
        let evicted = self.buffer.push(record);
        self.warner.record_many(DropReason::Evicted, evicted);
        len
    }

    /// Maximum number of records held while waiting for delivery.
    pub fn capacity(&self) -> usize {
        self.buffer.capacity()
    }

    /// Records currently waiting for delivery.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

/// Each `write` call becomes one record. Formatting macros such as
/// `writeln!` issue several writes per line, so format into a buffer first
/// when a line must travel as a single record.
impl Write for AsyncWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(self.submit(buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Write for &AsyncWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(self.submit(buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for AsyncWriter {
    fn drop(&mut self) {
        self.warner.flush();
    }
}

/// Single-shot cancellation for the delivery loop of one [`AsyncWriter`].
///
/// Cancelling stops the loop between records and aborts any pending retry
/// pause. Records still buffered are not flushed, and the socket is simply
/// dropped with the loop. Dropping the handle does not cancel; without an
/// explicit [`cancel`](Self::cancel) the loop runs until the writer is
/// dropped and the buffer has drained.
#[derive(Debug)]
pub struct CancelHandle {
    signal: Mutex<Option<Sender<()>>>,
    stopped: Receiver<()>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl CancelHandle {
    /// Fire the cancellation signal. Later calls do nothing.
    pub fn cancel(&self) {
        let Some(signal) = self.signal.lock().take() else {
            return;
        };
        // Fails only when the loop has already exited.
        let _ = signal.try_send(());
    }

    pub fn is_cancelled(&self) -> bool {
        self.signal.lock().is_none()
    }

    /// Wait up to `timeout` for the delivery thread to exit.
    ///
    /// Returns `true` once the thread has finished. A loop blocked inside a
    /// dial or a write only notices cancellation when that call returns.
    pub fn wait_stopped(&self, timeout: Duration) -> bool {
        match self.stopped.recv_timeout(timeout) {
            Err(RecvTimeoutError::Timeout) => false,
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                self.join_worker();
                true
            }
        }
    }

    fn join_worker(&self) {
        let Some(handle) = self.worker.lock().take() else {
            return;
        };
        if handle.join().is_err() {
            log::warn!("AsyncWriter: delivery thread panicked");
        }
    }
}
