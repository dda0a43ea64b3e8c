//! Worker thread driving socket I/O.
//!
//! The loop is the only owner of the collector connection. It drains the
//! record buffer one record at a time, dials lazily, and on a failed write
//! throws the connection away and dials again. A record that could not be
//! written is dropped, never retried.

use std::{
    io::{self, Write},
    ops::ControlFlow,
    thread::{self, JoinHandle},
};

use crossbeam_channel::{Receiver, Sender, TryRecvError, select};
use log::{debug, info, warn};

use crate::{
    config::RetryPolicy,
    connector::{self, Dialer},
    drop_warner::{DropReason, DropWarner},
    error::ConnectError,
};

const THREAD_NAME: &str = "logstash-delivery";

pub(crate) struct DeliveryLoop<D: Dialer> {
    dialer: D,
    retry: RetryPolicy,
    records: Receiver<Vec<u8>>,
    cancel: Receiver<()>,
    connection: Option<D::Connection>,
    warner: DropWarner,
}

/// Start the delivery thread.
///
/// `stopped` is dropped when the loop returns, which disconnects the paired
/// receiver and lets the owner observe termination. The thread holds
/// `cancel_guard` until it exits, so only an explicit message on the cancel
/// channel stops the loop.
pub(crate) fn spawn_delivery<D: Dialer>(
    delivery: DeliveryLoop<D>,
    stopped: Sender<()>,
    cancel_guard: Sender<()>,
) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name(THREAD_NAME.into())
        .spawn(move || {
            delivery.run();
            drop(cancel_guard);
            drop(stopped);
        })
}

impl<D: Dialer> DeliveryLoop<D> {
    pub(crate) fn new(
        dialer: D,
        retry: RetryPolicy,
        records: Receiver<Vec<u8>>,
        cancel: Receiver<()>,
        warner: DropWarner,
    ) -> Self {
        Self {
            dialer,
            retry,
            records,
            cancel,
            connection: None,
            warner,
        }
    }

    pub(crate) fn run(mut self) {
        // Local handles keep `self` free for `&mut` use inside the arms.
        let records = self.records.clone();
        let cancel = self.cancel.clone();
        loop {
            select! {
                recv(records) -> msg => {
                    let Ok(record) = msg else {
                        debug!("record buffer closed; delivery loop exiting");
                        break;
                    };
                    if self.deliver(record).is_break() {
                        break;
                    }
                }
                recv(cancel) -> _ => break,
            }
        }
        self.warner.flush();
        info!("writing to the log collector has ended");
    }

    fn is_cancelled(&self) -> bool {
        matches!(
            self.cancel.try_recv(),
            Ok(()) | Err(TryRecvError::Disconnected)
        )
    }

    fn deliver(&mut self, record: Vec<u8>) -> ControlFlow<()> {
        if self.is_cancelled() {
            return ControlFlow::Break(());
        }
        if self.connection.is_none() {
            self.establish()?;
            if self.is_cancelled() {
                return ControlFlow::Break(());
            }
        }
        let Some(conn) = self.connection.as_mut() else {
            self.warner.record(DropReason::DialFailed);
            return ControlFlow::Continue(());
        };
        if let Err(err) = write_record(conn, &record) {
            warn!("connection to log collector is down: {err}");
            self.connection = None;
            self.warner.record(DropReason::WriteFailed);
            self.establish()?;
        }
        ControlFlow::Continue(())
    }

    fn establish(&mut self) -> ControlFlow<()> {
        match connector::connect(&self.dialer, &self.retry, &self.cancel) {
            Ok(conn) => {
                info!("connected to log collector");
                self.connection = Some(conn);
                ControlFlow::Continue(())
            }
            Err(ConnectError::Cancelled) => ControlFlow::Break(()),
            Err(err @ ConnectError::Exhausted { .. }) => {
                warn!("{err}");
                ControlFlow::Continue(())
            }
        }
    }
}

fn write_record<W: Write>(conn: &mut W, record: &[u8]) -> io::Result<()> {
    conn.write_all(record)?;
    conn.flush()
}
