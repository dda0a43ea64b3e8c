//! Bounded, fixed-delay reconnection.

use crossbeam_channel::{Receiver, RecvTimeoutError};
use log::{debug, warn};

use crate::{config::RetryPolicy, error::ConnectError};

use super::Dialer;

/// Dial the collector, retrying up to `policy.max_retries` times.
///
/// Attempt `n` is followed by a pause of `policy.delay` and attempt `n + 1`
/// for as long as `n < policy.max_retries`. The pause waits on `cancel`
/// rather than sleeping, so the cycle ends with
/// [`ConnectError::Cancelled`] as soon as the writer is cancelled or the
/// sending side of `cancel` is dropped.
///
/// This blocks the calling thread for up to `max_retries` pauses plus the
/// time spent inside each dial.
pub fn connect<D: Dialer>(
    dialer: &D,
    policy: &RetryPolicy,
    cancel: &Receiver<()>,
) -> Result<D::Connection, ConnectError> {
    let mut attempt: u32 = 0;
    loop {
        match dialer.dial() {
            Ok(conn) => {
                if attempt > 0 {
                    debug!("connected to log collector after {attempt} retries");
                }
                return Ok(conn);
            }
            Err(err) if attempt < policy.max_retries => {
                warn!(
                    "could not open connection to log collector: {err}; retrying in {:?} (attempt {} of {})",
                    policy.delay,
                    attempt + 1,
                    policy.max_retries
                );
                if cancelled_during(cancel, policy) {
                    return Err(ConnectError::Cancelled);
                }
                attempt += 1;
            }
            Err(source) => {
                return Err(ConnectError::Exhausted {
                    attempts: attempt + 1,
                    source,
                });
            }
        }
    }
}

fn cancelled_during(cancel: &Receiver<()>, policy: &RetryPolicy) -> bool {
    match cancel.recv_timeout(policy.delay) {
        Err(RecvTimeoutError::Timeout) => false,
        Ok(()) | Err(RecvTimeoutError::Disconnected) => true,
    }
}
