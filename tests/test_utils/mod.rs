//! Helpers shared by the integration tests: an in-memory connection and a
//! line-oriented TCP collector.
#![allow(dead_code)]

pub mod collector;
pub mod shared_buffer;

use std::{
    thread,
    time::{Duration, Instant},
};

pub use collector::{Collected, TcpCollector};
pub use shared_buffer::SharedBuf;

/// Poll `condition` until it holds or `timeout` elapses.
pub fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    condition()
}
