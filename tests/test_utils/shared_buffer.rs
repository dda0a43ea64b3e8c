//! In-memory stand-in for a collector connection.

use std::{
    io::{self, Write},
    sync::{Arc, Mutex},
};

/// Thread-safe byte buffer that a test dialer can hand out as a connection.
///
/// Every clone appends to the same storage, so reconnects keep writing to
/// one place and the test can inspect the combined stream.
#[derive(Clone, Default)]
pub struct SharedBuf {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuf {
    /// Return a snapshot of the buffer contents.
    pub fn contents(&self) -> Vec<u8> {
        self.buffer.lock().expect("SharedBuf mutex poisoned").clone()
    }

    /// Return the contents split into newline-terminated records.
    pub fn lines(&self) -> Vec<String> {
        String::from_utf8(self.contents())
            .expect("utf8 output")
            .lines()
            .map(str::to_owned)
            .collect()
    }
}

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer
            .lock()
            .expect("SharedBuf mutex poisoned")
            .write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
