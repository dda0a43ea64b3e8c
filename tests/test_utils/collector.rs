//! Minimal line-based TCP collector for end-to-end tests.

use std::{
    io::{BufRead, BufReader},
    net::{SocketAddr, TcpListener, TcpStream},
    thread,
    time::Duration,
};

use crossbeam_channel::{Receiver, Sender, unbounded};

/// One line received by the collector, tagged with the connection it came on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Collected {
    pub connection: usize,
    pub line: String,
}

/// Accepts any number of connections and forwards each received line.
///
/// When `close_first_after` is set, the first connection is shut down after
/// that many lines so tests can exercise the reconnect path.
pub struct TcpCollector {
    pub addr: SocketAddr,
    lines: Receiver<Collected>,
    closed: Receiver<usize>,
}

impl TcpCollector {
    pub fn start() -> Self {
        Self::start_with(None)
    }

    pub fn start_closing_first_after(lines: usize) -> Self {
        Self::start_with(Some(lines))
    }

    fn start_with(close_first_after: Option<usize>) -> Self {
        let listener = TcpListener::bind(("127.0.0.1", 0)).expect("bind ephemeral listener");
        let addr = listener.local_addr().expect("listener has address");
        let (line_tx, lines) = unbounded();
        let (closed_tx, closed) = unbounded();
        thread::spawn(move || {
            for (connection, stream) in listener.incoming().enumerate() {
                let Ok(stream) = stream else { break };
                let limit = if connection == 0 { close_first_after } else { None };
                let line_tx = line_tx.clone();
                let closed_tx = closed_tx.clone();
                thread::spawn(move || read_lines(connection, stream, limit, line_tx, closed_tx));
            }
        });
        Self {
            addr,
            lines,
            closed,
        }
    }

    /// Wait for the next line.
    pub fn recv(&self, timeout: Duration) -> Option<Collected> {
        self.lines.recv_timeout(timeout).ok()
    }

    /// Wait for `count` lines, returning whatever arrived before `timeout`.
    pub fn recv_many(&self, count: usize, timeout: Duration) -> Vec<Collected> {
        let mut received = Vec::with_capacity(count);
        while received.len() < count {
            match self.recv(timeout) {
                Some(line) => received.push(line),
                None => break,
            }
        }
        received
    }

    /// Wait for the connection with index `connection` to reach end of stream.
    pub fn wait_closed(&self, connection: usize, timeout: Duration) -> bool {
        while let Ok(closed) = self.closed.recv_timeout(timeout) {
            if closed == connection {
                return true;
            }
        }
        false
    }
}

fn read_lines(
    connection: usize,
    stream: TcpStream,
    limit: Option<usize>,
    lines: Sender<Collected>,
    closed: Sender<usize>,
) {
    let reader = BufReader::new(stream);
    for (n, line) in reader.lines().enumerate() {
        let Ok(line) = line else { break };
        let _ = lines.send(Collected { connection, line });
        if limit.is_some_and(|limit| n + 1 >= limit) {
            break;
        }
    }
    let _ = closed.send(connection);
}
