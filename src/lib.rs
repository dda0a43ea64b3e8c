//! Non-blocking forwarding of serialised log records to a remote collector.
//!
//! Producers hand already-formatted records to an [`AsyncWriter`]. The writer
//! queues them in a bounded [`RecordBuffer`] and a single delivery thread
//! streams them over one persistent connection, by default to a Logstash
//! TCP input on `localhost:5044`. Submitting never blocks on the network:
//! when the collector is slow or unreachable the buffer fills up and the
//! oldest records are evicted first.
//!
//! ```no_run
//! use std::io::Write;
//!
//! use logstash_async::WriterBuilder;
//!
//! let (writer, cancel) = WriterBuilder::new()
//!     .with_addr("127.0.0.1:5044")
//!     .with_buffer_size(4096)
//!     .build()?;
//! writer.submit(b"{\"message\":\"started\"}\n".to_vec());
//! let line = format!("{{\"message\":\"{}\"}}\n", "via io::Write");
//! (&writer).write_all(line.as_bytes())?;
//! cancel.cancel();
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod buffer;
mod builder;
mod config;
pub mod connector;
mod delivery;
mod drop_warner;
mod error;
mod rate_limited_warner;
mod writer;

pub use buffer::RecordBuffer;
pub use builder::WriterBuilder;
pub use config::{
    DEFAULT_ADDR, DEFAULT_BUFFER_SIZE, DEFAULT_RETRY_COUNT, DEFAULT_RETRY_DELAY,
    DEFAULT_WARN_INTERVAL, RetryPolicy, WriterConfig,
};
pub use connector::{Dialer, Endpoint, TcpEndpoint, UnixEndpoint};
pub use error::{BuildError, ConnectError};
pub use writer::{AsyncWriter, CancelHandle};
