//! Configuration structures consumed by the writer lifecycle.
//!
//! [`WriterBuilder`](crate::WriterBuilder) resolves optional user settings
//! into a [`WriterConfig`] before the writer starts. The resolved value is
//! never mutated afterwards.

use std::time::Duration;

pub use crate::rate_limited_warner::DEFAULT_WARN_INTERVAL;
use crate::{
    connector::{Endpoint, TcpEndpoint},
    error::BuildError,
};

/// Default collector address, the standard Beats/TCP input port.
pub const DEFAULT_ADDR: &str = "localhost:5044";
/// Default number of records held while the collector is unreachable.
pub const DEFAULT_BUFFER_SIZE: usize = 1024;
/// Default pause between two connection attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(5);
/// Default number of retries after a failed dial.
pub const DEFAULT_RETRY_COUNT: u32 = 5;

/// Configuration object describing how to construct an
/// [`AsyncWriter`](crate::AsyncWriter).
#[derive(Clone, Debug)]
pub struct WriterConfig {
    pub endpoint: Endpoint,
    pub buffer_size: usize,
    pub retry: RetryPolicy,
    /// Upper bound on a single socket write. `None` lets a stalled peer block
    /// the delivery loop indefinitely.
    pub write_timeout: Option<Duration>,
    pub warn_interval: Duration,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            endpoint: Endpoint::Tcp(TcpEndpoint::new(DEFAULT_ADDR)),
            buffer_size: DEFAULT_BUFFER_SIZE,
            retry: RetryPolicy::default(),
            write_timeout: None,
            warn_interval: DEFAULT_WARN_INTERVAL,
        }
    }
}

impl WriterConfig {
    /// Override the collector endpoint.
    pub fn with_endpoint(mut self, endpoint: Endpoint) -> Self {
        self.endpoint = endpoint;
        self
    }

    /// Override the buffer capacity.
    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    /// Override the reconnection policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub(crate) fn validate(&self) -> Result<(), BuildError> {
        if self.buffer_size == 0 {
            return Err(BuildError::InvalidConfig(
                "buffer_size must be greater than zero".into(),
            ));
        }
        if self.write_timeout == Some(Duration::ZERO) {
            return Err(BuildError::InvalidConfig(
                "write_timeout must be greater than zero".into(),
            ));
        }
        self.endpoint.validate()
    }
}

/// Fixed-delay reconnection policy used by the connector.
///
/// A dial that fails is retried up to `max_retries` times, waiting `delay`
/// before each retry, so one connection cycle makes at most
/// `max_retries + 1` dials.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub delay: Duration,
    pub max_retries: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            delay: DEFAULT_RETRY_DELAY,
            max_retries: DEFAULT_RETRY_COUNT,
        }
    }
}

impl RetryPolicy {
    pub fn new(delay: Duration, max_retries: u32) -> Self {
        Self { delay, max_retries }
    }
}
