//! Builder for [`AsyncWriter`](crate::AsyncWriter).
//!
//! Every setting is optional. Anything left unset takes its documented
//! default when [`WriterBuilder::build`] resolves the builder into a
//! [`WriterConfig`]. The builder also deserialises with `serde`, so an
//! embedding application can keep writer options in its own configuration
//! files.

use std::{path::PathBuf, time::Duration};

use serde::Deserialize;

#[cfg(feature = "tls")]
use crate::connector::TlsOptions;
use crate::{
    config::{DEFAULT_ADDR, RetryPolicy, WriterConfig},
    connector::{Endpoint, TcpEndpoint, UnixEndpoint},
    error::BuildError,
    writer::{AsyncWriter, CancelHandle},
};

macro_rules! ensure_positive {
    ($value:expr, $field:expr) => {{
        if $value == 0 {
            Err(BuildError::InvalidConfig(format!(
                "{} must be greater than zero",
                $field
            )))
        } else {
            Ok($value)
        }
    }};
}

macro_rules! option_setter {
    ($(#[$meta:meta])* $fn_name:ident, $field:ident, $ty:ty) => {
        $(#[$meta])*
        pub fn $fn_name(mut self, value: $ty) -> Self {
            self.$field = Some(value);
            self
        }
    };
}

/// Builder for constructing [`AsyncWriter`] instances.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WriterBuilder {
    addr: Option<String>,
    unix_path: Option<PathBuf>,
    buffer_size: Option<usize>,
    retry_delay_ms: Option<u64>,
    retry_count: Option<u32>,
    connect_timeout_ms: Option<u64>,
    write_timeout_ms: Option<u64>,
    warn_interval_ms: Option<u64>,
    #[cfg(feature = "tls")]
    tls_domain: Option<String>,
    #[cfg(feature = "tls")]
    tls_insecure: Option<bool>,
}

impl WriterBuilder {
    /// Create a builder with every setting at its default.
    pub fn new() -> Self {
        Self::default()
    }

    /// Target a TCP collector at `host:port`.
    pub fn with_addr(mut self, addr: impl Into<String>) -> Self {
        self.addr = Some(addr.into());
        self
    }

    /// Target a collector listening on a Unix domain socket.
    pub fn with_unix_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.unix_path = Some(path.into());
        self
    }

    /// Enable TLS on the TCP transport.
    ///
    /// The handshake presents `domain`, or the host part of the address when
    /// `domain` is `None`.
    #[cfg(feature = "tls")]
    pub fn with_tls(mut self, domain: Option<String>, insecure: bool) -> Self {
        self.tls_domain = domain;
        self.tls_insecure = Some(insecure);
        self
    }

    option_setter!(
        #[doc = "Set the record buffer capacity."]
        with_buffer_size,
        buffer_size,
        usize
    );
    option_setter!(
        #[doc = "Set the pause between two connection attempts."]
        with_retry_delay_ms,
        retry_delay_ms,
        u64
    );
    option_setter!(
        #[doc = "Set how many times a failed dial is retried."]
        with_retry_count,
        retry_count,
        u32
    );
    option_setter!(with_connect_timeout_ms, connect_timeout_ms, u64);
    option_setter!(with_write_timeout_ms, write_timeout_ms, u64);
    option_setter!(with_warn_interval_ms, warn_interval_ms, u64);

    /// Resolve the builder into a validated configuration.
    pub fn build_config(&self) -> Result<WriterConfig, BuildError> {
        self.validate()?;
        let mut config = WriterConfig::default();
        config.endpoint = self.build_endpoint();
        self.apply_optional_fields(&mut config);
        config.validate()?;
        Ok(config)
    }

    /// Build the writer and start its delivery loop.
    pub fn build(&self) -> Result<(AsyncWriter, CancelHandle), BuildError> {
        AsyncWriter::new(self.build_config()?)
    }

    fn validate(&self) -> Result<(), BuildError> {
        self.validate_transport()?;
        if let Some(size) = self.buffer_size {
            ensure_positive!(size, "buffer_size")?;
        }
        if let Some(timeout) = self.connect_timeout_ms {
            ensure_positive!(timeout, "connect_timeout_ms")?;
        }
        if let Some(timeout) = self.write_timeout_ms {
            ensure_positive!(timeout, "write_timeout_ms")?;
        }
        Ok(())
    }

    fn validate_transport(&self) -> Result<(), BuildError> {
        match (&self.addr, &self.unix_path) {
            (Some(_), Some(_)) => Err(BuildError::InvalidConfig(
                "addr and unix_path are mutually exclusive".into(),
            )),
            (Some(addr), None) if addr.trim().is_empty() => Err(BuildError::InvalidConfig(
                "addr must not be empty".into(),
            )),
            (None, Some(_)) if self.has_tls() => Err(BuildError::InvalidConfig(
                "tls is only supported for tcp transports".into(),
            )),
            (None, Some(_)) if self.connect_timeout_ms.is_some() => {
                Err(BuildError::InvalidConfig(
                    "connect_timeout_ms is only supported for tcp transports".into(),
                ))
            }
            _ => Ok(()),
        }
    }

    #[cfg(feature = "tls")]
    fn has_tls(&self) -> bool {
        self.tls_insecure.is_some() || self.tls_domain.is_some()
    }

    #[cfg(not(feature = "tls"))]
    fn has_tls(&self) -> bool {
        false
    }

    fn build_endpoint(&self) -> Endpoint {
        if let Some(path) = &self.unix_path {
            return Endpoint::Unix(UnixEndpoint { path: path.clone() });
        }
        let mut tcp = TcpEndpoint::new(self.addr.as_deref().unwrap_or(DEFAULT_ADDR).trim());
        tcp.connect_timeout = self.connect_timeout_ms.map(Duration::from_millis);
        #[cfg(feature = "tls")]
        {
            tcp.tls = self.build_tls_options(&tcp);
        }
        Endpoint::Tcp(tcp)
    }

    #[cfg(feature = "tls")]
    fn build_tls_options(&self, tcp: &TcpEndpoint) -> Option<TlsOptions> {
        if !self.has_tls() {
            return None;
        }
        let domain = self
            .tls_domain
            .clone()
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| tcp.host().to_owned());
        Some(TlsOptions {
            domain,
            insecure_skip_verify: self.tls_insecure.unwrap_or(false),
        })
    }

    fn apply_optional_fields(&self, config: &mut WriterConfig) {
        if let Some(size) = self.buffer_size {
            config.buffer_size = size;
        }
        let mut retry = RetryPolicy::default();
        if let Some(delay) = self.retry_delay_ms {
            retry.delay = Duration::from_millis(delay);
        }
        if let Some(count) = self.retry_count {
            retry.max_retries = count;
        }
        config.retry = retry;
        config.write_timeout = self.write_timeout_ms.map(Duration::from_millis);
        if let Some(interval) = self.warn_interval_ms {
            config.warn_interval = Duration::from_millis(interval);
        }
    }
}
