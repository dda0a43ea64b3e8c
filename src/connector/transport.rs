//! Transport primitives: endpoint descriptions and the streams they open.

use std::{
    io::{self, Write},
    net::{TcpStream, ToSocketAddrs},
    path::PathBuf,
    time::Duration,
};

#[cfg(feature = "tls")]
use native_tls::{TlsConnector, TlsStream};

#[cfg(unix)]
use std::os::unix::net::UnixStream;

use crate::error::BuildError;

/// Opens one raw stream connection to the collector.
///
/// The delivery loop owns whatever this returns and is the only code that
/// ever writes to it. Closures returning `io::Result<impl Write + Send>`
/// implement the trait, which keeps custom transports and tests cheap.
pub trait Dialer: Send + 'static {
    type Connection: Write + Send + 'static;

    fn dial(&self) -> io::Result<Self::Connection>;
}

impl<F, C> Dialer for F
where
    F: Fn() -> io::Result<C> + Send + 'static,
    C: Write + Send + 'static,
{
    type Connection = C;

    fn dial(&self) -> io::Result<C> {
        self()
    }
}

/// Collector endpoint targeted by the writer.
#[derive(Clone, Debug)]
pub enum Endpoint {
    /// TCP transport, optionally wrapped in TLS.
    Tcp(TcpEndpoint),
    /// Unix domain socket transport.
    Unix(UnixEndpoint),
}

impl Endpoint {
    pub(crate) fn validate(&self) -> Result<(), BuildError> {
        match self {
            Endpoint::Tcp(tcp) => tcp.validate(),
            Endpoint::Unix(unix) if unix.path.as_os_str().is_empty() => Err(
                BuildError::InvalidConfig("unix socket path must not be empty".into()),
            ),
            Endpoint::Unix(_) => Ok(()),
        }
    }
}

/// TCP endpoint configuration.
#[derive(Clone, Debug)]
pub struct TcpEndpoint {
    /// Collector address in `host:port` form.
    pub addr: String,
    /// Per-address dial timeout. `None` uses the operating system default.
    pub connect_timeout: Option<Duration>,
    #[cfg(feature = "tls")]
    pub tls: Option<TlsOptions>,
}

impl TcpEndpoint {
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            connect_timeout: None,
            #[cfg(feature = "tls")]
            tls: None,
        }
    }

    /// Host part of [`addr`](Self::addr), without IPv6 brackets.
    pub fn host(&self) -> &str {
        self.addr
            .rsplit_once(':')
            .map(|(host, _)| host.trim_start_matches('[').trim_end_matches(']'))
            .unwrap_or(&self.addr)
    }

    fn validate(&self) -> Result<(), BuildError> {
        let Some((host, port)) = self.addr.rsplit_once(':') else {
            return Err(BuildError::InvalidConfig(format!(
                "collector address '{}' must be in host:port form",
                self.addr
            )));
        };
        if host.trim().is_empty() {
            return Err(BuildError::InvalidConfig(
                "collector host must not be empty".into(),
            ));
        }
        if port.parse::<u16>().is_err() {
            return Err(BuildError::InvalidConfig(format!(
                "collector port '{port}' is not a valid port number"
            )));
        }
        if self.connect_timeout == Some(Duration::ZERO) {
            return Err(BuildError::InvalidConfig(
                "connect_timeout must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

/// Unix domain socket configuration.
#[derive(Clone, Debug)]
pub struct UnixEndpoint {
    /// Path to the socket file.
    pub path: PathBuf,
}

/// TLS connection options.
#[cfg(feature = "tls")]
#[derive(Clone, Debug)]
pub struct TlsOptions {
    /// Domain name presented during the TLS handshake.
    pub domain: String,
    /// Skip certificate validation when true (intended for tests).
    pub insecure_skip_verify: bool,
}

#[cfg(feature = "tls")]
impl TlsOptions {
    fn connector(&self) -> io::Result<TlsConnector> {
        let mut builder = TlsConnector::builder();
        if self.insecure_skip_verify {
            builder.danger_accept_invalid_certs(true);
            builder.danger_accept_invalid_hostnames(true);
        }
        builder.build().map_err(io::Error::other)
    }
}

/// Live stream opened by an [`EndpointDialer`].
pub enum Connection {
    Tcp(TcpStream),
    #[cfg(feature = "tls")]
    Tls(Box<TlsStream<TcpStream>>),
    #[cfg(unix)]
    Unix(UnixStream),
}

impl Write for Connection {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Connection::Tcp(stream) => stream.write(buf),
            #[cfg(feature = "tls")]
            Connection::Tls(stream) => stream.write(buf),
            #[cfg(unix)]
            Connection::Unix(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Connection::Tcp(stream) => stream.flush(),
            #[cfg(feature = "tls")]
            Connection::Tls(stream) => stream.flush(),
            #[cfg(unix)]
            Connection::Unix(stream) => stream.flush(),
        }
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self {
            Connection::Tcp(_) => "tcp",
            #[cfg(feature = "tls")]
            Connection::Tls(_) => "tls",
            #[cfg(unix)]
            Connection::Unix(_) => "unix",
        };
        f.debug_tuple("Connection").field(&kind).finish()
    }
}

/// Dialer for the endpoints described by [`WriterConfig`](crate::WriterConfig).
#[derive(Clone, Debug)]
pub struct EndpointDialer {
    endpoint: Endpoint,
    write_timeout: Option<Duration>,
}

impl EndpointDialer {
    pub fn new(endpoint: Endpoint, write_timeout: Option<Duration>) -> Self {
        Self {
            endpoint,
            write_timeout,
        }
    }
}

impl Dialer for EndpointDialer {
    type Connection = Connection;

    fn dial(&self) -> io::Result<Connection> {
        match &self.endpoint {
            Endpoint::Tcp(tcp) => {
                let stream = connect_tcp(tcp)?;
                stream.set_write_timeout(self.write_timeout)?;
                wrap_tls(tcp, stream)
            }
            Endpoint::Unix(unix) => connect_unix(unix, self.write_timeout),
        }
    }
}

fn connect_tcp(endpoint: &TcpEndpoint) -> io::Result<TcpStream> {
    let Some(timeout) = endpoint.connect_timeout else {
        return TcpStream::connect(endpoint.addr.as_str());
    };
    let mut last_err = None;
    for addr in endpoint.addr.to_socket_addrs()? {
        match TcpStream::connect_timeout(&addr, timeout) {
            Ok(stream) => return Ok(stream),
            Err(err) => last_err = Some(err),
        }
    }
    Err(last_err.unwrap_or_else(|| {
        io::Error::new(
            io::ErrorKind::NotFound,
            format!("{} did not resolve to any address", endpoint.addr),
        )
    }))
}

#[cfg(feature = "tls")]
fn wrap_tls(endpoint: &TcpEndpoint, stream: TcpStream) -> io::Result<Connection> {
    let Some(tls) = &endpoint.tls else {
        return Ok(Connection::Tcp(stream));
    };
    let connector = tls.connector()?;
    // The handshake is bounded by the dial timeout when one is set.
    let handshake_timeout = endpoint.connect_timeout;
    let write_timeout = stream.write_timeout()?;
    if handshake_timeout.is_some() {
        stream.set_read_timeout(handshake_timeout)?;
        stream.set_write_timeout(handshake_timeout)?;
    }
    let stream = connector
        .connect(&tls.domain, stream)
        .map_err(io::Error::other)?;
    stream.get_ref().set_read_timeout(None)?;
    stream.get_ref().set_write_timeout(write_timeout)?;
    Ok(Connection::Tls(Box::new(stream)))
}

#[cfg(not(feature = "tls"))]
fn wrap_tls(_endpoint: &TcpEndpoint, stream: TcpStream) -> io::Result<Connection> {
    Ok(Connection::Tcp(stream))
}

#[cfg(unix)]
fn connect_unix(endpoint: &UnixEndpoint, write_timeout: Option<Duration>) -> io::Result<Connection> {
    let stream = UnixStream::connect(&endpoint.path)?;
    stream.set_write_timeout(write_timeout)?;
    Ok(Connection::Unix(stream))
}

#[cfg(not(unix))]
fn connect_unix(endpoint: &UnixEndpoint, _write_timeout: Option<Duration>) -> io::Result<Connection> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        format!(
            "unix domain socket {} is not supported on this platform",
            endpoint.path.display()
        ),
    ))
}
