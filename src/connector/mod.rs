//! Connection establishment for the delivery loop.
//!
//! [`Dialer`] produces one raw stream to the collector. [`connect`] wraps a
//! dialer with the fixed-delay, bounded retry policy and watches the
//! cancellation signal while it waits between attempts.

mod retry;
mod transport;


pub use retry::connect;
#[cfg(feature = "tls")]
pub use transport::TlsOptions;
pub use transport::{Connection, Dialer, Endpoint, EndpointDialer, TcpEndpoint, UnixEndpoint};
