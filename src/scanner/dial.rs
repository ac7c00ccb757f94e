//! The dial primitive the probe is built on.
//!
//! Scanning logic only ever talks to a [`Dialer`], so tests can swap the
//! network for scripted endpoints and count in-flight connection attempts.

use async_trait::async_trait;
use std::io;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;

/// An established, bidirectional connection.
pub trait Connection: AsyncRead + AsyncWrite + Send + Unpin {}

impl<T> Connection for T where T: AsyncRead + AsyncWrite + Send + Unpin {}

/// A connection behind dynamic dispatch.
pub type BoxedConnection = Box<dyn Connection>;

/// Opens connection-oriented sessions to `(host, port)`.
///
/// Timeouts are applied by the caller; implementations may block for as
/// long as the underlying connect does.
#[async_trait]
pub trait Dialer: Send + Sync {
    async fn dial(&self, host: &str, port: u16) -> io::Result<BoxedConnection>;
}

/// Plain TCP via the tokio runtime. Hostnames are resolved on each dial.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpDialer;

#[async_trait]
impl Dialer for TcpDialer {
    async fn dial(&self, host: &str, port: u16) -> io::Result<BoxedConnection> {
        let stream = TcpStream::connect((host, port)).await?;
        Ok(Box::new(stream))
    }
}
