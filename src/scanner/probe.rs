//! Connectivity probe.
//!
//! Performs TCP connect probes through a [`Dialer`]. Completing the
//! handshake marks a port open; the way the attempt fails decides between
//! closed (actively refused) and filtered (no answer, unreachable).

use crate::banner::grab_banner;
use crate::config::ScannerConfig;
use crate::error::ProbeError;
use crate::report::Reporter;
use crate::scanner::dial::{BoxedConnection, Dialer, TcpDialer};
use crate::scanner::rate_limiter::RateLimiter;
use crate::scanner::results::{PortStatus, ProbeResult};
use crate::types::Port;
use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;

/// Probes single ports of a host.
///
/// One `Prober` is built per scan invocation and shared by all of its tasks.
#[derive(Clone)]
pub struct Prober {
    dialer: Arc<dyn Dialer>,
    timeout: Duration,
    attempts: u32,
    grab_banners: bool,
    banner_timeout: Duration,
    limiter: Option<RateLimiter>,
    reporter: Reporter,
}

impl Prober {
    /// Create a prober with the connect timeout, retry and banner settings of `config`.
    pub fn new(dialer: Arc<dyn Dialer>, config: &ScannerConfig) -> Self {
        Self {
            dialer,
            timeout: config.timeout(),
            attempts: config.retries.max(1),
            grab_banners: config.version_detection,
            banner_timeout: config.banner_timeout(),
            limiter: config.rate_limit().and_then(RateLimiter::with_interval),
            reporter: Reporter::new(config.verbose),
        }
    }

    /// Connect to `host:port`, retrying timeouts up to the configured attempt count.
    pub async fn connect(&self, host: &str, port: u16) -> Result<BoxedConnection, ProbeError> {
        self.timed_connect(host, port).await.0
    }

    /// Like [`connect`](Self::connect), also returning how long the settling
    /// attempt took. Rate-limiter waits and earlier attempts are not counted.
    async fn timed_connect(
        &self,
        host: &str,
        port: u16,
    ) -> (Result<BoxedConnection, ProbeError>, Duration) {
        let mut attempt = 1;
        loop {
            match self.attempt_connect(host, port).await {
                (Err(ProbeError::Timeout), _) if attempt < self.attempts => attempt += 1,
                settled => return settled,
            }
        }
    }

    async fn attempt_connect(
        &self,
        host: &str,
        port: u16,
    ) -> (Result<BoxedConnection, ProbeError>, Duration) {
        if let Some(limiter) = &self.limiter {
            limiter.wait().await;
        }

        let start = Instant::now();
        let outcome = match timeout(self.timeout, self.dialer.dial(host, port)).await {
            Ok(Ok(stream)) => Ok(stream),
            Ok(Err(e)) => Err(classify_error(host, port, &e)),
            Err(_) => Err(ProbeError::Timeout),
        };
        (outcome, start.elapsed())
    }

    /// Probe one port and report its state.
    pub async fn probe(&self, host: &str, port: Port) -> ProbeResult {
        let (outcome, response_time) = self.timed_connect(host, port.as_u16()).await;

        let result = match outcome {
            Ok(mut stream) => {
                let banner = if self.grab_banners {
                    grab_banner(&mut stream, port.as_u16(), self.banner_timeout).await
                } else {
                    None
                };
                drop(stream);

                ProbeResult::new(port, PortStatus::Open)
                    .with_banner(banner)
                    .with_response_time(response_time)
            }
            Err(e) => {
                let status = match e {
                    ProbeError::ConnectionRefused => PortStatus::Closed,
                    ProbeError::Timeout
                    | ProbeError::HostUnreachable
                    | ProbeError::NetworkUnreachable(_) => PortStatus::Filtered,
                    ProbeError::ConnectionFailed { .. } => PortStatus::Closed,
                };

                ProbeResult::new(port, status).with_response_time(response_time)
            }
        };

        self.reporter.probe(host, &result);
        result
    }
}

/// Map a dial failure onto the probe error taxonomy.
fn classify_error(host: &str, port: u16, e: &io::Error) -> ProbeError {
    match e.kind() {
        io::ErrorKind::ConnectionRefused => ProbeError::ConnectionRefused,
        io::ErrorKind::TimedOut => ProbeError::Timeout,
        io::ErrorKind::HostUnreachable => ProbeError::HostUnreachable,
        io::ErrorKind::NetworkUnreachable => ProbeError::NetworkUnreachable(e.to_string()),
        _ => {
            let message = e.to_string().to_lowercase();
            if message.contains("unreachable") || message.contains("no route") {
                if message.contains("network") {
                    ProbeError::NetworkUnreachable(e.to_string())
                } else {
                    ProbeError::HostUnreachable
                }
            } else {
                ProbeError::ConnectionFailed {
                    target: host.to_string(),
                    port,
                    reason: e.to_string(),
                }
            }
        }
    }
}

/// Probe a single TCP port with default settings and the given timeout.
pub async fn probe(host: &str, port: Port, timeout: Duration) -> ProbeResult {
    let config = ScannerConfig::default().with_timeout(timeout);
    Prober::new(Arc::new(TcpDialer), &config).probe(host, port).await
}
