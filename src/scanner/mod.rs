//! Scanner module - TCP connect probing and scan orchestration.
//!
//! Probes go through a [`Dialer`], fan out through a [`Dispatcher`] and are
//! gathered into per-host results by the orchestrators. [`ScanEngine`] is
//! the entry point tying these together.

mod dial;
mod dispatch;
mod engine;
mod host;
mod probe;
mod range;
mod rate_limiter;
mod results;

pub use dial::{BoxedConnection, Connection, Dialer, TcpDialer};
pub use dispatch::{Dispatched, Dispatcher};
pub use engine::ScanEngine;
pub use probe::{probe, Prober};
pub use rate_limiter::RateLimiter;
pub use results::{HostScanResult, OsGuess, PortStatus, ProbeResult, RangeScanResult};
