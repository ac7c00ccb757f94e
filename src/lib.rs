//! # netsweep - A Concurrent TCP Connect Scanner
//!
//! netsweep probes TCP ports on single hosts and on contiguous IPv4 ranges,
//! classifying every port as open, closed or filtered.
//!
//! ## Features
//!
//! - **Connect Probing**: Full TCP handshakes, no raw sockets or privileges needed
//! - **Bounded Concurrency**: Independent ceilings for probes per host and hosts per range
//! - **Liveness Check**: Dead hosts are skipped after a handful of dials
//! - **Banner Grabbing**: Optional service banners, with an HTTP nudge for silent web ports
//! - **OS Hints**: A heuristic guess from the open port set and banners
//! - **Cancellation**: Every scan can be abandoned through a `CancellationToken`
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use netsweep::{ScanEngine, ScannerConfig};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), netsweep::EngineError> {
//!     let config = ScannerConfig::new()
//!         .with_timeout(Duration::from_secs(1))
//!         .with_version_detection();
//!     let engine = ScanEngine::new(config)?;
//!
//!     let result = engine.scan_host("192.168.1.1", "1-1024").await?;
//!     for port in &result.open_ports {
//!         println!("{}/tcp open {}", port.port, port.service);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`types`] - Port and IPv4 range parsing
//! - [`scanner`] - Probing, bounded dispatch and the scan orchestrators
//! - [`config`] - Scanner settings and their on-disk location
//! - [`report`] - Scan events as `tracing` output
//! - [`error`] - Error types
//! - [`export`] - JSON rendering of results

pub mod banner;
pub mod config;
pub mod error;
pub mod export;
pub mod fingerprint;
pub mod report;
pub mod scanner;
pub mod services;
pub mod types;

// Re-export commonly used types
pub use config::ScannerConfig;
pub use error::{ConfigError, EngineError, EngineResult, ProbeError, RangeError};
pub use scanner::{
    probe, Dialer, HostScanResult, OsGuess, PortStatus, ProbeResult, RangeScanResult, ScanEngine,
};
pub use types::{expand_range, parse_ports, IpRange, Port, PortSpec};
