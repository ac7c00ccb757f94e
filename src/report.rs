//! Observability for scans.
//!
//! The orchestrators never print. They hand events to a [`Reporter`], which
//! turns them into `tracing` events: `info` when the scan runs verbose,
//! `debug`/`trace` otherwise. Installing a subscriber is left to the binary
//! embedding the engine; [`init_tracing`] is a ready-made one.

use crate::scanner::{HostScanResult, ProbeResult};
use crate::types::PortError;
use tracing::{debug, info, trace, warn};
use tracing_subscriber::EnvFilter;

/// Environment variable holding a `tracing` filter directive.
pub const LOG_ENV: &str = "NETSWEEP_LOG";

/// Install a formatted `tracing` subscriber.
///
/// The filter comes from `NETSWEEP_LOG` when set, otherwise `info` for
/// verbose runs and `warn` for quiet ones. Calling this twice is harmless;
/// the second call keeps the first subscriber.
pub fn init_tracing(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// Emits scan progress as `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct Reporter {
    verbose: bool,
}

impl Reporter {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    pub fn probe(&self, host: &str, result: &ProbeResult) {
        let state = result.status();
        let port = result.port.as_u16();
        if self.verbose {
            info!(%host, port, %state, service = %result.service, "{port}/tcp {state}");
        } else {
            trace!(%host, port, %state, "probe finished");
        }
    }

    pub fn host_started(&self, host: &str, ports: usize) {
        if self.verbose {
            info!(%host, ports, "starting scan of {host}");
        } else {
            debug!(%host, ports, "starting host scan");
        }
    }

    pub fn host_down(&self, host: &str) {
        if self.verbose {
            warn!(%host, "host {host} is down");
        } else {
            debug!(%host, "host did not answer the liveness check");
        }
    }

    pub fn host_finished(&self, result: &HostScanResult) {
        let open = result.open_ports.len();
        if self.verbose {
            info!(
                host = %result.host,
                open,
                closed = result.closed_ports.len(),
                filtered = result.filtered_ports.len(),
                duration_ms = result.scan_duration_ms,
                "finished {}",
                result.host
            );
        } else {
            debug!(host = %result.host, open, "host scan finished");
        }
    }

    pub fn host_failed(&self, host: &str, error: &dyn std::error::Error) {
        if self.verbose {
            warn!(%host, %error, "error scanning host {host}");
        } else {
            debug!(%host, %error, "host scan failed");
        }
    }

    pub fn task_failed(&self, error: &dyn std::error::Error) {
        warn!(%error, "scan task did not complete");
    }

    pub fn range_started(&self, range: &str, hosts: u64) {
        if self.verbose {
            info!(%range, hosts, "scanning range {range}");
        } else {
            debug!(%range, hosts, "starting range scan");
        }
    }

    /// Port tokens that were dropped while parsing a port specification.
    pub fn rejected_ports(&self, spec: &str, rejected: &[PortError]) {
        if rejected.is_empty() {
            return;
        }
        let reasons: Vec<String> = rejected.iter().map(ToString::to_string).collect();
        warn!(%spec, dropped = rejected.len(), "ignoring port tokens: {}", reasons.join("; "));
    }
}
