//! Result types produced by probes and orchestrators.

use crate::services::service_description;
use crate::types::Port;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Status of a probed port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortStatus {
    /// The connection was accepted.
    Open,
    /// The connection was actively refused.
    Closed,
    /// No answer before the deadline, or the path is unreachable.
    Filtered,
}

impl fmt::Display for PortStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::Closed => write!(f, "closed"),
            Self::Filtered => write!(f, "filtered"),
        }
    }
}

/// Result of probing a single port.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeResult {
    pub port: Port,
    pub open: bool,
    pub filtered: bool,
    /// The state `open` and `filtered` encode, spelled out.
    pub state: PortStatus,
    /// Well-known service name for the port, or "unknown".
    pub service: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub banner: Option<String>,
    /// Time until the connection attempt settled.
    pub response_time_ms: u64,
}

impl ProbeResult {
    /// Create a result for `port` in the given state.
    pub fn new(port: Port, status: PortStatus) -> Self {
        Self {
            port,
            open: status == PortStatus::Open,
            filtered: status == PortStatus::Filtered,
            state: status,
            service: service_description(port.as_u16()).to_string(),
            banner: None,
            response_time_ms: 0,
        }
    }

    /// Set the banner.
    pub fn with_banner(mut self, banner: Option<String>) -> Self {
        self.banner = banner;
        self
    }

    /// Set the response time.
    pub fn with_response_time(mut self, elapsed: Duration) -> Self {
        self.response_time_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn status(&self) -> PortStatus {
        self.state
    }

}

/// Heuristic operating-system guess.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OsGuess {
    pub name: String,
    /// Always within `[0, 1]`.
    pub confidence: f64,
    /// Release read from a banner, when one names it.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub version: Option<String>,
    /// What the guess was based on.
    pub details: String,
}

/// Aggregated result for one host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostScanResult {
    pub host: String,
    pub is_alive: bool,
    /// Sorted by port.
    pub open_ports: Vec<ProbeResult>,
    /// Sorted by port.
    pub closed_ports: Vec<ProbeResult>,
    /// Sorted by port.
    pub filtered_ports: Vec<ProbeResult>,
    /// Wall-clock time spent on this host, liveness check included.
    pub scan_duration_ms: u64,
    /// When the scan of this host finished.
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub os_guess: Option<OsGuess>,
}

impl HostScanResult {
    /// Result for a host that failed the liveness check.
    pub(crate) fn unreachable(host: impl Into<String>, elapsed: Duration) -> Self {
        Self {
            host: host.into(),
            is_alive: false,
            open_ports: Vec::new(),
            closed_ports: Vec::new(),
            filtered_ports: Vec::new(),
            scan_duration_ms: millis(elapsed),
            timestamp: Utc::now(),
            os_guess: None,
        }
    }

    /// Partition probe results into the three buckets, each sorted by port.
    pub(crate) fn classify(host: impl Into<String>, probes: Vec<ProbeResult>) -> Self {
        let mut open_ports = Vec::new();
        let mut closed_ports = Vec::new();
        let mut filtered_ports = Vec::new();

        for probe in probes {
            match probe.status() {
                PortStatus::Open => open_ports.push(probe),
                PortStatus::Filtered => filtered_ports.push(probe),
                PortStatus::Closed => closed_ports.push(probe),
            }
        }

        open_ports.sort_by_key(|p| p.port);
        closed_ports.sort_by_key(|p| p.port);
        filtered_ports.sort_by_key(|p| p.port);

        Self {
            host: host.into(),
            is_alive: true,
            open_ports,
            closed_ports,
            filtered_ports,
            scan_duration_ms: 0,
            timestamp: Utc::now(),
            os_guess: None,
        }
    }

    /// Stamp the elapsed time and completion timestamp.
    pub(crate) fn finish(mut self, elapsed: Duration) -> Self {
        self.scan_duration_ms = millis(elapsed);
        self.timestamp = Utc::now();
        self
    }

    /// Total number of probed ports.
    pub fn ports_scanned(&self) -> usize {
        self.open_ports.len() + self.closed_ports.len() + self.filtered_ports.len()
    }

    /// Open port numbers, ascending.
    pub fn open_port_numbers(&self) -> Vec<u16> {
        self.open_ports.iter().map(|p| p.port.as_u16()).collect()
    }
}

/// One entry per successfully scanned address, sorted by address.
pub type RangeScanResult = Vec<HostScanResult>;

fn millis(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}
