//! Scanner settings and where they live on disk.

use crate::banner::DEFAULT_BANNER_TIMEOUT;
use crate::error::{ConfigError, ConfigResult};
use crate::types::Port;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default per-probe connect timeout.
pub const DEFAULT_TIMEOUT_MS: u64 = 3000;

/// Default concurrency ceiling.
pub const DEFAULT_MAX_WORKERS: usize = 100;

/// Ports dialed to decide whether a host is up.
pub const DEFAULT_LIVENESS_PORTS: [u16; 5] = [80, 443, 22, 445, 3389];

/// Application directory paths following the XDG Base Directory layout.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Configuration directory (~/.config/netsweep)
    pub config_dir: PathBuf,
}

impl Paths {
    /// Resolve the platform configuration directory.
    pub fn resolve() -> ConfigResult<Self> {
        let project =
            ProjectDirs::from("org", "netsweep", "netsweep").ok_or(ConfigError::DirectoryNotFound)?;
        Ok(Self {
            config_dir: project.config_dir().to_path_buf(),
        })
    }

    /// Get the path to the settings file.
    pub fn settings_file(&self) -> PathBuf {
        self.config_dir.join("settings.json")
    }
}

/// Immutable configuration snapshot held by a [`ScanEngine`](crate::ScanEngine).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// Connect timeout per probe, in milliseconds.
    pub timeout_ms: u64,
    /// Emit one log line per probe and per host at `info` level.
    pub verbose: bool,
    /// Read a banner from every open port.
    pub version_detection: bool,
    /// Maximum probes in flight for one host.
    pub max_workers: usize,
    /// Maximum hosts in flight during a range scan. Falls back to `max_workers`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_concurrent_hosts: Option<usize>,
    /// Connect attempts per probe. Only timeouts are retried.
    pub retries: u32,
    /// Minimum interval between dials in milliseconds, 0 for unlimited.
    pub rate_limit_ms: u64,
    /// Assume every host is up and go straight to the port scan.
    pub skip_host_liveness_check: bool,
    /// Deadline for the banner read, in milliseconds.
    pub banner_timeout_ms: u64,
    /// Ports dialed by the liveness check.
    pub liveness_ports: Vec<Port>,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
            verbose: false,
            version_detection: false,
            max_workers: DEFAULT_MAX_WORKERS,
            max_concurrent_hosts: None,
            retries: 1,
            rate_limit_ms: 0,
            skip_host_liveness_check: false,
            banner_timeout_ms: u64::try_from(DEFAULT_BANNER_TIMEOUT.as_millis())
                .unwrap_or(2000),
            liveness_ports: DEFAULT_LIVENESS_PORTS
                .iter()
                .filter_map(|&p| Port::new(p))
                .collect(),
        }
    }
}

impl ScannerConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load settings from the default location, or defaults if none exist.
    pub fn load() -> ConfigResult<Self> {
        let file = Paths::resolve()?.settings_file();
        if !file.exists() {
            return Ok(Self::default());
        }
        Self::load_from(&file)
    }

    /// Load settings from a specific file.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self =
            serde_json::from_str(&content).map_err(|e| ConfigError::InvalidFormat(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save settings to a specific file.
    pub fn save_to(&self, path: &Path) -> ConfigResult<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).map_err(|e| ConfigError::WriteFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Reject settings the engine cannot run with.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.timeout_ms == 0 {
            return Err(ConfigError::Invalid("timeout_ms must be > 0".into()));
        }
        if self.banner_timeout_ms == 0 {
            return Err(ConfigError::Invalid("banner_timeout_ms must be > 0".into()));
        }
        if self.max_workers == 0 {
            return Err(ConfigError::Invalid("max_workers must be > 0".into()));
        }
        if self.max_concurrent_hosts == Some(0) {
            return Err(ConfigError::Invalid("max_concurrent_hosts must be > 0".into()));
        }
        if self.retries == 0 {
            return Err(ConfigError::Invalid("retries must be >= 1".into()));
        }
        if !self.skip_host_liveness_check && self.liveness_ports.is_empty() {
            return Err(ConfigError::Invalid(
                "liveness_ports is empty while the liveness check is enabled".into(),
            ));
        }
        Ok(())
    }

    /// Set the connect timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = duration_ms(timeout);
        self
    }

    /// Enable verbose per-probe logging.
    pub fn with_verbose(mut self) -> Self {
        self.verbose = true;
        self
    }

    /// Enable banner grabbing.
    pub fn with_version_detection(mut self) -> Self {
        self.version_detection = true;
        self
    }

    /// Set the port-level concurrency ceiling.
    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers;
        self
    }

    /// Set the host-level concurrency ceiling.
    pub fn with_max_concurrent_hosts(mut self, hosts: usize) -> Self {
        self.max_concurrent_hosts = Some(hosts);
        self
    }

    /// Set the number of connect attempts per probe.
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    /// Allow at most one dial per `interval`.
    pub fn with_rate_limit(mut self, interval: Duration) -> Self {
        self.rate_limit_ms = duration_ms(interval);
        self
    }

    /// Skip the liveness check.
    pub fn skip_liveness_check(mut self) -> Self {
        self.skip_host_liveness_check = true;
        self
    }

    /// Set the banner read deadline.
    pub fn with_banner_timeout(mut self, timeout: Duration) -> Self {
        self.banner_timeout_ms = duration_ms(timeout);
        self
    }

    /// Set the ports dialed by the liveness check.
    pub fn with_liveness_ports(mut self, ports: Vec<Port>) -> Self {
        self.liveness_ports = ports;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn banner_timeout(&self) -> Duration {
        Duration::from_millis(self.banner_timeout_ms)
    }

    /// Interval between dials, `None` when unlimited.
    pub fn rate_limit(&self) -> Option<Duration> {
        (self.rate_limit_ms > 0).then(|| Duration::from_millis(self.rate_limit_ms))
    }

    /// Effective host-level ceiling.
    pub fn host_concurrency(&self) -> usize {
        self.max_concurrent_hosts.unwrap_or(self.max_workers)
    }
}

fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
