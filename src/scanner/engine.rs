//! The public scanning facade.

use crate::config::ScannerConfig;
use crate::error::{EngineError, EngineResult};
use crate::report::Reporter;
use crate::scanner::dial::{Dialer, TcpDialer};
use crate::scanner::dispatch::Dispatcher;
use crate::scanner::host::HostScanner;
use crate::scanner::probe::Prober;
use crate::scanner::range;
use crate::scanner::results::{HostScanResult, ProbeResult, RangeScanResult};
use crate::types::{IpRange, Port, PortSpec};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Scans hosts and IPv4 ranges with a fixed configuration.
///
/// The engine holds no per-scan state, so one instance can run any number of
/// scans concurrently. Every invocation builds its own prober; the hosts of a
/// range scan share it, and with it the rate limiter.
#[derive(Clone)]
pub struct ScanEngine {
    config: Arc<ScannerConfig>,
    dialer: Arc<dyn Dialer>,
    reporter: Reporter,
}

impl std::fmt::Debug for ScanEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanEngine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ScanEngine {
    /// Create an engine dialing real TCP connections.
    pub fn new(config: ScannerConfig) -> EngineResult<Self> {
        Self::with_dialer(config, Arc::new(TcpDialer))
    }

    /// Create an engine on top of a custom [`Dialer`].
    pub fn with_dialer(config: ScannerConfig, dialer: Arc<dyn Dialer>) -> EngineResult<Self> {
        config.validate()?;
        let reporter = Reporter::new(config.verbose);
        Ok(Self {
            config: Arc::new(config),
            dialer,
            reporter,
        })
    }

    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    /// Scan `port_spec` on `host`.
    pub async fn scan_host(&self, host: &str, port_spec: &str) -> EngineResult<HostScanResult> {
        self.scan_host_with_cancel(host, port_spec, &CancellationToken::new())
            .await
    }

    /// Scan `port_spec` on `host`, giving up once `cancel` fires.
    pub async fn scan_host_with_cancel(
        &self,
        host: &str,
        port_spec: &str,
        cancel: &CancellationToken,
    ) -> EngineResult<HostScanResult> {
        let host = validate_host(host)?;
        let ports = self.ports(port_spec);
        self.host_scanner()
            .scan(host.to_string(), ports, cancel.clone())
            .await
    }

    /// Probe `port_spec` on `host` without a liveness check and return the
    /// open ports only, sorted by port.
    ///
    /// Banners are read when version detection is on. An empty host yields no
    /// results.
    pub async fn scan_host_simple(&self, host: &str, port_spec: &str) -> Vec<ProbeResult> {
        let host = match validate_host(host) {
            Ok(host) => host.to_string(),
            Err(e) => {
                warn!(error = %e, "skipping scan");
                return Vec::new();
            }
        };
        let ports = self.ports(port_spec);
        let prober = Arc::new(self.prober());

        let dispatched = Dispatcher::new(self.config.max_workers)
            .run(ports.iter().copied(), &CancellationToken::new(), |port| {
                let prober = Arc::clone(&prober);
                let host = host.clone();
                async move { prober.probe(&host, port).await }
            })
            .await;

        for failure in &dispatched.failures {
            self.reporter.task_failed(failure);
        }

        let mut open: Vec<ProbeResult> =
            dispatched.results.into_iter().filter(|r| r.open).collect();
        open.sort_by_key(|r| r.port);
        open
    }

    /// Scan `port_spec` on every address of `range_spec` ("A.B.C.D-E.F.G.H").
    pub async fn scan_range(
        &self,
        range_spec: &str,
        port_spec: &str,
    ) -> EngineResult<RangeScanResult> {
        self.scan_range_with_cancel(range_spec, port_spec, &CancellationToken::new())
            .await
    }

    /// Range scan that gives up once `cancel` fires.
    pub async fn scan_range_with_cancel(
        &self,
        range_spec: &str,
        port_spec: &str,
        cancel: &CancellationToken,
    ) -> EngineResult<RangeScanResult> {
        let range = IpRange::parse(range_spec)?;
        let ports = self.ports(port_spec);

        range::scan_range(
            &self.host_scanner(),
            range,
            ports,
            self.config.host_concurrency(),
            self.reporter,
            cancel,
        )
        .await
    }

    fn prober(&self) -> Prober {
        Prober::new(Arc::clone(&self.dialer), &self.config)
    }

    fn host_scanner(&self) -> HostScanner {
        HostScanner::new(self.prober(), Arc::clone(&self.config))
    }

    fn ports(&self, port_spec: &str) -> Arc<[Port]> {
        let spec = PortSpec::parse(port_spec);
        self.reporter.rejected_ports(port_spec, spec.rejected());
        spec.into_ports().into()
    }
}

fn validate_host(host: &str) -> EngineResult<&str> {
    let host = host.trim();
    if host.is_empty() {
        return Err(EngineError::InvalidHost("host must not be empty".into()));
    }
    Ok(host)
}
