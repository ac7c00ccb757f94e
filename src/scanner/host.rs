//! Host scan orchestration.
//!
//! One host goes through liveness check, port dispatch, classification and
//! the OS guess, in that order. A dead host stops after the first step.

use crate::config::ScannerConfig;
use crate::error::{EngineError, EngineResult, ProbeError};
use crate::fingerprint::guess_os;
use crate::report::Reporter;
use crate::scanner::dispatch::Dispatcher;
use crate::scanner::probe::Prober;
use crate::scanner::results::HostScanResult;
use crate::types::Port;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

/// Scans single hosts. Cheap to clone; clones share the prober.
#[derive(Clone)]
pub(crate) struct HostScanner {
    prober: Arc<Prober>,
    config: Arc<ScannerConfig>,
    reporter: Reporter,
}

impl HostScanner {
    pub(crate) fn new(prober: Prober, config: Arc<ScannerConfig>) -> Self {
        let reporter = Reporter::new(config.verbose);
        Self {
            prober: Arc::new(prober),
            config,
            reporter,
        }
    }

    /// Scan `ports` on `host`.
    pub(crate) async fn scan(
        &self,
        host: String,
        ports: Arc<[Port]>,
        cancel: CancellationToken,
    ) -> EngineResult<HostScanResult> {
        let start = Instant::now();
        self.reporter.host_started(&host, ports.len());

        if !self.config.skip_host_liveness_check && !self.is_alive(&host, &cancel).await? {
            self.reporter.host_down(&host);
            return Ok(HostScanResult::unreachable(host, start.elapsed()));
        }

        let dispatched = Dispatcher::new(self.config.max_workers)
            .run(ports.iter().copied(), &cancel, |port| {
                let prober = Arc::clone(&self.prober);
                let host = host.clone();
                async move { prober.probe(&host, port).await }
            })
            .await;

        if dispatched.cancelled {
            return Err(EngineError::Cancelled);
        }
        if let Some(failure) = dispatched.failures.first() {
            self.reporter.task_failed(failure);
            return Err(EngineError::HostScan {
                host,
                reason: format!("{} probe task(s) failed: {failure}", dispatched.failures.len()),
            });
        }

        let mut result = HostScanResult::classify(host, dispatched.results);
        if !result.open_ports.is_empty() {
            result.os_guess = guess_os(&result.open_ports);
        }
        let result = result.finish(start.elapsed());

        self.reporter.host_finished(&result);
        Ok(result)
    }

    /// A host is alive if any liveness port accepts or actively refuses.
    ///
    /// Remaining liveness dials are abandoned as soon as one answers.
    async fn is_alive(&self, host: &str, cancel: &CancellationToken) -> EngineResult<bool> {
        let answered = cancel.child_token();

        Dispatcher::new(self.config.max_workers)
            .run(self.config.liveness_ports.iter().copied(), &answered, |port| {
                let prober = Arc::clone(&self.prober);
                let host = host.to_string();
                let answered = answered.clone();
                async move {
                    let outcome = prober.connect(&host, port.as_u16()).await;
                    if matches!(outcome, Ok(_) | Err(ProbeError::ConnectionRefused)) {
                        answered.cancel();
                    }
                }
            })
            .await;

        if cancel.is_cancelled() {
            return Err(EngineError::Cancelled);
        }
        Ok(answered.is_cancelled())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::dial::mock::{Endpoint, MockDialer};
    use crate::scanner::results::PortStatus;
    use crate::types::parse_ports;
    use std::time::Duration;

    fn scanner(dialer: Arc<MockDialer>, config: ScannerConfig) -> HostScanner {
        let prober = Prober::new(dialer, &config);
        HostScanner::new(prober, Arc::new(config))
    }

    fn ports(spec: &str) -> Arc<[Port]> {
        parse_ports(spec).into()
    }

    fn config() -> ScannerConfig {
        ScannerConfig::new().with_timeout(Duration::from_millis(50))
    }

    #[tokio::test]
    async fn test_dead_host_short_circuits() {
        let dialer = Arc::new(MockDialer::new(Endpoint::Blackhole));
        let hosts = scanner(dialer.clone(), config());

        let result = hosts
            .scan("10.9.9.9".into(), ports("1-100"), CancellationToken::new())
            .await
            .unwrap();

        assert!(!result.is_alive);
        assert_eq!(result.ports_scanned(), 0);
        assert!(result.os_guess.is_none());
        // Only the liveness ports were dialed.
        assert_eq!(dialer.dials(), 5);
        assert!(result.scan_duration_ms >= 50);
    }

    #[tokio::test]
    async fn test_refusal_counts_as_alive() {
        let dialer = Arc::new(MockDialer::new(Endpoint::Refuse));
        let hosts = scanner(dialer, config());

        let result = hosts
            .scan("10.0.0.1".into(), ports("1-3"), CancellationToken::new())
            .await
            .unwrap();

        assert!(result.is_alive);
        assert_eq!(result.closed_ports.len(), 3);
    }

    #[tokio::test]
    async fn test_skipped_liveness_always_scans() {
        let dialer = Arc::new(MockDialer::new(Endpoint::Blackhole));
        let hosts = scanner(dialer.clone(), config().skip_liveness_check());

        let result = hosts
            .scan("10.9.9.9".into(), ports("20-24"), CancellationToken::new())
            .await
            .unwrap();

        assert!(result.is_alive);
        assert_eq!(result.filtered_ports.len(), 5);
        assert_eq!(dialer.dials(), 5);
        let dialed: Vec<u16> = dialer.log.lock().unwrap().iter().map(|(_, p)| *p).collect();
        assert!(dialed.iter().all(|p| (20..=24).contains(p)));
    }

    #[tokio::test]
    async fn test_partition_covers_every_port() {
        let dialer = Arc::new(
            MockDialer::new(Endpoint::Refuse)
                .with("10.0.0.1", 22, Endpoint::Accept(None))
                .with("10.0.0.1", 80, Endpoint::Accept(None))
                .with("10.0.0.1", 25, Endpoint::Blackhole)
                .with("10.0.0.1", 26, Endpoint::Unreachable),
        );
        let hosts = scanner(dialer, config().skip_liveness_check());

        let result = hosts
            .scan("10.0.0.1".into(), ports("20-90"), CancellationToken::new())
            .await
            .unwrap();

        let mut seen: Vec<u16> = result
            .open_ports
            .iter()
            .chain(&result.closed_ports)
            .chain(&result.filtered_ports)
            .map(|p| p.port.as_u16())
            .collect();
        seen.sort_unstable();
        assert_eq!(seen, (20..=90).collect::<Vec<u16>>());

        assert_eq!(result.open_port_numbers(), vec![22, 80]);
        assert!(result.open_ports.iter().all(|p| p.status() == PortStatus::Open));
        assert!(result.closed_ports.iter().all(|p| p.status() == PortStatus::Closed));
        let filtered: Vec<u16> = result.filtered_ports.iter().map(|p| p.port.as_u16()).collect();
        assert_eq!(filtered, vec![25, 26]);
        assert_eq!(result.os_guess.as_ref().map(|g| g.name.as_str()), Some("Unix-like"));
    }

    #[tokio::test]
    async fn test_crashed_port_task_fails_the_host() {
        let dialer = Arc::new(
            MockDialer::new(Endpoint::Refuse).with("10.0.0.2", 443, Endpoint::Panic),
        );
        let hosts = scanner(dialer, config().skip_liveness_check());

        let result = hosts
            .scan("10.0.0.2".into(), ports("440-445"), CancellationToken::new())
            .await;
        match result {
            Err(EngineError::HostScan { host, reason }) => {
                assert_eq!(host, "10.0.0.2");
                assert!(reason.starts_with("1 probe task(s) failed"), "{reason}");
            }
            other => panic!("expected a host scan failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_cancelled_host_scan() {
        let dialer = Arc::new(MockDialer::new(Endpoint::Blackhole));
        let hosts = scanner(
            dialer,
            ScannerConfig::new()
                .with_timeout(Duration::from_secs(30))
                .skip_liveness_check(),
        );

        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = hosts.scan("10.0.0.1".into(), ports("1-10"), cancel).await;
        assert!(matches!(result, Err(EngineError::Cancelled)));
    }
}
