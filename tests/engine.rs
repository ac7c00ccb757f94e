//! End-to-end scans through the public engine API.

use async_trait::async_trait;
use futures::future::join_all;
use netsweep::scanner::{BoxedConnection, Dialer};
use netsweep::{export, EngineError, ScanEngine, ScannerConfig};
use std::collections::HashSet;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{duplex, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio_test::{assert_err, assert_ok};
use tokio_util::sync::CancellationToken;

/// Accepts on a fixed set of (host, port) pairs, refuses everything else on
/// known hosts and never answers for unknown ones.
#[derive(Default)]
struct ScriptedNetwork {
    open: HashSet<(String, u16)>,
    hosts: HashSet<String>,
    delay: Duration,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    dials: AtomicUsize,
}

impl ScriptedNetwork {
    fn new() -> Self {
        Self::default()
    }

    fn host(mut self, host: &str, open: &[u16]) -> Self {
        self.hosts.insert(host.to_string());
        for &port in open {
            self.open.insert((host.to_string(), port));
        }
        self
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    fn dials(&self) -> usize {
        self.dials.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Dialer for ScriptedNetwork {
    async fn dial(&self, host: &str, port: u16) -> io::Result<BoxedConnection> {
        self.dials.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let outcome = if self.open.contains(&(host.to_string(), port)) {
            let (client, mut server) = duplex(256);
            let _ = server.write_all(b"hello\r\n").await;
            Ok(Box::new(client) as BoxedConnection)
        } else if self.hosts.contains(host) {
            Err(io::Error::from(io::ErrorKind::ConnectionRefused))
        } else {
            Err(io::Error::from(io::ErrorKind::TimedOut))
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        outcome
    }
}

fn config() -> ScannerConfig {
    ScannerConfig::new().with_timeout(Duration::from_millis(100))
}

fn engine(network: Arc<ScriptedNetwork>, config: ScannerConfig) -> ScanEngine {
    assert_ok!(ScanEngine::with_dialer(config, network))
}

fn ports(list: &[netsweep::ProbeResult]) -> Vec<u16> {
    list.iter().map(|p| p.port.as_u16()).collect()
}

#[tokio::test]
async fn test_single_open_port_in_small_range() {
    let network = Arc::new(ScriptedNetwork::new().host("127.0.0.1", &[3]));
    let engine = engine(network, config().skip_liveness_check());

    let result = assert_ok!(engine.scan_host("127.0.0.1", "1-5").await);
    assert!(result.is_alive);
    assert_eq!(ports(&result.open_ports), vec![3]);
    assert_eq!(ports(&result.closed_ports), vec![1, 2, 4, 5]);
    assert!(result.filtered_ports.is_empty());
}

#[tokio::test]
async fn test_range_aggregates_every_host() {
    let network = Arc::new(
        ScriptedNetwork::new()
            .host("10.0.0.1", &[])
            .host("10.0.0.2", &[80])
            .host("10.0.0.3", &[]),
    );
    let engine = engine(network, config().skip_liveness_check());

    let results = assert_ok!(engine.scan_range("10.0.0.1-10.0.0.3", "80").await);
    let hosts: Vec<&str> = results.iter().map(|r| r.host.as_str()).collect();
    assert_eq!(hosts, vec!["10.0.0.1", "10.0.0.2", "10.0.0.3"]);

    let with_open: Vec<&str> = results
        .iter()
        .filter(|r| !r.open_ports.is_empty())
        .map(|r| r.host.as_str())
        .collect();
    assert_eq!(with_open, vec!["10.0.0.2"]);
}

#[tokio::test]
async fn test_dead_hosts_in_range_are_reported_down() {
    let network = Arc::new(ScriptedNetwork::new().host("10.0.0.2", &[22]));
    let engine = engine(network, config());

    let results = assert_ok!(engine.scan_range("10.0.0.1-10.0.0.3", "20-25").await);
    assert_eq!(results.len(), 3);

    let alive: Vec<bool> = results.iter().map(|r| r.is_alive).collect();
    assert_eq!(alive, vec![false, true, false]);
    assert_eq!(ports(&results[1].open_ports), vec![22]);
    assert_eq!(results[0].ports_scanned(), 0);
}

#[tokio::test]
async fn test_port_concurrency_ceiling() {
    for ceiling in [1, 4, 16] {
        let network = Arc::new(
            ScriptedNetwork::new()
                .host("10.0.0.1", &[10, 20])
                .with_delay(Duration::from_millis(2)),
        );
        let config = config()
            .with_timeout(Duration::from_secs(1))
            .with_max_workers(ceiling)
            .skip_liveness_check();
        let engine = engine(network.clone(), config);

        let result = assert_ok!(engine.scan_host("10.0.0.1", "1-64").await);
        assert_eq!(result.ports_scanned(), 64);
        assert!(network.peak() <= ceiling, "peak {} > {ceiling}", network.peak());
    }
}

#[tokio::test]
async fn test_host_and_port_ceilings_compose() {
    let network = Arc::new(
        ScriptedNetwork::new()
            .host("10.0.0.1", &[])
            .host("10.0.0.2", &[])
            .host("10.0.0.3", &[])
            .host("10.0.0.4", &[])
            .with_delay(Duration::from_millis(2)),
    );
    let config = config()
        .with_timeout(Duration::from_secs(1))
        .with_max_workers(3)
        .with_max_concurrent_hosts(2)
        .skip_liveness_check();
    let engine = engine(network.clone(), config);

    let results = assert_ok!(engine.scan_range("10.0.0.1-10.0.0.4", "1-30").await);
    assert_eq!(results.len(), 4);
    assert_eq!(network.dials(), 120);
    assert!(network.peak() <= 6);
}

#[tokio::test]
async fn test_skipped_liveness_means_alive() {
    // Nothing on this host ever answers.
    let network = Arc::new(ScriptedNetwork::new());
    let engine = engine(network, config().skip_liveness_check());

    let result = assert_ok!(engine.scan_host("192.0.2.1", "1-3").await);
    assert!(result.is_alive);
    assert_eq!(ports(&result.filtered_ports), vec![1, 2, 3]);
}

#[tokio::test]
async fn test_invalid_range_fails_before_dialing() {
    let network = Arc::new(ScriptedNetwork::new());
    let engine = engine(network.clone(), config());

    assert_err!(engine.scan_range("10.0.0.9-10.0.0.1", "80").await);
    assert_err!(engine.scan_range("10.0.0.300-10.0.1.1", "80").await);
    assert_err!(engine.scan_range("10.0.0.1", "80").await);
    assert_eq!(network.dials(), 0);
}

#[tokio::test]
async fn test_cancelled_scan_returns_promptly() {
    let network = Arc::new(ScriptedNetwork::new().with_delay(Duration::from_secs(30)));
    let engine = engine(network, config().with_timeout(Duration::from_secs(60)));

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let start = std::time::Instant::now();
    let result = engine
        .scan_range_with_cancel("10.0.0.1-10.0.0.10", "1-100", &cancel)
        .await;
    assert!(matches!(result, Err(EngineError::Cancelled)));
    assert!(start.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn test_results_export_as_json() {
    let network = Arc::new(ScriptedNetwork::new().host("10.0.0.1", &[22]));
    let engine = engine(network, config().skip_liveness_check());

    let results = assert_ok!(engine.scan_range("10.0.0.1-10.0.0.1", "22,23").await);
    let json = assert_ok!(export::to_json(&results));
    let value: serde_json::Value = assert_ok!(serde_json::from_str(&json));

    assert_eq!(value[0]["host"], "10.0.0.1");
    assert_eq!(value[0]["open_ports"][0]["port"], 22);
    assert_eq!(value[0]["open_ports"][0]["service"], "ssh");
    assert_eq!(value[0]["closed_ports"][0]["port"], 23);
    assert_eq!(value[0]["closed_ports"][0]["state"], "closed");
}

#[tokio::test]
async fn test_repeated_scans_of_local_listener_agree() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let open_port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            drop(socket);
        }
    });

    let closed_port = {
        let temp = TcpListener::bind("127.0.0.1:0").await.unwrap();
        temp.local_addr().unwrap().port()
    };

    let config = ScannerConfig::new()
        .with_timeout(Duration::from_secs(1))
        .skip_liveness_check();
    let engine = assert_ok!(ScanEngine::new(config));
    let spec = format!("{open_port},{closed_port}");

    let first = assert_ok!(engine.scan_host("127.0.0.1", &spec).await);
    assert_eq!(ports(&first.open_ports), vec![open_port]);
    assert_eq!(ports(&first.closed_ports), vec![closed_port]);

    let runs = join_all((0..3).map(|_| engine.scan_host("127.0.0.1", &spec))).await;
    for run in runs {
        let run = assert_ok!(run);
        assert_eq!(ports(&run.open_ports), ports(&first.open_ports));
        assert_eq!(ports(&run.closed_ports), ports(&first.closed_ports));
        assert_eq!(ports(&run.filtered_ports), ports(&first.filtered_ports));
    }
}
