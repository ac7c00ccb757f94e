//! Range scan orchestration: one host scan per address of an IPv4 range.

use crate::error::{EngineError, EngineResult};
use crate::report::Reporter;
use crate::scanner::dispatch::Dispatcher;
use crate::scanner::host::HostScanner;
use crate::scanner::results::{HostScanResult, RangeScanResult};
use crate::types::{IpRange, Port};
use std::net::Ipv4Addr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Fan `hosts` out over `range` with at most `host_limit` hosts in flight.
///
/// Hosts that fail are logged and left out; the rest of the range carries on.
/// The returned list is sorted by address.
pub(crate) async fn scan_range(
    hosts: &HostScanner,
    range: IpRange,
    ports: Arc<[Port]>,
    host_limit: usize,
    reporter: Reporter,
    cancel: &CancellationToken,
) -> EngineResult<RangeScanResult> {
    reporter.range_started(&range.to_string(), range.len());

    let dispatched = Dispatcher::new(host_limit)
        .run(range.iter(), cancel, |addr| {
            let hosts = hosts.clone();
            let ports = Arc::clone(&ports);
            let cancel = cancel.clone();
            async move {
                let host = addr.to_string();
                let outcome = hosts.scan(host.clone(), ports, cancel).await;
                (host, outcome)
            }
        })
        .await;

    if dispatched.cancelled {
        return Err(EngineError::Cancelled);
    }
    for failure in &dispatched.failures {
        reporter.task_failed(failure);
    }

    let mut results = Vec::with_capacity(dispatched.results.len());
    for (host, outcome) in dispatched.results {
        match outcome {
            Ok(result) => results.push(result),
            Err(EngineError::Cancelled) => return Err(EngineError::Cancelled),
            Err(e) => reporter.host_failed(&host, &e),
        }
    }

    results.sort_by_key(address_key);
    Ok(results)
}

fn address_key(result: &HostScanResult) -> (u32, String) {
    let addr = result
        .host
        .parse::<Ipv4Addr>()
        .map(u32::from)
        .unwrap_or(u32::MAX);
    (addr, result.host.clone())
}
