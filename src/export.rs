//! JSON export of scan results.

use serde::Serialize;
use std::io::{self, Write};

/// Render any result type as pretty-printed JSON.
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<String> {
    serde_json::to_string_pretty(value)
}

/// Write `value` as pretty-printed JSON followed by a newline.
pub fn write_json<T: Serialize + ?Sized, W: Write>(mut writer: W, value: &T) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.write_all(b"\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::{HostScanResult, PortStatus, ProbeResult};
    use crate::types::Port;
    use serde_json::Value;

    fn sample() -> HostScanResult {
        let probes = vec![
            ProbeResult::new(Port::new(22).unwrap(), PortStatus::Open)
                .with_banner(Some("SSH-2.0-OpenSSH_9.6".into())),
            ProbeResult::new(Port::new(23).unwrap(), PortStatus::Closed),
            ProbeResult::new(Port::new(24).unwrap(), PortStatus::Filtered),
        ];
        HostScanResult::classify("10.0.0.1", probes)
    }

    #[test]
    fn test_fields_are_snake_case() {
        let json = to_json(&sample()).unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["host"], "10.0.0.1");
        assert_eq!(value["is_alive"], true);
        assert_eq!(value["open_ports"][0]["port"], 22);
        assert_eq!(value["open_ports"][0]["service"], "ssh");
        assert_eq!(value["open_ports"][0]["banner"], "SSH-2.0-OpenSSH_9.6");
        assert_eq!(value["closed_ports"][0]["port"], 23);
        assert_eq!(value["closed_ports"][0]["state"], "closed");
        assert_eq!(value["filtered_ports"][0]["state"], "filtered");
        assert_eq!(value["filtered_ports"][0]["filtered"], true);
        assert!(value.get("scan_duration_ms").is_some());
        assert!(value["closed_ports"][0].get("banner").is_none());
    }

    #[test]
    fn test_write_json_round_trips_a_range() {
        let results = vec![sample(), sample()];
        let mut buf = Vec::new();
        write_json(&mut buf, &results).unwrap();

        assert!(buf.ends_with(b"\n"));
        let back: Vec<HostScanResult> = serde_json::from_slice(&buf).unwrap();
        assert_eq!(back.len(), 2);
        assert_eq!(back[0].open_port_numbers(), vec![22]);
    }
}
