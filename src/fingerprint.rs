//! Best-effort operating system guess from open ports and banners.
//!
//! Each signature lists ports that commonly ship open on an OS family and
//! words that tend to show up in its service banners. The strongest match
//! wins. This is a heuristic only: it never inspects packets.

use crate::scanner::{OsGuess, ProbeResult};

/// Weight added when a banner mentions one of a signature's hints.
const BANNER_WEIGHT: f64 = 0.5;

/// Upper bound on confidence; a port heuristic is never certain.
const MAX_CONFIDENCE: f64 = 0.95;

struct Signature {
    name: &'static str,
    ports: &'static [(u16, f64)],
    banner_hints: &'static [&'static str],
}

const SIGNATURES: &[Signature] = &[
    Signature {
        name: "Windows",
        ports: &[(135, 0.3), (139, 0.2), (445, 0.3), (3389, 0.3), (5985, 0.2)],
        banner_hints: &["microsoft", "windows", "iis"],
    },
    Signature {
        name: "Linux",
        ports: &[(22, 0.15), (111, 0.2), (2049, 0.2), (6443, 0.1)],
        banner_hints: &["ubuntu", "debian", "centos", "red hat", "fedora", "linux"],
    },
    Signature {
        name: "macOS",
        ports: &[(548, 0.3), (5900, 0.15), (62078, 0.4)],
        banner_hints: &["darwin", "mac os", "apple"],
    },
    Signature {
        name: "BSD",
        ports: &[],
        banner_hints: &["freebsd", "openbsd", "netbsd"],
    },
    Signature {
        name: "Network appliance",
        ports: &[(23, 0.3), (179, 0.3), (830, 0.2)],
        banner_hints: &["cisco", "mikrotik", "routeros", "juniper"],
    },
    Signature {
        name: "Unix-like",
        ports: &[(22, 0.2)],
        banner_hints: &[],
    },
];

/// Guess the operating system behind a set of open ports.
///
/// Returns `None` when nothing matches.
pub fn guess_os(open_ports: &[ProbeResult]) -> Option<OsGuess> {
    let banners: Vec<String> = open_ports
        .iter()
        .filter_map(|p| p.banner.as_deref())
        .map(str::to_lowercase)
        .collect();

    let mut best: Option<OsGuess> = None;

    for sig in SIGNATURES {
        let matched: Vec<u16> = sig
            .ports
            .iter()
            .filter(|(port, _)| open_ports.iter().any(|p| p.port.as_u16() == *port))
            .map(|(port, _)| *port)
            .collect();
        let port_score: f64 = sig
            .ports
            .iter()
            .filter(|(port, _)| matched.contains(port))
            .map(|(_, weight)| weight)
            .sum();

        let hint = sig
            .banner_hints
            .iter()
            .find(|hint| banners.iter().any(|b| b.contains(*hint)));

        if matched.is_empty() && hint.is_none() {
            continue;
        }

        let version = sig
            .banner_hints
            .iter()
            .find_map(|hint| banners.iter().find_map(|b| version_after(b, hint)));

        let score = port_score + if hint.is_some() { BANNER_WEIGHT } else { 0.0 };
        let confidence = score.clamp(0.0, MAX_CONFIDENCE);

        if best.as_ref().map_or(true, |b| confidence > b.confidence) {
            best = Some(OsGuess {
                name: sig.name.to_string(),
                confidence,
                version,
                details: describe(&matched, hint.copied()),
            });
        }
    }

    best
}

/// Version number following `hint` in a lowercased banner, e.g. the `10.0`
/// in `microsoft-iis/10.0`.
fn version_after(banner: &str, hint: &str) -> Option<String> {
    let at = banner.find(hint)? + hint.len();
    let rest = banner[at..].trim_start_matches([' ', '/', '-', '_']);
    let version: String = rest
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    let version = version.trim_end_matches('.');
    version
        .starts_with(|c: char| c.is_ascii_digit())
        .then(|| version.to_string())
}

fn describe(ports: &[u16], hint: Option<&str>) -> String {
    let mut parts = Vec::new();
    if !ports.is_empty() {
        let list: Vec<String> = ports.iter().map(u16::to_string).collect();
        parts.push(format!("open ports {}", list.join(",")));
    }
    if let Some(hint) = hint {
        parts.push(format!("banner mentions '{hint}'"));
    }
    parts.join("; ")
}
