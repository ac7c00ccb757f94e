//! Configuration management for netsweep.
//!
//! A [`ScannerConfig`] is built in code or loaded from an XDG-located
//! `settings.json`, validated once, and then shared read-only by every scan.

mod settings;

pub use settings::{
    Paths, ScannerConfig, DEFAULT_LIVENESS_PORTS, DEFAULT_MAX_WORKERS, DEFAULT_TIMEOUT_MS,
};
