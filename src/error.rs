//! Error types for netsweep.
//!
//! Uses `thiserror` for ergonomic error definitions. Only [`RangeError`],
//! [`ConfigError`] and [`EngineError`] ever reach a caller; [`ProbeError`] is
//! recovered inside the probe and folded into the port state.

use std::path::PathBuf;
use thiserror::Error;

/// Failure of a single connection attempt.
///
/// Transient by nature: the probe turns every variant into a port state.
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("connection to {target}:{port} failed: {reason}")]
    ConnectionFailed {
        target: String,
        port: u16,
        reason: String,
    },

    #[error("connection timed out")]
    Timeout,

    #[error("connection refused")]
    ConnectionRefused,

    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("host unreachable")]
    HostUnreachable,
}

/// Malformed `startIP-endIP` specification.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RangeError {
    #[error("invalid IP range '{0}': expected format 'startIP-endIP'")]
    InvalidFormat(String),

    #[error("invalid IPv4 address in range: '{0}'")]
    InvalidAddress(String),

    #[error("reversed IP range: {start} is after {end}")]
    Reversed { start: String, end: String },
}

/// Configuration loading and validation errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not determine the configuration directory")]
    DirectoryNotFound,

    #[error("failed to read {path}: {reason}")]
    ReadFailed { path: PathBuf, reason: String },

    #[error("failed to write {path}: {reason}")]
    WriteFailed { path: PathBuf, reason: String },

    #[error("invalid configuration format: {0}")]
    InvalidFormat(String),

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Top-level error returned by the scan engine.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    InvalidRange(#[from] RangeError),

    #[error("invalid host: '{0}'")]
    InvalidHost(String),

    #[error("scan of {host} failed: {reason}")]
    HostScan { host: String, reason: String },

    #[error("scan cancelled")]
    Cancelled,

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Result type alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Result type alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
