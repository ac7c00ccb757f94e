//! Port types and the port-set parser.
//!
//! The `Port` newtype ensures values are always valid port numbers (1-65535).
//! `PortSpec` turns the textual forms `"22"`, `"80,443"` and `"1-1000"` into
//! an ordered list of ports, dropping anything it cannot use.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroU16;
use std::str::FromStr;

/// A validated network port number (1-65535).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct Port(NonZeroU16);

impl Port {
    /// Minimum valid port number.
    pub const MIN: u16 = 1;
    /// Maximum valid port number.
    pub const MAX: u16 = 65535;

    /// Create a new Port from a u16, returning None for port 0.
    #[inline]
    pub const fn new(port: u16) -> Option<Self> {
        match NonZeroU16::new(port) {
            Some(port) => Some(Self(port)),
            None => None,
        }
    }

    /// Get the raw port number.
    #[inline]
    pub const fn as_u16(self) -> u16 {
        self.0.get()
    }

    /// Convert a wider integer, rejecting anything outside 1-65535.
    fn from_i64(value: i64) -> Result<Self, PortError> {
        u16::try_from(value)
            .ok()
            .and_then(Self::new)
            .ok_or(PortError::OutOfRange(value))
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u16> for Port {
    type Error = PortError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(PortError::OutOfRange(i64::from(value)))
    }
}

impl From<Port> for u16 {
    fn from(port: Port) -> Self {
        port.as_u16()
    }
}

impl FromStr for Port {
    type Err = PortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = parse_int(s)?;
        Self::from_i64(value)
    }
}

/// Why a token of a port specification was dropped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PortError {
    #[error("port {0} is out of valid range (1-65535)")]
    OutOfRange(i64),
    #[error("invalid port number: '{0}'")]
    InvalidFormat(String),
    #[error("invalid port range: start ({0}) > end ({1})")]
    ReversedRange(i64, i64),
}

/// A parsed port specification.
///
/// Parsing never fails. Tokens that cannot be used are skipped and kept in
/// [`PortSpec::rejected`] so callers can report them. Ports keep the order
/// of the input and are not deduplicated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PortSpec {
    ports: Vec<Port>,
    rejected: Vec<PortError>,
}

impl PortSpec {
    /// Parse one of the three accepted forms.
    ///
    /// - `"1-1000"`: inclusive ascending range. Both bounds must be integers;
    ///   a reversed or malformed range yields nothing. Values outside
    ///   1-65535 are clipped off.
    /// - `"22, 80,443"`: every token that parses as a valid port, in order.
    /// - `"8080"`: a single port, or nothing.
    pub fn parse(spec: &str) -> Self {
        let mut parsed = Self::default();

        if spec.contains('-') {
            parsed.parse_range(spec);
        } else if spec.contains(',') {
            for token in spec.split(',') {
                parsed.push_token(token);
            }
        } else {
            parsed.push_token(spec);
        }

        parsed
    }

    fn parse_range(&mut self, spec: &str) {
        let bounds: Vec<&str> = spec.split('-').collect();
        let [start, end] = bounds.as_slice() else {
            self.rejected.push(PortError::InvalidFormat(spec.to_string()));
            return;
        };

        let (start, end) = match (parse_int(start), parse_int(end)) {
            (Ok(start), Ok(end)) => (start, end),
            (Err(e), _) | (_, Err(e)) => {
                self.rejected.push(e);
                return;
            }
        };

        if start > end {
            self.rejected.push(PortError::ReversedRange(start, end));
            return;
        }

        let low = start.max(i64::from(Port::MIN));
        let high = end.min(i64::from(Port::MAX));
        if low != start {
            self.rejected.push(PortError::OutOfRange(start));
        }
        if high != end {
            self.rejected.push(PortError::OutOfRange(end));
        }
        if low > high {
            return;
        }

        // Both bounds are inside 1..=65535 here.
        self.ports
            .extend((low..=high).filter_map(|p| u16::try_from(p).ok().and_then(Port::new)));
    }

    fn push_token(&mut self, token: &str) {
        match token.parse::<Port>() {
            Ok(port) => self.ports.push(port),
            Err(e) => self.rejected.push(e),
        }
    }

    /// The accepted ports, in input order.
    pub fn ports(&self) -> &[Port] {
        &self.ports
    }

    /// Consume the spec and return the accepted ports.
    pub fn into_ports(self) -> Vec<Port> {
        self.ports
    }

    /// Tokens that were dropped while parsing.
    pub fn rejected(&self) -> &[PortError] {
        &self.rejected
    }

    /// Number of accepted ports.
    pub fn len(&self) -> usize {
        self.ports.len()
    }

    /// Check if no port was accepted.
    pub fn is_empty(&self) -> bool {
        self.ports.is_empty()
    }
}

impl From<&str> for PortSpec {
    fn from(spec: &str) -> Self {
        Self::parse(spec)
    }
}

/// Parse a textual port specification into an ordered list of ports.
///
/// Malformed tokens are dropped silently; see [`PortSpec::parse`].
pub fn parse_ports(spec: &str) -> Vec<Port> {
    PortSpec::parse(spec).into_ports()
}

fn parse_int(token: &str) -> Result<i64, PortError> {
    let token = token.trim();
    token
        .parse()
        .map_err(|_| PortError::InvalidFormat(token.to_string()))
}
