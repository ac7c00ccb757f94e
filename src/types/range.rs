//! IPv4 address ranges in `startIP-endIP` form.

use crate::error::RangeError;
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

/// An inclusive, non-empty range of IPv4 addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IpRange {
    start: Ipv4Addr,
    end: Ipv4Addr,
}

impl IpRange {
    /// Create a range, failing if `start` comes after `end`.
    pub fn new(start: Ipv4Addr, end: Ipv4Addr) -> Result<Self, RangeError> {
        if u32::from(start) > u32::from(end) {
            return Err(RangeError::Reversed {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(Self { start, end })
    }

    /// Parse `"A-B"` where both sides are dotted-quad IPv4 literals.
    pub fn parse(spec: &str) -> Result<Self, RangeError> {
        let parts: Vec<&str> = spec.split('-').collect();
        let [start, end] = parts.as_slice() else {
            return Err(RangeError::InvalidFormat(spec.to_string()));
        };

        let start = parse_addr(start)?;
        let end = parse_addr(end)?;
        Self::new(start, end)
    }

    /// Number of addresses in the range.
    pub fn len(&self) -> u64 {
        u64::from(u32::from(self.end)) - u64::from(u32::from(self.start)) + 1
    }

    /// Always false; a valid range holds at least one address.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Walk the range in ascending order.
    ///
    /// Addresses are treated as big-endian integers, so carrying from one
    /// octet into the next falls out of plain addition.
    pub fn iter(&self) -> impl Iterator<Item = Ipv4Addr> {
        (u32::from(self.start)..=u32::from(self.end)).map(Ipv4Addr::from)
    }
}

impl FromStr for IpRange {
    type Err = RangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for IpRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Expand `"A-B"` into every dotted-quad address from A to B inclusive.
pub fn expand_range(spec: &str) -> Result<Vec<String>, RangeError> {
    let range = IpRange::parse(spec)?;
    Ok(range.iter().map(|ip| ip.to_string()).collect())
}

fn parse_addr(token: &str) -> Result<Ipv4Addr, RangeError> {
    let token = token.trim();
    token
        .parse()
        .map_err(|_| RangeError::InvalidAddress(token.to_string()))
}
