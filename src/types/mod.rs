//! Core input types: validated ports, port specifications and IPv4 ranges.
//!
//! Parsing the two textual inputs of a scan lives here so the orchestrators
//! only ever deal with typed values.

mod port;
mod range;

pub use port::{parse_ports, Port, PortError, PortSpec};
pub use range::{expand_range, IpRange};
