//! # Network Models
//!
//! * [`target::TargetSpec`]: what the scanner is pointed at.
//! * [`host::HostRecord`]: one discovered device, as read from a scan report.
//! * [`range::Ipv4Range`]: an inclusive IPv4 range, used to classify targets.

pub mod host;
pub mod range;
pub mod target;
