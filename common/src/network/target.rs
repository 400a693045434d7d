//! # Scan Target Model
//!
//! Defines what a scan runs against.
//!
//! The text the user typed is what gets handed to the scanner, but it is
//! classified first so obviously broken input is rejected before any process
//! is spawned. Accepted forms:
//! * A single IP address (e.g., `10.0.0.1`, `::1`).
//! * An IPv4 Range (e.g., `192.168.1.1-100`).
//! * An IPv4 CIDR block (e.g., `192.168.1.0/24`).
//! * A network the scanner expands itself: IPv6 CIDR (`fe80::/64`) or a host
//!   name with a prefix (`scanme.nmap.org/24`).
//! * An octet expression (e.g., `192.168.0-255.1-254`, `10.0.*.1`).
//! * A DNS host name (e.g., `router.lan`).
//! * A comma-separated list of any of the above.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::network::range::{self, Ipv4Range};

pub const DEFAULT_TARGET: &str = "192.168.1.0/24";

const MAX_HOSTNAME_LEN: usize = 253;

/// How a target string was interpreted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TargetKind {
    Host { target_addr: IpAddr },
    /// Both explicit ranges and CIDR blocks end up here.
    Range { ipv4_range: Ipv4Range },
    Name { hostname: String },
    /// IPv6 CIDR or `hostname/prefix`; expanded by the scanner.
    Network { base: String, prefix: u8 },
    /// Per-octet ranges, lists and `*` wildcards.
    Octets { pattern: String },
    List { targets: Vec<TargetKind> },
}

impl TargetKind {
    /// Short human description, e.g. "range of 4 addresses".
    pub fn describe(&self) -> String {
        match self {
            TargetKind::Host { target_addr } => format!("single host {target_addr}"),
            TargetKind::Range { ipv4_range } => {
                format!("range of {} addresses", ipv4_range.len())
            }
            TargetKind::Name { hostname } => format!("host name {hostname}"),
            TargetKind::Network { base, prefix } => {
                format!("network {base} with prefix /{prefix}")
            }
            TargetKind::Octets { pattern } => format!("octet pattern {pattern}"),
            TargetKind::List { targets } => format!("list of {} targets", targets.len()),
        }
    }
}

/// A validated, immutable target specification.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TargetSpec {
    raw: String,
    kind: TargetKind,
}

impl TargetSpec {
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn kind(&self) -> &TargetKind {
        &self.kind
    }
}

impl Default for TargetSpec {
    fn default() -> Self {
        let ipv4_range = Ipv4Range::new(
            Ipv4Addr::new(192, 168, 1, 0),
            Ipv4Addr::new(192, 168, 1, 255),
        );
        Self {
            raw: DEFAULT_TARGET.to_string(),
            kind: TargetKind::Range { ipv4_range },
        }
    }
}

impl fmt::Display for TargetSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl TryFrom<String> for TargetSpec {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TargetSpec> for String {
    fn from(value: TargetSpec) -> Self {
        value.raw
    }
}

impl FromStr for TargetSpec {
    type Err = String;

    /// Parses and classifies a target string.
    ///
    /// Anything starting with `-` is refused so a target can never be read as
    /// a scanner option.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err("target cannot be empty".to_string());
        }
        if s.starts_with('-') {
            return Err(format!("target cannot start with '-': {s}"));
        }
        if s.chars().any(char::is_whitespace) {
            return Err(format!("target cannot contain whitespace: {s:?}"));
        }

        let kind = classify(s)?;
        Ok(Self {
            raw: s.to_string(),
            kind,
        })
    }
}

fn classify(s: &str) -> Result<TargetKind, String> {
    if let Some(kind) = parse_host(s) {
        return Ok(kind);
    }

    // Commas only appear inside octet expressions or between list elements.
    if s.contains(',') {
        if let Some(kind) = parse_octets(s) {
            return Ok(kind);
        }
        return parse_list(s);
    }

    if let Some(kind) = parse_cidr_range(s)? {
        return Ok(kind);
    }

    if let Some(kind) = parse_ip_range(s)? {
        return Ok(kind);
    }

    if let Some(kind) = parse_octets(s) {
        return Ok(kind);
    }

    if let Some(kind) = parse_hostname(s) {
        return Ok(kind);
    }

    Err(format!("invalid target: {s}"))
}

/// Parses a single IP address.
fn parse_host(s: &str) -> Option<TargetKind> {
    s.parse::<IpAddr>()
        .ok()
        .map(|target_addr| TargetKind::Host { target_addr })
}

/// Parses a range string like "1.1.1.1-2.2.2.2" or "1.1.1.1-50".
///
/// Only claims the input when the left side is an IPv4 address, so host names
/// containing dashes fall through to [`parse_hostname`].
fn parse_ip_range(s: &str) -> Result<Option<TargetKind>, String> {
    let Some((start_str, end_str)) = s.split_once('-') else {
        return Ok(None);
    };

    let Ok(start_addr) = start_str.parse::<Ipv4Addr>() else {
        return Ok(None);
    };

    let end_addr = parse_range_end_addr(end_str, &start_addr, s)?;
    let ipv4_range = Ipv4Range::new(start_addr, end_addr);
    if ipv4_range.is_empty() {
        return Err(format!("Range end comes before its start: {s}"));
    }

    Ok(Some(TargetKind::Range { ipv4_range }))
}

/// Helper to parse the end address of a range.
///
/// Handles abbreviated forms like "192.168.1.1-50" (implies 192.168.1.50)
/// and full forms like "192.168.1.1-192.168.1.255".
fn parse_range_end_addr(
    end_str: &str,
    start_addr: &Ipv4Addr,
    original_s: &str,
) -> Result<Ipv4Addr, String> {
    if let Ok(full_addr) = end_str.parse::<Ipv4Addr>() {
        return Ok(full_addr);
    }

    if end_str.is_empty() {
        return Err(format!("End range cannot be empty: {original_s}"));
    }

    let mut end_octets = start_addr.octets();
    let partial_octets: Vec<u8> = end_str
        .split('.')
        .map(|octet_str| octet_str.parse::<u8>())
        .collect::<Result<Vec<u8>, _>>()
        .map_err(|e| format!("Invalid end range '{end_str}': {e}"))?;

    if partial_octets.len() > 4 {
        return Err(format!("End range has too many octets: {end_str}"));
    }

    let start_index = 4 - partial_octets.len();
    end_octets[start_index..].copy_from_slice(&partial_octets);

    Ok(Ipv4Addr::from(end_octets))
}

/// Parses CIDR notation like "192.168.1.0/24", "fe80::/64" or "scanme.nmap.org/24".
///
/// IPv4 blocks are expanded here; IPv6 and host name bases are left to the
/// scanner. Anything else before the slash is not claimed.
fn parse_cidr_range(s: &str) -> Result<Option<TargetKind>, String> {
    let Some((base, prefix_str)) = s.split_once('/') else {
        return Ok(None);
    };

    let max_prefix = match base.parse::<IpAddr>() {
        Ok(IpAddr::V4(_)) => 32,
        Ok(IpAddr::V6(_)) => 128,
        Err(_) if parse_hostname(base).is_some() => 32,
        Err(_) => return Ok(None),
    };

    let prefix = prefix_str
        .parse::<u8>()
        .map_err(|e| format!("Invalid prefix in CIDR '{prefix_str}': {e}"))?;
    if prefix > max_prefix {
        return Err(format!("Prefix /{prefix} is too long for '{base}'"));
    }

    if let Ok(ipv4_addr) = base.parse::<Ipv4Addr>() {
        let ipv4_range = range::cidr_range(ipv4_addr, prefix)?;
        return Ok(Some(TargetKind::Range { ipv4_range }));
    }

    Ok(Some(TargetKind::Network {
        base: base.to_string(),
        prefix,
    }))
}

/// Parses nmap octet expressions such as "192.168.0-255.1-254", "10.0.*.1"
/// or "192.168.3-5,7.1".
///
/// Claims only four-octet patterns with at least one range, list or wildcard;
/// plain dotted quads are addresses and were handled earlier.
fn parse_octets(s: &str) -> Option<TargetKind> {
    let octets: Vec<&str> = s.split('.').collect();
    if octets.len() != 4 || !octets.iter().all(|octet| valid_octet_expr(octet)) {
        return None;
    }
    if octets.iter().all(|octet| octet.parse::<u8>().is_ok()) {
        return None;
    }

    Some(TargetKind::Octets {
        pattern: s.to_string(),
    })
}

/// One octet: `*`, or a comma list of numbers and `a-b` ranges (either end open).
fn valid_octet_expr(octet: &str) -> bool {
    if octet == "*" {
        return true;
    }

    let bound = |b: &str, default: u8| -> Option<u8> {
        if b.is_empty() {
            Some(default)
        } else {
            b.parse::<u8>().ok()
        }
    };

    octet.split(',').all(|item| match item.split_once('-') {
        Some((low, high)) if !(low.is_empty() && high.is_empty()) => {
            matches!((bound(low, 0), bound(high, 255)), (Some(l), Some(h)) if l <= h)
        }
        Some(_) => false,
        None => item.parse::<u8>().is_ok(),
    })
}

/// Parses a comma-separated list of targets, e.g. "10.0.0.1,10.0.0.5".
/// Every element must be a valid target on its own.
fn parse_list(s: &str) -> Result<TargetKind, String> {
    let targets = s
        .split(',')
        .map(|item| {
            if item.is_empty() {
                Err(format!("empty element in target list: {s}"))
            } else {
                classify(item)
            }
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(TargetKind::List { targets })
}

/// Parses an RFC 1123 host name.
fn parse_hostname(s: &str) -> Option<TargetKind> {
    if s.len() > MAX_HOSTNAME_LEN {
        return None;
    }

    let valid_label = |label: &str| {
        !label.is_empty()
            && label.len() <= 63
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    };

    let trimmed = s.strip_suffix('.').unwrap_or(s);
    // All-numeric dotted names are malformed addresses, not host names.
    let looks_numeric = trimmed.split('.').all(|l| l.chars().all(|c| c.is_ascii_digit()));

    (trimmed.split('.').all(valid_label) && !looks_numeric).then(|| TargetKind::Name {
        hostname: s.to_string(),
    })
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
