use serde::Serialize;

/// Placeholder used when a report carries no name for a host.
pub const UNKNOWN_HOSTNAME: &str = "Unknown";

/// A single host found by a scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostRecord {
    address: String,
    hostname: String,
}

impl HostRecord {
    /// Builds a record, mapping a missing or blank hostname to [`UNKNOWN_HOSTNAME`].
    pub fn new(address: impl Into<String>, hostname: Option<String>) -> Self {
        let hostname = hostname
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| UNKNOWN_HOSTNAME.to_string());

        Self {
            address: address.into(),
            hostname,
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn has_hostname(&self) -> bool {
        self.hostname != UNKNOWN_HOSTNAME
    }
}

/// Hosts in report document order.
pub type HostInventory = Vec<HostRecord>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_hostname_becomes_unknown() {
        let host = HostRecord::new("10.0.0.2", None);
        assert_eq!(host.hostname(), UNKNOWN_HOSTNAME);
        assert!(!host.has_hostname());
    }

    #[test]
    fn blank_hostname_becomes_unknown() {
        let host = HostRecord::new("10.0.0.2", Some("  ".into()));
        assert_eq!(host.hostname(), UNKNOWN_HOSTNAME);
    }

    #[test]
    fn named_host_keeps_its_name() {
        let host = HostRecord::new("10.0.0.1", Some("router".into()));
        assert_eq!(host.hostname(), "router");
        assert!(host.has_hostname());
    }
}
