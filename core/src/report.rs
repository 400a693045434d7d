//! Scan report decoding.
//!
//! The report is nmap's XML output:
//!
//! ```xml
//! <nmaprun>
//!   <host>
//!     <address addr="10.0.0.1" addrtype="ipv4"/>
//!     <hostnames><hostname name="router" type="PTR"/></hostnames>
//!   </host>
//! </nmaprun>
//! ```
//!
//! Reading the file and decoding it fail differently (`ReportUnreadable` vs
//! `ReportMalformed`) so a broken scan can be told apart from a missing one.

use std::path::Path;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use scanmap_common::error::StageError;
use scanmap_common::network::host::{HostInventory, HostRecord};
use tracing::debug;

const ROOT: &[u8] = b"nmaprun";

/// Reads and decodes the report at `path`.
pub async fn parse(path: &Path) -> Result<HostInventory, StageError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| StageError::ReportUnreadable {
            path: path.to_path_buf(),
            source,
        })?;

    let hosts = decode(&bytes).map_err(|reason| StageError::ReportMalformed {
        path: path.to_path_buf(),
        reason,
    })?;

    debug!(report = %path.display(), hosts = hosts.len(), "report decoded");
    Ok(hosts)
}

#[derive(Default)]
struct HostBuilder {
    /// `(addr, addrtype)` in document order.
    addresses: Vec<(String, String)>,
    hostname: Option<String>,
    in_hostnames: bool,
}

impl HostBuilder {
    fn add_address(&mut self, element: &BytesStart<'_>) -> Result<(), String> {
        let addr = attribute(element, b"addr")?;
        let addrtype = attribute(element, b"addrtype")?.unwrap_or_default();
        if let Some(addr) = addr {
            self.addresses.push((addr, addrtype));
        }
        Ok(())
    }

    fn add_hostname(&mut self, element: &BytesStart<'_>) -> Result<(), String> {
        if self.in_hostnames && self.hostname.is_none() {
            self.hostname = attribute(element, b"name")?.filter(|name| !name.trim().is_empty());
        }
        Ok(())
    }

    /// IP addresses take priority over MAC addresses; otherwise the first one listed.
    fn finish(self, index: usize) -> Result<HostRecord, String> {
        let position = self
            .addresses
            .iter()
            .position(|(_, kind)| kind == "ipv4" || kind == "ipv6")
            .unwrap_or(0);

        let Some((address, _)) = self.addresses.into_iter().nth(position) else {
            return Err(format!("host #{} has no address", index + 1));
        };

        Ok(HostRecord::new(address, self.hostname))
    }
}

/// Decodes a whole report. The error is a human-readable reason.
pub fn decode(bytes: &[u8]) -> Result<HostInventory, String> {
    let text = std::str::from_utf8(bytes).map_err(|e| format!("report is not UTF-8: {e}"))?;
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut hosts: HostInventory = Vec::new();
    let mut current: Option<HostBuilder> = None;
    let mut depth: usize = 0;
    let mut root_seen = false;
    let mut root_closed = false;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| format!("XML error at byte {}: {e}", reader.buffer_position()))?;

        match event {
            Event::Start(ref element) | Event::Empty(ref element) => {
                let is_empty = matches!(event, Event::Empty(_));
                let name = element.local_name();

                if !root_seen {
                    if name.as_ref() != ROOT {
                        return Err(format!(
                            "expected <nmaprun> root, found <{}>",
                            String::from_utf8_lossy(name.as_ref())
                        ));
                    }
                    root_seen = true;
                    root_closed = is_empty;
                } else if root_closed {
                    return Err("content after </nmaprun>".to_string());
                } else {
                    match (name.as_ref(), depth, current.as_mut()) {
                        (b"host", 1, _) => {
                            let builder = HostBuilder::default();
                            if is_empty {
                                hosts.push(builder.finish(hosts.len())?);
                            } else {
                                current = Some(builder);
                            }
                        }
                        (b"address", 2, Some(host)) => host.add_address(element)?,
                        (b"hostnames", 2, Some(host)) => host.in_hostnames = !is_empty,
                        (b"hostname", 3, Some(host)) => host.add_hostname(element)?,
                        _ => {}
                    }
                }

                if !is_empty {
                    depth += 1;
                }
            }
            Event::End(ref element) => {
                depth = depth.saturating_sub(1);
                match (element.local_name().as_ref(), depth) {
                    (b"hostnames", 2) => {
                        if let Some(host) = current.as_mut() {
                            host.in_hostnames = false;
                        }
                    }
                    (b"host", 1) => {
                        if let Some(host) = current.take() {
                            hosts.push(host.finish(hosts.len())?);
                        }
                    }
                    (name, 0) if name == ROOT => root_closed = true,
                    _ => {}
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !root_seen {
        return Err("no <nmaprun> root element".to_string());
    }
    if !root_closed {
        return Err("report is truncated: <nmaprun> never closed".to_string());
    }

    Ok(hosts)
}

fn attribute(element: &BytesStart<'_>, key: &[u8]) -> Result<Option<String>, String> {
    for attr in element.attributes() {
        let attr = attr.map_err(|e| format!("bad attribute: {e}"))?;
        if attr.key.as_ref() == key {
            let value = attr
                .unescape_value()
                .map_err(|e| format!("bad attribute value: {e}"))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}
