// src/core/scanner/port_scanner.rs

use std::collections::BTreeMap;
use std::io;
use std::time::Duration;

use serde::Deserialize;
use tokio::process::Command;
use tracing::{info, warn};

use crate::core::models::{HostRecord, HostStatus, PortRecord, ProbeError, ProbeOutcome};

/// Upper bound for one nmap run. Exceeding it degrades that host to
/// `error_nmap_timeout`; the batch continues with the next target.
const NMAP_TIMEOUT: Duration = Duration::from_secs(300);

/// Wraps the external `nmap` binary. Each target is scanned with XML output
/// written to a private temporary file that is removed on every exit path,
/// including timeout and parse failure.
pub struct PortScanner;

impl PortScanner {
    pub fn new() -> Self {
        Self
    }

    /// Scans each target in order, one `HostRecord` per target.
    ///
    /// Per-target failures (timeout, execution error, unparsable output)
    /// degrade that target's record and the batch continues. The one
    /// exception is a missing nmap binary: once the tool is confirmed
    /// absent the remaining targets are aborted, since every further
    /// attempt would fail identically. Records collected before the tool
    /// went missing are kept; the probe fails outright only when nothing
    /// was scanned yet.
    pub async fn scan(&self, targets: &[String]) -> ProbeOutcome<Vec<HostRecord>> {
        let mut hosts = Vec::with_capacity(targets.len());
        for target in targets {
            info!(target, "Starting nmap scan.");
            match self.scan_single(target).await {
                Ok(record) => hosts.push(record),
                Err(ProbeError::ToolUnavailable(detail)) => {
                    if let Some(e) = fold_missing_tool(&mut hosts, target, detail) {
                        return Err(e);
                    }
                    break;
                }
                Err(e) => return Err(e),
            }
        }
        Ok(hosts)
    }

    async fn scan_single(&self, target: &str) -> Result<HostRecord, ProbeError> {
        let xml_file = match tempfile::Builder::new()
            .prefix("atalaya-nmap-")
            .suffix(".xml")
            .tempfile()
        {
            Ok(file) => file,
            Err(e) => {
                warn!(target, error = %e, "Could not create temporary file for nmap output.");
                return Ok(HostRecord::degraded(
                    target,
                    HostStatus::ErrorUnexpected,
                    format!("could not create temporary output file: {e}"),
                ));
            }
        };

        let run = Command::new("nmap")
            .arg(target)
            .args(["-A", "-Pn", "-T4", "-oX"])
            .arg(xml_file.path())
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(NMAP_TIMEOUT, run).await {
            Err(_) => {
                warn!(target, "nmap scan timed out.");
                return Ok(HostRecord::degraded(
                    target,
                    HostStatus::ErrorNmapTimeout,
                    format!("nmap scan timed out after {} seconds", NMAP_TIMEOUT.as_secs()),
                ));
            }
            Ok(Err(e)) if e.kind() == io::ErrorKind::NotFound => {
                warn!("nmap binary not found on PATH.");
                return Err(ProbeError::ToolUnavailable(
                    "nmap binary not found on PATH".to_string(),
                ));
            }
            Ok(Err(e)) => {
                warn!(target, error = %e, "Failed to launch nmap.");
                return Ok(HostRecord::degraded(
                    target,
                    HostStatus::ErrorNmapExecution,
                    format!("failed to launch nmap: {e}"),
                ));
            }
            Ok(Ok(output)) => output,
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let detail = stderr.trim();
            warn!(target, code = ?output.status.code(), "nmap exited with an error.");
            return Ok(HostRecord::degraded(
                target,
                HostStatus::ErrorNmapExecution,
                if detail.is_empty() {
                    format!("nmap exited with status {}", output.status)
                } else {
                    format!("nmap execution failed: {detail}")
                },
            ));
        }

        let xml = match std::fs::read_to_string(xml_file.path()) {
            Ok(xml) => xml,
            Err(e) => {
                warn!(target, error = %e, "Could not read nmap XML output.");
                return Ok(HostRecord::degraded(
                    target,
                    HostStatus::ErrorParsingUnexpected,
                    format!("could not read nmap XML output: {e}"),
                ));
            }
        };
        if xml.trim().is_empty() {
            warn!(target, "nmap XML output file was empty.");
            return Ok(HostRecord::degraded(
                target,
                HostStatus::ErrorNmapOutput,
                "nmap XML output not generated or empty",
            ));
        }

        Ok(parse_nmap_xml(&xml, target))
        // xml_file drops here, removing the output on every path above.
    }
}

impl Default for PortScanner {
    fn default() -> Self {
        Self::new()
    }
}

/// Missing-tool batch policy. With nothing scanned yet the whole probe
/// fails; with earlier records in hand the current target is degraded to
/// `error_nmap_not_found` and the completed records are kept, returning
/// `None` to stop the batch.
fn fold_missing_tool(
    hosts: &mut Vec<HostRecord>,
    target: &str,
    detail: String,
) -> Option<ProbeError> {
    if hosts.is_empty() {
        return Some(ProbeError::ToolUnavailable(detail));
    }
    warn!(target, "nmap disappeared mid-batch; keeping completed results.");
    hosts.push(HostRecord::degraded(
        target,
        HostStatus::ErrorNmapNotFound,
        detail,
    ));
    None
}

// --- XML schema ---
// Partial model of nmap's -oX output, only the parts the report needs.

#[derive(Debug, Deserialize)]
struct NmapRun {
    #[serde(rename = "host", default)]
    hosts: Vec<XmlHost>,
    runstats: Option<XmlRunStats>,
}

#[derive(Debug, Deserialize)]
struct XmlHost {
    #[serde(rename = "address", default)]
    addresses: Vec<XmlAddress>,
    status: Option<XmlStatus>,
    ports: Option<XmlPorts>,
}

#[derive(Debug, Deserialize)]
struct XmlAddress {
    #[serde(rename = "@addr")]
    addr: String,
    #[serde(rename = "@addrtype")]
    addr_type: String,
}

#[derive(Debug, Deserialize)]
struct XmlStatus {
    #[serde(rename = "@state")]
    state: String,
}

#[derive(Debug, Deserialize)]
struct XmlPorts {
    #[serde(rename = "port", default)]
    ports: Vec<XmlPort>,
}

#[derive(Debug, Deserialize)]
struct XmlPort {
    #[serde(rename = "@portid")]
    portid: String,
    #[serde(rename = "@protocol")]
    protocol: String,
    state: Option<XmlPortState>,
    service: Option<XmlService>,
}

#[derive(Debug, Deserialize)]
struct XmlPortState {
    #[serde(rename = "@state")]
    state: String,
}

#[derive(Debug, Deserialize, Default)]
struct XmlService {
    #[serde(rename = "@name", default)]
    name: Option<String>,
    #[serde(rename = "@product", default)]
    product: Option<String>,
    #[serde(rename = "@version", default)]
    version: Option<String>,
    #[serde(rename = "@extrainfo", default)]
    extrainfo: Option<String>,
}

#[derive(Debug, Deserialize)]
struct XmlRunStats {
    hosts: Option<XmlHostStats>,
}

#[derive(Debug, Deserialize)]
struct XmlHostStats {
    #[serde(rename = "@up", default)]
    up: Option<String>,
    #[serde(rename = "@down", default)]
    down: Option<String>,
}

/// Parses one nmap XML document into a `HostRecord` for a single target.
/// `original_target` is the fallback address when the document carries no
/// usable host or address information.
pub fn parse_nmap_xml(xml: &str, original_target: &str) -> HostRecord {
    let run: NmapRun = match quick_xml::de::from_str(xml) {
        Ok(run) => run,
        Err(e) => {
            return HostRecord::degraded(
                original_target,
                HostStatus::ErrorParsingXml,
                format!("failed to parse nmap XML: {e}"),
            );
        }
    };

    let Some(host) = run.hosts.into_iter().next() else {
        return HostRecord::degraded(
            original_target,
            HostStatus::ErrorParsingXml,
            "no host element found in nmap XML output",
        );
    };

    let ip = host
        .addresses
        .iter()
        .find(|a| a.addr_type == "ipv4")
        .or_else(|| host.addresses.iter().find(|a| a.addr_type == "ipv6"))
        .map(|a| a.addr.clone())
        .unwrap_or_else(|| original_target.to_string());

    let ports: Vec<PortRecord> = host
        .ports
        .map(|p| p.ports)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|port| {
            // A port without a state element carries no useful information.
            let state = port.state?;
            Some(PortRecord {
                port: port.portid,
                protocol: port.protocol,
                state: state.state,
                service: port.service.map(service_map),
            })
        })
        .collect();

    let mut status = HostStatus::Unknown;
    let mut error = None;
    if let Some(host_status) = &host.status {
        match host_status.state.as_str() {
            "up" => status = HostStatus::UpWithOpenPorts,
            "down" => {
                status = HostStatus::Down;
                error = Some("host reported down by nmap".to_string());
            }
            _ => {}
        }
    }

    // Cross-check against runstats; it is the more reliable summary.
    if let Some(stats) = run.runstats.and_then(|r| r.hosts) {
        let up = stats.up.as_deref() == Some("1");
        let down = stats.down.as_deref() == Some("1");
        if down && !up {
            if status != HostStatus::Down {
                status = HostStatus::Down;
                error = Some("host reported down by nmap".to_string());
            }
        } else if up && status != HostStatus::Down {
            status = HostStatus::UpWithOpenPorts;
        }
    }

    // Refine "up" by whether any port information actually came back.
    if matches!(status, HostStatus::UpWithOpenPorts) && ports.is_empty() {
        status = HostStatus::UpNoOpenPorts;
    }

    HostRecord { ip, status, error, ports }
}

fn service_map(service: XmlService) -> BTreeMap<String, String> {
    let mut map = BTreeMap::new();
    map.insert("name".to_string(), service.name.unwrap_or_default());
    map.insert("product".to_string(), service.product.unwrap_or_default());
    map.insert("version".to_string(), service.version.unwrap_or_default());
    map.insert("extrainfo".to_string(), service.extrainfo.unwrap_or_default());
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    const UP_WITH_PORTS: &str = r#"<?xml version="1.0"?>
<nmaprun scanner="nmap">
  <host>
    <status state="up" reason="user-set"/>
    <address addr="93.184.216.34" addrtype="ipv4"/>
    <ports>
      <port protocol="tcp" portid="80">
        <state state="open" reason="syn-ack"/>
        <service name="http" product="nginx" version="1.24.0"/>
      </port>
      <port protocol="tcp" portid="443">
        <state state="open" reason="syn-ack"/>
        <service name="https"/>
      </port>
    </ports>
  </host>
  <runstats><hosts up="1" down="0" total="1"/></runstats>
</nmaprun>"#;

    const UP_NO_PORTS: &str = r#"<?xml version="1.0"?>
<nmaprun scanner="nmap">
  <host>
    <status state="up" reason="user-set"/>
    <address addr="93.184.216.34" addrtype="ipv4"/>
  </host>
  <runstats><hosts up="1" down="0" total="1"/></runstats>
</nmaprun>"#;

    const HOST_DOWN: &str = r#"<?xml version="1.0"?>
<nmaprun scanner="nmap">
  <host>
    <status state="down" reason="no-response"/>
    <address addr="10.0.0.1" addrtype="ipv4"/>
  </host>
  <runstats><hosts up="0" down="1" total="1"/></runstats>
</nmaprun>"#;

    const NO_HOST: &str = r#"<?xml version="1.0"?>
<nmaprun scanner="nmap">
  <runstats><hosts up="0" down="0" total="0"/></runstats>
</nmaprun>"#;

    #[test]
    fn parses_open_ports_with_service_details() {
        let host = parse_nmap_xml(UP_WITH_PORTS, "example.com");
        assert_eq!(host.ip, "93.184.216.34");
        assert_eq!(host.status, HostStatus::UpWithOpenPorts);
        assert_eq!(host.ports.len(), 2);
        let http = &host.ports[0];
        assert_eq!(http.port, "80");
        assert_eq!(http.protocol, "tcp");
        assert_eq!(http.state, "open");
        let service = http.service.as_ref().unwrap();
        assert_eq!(service.get("name").map(String::as_str), Some("http"));
        assert_eq!(service.get("product").map(String::as_str), Some("nginx"));
    }

    #[test]
    fn up_host_without_ports_is_refined() {
        let host = parse_nmap_xml(UP_NO_PORTS, "example.com");
        assert_eq!(host.status, HostStatus::UpNoOpenPorts);
        assert!(host.ports.is_empty());
    }

    #[test]
    fn down_host_carries_an_explanation() {
        let host = parse_nmap_xml(HOST_DOWN, "10.0.0.1");
        assert_eq!(host.status, HostStatus::Down);
        assert!(host.error.is_some());
    }

    #[test]
    fn document_without_host_degrades_to_parse_error() {
        let host = parse_nmap_xml(NO_HOST, "example.com");
        assert_eq!(host.ip, "example.com");
        assert_eq!(host.status, HostStatus::ErrorParsingXml);
    }

    #[test]
    fn unparsable_bytes_degrade_to_parse_error() {
        let host = parse_nmap_xml("this is not xml", "example.com");
        assert_eq!(host.status, HostStatus::ErrorParsingXml);
        assert!(host.error.unwrap().contains("failed to parse"));
    }

    #[test]
    fn tool_loss_on_first_target_fails_the_probe() {
        let mut hosts = Vec::new();
        let result = fold_missing_tool(&mut hosts, "example.com", "nmap binary not found on PATH".to_string());
        assert_eq!(
            result,
            Some(ProbeError::ToolUnavailable("nmap binary not found on PATH".to_string()))
        );
        assert!(hosts.is_empty());
    }

    #[test]
    fn tool_loss_mid_batch_keeps_completed_records() {
        let mut hosts = vec![parse_nmap_xml(UP_WITH_PORTS, "example.com")];
        let result = fold_missing_tool(&mut hosts, "example.org", "nmap binary not found on PATH".to_string());
        assert!(result.is_none());
        assert_eq!(hosts.len(), 2);
        assert_eq!(hosts[0].status, HostStatus::UpWithOpenPorts);
        assert_eq!(hosts[1].ip, "example.org");
        assert_eq!(hosts[1].status, HostStatus::ErrorNmapNotFound);
    }
}
