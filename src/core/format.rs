// src/core/format.rs

//! Pure text renderers for probe results. Each function maps a structured
//! result to the human-readable block that feeds the narrative prompt.
//! No I/O, no hidden state: the same input always yields the same block.

use crate::core::models::{DnsRecords, DorkReport, HostRecord, WhoisInfo};

/// Renders resolved DNS records grouped by record type.
pub fn dns_text(records: &DnsRecords) -> String {
    if records.is_empty() {
        return "No DNS results were obtained.\n".to_string();
    }
    let mut out = String::from("--- DNS Scan Results ---\n");
    for (record_type, values) in records {
        if values.is_empty() {
            out.push_str(&format!("{record_type}: (no records found)\n"));
        } else {
            out.push_str(&format!("{record_type}:\n"));
            for value in values {
                out.push_str(&format!("  - {value}\n"));
            }
        }
    }
    out.push('\n');
    out
}

/// Renders the DNS block for a probe that failed outright.
pub fn dns_error_text(error: &str) -> String {
    format!("--- DNS Scan Results ---\nError: {error}\n\n")
}

/// Renders the port-scan block, one section per scanned host.
pub fn nmap_text(hosts: &[HostRecord], target: &str) -> String {
    if hosts.is_empty() {
        return format!("No Nmap results for {target}, or the host is down/filtered.\n");
    }
    let mut out = String::from("--- Nmap Scan Results ---\n");
    for host in hosts {
        out.push_str(&format!("Target: {}\n", host.ip));
        out.push_str(&format!("Status: {}\n", host.status));
        if let Some(error) = &host.error {
            out.push_str(&format!("Nmap error: {error}\n"));
        }
        if host.ports.is_empty() {
            out.push_str("Ports: (no open ports found or port data unavailable)\n");
        } else {
            out.push_str("Ports:\n");
            for port in &host.ports {
                out.push_str(&format!("  - Port: {}/{}\n", port.port, port.protocol));
                out.push_str(&format!("    State: {}\n", port.state));
                if let Some(service) = &port.service {
                    let details = ["name", "product", "version", "extrainfo"]
                        .iter()
                        .filter_map(|key| service.get(*key))
                        .filter(|value| !value.is_empty())
                        .cloned()
                        .collect::<Vec<_>>()
                        .join(" ");
                    if !details.is_empty() {
                        out.push_str(&format!("    Service: {details}\n"));
                    }
                }
            }
        }
        out.push('\n');
    }
    out
}

/// Renders the WHOIS block. A degraded or empty record collapses to a
/// single error line so downstream consumers never see a blank section.
pub fn whois_text(info: &WhoisInfo, target: &str) -> String {
    let header = format!("--- Whois Scan Results for {target} ---\n");
    if info.error.is_some() || info.is_empty() {
        let message = info
            .error
            .as_deref()
            .unwrap_or("No information could be obtained.");
        return format!("{header}Error: {message}\n\n");
    }
    let mut out = header;
    if !info.domain_name.is_empty() {
        out.push_str(&format!("Domain Name: {}\n", info.domain_name.join(", ")));
    }
    if let Some(registrar) = &info.registrar {
        out.push_str(&format!("Registrar: {registrar}\n"));
    }
    if let Some(created) = &info.creation_date {
        out.push_str(&format!("Creation Date: {created}\n"));
    }
    if let Some(expires) = &info.expiration_date {
        out.push_str(&format!("Expiration Date: {expires}\n"));
    }
    if let Some(updated) = &info.updated_date {
        out.push_str(&format!("Last Updated: {updated}\n"));
    }
    if !info.name_servers.is_empty() {
        out.push_str(&format!("Name Servers: {}\n", info.name_servers.join(", ")));
    }
    if !info.status.is_empty() {
        out.push_str(&format!("Status: {}\n", info.status.join(", ")));
    }
    if !info.emails.is_empty() {
        out.push_str(&format!("Emails: {}\n", info.emails.join(", ")));
    }
    if let Some(country) = &info.country {
        out.push_str(&format!("Country: {country}\n"));
    }
    out.push('\n');
    out
}

/// Renders the dork-search block for whichever state the report is in.
pub fn dorks_text(report: &DorkReport) -> String {
    if let Some(reason) = &report.reason {
        return format!("Google dorks omitted ({reason}).\n");
    }
    // No query clause when no query ran (the unconfigured state).
    let header = match report.query_executed.as_deref() {
        Some(query) if !query.is_empty() => {
            format!("--- Google Dorks Results (Query: {query}) ---\n")
        }
        _ => "--- Google Dorks Results ---\n".to_string(),
    };
    if let Some(error) = &report.error {
        return format!("{header}{error}\n\n");
    }
    if report.results.is_empty() {
        return format!("{header}No items were found for this query.\n\n");
    }
    let mut out = header;
    for item in &report.results {
        out.push_str(&format!("Title: {}\n", item.title));
        out.push_str(&format!("Link: {}\n", item.link));
        out.push_str(&format!("Snippet: {}\n---\n", item.snippet));
    }
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::{DorkItem, HostStatus, PortRecord, Scenario};
    use std::collections::BTreeMap;

    fn sample_records() -> DnsRecords {
        let mut records = DnsRecords::new();
        records.insert("A".to_string(), vec!["93.184.216.34".to_string()]);
        records.insert("MX".to_string(), Vec::new());
        records
    }

    #[test]
    fn dns_block_lists_values_and_marks_empty_types() {
        let text = dns_text(&sample_records());
        assert!(text.starts_with("--- DNS Scan Results ---\n"));
        assert!(text.contains("A:\n  - 93.184.216.34\n"));
        assert!(text.contains("MX: (no records found)\n"));
    }

    #[test]
    fn formatting_is_idempotent() {
        let records = sample_records();
        assert_eq!(dns_text(&records), dns_text(&records));

        let host = HostRecord {
            ip: "93.184.216.34".to_string(),
            status: HostStatus::UpWithOpenPorts,
            error: None,
            ports: vec![PortRecord {
                port: "80".to_string(),
                protocol: "tcp".to_string(),
                state: "open".to_string(),
                service: None,
            }],
        };
        let hosts = vec![host];
        assert_eq!(nmap_text(&hosts, "example.com"), nmap_text(&hosts, "example.com"));

        let info = WhoisInfo {
            domain_name: vec!["example.com".to_string()],
            registrar: Some("Example Registrar".to_string()),
            ..WhoisInfo::default()
        };
        assert_eq!(whois_text(&info, "example.com"), whois_text(&info, "example.com"));
    }

    #[test]
    fn nmap_block_includes_status_tag_and_service_details() {
        let mut service = BTreeMap::new();
        service.insert("name".to_string(), "http".to_string());
        service.insert("product".to_string(), "nginx".to_string());
        service.insert("version".to_string(), "1.24".to_string());
        service.insert("extrainfo".to_string(), String::new());
        let hosts = vec![HostRecord {
            ip: "93.184.216.34".to_string(),
            status: HostStatus::UpWithOpenPorts,
            error: None,
            ports: vec![PortRecord {
                port: "80".to_string(),
                protocol: "tcp".to_string(),
                state: "open".to_string(),
                service: Some(service),
            }],
        }];
        let text = nmap_text(&hosts, "example.com");
        assert!(text.contains("Status: up_with_open_ports\n"));
        assert!(text.contains("  - Port: 80/tcp\n"));
        assert!(text.contains("    Service: http nginx 1.24\n"));
    }

    #[test]
    fn degraded_whois_collapses_to_error_line() {
        let info = WhoisInfo::degraded("example.com", "connection refused");
        let text = whois_text(&info, "example.com");
        assert!(text.contains("Error: connection refused"));
        assert!(!text.contains("Registrar:"));
    }

    #[test]
    fn empty_whois_reports_missing_information() {
        let text = whois_text(&WhoisInfo::default(), "example.com");
        assert!(text.contains("No information could be obtained."));
    }

    #[test]
    fn dork_block_covers_all_states() {
        let omitted = dorks_text(&DorkReport::omitted(Scenario::Basic));
        assert!(omitted.contains("scenario basic"));

        let unconfigured = dorks_text(&DorkReport::unconfigured("search API not configured"));
        assert!(unconfigured.contains("search API not configured"));

        let failed = dorks_text(&DorkReport::failed("site:example.com", "HTTP 429"));
        assert!(failed.contains("Query: site:example.com"));
        assert!(failed.contains("HTTP 429"));

        let empty = dorks_text(&DorkReport::completed("site:example.com", Vec::new()));
        assert!(empty.contains("Query: site:example.com"));
        assert!(empty.contains("No items were found"));

        let items = vec![DorkItem {
            title: "Index of /".to_string(),
            link: "https://example.com/logs".to_string(),
            snippet: "Parent directory".to_string(),
        }];
        let full = dorks_text(&DorkReport::completed("site:example.com", items));
        assert!(full.contains("Title: Index of /\n"));
        assert!(full.contains("Link: https://example.com/logs\n"));
    }

    #[test]
    fn unconfigured_dork_header_carries_no_query_clause() {
        let text = dorks_text(&DorkReport::unconfigured("search API not configured"));
        assert!(text.starts_with("--- Google Dorks Results ---\n"));
        assert!(!text.contains("(Query:"));
    }
}
