// src/core/models.rs

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use thiserror::Error;

// --- Reusable Probe Outcome Types ---

/// Every probe run produces exactly one outcome: its structured data, or a
/// typed failure. Partial results (e.g. some DNS record types resolving and
/// others not) live inside the success value, never as multiple outcomes.
pub type ProbeOutcome<T> = Result<T, ProbeError>;

/// Failure taxonomy shared by every probe adapter. All probes signal failure
/// through this type; probe-internal degradation (e.g. a WHOIS response with
/// no parsable fields) is encoded in the result data instead.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProbeError {
    /// The external binary the probe wraps could not be located.
    #[error("external tool not found: {0}")]
    ToolUnavailable(String),
    /// The probe's own deadline elapsed.
    #[error("timed out after {0} seconds")]
    Timeout(u64),
    /// Network, process or server-side failure.
    #[error("transport error: {0}")]
    Transport(String),
    /// The external system answered with something we could not interpret.
    #[error("malformed response: {0}")]
    Malformed(String),
}

// --- Scenario Policy ---

/// Selects which probes run for one invocation. Parsing is case-insensitive
/// and accepts "full" as an alias for Complete; anything unrecognized maps
/// to Basic (see [`Scenario::from_input`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Scenario {
    Basic,
    #[strum(serialize = "complete", serialize = "full")]
    Complete,
}

impl Scenario {
    /// Canonicalizes a raw scenario string. Unrecognized values fall back to
    /// Basic rather than being rejected; callers that need strict validation
    /// must add it above this layer.
    pub fn from_input(raw: &str) -> Self {
        Self::from_str(raw.trim()).unwrap_or(Self::Basic)
    }

    /// The dork-search probe only runs for the Complete scenario.
    pub fn includes_dorks(self) -> bool {
        matches!(self, Self::Complete)
    }
}

// --- DNS Probe Models ---

/// Record-type name mapped to its resolved values. An empty list and an
/// absent key both mean "no records of that type".
pub type DnsRecords = BTreeMap<String, Vec<String>>;

/// The DNS slot of a scan report: the resolved records plus a degradation
/// marker set when the whole probe failed.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DnsReport {
    pub details: DnsRecords,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DnsReport {
    pub fn from_records(details: DnsRecords) -> Self {
        Self { details, error: None }
    }

    pub fn degraded(error: impl Into<String>) -> Self {
        Self {
            details: DnsRecords::new(),
            error: Some(error.into()),
        }
    }
}

// --- WHOIS Probe Models ---

/// Typed view of a raw WHOIS response. Dates are kept as opaque strings; no
/// normalization is attempted. A set `error` marks the record as degraded
/// but the record is still returned as data, never as a probe failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct WhoisInfo {
    pub domain_name: Vec<String>,
    pub registrar: Option<String>,
    pub whois_server: Option<String>,
    pub creation_date: Option<String>,
    pub expiration_date: Option<String>,
    pub updated_date: Option<String>,
    pub name_servers: Vec<String>,
    pub status: Vec<String>,
    pub emails: Vec<String>,
    pub country: Option<String>,
    pub error: Option<String>,
}

impl WhoisInfo {
    /// Placeholder for a domain whose lookup failed outright.
    pub fn degraded(domain: &str, error: impl Into<String>) -> Self {
        Self {
            domain_name: vec![domain.to_string()],
            error: Some(error.into()),
            ..Self::default()
        }
    }

    /// True when no substantive field was extracted from the response.
    pub fn is_empty(&self) -> bool {
        self.domain_name.is_empty()
            && self.registrar.is_none()
            && self.creation_date.is_none()
            && self.expiration_date.is_none()
            && self.updated_date.is_none()
            && self.name_servers.is_empty()
            && self.status.is_empty()
            && self.emails.is_empty()
    }
}

// --- Port-Scan Probe Models ---

/// Closed set of per-host states the port scanner can report. The `error_*`
/// variants carry scanner-side failures through as data so the report slot
/// is always populated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum HostStatus {
    UpWithOpenPorts,
    UpNoOpenPorts,
    Down,
    ErrorNmapOutput,
    ErrorNmapExecution,
    ErrorNmapTimeout,
    ErrorNmapNotFound,
    ErrorParsingXml,
    ErrorParsingUnexpected,
    ErrorUnexpected,
    Unknown,
}

/// One scanned port. `service` carries the name/product/version/extrainfo
/// attributes nmap reported, when any were present.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PortRecord {
    pub port: String,
    pub protocol: String,
    pub state: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<BTreeMap<String, String>>,
}

/// One requested target as the port scanner saw it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HostRecord {
    pub ip: String,
    pub status: HostStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub ports: Vec<PortRecord>,
}

impl HostRecord {
    pub fn degraded(ip: &str, status: HostStatus, error: impl Into<String>) -> Self {
        Self {
            ip: ip.to_string(),
            status,
            error: Some(error.into()),
            ports: Vec::new(),
        }
    }
}

// --- Dork-Search Probe Models ---

/// One search hit returned by the dork query.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DorkItem {
    pub title: String,
    pub link: String,
    pub snippet: String,
}

/// The dork slot of a scan report. Exactly one of four states applies:
/// omitted (scenario excluded it), unconfigured (no search credentials),
/// completed (query ran), or failed (query ran and errored). The attempted
/// query is preserved on failure so callers can see what was tried.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DorkReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_executed: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub results: Vec<DorkItem>,
}

impl DorkReport {
    pub fn omitted(scenario: Scenario) -> Self {
        Self {
            status: Some("omitted".to_string()),
            reason: Some(format!("scenario {scenario}")),
            ..Self::default()
        }
    }

    pub fn unconfigured(message: impl Into<String>) -> Self {
        Self {
            query_executed: Some(String::new()),
            error: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn completed(query: impl Into<String>, results: Vec<DorkItem>) -> Self {
        Self {
            query_executed: Some(query.into()),
            results,
            ..Self::default()
        }
    }

    pub fn failed(query: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            query_executed: Some(query.into()),
            error: Some(error.into()),
            ..Self::default()
        }
    }
}

// --- Composite Report ---

/// Structured results, one slot per probe. Every slot is always populated;
/// failed probes leave a degraded placeholder instead of an absent value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanResults {
    pub dns: DnsReport,
    pub nmap: Vec<HostRecord>,
    pub whois: WhoisInfo,
    pub google_dorks: DorkReport,
}

/// Human-readable text block per probe, as fed into the narrative prompt.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RenderedBlocks {
    pub dns: String,
    pub nmap: String,
    pub whois: String,
    pub google_dorks: String,
}

/// The single composite output of one orchestration run. Constructed in
/// full even when every probe fails.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    pub target: String,
    pub scenario: Scenario,
    pub scan_results: ScanResults,
    pub rendered: RenderedBlocks,
    pub analysis: String,
    pub execution_errors: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scenario_accepts_complete_and_full_case_insensitively() {
        assert_eq!(Scenario::from_input("COMPLETE"), Scenario::Complete);
        assert_eq!(Scenario::from_input("Full"), Scenario::Complete);
        assert_eq!(Scenario::from_input("complete"), Scenario::Complete);
    }

    #[test]
    fn scenario_falls_back_to_basic_for_anything_else() {
        assert_eq!(Scenario::from_input("basic"), Scenario::Basic);
        assert_eq!(Scenario::from_input(""), Scenario::Basic);
        assert_eq!(Scenario::from_input("unexpected-value"), Scenario::Basic);
    }

    #[test]
    fn scenario_renders_lowercase() {
        assert_eq!(Scenario::Basic.to_string(), "basic");
        assert_eq!(Scenario::Complete.to_string(), "complete");
    }

    #[test]
    fn host_status_serializes_to_snake_case_tags() {
        let json = serde_json::to_string(&HostStatus::ErrorNmapNotFound).unwrap();
        assert_eq!(json, "\"error_nmap_not_found\"");
        let json = serde_json::to_string(&HostStatus::UpWithOpenPorts).unwrap();
        assert_eq!(json, "\"up_with_open_ports\"");
        let status: HostStatus = serde_json::from_str("\"error_nmap_timeout\"").unwrap();
        assert_eq!(status, HostStatus::ErrorNmapTimeout);
    }

    #[test]
    fn omitted_dork_report_names_the_scenario() {
        let report = DorkReport::omitted(Scenario::Basic);
        assert_eq!(report.status.as_deref(), Some("omitted"));
        assert_eq!(report.reason.as_deref(), Some("scenario basic"));
        assert!(report.results.is_empty());
        assert!(report.error.is_none());
    }

    #[test]
    fn failed_dork_report_keeps_the_attempted_query() {
        let report = DorkReport::failed("site:example.com", "boom");
        assert_eq!(report.query_executed.as_deref(), Some("site:example.com"));
        assert_eq!(report.error.as_deref(), Some("boom"));
    }

    #[test]
    fn whois_degraded_placeholder_is_flagged() {
        let info = WhoisInfo::degraded("example.com", "connection refused");
        assert_eq!(info.domain_name, vec!["example.com".to_string()]);
        assert!(info.error.is_some());
        assert!(!info.is_empty());
    }
}
