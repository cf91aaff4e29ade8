// src/core/orchestrator.rs

//! The orchestration engine: fans out the four probes against one target,
//! folds every per-probe failure into the report instead of raising it,
//! assembles the narrative prompt and returns one composite [`ScanReport`].

use color_eyre::eyre::{Result, WrapErr};
use tracing::{info, warn};

use crate::config::Config;
use crate::core::format;
use crate::core::models::{
    DnsRecords, DnsReport, DorkItem, DorkReport, HostRecord, HostStatus, ProbeError, ProbeOutcome,
    RenderedBlocks, ScanReport, ScanResults, Scenario, WhoisInfo,
};
use crate::core::narrative::{ANALYSIS_NOT_EXECUTED, NarrativeClient};
use crate::core::prompt;
use crate::core::scanner::dns_scanner::DnsScanner;
use crate::core::scanner::dork_scanner::DorkScanner;
use crate::core::scanner::port_scanner::PortScanner;
use crate::core::scanner::whois_scanner::WhoisScanner;

/// How the dork step of one run ended: skipped by scenario policy, skipped
/// because no search provider is configured, or executed with an outcome.
pub(crate) enum DorkExecution {
    Omitted(Scenario),
    Unconfigured,
    Executed {
        query: String,
        outcome: ProbeOutcome<Vec<DorkItem>>,
    },
}

/// Owns one instance of every probe adapter plus the optional narrative
/// client. Construction may fail only on internal wiring (an invalid
/// embedded server table or HTTP client options); `run` itself never fails.
pub struct Orchestrator {
    dns: DnsScanner,
    ports: PortScanner,
    whois: WhoisScanner,
    dorks: Option<DorkScanner>,
    narrative: Option<NarrativeClient>,
    response_language: String,
}

impl Orchestrator {
    pub fn new(config: &Config) -> Result<Self> {
        let whois = WhoisScanner::new()
            .map_err(|e| color_eyre::eyre::eyre!("invalid WHOIS server table: {e:?}"))?;
        let dorks = config
            .search
            .as_ref()
            .map(DorkScanner::new)
            .transpose()
            .wrap_err("could not build the dork-search client")?;
        let narrative = config
            .narrative
            .as_ref()
            .map(NarrativeClient::new)
            .transpose()
            .wrap_err("could not build the narrative client")?;

        Ok(Self {
            dns: DnsScanner::new(),
            ports: PortScanner::new(),
            whois,
            dorks,
            narrative,
            response_language: config.response_language.clone(),
        })
    }

    /// Runs one full orchestration: DNS, port scan and WHOIS always; dorks
    /// for the Complete scenario when configured; then the narrative step.
    ///
    /// Probe failures never cross this boundary. Each one degrades its own
    /// report slot and appends an entry to `execution_errors`; the report
    /// is always returned in full.
    pub async fn run(
        &self,
        target: &str,
        scenario_input: &str,
        custom_query: Option<&str>,
    ) -> ScanReport {
        let scenario = Scenario::from_input(scenario_input);
        info!(target, %scenario, "Starting orchestration run.");

        let batch = vec![target.to_string()];
        let dork_step = async {
            match (scenario, &self.dorks) {
                (Scenario::Basic, _) => {
                    info!(target, "Dork search omitted for the basic scenario.");
                    DorkExecution::Omitted(scenario)
                }
                (Scenario::Complete, None) => DorkExecution::Unconfigured,
                (Scenario::Complete, Some(scanner)) => {
                    let query = custom_query
                        .map(str::to_string)
                        .unwrap_or_else(|| default_dork_query(target));
                    let outcome = scanner.search(&query).await;
                    DorkExecution::Executed { query, outcome }
                }
            }
        };

        // Fan out; the probes are data-independent of each other. Prompt
        // assembly below is the join point and may not start earlier.
        let (dns_outcome, nmap_outcome, whois_outcome, dork_execution) = tokio::join!(
            self.dns.resolve(target, None),
            self.ports.scan(&batch),
            self.whois.lookup(target),
            dork_step,
        );

        let mut execution_errors = Vec::new();
        let (dns, dns_text) = fold_dns(dns_outcome, &mut execution_errors);
        let (nmap, nmap_text) = fold_nmap(target, nmap_outcome, &mut execution_errors);
        let (whois, whois_text) = fold_whois(target, whois_outcome, &mut execution_errors);
        let (google_dorks, dorks_text) = fold_dorks(dork_execution, &mut execution_errors);

        let rendered = RenderedBlocks {
            dns: dns_text,
            nmap: nmap_text,
            whois: whois_text,
            google_dorks: dorks_text,
        };

        let narrative_prompt =
            prompt::build_prompt(target, scenario, &rendered, &self.response_language);
        let analysis = self
            .narrative_step(&narrative_prompt, &mut execution_errors)
            .await;

        info!(
            target,
            errors = execution_errors.len(),
            "Orchestration run finished."
        );
        ScanReport {
            target: target.to_string(),
            scenario,
            scan_results: ScanResults { dns, nmap, whois, google_dorks },
            rendered,
            analysis,
            execution_errors,
        }
    }

    async fn narrative_step(&self, prompt: &str, errors: &mut Vec<String>) -> String {
        match &self.narrative {
            None => {
                warn!("Narrative analysis skipped: API key not configured.");
                errors.push("Narrative analysis: API key not configured.".to_string());
                ANALYSIS_NOT_EXECUTED.to_string()
            }
            Some(client) => match client.analyze(prompt).await {
                Ok(text) => text,
                Err(e) => {
                    warn!(error = %e, "Narrative analysis failed.");
                    errors.push(format!("Narrative analysis: {e}"));
                    format!("Narrative analysis failed: {e}")
                }
            },
        }
    }

    // --- Single-probe passthroughs for the per-probe API endpoints ---

    pub async fn dns_probe(
        &self,
        domain: &str,
        record_types: Option<&[String]>,
    ) -> ProbeOutcome<DnsRecords> {
        self.dns.resolve(domain, record_types).await
    }

    pub async fn whois_probe(&self, domain: &str) -> ProbeOutcome<WhoisInfo> {
        self.whois.lookup(domain).await
    }

    pub async fn nmap_probe(&self, targets: &[String]) -> ProbeOutcome<Vec<HostRecord>> {
        self.ports.scan(targets).await
    }

    /// `None` when no search provider is configured.
    pub async fn dork_probe(&self, query: &str) -> Option<ProbeOutcome<Vec<DorkItem>>> {
        match &self.dorks {
            Some(scanner) => Some(scanner.search(query).await),
            None => None,
        }
    }
}

/// The default dork when the caller supplies no custom query.
pub fn default_dork_query(target: &str) -> String {
    format!("site:{target} filetype:log OR \"Index of /\" OR \"admin\" OR \"login\"")
}

// --- Per-probe folds ---
// Each fold turns one probe outcome into its report slot plus its rendered
// text block, appending to `errors` exactly when the probe failed or was
// skipped for missing configuration. Kept free of I/O so they can be
// exercised directly in tests.

pub(crate) fn fold_dns(
    outcome: ProbeOutcome<DnsRecords>,
    errors: &mut Vec<String>,
) -> (DnsReport, String) {
    match outcome {
        Ok(records) => {
            let text = format::dns_text(&records);
            (DnsReport::from_records(records), text)
        }
        Err(e) => {
            warn!(error = %e, "DNS scan failed.");
            errors.push(format!("DNS scan: {e}"));
            (DnsReport::degraded(e.to_string()), format::dns_error_text(&e.to_string()))
        }
    }
}

pub(crate) fn fold_nmap(
    target: &str,
    outcome: ProbeOutcome<Vec<HostRecord>>,
    errors: &mut Vec<String>,
) -> (Vec<HostRecord>, String) {
    let hosts = match outcome {
        Ok(hosts) => hosts,
        Err(ProbeError::ToolUnavailable(detail)) => {
            warn!(%detail, "Nmap scan aborted: tool unavailable.");
            errors.push(
                "Nmap scan: nmap is not installed or not on PATH; install nmap to enable port scanning."
                    .to_string(),
            );
            vec![HostRecord::degraded(target, HostStatus::ErrorNmapNotFound, detail)]
        }
        Err(e) => {
            warn!(error = %e, "Nmap scan failed.");
            errors.push(format!("Nmap scan: {e}"));
            vec![HostRecord::degraded(target, HostStatus::ErrorUnexpected, e.to_string())]
        }
    };
    let text = format::nmap_text(&hosts, target);
    (hosts, text)
}

pub(crate) fn fold_whois(
    target: &str,
    outcome: ProbeOutcome<WhoisInfo>,
    errors: &mut Vec<String>,
) -> (WhoisInfo, String) {
    let info = match outcome {
        // A record with `error` set passes through untouched: it is
        // degraded data from the probe, not an execution failure.
        Ok(info) => info,
        Err(e) => {
            warn!(error = %e, "Whois scan failed.");
            errors.push(format!("Whois scan: {e}"));
            WhoisInfo::degraded(target, e.to_string())
        }
    };
    let text = format::whois_text(&info, target);
    (info, text)
}

pub(crate) fn fold_dorks(
    execution: DorkExecution,
    errors: &mut Vec<String>,
) -> (DorkReport, String) {
    let report = match execution {
        DorkExecution::Omitted(scenario) => DorkReport::omitted(scenario),
        DorkExecution::Unconfigured => {
            let message = "Google dorks skipped: search API credentials not configured.";
            warn!("{message}");
            errors.push(message.to_string());
            DorkReport::unconfigured(message)
        }
        DorkExecution::Executed { query, outcome } => match outcome {
            Ok(items) => DorkReport::completed(query, items),
            Err(e) => {
                warn!(%query, error = %e, "Dork search failed.");
                errors.push(format!("Google dorks scan: {e}"));
                DorkReport::failed(query, e.to_string())
            }
        },
    };
    let text = format::dorks_text(&report);
    (report, text)
}
