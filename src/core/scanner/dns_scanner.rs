// src/core/scanner/dns_scanner.rs

use std::str::FromStr;
use std::time::Duration;

use hickory_resolver::TokioAsyncResolver;
use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::error::ResolveErrorKind;
use hickory_resolver::proto::rr::RecordType;
use tracing::{debug, info, warn};

use crate::core::models::{DnsRecords, ProbeError, ProbeOutcome};

/// Record types resolved when the caller does not ask for specific ones.
pub const DEFAULT_RECORD_TYPES: &[&str] = &["A", "AAAA", "CNAME", "MX", "NS", "SOA", "TXT"];

/// Upper bound for a single record-type lookup. A lookup that exceeds it is
/// recorded as "no records of that type", matching the treatment of
/// NXDOMAIN and empty answers.
const LOOKUP_TIMEOUT: Duration = Duration::from_secs(5);

/// Resolves a fixed set of record types for one domain.
pub struct DnsScanner {
    resolver: TokioAsyncResolver,
}

impl DnsScanner {
    pub fn new() -> Self {
        let resolver =
            TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default());
        Self { resolver }
    }

    /// Resolves each requested record type for `domain`.
    ///
    /// "No records of this type", NXDOMAIN and per-lookup timeouts all yield
    /// an empty list for that type; only a resolver-level transport failure
    /// fails the probe as a whole.
    pub async fn resolve(
        &self,
        domain: &str,
        record_types: Option<&[String]>,
    ) -> ProbeOutcome<DnsRecords> {
        info!(domain, "Starting DNS scan.");

        let requested: Vec<String> = match record_types {
            Some(types) if !types.is_empty() => types.to_vec(),
            _ => DEFAULT_RECORD_TYPES.iter().map(|t| t.to_string()).collect(),
        };

        let mut records = DnsRecords::new();
        for type_name in &requested {
            let normalized = type_name.trim().to_uppercase();
            let record_type = match RecordType::from_str(&normalized) {
                Ok(rt) => rt,
                Err(_) => {
                    warn!(record_type = %type_name, "Unknown DNS record type requested, skipping.");
                    records.insert(normalized, Vec::new());
                    continue;
                }
            };

            let values = self.lookup_one(domain, record_type).await?;
            records.insert(normalized, values);
        }

        info!(domain, types = records.len(), "DNS scan finished.");
        Ok(records)
    }

    async fn lookup_one(
        &self,
        domain: &str,
        record_type: RecordType,
    ) -> ProbeOutcome<Vec<String>> {
        debug!(domain, record_type = %record_type, "Looking up records.");
        let lookup = tokio::time::timeout(LOOKUP_TIMEOUT, self.resolver.lookup(domain, record_type));
        match lookup.await {
            Err(_) => {
                warn!(domain, record_type = %record_type, "Lookup timed out.");
                Ok(Vec::new())
            }
            Ok(Ok(answer)) => Ok(answer.iter().map(|record| record.to_string()).collect()),
            Ok(Err(e)) => match e.kind() {
                ResolveErrorKind::NoRecordsFound { .. } => {
                    debug!(domain, record_type = %record_type, "No records found.");
                    Ok(Vec::new())
                }
                ResolveErrorKind::Timeout => {
                    warn!(domain, record_type = %record_type, "Resolver reported a timeout.");
                    Ok(Vec::new())
                }
                _ => {
                    warn!(domain, record_type = %record_type, error = %e, "DNS lookup failed.");
                    Err(ProbeError::Transport(format!("DNS error: {e}")))
                }
            },
        }
    }
}

impl Default for DnsScanner {
    fn default() -> Self {
        Self::new()
    }
}
