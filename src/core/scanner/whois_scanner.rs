// src/core/scanner/whois_scanner.rs

use std::time::Duration;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};
use whois_rust::{WhoIs, WhoIsError, WhoIsLookupOptions};

use crate::core::models::{ProbeError, ProbeOutcome, WhoisInfo};

/// Registry servers for the TLDs we expect to scan. whois-rust picks the
/// server by the target's TLD; a TLD missing from this table surfaces as a
/// probe failure rather than a silent empty result.
const WHOIS_SERVERS: &str = r#"{
    "_": { "ip": "whois.arin.net" },
    "com": "whois.verisign-grs.com",
    "net": "whois.verisign-grs.com",
    "org": "whois.publicinterestregistry.org",
    "info": "whois.nic.info",
    "biz": "whois.nic.biz",
    "edu": "whois.educause.edu",
    "gov": "whois.dotgov.gov",
    "io": "whois.nic.io",
    "co": "whois.nic.co",
    "me": "whois.nic.me",
    "dev": "whois.nic.google",
    "app": "whois.nic.google",
    "ai": "whois.nic.ai",
    "xyz": "whois.nic.xyz",
    "tech": "whois.nic.tech",
    "online": "whois.nic.online",
    "site": "whois.nic.site",
    "cloud": "whois.nic.cloud",
    "es": "whois.nic.es",
    "mx": "whois.mx",
    "ar": "whois.nic.ar",
    "cl": "whois.nic.cl",
    "uk": "whois.nic.uk",
    "de": "whois.denic.de",
    "fr": "whois.nic.fr",
    "it": "whois.nic.it",
    "nl": "whois.domain-registry.nl",
    "eu": "whois.eu",
    "us": "whois.nic.us",
    "ca": "whois.cira.ca",
    "br": "whois.registro.br"
}"#;

const LOOKUP_TIMEOUT_SECS: u64 = 30;

lazy_static! {
    static ref RE_DOMAIN: Regex = Regex::new(r"(?im)^[ \t]*Domain Name:[ \t]*(\S+)").unwrap();
    static ref RE_REGISTRAR: Regex = Regex::new(r"(?im)^[ \t]*Registrar:[ \t]*(.+?)[ \t]*$").unwrap();
    static ref RE_WHOIS_SERVER: Regex =
        Regex::new(r"(?im)^[ \t]*(?:Registrar WHOIS Server|Whois Server):[ \t]*(\S+)").unwrap();
    static ref RE_CREATED: Regex = Regex::new(
        r"(?im)^[ \t]*(?:Creation Date|Created On|Created|Registered On):[ \t]*(.+?)[ \t]*$"
    )
    .unwrap();
    static ref RE_EXPIRES: Regex = Regex::new(
        r"(?im)^[ \t]*(?:Registry Expiry Date|Expiration Date|Expiry Date|Expires On|Expires):[ \t]*(.+?)[ \t]*$"
    )
    .unwrap();
    static ref RE_UPDATED: Regex = Regex::new(
        r"(?im)^[ \t]*(?:Updated Date|Last Updated On|Last Updated|Last Modified):[ \t]*(.+?)[ \t]*$"
    )
    .unwrap();
    static ref RE_NAME_SERVER: Regex =
        Regex::new(r"(?im)^[ \t]*(?:Name Server|Nserver):[ \t]*(\S+)").unwrap();
    static ref RE_STATUS: Regex =
        Regex::new(r"(?im)^[ \t]*(?:Domain Status|Status):[ \t]*(\S+)").unwrap();
    static ref RE_COUNTRY: Regex =
        Regex::new(r"(?im)^[ \t]*(?:Registrant Country|Country):[ \t]*(\S+)").unwrap();
    static ref RE_EMAIL: Regex =
        Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").unwrap();
}

/// WHOIS lookup plus an explicit parse of the raw response into
/// [`WhoisInfo`]. The parse happens at this boundary so the engine only
/// ever sees the strongly-typed record.
pub struct WhoisScanner {
    client: WhoIs,
}

impl WhoisScanner {
    /// Fails only if the embedded server table cannot be parsed, which is a
    /// programming error, not a runtime condition.
    pub fn new() -> Result<Self, WhoIsError> {
        Ok(Self {
            client: WhoIs::from_string(WHOIS_SERVERS)?,
        })
    }

    /// Looks up `domain` and parses the response. A response with no
    /// recognizable fields yields a [`WhoisInfo`] with `error` set, not a
    /// probe failure; transport problems and timeouts fail the probe.
    pub async fn lookup(&self, domain: &str) -> ProbeOutcome<WhoisInfo> {
        info!(domain, "Starting WHOIS scan.");
        let options = WhoIsLookupOptions::from_string(domain)
            .map_err(|e| ProbeError::Malformed(format!("invalid WHOIS target: {e:?}")))?;

        let raw = tokio::time::timeout(
            Duration::from_secs(LOOKUP_TIMEOUT_SECS),
            self.client.lookup_async(options),
        )
        .await
        .map_err(|_| ProbeError::Timeout(LOOKUP_TIMEOUT_SECS))?
        .map_err(|e| ProbeError::Transport(format!("WHOIS lookup failed: {e:?}")))?;

        let info = parse_whois_response(domain, &raw);
        if info.error.is_some() {
            warn!(domain, "WHOIS response contained no parsable fields.");
        } else {
            info!(domain, "WHOIS scan finished.");
        }
        Ok(info)
    }
}

/// Extracts the typed fields from a raw WHOIS response. Absent fields stay
/// `None`/empty; a response with nothing recognizable at all gets the
/// `error` marker set while still naming the queried domain.
pub fn parse_whois_response(domain: &str, raw: &str) -> WhoisInfo {
    let mut info = WhoisInfo {
        domain_name: all_captures(&RE_DOMAIN, raw),
        registrar: first_capture(&RE_REGISTRAR, raw),
        whois_server: first_capture(&RE_WHOIS_SERVER, raw),
        creation_date: first_capture(&RE_CREATED, raw),
        expiration_date: first_capture(&RE_EXPIRES, raw),
        updated_date: first_capture(&RE_UPDATED, raw),
        name_servers: all_captures(&RE_NAME_SERVER, raw),
        status: all_captures(&RE_STATUS, raw),
        emails: all_matches(&RE_EMAIL, raw),
        country: first_capture(&RE_COUNTRY, raw),
        error: None,
    };

    if info.is_empty() {
        info.domain_name = vec![domain.to_string()];
        info.error = Some("no WHOIS fields could be parsed from the response".to_string());
    }
    info
}

fn first_capture(re: &Regex, raw: &str) -> Option<String> {
    re.captures(raw)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

fn all_captures(re: &Regex, raw: &str) -> Vec<String> {
    let mut seen = Vec::new();
    for caps in re.captures_iter(raw) {
        if let Some(m) = caps.get(1) {
            let value = m.as_str().to_string();
            if !seen.iter().any(|v: &String| v.eq_ignore_ascii_case(&value)) {
                seen.push(value);
            }
        }
    }
    seen
}

fn all_matches(re: &Regex, raw: &str) -> Vec<String> {
    let mut seen = Vec::new();
    for m in re.find_iter(raw) {
        let value = m.as_str().to_string();
        if !seen.iter().any(|v: &String| v.eq_ignore_ascii_case(&value)) {
            seen.push(value);
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
Domain Name: EXAMPLE.COM
Registry Domain ID: 2336799_DOMAIN_COM-VRSN
Registrar WHOIS Server: whois.iana.org
Registrar: RESERVED-Internet Assigned Numbers Authority
Updated Date: 2024-08-14T07:01:34Z
Creation Date: 1995-08-14T04:00:00Z
Registry Expiry Date: 2025-08-13T04:00:00Z
Domain Status: clientDeleteProhibited https://icann.org/epp#clientDeleteProhibited
Domain Status: clientTransferProhibited https://icann.org/epp#clientTransferProhibited
Name Server: A.IANA-SERVERS.NET
Name Server: B.IANA-SERVERS.NET
Registrant Country: US
Registrar Abuse Contact Email: abuse@iana.org
";

    #[test]
    fn parses_core_registration_fields() {
        let info = parse_whois_response("example.com", SAMPLE);
        assert_eq!(info.domain_name, vec!["EXAMPLE.COM".to_string()]);
        assert_eq!(
            info.registrar.as_deref(),
            Some("RESERVED-Internet Assigned Numbers Authority")
        );
        assert_eq!(info.whois_server.as_deref(), Some("whois.iana.org"));
        assert_eq!(info.creation_date.as_deref(), Some("1995-08-14T04:00:00Z"));
        assert_eq!(info.expiration_date.as_deref(), Some("2025-08-13T04:00:00Z"));
        assert_eq!(info.updated_date.as_deref(), Some("2024-08-14T07:01:34Z"));
        assert_eq!(
            info.name_servers,
            vec!["A.IANA-SERVERS.NET".to_string(), "B.IANA-SERVERS.NET".to_string()]
        );
        assert_eq!(info.status.len(), 2);
        assert_eq!(info.emails, vec!["abuse@iana.org".to_string()]);
        assert_eq!(info.country.as_deref(), Some("US"));
        assert!(info.error.is_none());
    }

    #[test]
    fn unparsable_response_is_degraded_data_not_a_failure() {
        let info = parse_whois_response("example.com", "no match for requested object\n");
        assert_eq!(info.domain_name, vec!["example.com".to_string()]);
        assert!(info.error.is_some());
    }

    #[test]
    fn duplicate_values_are_deduplicated_case_insensitively() {
        let raw = "Name Server: ns1.example.com\nName Server: NS1.EXAMPLE.COM\n";
        let info = parse_whois_response("example.com", raw);
        assert_eq!(info.name_servers, vec!["ns1.example.com".to_string()]);
    }

    #[test]
    fn embedded_server_table_is_valid() {
        assert!(WhoisScanner::new().is_ok());
    }
}
