// src/core/prompt.rs

//! Narrative prompt assembly. Deterministic given its inputs: a header
//! naming the target, the non-empty probe blocks in fixed order, then a
//! fixed instruction suffix. No network or file access happens here.

use crate::core::models::{RenderedBlocks, Scenario};

/// Builds the full prompt sent to the narrative client.
///
/// The dork block is included only for the Complete scenario, and empty
/// blocks are filtered out of the join rather than inserted as blank lines.
pub fn build_prompt(
    target: &str,
    scenario: Scenario,
    blocks: &RenderedBlocks,
    language: &str,
) -> String {
    let header = format!("Security analysis for target: {target}\n");
    let suffix = instruction_suffix(language);

    let mut parts: Vec<&str> = vec![&header, &blocks.dns, &blocks.nmap, &blocks.whois];
    if scenario.includes_dorks() {
        parts.push(&blocks.google_dorks);
    }
    parts.push(&suffix);

    parts
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// The fixed closing instruction: summary, vulnerabilities, recommendations,
/// strictly grounded in the supplied data, answered in `language`.
pub fn instruction_suffix(language: &str) -> String {
    format!(
        "Please analyze the security information collected for the target. \
         Provide a summary of the key findings, identify potential \
         vulnerabilities or areas of concern relevant to security, and \
         suggest general security recommendations based strictly on the \
         data provided. Respond in {language}."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blocks() -> RenderedBlocks {
        RenderedBlocks {
            dns: "--- DNS Scan Results ---\nA:\n  - 1.2.3.4\n\n".to_string(),
            nmap: "--- Nmap Scan Results ---\nTarget: 1.2.3.4\n\n".to_string(),
            whois: "--- Whois Scan Results for example.com ---\n\n".to_string(),
            google_dorks: "--- Google Dorks Results (Query: q) ---\n\n".to_string(),
        }
    }

    #[test]
    fn basic_prompt_excludes_dork_block_and_ends_with_suffix() {
        let prompt = build_prompt("example.com", Scenario::Basic, &blocks(), "English");
        assert!(prompt.starts_with("Security analysis for target: example.com\n"));
        assert!(!prompt.contains("Google Dorks"));
        assert!(prompt.ends_with(&instruction_suffix("English")));
    }

    #[test]
    fn complete_prompt_places_dork_block_last_before_suffix() {
        let prompt = build_prompt("example.com", Scenario::Complete, &blocks(), "English");
        let dorks_at = prompt.find("Google Dorks").expect("dork block present");
        let whois_at = prompt.find("Whois Scan").expect("whois block present");
        let suffix_at = prompt.find("Please analyze").expect("suffix present");
        assert!(whois_at < dorks_at);
        assert!(dorks_at < suffix_at);
    }

    #[test]
    fn empty_blocks_are_filtered_not_joined_as_blank_lines() {
        let mut sparse = blocks();
        sparse.nmap = String::new();
        sparse.whois = String::new();
        let prompt = build_prompt("example.com", Scenario::Basic, &sparse, "English");
        assert!(!prompt.contains("\n\n\n\n"));
        assert!(prompt.contains("DNS Scan Results"));
    }

    #[test]
    fn suffix_names_the_response_language() {
        assert!(instruction_suffix("Spanish").ends_with("Respond in Spanish."));
    }
}
