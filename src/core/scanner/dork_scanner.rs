// src/core/scanner/dork_scanner.rs

use std::time::Duration;

use serde_json::Value;
use tracing::{info, warn};

use crate::config::SearchConfig;
use crate::core::models::{DorkItem, ProbeError, ProbeOutcome};

const SEARCH_ENDPOINT: &str = "https://www.googleapis.com/customsearch/v1";
const SEARCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Runs dork queries against the Google Custom Search API. Requires
/// provider credentials at construction; the orchestrator only builds one
/// when they are configured.
pub struct DorkScanner {
    client: reqwest::Client,
    api_key: String,
    engine_id: String,
    language: String,
}

impl DorkScanner {
    pub fn new(config: &SearchConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(SEARCH_TIMEOUT)
            .user_agent(concat!("atalaya/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            engine_id: config.engine_id.clone(),
            language: config.language.clone(),
        })
    }

    /// Executes one dork query. A response without an `items` array is a
    /// legitimate empty result; HTTP and shape errors fail the probe.
    pub async fn search(&self, query: &str) -> ProbeOutcome<Vec<DorkItem>> {
        info!(query, "Starting dork search.");
        let response = self
            .client
            .get(SEARCH_ENDPOINT)
            .query(&[
                ("key", self.api_key.as_str()),
                ("cx", self.engine_id.as_str()),
                ("q", query),
                ("start", "1"),
                ("lr", self.language.as_str()),
            ])
            .send()
            .await
            .map_err(|e| ProbeError::Transport(format!("search request failed: {e}")))?
            .error_for_status()
            .map_err(|e| ProbeError::Transport(format!("search API rejected the request: {e}")))?;

        let body: Value = response
            .json()
            .await
            .map_err(|e| ProbeError::Malformed(format!("search response was not JSON: {e}")))?;

        let items = parse_search_items(&body);
        if items.is_empty() {
            warn!(query, "Dork search returned no items.");
        } else {
            info!(query, count = items.len(), "Dork search finished.");
        }
        Ok(items)
    }
}

/// Maps the `items` array of a Custom Search response to dork items.
/// Missing fields become empty strings rather than dropping the item.
pub fn parse_search_items(body: &Value) -> Vec<DorkItem> {
    body.get("items")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .map(|item| DorkItem {
                    title: string_field(item, "title"),
                    link: string_field(item, "link"),
                    snippet: string_field(item, "snippet"),
                })
                .collect()
        })
        .unwrap_or_default()
}

fn string_field(item: &Value, key: &str) -> String {
    item.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn maps_items_to_dork_results() {
        let body = json!({
            "items": [
                {"title": "Index of /logs", "link": "https://example.com/logs", "snippet": "Parent directory"},
                {"title": "Login", "link": "https://example.com/admin"}
            ]
        });
        let items = parse_search_items(&body);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "Index of /logs");
        assert_eq!(items[1].snippet, "");
    }

    #[test]
    fn response_without_items_yields_empty_list() {
        assert!(parse_search_items(&json!({"searchInformation": {}})).is_empty());
        assert!(parse_search_items(&json!({"items": "not-an-array"})).is_empty());
    }
}
