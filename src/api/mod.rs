// src/api/mod.rs

//! Thin HTTP layer over the orchestration engine.
//!
//! Scan endpoints always answer 200 with the full report once the target
//! parameter is present and well-formed; probe failures travel inside the
//! report body, never as HTTP errors. A 400 is returned only for a
//! missing or blank target, before the engine runs.

use std::sync::Arc;

use axum::extract::{Json, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::Router;
use serde::{Deserialize, Serialize};
use tracing::info;
use url::Url;

use crate::core::models::{ProbeError, Scenario};
use crate::core::orchestrator::Orchestrator;

pub fn router(orchestrator: Arc<Orchestrator>) -> Router {
    Router::new()
        .route("/api/scans/basic", post(scan_basic))
        .route("/api/scans/complete", post(scan_complete))
        .route("/api/probes/dns", post(probe_dns))
        .route("/api/probes/whois", post(probe_whois))
        .route("/api/probes/nmap", post(probe_nmap))
        .route("/api/probes/dorks", post(probe_dorks))
        .with_state(orchestrator)
}

#[derive(Debug, Deserialize)]
struct ScanRequest {
    target: String,
    #[serde(default)]
    query: Option<String>,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl ErrorBody {
    fn response(status: StatusCode, message: impl Into<String>) -> Response {
        (status, Json(Self { error: message.into() })).into_response()
    }
}

async fn scan_basic(
    State(orchestrator): State<Arc<Orchestrator>>,
    Json(request): Json<ScanRequest>,
) -> Response {
    run_scan(orchestrator, Scenario::Basic, request).await
}

async fn scan_complete(
    State(orchestrator): State<Arc<Orchestrator>>,
    Json(request): Json<ScanRequest>,
) -> Response {
    run_scan(orchestrator, Scenario::Complete, request).await
}

async fn run_scan(
    orchestrator: Arc<Orchestrator>,
    scenario: Scenario,
    request: ScanRequest,
) -> Response {
    let Some(target) = normalize_target(&request.target) else {
        return ErrorBody::response(
            StatusCode::BAD_REQUEST,
            "the 'target' parameter is required and must not be blank",
        );
    };

    info!(%target, %scenario, "Received scan request.");
    let report = orchestrator
        .run(&target, &scenario.to_string(), request.query.as_deref())
        .await;
    (StatusCode::OK, Json(report)).into_response()
}

/// Extracts a bare host from whatever the caller sent: trims whitespace,
/// tolerates a scheme or path, falls back to the raw input when URL
/// parsing cannot make sense of it. Blank input is rejected.
fn normalize_target(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let with_scheme = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };
    let host = Url::parse(&with_scheme)
        .ok()
        .and_then(|url| url.host_str().map(str::to_string));
    Some(host.unwrap_or_else(|| trimmed.to_string()))
}

// --- Individual probe endpoints ---
// Direct access to single probes, useful for debugging a target without a
// full orchestration run. Degraded-but-structured results (e.g. a WHOIS
// record with its error field set) are still 200s; transport-level probe
// failures map to 502.

#[derive(Debug, Deserialize)]
struct DnsProbeRequest {
    domain: String,
    #[serde(default)]
    record_types: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct WhoisProbeRequest {
    domain: String,
}

#[derive(Debug, Deserialize)]
struct NmapProbeRequest {
    targets: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct DorkProbeRequest {
    query: String,
}

async fn probe_dns(
    State(orchestrator): State<Arc<Orchestrator>>,
    Json(request): Json<DnsProbeRequest>,
) -> Response {
    let Some(domain) = normalize_target(&request.domain) else {
        return ErrorBody::response(StatusCode::BAD_REQUEST, "the 'domain' parameter is required");
    };
    match orchestrator
        .dns_probe(&domain, request.record_types.as_deref())
        .await
    {
        Ok(records) => (StatusCode::OK, Json(records)).into_response(),
        Err(e) => probe_failure(e),
    }
}

async fn probe_whois(
    State(orchestrator): State<Arc<Orchestrator>>,
    Json(request): Json<WhoisProbeRequest>,
) -> Response {
    let Some(domain) = normalize_target(&request.domain) else {
        return ErrorBody::response(StatusCode::BAD_REQUEST, "the 'domain' parameter is required");
    };
    match orchestrator.whois_probe(&domain).await {
        Ok(info) => (StatusCode::OK, Json(info)).into_response(),
        Err(e) => probe_failure(e),
    }
}

async fn probe_nmap(
    State(orchestrator): State<Arc<Orchestrator>>,
    Json(request): Json<NmapProbeRequest>,
) -> Response {
    let targets: Vec<String> = request
        .targets
        .iter()
        .filter_map(|t| normalize_target(t))
        .collect();
    if targets.is_empty() {
        return ErrorBody::response(
            StatusCode::BAD_REQUEST,
            "the 'targets' parameter must contain at least one target",
        );
    }
    match orchestrator.nmap_probe(&targets).await {
        Ok(hosts) => (StatusCode::OK, Json(hosts)).into_response(),
        Err(e) => probe_failure(e),
    }
}

async fn probe_dorks(
    State(orchestrator): State<Arc<Orchestrator>>,
    Json(request): Json<DorkProbeRequest>,
) -> Response {
    let query = request.query.trim();
    if query.is_empty() {
        return ErrorBody::response(StatusCode::BAD_REQUEST, "the 'query' parameter is required");
    }
    match orchestrator.dork_probe(query).await {
        None => ErrorBody::response(
            StatusCode::SERVICE_UNAVAILABLE,
            "search API credentials are not configured",
        ),
        Some(Ok(items)) => (StatusCode::OK, Json(items)).into_response(),
        Some(Err(e)) => probe_failure(e),
    }
}

fn probe_failure(error: ProbeError) -> Response {
    ErrorBody::response(StatusCode::BAD_GATEWAY, error.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_targets_are_rejected() {
        assert_eq!(normalize_target(""), None);
        assert_eq!(normalize_target("   "), None);
    }

    #[test]
    fn scheme_and_path_are_stripped_from_targets() {
        assert_eq!(
            normalize_target("https://example.com/admin"),
            Some("example.com".to_string())
        );
        assert_eq!(normalize_target("example.com"), Some("example.com".to_string()));
        assert_eq!(
            normalize_target("  example.com  "),
            Some("example.com".to_string())
        );
    }

    #[test]
    fn unparsable_input_falls_back_to_the_raw_string() {
        assert_eq!(
            normalize_target("not a url at all"),
            Some("not a url at all".to_string())
        );
    }
}
