// src/config.rs

//! Explicit runtime configuration, read from the environment exactly once
//! at startup and passed down by value. Probe code never performs ambient
//! environment lookups of its own.

use std::env;
use std::net::SocketAddr;

use color_eyre::eyre::{Result, WrapErr};
use tracing::warn;

const DEFAULT_BIND: &str = "127.0.0.1:8000";
const DEFAULT_SEARCH_LANGUAGE: &str = "lang_en";
const DEFAULT_NARRATIVE_ENDPOINT: &str = "https://api.deepseek.com/chat/completions";
const DEFAULT_NARRATIVE_MODEL: &str = "deepseek-chat";
const DEFAULT_RESPONSE_LANGUAGE: &str = "English";

/// Credentials and options for the dork-search provider. Only constructed
/// when both credentials are present.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub api_key: String,
    pub engine_id: String,
    /// Custom Search `lr` restrict parameter, e.g. "lang_en".
    pub language: String,
}

/// Credential and endpoint for the narrative-analysis service.
#[derive(Debug, Clone)]
pub struct NarrativeConfig {
    pub api_key: String,
    pub endpoint: String,
    pub model: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub search: Option<SearchConfig>,
    pub narrative: Option<NarrativeConfig>,
    /// Language the narrative analysis is asked to answer in.
    pub response_language: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let bind = env_var("ATALAYA_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind_addr: SocketAddr = bind
            .parse()
            .wrap_err_with(|| format!("invalid ATALAYA_BIND address: {bind}"))?;

        let search = match (
            env_var("GOOGLE_SEARCH_API_KEY"),
            env_var("GOOGLE_SEARCH_ENGINE_ID"),
        ) {
            (Some(api_key), Some(engine_id)) => Some(SearchConfig {
                api_key,
                engine_id,
                language: env_var("ATALAYA_SEARCH_LANG")
                    .unwrap_or_else(|| DEFAULT_SEARCH_LANGUAGE.to_string()),
            }),
            _ => {
                warn!("Search API key or engine id not configured; dork queries will be skipped.");
                None
            }
        };

        let narrative = match env_var("DEEPSEEK_API_KEY") {
            Some(api_key) => Some(NarrativeConfig {
                api_key,
                endpoint: env_var("DEEPSEEK_API_URL")
                    .unwrap_or_else(|| DEFAULT_NARRATIVE_ENDPOINT.to_string()),
                model: env_var("DEEPSEEK_MODEL")
                    .unwrap_or_else(|| DEFAULT_NARRATIVE_MODEL.to_string()),
            }),
            None => {
                warn!("DEEPSEEK_API_KEY not configured; narrative analysis will be skipped.");
                None
            }
        };

        Ok(Self {
            bind_addr,
            search,
            narrative,
            response_language: env_var("ATALAYA_RESPONSE_LANGUAGE")
                .unwrap_or_else(|| DEFAULT_RESPONSE_LANGUAGE.to_string()),
        })
    }
}

/// Reads an environment variable, treating unset and blank the same way.
fn env_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
