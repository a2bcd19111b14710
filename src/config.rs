use anyhow::{bail, Context, Result};
use reqwest::Url;
use serde::{Deserialize, Serialize};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
const BASE_URL_ENV: &str = "PLANCHAT_BASE_URL";
const DEBUG_PAYLOAD_ENV: &str = "PLANCHAT_DEBUG_PAYLOAD";
const STREAM_PATH: &str = "/chat/stream";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Root of the streaming endpoint.
    pub base_url: String,
    /// Log outgoing request payloads at debug level.
    pub debug_payload: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            debug_payload: false,
        }
    }
}

impl Config {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn load() -> Result<Self> {
        let base_url = std::env::var(BASE_URL_ENV)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let debug_payload = std::env::var(DEBUG_PAYLOAD_ENV)
            .ok()
            .and_then(|value| parse_flag(&value))
            .unwrap_or(false);

        Ok(Self {
            base_url,
            debug_payload,
        })
    }

    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(self.base_url.trim())
            .with_context(|| format!("Invalid {BASE_URL_ENV} '{}'", self.base_url))?;
        if !matches!(url.scheme(), "http" | "https") {
            bail!(
                "Invalid {BASE_URL_ENV} '{}': expected http:// or https:// URL",
                self.base_url
            );
        }
        Ok(())
    }

    pub fn stream_url(&self) -> String {
        format!("{}{STREAM_PATH}", self.base_url.trim().trim_end_matches('/'))
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
