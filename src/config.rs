/// Client configuration: endpoint location, marketplace allow-list, timings
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Marketplace domains and link shorteners accepted as analyzable.
pub const DEFAULT_ELIGIBLE_DOMAINS: &[&str] = &[
    "amazon.com",
    "amazon.ca",
    "amazon.co.uk",
    "amazon.de",
    "amazon.fr",
    "amazon.it",
    "amazon.es",
    "amazon.nl",
    "amazon.se",
    "amazon.pl",
    "amazon.co.jp",
    "amazon.in",
    "amazon.com.au",
    "amazon.com.mx",
    "amazon.com.br",
    "amazon.com.tr",
    "amazon.sg",
    "amazon.ae",
    "amazon.sa",
    "amzn.to",
    "a.co",
];

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8001";
pub const DEFAULT_SETTLE_DELAY_MS: u32 = 1000;
pub const DEFAULT_RECENT_LIMIT: u32 = 10;

/// How a URL is compared against the allow-list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPolicy {
    /// Entry appears anywhere in the lowercased URL text
    #[default]
    Substring,
    /// Entry equals the parsed hostname or is a parent domain of it
    Host,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("api_base_url must not be empty")]
    EmptyBaseUrl,
    #[error("eligible_domains must list at least one domain")]
    NoDomains,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub eligible_domains: Vec<String>,
    pub match_policy: MatchPolicy,
    pub settle_delay_ms: u32,
    pub recent_limit: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            eligible_domains: DEFAULT_ELIGIBLE_DOMAINS
                .iter()
                .map(|d| d.to_string())
                .collect(),
            match_policy: MatchPolicy::default(),
            settle_delay_ms: DEFAULT_SETTLE_DELAY_MS,
            recent_limit: DEFAULT_RECENT_LIMIT,
        }
    }
}

impl ClientConfig {
    /// Parse a JSON override document; absent fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: ClientConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_base_url.trim().is_empty() {
            return Err(ConfigError::EmptyBaseUrl);
        }
        if self.eligible_domains.is_empty() {
            return Err(ConfigError::NoDomains);
        }
        Ok(())
    }

    /// Full URL for an API route, e.g. `endpoint("analyze")`
    pub fn endpoint(&self, route: &str) -> String {
        format!("{}/api/{}", self.api_base_url.trim_end_matches('/'), route)
    }
}
