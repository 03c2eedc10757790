use crate::{
    auth::{AuthProvider, HttpAuthProvider, LocalAuthProvider},
    calculator::PricingPolicy,
    error::GateResult,
    gate::Allowlist,
    metrics::{InputRanges, MetricsRecord},
};
use serde::{Deserialize, Serialize};

pub const DEFAULT_AUTH_TIMEOUT_MS: u64 = 10_000;

fn default_timeout_ms() -> u64 {
    DEFAULT_AUTH_TIMEOUT_MS
}

/// Where the external identity service lives. Absent means local mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthEndpointConfig {
    pub base_url:   String,
    pub api_key:    String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

/// On-disk overrides. Every section is optional; missing sections keep
/// the compiled-in defaults.
#[derive(Debug, Clone, Default, Deserialize)]
struct DashboardConfigFile {
    #[serde(default)]
    allowlist:    Option<Vec<String>>,
    #[serde(default)]
    auth:         Option<AuthEndpointConfig>,
    #[serde(default)]
    pricing:      Option<PricingPolicy>,
    #[serde(default)]
    input_ranges: Option<serde_json::Value>,
    #[serde(default)]
    seed:         Option<MetricsRecord>,
}

#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub allowlist: Allowlist,
    pub auth:      Option<AuthEndpointConfig>,
    pub pricing:   PricingPolicy,
    pub ranges:    InputRanges,
    pub seed:      MetricsRecord,
}

impl DashboardConfig {
    /// Compiled-in allowlist, seed values and ranges; local auth mode.
    pub fn builtin() -> anyhow::Result<Self> {
        Ok(Self {
            allowlist: Allowlist::builtin()?,
            auth:      None,
            pricing:   PricingPolicy::default(),
            ranges:    InputRanges::builtin()?,
            seed:      MetricsRecord::builtin_seed()?,
        })
    }

    /// Load overrides from a JSON file on top of the compiled-in defaults.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        Self::from_json(&content).map_err(|e| anyhow::anyhow!("Invalid config {path}: {e}"))
    }

    pub fn from_json(content: &str) -> anyhow::Result<Self> {
        let file: DashboardConfigFile = serde_json::from_str(content)?;
        let mut config = Self::builtin()?;

        if let Some(emails) = file.allowlist {
            config.allowlist = Allowlist::new(emails);
        }
        if let Some(auth) = file.auth {
            config.auth = Some(auth);
        }
        if let Some(pricing) = file.pricing {
            config.pricing = pricing;
        }
        if let Some(ranges) = file.input_ranges {
            config.ranges = InputRanges::from_json(&ranges.to_string())?;
        }
        if let Some(seed) = file.seed {
            config.seed = seed;
        }

        if config.seed.tier(&config.pricing.reference_tier).is_none() {
            log::warn!(
                "config: reference tier '{}' is not in the price list",
                config.pricing.reference_tier
            );
        }
        if config.allowlist.is_empty() {
            log::warn!("config: allowlist is empty; nobody can log in");
        }

        log::info!(
            "config: {} allowlisted, auth={}, reference tier={}",
            config.allowlist.len(),
            if config.auth.is_some() { "http" } else { "local" },
            config.pricing.reference_tier
        );
        Ok(config)
    }

    /// Config for unit tests: compiled-in data, a one-address allowlist,
    /// local auth.
    pub fn default_test() -> anyhow::Result<Self> {
        let mut config = Self::builtin()?;
        config.allowlist = Allowlist::new(["founder@test.local"]);
        Ok(config)
    }

    /// Pick the provider implementation once, at startup.
    pub fn build_provider(&self) -> GateResult<Box<dyn AuthProvider>> {
        match &self.auth {
            Some(endpoint) => Ok(Box::new(HttpAuthProvider::new(endpoint)?)),
            None => Ok(Box::new(LocalAuthProvider::new())),
        }
    }
}
