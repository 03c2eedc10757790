//! Static reference data: verified market figures, competitor
//! attributes and scenario tables. Compiled in, read-only.

use crate::{error::DashResult, types::Currency};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const VERIFIED_MARKET_JSON: &str = include_str!("../data/market/verified_market.json");
const COMPETITORS_JSON: &str = include_str!("../data/market/competitors.json");
const B2B_SCENARIOS_JSON: &str = include_str!("../data/market/b2b_scenarios.json");
const FEATURE_MATRIX_JSON: &str = include_str!("../data/market/feature_matrix.json");

// ── Market ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PilotPopulation {
    pub total:                     u64,
    pub certificated:              u64,
    pub students:                  u64,
    pub private:                   u64,
    pub commercial:                u64,
    pub atp:                       u64,
    pub cfis:                      u64,
    pub certificates_issued_2023:  u64,
    pub student_certs_issued_2023: u64,
    pub student_growth_yoy_pct:    f64,
    pub new_pilots_needed_2043:    u64,
    pub source:                    String,
}

impl PilotPopulation {
    /// Total addressable market used for penetration figures.
    pub fn total_addressable(&self) -> u64 {
        self.total
    }

    /// Ordering relations the figures are expected to satisfy.
    /// Violations are reported, never rejected.
    pub fn consistency_issues(&self) -> Vec<String> {
        let mut issues = Vec::new();
        if self.certificated > self.total {
            issues.push(format!(
                "certificated ({}) exceeds total pilots ({})",
                self.certificated, self.total
            ));
        }
        if self.students > self.total {
            issues.push(format!(
                "students ({}) exceeds total pilots ({})",
                self.students, self.total
            ));
        }
        if self.cfis > self.certificated {
            issues.push(format!(
                "CFIs ({}) exceed certificated pilots ({})",
                self.cfis, self.certificated
            ));
        }
        issues
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSizePoint {
    pub year:         u16,
    pub billions_usd: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingMarket {
    pub market_size_by_year:     Vec<MarketSizePoint>,
    pub cagr_pct:                f64,
    pub flight_schools:          u64,
    pub part141_schools:         u64,
    pub avg_students_per_school: u64,
    pub source:                  String,
}

impl TrainingMarket {
    pub fn size_in(&self, year: u16) -> Option<f64> {
        self.market_size_by_year
            .iter()
            .find(|p| p.year == year)
            .map(|p| p.billions_usd)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifiedMarket {
    pub pilots:        PilotPopulation,
    pub training:      TrainingMarket,
    pub growth_series: Vec<MarketSizePoint>,
}

// ── Competitors ────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CompetitorPricing {
    Free,
    Tiered { tiers: BTreeMap<String, Currency> },
}

impl CompetitorPricing {
    /// Cheapest paid entry point, `None` for free products.
    pub fn entry_price(&self) -> Option<Currency> {
        match self {
            CompetitorPricing::Free => None,
            CompetitorPricing::Tiered { tiers } => tiers.values().copied().reduce(f64::min),
        }
    }
}

/// Either an exact count or a descriptive figure such as "500K+".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserCount {
    Count(u64),
    Descriptive(String),
}

impl UserCount {
    pub fn as_count(&self) -> Option<u64> {
        match self {
            UserCount::Count(n) => Some(*n),
            UserCount::Descriptive(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExitValue {
    pub amount_billions: f64,
    pub buyer:           String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreatLevel {
    High,
    Medium,
    Low,
    Us,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Competitor {
    pub name:               String,
    pub category:           String,
    pub pricing:            CompetitorPricing,
    pub platforms:          Vec<String>,
    pub has_ocr:            bool,
    pub has_cross_platform: bool,
    pub has_b2b_model:      bool,
    #[serde(default)]
    pub user_count:         Option<UserCount>,
    pub strengths:          Vec<String>,
    pub gaps:               Vec<String>,
    pub verified:           bool,
    #[serde(default)]
    pub source:             Option<String>,
    #[serde(default)]
    pub exit_value:         Option<ExitValue>,
    #[serde(default)]
    pub price_increase:     Option<String>,
    pub threat:             ThreatLevel,
}

impl Competitor {
    pub fn is_self(&self) -> bool {
        self.threat == ThreatLevel::Us
    }
}

#[derive(Debug, Clone, Deserialize)]
struct CompetitorsFile {
    competitors: Vec<Competitor>,
}

// ── Scenarios ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct B2bScenario {
    pub label:    String,
    pub schools:  u64,
    pub students: u64,
    pub arr:      Currency,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct B2bScenarios {
    pub students_per_school:  u64,
    pub conversion_pct:       f64,
    pub blended_annual_price: Currency,
    pub scenarios:            Vec<B2bScenario>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    pub feature: String,
    pub support: Vec<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureMatrix {
    pub competitors: Vec<String>,
    pub features:    Vec<FeatureRow>,
}

impl FeatureMatrix {
    /// Features only the first column (our product) supports.
    pub fn unique_features(&self) -> Vec<&str> {
        self.features
            .iter()
            .filter(|row| {
                row.support.first().copied().unwrap_or(false)
                    && row.support.iter().skip(1).all(|s| !s)
            })
            .map(|row| row.feature.as_str())
            .collect()
    }
}

// ── Bundle ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceData {
    pub market:         VerifiedMarket,
    pub competitors:    Vec<Competitor>,
    pub b2b:            B2bScenarios,
    pub feature_matrix: FeatureMatrix,
}

impl ReferenceData {
    /// Parse the compiled-in tables.
    pub fn builtin() -> DashResult<Self> {
        let market: VerifiedMarket = serde_json::from_str(VERIFIED_MARKET_JSON)?;
        let competitors: CompetitorsFile = serde_json::from_str(COMPETITORS_JSON)?;
        let b2b: B2bScenarios = serde_json::from_str(B2B_SCENARIOS_JSON)?;
        let feature_matrix: FeatureMatrix = serde_json::from_str(FEATURE_MATRIX_JSON)?;

        for issue in market.pilots.consistency_issues() {
            log::warn!("reference_data: pilot figures inconsistent: {issue}");
        }

        Ok(Self {
            market,
            competitors: competitors.competitors,
            b2b,
            feature_matrix,
        })
    }

    pub fn competitor(&self, name: &str) -> Option<&Competitor> {
        self.competitors.iter().find(|c| c.name == name)
    }
}
