//! Metrics store: the single mutable record of business metrics and
//! what-if assumptions.
//!
//! RULE: All writes go through MetricsStore::set / set_tier_price.
//! That is the input boundary; it clamps every value to the field's
//! configured range. MetricsRecord itself performs no validation, so the
//! calculator still accepts arbitrary numbers.

use crate::{
    error::{DashError, DashResult},
    types::{round_half_up, Currency, Percent},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

const SEED_METRICS_JSON: &str = include_str!("../data/metrics/seed_metrics.json");
const INPUT_RANGES_JSON: &str = include_str!("../data/metrics/input_ranges.json");

/// Range key used for every tier price except enterprise.
const TIER_PRICE_RANGE: &str = "tier_price";
const ENTERPRISE_PRICE_RANGE: &str = "enterprise_price";
const ENTERPRISE_TIER: &str = "enterprise";

// ── Record ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Counters {
    pub total_users:      u64,
    pub paid_users:       u64,
    pub free_users:       u64,
    pub active_schools:   u64,
    pub schools_in_talks: u64,
}

/// A monthly usage quota. Serialized as an integer where -1 means unlimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum Quota {
    Limited(u32),
    Unlimited,
}

impl TryFrom<i64> for Quota {
    type Error = String;

    fn try_from(raw: i64) -> Result<Self, Self::Error> {
        match raw {
            -1 => Ok(Quota::Unlimited),
            n if n >= 0 && n <= u32::MAX as i64 => Ok(Quota::Limited(n as u32)),
            n => Err(format!("quota must be -1 (unlimited) or a non-negative count, got {n}")),
        }
    }
}

impl From<Quota> for i64 {
    fn from(q: Quota) -> i64 {
        match q {
            Quota::Limited(n) => n as i64,
            Quota::Unlimited  => -1,
        }
    }
}

impl fmt::Display for Quota {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Quota::Limited(n) => write!(f, "{n}/mo"),
            Quota::Unlimited  => write!(f, "unlimited"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceTier {
    pub name:            String,
    /// Price per year. Monthly equivalents are annual / 12.
    pub annual_price:    Currency,
    pub monthly_scans:   Quota,
    pub monthly_entries: Quota,
}

impl PriceTier {
    pub fn monthly_price(&self) -> Currency {
        self.annual_price / 12.0
    }
}

/// Monthly cost line items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostLineItems {
    pub infrastructure: Currency,
    pub hosting:        Currency,
    pub ai_processing:  Currency,
    pub other:          Currency,
}

impl CostLineItems {
    pub fn items(&self) -> [(&'static str, Currency); 4] {
        [
            ("infrastructure", self.infrastructure),
            ("hosting",        self.hosting),
            ("ai_processing",  self.ai_processing),
            ("other",          self.other),
        ]
    }
}

/// Inputs of the what-if panel. Only the projection calculator reads these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthAssumptions {
    pub current_users:       f64,
    pub conversion_rate_pct: Percent,
    pub avg_annual_price:    Currency,
    pub monthly_growth_pct:  Percent,
    pub monthly_churn_pct:   Percent,
    pub schools_per_quarter: f64,
    pub students_per_school: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsRecord {
    pub counters:    Counters,
    pub mrr:         Currency,
    pub tiers:       Vec<PriceTier>,
    pub costs:       CostLineItems,
    pub assumptions: GrowthAssumptions,
}

impl MetricsRecord {
    /// The compiled-in seed values the dashboard starts from.
    pub fn builtin_seed() -> DashResult<Self> {
        Ok(serde_json::from_str(SEED_METRICS_JSON)?)
    }

    pub fn tier(&self, name: &str) -> Option<&PriceTier> {
        self.tiers.iter().find(|t| t.name == name)
    }

    fn tier_mut(&mut self, name: &str) -> Option<&mut PriceTier> {
        self.tiers.iter_mut().find(|t| t.name == name)
    }
}

// ── Fields ─────────────────────────────────────────────────────────

/// Every scalar field the presentation layer may write.
/// Tier prices are addressed separately by tier name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricField {
    // Counters
    TotalUsers,
    PaidUsers,
    FreeUsers,
    ActiveSchools,
    SchoolsInTalks,
    // Revenue
    Mrr,
    // Costs
    Infrastructure,
    Hosting,
    AiProcessing,
    Other,
    // Assumptions
    CurrentUsers,
    ConversionRatePct,
    AvgAnnualPrice,
    MonthlyGrowthPct,
    MonthlyChurnPct,
    SchoolsPerQuarter,
    StudentsPerSchool,
}

impl MetricField {
    pub const ALL: [MetricField; 17] = [
        MetricField::TotalUsers,
        MetricField::PaidUsers,
        MetricField::FreeUsers,
        MetricField::ActiveSchools,
        MetricField::SchoolsInTalks,
        MetricField::Mrr,
        MetricField::Infrastructure,
        MetricField::Hosting,
        MetricField::AiProcessing,
        MetricField::Other,
        MetricField::CurrentUsers,
        MetricField::ConversionRatePct,
        MetricField::AvgAnnualPrice,
        MetricField::MonthlyGrowthPct,
        MetricField::MonthlyChurnPct,
        MetricField::SchoolsPerQuarter,
        MetricField::StudentsPerSchool,
    ];

    pub fn key(self) -> &'static str {
        match self {
            MetricField::TotalUsers        => "total_users",
            MetricField::PaidUsers         => "paid_users",
            MetricField::FreeUsers         => "free_users",
            MetricField::ActiveSchools     => "active_schools",
            MetricField::SchoolsInTalks    => "schools_in_talks",
            MetricField::Mrr               => "mrr",
            MetricField::Infrastructure    => "infrastructure",
            MetricField::Hosting           => "hosting",
            MetricField::AiProcessing      => "ai_processing",
            MetricField::Other             => "other",
            MetricField::CurrentUsers      => "current_users",
            MetricField::ConversionRatePct => "conversion_rate_pct",
            MetricField::AvgAnnualPrice    => "avg_annual_price",
            MetricField::MonthlyGrowthPct  => "monthly_growth_pct",
            MetricField::MonthlyChurnPct   => "monthly_churn_pct",
            MetricField::SchoolsPerQuarter => "schools_per_quarter",
            MetricField::StudentsPerSchool => "students_per_school",
        }
    }

    /// Counter fields hold whole numbers; writes are rounded after clamping.
    pub fn is_integral(self) -> bool {
        matches!(
            self,
            MetricField::TotalUsers
                | MetricField::PaidUsers
                | MetricField::FreeUsers
                | MetricField::ActiveSchools
                | MetricField::SchoolsInTalks
        )
    }
}

impl FromStr for MetricField {
    type Err = DashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MetricField::ALL
            .iter()
            .copied()
            .find(|f| f.key() == s)
            .ok_or_else(|| DashError::UnknownField { field: s.to_string() })
    }
}

impl fmt::Display for MetricField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

// ── Ranges ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InputRange {
    pub min: f64,
    pub max: f64,
}

impl InputRange {
    pub fn clamp(&self, value: f64) -> f64 {
        value.max(self.min).min(self.max)
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

#[derive(Debug, Clone, Deserialize)]
struct InputRangesFile {
    ranges: BTreeMap<String, InputRange>,
}

/// Per-field [min, max] ranges enforced at the input boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputRanges {
    fields:           BTreeMap<MetricField, InputRange>,
    tier_price:       InputRange,
    enterprise_price: InputRange,
}

impl InputRanges {
    pub fn builtin() -> DashResult<Self> {
        Self::from_json(INPUT_RANGES_JSON)
    }

    pub fn from_json(content: &str) -> DashResult<Self> {
        let file: InputRangesFile = serde_json::from_str(content)?;
        let lookup = |key: &str| {
            file.ranges
                .get(key)
                .copied()
                .ok_or_else(|| DashError::UnknownField { field: key.to_string() })
        };

        let mut fields = BTreeMap::new();
        for field in MetricField::ALL {
            fields.insert(field, lookup(field.key())?);
        }

        Ok(Self {
            fields,
            tier_price:       lookup(TIER_PRICE_RANGE)?,
            enterprise_price: lookup(ENTERPRISE_PRICE_RANGE)?,
        })
    }

    pub fn for_field(&self, field: MetricField) -> InputRange {
        // Every field is inserted by from_json; a missing entry cannot happen.
        self.fields
            .get(&field)
            .copied()
            .unwrap_or(InputRange { min: f64::MIN, max: f64::MAX })
    }

    pub fn for_tier(&self, tier: &str) -> InputRange {
        if tier == ENTERPRISE_TIER {
            self.enterprise_price
        } else {
            self.tier_price
        }
    }
}

// ── Store ──────────────────────────────────────────────────────────

/// Result of a single write through the input boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetOutcome {
    pub field:     String,
    pub requested: f64,
    pub applied:   f64,
    pub clamped:   bool,
}

pub struct MetricsStore {
    seed:   MetricsRecord,
    record: MetricsRecord,
    ranges: InputRanges,
}

impl MetricsStore {
    pub fn new(seed: MetricsRecord, ranges: InputRanges) -> Self {
        Self {
            record: seed.clone(),
            seed,
            ranges,
        }
    }

    pub fn record(&self) -> &MetricsRecord {
        &self.record
    }

    pub fn ranges(&self) -> &InputRanges {
        &self.ranges
    }

    /// Discard every edit and go back to the seed values (a page reload).
    pub fn reset(&mut self) {
        log::info!("metrics: reset to seed values");
        self.record = self.seed.clone();
    }

    pub fn get(&self, field: MetricField) -> f64 {
        let r = &self.record;
        match field {
            MetricField::TotalUsers        => r.counters.total_users as f64,
            MetricField::PaidUsers         => r.counters.paid_users as f64,
            MetricField::FreeUsers         => r.counters.free_users as f64,
            MetricField::ActiveSchools     => r.counters.active_schools as f64,
            MetricField::SchoolsInTalks    => r.counters.schools_in_talks as f64,
            MetricField::Mrr               => r.mrr,
            MetricField::Infrastructure    => r.costs.infrastructure,
            MetricField::Hosting           => r.costs.hosting,
            MetricField::AiProcessing      => r.costs.ai_processing,
            MetricField::Other             => r.costs.other,
            MetricField::CurrentUsers      => r.assumptions.current_users,
            MetricField::ConversionRatePct => r.assumptions.conversion_rate_pct,
            MetricField::AvgAnnualPrice    => r.assumptions.avg_annual_price,
            MetricField::MonthlyGrowthPct  => r.assumptions.monthly_growth_pct,
            MetricField::MonthlyChurnPct   => r.assumptions.monthly_churn_pct,
            MetricField::SchoolsPerQuarter => r.assumptions.schools_per_quarter,
            MetricField::StudentsPerSchool => r.assumptions.students_per_school,
        }
    }

    /// Write one field, clamped to its range. Non-finite input is rejected
    /// rather than clamped.
    pub fn set(&mut self, field: MetricField, value: f64) -> DashResult<SetOutcome> {
        if !value.is_finite() {
            return Err(DashError::NonFiniteValue { field: field.key().to_string(), value });
        }

        let range = self.ranges.for_field(field);
        let mut applied = range.clamp(value);
        if field.is_integral() {
            applied = round_half_up(applied);
        }

        let r = &mut self.record;
        match field {
            MetricField::TotalUsers        => r.counters.total_users = applied as u64,
            MetricField::PaidUsers         => r.counters.paid_users = applied as u64,
            MetricField::FreeUsers         => r.counters.free_users = applied as u64,
            MetricField::ActiveSchools     => r.counters.active_schools = applied as u64,
            MetricField::SchoolsInTalks    => r.counters.schools_in_talks = applied as u64,
            MetricField::Mrr               => r.mrr = applied,
            MetricField::Infrastructure    => r.costs.infrastructure = applied,
            MetricField::Hosting           => r.costs.hosting = applied,
            MetricField::AiProcessing      => r.costs.ai_processing = applied,
            MetricField::Other             => r.costs.other = applied,
            MetricField::CurrentUsers      => r.assumptions.current_users = applied,
            MetricField::ConversionRatePct => r.assumptions.conversion_rate_pct = applied,
            MetricField::AvgAnnualPrice    => r.assumptions.avg_annual_price = applied,
            MetricField::MonthlyGrowthPct  => r.assumptions.monthly_growth_pct = applied,
            MetricField::MonthlyChurnPct   => r.assumptions.monthly_churn_pct = applied,
            MetricField::SchoolsPerQuarter => r.assumptions.schools_per_quarter = applied,
            MetricField::StudentsPerSchool => r.assumptions.students_per_school = applied,
        }

        let clamped = !range.contains(value);
        if clamped {
            log::warn!(
                "metrics: {field} = {value} outside [{}, {}], clamped to {applied}",
                range.min,
                range.max
            );
        } else {
            log::debug!("metrics: {field} = {applied}");
        }

        Ok(SetOutcome {
            field: field.key().to_string(),
            requested: value,
            applied,
            clamped,
        })
    }

    pub fn set_tier_price(&mut self, tier: &str, price: Currency) -> DashResult<SetOutcome> {
        let field = format!("{tier}.annual_price");
        if !price.is_finite() {
            return Err(DashError::NonFiniteValue { field, value: price });
        }

        let range = self.ranges.for_tier(tier);
        let applied = range.clamp(price);
        let slot = self
            .record
            .tier_mut(tier)
            .ok_or_else(|| DashError::UnknownTier { tier: tier.to_string() })?;
        slot.annual_price = applied;

        let clamped = !range.contains(price);
        if clamped {
            log::warn!("metrics: {field} = {price} clamped to {applied}");
        }

        Ok(SetOutcome { field, requested: price, applied, clamped })
    }
}
