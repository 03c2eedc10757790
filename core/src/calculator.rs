//! Derived metrics calculator.
//!
//! Every function here is pure: same inputs, same outputs, no I/O and no
//! hidden state. The dashboard recomputes everything on each read.
//!
//! Undefined results (zero denominators, zero prices) come back as
//! `None`. NaN and infinity never leave this module.

use crate::{
    metrics::{CostLineItems, GrowthAssumptions, MetricsRecord},
    reference_data::ReferenceData,
    types::{round_half_up, Currency, Month, Percent},
};
use serde::{Deserialize, Serialize};

/// Length of the projection horizon shown on the dashboard.
pub const PROJECTION_MONTHS: Month = 12;

/// Share of users assumed to pay in the scenario tables.
pub const SCENARIO_PAID_SHARE_PCT: Percent = 10.0;

/// Horizon of the lifetime-value estimate.
pub const LTV_YEARS: u32 = 3;

/// Competitor whose user base we benchmark against.
pub const BENCHMARK_COMPETITOR: &str = "LogTen Pro";

/// Which tier's price drives break-even, scenarios and LTV.
///
/// One canonical tier per deployment. The projection series is the
/// exception: it uses the what-if panel's average price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingPolicy {
    pub reference_tier: String,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self { reference_tier: "pro".into() }
    }
}

// ── Scalar formulas ────────────────────────────────────────────────

/// Sum of the monthly cost line items. Negative items are summed as-is.
pub fn total_monthly_cost(costs: &CostLineItems) -> Currency {
    costs.items().iter().map(|(_, v)| v).sum()
}

pub fn annual_revenue(mrr: Currency) -> Currency {
    mrr * 12.0
}

const BREAK_EVEN_SNAP_EPSILON: f64 = 1e-9;

/// Paid users needed for subscription revenue to cover monthly costs:
/// `ceil(cost / price)`.
///
/// `None` means break-even is unreachable (price is zero, negative or
/// not finite). Zero or negative cost needs no users.
pub fn break_even_users(total_monthly_cost: Currency, reference_monthly_price: Currency) -> Option<u64> {
    if !(reference_monthly_price.is_finite() && reference_monthly_price > 0.0) {
        return None;
    }
    if !total_monthly_cost.is_finite() {
        return None;
    }
    if total_monthly_cost <= 0.0 {
        return Some(0);
    }
    let quotient = total_monthly_cost / reference_monthly_price;
    let nearest = quotient.round();
    // annual / 12 is inexact, so a whole quotient can land a hair above the integer.
    if nearest >= 1.0 && (quotient - nearest).abs() <= BREAK_EVEN_SNAP_EPSILON * nearest {
        return Some(nearest as u64);
    }
    Some(quotient.ceil() as u64)
}

/// `part / whole * 100`, or `None` when `whole` is zero.
pub fn share_of(part: f64, whole: f64) -> Option<Percent> {
    if whole == 0.0 || !whole.is_finite() || !part.is_finite() {
        return None;
    }
    Some(part / whole * 100.0)
}

pub fn market_penetration_pct(total_users: u64, total_addressable_market: u64) -> Option<Percent> {
    share_of(total_users as f64, total_addressable_market as f64)
}

/// Penetration formatted to four decimals, e.g. `"0.1178%"`.
pub fn market_penetration(total_users: u64, total_addressable_market: u64) -> Option<String> {
    market_penetration_pct(total_users, total_addressable_market).map(|p| format!("{p:.4}%"))
}

/// Average revenue per paying user per year, rounded. Zero when nobody pays.
pub fn arpu(arr: Currency, paid_users: u64) -> Currency {
    if paid_users == 0 {
        return 0.0;
    }
    round_half_up(arr / paid_users as f64)
}

/// How far paid users are towards break-even, capped at 100%.
pub fn break_even_progress_pct(paid_users: u64, break_even: Option<u64>) -> Option<Percent> {
    match break_even? {
        0 => Some(100.0),
        be => Some((paid_users as f64 / be as f64 * 100.0).min(100.0)),
    }
}

pub fn lifetime_value(annual_price: Currency, years: u32) -> Currency {
    annual_price * years as f64
}

pub fn net_monthly_growth_pct(growth_pct: Percent, churn_pct: Percent) -> Percent {
    growth_pct - churn_pct
}

pub fn b2b_users_per_year(schools_per_quarter: f64, students_per_school: f64) -> f64 {
    schools_per_quarter * 4.0 * students_per_school
}

pub fn avg_users_per_school(total_users: u64, active_schools: u64) -> Option<u64> {
    if active_schools == 0 {
        return None;
    }
    Some(round_half_up(total_users as f64 / active_schools as f64) as u64)
}

fn paid_share(users: f64, pct: Percent) -> u64 {
    // `as` saturates: a negative product becomes 0.
    round_half_up(users * (pct / 100.0)) as u64
}

// ── Projection ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectionInputs {
    pub start_users:         f64,
    pub conversion_rate_pct: Percent,
    pub avg_annual_price:    Currency,
    pub monthly_growth_pct:  Percent,
    pub monthly_churn_pct:   Percent,
}

impl From<&GrowthAssumptions> for ProjectionInputs {
    fn from(a: &GrowthAssumptions) -> Self {
        Self {
            start_users:         a.current_users,
            conversion_rate_pct: a.conversion_rate_pct,
            avg_annual_price:    a.avg_annual_price,
            monthly_growth_pct:  a.monthly_growth_pct,
            monthly_churn_pct:   a.monthly_churn_pct,
        }
    }
}

/// One month of the projection. Values are unrounded except `paid_users`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectionPoint {
    pub month:       Month,
    pub total_users: f64,
    pub paid_users:  u64,
    pub mrr:         Currency,
    pub arr:         Currency,
}

/// A projection point rounded for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectionRow {
    pub month:       Month,
    pub total_users: i64,
    pub paid_users:  u64,
    pub mrr:         i64,
    pub arr:         i64,
}

impl ProjectionPoint {
    pub fn display(&self) -> ProjectionRow {
        ProjectionRow {
            month:       self.month,
            total_users: round_half_up(self.total_users) as i64,
            paid_users:  self.paid_users,
            mrr:         round_half_up(self.mrr) as i64,
            arr:         round_half_up(self.arr) as i64,
        }
    }
}

/// Month-by-month compounding of growth and churn.
///
/// Produces exactly `months + 1` points. Rounding happens only when
/// deriving paid users; the running user count keeps its fractional part.
pub fn projection_series(inputs: &ProjectionInputs, months: Month) -> Vec<ProjectionPoint> {
    let mut points = Vec::new();
    let mut users = inputs.start_users;

    for month in 0..=months {
        let paid_users = paid_share(users, inputs.conversion_rate_pct);
        let mrr = paid_users as f64 * (inputs.avg_annual_price / 12.0);
        let arr = mrr * 12.0;

        points.push(ProjectionPoint { month, total_users: users, paid_users, mrr, arr });

        let gained = users * (inputs.monthly_growth_pct / 100.0);
        let churned = users * (inputs.monthly_churn_pct / 100.0);
        users = users + gained - churned;
    }

    points
}

/// Every third month plus the final month, as the projection table shows.
pub fn quarterly_view(series: &[ProjectionPoint]) -> Vec<ProjectionPoint> {
    let last = series.len().saturating_sub(1);
    series
        .iter()
        .enumerate()
        .filter(|(i, _)| i % 3 == 0 || *i == last)
        .map(|(_, p)| *p)
        .collect()
}

// ── Scenarios ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenueScenario {
    pub label:            String,
    pub users:            u64,
    pub paid_users:       u64,
    pub arr:              Currency,
    /// Share of certificated pilots. `None` if that figure is zero.
    pub market_share_pct: Option<Percent>,
}

/// Fixed school milestones (150 students each) used by the scenario table.
const SCHOOL_MILESTONES: [(&str, u64); 4] = [
    ("10 Schools", 1_500),
    ("25 Schools", 3_750),
    ("50 Schools", 7_500),
    ("100 Schools", 15_000),
];

const MARKET_SHARE_MILESTONES: [(&str, f64); 2] = [("0.5% Market", 0.005), ("1% Market", 0.01)];

pub fn revenue_scenarios(
    current_users: u64,
    certificated_pilots: u64,
    annual_price: Currency,
) -> Vec<RevenueScenario> {
    let mut rows: Vec<(String, u64)> = vec![("Current".into(), current_users)];
    rows.extend(SCHOOL_MILESTONES.iter().map(|(l, u)| (l.to_string(), *u)));
    rows.extend(
        MARKET_SHARE_MILESTONES
            .iter()
            .map(|(l, share)| (l.to_string(), round_half_up(certificated_pilots as f64 * share) as u64)),
    );

    rows.into_iter()
        .map(|(label, users)| {
            let paid_users = paid_share(users as f64, SCENARIO_PAID_SHARE_PCT);
            RevenueScenario {
                label,
                users,
                paid_users,
                arr: paid_users as f64 * annual_price,
                market_share_pct: share_of(users as f64, certificated_pilots as f64),
            }
        })
        .collect()
}

// ── Derived record ─────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedRecord {
    // Costs & revenue
    pub total_monthly_cost:     Currency,
    pub annual_revenue:         Currency,
    pub arpu:                   Currency,
    // Break-even
    pub reference_tier:          String,
    pub reference_annual_price:  Option<Currency>,
    pub break_even_users:        Option<u64>,
    pub break_even_progress_pct: Option<Percent>,
    pub lifetime_value:          Option<Currency>,
    // Market
    pub market_penetration:      Option<String>,
    pub share_of_benchmark_pct:  Option<Percent>,
    pub users_to_one_pct_market: u64,
    pub arr_at_one_pct_market:   Option<Currency>,
    // B2B
    pub avg_users_per_school: Option<u64>,
    pub b2b_users_per_year:   f64,
    // What-if panel
    pub net_monthly_growth_pct: Percent,
    pub assumed_paid_users:     u64,
    pub assumed_mrr:            Currency,
    pub projection:             Vec<ProjectionPoint>,
    pub revenue_scenarios:      Vec<RevenueScenario>,
}

impl DerivedRecord {
    pub fn compute(metrics: &MetricsRecord, reference: &ReferenceData, policy: &PricingPolicy) -> Self {
        let pilots = &reference.market.pilots;
        let counters = &metrics.counters;
        let assumptions = &metrics.assumptions;

        let total_cost = total_monthly_cost(&metrics.costs);
        let arr = annual_revenue(metrics.mrr);

        let reference_annual_price = metrics
            .tier(&policy.reference_tier)
            .map(|t| t.annual_price);
        if reference_annual_price.is_none() {
            log::warn!(
                "calculator: reference tier '{}' not in price list; break-even undefined",
                policy.reference_tier
            );
        }
        let break_even = reference_annual_price.and_then(|p| break_even_users(total_cost, p / 12.0));

        let benchmark_users = reference
            .competitor(BENCHMARK_COMPETITOR)
            .and_then(|c| c.user_count.as_ref())
            .and_then(|u| u.as_count());

        let users_to_one_pct = round_half_up(pilots.certificated as f64 * 0.01) as u64;
        let arr_at_one_pct = reference_annual_price
            .map(|p| paid_share(users_to_one_pct as f64, SCENARIO_PAID_SHARE_PCT) as f64 * p);

        let assumed_paid = paid_share(assumptions.current_users, assumptions.conversion_rate_pct);

        Self {
            total_monthly_cost:      total_cost,
            annual_revenue:          arr,
            arpu:                    arpu(arr, counters.paid_users),
            reference_tier:          policy.reference_tier.clone(),
            reference_annual_price,
            break_even_users:        break_even,
            break_even_progress_pct: break_even_progress_pct(counters.paid_users, break_even),
            lifetime_value:          reference_annual_price.map(|p| lifetime_value(p, LTV_YEARS)),
            market_penetration:      market_penetration(counters.total_users, pilots.total_addressable()),
            share_of_benchmark_pct:  benchmark_users
                .and_then(|b| share_of(counters.total_users as f64, b as f64)),
            users_to_one_pct_market: users_to_one_pct,
            arr_at_one_pct_market:   arr_at_one_pct,
            avg_users_per_school:    avg_users_per_school(counters.total_users, counters.active_schools),
            b2b_users_per_year:      b2b_users_per_year(
                assumptions.schools_per_quarter,
                assumptions.students_per_school,
            ),
            net_monthly_growth_pct:  net_monthly_growth_pct(
                assumptions.monthly_growth_pct,
                assumptions.monthly_churn_pct,
            ),
            assumed_paid_users:      assumed_paid,
            assumed_mrr:             assumed_paid as f64 * assumptions.avg_annual_price / 12.0,
            projection:              projection_series(&ProjectionInputs::from(assumptions), PROJECTION_MONTHS),
            revenue_scenarios:       revenue_scenarios(
                counters.total_users,
                pilots.certificated,
                reference_annual_price.unwrap_or(0.0),
            ),
        }
    }

    pub fn final_projection(&self) -> Option<&ProjectionPoint> {
        self.projection.last()
    }
}
