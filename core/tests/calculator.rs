use founder_dash_core::{
    calculator::{
        annual_revenue, arpu, break_even_progress_pct, break_even_users, market_penetration,
        projection_series, quarterly_view, revenue_scenarios, total_monthly_cost, DerivedRecord,
        PricingPolicy, ProjectionInputs, PROJECTION_MONTHS,
    },
    metrics::{CostLineItems, MetricsRecord},
    reference_data::ReferenceData,
};

// ── Helpers ──────────────────────────────────────────────────────────────────

fn costs(infrastructure: f64, hosting: f64, ai_processing: f64, other: f64) -> CostLineItems {
    CostLineItems { infrastructure, hosting, ai_processing, other }
}

fn worked_example() -> ProjectionInputs {
    ProjectionInputs {
        start_users:         1000.0,
        conversion_rate_pct: 10.0,
        avg_annual_price:    75.0,
        monthly_growth_pct:  15.0,
        monthly_churn_pct:   5.0,
    }
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6
}

// ── Scalar formulas ──────────────────────────────────────────────────────────

/// Total cost is the plain sum, regardless of which slot holds which amount.
#[test]
fn total_monthly_cost_is_order_independent_sum() {
    let a = total_monthly_cost(&costs(25.0, 20.0, 500.0, 100.0));
    let b = total_monthly_cost(&costs(500.0, 100.0, 25.0, 20.0));
    assert_eq!(a, 645.0);
    assert_eq!(a, b);
}

/// Negative line items are not rejected by the calculator.
#[test]
fn total_monthly_cost_sums_negative_items_as_is() {
    assert_eq!(total_monthly_cost(&costs(-10.0, 0.0, 0.0, 25.0)), 15.0);
}

#[test]
fn annual_revenue_is_twelve_times_mrr_and_monotonic() {
    let mut previous = annual_revenue(0.0);
    assert_eq!(previous, 0.0);
    for mrr in [1.0, 625.0, 687.5, 50_000.0] {
        let arr = annual_revenue(mrr);
        assert_eq!(arr, mrr * 12.0);
        assert!(arr >= previous, "ARR must not decrease as MRR grows");
        previous = arr;
    }
}

/// The seed dashboard: $645/mo of costs against the $99/yr pro tier.
#[test]
fn break_even_for_seed_costs_is_79_paid_users() {
    assert_eq!(break_even_users(645.0, 99.0 / 12.0), Some(79));
}

/// Ceiling property: enough users to cover cost, and one fewer is not enough.
#[test]
fn break_even_satisfies_ceiling_property() {
    for cost in [0.5, 1.0, 45.0, 645.0, 1000.0, 2913.37] {
        for annual in [1.0, 12.0, 49.0, 75.0, 99.0, 199.0] {
            let monthly = annual / 12.0;
            let users = break_even_users(cost, monthly).expect("price > 0 must give a value");
            assert!(
                users as f64 * monthly >= cost * (1.0 - 1e-12),
                "{users} users at ${annual}/yr do not cover ${cost}"
            );
            assert!(
                (users as f64 - 1.0) * monthly < cost,
                "{users} users at ${annual}/yr is more than the minimum for ${cost}"
            );
        }
    }
}

/// Whole-dollar tiers against whole-dollar costs, checked in exact integer
/// arithmetic: `users * annual >= 12 * cost` and `(users - 1) * annual < 12 * cost`.
#[test]
fn break_even_is_exact_for_whole_dollar_inputs() {
    for annual in 1u64..=200 {
        for cost in (1u64..=3300).step_by(7) {
            let users = break_even_users(cost as f64, annual as f64 / 12.0).unwrap();
            assert!(users * annual >= 12 * cost, "{users} users at ${annual}/yr short of ${cost}");
            assert!(
                (users - 1) * annual < 12 * cost,
                "{users} users at ${annual}/yr overshoots ${cost}"
            );
        }
    }
}

/// $65/mo at $13/yr is exactly 60 users, even though 13 / 12 is inexact.
#[test]
fn break_even_does_not_overshoot_on_whole_quotients() {
    assert_eq!(break_even_users(65.0, 13.0 / 12.0), Some(60));
    assert_eq!(break_even_users(645.0, 129.0 / 12.0), Some(60));
}

/// A zero price makes break-even unreachable. That is a sentinel, not a panic or infinity.
#[test]
fn break_even_with_zero_price_is_sentinel() {
    assert_eq!(break_even_users(645.0, 0.0), None);
    assert_eq!(break_even_users(645.0, -8.25), None);
    assert_eq!(break_even_users(645.0, f64::NAN), None);
    assert_eq!(break_even_users(0.0, 8.25), Some(0));
}

#[test]
fn market_penetration_formats_four_decimals() {
    assert_eq!(market_penetration(1000, 848_770).as_deref(), Some("0.1178%"));
    assert_eq!(market_penetration(0, 848_770).as_deref(), Some("0.0000%"));
}

#[test]
fn market_penetration_with_zero_market_is_sentinel() {
    assert_eq!(market_penetration(1000, 0), None);
}

#[test]
fn arpu_and_progress_guard_zero_denominators() {
    assert_eq!(arpu(7500.0, 0), 0.0);
    assert_eq!(arpu(7500.0, 100), 75.0);

    assert_eq!(break_even_progress_pct(10, None), None);
    assert_eq!(break_even_progress_pct(10, Some(0)), Some(100.0));
    assert_eq!(break_even_progress_pct(200, Some(79)), Some(100.0));
    let half = break_even_progress_pct(40, Some(80)).unwrap();
    assert!(approx(half, 50.0), "expected 50%, got {half}");
}

// ── Projection ───────────────────────────────────────────────────────────────

#[test]
fn projection_has_months_plus_one_points() {
    let series = projection_series(&worked_example(), PROJECTION_MONTHS);
    assert_eq!(series.len(), 13);
    assert_eq!(series.first().unwrap().month, 0);
    assert_eq!(series.last().unwrap().month, 12);

    assert_eq!(projection_series(&worked_example(), 0).len(), 1);
    assert_eq!(projection_series(&worked_example(), 120).len(), 121);
}

#[test]
fn projection_month_zero_uses_start_users_exactly() {
    let mut inputs = worked_example();
    inputs.start_users = 1234.5;
    let series = projection_series(&inputs, 12);
    assert_eq!(series[0].total_users, 1234.5);
}

/// 1000 users, 10% conversion, $75/yr, +15% growth, -5% churn.
#[test]
fn projection_matches_worked_example() {
    let series = projection_series(&worked_example(), 12);

    let m0 = series[0];
    assert_eq!(m0.paid_users, 100);
    assert!(approx(m0.mrr, 625.0));
    assert!(approx(m0.arr, 7500.0));

    let m1 = series[1];
    assert!(approx(m1.total_users, 1100.0), "month 1 users = {}", m1.total_users);
    assert_eq!(m1.paid_users, 110);
    assert!(approx(m1.mrr, 687.5));
    assert!(approx(m1.arr, 8250.0));

    let row = m1.display();
    assert_eq!(row.mrr, 688, "display rounds half up");
    assert_eq!(row.arr, 8250);
}

/// The running user count is not rounded between months.
#[test]
fn projection_carries_fractional_users_forward() {
    let series = projection_series(&worked_example(), 12);
    assert!(approx(series[4].total_users, 1464.1), "month 4 = {}", series[4].total_users);
    assert_eq!(series[12].paid_users, 314);
    assert_eq!(series[12].display().total_users, 3138);
    assert_eq!(series[12].display().arr, 23550);
}

#[test]
fn projection_is_flat_when_growth_equals_churn_at_zero() {
    let inputs = ProjectionInputs {
        monthly_growth_pct: 0.0,
        monthly_churn_pct: 0.0,
        ..worked_example()
    };
    let series = projection_series(&inputs, 12);
    for p in &series {
        assert!(approx(p.total_users, 1000.0));
        assert_eq!(p.paid_users, series[0].paid_users);
        assert_eq!(p.mrr, series[0].mrr);
        assert_eq!(p.arr, series[0].arr);
    }
}

/// Same inputs, same outputs, with nothing carried between calls.
#[test]
fn projection_is_restartable() {
    let a = projection_series(&worked_example(), 12);
    let b = projection_series(&worked_example(), 12);
    assert_eq!(a, b);
}

#[test]
fn quarterly_view_keeps_every_third_month_and_the_last() {
    let months: Vec<u32> = quarterly_view(&projection_series(&worked_example(), 12))
        .iter()
        .map(|p| p.month)
        .collect();
    assert_eq!(months, vec![0, 3, 6, 9, 12]);

    let months: Vec<u32> = quarterly_view(&projection_series(&worked_example(), 10))
        .iter()
        .map(|p| p.month)
        .collect();
    assert_eq!(months, vec![0, 3, 6, 9, 10]);
}

// ── Scenarios & derived record ───────────────────────────────────────────────

#[test]
fn revenue_scenarios_use_ten_percent_paid_at_reference_price() {
    let rows = revenue_scenarios(1000, 503_275, 99.0);
    let labels: Vec<&str> = rows.iter().map(|r| r.label.as_str()).collect();
    assert_eq!(
        labels,
        vec!["Current", "10 Schools", "25 Schools", "50 Schools", "100 Schools", "0.5% Market", "1% Market"]
    );

    assert_eq!(rows[0].paid_users, 100);
    assert_eq!(rows[0].arr, 9900.0);

    let one_pct = &rows[6];
    assert_eq!(one_pct.users, 5033);
    assert_eq!(one_pct.paid_users, 503);
    assert_eq!(one_pct.arr, 503.0 * 99.0);

    let half_pct = &rows[5];
    assert_eq!(half_pct.users, 2516);
    assert_eq!(half_pct.paid_users, 252);
}

#[test]
fn revenue_scenarios_without_certificated_pilots_have_no_share() {
    let rows = revenue_scenarios(1000, 0, 99.0);
    assert!(rows.iter().all(|r| r.market_share_pct.is_none()));
}

#[test]
fn derived_record_from_seed_values() {
    let metrics = MetricsRecord::builtin_seed().unwrap();
    let reference = ReferenceData::builtin().unwrap();
    let d = DerivedRecord::compute(&metrics, &reference, &PricingPolicy::default());

    assert_eq!(d.total_monthly_cost, 645.0);
    assert_eq!(d.annual_revenue, 0.0);
    assert_eq!(d.arpu, 0.0);
    assert_eq!(d.reference_annual_price, Some(99.0));
    assert_eq!(d.break_even_users, Some(79));
    assert_eq!(d.break_even_progress_pct, Some(0.0));
    assert_eq!(d.lifetime_value, Some(297.0));
    assert_eq!(d.market_penetration.as_deref(), Some("0.1178%"));
    assert_eq!(d.users_to_one_pct_market, 5033);
    assert_eq!(d.avg_users_per_school, Some(333));
    assert_eq!(d.b2b_users_per_year, 2000.0);
    assert_eq!(d.net_monthly_growth_pct, 10.0);
    assert_eq!(d.assumed_paid_users, 100);
    assert!(approx(d.assumed_mrr, 625.0));
    assert_eq!(d.projection.len(), 13);
    assert_eq!(d.revenue_scenarios.len(), 7);

    let share = d.share_of_benchmark_pct.unwrap();
    assert!((share - 0.8333).abs() < 1e-3, "share vs benchmark = {share}");
}

/// A policy naming a tier that does not exist leaves break-even undefined.
#[test]
fn derived_record_with_unknown_reference_tier_is_undefined() {
    let metrics = MetricsRecord::builtin_seed().unwrap();
    let reference = ReferenceData::builtin().unwrap();
    let policy = PricingPolicy { reference_tier: "platinum".into() };
    let d = DerivedRecord::compute(&metrics, &reference, &policy);

    assert_eq!(d.reference_annual_price, None);
    assert_eq!(d.break_even_users, None);
    assert_eq!(d.break_even_progress_pct, None);
    assert_eq!(d.arr_at_one_pct_market, None);
}

/// The free tier has a zero price, so using it as the reference gives the sentinel.
#[test]
fn derived_record_with_free_reference_tier_has_no_break_even() {
    let metrics = MetricsRecord::builtin_seed().unwrap();
    let reference = ReferenceData::builtin().unwrap();
    let policy = PricingPolicy { reference_tier: "free".into() };
    let d = DerivedRecord::compute(&metrics, &reference, &policy);

    assert_eq!(d.reference_annual_price, Some(0.0));
    assert_eq!(d.break_even_users, None);
}
