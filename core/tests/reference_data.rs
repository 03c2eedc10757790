use founder_dash_core::reference_data::{CompetitorPricing, ReferenceData, ThreatLevel, UserCount};

#[test]
fn builtin_tables_parse() {
    let data = ReferenceData::builtin().unwrap();
    assert_eq!(data.market.pilots.total, 848_770);
    assert_eq!(data.market.pilots.certificated, 503_275);
    assert_eq!(data.competitors.len(), 5);
    assert_eq!(data.b2b.scenarios.len(), 5);
    assert_eq!(data.market.growth_series.len(), 6);
}

/// Every figure group carries its provenance.
#[test]
fn market_figures_have_provenance() {
    let data = ReferenceData::builtin().unwrap();
    assert!(data.market.pilots.source.contains("FAA"));
    assert!(!data.market.training.source.is_empty());
    assert_eq!(data.market.training.size_in(2025), Some(11.2));
    assert_eq!(data.market.training.size_in(2019), None);
}

#[test]
fn builtin_pilot_figures_are_consistent() {
    let data = ReferenceData::builtin().unwrap();
    let issues = data.market.pilots.consistency_issues();
    assert!(issues.is_empty(), "unexpected issues: {issues:?}");
}

#[test]
fn inconsistent_pilot_figures_are_reported() {
    let mut pilots = ReferenceData::builtin().unwrap().market.pilots;
    pilots.certificated = pilots.total + 1;
    let issues = pilots.consistency_issues();
    assert_eq!(issues.len(), 1);
    assert!(issues[0].contains("certificated"));
}

#[test]
fn competitor_optional_fields_are_explicit() {
    let data = ReferenceData::builtin().unwrap();

    let foreflight = data.competitor("ForeFlight").unwrap();
    assert_eq!(foreflight.user_count, Some(UserCount::Descriptive("500K+".into())));
    assert_eq!(foreflight.exit_value.as_ref().map(|e| e.amount_billions), Some(10.55));
    assert!(foreflight.price_increase.is_some());

    let logten = data.competitor("LogTen Pro").unwrap();
    assert_eq!(logten.user_count.as_ref().and_then(|u| u.as_count()), Some(120_000));
    assert_eq!(logten.pricing.entry_price(), Some(79.99));
    assert!(logten.exit_value.is_none());

    let mfb = data.competitor("MyFlightBook").unwrap();
    assert_eq!(mfb.pricing, CompetitorPricing::Free);
    assert_eq!(mfb.pricing.entry_price(), None);

    let safelog = data.competitor("Safelog").unwrap();
    assert!(!safelog.verified);
    assert!(safelog.user_count.is_none());
}

#[test]
fn exactly_one_competitor_row_is_ours() {
    let data = ReferenceData::builtin().unwrap();
    let ours: Vec<_> = data.competitors.iter().filter(|c| c.is_self()).collect();
    assert_eq!(ours.len(), 1);
    assert_eq!(ours[0].threat, ThreatLevel::Us);
    assert!(ours[0].has_ocr && ours[0].has_b2b_model);
}

#[test]
fn unique_features_are_ours_alone() {
    let data = ReferenceData::builtin().unwrap();
    let unique = data.feature_matrix.unique_features();
    assert_eq!(unique, vec!["AI Photo OCR", "B2B Flight School Model", "Google Sheets Sync"]);
}
