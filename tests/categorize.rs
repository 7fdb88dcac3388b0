mod common;

use komekaigi_site::render::render_sponsor_sections;
use komekaigi_site::sponsors::{
    SponsorCategory, SponsorPlan, ValidityRule, categorize, parse_sponsor_plans_json,
};

use common::read_fixture;

fn fixture_plans() -> Vec<SponsorPlan> {
    parse_sponsor_plans_json("fixture", &read_fixture("sponsors.json")).expect("fixture should parse")
}

#[test]
fn fixture_is_bucketed_in_api_order() {
    let result = categorize(&fixture_plans(), ValidityRule::default());

    let gold: Vec<&str> = result
        .bucket
        .get(SponsorCategory::Gold)
        .iter()
        .map(|r| r.name.as_str())
        .collect();
    let silver: Vec<&str> = result
        .bucket
        .get(SponsorCategory::Silver)
        .iter()
        .map(|r| r.name.as_str())
        .collect();
    let venue: Vec<&str> = result
        .bucket
        .get(SponsorCategory::Venue)
        .iter()
        .map(|r| r.name.as_str())
        .collect();

    assert_eq!(gold, vec!["Acme"]);
    assert_eq!(silver, vec!["Beta", "Gamma"]);
    assert_eq!(venue, vec!["Hall & Co"]);
    assert_eq!(result.bucket.len(), 4);
}

#[test]
fn sponsors_without_logo_never_reach_output_or_lookup() {
    let result = categorize(&fixture_plans(), ValidityRule::default());
    assert!(result.directory.find("102").is_none());
    assert!(
        result
            .directory
            .records()
            .iter()
            .all(|r| !r.logo_url.is_empty())
    );
    let html = render_sponsor_sections(&result.bucket).expect("non-empty bucket renders");
    assert!(!html.contains("No Logo Inc"));
}

#[test]
fn unrecognized_plans_are_dropped_entirely() {
    let result = categorize(&fixture_plans(), ValidityRule::default());
    assert!(result.directory.find("301").is_none());
    assert!(
        result
            .directory
            .records()
            .iter()
            .all(|r| r.name != "Delta")
    );
}

#[test]
fn missing_ids_are_synthesized_and_unique() {
    let result = categorize(&fixture_plans(), ValidityRule::default());
    let ids: Vec<&str> = result.directory.records().iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["101", "201", "silver-2", "401"]);
    let gamma = result.directory.find("silver-2").expect("synthesized id resolves");
    assert_eq!(gamma.name, "Gamma");
    assert_eq!(gamma.category, SponsorCategory::Silver);
}

#[test]
fn strict_rule_also_requires_promotional_text() {
    let result = categorize(&fixture_plans(), ValidityRule::strict(20));
    let names: Vec<&str> = result.directory.records().iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["Acme"]);
    assert!(result.bucket.get(SponsorCategory::Silver).is_empty());
    assert!(result.bucket.get(SponsorCategory::Venue).is_empty());
}

#[test]
fn japanese_gold_label_yields_one_gold_card() {
    let raw = r#"{"sponsor_plans":[{"name":"ゴールドスポンサー","sponsors":[{"name":"Acme","avatar":"a.png"}]}]}"#;
    let plans = parse_sponsor_plans_json("api", raw).expect("valid json");
    let result = categorize(&plans, ValidityRule::default());

    assert_eq!(result.bucket.get(SponsorCategory::Gold).len(), 1);
    let html = render_sponsor_sections(&result.bucket).expect("gold section renders");
    assert_eq!(html.matches(r#"class="sponsor-card sponsor-card-gold""#).count(), 1);
    assert_eq!(html.matches("class=\"sponsor-card ").count(), 1);
    assert!(html.contains(r#"alt="Acme""#));
    assert!(html.contains("sponsor-section-gold"));
    assert!(!html.contains("sponsor-section-silver"));
}

#[test]
fn sections_follow_display_order() {
    let result = categorize(&fixture_plans(), ValidityRule::default());
    let html = render_sponsor_sections(&result.bucket).expect("renders");
    let gold = html.find("sponsor-section-gold").expect("gold present");
    let silver = html.find("sponsor-section-silver").expect("silver present");
    let venue = html.find("sponsor-section-venue").expect("venue present");
    assert!(gold < silver && silver < venue);
}

#[test]
fn empty_bucket_renders_nothing() {
    let raw = r#"{"sponsor_plans":[{"name_en":"gold","sponsors":[{"name":"NoLogo"}]},{"name_en":"bronze","sponsors":[{"name":"B","avatar":"b.png"}]}]}"#;
    let plans = parse_sponsor_plans_json("api", raw).expect("valid json");
    let result = categorize(&plans, ValidityRule::default());
    assert!(result.bucket.is_empty());
    assert!(result.directory.is_empty());
    assert!(render_sponsor_sections(&result.bucket).is_none());
}

#[test]
fn missing_sponsor_plans_field_is_malformed() {
    assert!(parse_sponsor_plans_json("api", r#"{"plans":[]}"#).is_err());
    assert!(parse_sponsor_plans_json("api", "null").is_err());
    assert!(parse_sponsor_plans_json("api", "").is_err());
}
