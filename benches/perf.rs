use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use komekaigi_site::modal::{ClickTarget, ModalController, UiEvent};
use komekaigi_site::page::Page;
use komekaigi_site::render::{logo_wrapper_id, render_sponsor_sections};
use komekaigi_site::sponsors::{ValidityRule, categorize, parse_sponsor_plans_json};

fn sample_api_json(per_plan: usize) -> String {
    let plans = [("ゴールドスポンサー", "gold"), ("シルバースポンサー", "silver"), ("会場提供", "venue")]
        .iter()
        .enumerate()
        .map(|(plan_idx, (name, name_en))| {
            let sponsors = (0..per_plan)
                .map(|idx| {
                    serde_json::json!({
                        "id": format!("{plan_idx}-{idx}"),
                        "name": format!("Sponsor {plan_idx}-{idx}"),
                        "avatar": format!("https://example.com/logo/{plan_idx}/{idx}.png"),
                        "pr": "We cook the best rice in the whole prefecture, every single day.",
                        "url": "https://example.com",
                        "twitter": "@komekaigi",
                    })
                })
                .collect::<Vec<_>>();
            serde_json::json!({ "name": name, "name_en": name_en, "sponsors": sponsors })
        })
        .collect::<Vec<_>>();
    serde_json::json!({ "sponsor_plans": plans }).to_string()
}

const TEMPLATE: &str = r#"<html><body class="bg-white">
<section id="sponsors"><div id="sponsors-content"></div></section>
<div id="sponsorModal" class="sponsor-modal"><div id="sponsorModalContent">
<button id="modalCloseButton">x</button><div id="modalLogo"></div><div id="modalInfo"></div>
</div></div>
</body></html>"#;

fn bench_parse_and_categorize(c: &mut Criterion) {
    let raw = sample_api_json(20);
    c.bench_function("parse_and_categorize", |b| {
        b.iter(|| {
            let plans = parse_sponsor_plans_json("bench", black_box(&raw)).unwrap();
            let result = categorize(&plans, ValidityRule::default());
            black_box(result.bucket.len());
        })
    });
}

fn bench_render_sections(c: &mut Criterion) {
    let plans = parse_sponsor_plans_json("bench", &sample_api_json(20)).unwrap();
    let result = categorize(&plans, ValidityRule::default());
    c.bench_function("render_sponsor_sections", |b| {
        b.iter(|| {
            let html = render_sponsor_sections(black_box(&result.bucket)).unwrap();
            black_box(html.len());
        })
    });
}

fn bench_delegated_open(c: &mut Criterion) {
    let plans = parse_sponsor_plans_json("bench", &sample_api_json(20)).unwrap();
    let result = categorize(&plans, ValidityRule::default());
    let mut page = Page::parse(TEMPLATE);
    page.set_inner_html("sponsors-content", &render_sponsor_sections(&result.bucket).unwrap());
    let wrapper = logo_wrapper_id("2-19");

    c.bench_function("delegated_open_close", |b| {
        b.iter(|| {
            let mut page = page.clone();
            let mut modal = ModalController::new(result.directory.clone());
            let target = ClickTarget::resolve(&page, black_box(&wrapper));
            modal.handle_event(&mut page, &UiEvent::Click(target));
            modal.handle_event(&mut page, &UiEvent::KeyDown("Escape".to_string()));
            black_box(modal.is_open());
        })
    });
}

criterion_group!(
    perf,
    bench_parse_and_categorize,
    bench_render_sections,
    bench_delegated_open
);
criterion_main!(perf);
