use serde::Deserialize;

use crate::error::FetchError;
use crate::fetch::parse_json_body;
use crate::render::html_escape;

pub const INDIVIDUAL_SPONSORS_JSON: &str = "data/individual_sponsors.json";
pub const IMAGE_BASE_PATH: &str = "assets/images/individual_sponsors/";
pub const SECTION_ID: &str = "individual-sponsors";
pub const CONTENT_ID: &str = "individual-sponsors-content";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct IndividualSponsor {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub url: Option<String>,
}

pub fn parse_individual_sponsors_json(
    location: &str,
    raw: &str,
) -> Result<Vec<IndividualSponsor>, FetchError> {
    parse_json_body(location, raw)
}

pub fn render_individual_sponsors(sponsors: &[IndividualSponsor]) -> Option<String> {
    if sponsors.is_empty() {
        return None;
    }
    let cards = sponsors.iter().map(render_card).collect::<String>();
    Some(format!(
        r#"
<div class="text-center mb-8">
    <h4 class="text-2xl font-semibold text-primary">個人スポンサー</h4>
</div>
<div class="staff-grid">{cards}</div>
"#
    ))
}

fn render_card(sponsor: &IndividualSponsor) -> String {
    let image = html_escape(&format!("{IMAGE_BASE_PATH}{}", sponsor.image));
    let name = html_escape(&sponsor.name);
    let card = format!(
        r#"
<div class="staff-member">
    <div class="staff-avatar-wrapper">
        <img src="{image}" alt="{name}" class="staff-avatar" loading="lazy">
    </div>
    <div class="staff-name">{name}</div>
</div>"#
    );

    match sponsor.url.as_deref().map(str::trim).filter(|url| !url.is_empty()) {
        Some(url) => format!(
            r#"<a href="{}" target="_blank" rel="noopener noreferrer" class="staff-link">{card}</a>"#,
            html_escape(url)
        ),
        None => card,
    }
}
