use std::collections::HashSet;

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::debug;

use crate::error::FetchError;
use crate::fetch::parse_json_body;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SponsorCategory {
    Gold,
    Silver,
    Venue,
}

impl SponsorCategory {
    pub const DISPLAY_ORDER: [SponsorCategory; 3] = [Self::Gold, Self::Silver, Self::Venue];

    pub fn key(self) -> &'static str {
        match self {
            Self::Gold => "gold",
            Self::Silver => "silver",
            Self::Venue => "venue",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Gold => "GOLD",
            Self::Silver => "SILVER",
            Self::Venue => "VENUE",
        }
    }

    pub fn label_jp(self) -> &'static str {
        match self {
            Self::Gold => "ゴールドスポンサー",
            Self::Silver => "シルバースポンサー",
            Self::Venue => "会場提供",
        }
    }

    fn tokens(self) -> &'static [&'static str] {
        match self {
            Self::Gold => &["gold", "ゴールド"],
            Self::Silver => &["silver", "シルバー"],
            Self::Venue => &["venue", "会場"],
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::DISPLAY_ORDER
            .into_iter()
            .find(|category| category.key().eq_ignore_ascii_case(key.trim()))
    }

    fn index(self) -> usize {
        match self {
            Self::Gold => 0,
            Self::Silver => 1,
            Self::Venue => 2,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SponsorPlansResponse {
    pub sponsor_plans: Vec<SponsorPlan>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SponsorPlan {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub name_en: Option<String>,
    #[serde(default)]
    pub sponsors: Vec<RawSponsor>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSponsor {
    #[serde(default, deserialize_with = "deserialize_id")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub pr: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub twitter: Option<String>,
}

fn deserialize_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => non_blank(Some(s)),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SponsorRecord {
    pub id: String,
    pub name: String,
    pub logo_url: String,
    pub promotional_text: Option<String>,
    pub external_url: Option<String>,
    pub social_handle: Option<String>,
    pub category: SponsorCategory,
}

/// Records that pass the logo check always; with `min_pr_length` set they
/// also need at least that many characters of promotional text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidityRule {
    pub min_pr_length: Option<usize>,
}

impl ValidityRule {
    pub fn strict(min_pr_length: usize) -> Self {
        Self {
            min_pr_length: Some(min_pr_length),
        }
    }

    pub fn accepts(&self, sponsor: &RawSponsor) -> bool {
        if sponsor.avatar.as_deref().is_none_or(|a| a.trim().is_empty()) {
            return false;
        }
        match self.min_pr_length {
            Some(min) => sponsor
                .pr
                .as_deref()
                .is_some_and(|pr| pr.trim().chars().count() >= min),
            None => true,
        }
    }
}

/// Sponsors grouped by category, each list in API order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryBucket {
    lists: [Vec<SponsorRecord>; 3],
}

impl CategoryBucket {
    pub fn get(&self, category: SponsorCategory) -> &[SponsorRecord] {
        &self.lists[category.index()]
    }

    pub fn push(&mut self, record: SponsorRecord) {
        self.lists[record.category.index()].push(record);
    }

    pub fn is_empty(&self) -> bool {
        self.lists.iter().all(Vec::is_empty)
    }

    pub fn len(&self) -> usize {
        self.lists.iter().map(Vec::len).sum()
    }

    /// Non-empty categories in display order.
    pub fn sections(&self) -> impl Iterator<Item = (SponsorCategory, &[SponsorRecord])> {
        SponsorCategory::DISPLAY_ORDER
            .into_iter()
            .map(|category| (category, self.get(category)))
            .filter(|(_, records)| !records.is_empty())
    }
}

/// Flat id lookup over every rendered sponsor. Replaced as a whole on each
/// successful fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SponsorDirectory {
    records: Vec<SponsorRecord>,
}

impl SponsorDirectory {
    pub fn new(records: Vec<SponsorRecord>) -> Self {
        Self { records }
    }

    pub fn find(&self, id: &str) -> Option<&SponsorRecord> {
        self.records.iter().find(|record| record.id == id)
    }

    pub fn replace(&mut self, other: SponsorDirectory) {
        *self = other;
    }

    pub fn records(&self) -> &[SponsorRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Categorized {
    pub bucket: CategoryBucket,
    pub directory: SponsorDirectory,
}

/// Matches the plan label against the known category tokens. `name_en` wins
/// over the display name when both are present and recognized.
pub fn classify_plan_label(plan: &SponsorPlan) -> Option<SponsorCategory> {
    [plan.name_en.as_deref(), plan.name.as_deref()]
        .into_iter()
        .flatten()
        .find_map(classify_label)
}

pub fn classify_label(label: &str) -> Option<SponsorCategory> {
    let lowered = label.trim().to_lowercase();
    if lowered.is_empty() {
        return None;
    }
    SponsorCategory::DISPLAY_ORDER
        .into_iter()
        .find(|category| category.tokens().iter().any(|token| lowered.contains(token)))
}

pub fn categorize(plans: &[SponsorPlan], rule: ValidityRule) -> Categorized {
    let mut bucket = CategoryBucket::default();
    let mut records = Vec::new();
    // Ids the API sent are reserved up front so a synthesized id never shadows one.
    let mut taken: HashSet<String> = plans
        .iter()
        .flat_map(|plan| &plan.sponsors)
        .filter_map(|sponsor| sponsor.id.clone())
        .collect();

    for plan in plans {
        let Some(category) = classify_plan_label(plan) else {
            // Unrecognized plans are dropped as a whole.
            debug!(
                name = plan.name.as_deref().unwrap_or_default(),
                name_en = plan.name_en.as_deref().unwrap_or_default(),
                sponsors = plan.sponsors.len(),
                "dropping sponsor plan with unrecognized label"
            );
            continue;
        };

        for sponsor in &plan.sponsors {
            if !rule.accepts(sponsor) {
                debug!(
                    name = sponsor.name.as_deref().unwrap_or_default(),
                    category = category.key(),
                    "skipping sponsor without required fields"
                );
                continue;
            }
            let id = match &sponsor.id {
                Some(id) => id.clone(),
                None => synthesize_id(category, records.len(), &mut taken),
            };
            let record = build_record(sponsor, category, id);
            bucket.push(record.clone());
            records.push(record);
        }
    }

    Categorized {
        bucket,
        directory: SponsorDirectory::new(records),
    }
}

/// `{category}-{position}`, suffixed with a counter while that id is already in use.
fn synthesize_id(category: SponsorCategory, position: usize, taken: &mut HashSet<String>) -> String {
    let base = format!("{}-{position}", category.key());
    let mut id = base.clone();
    let mut n = 2;
    while taken.contains(&id) {
        id = format!("{base}-{n}");
        n += 1;
    }
    taken.insert(id.clone());
    id
}

fn build_record(sponsor: &RawSponsor, category: SponsorCategory, id: String) -> SponsorRecord {
    SponsorRecord {
        id,
        name: sponsor.name.clone().unwrap_or_default().trim().to_string(),
        logo_url: sponsor.avatar.clone().unwrap_or_default().trim().to_string(),
        promotional_text: non_blank(sponsor.pr.clone()),
        external_url: non_blank(sponsor.url.clone()),
        social_handle: non_blank(sponsor.twitter.clone()),
        category,
    }
}

/// Parses the sponsor API body. A body without `sponsor_plans` is malformed.
pub fn parse_sponsor_plans_json(location: &str, raw: &str) -> Result<Vec<SponsorPlan>, FetchError> {
    parse_json_body::<SponsorPlansResponse>(location, raw).map(|resp| resp.sponsor_plans)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(name_en: Option<&str>, name: Option<&str>) -> SponsorPlan {
        SponsorPlan {
            name: name.map(str::to_string),
            name_en: name_en.map(str::to_string),
            sponsors: Vec::new(),
        }
    }

    #[test]
    fn labels_match_by_case_insensitive_substring() {
        assert_eq!(classify_label("GOLD"), Some(SponsorCategory::Gold));
        assert_eq!(classify_label("Silver Sponsor"), Some(SponsorCategory::Silver));
        assert_eq!(classify_label("会場提供"), Some(SponsorCategory::Venue));
        assert_eq!(classify_label("ゴールドスポンサー"), Some(SponsorCategory::Gold));
        assert_eq!(classify_label("bronze"), None);
        assert_eq!(classify_label("  "), None);
    }

    #[test]
    fn name_en_is_preferred_over_display_name() {
        let p = plan(Some("venue"), Some("ゴールド"));
        assert_eq!(classify_plan_label(&p), Some(SponsorCategory::Venue));
        let p = plan(Some("platinum"), Some("シルバー"));
        assert_eq!(classify_plan_label(&p), Some(SponsorCategory::Silver));
        assert_eq!(classify_plan_label(&plan(None, None)), None);
    }

    #[test]
    fn strict_rule_counts_characters_not_bytes() {
        let sponsor = RawSponsor {
            avatar: Some("a.png".to_string()),
            pr: Some("あいうえお".to_string()),
            ..RawSponsor::default()
        };
        assert!(ValidityRule::strict(5).accepts(&sponsor));
        assert!(!ValidityRule::strict(6).accepts(&sponsor));
        assert!(ValidityRule::default().accepts(&sponsor));
    }

    #[test]
    fn blank_avatar_is_rejected() {
        let sponsor = RawSponsor {
            avatar: Some("   ".to_string()),
            ..RawSponsor::default()
        };
        assert!(!ValidityRule::default().accepts(&sponsor));
    }

    #[test]
    fn numeric_ids_are_stringified() {
        let raw = r#"{"sponsor_plans":[{"name_en":"gold","sponsors":[{"id":42,"name":"A","avatar":"a.png"}]}]}"#;
        let plans = parse_sponsor_plans_json("api", raw).expect("valid json");
        assert_eq!(plans[0].sponsors[0].id.as_deref(), Some("42"));
    }

    #[test]
    fn synthesized_ids_never_collide_with_api_ids() {
        let raw = r#"{"sponsor_plans":[{"name_en":"gold","sponsors":[
            {"name":"A","avatar":"a.png"},
            {"id":"gold-0","name":"B","avatar":"b.png"},
            {"id":"gold-2","name":"C","avatar":"c.png"},
            {"name":"D","avatar":"d.png"}
        ]}]}"#;
        let plans = parse_sponsor_plans_json("api", raw).expect("valid json");
        let result = categorize(&plans, ValidityRule::default());

        let ids: Vec<&str> = result.directory.records().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["gold-0-2", "gold-0", "gold-2", "gold-3"]);
        assert_eq!(result.directory.find("gold-0").map(|r| r.name.as_str()), Some("B"));
        assert_eq!(result.directory.find("gold-0-2").map(|r| r.name.as_str()), Some("A"));
    }

    #[test]
    fn category_keys_round_trip() {
        for category in SponsorCategory::DISPLAY_ORDER {
            assert_eq!(SponsorCategory::from_key(category.key()), Some(category));
        }
        assert_eq!(SponsorCategory::from_key("bronze"), None);
    }
}
