//! Page-load path: every section fetches its data and renders into the page.
//!
//! Each loader owns its failures. Whatever happens during fetch or render, the
//! section ends up either rendered, hidden, or showing the error panel, and the
//! rest of the page is unaffected.

use tracing::{info, warn};

use crate::config::{FailureMode, SiteConfig};
use crate::fetch::{Fetcher, JsonSource, RetryPolicy, Sleeper};
use crate::individual_sponsors::{self, parse_individual_sponsors_json, render_individual_sponsors};
use crate::modal::ModalElements;
use crate::page::Page;
use crate::render::{error_panel, render_sponsor_sections};
use crate::sponsors::{
    Categorized, SponsorDirectory, ValidityRule, categorize, parse_sponsor_plans_json,
};

pub const SPONSORS_SECTION_ID: &str = "sponsors";
pub const SPONSORS_CONTENT_ID: &str = "sponsors-content";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionOutcome {
    Rendered { count: usize },
    Empty,
    Failed { attempts: u32, message: String },
    ErrorPanel { attempts: u32, message: String },
    MissingTarget,
}

impl SectionOutcome {
    pub fn label(&self) -> String {
        match self {
            Self::Rendered { count } => format!("rendered {count}"),
            Self::Empty => "empty (hidden)".to_string(),
            Self::Failed { attempts, message } => {
                format!("failed after {attempts} attempt(s), hidden: {message}")
            }
            Self::ErrorPanel { attempts, message } => {
                format!("failed after {attempts} attempt(s), error panel: {message}")
            }
            Self::MissingTarget => "missing target element".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SponsorSection {
    url: String,
    rule: ValidityRule,
    failure_mode: FailureMode,
    directory: SponsorDirectory,
}

impl SponsorSection {
    pub fn new(url: impl Into<String>, rule: ValidityRule, failure_mode: FailureMode) -> Self {
        Self {
            url: url.into(),
            rule,
            failure_mode,
            directory: SponsorDirectory::default(),
        }
    }

    pub fn from_config(config: &SiteConfig) -> Self {
        Self::new(
            config.sponsors_api_url.clone(),
            config.validity_rule(),
            config.failure_mode.clone(),
        )
    }

    /// Lookup list from the last successful load.
    pub fn directory(&self) -> &SponsorDirectory {
        &self.directory
    }

    pub fn load<S, Z>(&mut self, page: &mut Page, fetcher: &Fetcher<S, Z>) -> SectionOutcome
    where
        S: JsonSource,
        Z: Sleeper,
    {
        if !page.contains(SPONSORS_CONTENT_ID) {
            return SectionOutcome::MissingTarget;
        }

        let url = self.url.as_str();
        let plans = match fetcher.fetch_with_retry(url, |raw| parse_sponsor_plans_json(url, raw)) {
            Ok(plans) => plans,
            Err(err) => {
                warn!(url, "sponsor load failed: {err}");
                return self.degrade(page, err.attempts(), err.to_string());
            }
        };

        let Categorized { bucket, directory } = categorize(&plans, self.rule);
        self.directory.replace(directory);

        match render_sponsor_sections(&bucket) {
            Some(html) => {
                page.set_inner_html(SPONSORS_CONTENT_ID, &html);
                page.show(SPONSORS_SECTION_ID);
                SectionOutcome::Rendered {
                    count: bucket.len(),
                }
            }
            None => {
                hide_section(page, SPONSORS_SECTION_ID, SPONSORS_CONTENT_ID);
                SectionOutcome::Empty
            }
        }
    }

    fn degrade(&mut self, page: &mut Page, attempts: u32, message: String) -> SectionOutcome {
        self.directory.replace(SponsorDirectory::default());
        match &self.failure_mode {
            FailureMode::Hide => {
                hide_section(page, SPONSORS_SECTION_ID, SPONSORS_CONTENT_ID);
                SectionOutcome::Failed { attempts, message }
            }
            FailureMode::ErrorPanel { message: panel } => {
                page.set_inner_html(SPONSORS_CONTENT_ID, &error_panel(panel));
                page.show(SPONSORS_SECTION_ID);
                SectionOutcome::ErrorPanel { attempts, message }
            }
        }
    }
}

pub fn load_individual_sponsors<S, Z>(page: &mut Page, fetcher: &Fetcher<S, Z>) -> SectionOutcome
where
    S: JsonSource,
    Z: Sleeper,
{
    let section = individual_sponsors::SECTION_ID;
    let content = individual_sponsors::CONTENT_ID;
    if !page.contains(content) {
        return SectionOutcome::MissingTarget;
    }

    let location = individual_sponsors::INDIVIDUAL_SPONSORS_JSON;
    let sponsors = match fetcher.fetch_with_retry(location, |raw| {
        parse_individual_sponsors_json(location, raw)
    }) {
        Ok(sponsors) => sponsors,
        Err(err) => {
            warn!(location, "individual sponsor load failed: {err}");
            hide_section(page, section, content);
            return SectionOutcome::Failed {
                attempts: err.attempts(),
                message: err.to_string(),
            };
        }
    };

    match render_individual_sponsors(&sponsors) {
        Some(html) => {
            page.set_inner_html(content, &html);
            SectionOutcome::Rendered {
                count: sponsors.len(),
            }
        }
        None => {
            hide_section(page, section, content);
            SectionOutcome::Empty
        }
    }
}

fn hide_section(page: &mut Page, section_id: &str, content_id: &str) {
    page.clear(content_id);
    page.hide(section_id);
}

#[derive(Debug, Clone)]
pub struct BuildReport {
    pub page: Page,
    pub sponsors: SectionOutcome,
    pub individual_sponsors: SectionOutcome,
    pub directory: SponsorDirectory,
    /// Whether every element the sponsor modal needs exists in the page.
    pub modal_ready: bool,
}

/// Runs every section loader against `template`. `api` serves the remote
/// sponsor API, `files` serves same-origin static data.
pub fn build_site<A, F, Z>(
    config: &SiteConfig,
    template: &str,
    api: A,
    files: F,
    sleeper: &Z,
) -> BuildReport
where
    A: JsonSource,
    F: JsonSource,
    Z: Sleeper,
{
    let mut page = Page::parse(template);

    let mut sponsors = SponsorSection::from_config(config);
    let api_fetcher = Fetcher::with_sleeper(api, config.retry, sleeper);
    let sponsor_outcome = sponsors.load(&mut page, &api_fetcher);
    info!(section = SPONSORS_SECTION_ID, outcome = %sponsor_outcome.label(), "section loaded");

    let file_fetcher = Fetcher::with_sleeper(files, RetryPolicy::once(config.retry.timeout), sleeper);
    let individual_outcome = load_individual_sponsors(&mut page, &file_fetcher);
    info!(
        section = individual_sponsors::SECTION_ID,
        outcome = %individual_outcome.label(),
        "section loaded"
    );

    let elements = ModalElements::default();
    let modal_ready = [
        &elements.overlay,
        &elements.logo,
        &elements.info,
        &elements.close_button,
    ]
    .into_iter()
    .all(|id| page.contains(id));
    if !modal_ready {
        warn!("sponsor modal elements missing; cards will not open details");
    }

    BuildReport {
        page,
        sponsors: sponsor_outcome,
        individual_sponsors: individual_outcome,
        directory: sponsors.directory().clone(),
        modal_ready,
    }
}
