//! HTML fragments for the sponsor area and the sponsor modal.

use crate::sponsors::{CategoryBucket, SponsorCategory, SponsorRecord};

/// Marker class on sponsor logos; image errors on anything else are ignored.
pub const LOGO_IMAGE_CLASS: &str = "sponsor-logo-img";
pub const CARD_CLASS: &str = "sponsor-card";
pub const RELOAD_BUTTON_ID: &str = "sponsors-reload";
pub const RELOAD_ACTION: &str = "reload";
const ACCENT: &str = "#fabe00";

/// Element id of the wrapper around a sponsor's logo image.
pub fn logo_wrapper_id(sponsor_id: &str) -> String {
    format!("sponsor-logo-{sponsor_id}")
}

/// All non-empty categories in display order, or `None` when there is nothing to show.
pub fn render_sponsor_sections(bucket: &CategoryBucket) -> Option<String> {
    let html = bucket
        .sections()
        .map(|(category, records)| render_sponsor_section(category, records))
        .collect::<String>();
    if html.is_empty() { None } else { Some(html) }
}

pub fn render_sponsor_section(category: SponsorCategory, records: &[SponsorRecord]) -> String {
    if records.is_empty() {
        return String::new();
    }
    let key = category.key();
    let cards = records
        .iter()
        .map(|record| {
            format!(
                r#"<div class="sponsor-card-wrapper sponsor-card-{key}">{}</div>"#,
                render_sponsor_card(record)
            )
        })
        .collect::<String>();
    let width = if category == SponsorCategory::Silver {
        ""
    } else {
        " max-w-6xl"
    };

    format!(
        r#"
<div class="sponsor-section-{key}">
    <div class="container mx-auto px-4{width}">
        <div class="text-center mb-8">
            <h4 class="text-2xl font-semibold text-[{ACCENT}]">{label}</h4>
        </div>
        <div class="sponsor-cards-container sponsor-cards-{key}">{cards}</div>
    </div>
</div>
"#,
        label = category.label_jp(),
    )
}

pub fn render_sponsor_card(record: &SponsorRecord) -> String {
    let key = record.category.key();
    let id = html_escape(&record.id);
    let name = html_escape(&record.name);
    let logo = html_escape(&record.logo_url);
    let wrapper_id = html_escape(&logo_wrapper_id(&record.id));

    format!(
        r#"
<div class="{CARD_CLASS} sponsor-card-{key}" data-sponsor-id="{id}">
    <div id="{wrapper_id}" class="sponsor-logo-wrapper overflow-container">
        <img src="{logo}" alt="{name}" loading="lazy"
             class="image-border-fix {LOGO_IMAGE_CLASS}"
             data-sponsor-name="{name}"
             data-sponsor-type="{key}">
    </div>
</div>
"#
    )
}

/// Replaces a logo that failed to load.
pub fn logo_fallback(name: &str, category: SponsorCategory) -> String {
    format!(
        r#"<div class="sponsor-card-fallback sponsor-card-fallback-{}">{}</div>"#,
        category.key(),
        html_escape(name)
    )
}

pub fn render_modal_logo(record: &SponsorRecord) -> String {
    format!(
        r#"
<div class="modal-logo-inner overflow-container">
    <img src="{}" alt="{}" class="image-border-fix">
</div>
"#,
        html_escape(&record.logo_url),
        html_escape(&record.name)
    )
}

/// Name, PR text (only when at least `min_pr_length` characters) and links.
pub fn render_modal_info(record: &SponsorRecord, min_pr_length: usize) -> String {
    let pr = record
        .promotional_text
        .as_deref()
        .filter(|pr| pr.chars().count() >= min_pr_length)
        .map(|pr| {
            format!(
                r#"<div><p class="text-gray-700 leading-relaxed">{}</p></div>"#,
                html_escape(pr)
            )
        })
        .unwrap_or_default();

    let links = sponsor_links(record);
    let links = if links.is_empty() {
        String::new()
    } else {
        format!(
            r#"
    <div class="sponsor-modal-links" style="margin-top: 2rem; padding-top: 1.5rem; border-top: 1px solid #e5e7eb;">
        <div class="flex gap-3 justify-start">{links}</div>
    </div>"#
        )
    };

    format!(
        r#"
<div style="display: flex; flex-direction: column; height: 100%; min-height: 300px;">
    <div style="flex: 1;">
        <h4 style="margin-bottom: 1.5rem;">{name}</h4>
        {pr}
    </div>{links}
</div>
"#,
        name = html_escape(&record.name)
    )
}

/// Outbound links for the modal: sponsor page first, then the social profile.
pub fn sponsor_links(record: &SponsorRecord) -> String {
    let mut links = String::new();

    if let Some(url) = record.external_url.as_deref() {
        links.push_str(&format!(
            r#"
<a href="{}" target="_blank" rel="noopener noreferrer"
   class="inline-flex items-center px-4 py-2 bg-[{ACCENT}] text-white font-medium rounded-lg hover:bg-amber-600 transition-colors">
    <svg class="w-5 h-5 mr-2 fill-none stroke-current" viewBox="0 0 24 24">
        <path stroke-linecap="round" stroke-linejoin="round" stroke-width="2"
              d="M10 6H6a2 2 0 00-2 2v10a2 2 0 002 2h10a2 2 0 002-2v-4M14 4h6m0 0v6m0-6L10 14"></path>
    </svg>
    スポンサーページへ
</a>"#,
            html_escape(url)
        ));
    }

    if let Some(handle) = record.social_handle.as_deref() {
        links.push_str(&format!(
            r#"
<a href="{}" target="_blank" rel="noopener noreferrer" aria-label="X"
   class="inline-flex items-center px-4 py-2 bg-black text-white font-medium rounded-lg hover:bg-gray-800 transition-colors">
    <svg class="w-5 h-5 fill-current" viewBox="0 0 24 24">
        <path d="M18.244 2.25h3.308l-7.227 8.26 8.502 11.24H16.17l-5.214-6.817L4.99 21.75H1.68l7.73-8.835L1.254 2.25H8.08l4.713 6.231zm-1.161 17.52h1.833L7.084 4.126H5.117z"/>
    </svg>
</a>"#,
            html_escape(&social_url(handle))
        ));
    }

    links
}

/// Full profile URL for a social handle; values already starting with `http` pass through.
pub fn social_url(handle: &str) -> String {
    let handle = handle.trim();
    if handle.starts_with("http") {
        handle.to_string()
    } else {
        format!("https://x.com/{}", handle.trim_start_matches('@'))
    }
}

/// Inline error state with a manual reload control.
pub fn error_panel(message: &str) -> String {
    format!(
        r#"
<div class="sponsor-error text-center py-8" role="alert">
    <p class="text-gray-600 mb-4">{}</p>
    <button type="button" id="{RELOAD_BUTTON_ID}" class="sponsor-reload px-4 py-2 rounded-lg bg-[{ACCENT}] text-white" data-action="{RELOAD_ACTION}">再読み込み</button>
</div>
"#,
        html_escape(message)
    )
}

pub(crate) fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
