//! Sponsor detail modal.
//!
//! Cards are not wired individually. The controller registers once on the
//! stable sponsor container and routes bubbled clicks through a table keyed by
//! the `data-*` attribute found on the closest delegated ancestor.

use std::collections::BTreeMap;

use tracing::debug;

use crate::config::DEFAULT_MIN_PR_LENGTH;
use crate::page::Page;
use crate::render::{
    LOGO_IMAGE_CLASS, RELOAD_ACTION, logo_fallback, render_modal_info, render_modal_logo,
};
use crate::sponsors::{SponsorCategory, SponsorDirectory, SponsorRecord};

pub const CANCEL_KEY: &str = "Escape";
const ACTIVE_CLASS: &str = "active";

/// Ids of the elements the modal works with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModalElements {
    pub overlay: String,
    pub logo: String,
    pub info: String,
    pub close_button: String,
}

impl Default for ModalElements {
    fn default() -> Self {
        Self {
            overlay: "sponsorModal".to_string(),
            logo: "modalLogo".to_string(),
            info: "modalInfo".to_string(),
            close_button: "modalCloseButton".to_string(),
        }
    }
}

/// What the host resolved for a click: the clicked element's id, and the
/// dataset of the closest ancestor carrying a delegated data attribute.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClickTarget {
    pub element_id: Option<String>,
    pub dataset: BTreeMap<String, String>,
}

impl ClickTarget {
    pub fn element(id: &str) -> Self {
        Self {
            element_id: Some(id.to_string()),
            dataset: BTreeMap::new(),
        }
    }

    /// Resolves a click on `element_id` the way the delegated listener sees it.
    pub fn resolve(page: &Page, element_id: &str) -> Self {
        Self {
            element_id: Some(element_id.to_string()),
            dataset: page
                .closest_dataset_any(element_id, DELEGATED_KEYS)
                .unwrap_or_default(),
        }
    }

    pub fn card(sponsor_id: &str) -> Self {
        let mut dataset = BTreeMap::new();
        dataset.insert(SPONSOR_ID_KEY.to_string(), sponsor_id.to_string());
        Self {
            element_id: None,
            dataset,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageErrorTarget {
    pub classes: Vec<String>,
    pub dataset: BTreeMap<String, String>,
    /// Id of the element wrapping the image.
    pub parent_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    Click(ClickTarget),
    KeyDown(String),
    ImageError(ImageErrorTarget),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelegatedAction {
    OpenSponsor,
    Reload,
}

/// Work the controller cannot do itself and hands back to its host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostRequest {
    ReloadSponsors,
}

pub const SPONSOR_ID_KEY: &str = "sponsor-id";
pub const ACTION_KEY: &str = "action";
const DELEGATED_KEYS: &[&str] = &[SPONSOR_ID_KEY, ACTION_KEY];

#[derive(Debug, Clone)]
pub struct ModalController {
    directory: SponsorDirectory,
    elements: ModalElements,
    routes: Vec<(&'static str, DelegatedAction)>,
    min_pr_length: usize,
    open_id: Option<String>,
}

impl ModalController {
    pub fn new(directory: SponsorDirectory) -> Self {
        Self::with_elements(directory, ModalElements::default())
    }

    pub fn with_elements(directory: SponsorDirectory, elements: ModalElements) -> Self {
        Self {
            directory,
            elements,
            routes: vec![
                (SPONSOR_ID_KEY, DelegatedAction::OpenSponsor),
                (ACTION_KEY, DelegatedAction::Reload),
            ],
            min_pr_length: DEFAULT_MIN_PR_LENGTH,
            open_id: None,
        }
    }

    pub fn min_pr_length(mut self, min_pr_length: usize) -> Self {
        self.min_pr_length = min_pr_length;
        self
    }

    pub fn elements(&self) -> &ModalElements {
        &self.elements
    }

    pub fn directory(&self) -> &SponsorDirectory {
        &self.directory
    }

    /// Swaps in the lookup list from a newer fetch.
    pub fn replace_directory(&mut self, directory: SponsorDirectory) {
        self.directory.replace(directory);
    }

    pub fn is_open(&self) -> bool {
        self.open_id.is_some()
    }

    pub fn current(&self) -> Option<&SponsorRecord> {
        self.open_id.as_deref().and_then(|id| self.directory.find(id))
    }

    /// Applies `event` to the page. Returns a request when the host has to act,
    /// e.g. refetch after the reload control was clicked.
    pub fn handle_event(&mut self, page: &mut Page, event: &UiEvent) -> Option<HostRequest> {
        match event {
            UiEvent::Click(target) => return self.on_click(page, target),
            UiEvent::KeyDown(key) => {
                if key == CANCEL_KEY {
                    self.close(page);
                }
            }
            UiEvent::ImageError(target) => {
                handle_image_error(page, target);
            }
        }
        None
    }

    fn on_click(&mut self, page: &mut Page, target: &ClickTarget) -> Option<HostRequest> {
        let routed = self.routes.iter().find_map(|(key, action)| {
            target.dataset.get(*key).map(|value| (*action, value.as_str()))
        });
        match routed {
            Some((DelegatedAction::OpenSponsor, sponsor_id)) => {
                self.open(page, sponsor_id);
                return None;
            }
            Some((DelegatedAction::Reload, action)) if action == RELOAD_ACTION => {
                debug!("reload requested from sponsor section");
                return Some(HostRequest::ReloadSponsors);
            }
            _ => {}
        }

        let element_id = target.element_id.as_deref()?;
        // Clicks inside the content area carry the content's own id, never the overlay's.
        if element_id == self.elements.overlay || element_id == self.elements.close_button {
            self.close(page);
        }
        None
    }

    /// Shows the modal for `sponsor_id`. Unknown ids and a missing overlay leave the page untouched.
    pub fn open(&mut self, page: &mut Page, sponsor_id: &str) -> bool {
        let Some(record) = self.directory.find(sponsor_id) else {
            debug!(sponsor_id, "no sponsor for modal");
            return false;
        };
        if !page.contains(&self.elements.overlay) {
            return false;
        }

        page.set_inner_html(&self.elements.logo, &render_modal_logo(record));
        page.set_inner_html(
            &self.elements.info,
            &render_modal_info(record, self.min_pr_length),
        );
        page.add_class(&self.elements.overlay, ACTIVE_CLASS);
        page.set_body_overflow(Some("hidden"));
        self.open_id = Some(record.id.clone());
        true
    }

    /// The single close routine behind outside click, cancel key and the close control.
    pub fn close(&mut self, page: &mut Page) {
        page.remove_class(&self.elements.overlay, ACTIVE_CLASS);
        page.set_body_overflow(None);
        self.open_id = None;
    }
}

/// Swaps a broken sponsor logo for its text fallback. Returns `false` for
/// images without the sponsor marker class.
pub fn handle_image_error(page: &mut Page, target: &ImageErrorTarget) -> bool {
    if !target.classes.iter().any(|class| class == LOGO_IMAGE_CLASS) {
        return false;
    }
    let Some(parent_id) = target.parent_id.as_deref() else {
        return false;
    };
    let name = target
        .dataset
        .get("sponsor-name")
        .map(String::as_str)
        .unwrap_or_default();
    let category = target
        .dataset
        .get("sponsor-type")
        .and_then(|key| SponsorCategory::from_key(key))
        .unwrap_or(SponsorCategory::Gold);
    page.set_inner_html(parent_id, &logo_fallback(name, category))
}
