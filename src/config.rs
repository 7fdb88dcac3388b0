use std::path::PathBuf;
use std::time::Duration;

use crate::fetch::RetryPolicy;
use crate::sponsors::ValidityRule;

pub const DEFAULT_SPONSORS_API_URL: &str = "https://fortee.jp/komekaigi-2025/api/sponsors";
pub const DEFAULT_ERROR_MESSAGE: &str = "スポンサー情報を読み込めませんでした";
const DEFAULT_SITE_ROOT: &str = "docs";

/// PR text shorter than this is not shown in the sponsor modal.
pub const DEFAULT_MIN_PR_LENGTH: usize = 20;

/// What the sponsor area turns into once every attempt has failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureMode {
    Hide,
    ErrorPanel { message: String },
}

#[derive(Debug, Clone)]
pub struct SiteConfig {
    pub sponsors_api_url: String,
    pub retry: RetryPolicy,
    pub min_pr_length: usize,
    pub strict_sponsors: bool,
    pub failure_mode: FailureMode,
    pub site_root: PathBuf,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            sponsors_api_url: DEFAULT_SPONSORS_API_URL.to_string(),
            retry: RetryPolicy::default(),
            min_pr_length: DEFAULT_MIN_PR_LENGTH,
            strict_sponsors: false,
            failure_mode: FailureMode::Hide,
            site_root: PathBuf::from(DEFAULT_SITE_ROOT),
        }
    }
}

impl SiteConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup. Unparseable values fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).and_then(|v| non_empty(&v).map(str::to_string));

        let timeout_ms = get("SPONSORS_TIMEOUT_MS")
            .and_then(|val| val.parse::<u64>().ok())
            .unwrap_or(defaults.retry.timeout.as_millis() as u64)
            .clamp(100, 60_000);
        let max_attempts = get("SPONSORS_RETRY_COUNT")
            .and_then(|val| val.parse::<u32>().ok())
            .unwrap_or(defaults.retry.max_attempts)
            .clamp(1, 10);
        let delay_ms = get("SPONSORS_RETRY_DELAY_MS")
            .and_then(|val| val.parse::<u64>().ok())
            .unwrap_or(defaults.retry.delay.as_millis() as u64)
            .min(30_000);
        let min_pr_length = get("SPONSORS_MIN_PR_LENGTH")
            .and_then(|val| val.parse::<usize>().ok())
            .unwrap_or(defaults.min_pr_length);
        let strict_sponsors = get("SPONSORS_STRICT")
            .map(|val| parse_flag(&val))
            .unwrap_or(defaults.strict_sponsors);

        let failure_mode = match get("SPONSORS_FAILURE_MODE")
            .map(|val| val.to_lowercase())
            .as_deref()
        {
            Some("error-panel") | Some("error_panel") | Some("panel") => FailureMode::ErrorPanel {
                message: get("SPONSORS_ERROR_MESSAGE")
                    .unwrap_or_else(|| DEFAULT_ERROR_MESSAGE.to_string()),
            },
            _ => FailureMode::Hide,
        };

        Self {
            sponsors_api_url: get("SPONSORS_API_URL").unwrap_or(defaults.sponsors_api_url),
            retry: RetryPolicy {
                max_attempts,
                delay: Duration::from_millis(delay_ms),
                timeout: Duration::from_millis(timeout_ms),
            },
            min_pr_length,
            strict_sponsors,
            failure_mode,
            site_root: get("SITE_ROOT")
                .map(PathBuf::from)
                .unwrap_or(defaults.site_root),
        }
    }

    pub fn validity_rule(&self) -> ValidityRule {
        ValidityRule {
            min_pr_length: self.strict_sponsors.then_some(self.min_pr_length),
        }
    }
}

fn non_empty(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
