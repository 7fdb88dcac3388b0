//! Timed, bounded-retry fetching of JSON documents.
//!
//! A [`JsonSource`] performs exactly one attempt per call. [`Fetcher`] wraps a
//! source in a fixed-delay retry loop: no backoff, no jitter, and the next
//! attempt only starts once the previous one has conclusively failed.

use std::fs;
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::FetchError;
use crate::http_client::http_client;

const DEFAULT_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_DELAY_MS: u64 = 1_000;
const DEFAULT_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    pub delay: Duration,
    pub timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay: Duration::from_millis(DEFAULT_DELAY_MS),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }
}

impl RetryPolicy {
    /// A single attempt with no retry, as used for same-origin static files.
    pub fn once(timeout: Duration) -> Self {
        Self {
            max_attempts: 1,
            delay: Duration::ZERO,
            timeout,
        }
    }
}

pub trait JsonSource {
    fn fetch_text(&self, location: &str, timeout: Duration) -> Result<String, FetchError>;
}

impl<S: JsonSource + ?Sized> JsonSource for &S {
    fn fetch_text(&self, location: &str, timeout: Duration) -> Result<String, FetchError> {
        (**self).fetch_text(location, timeout)
    }
}

/// Remote API source backed by the shared blocking reqwest client.
#[derive(Debug, Default, Clone, Copy)]
pub struct HttpSource;

impl JsonSource for HttpSource {
    fn fetch_text(&self, url: &str, timeout: Duration) -> Result<String, FetchError> {
        let client = http_client().map_err(|err| FetchError::Transport {
            url: url.to_string(),
            message: format!("{err:#}"),
        })?;

        let resp = client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .timeout(timeout)
            .send()
            .map_err(|err| request_error(url, timeout, err))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        resp.text().map_err(|err| request_error(url, timeout, err))
    }
}

fn request_error(url: &str, timeout: Duration, err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
            timeout,
        }
    } else {
        FetchError::Transport {
            url: url.to_string(),
            message: err.to_string(),
        }
    }
}

/// Same-origin static files, resolved relative to the site root.
#[derive(Debug, Clone)]
pub struct FileSource {
    root: PathBuf,
}

impl FileSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &PathBuf {
        &self.root
    }
}

impl JsonSource for FileSource {
    fn fetch_text(&self, location: &str, _timeout: Duration) -> Result<String, FetchError> {
        let relative = location.trim_start_matches("./").trim_start_matches('/');
        let path = self.root.join(relative);
        fs::read_to_string(&path).map_err(|source| FetchError::Io {
            path: path.display().to_string(),
            source,
        })
    }
}

pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

impl<Z: Sleeper + ?Sized> Sleeper for &Z {
    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            thread::sleep(duration);
        }
    }
}

pub struct Fetcher<S, Z = ThreadSleeper> {
    source: S,
    sleeper: Z,
    policy: RetryPolicy,
}

impl<S: JsonSource> Fetcher<S, ThreadSleeper> {
    pub fn new(source: S, policy: RetryPolicy) -> Self {
        Self {
            source,
            sleeper: ThreadSleeper,
            policy,
        }
    }
}

impl<S: JsonSource, Z: Sleeper> Fetcher<S, Z> {
    pub fn with_sleeper(source: S, policy: RetryPolicy, sleeper: Z) -> Self {
        Self {
            source,
            sleeper,
            policy,
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Fetches `location` and hands the body to `parse`. A parse failure counts
    /// as a failed attempt and goes through the same retry path as a network error.
    pub fn fetch_with_retry<T, P>(&self, location: &str, parse: P) -> Result<T, FetchError>
    where
        P: Fn(&str) -> Result<T, FetchError>,
    {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut last_err = None;

        for attempt in 1..=max_attempts {
            let result = self
                .source
                .fetch_text(location, self.policy.timeout)
                .and_then(|body| parse(&body));

            match result {
                Ok(value) => {
                    debug!(location, attempt, "fetch succeeded");
                    return Ok(value);
                }
                Err(err) => {
                    warn!(location, attempt, max_attempts, "fetch attempt failed: {err}");
                    last_err = Some(err);
                    if attempt < max_attempts {
                        self.sleeper.sleep(self.policy.delay);
                    }
                }
            }
        }

        let last = last_err.unwrap_or_else(|| FetchError::malformed(location, "no attempt made"));
        if max_attempts == 1 {
            return Err(last);
        }
        Err(FetchError::Exhausted {
            attempts: max_attempts,
            last: Box::new(last),
        })
    }
}

/// Parses a JSON body, mapping empty and `null` bodies to a malformed-response error.
pub fn parse_json_body<T>(location: &str, raw: &str) -> Result<T, FetchError>
where
    T: serde::de::DeserializeOwned,
{
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Err(FetchError::malformed(location, "empty body"));
    }
    serde_json::from_str(trimmed).map_err(|err| FetchError::malformed(location, err.to_string()))
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};

    use super::*;

    struct Flaky {
        fail_first: u32,
        calls: Cell<u32>,
    }

    impl JsonSource for Flaky {
        fn fetch_text(&self, location: &str, _timeout: Duration) -> Result<String, FetchError> {
            let n = self.calls.get() + 1;
            self.calls.set(n);
            if n <= self.fail_first {
                Err(FetchError::Status {
                    url: location.to_string(),
                    status: 503,
                })
            } else {
                Ok("{\"ok\":true}".to_string())
            }
        }
    }

    #[derive(Default)]
    struct Recorder(RefCell<Vec<Duration>>);

    impl Sleeper for Recorder {
        fn sleep(&self, duration: Duration) {
            self.0.borrow_mut().push(duration);
        }
    }

    fn policy(attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts: attempts,
            delay: Duration::from_millis(5),
            timeout: Duration::from_millis(50),
        }
    }

    #[test]
    fn recovers_on_a_later_attempt() {
        let source = Flaky {
            fail_first: 2,
            calls: Cell::new(0),
        };
        let sleeps = Recorder::default();
        let fetcher = Fetcher::with_sleeper(&source, policy(3), &sleeps);
        let value: serde_json::Value = fetcher
            .fetch_with_retry("api", |raw| parse_json_body("api", raw))
            .expect("third attempt succeeds");
        assert_eq!(value["ok"], true);
        assert_eq!(source.calls.get(), 3);
        assert_eq!(sleeps.0.borrow().len(), 2);
    }

    #[test]
    fn single_attempt_failure_is_not_wrapped() {
        let source = Flaky {
            fail_first: 1,
            calls: Cell::new(0),
        };
        let sleeps = Recorder::default();
        let fetcher = Fetcher::with_sleeper(&source, policy(1), &sleeps);
        let err = fetcher
            .fetch_with_retry("api", |raw| parse_json_body::<serde_json::Value>("api", raw))
            .unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 503, .. }));
        assert!(sleeps.0.borrow().is_empty());
    }

    #[test]
    fn null_body_is_malformed() {
        let err = parse_json_body::<serde_json::Value>("x", " null ").unwrap_err();
        assert!(matches!(err, FetchError::Malformed { .. }));
    }

    #[test]
    fn file_source_strips_leading_dot_slash() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::create_dir_all(dir.path().join("data")).expect("mkdir");
        fs::write(dir.path().join("data/a.json"), "[]").expect("write");
        let source = FileSource::new(dir.path());
        let body = source
            .fetch_text("./data/a.json", Duration::from_secs(1))
            .expect("file readable");
        assert_eq!(body, "[]");
        assert!(matches!(
            source.fetch_text("data/missing.json", Duration::from_secs(1)),
            Err(FetchError::Io { .. })
        ));
    }
}
