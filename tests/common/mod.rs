#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use komekaigi_site::error::FetchError;
use komekaigi_site::fetch::{JsonSource, RetryPolicy, Sleeper};

pub fn fixture_path(name: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    path
}

pub fn read_fixture(name: &str) -> String {
    fs::read_to_string(fixture_path(name)).expect("fixture file should be readable")
}

/// Replays canned results in order; once exhausted, repeats the last one.
pub struct ScriptedSource {
    script: RefCell<VecDeque<Result<String, FetchError>>>,
    fallback: fn(&str) -> Result<String, FetchError>,
    pub calls: Cell<u32>,
    pub timeouts_seen: RefCell<Vec<Duration>>,
}

impl ScriptedSource {
    pub fn ok_once(body: &str) -> Self {
        Self::new(vec![Ok(body.to_string())], script_exhausted)
    }

    pub fn always_timeout() -> Self {
        Self::new(Vec::new(), timeout)
    }

    pub fn new(
        script: Vec<Result<String, FetchError>>,
        fallback: fn(&str) -> Result<String, FetchError>,
    ) -> Self {
        Self {
            script: RefCell::new(script.into()),
            fallback,
            calls: Cell::new(0),
            timeouts_seen: RefCell::new(Vec::new()),
        }
    }
}

fn script_exhausted(location: &str) -> Result<String, FetchError> {
    Err(FetchError::malformed(location, "script exhausted"))
}

pub fn timeout(location: &str) -> Result<String, FetchError> {
    Err(FetchError::Timeout {
        url: location.to_string(),
        timeout: Duration::from_millis(10),
    })
}

impl JsonSource for ScriptedSource {
    fn fetch_text(&self, location: &str, timeout: Duration) -> Result<String, FetchError> {
        self.calls.set(self.calls.get() + 1);
        self.timeouts_seen.borrow_mut().push(timeout);
        match self.script.borrow_mut().pop_front() {
            Some(result) => result,
            None => (self.fallback)(location),
        }
    }
}

#[derive(Default)]
pub struct RecordingSleeper {
    pub sleeps: RefCell<Vec<Duration>>,
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        self.sleeps.borrow_mut().push(duration);
    }
}

pub fn test_policy(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        delay: Duration::from_millis(1000),
        timeout: Duration::from_millis(10_000),
    }
}
