use std::time::Duration;

/// Failure of a single fetch attempt, or of the whole retry loop.
#[derive(thiserror::Error, Debug)]
pub enum FetchError {
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("request to {url} timed out after {}ms", timeout.as_millis())]
    Timeout { url: String, timeout: Duration },

    #[error("http {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed response from {location}: {message}")]
    Malformed { location: String, message: String },

    #[error("gave up after {attempts} attempts: {last}")]
    Exhausted {
        attempts: u32,
        #[source]
        last: Box<FetchError>,
    },
}

impl FetchError {
    pub fn malformed(location: &str, message: impl Into<String>) -> Self {
        Self::Malformed {
            location: location.to_string(),
            message: message.into(),
        }
    }

    /// Number of attempts behind this error (1 for a single-attempt failure).
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Exhausted { attempts, .. } => *attempts,
            _ => 1,
        }
    }
}
