//! Runtime settings read from the environment.

use std::{env, path::PathBuf, str::FromStr, time::Duration};

pub const DEFAULT_API_URL: &str = "https://vidhyaai-backend.onrender.com";
pub const DEFAULT_SESSION_FILE: &str = "vaidya-session.json";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    pub api_url: String,
    pub session_file: PathBuf,
    pub http_timeout: Duration,
    pub success_toast: Duration,
    pub error_toast: Duration,
    pub login_handoff: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            session_file: PathBuf::from(DEFAULT_SESSION_FILE),
            http_timeout: Duration::from_secs(30),
            success_toast: Duration::from_millis(1500),
            error_toast: Duration::from_millis(3000),
            login_handoff: Duration::from_millis(1500),
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds settings from an arbitrary key lookup, falling back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        Self {
            api_url: lookup("VAIDYA_API_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.api_url),
            session_file: lookup("VAIDYA_SESSION_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.session_file),
            http_timeout: Duration::from_secs(parse_or(
                &lookup,
                "VAIDYA_HTTP_TIMEOUT_SECS",
                defaults.http_timeout.as_secs(),
            )),
            success_toast: millis_or(&lookup, "VAIDYA_SUCCESS_TOAST_MS", defaults.success_toast),
            error_toast: millis_or(&lookup, "VAIDYA_ERROR_TOAST_MS", defaults.error_toast),
            login_handoff: millis_or(&lookup, "VAIDYA_LOGIN_HANDOFF_MS", defaults.login_handoff),
        }
    }
}

fn millis_or(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: Duration) -> Duration {
    Duration::from_millis(parse_or(lookup, key, default.as_millis() as u64))
}

fn parse_or<T: FromStr + Copy>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    match lookup(key) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Ignoring unparseable {}={:?}", key, raw);
            default
        }),
    }
}
