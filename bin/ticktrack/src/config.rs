//! CLI configuration, loaded from environment variables at startup.

use std::path::PathBuf;
use std::time::Duration;

use ticktrack_api::DEFAULT_BASE_URL;
use ticktrack_core::{TimerConfig, ToggleFailurePolicy};

/// Runtime configuration for the `ticktrack` binary.
///
/// Every field has a default so the CLI works without any environment set.
#[derive(Debug, Clone)]
pub struct Config {
    /// Backend base URL (default: `"http://localhost:8080/api"`).
    pub api_url: String,

    /// Where the logged-in user is stored
    /// (default: `<config dir>/ticktrack/current_user.json`).
    pub session_file: PathBuf,

    /// Timer tick period in milliseconds.
    pub tick_ms: u64,

    /// Timer flush period in milliseconds.
    pub flush_ms: u64,

    /// Per-request HTTP timeout.
    pub http_timeout_secs: u64,

    /// Undo the local state when a toggle request fails.
    pub rollback_on_failure: bool,

    /// `tracing` filter string, e.g. `"warn"` or `"ticktrack_core=debug"`.
    pub log_level: String,

    /// When `true`, emit log records as newline-delimited JSON.
    pub log_json: bool,
}

impl Config {
    /// Build [`Config`] from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            api_url: env_or(&get, "TICKTRACK_API_URL", DEFAULT_BASE_URL),
            session_file: get("TICKTRACK_SESSION_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(default_session_file),
            tick_ms: parse_env(&get, "TICKTRACK_TICK_MS", 1_000),
            flush_ms: parse_env(&get, "TICKTRACK_FLUSH_MS", 10_000),
            http_timeout_secs: parse_env(&get, "TICKTRACK_HTTP_TIMEOUT_SECS", 30),
            rollback_on_failure: flag_env(&get, "TICKTRACK_ROLLBACK_ON_FAILURE", true),
            log_level: env_or(&get, "TICKTRACK_LOG", "warn"),
            log_json: flag_env(&get, "TICKTRACK_LOG_JSON", false),
        }
    }

    pub fn timer_config(&self) -> TimerConfig {
        TimerConfig {
            tick_interval: Duration::from_millis(self.tick_ms.max(1)),
            flush_interval: Duration::from_millis(self.flush_ms.max(1)),
        }
    }

    pub fn toggle_policy(&self) -> ToggleFailurePolicy {
        if self.rollback_on_failure {
            ToggleFailurePolicy::Rollback
        } else {
            ToggleFailurePolicy::KeepOptimistic
        }
    }
}

// ── private helpers ──────────────────────────────────────────────────────────

fn default_session_file() -> PathBuf {
    dirs_next::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ticktrack")
        .join("current_user.json")
}

fn env_or(get: &impl Fn(&str) -> Option<String>, key: &str, default: &str) -> String {
    get(key).unwrap_or_else(|| default.to_owned())
}

fn parse_env<T: std::str::FromStr>(
    get: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> T {
    get(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn flag_env(get: &impl Fn(&str) -> Option<String>, key: &str, default: bool) -> bool {
    match get(key) {
        Some(v) if v == "1" || v.eq_ignore_ascii_case("true") => true,
        Some(v) if v == "0" || v.eq_ignore_ascii_case("false") => false,
        _ => default,
    }
}
