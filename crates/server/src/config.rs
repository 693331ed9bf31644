//! Server configuration

use std::time::Duration;

/// Server configuration loaded from environment variables
pub struct Config {
    pub bind_address: String,
    /// Shared secret for the transport caller (`X-API-Key`), auth is off when unset
    pub api_key: Option<String>,
    pub cors_origins: Vec<String>,
    pub rate_limit_rps: u32,
    pub anthropic_api_key: Option<String>,
    pub anthropic_model: Option<String>,
    /// Upper bound on a single model call before the turn degrades
    pub model_timeout: Duration,
    /// Most recent turns rendered into the prompt
    pub history_window: usize,
    /// Require `HH:MM` appointment times instead of passing model output through
    pub strict_time_format: bool,
    /// Only hand out reports to patients with an appointment on file
    pub report_requires_appointment: bool,
}

impl Config {
    /// Load configuration from environment variables (and `.env`, if present)
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();

        Self {
            bind_address: std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8080".into()),
            api_key: non_empty_var("API_KEY"),
            cors_origins: std::env::var("CORS_ORIGINS")
                .unwrap_or_else(|_| "*".into())
                .split(',')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect(),
            rate_limit_rps: parse_var::<u32>("RATE_LIMIT_RPS", 100).max(1),
            anthropic_api_key: non_empty_var("ANTHROPIC_API_KEY"),
            anthropic_model: non_empty_var("ANTHROPIC_MODEL"),
            model_timeout: Duration::from_secs(parse_var("MODEL_TIMEOUT_SECS", 30)),
            history_window: parse_var("HISTORY_WINDOW", 20),
            strict_time_format: parse_var("STRICT_TIME_FORMAT", false),
            report_requires_appointment: parse_var("REPORT_REQUIRES_APPOINTMENT", true),
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_var<T: std::str::FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key = key, value = %raw, "Ignoring unparseable config value");
            default
        }),
        Err(_) => default,
    }
}
