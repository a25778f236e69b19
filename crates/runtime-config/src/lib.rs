//! Shared CLI/TUI configuration types.
//!
//! Both the `vigil` CLI and the terminal dashboard read/write `vigil.toml`
//! through these types. File location lives in `vigil-paths`; CLI-specific
//! display and editing live in the CLI crate.

use serde::{Deserialize, Serialize};

/// Canonical config file name.
pub const CONFIG_FILE_NAME: &str = "vigil.toml";

/// Environment variable overriding `server.url`.
pub const SERVER_URL_ENV: &str = "VIGIL_SERVER_URL";

/// Top-level configuration (persisted as `vigil.toml`).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct VigilConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub metrics: MetricsSettings,
    #[serde(default)]
    pub ui: UiSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_server_url")]
    pub url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            url: default_server_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSettings {
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// One of `1h`, `6h`, `24h`, `7d`.
    #[serde(default = "default_time_range")]
    pub default_time_range: String,
    /// Extra attempts for the label-values discovery requests.
    #[serde(default = "default_discovery_retries")]
    pub discovery_retries: usize,
}

impl Default for MetricsSettings {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            default_time_range: default_time_range(),
            discovery_retries: default_discovery_retries(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiSettings {
    /// Keep the last username as a display hint between runs.
    #[serde(default = "default_true")]
    pub remember_username: bool,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            remember_username: true,
        }
    }
}

// ── Serde default functions ─────────────────────────────────────────────

fn default_true() -> bool {
    true
}
fn default_server_url() -> String {
    "http://localhost:3000".to_string()
}
fn default_timeout_secs() -> u64 {
    15
}
fn default_poll_interval_secs() -> u64 {
    10
}
fn default_time_range() -> String {
    "1h".to_string()
}
fn default_discovery_retries() -> usize {
    2
}

const TIME_RANGES: &[&str] = &["1h", "6h", "24h", "7d"];

/// Normalize values a hand-edited file may get wrong.
/// Returns true when any field was updated.
pub fn apply_compat_fallbacks(config: &mut VigilConfig) -> bool {
    let mut changed = false;

    let url = config.server.url.trim().trim_end_matches('/');
    if url.is_empty() {
        config.server.url = default_server_url();
        changed = true;
    } else if url != config.server.url {
        config.server.url = url.to_string();
        changed = true;
    }

    if config.server.timeout_secs == 0 {
        config.server.timeout_secs = default_timeout_secs();
        changed = true;
    }

    if config.metrics.poll_interval_secs == 0 {
        config.metrics.poll_interval_secs = default_poll_interval_secs();
        changed = true;
    }

    let range = config.metrics.default_time_range.trim().to_ascii_lowercase();
    if !TIME_RANGES.contains(&range.as_str()) {
        config.metrics.default_time_range = default_time_range();
        changed = true;
    } else if range != config.metrics.default_time_range {
        config.metrics.default_time_range = range;
        changed = true;
    }

    changed
}

/// Apply `VIGIL_SERVER_URL` when set to a non-empty value.
pub fn apply_env_overrides(config: &mut VigilConfig, server_url: Option<String>) {
    if let Some(url) = server_url.filter(|u| !u.trim().is_empty()) {
        config.server.url = url.trim().trim_end_matches('/').to_string();
    }
}

/// Parse `vigil.toml` contents and normalize them.
pub fn from_toml_str(content: &str) -> Result<VigilConfig, toml::de::Error> {
    let mut config: VigilConfig = toml::from_str(content)?;
    apply_compat_fallbacks(&mut config);
    Ok(config)
}
