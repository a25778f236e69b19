use std::path::Path;

use tracing::warn;
use vigil_runtime_config::{apply_env_overrides, from_toml_str, VigilConfig, SERVER_URL_ENV};

/// Load `vigil.toml` from the config directory, falling back to defaults
/// when the file is missing or unreadable, then apply `VIGIL_SERVER_URL`.
pub fn load_config() -> VigilConfig {
    let mut config = match vigil_paths::config_path() {
        Ok(path) => load_from(&path),
        Err(e) => {
            warn!("no config directory, using defaults: {e}");
            VigilConfig::default()
        }
    };
    apply_env_overrides(&mut config, std::env::var(SERVER_URL_ENV).ok());
    config
}

fn load_from(path: &Path) -> VigilConfig {
    let Ok(content) = std::fs::read_to_string(path) else {
        return VigilConfig::default();
    };
    from_toml_str(&content).unwrap_or_else(|e| {
        warn!("ignoring invalid {}: {e}", path.display());
        VigilConfig::default()
    })
}
