use std::path::Path;

use anyhow::{bail, Context, Result};
use vigil_runtime_config::{apply_compat_fallbacks, from_toml_str, VigilConfig, SERVER_URL_ENV};

/// Effective configuration: `vigil.toml` (or defaults) plus `VIGIL_SERVER_URL`.
pub fn load() -> Result<VigilConfig> {
    let mut config = load_file(&vigil_paths::config_path()?)?;
    vigil_runtime_config::apply_env_overrides(&mut config, std::env::var(SERVER_URL_ENV).ok());
    Ok(config)
}

fn load_file(path: &Path) -> Result<VigilConfig> {
    if !path.exists() {
        return Ok(VigilConfig::default());
    }
    let raw = std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    from_toml_str(&raw).with_context(|| format!("parse {}", path.display()))
}

pub fn run(server: Option<String>, poll_interval: Option<u64>) -> Result<()> {
    let path = vigil_paths::config_path()?;
    if server.is_none() && poll_interval.is_none() {
        return show(&path);
    }
    let config = update(&path, server, poll_interval)?;
    println!("Updated {}", path.display());
    print!("{}", render(&config)?);
    Ok(())
}

fn show(path: &Path) -> Result<()> {
    let mut config = load_file(path)?;
    let env_url = std::env::var(SERVER_URL_ENV).ok();
    vigil_runtime_config::apply_env_overrides(&mut config, env_url.clone());

    if path.exists() {
        println!("# {}", path.display());
    } else {
        println!("# {} (not found, showing defaults)", path.display());
    }
    if env_url.is_some_and(|u| !u.trim().is_empty()) {
        println!("# server.url overridden by {SERVER_URL_ENV}");
    }
    print!("{}", render(&config)?);
    Ok(())
}

/// Apply the given settings to the file at `path`, creating it if needed.
fn update(path: &Path, server: Option<String>, poll_interval: Option<u64>) -> Result<VigilConfig> {
    let mut config = load_file(path)?;
    if let Some(url) = server {
        if url.trim().is_empty() {
            bail!("--server must not be empty");
        }
        config.server.url = url;
    }
    if let Some(secs) = poll_interval {
        if secs == 0 {
            bail!("--poll-interval must be at least 1 second");
        }
        config.metrics.poll_interval_secs = secs;
    }
    apply_compat_fallbacks(&mut config);

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    std::fs::write(path, render(&config)?).with_context(|| format!("write {}", path.display()))?;
    Ok(config)
}

fn render(config: &VigilConfig) -> Result<String> {
    toml::to_string_pretty(config).context("serialize config")
}
