//! Where Vigil keeps its files.
//!
//! Everything lives under one config directory: `$VIGIL_CONFIG_DIR` when set,
//! otherwise `~/.config/vigil`.
//!
//! ```text
//! ~/.config/vigil/
//!   vigil.toml            configuration
//!   state/display-name    last logged-in username (display only)
//!   state/vigil-tui.log   dashboard log output
//! ```

use std::ffi::OsString;
use std::path::PathBuf;

use vigil_runtime_config::CONFIG_FILE_NAME;

/// Overrides the config directory.
pub const CONFIG_DIR_ENV: &str = "VIGIL_CONFIG_DIR";

const APP_DIR: &str = "vigil";
const STATE_DIR: &str = "state";
const DISPLAY_NAME_FILE: &str = "display-name";
const TUI_LOG_FILE: &str = "vigil-tui.log";

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum PathError {
    #[error("could not determine home directory")]
    NoHome,
}

/// Config directory, honouring `VIGIL_CONFIG_DIR`.
pub fn config_dir() -> Result<PathBuf, PathError> {
    config_dir_from(std::env::var_os(CONFIG_DIR_ENV))
}

/// Config directory from an explicit override value.
pub fn config_dir_from(override_dir: Option<OsString>) -> Result<PathBuf, PathError> {
    if let Some(dir) = override_dir.filter(|d| !d.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    let base = directories::BaseDirs::new().ok_or(PathError::NoHome)?;
    Ok(base.home_dir().join(".config").join(APP_DIR))
}

/// Canonical config file path.
pub fn config_path() -> Result<PathBuf, PathError> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

pub fn state_dir() -> Result<PathBuf, PathError> {
    Ok(config_dir()?.join(STATE_DIR))
}

/// File holding the cached display name.
pub fn display_name_path() -> Result<PathBuf, PathError> {
    Ok(state_dir()?.join(DISPLAY_NAME_FILE))
}

pub fn tui_log_path() -> Result<PathBuf, PathError> {
    Ok(state_dir()?.join(TUI_LOG_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn override_wins_when_non_empty() {
        let dir = config_dir_from(Some(OsString::from("/tmp/vigil-test"))).unwrap();
        assert_eq!(dir, PathBuf::from("/tmp/vigil-test"));
    }

    #[test]
    fn empty_override_falls_back_to_home() {
        let dir = config_dir_from(Some(OsString::new())).unwrap();
        assert!(dir.ends_with(".config/vigil"));
    }

    #[test]
    fn files_live_under_config_dir() {
        let dir = config_dir().unwrap();
        assert_eq!(config_path().unwrap(), dir.join("vigil.toml"));
        assert_eq!(
            display_name_path().unwrap(),
            dir.join("state").join("display-name")
        );
        assert!(tui_log_path().unwrap().starts_with(state_dir().unwrap()));
    }
}
