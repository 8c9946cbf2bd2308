//! Platform-specific configuration paths.
//!
//! - Linux: `~/.config/sintetico/`
//! - macOS: `~/Library/Application Support/sintetico/`
//! - Windows: `%APPDATA%\sintetico\`

use std::path::PathBuf;

use crate::ConfigError;

/// Application name used for directory paths.
const APP_NAME: &str = "sintetico";

/// File name of the user configuration.
const CONFIG_FILE: &str = "config.toml";

/// Returns the user-specific configuration directory.
///
/// Returns a fallback path if the config directory cannot be determined.
pub fn user_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Returns the path of the default configuration file.
pub fn default_config_path() -> PathBuf {
    user_config_dir().join(CONFIG_FILE)
}

/// Ensure the user config directory exists, creating it if necessary.
pub fn ensure_user_config_dir() -> Result<PathBuf, ConfigError> {
    let dir = user_config_dir();

    if !dir.exists() {
        std::fs::create_dir_all(&dir).map_err(|e| ConfigError::create_dir(&dir, e))?;
    }

    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_path_lives_in_app_dir() {
        let path = default_config_path();
        assert!(path.ends_with("sintetico/config.toml"), "got {path:?}");
        assert_eq!(path.parent(), Some(user_config_dir().as_path()));
    }
}
