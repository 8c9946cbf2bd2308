//! Helpers shared by commands.

use anyhow::Context;
use sintetico_config::{SynthConfig, default_config_path};
use std::path::Path;

/// Load the configuration from `path`, or from the user config file when no
/// path is given. A missing user config file means defaults.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<SynthConfig> {
    match path {
        Some(path) => SynthConfig::load(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => {
            let path = default_config_path();
            tracing::debug!(path = %path.display(), "user config");
            SynthConfig::load_or_default(&path)
                .with_context(|| format!("loading config {}", path.display()))
        }
    }
}
