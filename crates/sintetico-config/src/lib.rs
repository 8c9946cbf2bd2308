//! Configuration for the sintetico synthesizer.
//!
//! A single TOML file holds the output settings, the initial voice, and the
//! keyboard layout. Every field is optional; missing values fall back to the
//! defaults documented on [`SynthConfig`].
//!
//! # Example
//!
//! ```rust,no_run
//! use sintetico_config::{SynthConfig, paths};
//!
//! let config = SynthConfig::load_or_default(paths::default_config_path())?;
//! println!("{} Hz, {}", config.synth.frequency_hz, config.synth.waveform);
//! # Ok::<(), sintetico_config::ConfigError>(())
//! ```

mod config;
mod error;

/// Platform-specific configuration paths.
pub mod paths;

pub use config::{AudioConfig, KeyboardConfig, SynthConfig, SynthSection};
pub use error::ConfigError;
pub use paths::{default_config_path, ensure_user_config_dir, user_config_dir};
