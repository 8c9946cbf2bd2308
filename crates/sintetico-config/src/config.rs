//! Synth configuration file format and operations.

use serde::{Deserialize, Serialize};
use sintetico_core::Waveform;
use std::path::Path;

use crate::error::ConfigError;

/// Top-level configuration.
///
/// Every field has a default, so an empty file (or no file) is a valid
/// configuration.
///
/// # TOML Format
///
/// ```toml
/// [audio]
/// sample_rate = 48000
/// buffer_size = 512
/// channels = 2
/// device = "USB"
/// start_suspended = true
///
/// [synth]
/// frequency_hz = 440.0
/// filter_cutoff_hz = 2000.0
/// waveform = "sawtooth"
/// play_gain = 0.5
/// fade_time_constant = 0.015
/// filter_q = 1.0
///
/// [keyboard]
/// keys = "awsedftgyhujk"
/// base_note = 60
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthConfig {
    /// Output device and context behaviour.
    pub audio: AudioConfig,
    /// Initial voice settings and fade behaviour.
    pub synth: SynthSection,
    /// Computer-keyboard note layout.
    pub keyboard: KeyboardConfig,
}

/// `[audio]` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Buffer size in frames.
    pub buffer_size: u32,
    /// Number of output channels.
    pub channels: u16,
    /// Output device name filter; system default when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
    /// Whether new contexts start suspended until the first gesture.
    pub start_suspended: bool,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48000,
            buffer_size: 512,
            channels: 2,
            device: None,
            start_suspended: true,
        }
    }
}

/// `[synth]` table.
///
/// Frequencies outside the controls' ranges are accepted here and clamped
/// when the controller applies them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthSection {
    /// Initial oscillator frequency in Hz.
    pub frequency_hz: f32,
    /// Initial lowpass cutoff in Hz.
    pub filter_cutoff_hz: f32,
    /// Initial waveform.
    pub waveform: Waveform,
    /// Gain faded to when playing starts.
    pub play_gain: f32,
    /// Time constant of start/stop fades, in seconds. Must be positive.
    pub fade_time_constant: f32,
    /// Lowpass resonance.
    pub filter_q: f32,
}

impl Default for SynthSection {
    fn default() -> Self {
        Self {
            frequency_hz: 440.0,
            filter_cutoff_hz: 2000.0,
            waveform: Waveform::Sawtooth,
            play_gain: 0.5,
            fade_time_constant: 0.015,
            filter_q: 1.0,
        }
    }
}

/// `[keyboard]` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyboardConfig {
    /// One character per semitone, lowest first.
    pub keys: String,
    /// MIDI note of the first key.
    pub base_note: u8,
}

impl Default for KeyboardConfig {
    fn default() -> Self {
        Self {
            keys: "awsedftgyhujk".to_string(),
            base_note: 60,
        }
    }
}

impl SynthConfig {
    /// Load and validate a configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        Self::from_toml(&content)
    }

    /// Load `path` if it exists, otherwise return the defaults.
    ///
    /// A file that exists but fails to parse or validate is still an error.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse and validate a configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: SynthConfig = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Save the configuration to a TOML file, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }

        let content = self.to_toml()?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))?;
        Ok(())
    }

    /// Convert the configuration to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check every value is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let audio = &self.audio;
        if audio.sample_rate == 0 {
            return Err(ConfigError::invalid("audio.sample_rate must be positive"));
        }
        if audio.buffer_size == 0 {
            return Err(ConfigError::invalid("audio.buffer_size must be positive"));
        }
        if audio.channels == 0 {
            return Err(ConfigError::invalid("audio.channels must be at least 1"));
        }

        let synth = &self.synth;
        for (name, value) in [
            ("synth.frequency_hz", synth.frequency_hz),
            ("synth.filter_cutoff_hz", synth.filter_cutoff_hz),
            ("synth.filter_q", synth.filter_q),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::invalid(format!("{name} must be finite")));
            }
        }
        if !(0.0..=1.0).contains(&synth.play_gain) {
            return Err(ConfigError::invalid(format!(
                "synth.play_gain must be within 0..=1, got {}",
                synth.play_gain
            )));
        }
        if !synth.fade_time_constant.is_finite() || synth.fade_time_constant <= 0.0 {
            return Err(ConfigError::invalid(format!(
                "synth.fade_time_constant must be a positive number of seconds, got {}",
                synth.fade_time_constant
            )));
        }

        self.keyboard.validate()
    }
}

impl KeyboardConfig {
    /// Reject empty layouts, repeated keys, and notes above MIDI 127.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let count = self.keys.chars().count();
        if count == 0 {
            return Err(ConfigError::invalid("keyboard.keys must not be empty"));
        }
        let mut seen = Vec::with_capacity(count);
        for c in self.keys.chars() {
            let c = c.to_ascii_lowercase();
            if seen.contains(&c) {
                return Err(ConfigError::invalid(format!(
                    "keyboard.keys repeats '{c}'"
                )));
            }
            seen.push(c);
        }
        let highest = usize::from(self.base_note) + count - 1;
        if highest > 127 {
            return Err(ConfigError::invalid(format!(
                "keyboard layout reaches MIDI note {highest}, above 127"
            )));
        }
        Ok(())
    }
}
