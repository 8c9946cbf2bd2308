//! Canonical synth state.

use sintetico_core::Waveform;

use crate::error::ErrorInfo;

/// Frequency knob range in Hz.
pub const FREQUENCY_RANGE: (f32, f32) = (20.0, 2000.0);

/// Filter cutoff knob range in Hz.
pub const CUTOFF_RANGE: (f32, f32) = (20.0, 20000.0);

/// Lifecycle phase shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SynthPhase {
    /// No sound-producing gesture yet.
    Uninitialized,
    /// The audio graph exists.
    Ready,
    /// The last attempt to create the graph failed; the next gesture retries.
    Errored,
}

/// The single source of truth for what the synth is doing.
///
/// Owned by [`SynthController`](crate::SynthController); everything else
/// reads it. Frequencies are clamped into [`FREQUENCY_RANGE`] and
/// [`CUTOFF_RANGE`] on every write, and non-finite writes are ignored.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthState {
    frequency_hz: f32,
    filter_cutoff_hz: f32,
    waveform: Waveform,
    is_playing: bool,
    last_error: Option<ErrorInfo>,
}

impl Default for SynthState {
    fn default() -> Self {
        Self {
            frequency_hz: 440.0,
            filter_cutoff_hz: 2000.0,
            waveform: Waveform::Sawtooth,
            is_playing: false,
            last_error: None,
        }
    }
}

fn clamp_into(current: f32, value: f32, (min, max): (f32, f32)) -> f32 {
    if value.is_finite() {
        value.clamp(min, max)
    } else {
        current
    }
}

impl SynthState {
    /// Oscillator frequency in Hz.
    pub fn frequency_hz(&self) -> f32 {
        self.frequency_hz
    }

    /// Lowpass cutoff in Hz.
    pub fn filter_cutoff_hz(&self) -> f32 {
        self.filter_cutoff_hz
    }

    /// Oscillator waveform.
    pub fn waveform(&self) -> Waveform {
        self.waveform
    }

    /// Whether the voice is (fading toward) audible.
    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    /// The most recent unresolved error, if any.
    pub fn last_error(&self) -> Option<&ErrorInfo> {
        self.last_error.as_ref()
    }

    pub(crate) fn set_frequency_hz(&mut self, hz: f32) -> f32 {
        self.frequency_hz = clamp_into(self.frequency_hz, hz, FREQUENCY_RANGE);
        self.frequency_hz
    }

    pub(crate) fn set_filter_cutoff_hz(&mut self, hz: f32) -> f32 {
        self.filter_cutoff_hz = clamp_into(self.filter_cutoff_hz, hz, CUTOFF_RANGE);
        self.filter_cutoff_hz
    }

    pub(crate) fn set_waveform(&mut self, waveform: Waveform) {
        self.waveform = waveform;
    }

    pub(crate) fn set_playing(&mut self, playing: bool) {
        self.is_playing = playing;
    }

    pub(crate) fn set_error(&mut self, error: Option<ErrorInfo>) {
        self.last_error = error;
    }
}
