//! Sintetico Core - DSP and control math for a single-voice synthesizer
//!
//! This crate holds everything below the audio host boundary that can be
//! expressed as pure, allocation-light computation:
//!
//! # Core Abstractions
//!
//! ## Rotary Mapping
//!
//! Bounded value ↔ indicator angle conversion for a 270° knob:
//!
//! - [`value_to_angle`] / [`angle_to_value`] - linear map over `[-135°, +135°]`
//! - [`normalize_delta_degrees`] - fold an angular drag delta into `(-180°, 180°]`
//! - [`pointer_angle`] - `atan2` of a pointer sample around a rotation center
//!
//! ## Parameter Automation
//!
//! - [`AudioParam`] - time-scheduled parameter (set, exponential target, linear ramp)
//! - [`SmoothedParam`] - Exponential smoothing (RC-like response)
//! - [`LinearSmoothedParam`] - Linear ramps (constant rate)
//!
//! ## Signal Chain Building Blocks
//!
//! - [`Oscillator`] - PolyBLEP oscillator with four [`Waveform`]s
//! - [`LowpassFilter`] - 2-pole TPT state-variable lowpass
//!
//! ## Utilities
//!
//! - [`flush_denormal`], [`midi_to_freq`]
//!
//! # no_std Support
//!
//! This crate is `no_std` compatible (with `alloc`). Disable the default
//! `std` feature in your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! sintetico-core = { version = "0.1", default-features = false }
//! ```
//!
//! # Example
//!
//! ```rust
//! use sintetico_core::{AudioParam, LowpassFilter, Oscillator, Waveform};
//!
//! let sample_rate = 48000.0;
//! let mut osc = Oscillator::new(sample_rate);
//! osc.set_waveform(Waveform::Sawtooth);
//! osc.set_frequency(220.0);
//!
//! let mut filter = LowpassFilter::new(sample_rate);
//! filter.set_cutoff(1200.0);
//!
//! // Fade in over a 15 ms time constant.
//! let mut gain = AudioParam::new(0.0, 0.0, 1.0);
//! gain.set_sample_rate(sample_rate);
//! gain.set_target_at_time(0.5, 0.0, 0.015);
//!
//! let dt = 1.0 / f64::from(sample_rate);
//! for n in 0..480 {
//!     let g = gain.advance(n as f64 * dt);
//!     let _out = filter.process(osc.advance()) * g;
//! }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod automation;
pub mod knob;
pub mod math;
pub mod oscillator;
pub mod param;
pub mod svf;

// Re-export main types at crate root
pub use automation::{AudioParam, ParamEvent};
pub use knob::{
    END_DEGREES, START_OFFSET_DEGREES, SWEEP_DEGREES, angle_to_value, normalize_delta_degrees,
    pointer_angle, to_degrees, value_to_angle,
};
pub use math::{flush_denormal, midi_to_freq};
pub use oscillator::{Oscillator, ParseWaveformError, Waveform};
pub use param::{LinearSmoothedParam, SmoothedParam};
pub use svf::LowpassFilter;
