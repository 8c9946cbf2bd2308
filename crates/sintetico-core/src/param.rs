//! Per-sample smoothing primitives.
//!
//! Audio parameters (gain, frequency, cutoff) need smooth transitions to avoid
//! audible clicks when values change. These two smoothers are the sample-level
//! engines behind [`AudioParam`](crate::AudioParam)'s scheduled events:
//!
//! - **Exponential (one-pole lowpass)**: [`SmoothedParam`], the
//!   `set_target_at_time` approach. Natural decay, never quite arrives.
//! - **Linear**: [`LinearSmoothedParam`], the `linear_ramp_to_value_at_time`
//!   ramp. Constant rate, lands exactly on the target.
//!
//! ## Usage
//!
//! ```rust
//! use sintetico_core::SmoothedParam;
//!
//! // 15 ms time constant at 48 kHz
//! let mut gain = SmoothedParam::with_config(0.0, 48000.0, 0.015);
//! gain.set_target(0.5);
//!
//! for _ in 0..720 {
//!     let _g = gain.advance();
//! }
//! assert!(gain.get() > 0.3);
//! ```

use libm::{expf, fabsf};

/// A parameter that approaches its target exponentially.
///
/// After one time constant the value has covered ~63.2% of the distance to
/// the target; after five it is within 1%.
#[derive(Debug, Clone)]
pub struct SmoothedParam {
    current: f32,
    target: f32,
    /// Fraction of the remaining distance covered per sample; 1 is a jump.
    coeff: f32,
}

impl SmoothedParam {
    /// Create a smoother with a sample rate and time constant (seconds).
    ///
    /// A non-positive time constant makes every change instant.
    pub fn with_config(initial: f32, sample_rate: f32, time_constant: f32) -> Self {
        Self {
            current: initial,
            target: initial,
            coeff: one_pole_coeff(time_constant, sample_rate),
        }
    }

    /// Set the value to approach.
    #[inline]
    pub fn set_target(&mut self, target: f32) {
        self.target = target;
    }

    /// Advance by one sample and return the new value.
    #[inline]
    pub fn advance(&mut self) -> f32 {
        // y[n] = y[n-1] + coeff * (target - y[n-1])
        self.current += self.coeff * (self.target - self.current);
        self.current
    }

    /// Current value without advancing.
    #[inline]
    pub fn get(&self) -> f32 {
        self.current
    }

    /// Whether the value is within `1e-6` of the target.
    #[inline]
    pub fn is_settled(&self) -> bool {
        fabsf(self.current - self.target) < 1e-6
    }

    /// Jump to the target.
    #[inline]
    pub fn snap_to_target(&mut self) {
        self.current = self.target;
    }
}

/// `coeff = 1 - exp(-1 / (tau * sample_rate))`
///
/// The one-pole difference equation `y[n] = y[n-1] + coeff * (x - y[n-1])`
/// has its pole at `1 - coeff`; choosing `coeff` this way makes the
/// discrete step response match `1 - exp(-t / tau)` at every sample.
fn one_pole_coeff(time_constant: f32, sample_rate: f32) -> f32 {
    if time_constant <= 0.0 || sample_rate <= 0.0 {
        1.0
    } else {
        1.0 - expf(-1.0 / (time_constant * sample_rate))
    }
}

/// A parameter with linear smoothing (constant rate of change).
///
/// Reaches the target exactly after the configured transition time.
#[derive(Debug, Clone)]
pub struct LinearSmoothedParam {
    current: f32,
    target: f32,
    /// Signed step applied each sample until the target is reached.
    increment: f32,
    samples_remaining: u32,
    sample_rate: f32,
    /// Seconds.
    transition_time: f32,
}

impl LinearSmoothedParam {
    /// Create a linear smoother with a sample rate and transition time (seconds).
    pub fn with_config(initial: f32, sample_rate: f32, transition_time: f32) -> Self {
        Self {
            current: initial,
            target: initial,
            increment: 0.0,
            samples_remaining: 0,
            sample_rate,
            transition_time,
        }
    }

    /// Set the target value; the ramp restarts from the current value.
    pub fn set_target(&mut self, target: f32) {
        self.target = target;

        let samples = (self.transition_time * self.sample_rate) as u32;
        if samples == 0 {
            self.current = target;
            self.increment = 0.0;
            self.samples_remaining = 0;
        } else {
            self.increment = (target - self.current) / samples as f32;
            self.samples_remaining = samples;
        }
    }

    /// Advance by one sample and return the new value.
    #[inline]
    pub fn advance(&mut self) -> f32 {
        if self.samples_remaining > 0 {
            self.current += self.increment;
            self.samples_remaining -= 1;
            if self.samples_remaining == 0 {
                self.current = self.target;
            }
        }
        self.current
    }

    /// Current value without advancing.
    #[inline]
    pub fn get(&self) -> f32 {
        self.current
    }

    /// Whether the ramp has finished.
    #[inline]
    pub fn is_settled(&self) -> bool {
        self.samples_remaining == 0
    }
}
