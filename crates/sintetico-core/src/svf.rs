//! Two-pole state-variable lowpass filter.
//!
//! # Topology
//!
//! Implements the Topology-Preserving Transform (TPT) SVF after Zavalishin,
//! "The Art of VA Filter Design" (2012). The trapezoidal integrators preserve
//! the analog prototype's response and stay stable while the cutoff is swept
//! at audio rate, which is exactly what a live cutoff knob does.
//!
//! Only the lowpass output is exposed; the voice never needs the others.
//!
//! # Reference
//!
//! Zavalishin, "The Art of VA Filter Design", rev. 2.1.2 (2018), Chapter 3.

use core::f32::consts::PI;
use libm::tanf;

use crate::flush_denormal;

/// Lowest accepted cutoff in Hz.
pub const MIN_CUTOFF_HZ: f32 = 20.0;

/// Two-pole (12 dB/oct) TPT state-variable lowpass.
///
/// ## Parameters
///
/// - `cutoff`: 20.0 to sr×0.49 Hz (default 350.0)
/// - `q`: 0.5 to 20.0 (default 1.0)
///
/// # Example
///
/// ```rust
/// use sintetico_core::LowpassFilter;
///
/// let mut lp = LowpassFilter::new(48000.0);
/// lp.set_cutoff(1000.0);
/// lp.set_q(0.707);
///
/// let output = lp.process(0.5);
/// assert!(output.is_finite());
/// ```
#[derive(Debug, Clone)]
pub struct LowpassFilter {
    ic1eq: f32,
    ic2eq: f32,

    g: f32,
    k: f32,

    sample_rate: f32,
    cutoff: f32,
    q: f32,
}

impl Default for LowpassFilter {
    fn default() -> Self {
        Self::new(48000.0)
    }
}

impl LowpassFilter {
    /// Create a lowpass at the given sample rate (cutoff 350 Hz, Q 1).
    pub fn new(sample_rate: f32) -> Self {
        let mut filter = Self {
            ic1eq: 0.0,
            ic2eq: 0.0,
            g: 0.0,
            k: 0.0,
            sample_rate,
            cutoff: 350.0,
            q: 1.0,
        };
        filter.update_coefficients();
        filter
    }

    /// Set cutoff frequency in Hz, clamped to `20.0..=sample_rate * 0.49`.
    ///
    /// Skips the coefficient update when the cutoff did not change, so calling
    /// this every sample with an automated value is cheap once it settles.
    pub fn set_cutoff(&mut self, freq: f32) {
        let clamped = freq.clamp(MIN_CUTOFF_HZ, self.sample_rate * 0.49);
        if clamped != self.cutoff {
            self.cutoff = clamped;
            self.update_coefficients();
        }
    }

    /// Current cutoff in Hz.
    pub fn cutoff(&self) -> f32 {
        self.cutoff
    }

    /// Set the Q factor, clamped to `0.5..=20.0`.
    pub fn set_q(&mut self, q: f32) {
        let clamped = q.clamp(0.5, 20.0);
        if clamped != self.q {
            self.q = clamped;
            self.update_coefficients();
        }
    }

    /// Current Q factor.
    pub fn q(&self) -> f32 {
        self.q
    }

    /// Clear integrator state.
    pub fn reset(&mut self) {
        self.ic1eq = 0.0;
        self.ic2eq = 0.0;
    }

    /// Process one sample.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let v3 = input - self.ic2eq;
        let v1 = (self.g * v3 + self.ic1eq) / (1.0 + self.g * (self.g + self.k));
        let v2 = self.ic2eq + self.g * v1;

        self.ic1eq = flush_denormal(2.0 * v1 - self.ic1eq);
        self.ic2eq = flush_denormal(2.0 * v2 - self.ic2eq);

        v2
    }

    fn update_coefficients(&mut self) {
        self.g = tanf(PI * self.cutoff / self.sample_rate);
        self.k = 1.0 / self.q;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn steady_state_gain(freq: f32, cutoff: f32) -> f32 {
        let sr = 48000.0;
        let mut lp = LowpassFilter::new(sr);
        lp.set_cutoff(cutoff);
        lp.set_q(0.707);

        let mut peak_in = 0.0f32;
        let mut peak_out = 0.0f32;
        for n in 0..9600 {
            let x = libm::sinf(2.0 * PI * freq * n as f32 / sr);
            let y = lp.process(x);
            if n > 4800 {
                peak_in = peak_in.max(x.abs());
                peak_out = peak_out.max(y.abs());
            }
        }
        peak_out / peak_in
    }

    #[test]
    fn passes_below_cutoff() {
        let gain = steady_state_gain(100.0, 2000.0);
        assert!((gain - 1.0).abs() < 0.05, "passband gain {gain}");
    }

    #[test]
    fn attenuates_above_cutoff() {
        let gain = steady_state_gain(8000.0, 500.0);
        assert!(gain < 0.01, "stopband gain {gain}");
    }

    #[test]
    fn cutoff_is_clamped() {
        let mut lp = LowpassFilter::new(48000.0);
        lp.set_cutoff(5.0);
        assert_eq!(lp.cutoff(), MIN_CUTOFF_HZ);
        lp.set_cutoff(30000.0);
        assert_eq!(lp.cutoff(), 48000.0 * 0.49);
    }
}
