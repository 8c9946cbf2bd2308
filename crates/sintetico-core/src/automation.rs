//! Time-scheduled parameter automation.
//!
//! [`AudioParam`] is a scalar parameter whose value is driven by a timeline of
//! [`ParamEvent`]s expressed in seconds on the owning context's clock. The
//! renderer calls [`AudioParam::advance`] once per sample with that sample's
//! time; the control side only ever schedules events and never waits on them.
//!
//! # Event semantics
//!
//! | Event | Takes effect | Behaviour |
//! |---|---|---|
//! | `SetValue` | at `time` | jump to `value` |
//! | `SetTarget` | at `start_time` | exponential approach, time constant `tau` |
//! | `LinearRamp` | as soon as every earlier event has fired | straight line to `value`, arriving at `end_time` |
//!
//! A newly activated event replaces whatever approach or ramp was running.
//! Events with equal times fire in the order they were scheduled.
//!
//! ```rust
//! use sintetico_core::AudioParam;
//!
//! let mut gain = AudioParam::new(0.0, 0.0, 1.0);
//! gain.set_sample_rate(1000.0);
//! gain.set_target_at_time(1.0, 0.0, 0.010);
//!
//! // After five time constants the approach is within 1% of the target.
//! let mut value = 0.0;
//! for n in 0..50 {
//!     value = gain.advance(n as f64 / 1000.0);
//! }
//! assert!((value - 1.0).abs() < 0.01);
//! ```

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use crate::param::{LinearSmoothedParam, SmoothedParam};

/// One scheduled change on an [`AudioParam`] timeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamEvent {
    /// Jump to `value` at `time`.
    SetValue {
        /// New value.
        value: f32,
        /// Context time in seconds.
        time: f64,
    },
    /// Approach `target` exponentially, starting at `start_time`.
    SetTarget {
        /// Value being approached.
        target: f32,
        /// Context time in seconds at which the approach starts.
        start_time: f64,
        /// Time constant in seconds.
        time_constant: f32,
    },
    /// Ramp linearly to `value`, arriving at `end_time`.
    LinearRamp {
        /// Value reached at `end_time`.
        value: f32,
        /// Context time in seconds at which the ramp ends.
        end_time: f64,
    },
}

impl ParamEvent {
    /// The time this event is ordered by on the timeline.
    pub fn time(&self) -> f64 {
        match *self {
            ParamEvent::SetValue { time, .. } => time,
            ParamEvent::SetTarget { start_time, .. } => start_time,
            ParamEvent::LinearRamp { end_time, .. } => end_time,
        }
    }
}

#[derive(Debug, Clone)]
enum Motion {
    Hold,
    Target(SmoothedParam),
    Ramp(LinearSmoothedParam),
}

/// A scalar parameter driven by a timeline of scheduled events.
///
/// Values are clamped to the nominal `[min, max]` range on output.
#[derive(Debug, Clone)]
pub struct AudioParam {
    value: f32,
    default: f32,
    min: f32,
    max: f32,
    sample_rate: f32,
    events: Vec<ParamEvent>,
    motion: Motion,
}

impl AudioParam {
    /// Create a parameter holding `default`, with nominal range `[min, max]`.
    ///
    /// The sample rate defaults to 48 kHz; see [`set_sample_rate`](Self::set_sample_rate).
    pub fn new(default: f32, min: f32, max: f32) -> Self {
        Self {
            value: default.clamp(min, max),
            default,
            min,
            max,
            sample_rate: 48000.0,
            events: Vec::new(),
            motion: Motion::Hold,
        }
    }

    /// Set the sample rate used to turn time constants into per-sample steps.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
    }

    /// Current value (as of the last [`advance`](Self::advance)).
    #[inline]
    pub fn value(&self) -> f32 {
        self.value
    }

    /// Default value the parameter was created with.
    pub fn default_value(&self) -> f32 {
        self.default
    }

    /// Nominal minimum.
    pub fn min(&self) -> f32 {
        self.min
    }

    /// Nominal maximum.
    pub fn max(&self) -> f32 {
        self.max
    }

    /// Scheduled events that have not fired yet, in timeline order.
    pub fn pending_events(&self) -> &[ParamEvent] {
        &self.events
    }

    /// Whether the value is still moving or has events waiting.
    pub fn is_automating(&self) -> bool {
        !self.events.is_empty() || !matches!(self.motion, Motion::Hold)
    }

    /// Schedule a jump to `value` at `time`.
    pub fn set_value_at_time(&mut self, value: f32, time: f64) {
        self.schedule(ParamEvent::SetValue { value, time });
    }

    /// Schedule an exponential approach to `target` starting at `start_time`.
    ///
    /// A non-positive time constant is treated as a jump.
    pub fn set_target_at_time(&mut self, target: f32, start_time: f64, time_constant: f32) {
        if time_constant <= 0.0 {
            self.set_value_at_time(target, start_time);
        } else {
            self.schedule(ParamEvent::SetTarget {
                target,
                start_time,
                time_constant,
            });
        }
    }

    /// Schedule a linear ramp that reaches `value` at `end_time`.
    pub fn linear_ramp_to_value_at_time(&mut self, value: f32, end_time: f64) {
        self.schedule(ParamEvent::LinearRamp { value, end_time });
    }

    /// Drop every event scheduled at or after `from_time`.
    ///
    /// An approach or ramp that is already running keeps running.
    pub fn cancel_scheduled_values(&mut self, from_time: f64) {
        self.events.retain(|e| e.time() < from_time);
        #[cfg(feature = "tracing")]
        tracing::trace!(from_time, remaining = self.events.len(), "param events cancelled");
    }

    /// Set the value immediately, discarding all automation.
    pub fn reset(&mut self, value: f32) {
        self.events.clear();
        self.motion = Motion::Hold;
        self.value = value.clamp(self.min, self.max);
    }

    /// Compute the value for the sample at `time` (seconds).
    ///
    /// Call once per sample with non-decreasing times.
    pub fn advance(&mut self, time: f64) -> f32 {
        while let Some(event) = self.events.first().copied() {
            match event {
                ParamEvent::SetValue { value, time: at } if at <= time => {
                    self.motion = Motion::Hold;
                    self.value = value;
                }
                ParamEvent::SetTarget {
                    target,
                    start_time,
                    time_constant,
                } if start_time <= time => {
                    let mut smoother =
                        SmoothedParam::with_config(self.value, self.sample_rate, time_constant);
                    smoother.set_target(target);
                    self.motion = Motion::Target(smoother);
                }
                ParamEvent::LinearRamp { value, end_time } => {
                    let duration = (end_time - time).max(0.0) as f32;
                    let mut ramp =
                        LinearSmoothedParam::with_config(self.value, self.sample_rate, duration);
                    ramp.set_target(value);
                    self.motion = Motion::Ramp(ramp);
                }
                _ => break,
            }
            self.events.remove(0);
        }

        match &mut self.motion {
            Motion::Hold => {}
            Motion::Target(smoother) => {
                self.value = smoother.advance();
                if smoother.is_settled() {
                    smoother.snap_to_target();
                    self.value = smoother.get();
                    self.motion = Motion::Hold;
                }
            }
            Motion::Ramp(ramp) => {
                self.value = ramp.advance();
                if ramp.is_settled() {
                    self.motion = Motion::Hold;
                }
            }
        }

        self.value = self.value.clamp(self.min, self.max);
        self.value
    }

    fn schedule(&mut self, event: ParamEvent) {
        let at = event.time();
        let index = self.events.partition_point(|e| e.time() <= at);
        self.events.insert(index, event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f32 = 1000.0;

    fn run(param: &mut AudioParam, from: usize, to: usize) -> f32 {
        let mut value = param.value();
        for n in from..to {
            value = param.advance(n as f64 / f64::from(SR));
        }
        value
    }

    fn param(default: f32) -> AudioParam {
        let mut p = AudioParam::new(default, 0.0, 10.0);
        p.set_sample_rate(SR);
        p
    }

    #[test]
    fn set_value_waits_for_its_time() {
        let mut p = param(1.0);
        p.set_value_at_time(3.0, 0.1);

        assert_eq!(run(&mut p, 0, 100), 1.0);
        assert_eq!(run(&mut p, 100, 101), 3.0);
        assert!(!p.is_automating());
    }

    #[test]
    fn set_target_approaches_without_jumping() {
        let mut p = param(0.0);
        p.set_target_at_time(1.0, 0.0, 0.015);

        let first = run(&mut p, 0, 1);
        assert!(first > 0.0 && first < 0.1, "first sample moved by {first}");

        // One time constant: ~63%.
        let after_tau = run(&mut p, 1, 15);
        assert!((after_tau - 0.632).abs() < 0.05, "got {after_tau}");
    }

    #[test]
    fn newer_target_replaces_running_approach() {
        let mut p = param(0.0);
        p.set_target_at_time(1.0, 0.0, 0.010);
        run(&mut p, 0, 20);

        p.cancel_scheduled_values(0.020);
        p.set_target_at_time(0.0, 0.020, 0.010);
        let value = run(&mut p, 20, 200);
        assert!(value < 1e-3, "should settle back to zero, got {value}");
    }

    #[test]
    fn linear_ramp_arrives_on_time() {
        let mut p = param(0.0);
        p.linear_ramp_to_value_at_time(2.0, 0.1);

        let halfway = run(&mut p, 0, 50);
        assert!((halfway - 1.0).abs() < 0.05, "got {halfway}");
        assert_eq!(run(&mut p, 50, 101), 2.0);
    }

    #[test]
    fn output_is_clamped_to_nominal_range() {
        let mut p = param(5.0);
        p.set_value_at_time(50.0, 0.0);
        assert_eq!(run(&mut p, 0, 1), 10.0);
    }

    #[test]
    fn equal_times_fire_in_schedule_order() {
        let mut p = param(0.0);
        p.set_value_at_time(1.0, 0.0);
        p.set_value_at_time(2.0, 0.0);
        assert_eq!(run(&mut p, 0, 1), 2.0);
    }

    #[test]
    fn cancel_keeps_earlier_events() {
        let mut p = param(0.0);
        p.set_value_at_time(1.0, 0.01);
        p.set_value_at_time(2.0, 0.05);
        p.cancel_scheduled_values(0.02);
        assert_eq!(p.pending_events().len(), 1);
        assert_eq!(run(&mut p, 0, 100), 1.0);
    }
}
