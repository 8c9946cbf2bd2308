//! Rotary control geometry.
//!
//! A knob sweeps 270°, from [`START_OFFSET_DEGREES`] (−135°, lower-left) to
//! [`END_DEGREES`] (+135°, lower-right), with 0° pointing straight up at the
//! midpoint of the value range. The mapping between a bounded value and its
//! indicator angle is linear in both directions:
//!
//! ```text
//! angle = (value - min) / (max - min) * 270 - 135
//! value = min + (clamp(angle, -135, 135) + 135) / 270 * (max - min)
//! ```
//!
//! Angles outside the sweep saturate to an endpoint value; they never wrap.
//! Pointer geometry (where the knob sits on screen) is not handled here apart
//! from [`pointer_angle`], the `atan2` helper drag tracking is built on.

use core::f32::consts::PI;
use libm::atan2f;

/// Total angular sweep of a knob in degrees.
pub const SWEEP_DEGREES: f32 = 270.0;

/// Indicator angle at the minimum value, in degrees.
pub const START_OFFSET_DEGREES: f32 = -135.0;

/// Indicator angle at the maximum value, in degrees.
pub const END_DEGREES: f32 = START_OFFSET_DEGREES + SWEEP_DEGREES;

/// Map `value` in `[min, max]` to an indicator angle in degrees.
///
/// `min` must be strictly less than `max`. The result lies in
/// `[START_OFFSET_DEGREES, END_DEGREES]` for any value inside the range.
///
/// # Example
///
/// ```rust
/// use sintetico_core::value_to_angle;
///
/// assert_eq!(value_to_angle(20.0, 20.0, 2000.0), -135.0);
/// assert_eq!(value_to_angle(1010.0, 20.0, 2000.0), 0.0);
/// assert_eq!(value_to_angle(2000.0, 20.0, 2000.0), 135.0);
/// ```
#[inline]
pub fn value_to_angle(value: f32, min: f32, max: f32) -> f32 {
    let normalized = (value - min) / (max - min);
    normalized * SWEEP_DEGREES + START_OFFSET_DEGREES
}

/// Map an indicator angle in degrees back to a value in `[min, max]`.
///
/// The angle is clamped to the sweep first, so anything past either end
/// saturates to `min` or `max`.
#[inline]
pub fn angle_to_value(angle_degrees: f32, min: f32, max: f32) -> f32 {
    let angle = angle_degrees.clamp(START_OFFSET_DEGREES, END_DEGREES);
    if angle <= START_OFFSET_DEGREES {
        return min;
    }
    if angle >= END_DEGREES {
        return max;
    }
    let normalized = (angle - START_OFFSET_DEGREES) / SWEEP_DEGREES;
    min + normalized * (max - min)
}

/// Fold a raw angular delta (degrees) into `(-180, 180]`.
///
/// Two `atan2` readings each lie in `(-180°, 180°]`, so their difference lies
/// in `(-360°, 360°)`; one correction of ±360° is always enough. This keeps a
/// pointer crossing the ±180° discontinuity from reading as a near-full turn.
///
/// # Example
///
/// ```rust
/// use sintetico_core::normalize_delta_degrees;
///
/// assert_eq!(normalize_delta_degrees(200.0), -160.0);
/// assert_eq!(normalize_delta_degrees(-200.0), 160.0);
/// assert_eq!(normalize_delta_degrees(180.0), 180.0);
/// ```
#[inline]
pub fn normalize_delta_degrees(delta: f32) -> f32 {
    if delta > 180.0 {
        delta - 360.0
    } else if delta <= -180.0 {
        delta + 360.0
    } else {
        delta
    }
}

/// Angle in radians of `(x, y)` around `(center_x, center_y)`.
#[inline]
pub fn pointer_angle(x: f32, y: f32, center_x: f32, center_y: f32) -> f32 {
    atan2f(y - center_y, x - center_x)
}

/// Convert radians to degrees.
#[inline]
pub fn to_degrees(radians: f32) -> f32 {
    radians * 180.0 / PI
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIN: f32 = 20.0;
    const MAX: f32 = 2000.0;

    #[test]
    fn endpoints_are_exact_inverses() {
        assert_eq!(angle_to_value(value_to_angle(MIN, MIN, MAX), MIN, MAX), MIN);
        assert_eq!(angle_to_value(value_to_angle(MAX, MIN, MAX), MIN, MAX), MAX);
    }

    #[test]
    fn midpoint_points_straight_up() {
        assert_eq!(value_to_angle(1010.0, MIN, MAX), 0.0);
        assert_eq!(angle_to_value(0.0, MIN, MAX), 1010.0);
    }

    #[test]
    fn angles_past_the_sweep_saturate() {
        assert_eq!(angle_to_value(-170.0, MIN, MAX), MIN);
        assert_eq!(angle_to_value(400.0, MIN, MAX), MAX);
        assert_eq!(angle_to_value(f32::NEG_INFINITY, MIN, MAX), MIN);
    }

    #[test]
    fn delta_folding_only_touches_out_of_range_deltas() {
        assert_eq!(normalize_delta_degrees(200.0), -160.0);
        assert_eq!(normalize_delta_degrees(-200.0), 160.0);
        assert_eq!(normalize_delta_degrees(-180.0), 180.0);
        for delta in [-179.5, -90.0, 0.0, 45.0, 179.9, 180.0] {
            assert_eq!(normalize_delta_degrees(delta), delta);
        }
    }

    #[test]
    fn pointer_angle_follows_screen_axes() {
        // Screen y grows downward, so "below the center" is +90°.
        assert!((to_degrees(pointer_angle(10.0, 0.0, 0.0, 0.0))).abs() < 1e-4);
        assert!((to_degrees(pointer_angle(0.0, 10.0, 0.0, 0.0)) - 90.0).abs() < 1e-4);
        assert!((to_degrees(pointer_angle(-10.0, 0.0, 0.0, 0.0)).abs() - 180.0).abs() < 1e-4);
    }
}
