//! Small numeric helpers shared by the signal chain.

/// Flush denormal (subnormal) floating-point values to zero.
///
/// Filter integrator state decays toward zero when the input goes silent;
/// once it enters the subnormal range, arithmetic on some CPUs becomes very
/// slow. Anything below `1e-20` is inaudible and is snapped to `0.0`.
#[allow(clippy::inline_always)]
#[inline(always)]
pub fn flush_denormal(x: f32) -> f32 {
    if libm::fabsf(x) < 1e-20 { 0.0 } else { x }
}

/// Convert a MIDI note number to frequency in Hz (A4 = note 69 = 440 Hz).
#[inline]
pub fn midi_to_freq(note: u8) -> f32 {
    440.0 * libm::powf(2.0, (note as f32 - 69.0) / 12.0)
}
