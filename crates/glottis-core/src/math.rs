//! Mathematical utility functions for DSP and pitch work.
//!
//! All functions are allocation-free and suitable for `no_std`.
//!
//! - [`soft_limit`] - tanh saturation scaled to an arbitrary ceiling
//! - [`flush_denormal`] - zero out subnormal filter state
//! - [`midi_to_freq`] - 12-TET conversion around A4 = 440 Hz

use libm::{powf, tanhf};

/// Frequency of MIDI note 69 (A4) in 12-TET.
pub const A4_FREQUENCY: f32 = 440.0;

/// MIDI note number of A4.
pub const A4_NOTE: f32 = 69.0;

/// Soft clip to `(-ceiling, ceiling)`.
///
/// Near-linear for small inputs; never reaches the ceiling.
///
/// ```rust
/// use glottis_core::soft_limit;
///
/// assert!(soft_limit(10.0, 0.95) < 0.95);
/// assert!((soft_limit(0.01, 0.95) - 0.01).abs() < 1e-4);
/// ```
#[inline]
pub fn soft_limit(x: f32, ceiling: f32) -> f32 {
    ceiling * tanhf(x / ceiling)
}

/// Flush denormal (subnormal) floats to zero.
///
/// Filter feedback decaying toward zero enters the subnormal range, where
/// arithmetic is drastically slower on most CPUs. Values below 1e-20 are
/// replaced with zero.
#[allow(clippy::inline_always)]
#[inline(always)]
pub fn flush_denormal(x: f32) -> f32 {
    if x.abs() < 1e-20 { 0.0 } else { x }
}

/// Converts a (possibly fractional) MIDI note number to 12-TET frequency.
///
/// ```rust
/// use glottis_core::midi_to_freq;
///
/// assert!((midi_to_freq(69.0) - 440.0).abs() < 1e-3);
/// assert!((midi_to_freq(60.0) - 261.6256).abs() < 1e-3);
/// ```
#[inline]
pub fn midi_to_freq(note: f32) -> f32 {
    A4_FREQUENCY * powf(2.0, (note - A4_NOTE) / 12.0)
}

/// Peak absolute value of a slice.
#[inline]
pub fn peak(samples: &[f32]) -> f32 {
    samples.iter().fold(0.0f32, |acc, &s| acc.max(s.abs()))
}
