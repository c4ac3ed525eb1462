//! Note-to-frequency seam between the voice pool and a tuning source.

use glottis_core::midi_to_freq;

/// Resolves a MIDI note number to a frequency.
///
/// `None` means the note is unmapped and should not sound.
pub trait NoteTuning {
    /// Frequency in Hz for `note`.
    fn frequency(&self, note: u8) -> Option<f32>;
}

/// Standard 12-TET, A4 = 440 Hz. Every note is mapped.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EqualTemperament;

impl NoteTuning for EqualTemperament {
    fn frequency(&self, note: u8) -> Option<f32> {
        Some(midi_to_freq(f32::from(note)))
    }
}

impl<T: NoteTuning + ?Sized> NoteTuning for &T {
    fn frequency(&self, note: u8) -> Option<f32> {
        (**self).frequency(note)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_temperament_reference_points() {
        let et = EqualTemperament;
        assert_eq!(et.frequency(69), Some(440.0));
        let c4 = et.frequency(60).unwrap_or_default();
        assert!((c4 - 261.6256).abs() < 0.01);
    }
}
