//! MIDI note to frequency, and frequency to note plus pitch bend.
//!
//! With nothing loaded, notes map to 12-TET (A4 = 440 Hz). With a scale
//! and no keyboard mapping, note 60 is degree 0 at the reference
//! frequency and the scale repeats every `degree_count()` keys at a 2/1
//! octave:
//!
//! ```text
//! offset  = note - 60
//! octaves = floor(offset / len)
//! degree  = offset mod len          (non-negative)
//! freq    = reference * ratio(degree) * 2^octaves
//! ```
//!
//! A keyboard mapping replaces that layout with its own range, pattern,
//! reference key, and formal octave.

use glottis_synth::NoteTuning;

use crate::kbm::KeyboardMapping;
use crate::scl::Scale;

/// Key that plays degree 0 without a keyboard mapping.
pub const MIDDLE_NOTE: u8 = 60;
/// Pitch-bend value with no bend.
pub const PITCH_BEND_CENTER: u16 = 8192;
/// Largest 14-bit pitch-bend value.
pub const PITCH_BEND_MAX: u16 = 16383;
/// Bend range assumed on the receiving side, in cents each way.
pub const BEND_RANGE_CENTS: f64 = 200.0;

/// 12-TET frequency of a (possibly fractional) note number.
pub fn equal_temperament_frequency(note: f64) -> f64 {
    440.0 * 2f64.powf((note - 69.0) / 12.0)
}

/// Nearest standard note to `frequency`, clamped to 0..=127.
pub fn nearest_note(frequency: f64) -> u8 {
    if frequency.is_nan() || frequency <= 0.0 {
        return 0;
    }
    let note = (69.0 + 12.0 * (frequency / 440.0).log2()).round();
    note.clamp(0.0, 127.0) as u8
}

/// Interval from `reference` up to `target`, in cents.
pub fn cents_between(target: f64, reference: f64) -> f64 {
    1200.0 * (target / reference).log2()
}

/// 14-bit pitch bend for a deviation in cents, assuming a ±200 cent range.
pub fn pitch_bend_for_cents(cents: f64) -> u16 {
    if cents.is_nan() {
        return PITCH_BEND_CENTER;
    }
    let value = f64::from(PITCH_BEND_CENTER) + (cents / BEND_RANGE_CENTS * 8191.0).round();
    value.clamp(0.0, f64::from(PITCH_BEND_MAX)) as u16
}

/// How one note is realized on a 12-TET receiver.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Retuning {
    /// Frequency the mapper wants.
    pub target_frequency: f64,
    /// Nearest standard note.
    pub note: u8,
    /// Deviation of the target from that note.
    pub cents: f64,
    /// Bend that closes the deviation.
    pub pitch_bend: u16,
}

/// Resolves note numbers under the current scale and keyboard mapping.
///
/// Immutable once built; a new scale produces a new mapper.
///
/// # Example
///
/// ```rust
/// use glottis_tuning::{ParseMode, PitchMapper, Scale};
///
/// let scale = Scale::parse("Fifths\n2\n3/2\n2/1\n", ParseMode::Strict).unwrap();
/// let mapper = PitchMapper::new().with_scale(scale).with_reference_frequency(Some(200.0));
///
/// assert_eq!(mapper.midi_note_to_frequency(60), Some(200.0));
/// assert_eq!(mapper.midi_note_to_frequency(61), Some(300.0));
/// assert_eq!(mapper.midi_note_to_frequency(62), Some(400.0));
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct PitchMapper {
    scale: Option<Scale>,
    mapping: Option<KeyboardMapping>,
    reference_override: Option<f64>,
    equal: Scale,
}

impl Default for PitchMapper {
    fn default() -> Self {
        Self::new()
    }
}

impl PitchMapper {
    /// 12-TET mapper with nothing loaded.
    pub fn new() -> Self {
        Self {
            scale: None,
            mapping: None,
            reference_override: None,
            equal: Scale::equal_temperament(12),
        }
    }

    /// Copy using `scale`.
    pub fn with_scale(mut self, scale: Scale) -> Self {
        self.scale = Some(scale);
        self
    }

    /// Copy with no scale.
    pub fn without_scale(mut self) -> Self {
        self.scale = None;
        self
    }

    /// Copy using `mapping`.
    pub fn with_keyboard_mapping(mut self, mapping: KeyboardMapping) -> Self {
        self.mapping = Some(mapping);
        self
    }

    /// Copy with no keyboard mapping.
    pub fn without_keyboard_mapping(mut self) -> Self {
        self.mapping = None;
        self
    }

    /// Copy with the reference frequency overridden. `None`, zero, or a
    /// non-finite value restores the default.
    pub fn with_reference_frequency(mut self, hz: Option<f64>) -> Self {
        self.reference_override = hz.filter(|f| f.is_finite() && *f > 0.0);
        self
    }

    /// Loaded scale.
    pub fn scale(&self) -> Option<&Scale> {
        self.scale.as_ref()
    }

    /// Loaded keyboard mapping.
    pub fn keyboard_mapping(&self) -> Option<&KeyboardMapping> {
        self.mapping.as_ref()
    }

    /// Whether notes are mapped differently from plain 12-TET.
    pub fn is_retuning(&self) -> bool {
        self.scale.is_some() || self.mapping.is_some()
    }

    /// Frequency given to the reference key.
    pub fn reference_frequency(&self) -> f64 {
        if let Some(hz) = self.reference_override {
            return hz;
        }
        match &self.mapping {
            Some(mapping) => mapping.reference_frequency(),
            None => equal_temperament_frequency(f64::from(MIDDLE_NOTE)),
        }
    }

    /// Frequency for `note`, or `None` when a keyboard mapping leaves it
    /// unmapped.
    pub fn midi_note_to_frequency(&self, note: u8) -> Option<f64> {
        if let Some(mapping) = &self.mapping {
            let scale = self.scale.as_ref().unwrap_or(&self.equal);
            let ratio = mapping.frequency(note, scale)? / mapping.reference_frequency();
            return Some(self.reference_frequency() * ratio);
        }

        let Some(scale) = self.scale.as_ref().filter(|s| s.degree_count() > 0) else {
            return Some(equal_temperament_frequency(f64::from(note)));
        };

        let len = scale.degree_count() as i64;
        let offset = i64::from(note) - i64::from(MIDDLE_NOTE);
        let octaves = offset.div_euclid(len);
        let degree = offset.rem_euclid(len) as usize;
        let ratio = scale.ratio(degree).unwrap_or(1.0);
        Some(self.reference_frequency() * ratio * 2f64.powi(octaves as i32))
    }

    /// Nearest standard note and bend for `note`, or `None` if unmapped.
    pub fn retune(&self, note: u8) -> Option<Retuning> {
        let target_frequency = self.midi_note_to_frequency(note)?;
        let nearest = nearest_note(target_frequency);
        let nearest_frequency = equal_temperament_frequency(f64::from(nearest));
        let cents = cents_between(target_frequency, nearest_frequency);
        Some(Retuning {
            target_frequency,
            note: nearest,
            cents,
            pitch_bend: pitch_bend_for_cents(cents),
        })
    }
}

impl NoteTuning for PitchMapper {
    fn frequency(&self, note: u8) -> Option<f32> {
        self.midi_note_to_frequency(note).map(|f| f as f32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scl::{ParseMode, ScaleDegree};

    fn scale(text: &str) -> Scale {
        Scale::parse(text, ParseMode::Strict).unwrap()
    }

    #[test]
    fn no_scale_is_equal_temperament() {
        let mapper = PitchMapper::new();
        for n in 0..=127u8 {
            let expected = 440.0 * 2f64.powf((f64::from(n) - 69.0) / 12.0);
            let got = mapper.midi_note_to_frequency(n).unwrap();
            assert!((got - expected).abs() < 1e-9 * expected);
        }
        assert!(!mapper.is_retuning());
    }

    #[test]
    fn negative_offsets_wrap_downward() {
        let mapper = PitchMapper::new()
            .with_scale(scale("x\n3\n5/4\n3/2\n2/1\n"))
            .with_reference_frequency(Some(100.0));
        // 59 = degree 2 of the octave below
        assert!((mapper.midi_note_to_frequency(59).unwrap() - 75.0).abs() < 1e-9);
        assert!((mapper.midi_note_to_frequency(57).unwrap() - 50.0).abs() < 1e-9);
        assert!((mapper.midi_note_to_frequency(63).unwrap() - 200.0).abs() < 1e-9);
    }

    #[test]
    fn default_reference_is_middle_c() {
        let mapper = PitchMapper::new().with_scale(Scale::equal_temperament(12));
        let c4 = mapper.midi_note_to_frequency(60).unwrap();
        assert!((c4 - 261.6256).abs() < 1e-3);
        let a4 = mapper.midi_note_to_frequency(69).unwrap();
        assert!((a4 - 440.0).abs() < 1e-6);
    }

    #[test]
    fn empty_scale_falls_back_to_equal_temperament() {
        let mapper = PitchMapper::new().with_scale(Scale::from_degrees("none", Vec::new()));
        assert_eq!(mapper.midi_note_to_frequency(69), Some(440.0));
    }

    #[test]
    fn slightly_flat_c_bends_below_center() {
        let cents = cents_between(261.0, equal_temperament_frequency(60.0));
        assert!(cents < 0.0 && cents > -5.0);
        assert_eq!(nearest_note(261.0), 60);
        let bend = pitch_bend_for_cents(cents);
        assert!(bend < PITCH_BEND_CENTER && bend > PITCH_BEND_CENTER - 200);
    }

    #[test]
    fn bend_quantization_endpoints() {
        assert_eq!(pitch_bend_for_cents(0.0), 8192);
        assert_eq!(pitch_bend_for_cents(200.0), 16383);
        assert_eq!(pitch_bend_for_cents(-200.0), 1);
        assert_eq!(pitch_bend_for_cents(-1000.0), 0);
        assert_eq!(pitch_bend_for_cents(1000.0), 16383);
        assert_eq!(pitch_bend_for_cents(f64::NAN), 8192);
    }

    #[test]
    fn nearest_note_clamps() {
        assert_eq!(nearest_note(1.0), 0);
        assert_eq!(nearest_note(50_000.0), 127);
        assert_eq!(nearest_note(0.0), 0);
        assert_eq!(nearest_note(440.0), 69);
    }

    #[test]
    fn retune_just_fifth() {
        let mapper = PitchMapper::new().with_scale(Scale::from_degrees(
            "fifth",
            vec![ScaleDegree::ratio_of(3, 2), ScaleDegree::ratio_of(2, 1)],
        ));
        let r = mapper.retune(61).unwrap();
        // 1.5 x C4 is two cents above G4
        assert_eq!(r.note, 67);
        assert!((r.cents - 1.955).abs() < 0.01);
        assert!(r.pitch_bend > PITCH_BEND_CENTER);
    }

    #[test]
    fn keyboard_mapping_controls_range_and_reference() {
        let kbm = KeyboardMapping::parse("0\n60\n72\n60\n69\n432.0\n0\n").unwrap();
        let mapper = PitchMapper::new().with_keyboard_mapping(kbm);
        assert!(mapper.midi_note_to_frequency(59).is_none());
        assert!((mapper.midi_note_to_frequency(69).unwrap() - 432.0).abs() < 1e-9);
        assert!(mapper.retune(59).is_none());

        let overridden = mapper.with_reference_frequency(Some(440.0));
        assert!((overridden.midi_note_to_frequency(69).unwrap() - 440.0).abs() < 1e-9);
    }

    #[test]
    fn note_tuning_seam() {
        let mapper = PitchMapper::new();
        assert_eq!(NoteTuning::frequency(&mapper, 69), Some(440.0));
    }
}
