//! Scala keyboard mappings (`.kbm`).
//!
//! Seven header values, then one entry per key in the mapping pattern:
//!
//! | # | Field |
//! |---|-------|
//! | 1 | map size (0 = linear, every key is the next degree) |
//! | 2 | first MIDI note to retune |
//! | 3 | last MIDI note to retune |
//! | 4 | middle note, where the first mapping entry starts |
//! | 5 | reference note, the key tuned to the reference frequency |
//! | 6 | reference frequency in Hz |
//! | 7 | scale degree that acts as the formal octave |
//!
//! Entries are scale degrees or `x` for an unmapped key. Fewer entries
//! than the map size leave the remaining keys unmapped. The map size may
//! not exceed [`MAX_MAP_SIZE`].

use std::path::Path;

use crate::error::{Result, TuningError};
use crate::scl::Scale;

/// Largest accepted map size: one slot per MIDI key.
pub const MAX_MAP_SIZE: usize = 128;

/// A parsed keyboard mapping.
#[derive(Clone, Debug, PartialEq)]
pub struct KeyboardMapping {
    map_size: usize,
    first_note: u8,
    last_note: u8,
    middle_note: u8,
    reference_note: u8,
    reference_frequency: f64,
    octave_degree: usize,
    mapping: Vec<Option<usize>>,
}

impl Default for KeyboardMapping {
    /// Linear mapping of the whole keyboard around middle C, with C4 at
    /// its 12-TET frequency.
    fn default() -> Self {
        Self::linear(60, 440.0 * 2f64.powf(-9.0 / 12.0))
    }
}

fn parse_note(line: usize, token: &str, field: &str) -> Result<u8> {
    match token.parse::<u8>() {
        Ok(n) if n <= 127 => Ok(n),
        _ => Err(TuningError::keyboard_mapping(
            line,
            format!("{field} '{token}' is not a MIDI note"),
        )),
    }
}

impl KeyboardMapping {
    /// Whole keyboard, one degree per key, `reference_note` sounding at
    /// `reference_frequency`. The reference note is also the middle note.
    pub fn linear(reference_note: u8, reference_frequency: f64) -> Self {
        let reference_note = reference_note.min(127);
        Self {
            map_size: 0,
            first_note: 0,
            last_note: 127,
            middle_note: reference_note,
            reference_note,
            reference_frequency,
            octave_degree: 0,
            mapping: Vec::new(),
        }
    }

    /// Parse `.kbm` text.
    pub fn parse(text: &str) -> Result<Self> {
        let mut header: Vec<(usize, &str)> = Vec::with_capacity(7);
        let mut entries: Vec<(usize, &str)> = Vec::new();

        for (idx, raw) in text.lines().enumerate() {
            let content = raw.trim();
            if content.is_empty() || content.starts_with('!') {
                continue;
            }
            let token = content.split_whitespace().next().unwrap_or(content);
            if header.len() < 7 {
                header.push((idx + 1, token));
            } else {
                entries.push((idx + 1, token));
            }
        }

        if header.len() < 7 {
            return Err(TuningError::keyboard_mapping(
                0,
                format!("expected 7 header values, found {}", header.len()),
            ));
        }

        let (line, token) = header[0];
        let map_size = token.parse::<usize>().map_err(|_| {
            TuningError::keyboard_mapping(line, format!("map size '{token}' is not a count"))
        })?;
        if map_size > MAX_MAP_SIZE {
            return Err(TuningError::keyboard_mapping(
                line,
                format!("map size {map_size} exceeds {MAX_MAP_SIZE}"),
            ));
        }
        let first_note = parse_note(header[1].0, header[1].1, "first note")?;
        let last_note = parse_note(header[2].0, header[2].1, "last note")?;
        let middle_note = parse_note(header[3].0, header[3].1, "middle note")?;
        let reference_note = parse_note(header[4].0, header[4].1, "reference note")?;
        let (line, token) = header[5];
        let reference_frequency = match token.parse::<f64>() {
            Ok(f) if f.is_finite() && f > 0.0 => f,
            _ => {
                return Err(TuningError::keyboard_mapping(
                    line,
                    format!("reference frequency '{token}' is not a positive number"),
                ));
            }
        };
        let (line, token) = header[6];
        let octave_degree = token.parse::<usize>().map_err(|_| {
            TuningError::keyboard_mapping(line, format!("octave degree '{token}' is not a count"))
        })?;

        if first_note > last_note {
            return Err(TuningError::keyboard_mapping(
                header[2].0,
                format!("last note {last_note} is below first note {first_note}"),
            ));
        }
        if entries.len() > map_size {
            return Err(TuningError::keyboard_mapping(
                entries[map_size].0,
                format!("{} entries for a map of size {map_size}", entries.len()),
            ));
        }

        let mut mapping = Vec::with_capacity(map_size);
        for &(line, token) in &entries {
            if token.eq_ignore_ascii_case("x") {
                mapping.push(None);
            } else {
                let degree = token.parse::<usize>().map_err(|_| {
                    let reason = format!("entry '{token}' is not a degree or 'x'");
                    TuningError::keyboard_mapping(line, reason)
                })?;
                mapping.push(Some(degree));
            }
        }
        mapping.resize(map_size, None);

        Ok(Self {
            map_size,
            first_note,
            last_note,
            middle_note,
            reference_note,
            reference_frequency,
            octave_degree,
            mapping,
        })
    }

    /// Read and parse a `.kbm` file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| TuningError::io(path, e))?;
        Self::parse(&text)
    }

    /// Pattern length; 0 is linear.
    pub fn map_size(&self) -> usize {
        self.map_size
    }

    /// Lowest retuned key.
    pub fn first_note(&self) -> u8 {
        self.first_note
    }

    /// Highest retuned key.
    pub fn last_note(&self) -> u8 {
        self.last_note
    }

    /// Key where the pattern starts at degree 0.
    pub fn middle_note(&self) -> u8 {
        self.middle_note
    }

    /// Key that sounds at [`reference_frequency`](Self::reference_frequency).
    pub fn reference_note(&self) -> u8 {
        self.reference_note
    }

    /// Frequency of the reference key.
    pub fn reference_frequency(&self) -> f64 {
        self.reference_frequency
    }

    /// Copy with a different reference frequency.
    pub fn with_reference_frequency(mut self, hz: f64) -> Self {
        if hz.is_finite() && hz > 0.0 {
            self.reference_frequency = hz;
        }
        self
    }

    /// Degree used as the formal octave; 0 means the scale's own period.
    pub fn octave_degree(&self) -> usize {
        self.octave_degree
    }

    /// Mapping entries, `None` for unmapped keys.
    pub fn entries(&self) -> &[Option<usize>] {
        &self.mapping
    }

    /// Ratio of `key` relative to the middle note, or `None` when the key
    /// is outside the retuned range or unmapped.
    pub fn relative_ratio(&self, key: u8, scale: &Scale) -> Option<f64> {
        if key < self.first_note || key > self.last_note {
            return None;
        }
        let offset = i64::from(key) - i64::from(self.middle_note);

        if self.map_size == 0 {
            return Some(scale.extended_ratio(offset));
        }

        let size = self.map_size as i64;
        let repeats = offset.div_euclid(size);
        let slot = offset.rem_euclid(size) as usize;
        let degree = self.mapping.get(slot).copied().flatten()?;

        let octave = if self.octave_degree == 0 {
            scale.period()
        } else {
            scale.extended_ratio(self.octave_degree as i64)
        };
        Some(scale.extended_ratio(degree as i64) * octave.powi(repeats as i32))
    }

    /// Frequency of `key` under `scale`, pinned so the reference note
    /// sounds at the reference frequency.
    pub fn frequency(&self, key: u8, scale: &Scale) -> Option<f64> {
        let ratio = self.relative_ratio(key, scale)?;
        let reference = self.reference_ratio(scale);
        Some(self.reference_frequency * ratio / reference)
    }

    fn reference_ratio(&self, scale: &Scale) -> f64 {
        // The reference key may itself be unmapped; fall back to its
        // linear position so the mapping stays usable.
        self.relative_ratio(self.reference_note, scale).unwrap_or_else(|| {
            scale.extended_ratio(i64::from(self.reference_note) - i64::from(self.middle_note))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scl::ParseMode;

    const WHITE_KEYS: &str = "! white keys only\n12\n0\n127\n60\n69\n440.0\n7\n\
                              0\nx\n1\nx\n2\n3\nx\n4\nx\n5\nx\n6\n";

    fn just_major() -> Scale {
        Scale::parse("Just\n7\n9/8\n5/4\n4/3\n3/2\n5/3\n15/8\n2/1\n", ParseMode::Strict).unwrap()
    }

    #[test]
    fn parses_header_and_entries() {
        let kbm = KeyboardMapping::parse(WHITE_KEYS).unwrap();
        assert_eq!(kbm.map_size(), 12);
        assert_eq!(kbm.middle_note(), 60);
        assert_eq!(kbm.reference_note(), 69);
        assert_eq!(kbm.reference_frequency(), 440.0);
        assert_eq!(kbm.octave_degree(), 7);
        assert_eq!(kbm.entries()[1], None);
        assert_eq!(kbm.entries()[11], Some(6));
    }

    #[test]
    fn unmapped_and_out_of_range_keys() {
        let kbm = KeyboardMapping::parse(WHITE_KEYS).unwrap();
        let scale = just_major();
        assert!(kbm.frequency(61, &scale).is_none());
        assert!(kbm.frequency(60, &scale).is_some());

        let narrow = KeyboardMapping::parse("0\n48\n72\n60\n60\n261.6\n0\n").unwrap();
        assert!(narrow.frequency(47, &scale).is_none());
        assert!(narrow.frequency(73, &scale).is_none());
        assert!(narrow.frequency(72, &scale).is_some());
    }

    #[test]
    fn reference_note_pins_frequency() {
        let kbm = KeyboardMapping::parse(WHITE_KEYS).unwrap();
        let scale = just_major();
        assert!((kbm.frequency(69, &scale).unwrap() - 440.0).abs() < 1e-9);
        // C is a major sixth (5/3) below A.
        assert!((kbm.frequency(60, &scale).unwrap() - 440.0 * 3.0 / 5.0).abs() < 1e-9);
        // One pattern up.
        assert!((kbm.frequency(72, &scale).unwrap() - 528.0).abs() < 1e-9);
    }

    #[test]
    fn linear_mapping_matches_scale_steps() {
        let kbm = KeyboardMapping::linear(60, 264.0);
        let scale = just_major();
        assert_eq!(kbm.frequency(60, &scale), Some(264.0));
        assert!((kbm.frequency(64, &scale).unwrap() - 396.0).abs() < 1e-9);
        assert!((kbm.frequency(53, &scale).unwrap() - 132.0).abs() < 1e-9);
    }

    #[test]
    fn short_entry_list_pads_with_unmapped() {
        let kbm = KeyboardMapping::parse("4\n0\n127\n60\n60\n261.6\n4\n0\n1\n").unwrap();
        assert_eq!(kbm.entries(), &[Some(0), Some(1), None, None]);
    }

    #[test]
    fn rejects_malformed_files() {
        assert!(matches!(
            KeyboardMapping::parse("12\n0\n127\n"),
            Err(TuningError::InvalidKeyboardMapping { line: 0, .. })
        ));
        assert!(matches!(
            KeyboardMapping::parse("1\n0\n127\n60\n60\n-5\n1\n0\n"),
            Err(TuningError::InvalidKeyboardMapping { line: 6, .. })
        ));
        assert!(matches!(
            KeyboardMapping::parse("1\n0\n200\n60\n60\n440\n1\n0\n"),
            Err(TuningError::InvalidKeyboardMapping { line: 3, .. })
        ));
        assert!(matches!(
            KeyboardMapping::parse("1\n0\n127\n60\n60\n440\n1\n0\n1\n"),
            Err(TuningError::InvalidKeyboardMapping { line: 9, .. })
        ));
        assert!(KeyboardMapping::parse("1\n0\n127\n60\n60\n440\n1\nq\n").is_err());
    }

    #[test]
    fn oversized_map_is_rejected_before_allocating() {
        let huge = "4000000000000000\n0\n127\n60\n69\n440.0\n0\n";
        let err = KeyboardMapping::parse(huge).unwrap_err();
        match err {
            TuningError::InvalidKeyboardMapping { line, reason } => {
                assert_eq!(line, 1);
                assert!(reason.contains("exceeds 128"), "{reason}");
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let after_comment = "! huge\n! still huge\n129\n0\n127\n60\n69\n440.0\n0\n";
        assert!(matches!(
            KeyboardMapping::parse(after_comment),
            Err(TuningError::InvalidKeyboardMapping { line: 3, .. })
        ));
    }

    #[test]
    fn largest_map_is_accepted() {
        let text = format!("{MAX_MAP_SIZE}\n0\n127\n0\n69\n440.0\n{MAX_MAP_SIZE}\n");
        let kbm = KeyboardMapping::parse(&text).unwrap();
        assert_eq!(kbm.entries().len(), MAX_MAP_SIZE);
        assert!(kbm.entries().iter().all(Option::is_none));
    }

    #[test]
    fn malformed_header_fields_report_their_line() {
        let cases = [
            ("-3\n0\n127\n60\n69\n440.0\n0\n", 1),
            ("0\nC4\n127\n60\n69\n440.0\n0\n", 2),
            ("0\n0\n127\n128\n69\n440.0\n0\n", 4),
            ("0\n0\n127\n60\n69\nNaN\n0\n", 6),
            ("0\n0\n127\n60\n69\n0\n0\n", 6),
            ("0\n0\n127\n60\n69\n440.0\n-1\n", 7),
            ("0\n100\n20\n60\n69\n440.0\n0\n", 3),
        ];
        for (text, expected) in cases {
            match KeyboardMapping::parse(text) {
                Err(TuningError::InvalidKeyboardMapping { line, .. }) => {
                    assert_eq!(line, expected, "{text:?}");
                }
                other => panic!("{text:?} gave {other:?}"),
            }
        }
    }
}
