//! Glottis Tuning - microtonal pitch mapping
//!
//! Loads Scala scale (`.scl`) and keyboard-mapping (`.kbm`) files and turns
//! MIDI note numbers into frequencies under them. For receivers that only
//! know 12-TET, the [`Retuner`] rewrites a MIDI stream into nearest-note
//! plus pitch-bend pairs.
//!
//! # Pieces
//!
//! - [`Scale`] / [`ScaleDegree`] - `.scl` parser with [`ParseMode`] strict/lenient
//! - [`KeyboardMapping`] - `.kbm` parser
//! - [`PitchMapper`] - note to frequency, frequency to note and bend
//! - [`MidiMessage`] / [`MidiEvent`] - sample-stamped MIDI
//! - [`Retuner`] - pitch-bend retuning of a MIDI stream
//! - [`SharedTuning`] - atomically swapped current mapper
//! - [`ScaleLoader`] - background loading with [`LoadOutcome`] notifications
//!
//! # Example
//!
//! ```rust
//! use glottis_tuning::{ParseMode, PitchMapper, Scale, ScaleDegree};
//!
//! let scale = Scale::parse("Test\n2\n3/2\n700.0\n", ParseMode::Strict).unwrap();
//! assert_eq!(scale.len(), 3);
//! let fifth = scale.index_of(&ScaleDegree::ratio_of(3, 2)).unwrap();
//! assert_eq!(scale.ratio(fifth), Some(1.5));
//!
//! let mapper = PitchMapper::new().with_scale(scale);
//! let retuned = mapper.retune(61).unwrap();
//! assert_eq!(retuned.note, 67);
//! ```

mod error;
pub mod kbm;
pub mod loader;
pub mod mapper;
pub mod midi;
pub mod retune;
pub mod scl;
pub mod shared;

pub use error::{Result, TuningError};
pub use kbm::{KeyboardMapping, MAX_MAP_SIZE};
pub use loader::{LoadOutcome, ScaleLoader};
pub use mapper::{
    BEND_RANGE_CENTS, MIDDLE_NOTE, PITCH_BEND_CENTER, PITCH_BEND_MAX, PitchMapper, Retuning,
    cents_between, equal_temperament_frequency, nearest_note, pitch_bend_for_cents,
};
pub use midi::{MidiEvent, MidiMessage};
pub use retune::Retuner;
pub use scl::{ParseMode, Scale, ScaleDegree};
pub use shared::SharedTuning;
