//! Rewrites a MIDI stream so a 12-TET receiver plays the mapped tuning.
//!
//! Each note-on/off becomes a channel pitch bend followed by the nearest
//! standard note, both at the original offset. The receiver is assumed
//! to bend ±200 cents.

use crate::mapper::PitchMapper;
use crate::midi::{MidiEvent, MidiMessage};

const CHANNELS: usize = 16;
const NOTES: usize = 128;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Held {
    note: u8,
    bend: u16,
}

/// Stateful pitch-bend retuner.
///
/// Remembers which substitute note each held key was sent as, so its
/// note-off reaches the same note even if the tuning changed in between.
#[derive(Clone, Debug)]
pub struct Retuner {
    held: Box<[[Option<Held>; NOTES]; CHANNELS]>,
    held_total: usize,
}

impl Default for Retuner {
    fn default() -> Self {
        Self::new()
    }
}

impl Retuner {
    /// Retuner with no notes held.
    pub fn new() -> Self {
        Self { held: Box::new([[None; NOTES]; CHANNELS]), held_total: 0 }
    }

    /// Forget held substitutions.
    pub fn reset(&mut self) {
        for channel in self.held.iter_mut() {
            channel.fill(None);
        }
        self.held_total = 0;
    }

    /// Number of keys currently held through a substitution.
    pub fn held_count(&self) -> usize {
        self.held_total
    }

    /// Rewrite `input` into `output` (appended, not cleared).
    ///
    /// With a mapper that does not retune, events are copied unchanged.
    /// Unmapped notes and non-note messages pass through.
    pub fn process(
        &mut self,
        mapper: &PitchMapper,
        input: &[MidiEvent],
        output: &mut Vec<MidiEvent>,
    ) {
        let retuning = mapper.is_retuning();
        for event in input {
            if !retuning && self.held_total == 0 {
                output.push(*event);
                continue;
            }
            self.process_event(mapper, *event, output);
        }
    }

    fn process_event(
        &mut self,
        mapper: &PitchMapper,
        event: MidiEvent,
        output: &mut Vec<MidiEvent>,
    ) {
        let offset = event.offset;
        match event.message {
            MidiMessage::NoteOn { channel, note, velocity } => {
                let Some(r) = mapper.is_retuning().then(|| mapper.retune(note)).flatten() else {
                    output.push(event);
                    return;
                };
                let (ch, key) = (usize::from(channel & 0x0F), usize::from(note & 0x7F));
                if self.held[ch][key].replace(Held { note: r.note, bend: r.pitch_bend }).is_none() {
                    self.held_total += 1;
                }
                let bend = MidiMessage::PitchBend { channel, value: r.pitch_bend };
                let note_on = MidiMessage::NoteOn { channel, note: r.note, velocity };
                output.push(MidiEvent::new(offset, bend));
                output.push(MidiEvent::new(offset, note_on));
            }
            MidiMessage::NoteOff { channel, note, velocity } => {
                let (ch, key) = (usize::from(channel & 0x0F), usize::from(note & 0x7F));
                let released = self.held[ch][key].take();
                if released.is_some() {
                    self.held_total -= 1;
                }
                let held = released.or_else(|| {
                    mapper
                        .is_retuning()
                        .then(|| mapper.retune(note))
                        .flatten()
                        .map(|r| Held { note: r.note, bend: r.pitch_bend })
                });
                match held {
                    Some(Held { note: substitute, bend }) => {
                        let message = MidiMessage::PitchBend { channel, value: bend };
                        output.push(MidiEvent::new(offset, message));
                        output.push(MidiEvent::new(
                            offset,
                            MidiMessage::NoteOff { channel, note: substitute, velocity },
                        ));
                    }
                    None => output.push(event),
                }
            }
            _ => output.push(event),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapper::PITCH_BEND_CENTER;
    use crate::scl::{ParseMode, Scale};

    fn just_mapper() -> PitchMapper {
        let scale = Scale::parse("Fifth\n2\n3/2\n2/1\n", ParseMode::Strict).unwrap();
        PitchMapper::new().with_scale(scale)
    }

    #[test]
    fn bend_precedes_substituted_note() {
        let mut retuner = Retuner::new();
        let mut out = Vec::new();
        retuner.process(&just_mapper(), &[MidiEvent::note_on(5, 0, 61, 100)], &mut out);

        assert_eq!(out.len(), 2);
        assert_eq!(out[0].offset, 5);
        assert_eq!(out[1].offset, 5);
        let MidiMessage::PitchBend { value, .. } = out[0].message else {
            panic!("expected pitch bend first, got {:?}", out[0].message);
        };
        assert!(value > PITCH_BEND_CENTER);
        assert_eq!(out[1].message, MidiMessage::NoteOn { channel: 0, note: 67, velocity: 100 });
    }

    #[test]
    fn note_off_follows_held_substitution() {
        let mut retuner = Retuner::new();
        let mut out = Vec::new();
        retuner.process(&just_mapper(), &[MidiEvent::note_on(0, 2, 61, 90)], &mut out);
        assert_eq!(retuner.held_count(), 1);

        out.clear();
        // Tuning switched back to 12-TET while the key was down.
        retuner.process(&PitchMapper::new(), &[MidiEvent::note_off(10, 2, 61)], &mut out);
        assert_eq!(out.len(), 2);
        assert_eq!(out[1].message, MidiMessage::NoteOff { channel: 2, note: 67, velocity: 0 });
        assert_eq!(retuner.held_count(), 0);
    }

    #[test]
    fn equal_temperament_passes_through() {
        let mut retuner = Retuner::new();
        let input = [MidiEvent::note_on(0, 0, 60, 100), MidiEvent::note_off(64, 0, 60)];
        let mut out = Vec::new();
        retuner.process(&PitchMapper::new(), &input, &mut out);
        assert_eq!(out, input);
    }

    #[test]
    fn non_note_messages_untouched() {
        let mut retuner = Retuner::new();
        let cc = MidiEvent::new(
            3,
            MidiMessage::ControlChange { channel: 0, controller: 1, value: 64 },
        );
        let mut out = Vec::new();
        retuner.process(&just_mapper(), &[cc], &mut out);
        assert_eq!(out, [cc]);
    }

    #[test]
    fn unmapped_notes_pass_through() {
        use crate::kbm::KeyboardMapping;
        let kbm = KeyboardMapping::parse("0\n60\n72\n60\n60\n261.6\n0\n").unwrap();
        let mapper = PitchMapper::new().with_keyboard_mapping(kbm);
        let mut retuner = Retuner::new();
        let event = MidiEvent::note_on(0, 0, 40, 100);
        let mut out = Vec::new();
        retuner.process(&mapper, &[event], &mut out);
        assert_eq!(out, [event]);
        assert_eq!(retuner.held_count(), 0);
    }
}
