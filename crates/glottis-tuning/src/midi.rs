//! Channel-voice MIDI messages stamped with a sample offset.

/// A decoded MIDI message. Channels are 0-based.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MidiMessage {
    /// Key pressed. Velocity is never zero; see [`from_bytes`](Self::from_bytes).
    NoteOn {
        /// Channel 0..=15.
        channel: u8,
        /// Note 0..=127.
        note: u8,
        /// Velocity 1..=127.
        velocity: u8,
    },
    /// Key released.
    NoteOff {
        /// Channel 0..=15.
        channel: u8,
        /// Note 0..=127.
        note: u8,
        /// Release velocity.
        velocity: u8,
    },
    /// Pitch wheel, 14-bit with center 8192.
    PitchBend {
        /// Channel 0..=15.
        channel: u8,
        /// 0..=16383.
        value: u16,
    },
    /// Controller change.
    ControlChange {
        /// Channel 0..=15.
        channel: u8,
        /// Controller number.
        controller: u8,
        /// Controller value.
        value: u8,
    },
    /// Anything else, carried verbatim.
    Other {
        /// Raw bytes; only the first `len` are meaningful.
        bytes: [u8; 3],
        /// Number of valid bytes.
        len: u8,
    },
}

impl MidiMessage {
    /// Decode a short message. Note-on with velocity 0 becomes note-off.
    ///
    /// Returns `None` for empty input or a truncated channel message.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let &status = bytes.first()?;
        let channel = status & 0x0F;
        let data = |i: usize| bytes.get(i).map(|b| b & 0x7F);

        let message = match status & 0xF0 {
            0x80 => MidiMessage::NoteOff { channel, note: data(1)?, velocity: data(2)? },
            0x90 => {
                let (note, velocity) = (data(1)?, data(2)?);
                if velocity == 0 {
                    MidiMessage::NoteOff { channel, note, velocity: 0 }
                } else {
                    MidiMessage::NoteOn { channel, note, velocity }
                }
            }
            0xB0 => MidiMessage::ControlChange { channel, controller: data(1)?, value: data(2)? },
            0xE0 => {
                let value = u16::from(data(1)?) | (u16::from(data(2)?) << 7);
                MidiMessage::PitchBend { channel, value }
            }
            _ => {
                let len = bytes.len().min(3);
                let mut raw = [0u8; 3];
                raw[..len].copy_from_slice(&bytes[..len]);
                MidiMessage::Other { bytes: raw, len: len as u8 }
            }
        };
        Some(message)
    }

    /// Encode; returns the buffer and the number of bytes used.
    pub fn to_bytes(&self) -> ([u8; 3], usize) {
        match *self {
            MidiMessage::NoteOn { channel, note, velocity } => {
                ([0x90 | (channel & 0x0F), note & 0x7F, velocity & 0x7F], 3)
            }
            MidiMessage::NoteOff { channel, note, velocity } => {
                ([0x80 | (channel & 0x0F), note & 0x7F, velocity & 0x7F], 3)
            }
            MidiMessage::ControlChange { channel, controller, value } => {
                ([0xB0 | (channel & 0x0F), controller & 0x7F, value & 0x7F], 3)
            }
            MidiMessage::PitchBend { channel, value } => {
                let value = value.min(16383);
                ([0xE0 | (channel & 0x0F), (value & 0x7F) as u8, (value >> 7) as u8], 3)
            }
            MidiMessage::Other { bytes, len } => (bytes, usize::from(len.min(3))),
        }
    }

    /// Channel of a channel-voice message.
    pub fn channel(&self) -> Option<u8> {
        match *self {
            MidiMessage::NoteOn { channel, .. }
            | MidiMessage::NoteOff { channel, .. }
            | MidiMessage::PitchBend { channel, .. }
            | MidiMessage::ControlChange { channel, .. } => Some(channel),
            MidiMessage::Other { .. } => None,
        }
    }

    /// Note number of a note-on or note-off.
    pub fn note(&self) -> Option<u8> {
        match *self {
            MidiMessage::NoteOn { note, .. } | MidiMessage::NoteOff { note, .. } => Some(note),
            _ => None,
        }
    }

    /// Note-on or note-off.
    pub fn is_note(&self) -> bool {
        self.note().is_some()
    }

    /// Note-on with nonzero velocity.
    pub fn is_note_on(&self) -> bool {
        matches!(self, MidiMessage::NoteOn { velocity, .. } if *velocity > 0)
    }
}

/// A message at a sample offset within the current block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MidiEvent {
    /// Sample offset from the start of the block.
    pub offset: usize,
    /// The message.
    pub message: MidiMessage,
}

impl MidiEvent {
    /// Event at `offset`.
    pub fn new(offset: usize, message: MidiMessage) -> Self {
        Self { offset, message }
    }

    /// Note-on at `offset`.
    pub fn note_on(offset: usize, channel: u8, note: u8, velocity: u8) -> Self {
        Self::new(offset, MidiMessage::NoteOn { channel, note, velocity })
    }

    /// Note-off at `offset`.
    pub fn note_off(offset: usize, channel: u8, note: u8) -> Self {
        Self::new(offset, MidiMessage::NoteOff { channel, note, velocity: 0 })
    }
}
