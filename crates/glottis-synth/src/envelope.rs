//! Linear ADSR envelope generator.
//!
//! Each stage ramps linearly. A new note always restarts from silence, and
//! release always ramps from wherever the level currently is, so an early
//! note-off during attack fades out instead of jumping. A sustain change
//! during decay or sustain glides to the new level at the decay slope.

use glottis_core::AudioBuffer;

/// Longest stage time accepted, in seconds.
pub const MAX_STAGE_SECONDS: f32 = 10.0;

/// ADSR envelope stages.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EnvelopeState {
    /// Inactive, output is zero.
    #[default]
    Idle,
    /// Ramping from 0 to 1.
    Attack,
    /// Gliding to the sustain level, down from 1 after attack or either
    /// way after a sustain change.
    Decay,
    /// Holding at the sustain level.
    Sustain,
    /// Ramping from the release level to 0.
    Release,
}

/// Stage times in seconds and the sustain level.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AdsrParameters {
    /// Attack time (s), 0..=10.
    pub attack: f32,
    /// Decay time (s), 0..=10.
    pub decay: f32,
    /// Sustain level, 0..=1.
    pub sustain: f32,
    /// Release time (s), 0..=10.
    pub release: f32,
}

impl Default for AdsrParameters {
    fn default() -> Self {
        Self {
            attack: 0.1,
            decay: 0.1,
            sustain: 1.0,
            release: 0.4,
        }
    }
}

impl AdsrParameters {
    /// Copy with every field clamped to its range.
    pub fn clamped(self) -> Self {
        Self {
            attack: self.attack.clamp(0.0, MAX_STAGE_SECONDS),
            decay: self.decay.clamp(0.0, MAX_STAGE_SECONDS),
            sustain: self.sustain.clamp(0.0, 1.0),
            release: self.release.clamp(0.0, MAX_STAGE_SECONDS),
        }
    }
}

/// Four-stage linear envelope.
///
/// # Example
///
/// ```rust
/// use glottis_synth::{AdsrParameters, EnvelopeGenerator, EnvelopeState};
///
/// let mut env = EnvelopeGenerator::new();
/// env.prepare(48000.0);
/// env.set_parameters(AdsrParameters { attack: 0.01, decay: 0.05, sustain: 0.6, release: 0.2 });
///
/// env.note_on();
/// for _ in 0..480 {
///     env.next_value();
/// }
/// assert_eq!(env.state(), EnvelopeState::Decay);
///
/// env.note_off();
/// assert_eq!(env.state(), EnvelopeState::Release);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct EnvelopeGenerator {
    state: EnvelopeState,
    level: f32,
    sample_rate: f32,
    params: AdsrParameters,

    // Per-sample increments
    attack_rate: f32,
    decay_rate: f32,
    release_rate: f32,
}

impl Default for EnvelopeGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl EnvelopeGenerator {
    /// Create an idle envelope with default parameters at 48 kHz.
    pub fn new() -> Self {
        let mut env = Self {
            state: EnvelopeState::Idle,
            level: 0.0,
            sample_rate: 48000.0,
            params: AdsrParameters::default(),
            attack_rate: 0.0,
            decay_rate: 0.0,
            release_rate: 0.0,
        };
        env.recalculate_rates();
        env
    }

    /// Set the sample rate and return to idle.
    pub fn prepare(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate.max(1.0);
        self.reset();
        self.recalculate_rates();
    }

    /// Update stage times and sustain; applies from the next sample.
    pub fn set_parameters(&mut self, params: AdsrParameters) {
        self.params = params.clamped();
        self.recalculate_rates();
    }

    /// Current (clamped) parameters.
    pub fn parameters(&self) -> AdsrParameters {
        self.params
    }

    /// Start a note from zero.
    pub fn note_on(&mut self) {
        self.level = 0.0;
        self.state = EnvelopeState::Attack;
        if self.attack_rate <= 0.0 {
            self.level = 1.0;
            self.state = EnvelopeState::Decay;
        }
    }

    /// Enter release from the current level, whatever the stage.
    pub fn note_off(&mut self) {
        if self.state == EnvelopeState::Idle {
            return;
        }
        self.state = EnvelopeState::Release;
        self.release_rate = self.rate_for(self.params.release, self.level);
        if self.release_rate <= 0.0 {
            self.level = 0.0;
            self.state = EnvelopeState::Idle;
        }
    }

    /// Force idle at zero.
    pub fn reset(&mut self) {
        self.state = EnvelopeState::Idle;
        self.level = 0.0;
    }

    /// Current stage.
    pub fn state(&self) -> EnvelopeState {
        self.state
    }

    /// Current level without advancing.
    pub fn level(&self) -> f32 {
        self.level
    }

    /// False only when idle.
    pub fn is_active(&self) -> bool {
        self.state != EnvelopeState::Idle
    }

    /// Advance one sample and return the level.
    #[inline]
    pub fn next_value(&mut self) -> f32 {
        match self.state {
            EnvelopeState::Idle => {
                self.level = 0.0;
            }
            EnvelopeState::Attack => {
                self.level += self.attack_rate;
                if self.level >= 1.0 {
                    self.level = 1.0;
                    self.state = EnvelopeState::Decay;
                }
            }
            EnvelopeState::Decay => self.glide_to_sustain(),
            EnvelopeState::Sustain => {
                if self.level != self.params.sustain {
                    self.state = EnvelopeState::Decay;
                    self.glide_to_sustain();
                }
            }
            EnvelopeState::Release => {
                self.level -= self.release_rate;
                if self.level <= 0.0 {
                    self.level = 0.0;
                    self.state = EnvelopeState::Idle;
                }
            }
        }
        self.level
    }

    /// Multiply `count` frames of `buffer` from `start` by the envelope,
    /// advancing one step per frame.
    ///
    /// Every channel sees the same gain curve.
    pub fn apply_to_buffer(&mut self, buffer: &mut AudioBuffer, start: usize, count: usize) {
        let end = (start + count).min(buffer.len());
        if start >= end {
            return;
        }
        let entry = *self;
        for ch in 0..buffer.num_channels() {
            *self = entry;
            for sample in &mut buffer.channel_mut(ch)[start..end] {
                *sample *= self.next_value();
            }
        }
        if buffer.num_channels() == 0 {
            for _ in start..end {
                self.next_value();
            }
        }
    }

    /// One decay step toward the sustain level; enters Sustain on arrival.
    #[inline]
    fn glide_to_sustain(&mut self) {
        let target = self.params.sustain;
        // decay_rate is 0 when sustain is 1; fall back to the full-scale slope.
        let step = if self.decay_rate > 0.0 {
            self.decay_rate
        } else {
            self.rate_for(self.params.decay, 1.0)
        };
        let distance = target - self.level;
        if step <= 0.0 || (distance <= step && distance >= -step) {
            self.level = target;
            self.state = EnvelopeState::Sustain;
        } else if distance > 0.0 {
            self.level += step;
        } else {
            self.level -= step;
        }
    }

    /// Per-sample step that covers `distance` in `seconds`; 0 means instant.
    fn rate_for(&self, seconds: f32, distance: f32) -> f32 {
        let samples = seconds * self.sample_rate;
        if samples < 1.0 { 0.0 } else { distance / samples }
    }

    fn recalculate_rates(&mut self) {
        self.attack_rate = self.rate_for(self.params.attack, 1.0);
        self.decay_rate = self.rate_for(self.params.decay, 1.0 - self.params.sustain);
        if self.state == EnvelopeState::Release {
            self.release_rate = self.rate_for(self.params.release, self.level);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f32 = 48000.0;

    fn env_with(attack: f32, decay: f32, sustain: f32, release: f32) -> EnvelopeGenerator {
        let mut env = EnvelopeGenerator::new();
        env.prepare(SR);
        env.set_parameters(AdsrParameters { attack, decay, sustain, release });
        env
    }

    #[test]
    fn idle_outputs_zero() {
        let mut env = EnvelopeGenerator::new();
        assert!(!env.is_active());
        for _ in 0..100 {
            assert_eq!(env.next_value(), 0.0);
        }
    }

    #[test]
    fn attack_is_linear() {
        let mut env = env_with(0.01, 0.1, 0.5, 0.1);
        env.note_on();
        let quarter = (0.0025 * SR) as usize;
        for _ in 0..quarter {
            env.next_value();
        }
        assert!((env.level() - 0.25).abs() < 0.01, "level {}", env.level());
    }

    #[test]
    fn reaches_sustain_after_attack_and_decay() {
        let mut env = env_with(0.01, 0.02, 0.6, 0.1);
        env.note_on();
        for _ in 0..((0.031 * SR) as usize) {
            env.next_value();
        }
        assert_eq!(env.state(), EnvelopeState::Sustain);
        assert!((env.level() - 0.6).abs() < 1e-6);
    }

    #[test]
    fn note_on_restarts_from_zero() {
        let mut env = env_with(0.01, 0.01, 0.8, 0.1);
        env.note_on();
        for _ in 0..2000 {
            env.next_value();
        }
        assert!(env.level() > 0.5);
        env.note_on();
        assert_eq!(env.level(), 0.0);
        assert_eq!(env.state(), EnvelopeState::Attack);
    }

    #[test]
    fn early_release_ramps_down_without_jumps() {
        let mut env = env_with(0.1, 0.1, 1.0, 0.05);
        env.note_on();
        for _ in 0..100 {
            env.next_value();
        }
        env.note_off();
        let release_step = env.level() / (0.05 * SR);

        let mut prev = env.level();
        let mut samples = 0;
        while env.is_active() {
            let v = env.next_value();
            assert!(v <= prev);
            assert!(prev - v <= release_step + 1e-6, "jump {}", prev - v);
            prev = v;
            samples += 1;
            assert!(samples < 48000);
        }
        assert_eq!(env.level(), 0.0);
        assert_eq!(env.state(), EnvelopeState::Idle);
    }

    #[test]
    fn zero_attack_starts_at_peak() {
        let mut env = env_with(0.0, 0.1, 0.5, 0.1);
        env.note_on();
        assert_eq!(env.level(), 1.0);
        assert_eq!(env.state(), EnvelopeState::Decay);
    }

    #[test]
    fn parameters_are_clamped() {
        let env = env_with(-1.0, 50.0, 1.5, 20.0);
        let p = env.parameters();
        assert_eq!(p.attack, 0.0);
        assert_eq!(p.decay, MAX_STAGE_SECONDS);
        assert_eq!(p.sustain, 1.0);
        assert_eq!(p.release, MAX_STAGE_SECONDS);
    }

    #[test]
    fn apply_to_buffer_matches_per_sample_curve() {
        let mut env = env_with(0.001, 0.001, 0.5, 0.01);
        let mut reference = env;
        env.note_on();
        reference.note_on();

        let mut buf = AudioBuffer::new(2, 256);
        buf.channel_mut(0).fill(1.0);
        buf.channel_mut(1).fill(1.0);
        env.apply_to_buffer(&mut buf, 0, 256);

        for i in 0..256 {
            let expected = reference.next_value();
            assert!((buf.channel(0)[i] - expected).abs() < 1e-7);
            assert!((buf.channel(1)[i] - expected).abs() < 1e-7);
        }
        assert_eq!(env.level(), reference.level());
    }

    #[test]
    fn release_time_change_applies_mid_release() {
        let mut env = env_with(0.0, 0.0, 1.0, 1.0);
        env.note_on();
        env.next_value();
        env.note_off();
        env.set_parameters(AdsrParameters {
            attack: 0.0,
            decay: 0.0,
            sustain: 1.0,
            release: 0.001,
        });
        for _ in 0..60 {
            env.next_value();
        }
        assert!(!env.is_active());
    }

    #[test]
    fn raising_sustain_mid_decay_glides_up() {
        let mut env = env_with(0.0, 0.05, 0.2, 0.1);
        env.note_on();
        for _ in 0..((0.025 * SR) as usize) {
            env.next_value();
        }
        assert_eq!(env.state(), EnvelopeState::Decay);
        assert!((env.level() - 0.6).abs() < 0.01, "level {}", env.level());

        env.set_parameters(AdsrParameters {
            attack: 0.0,
            decay: 0.05,
            sustain: 0.9,
            release: 0.1,
        });
        let step = (1.0 - 0.9) / (0.05 * SR);
        let mut prev = env.level();
        let mut samples = 0;
        while env.state() == EnvelopeState::Decay {
            let v = env.next_value();
            assert!(v >= prev, "fell from {prev} to {v}");
            assert!(v - prev <= step + 1e-6, "jump {}", v - prev);
            prev = v;
            samples += 1;
            assert!(samples < 48000);
        }
        assert_eq!(env.state(), EnvelopeState::Sustain);
        assert_eq!(env.level(), 0.9);
    }

    #[test]
    fn sustain_change_while_holding_glides() {
        let mut env = env_with(0.0, 0.01, 0.5, 0.1);
        env.note_on();
        for _ in 0..1000 {
            env.next_value();
        }
        assert_eq!(env.state(), EnvelopeState::Sustain);

        env.set_parameters(AdsrParameters {
            attack: 0.0,
            decay: 0.01,
            sustain: 1.0,
            release: 0.1,
        });
        let first = env.next_value();
        assert!(first > 0.5 && first < 0.51, "jumped to {first}");
        for _ in 0..480 {
            env.next_value();
        }
        assert_eq!(env.state(), EnvelopeState::Sustain);
        assert_eq!(env.level(), 1.0);
    }
}
