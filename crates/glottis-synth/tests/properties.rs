//! Property-based tests for glottis-synth.
//!
//! Closed-phase silence, formant Q clamping, bounded bank output, and
//! envelope range.

use glottis_core::AudioBuffer;
use glottis_synth::formant::{Q_RANGE, SILENCE_THRESHOLD, design_formant};
use glottis_synth::{
    AdsrParameters, EnvelopeGenerator, FormantFilterBank, FormantShape, GlottalOscillator, Vowel,
};
use proptest::prelude::*;

fn vowel() -> impl Strategy<Value = Vowel> {
    (0u8..5).prop_map(Vowel::from_index)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn closed_region_is_silent(
        oq in 0.0f32..1.0,
        asym in 0.0f32..3.0,
        breath in 0.0f32..1.0,
        freq in 60.0f32..1200.0,
    ) {
        let mut osc = GlottalOscillator::new();
        osc.prepare(48000.0);
        osc.set_frequency(freq);
        osc.set_open_quotient(oq);
        osc.set_asymmetry(asym);
        osc.set_breathiness(breath);
        for _ in 0..1024 {
            let closed = osc.phase() >= osc.closure_point();
            let s = osc.next_sample();
            if closed {
                prop_assert_eq!(s, 0.0);
            }
        }
    }

    #[test]
    fn q_always_clamped(
        freq in -1000.0f32..40000.0,
        bandwidth in 0.0f32..100000.0,
        gain in -5.0f32..5.0,
        sr in 8000.0f32..192000.0,
    ) {
        let d = design_formant(freq, bandwidth, gain, sr);
        prop_assert!(d.q >= Q_RANGE.0 && d.q <= Q_RANGE.1, "q={}", d.q);
        prop_assert!(d.gain >= 0.1 && d.gain <= 2.0);
        prop_assert!(d.frequency <= 0.4 * sr);
    }

    #[test]
    fn sub_threshold_block_unchanged(
        samples in prop::collection::vec(-0.99e-6f32..0.99e-6, 1..256),
        v in vowel(),
    ) {
        let mut bank = FormantFilterBank::new();
        bank.prepare(48000.0, 256, 1);
        bank.set_vowel(v);
        let mut buf = AudioBuffer::from_channels(&[&samples]);
        prop_assume!(buf.peak() < SILENCE_THRESHOLD);
        bank.process(&mut buf);
        let before: Vec<u32> = samples.iter().map(|s| s.to_bits()).collect();
        let after: Vec<u32> = buf.channel(0).iter().map(|s| s.to_bits()).collect();
        prop_assert_eq!(before, after);
    }

    #[test]
    fn bank_output_bounded_for_any_shape(
        v in vowel(),
        shift in 0.0f32..3.0,
        spread in 0.0f32..3.0,
        bw in 0.0f32..4.0,
        gain in 0.0f32..3.0,
        align in any::<bool>(),
        f0 in 40.0f32..2500.0,
        input in prop::collection::vec(-4.0f32..4.0, 512),
    ) {
        let mut bank = FormantFilterBank::new();
        bank.prepare(44100.0, 512, 1);
        bank.set_shape(FormantShape {
            vowel: v,
            shift,
            spread,
            bandwidth_scale: bw,
            resonance_gain: gain,
            harmonic_alignment: align,
        });
        bank.set_fundamental_frequency(f0);
        let mut buf = AudioBuffer::from_channels(&[&input]);
        bank.process(&mut buf);
        for &s in buf.channel(0) {
            prop_assert!(s.is_finite() && s.abs() <= 0.95);
        }
    }

    #[test]
    fn envelope_stays_in_unit_range(
        attack in 0.0f32..0.02,
        decay in 0.0f32..0.02,
        sustain in 0.0f32..1.0,
        release in 0.0f32..0.02,
        off_at in 0usize..2000,
    ) {
        let mut env = EnvelopeGenerator::new();
        env.prepare(48000.0);
        env.set_parameters(AdsrParameters { attack, decay, sustain, release });
        env.note_on();
        for i in 0..4000 {
            if i == off_at {
                env.note_off();
            }
            let v = env.next_value();
            prop_assert!((0.0..=1.0).contains(&v), "v={} at {}", v, i);
        }
    }
}
