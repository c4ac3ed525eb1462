//! Integration tests for glottis-io WAV output.

use glottis_core::AudioBuffer;
use glottis_io::{WavFormat, WavSink, WavSpec, read_wav, read_wav_info, write_wav};
use tempfile::NamedTempFile;

const SR: u32 = 48000;

fn ramp(len: usize) -> Vec<f32> {
    (0..len).map(|i| i as f32 / len as f32 - 0.5).collect()
}

// ---------------------------------------------------------------------------
// Metadata
// ---------------------------------------------------------------------------

#[test]
fn info_reports_frames_and_duration() {
    let spec = WavSpec {
        channels: 2,
        sample_rate: SR,
        bits_per_sample: 16,
    };
    let file = NamedTempFile::new().unwrap();
    write_wav(file.path(), &vec![0.0; SR as usize], spec).unwrap();

    let info = read_wav_info(file.path()).unwrap();
    assert_eq!(info.channels, 2);
    assert_eq!(info.num_frames, u64::from(SR) / 2);
    assert!((info.duration_secs - 0.5).abs() < 1e-9);
    assert_eq!(info.format, WavFormat::Pcm);
}

#[test]
fn float_depth_is_ieee() {
    let spec = WavSpec {
        channels: 1,
        sample_rate: SR,
        bits_per_sample: 32,
    };
    let file = NamedTempFile::new().unwrap();
    write_wav(file.path(), &[0.25; 64], spec).unwrap();
    assert_eq!(read_wav_info(file.path()).unwrap().format, WavFormat::IeeeFloat);
}

// ---------------------------------------------------------------------------
// Streaming sink
// ---------------------------------------------------------------------------

#[test]
fn sink_streams_blocks_with_partial_tail() {
    let spec = WavSpec {
        channels: 2,
        sample_rate: SR,
        bits_per_sample: 32,
    };
    let left = ramp(300);
    let right: Vec<f32> = left.iter().map(|s| -s).collect();

    let file = NamedTempFile::new().unwrap();
    let mut sink = WavSink::create(file.path(), spec).unwrap();
    let mut block = AudioBuffer::new(2, 128);
    for start in (0..300).step_by(128) {
        let len = (300 - start).min(128);
        block.set_len(len);
        block.channel_mut(0).copy_from_slice(&left[start..start + len]);
        block.channel_mut(1).copy_from_slice(&right[start..start + len]);
        sink.write_buffer(&block).unwrap();
    }
    assert_eq!(sink.frames_written(), 300);
    sink.finalize().unwrap();

    let (samples, loaded_spec) = read_wav(file.path()).unwrap();
    assert_eq!(loaded_spec, spec);
    assert_eq!(samples.len(), 600);
    for (i, frame) in samples.chunks_exact(2).enumerate() {
        assert_eq!(frame[0], left[i]);
        assert_eq!(frame[1], right[i]);
    }
}

#[test]
fn sink_pcm16_is_close() {
    let spec = WavSpec {
        channels: 1,
        sample_rate: SR,
        bits_per_sample: 16,
    };
    let signal = ramp(256);
    let file = NamedTempFile::new().unwrap();
    let mut sink = WavSink::create(file.path(), spec).unwrap();
    sink.write_buffer(&AudioBuffer::from_channels(&[&signal])).unwrap();
    sink.finalize().unwrap();

    let (samples, _) = read_wav(file.path()).unwrap();
    for (a, b) in signal.iter().zip(&samples) {
        assert!((a - b).abs() < 1.0 / 32768.0 + 1e-6, "{a} vs {b}");
    }
}
