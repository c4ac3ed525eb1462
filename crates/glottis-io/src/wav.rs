//! WAV file reading and writing.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use glottis_core::AudioBuffer;
use hound::{SampleFormat, WavReader, WavWriter};

use crate::{Error, Result};

/// WAV audio encoding format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WavFormat {
    /// Linear PCM (integer samples).
    Pcm,
    /// IEEE 754 floating-point samples.
    IeeeFloat,
}

/// WAV file metadata extracted without loading sample data.
#[derive(Debug, Clone)]
pub struct WavInfo {
    /// Number of audio channels.
    pub channels: u16,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Bit depth per sample.
    pub bits_per_sample: u16,
    /// Total number of sample frames (samples per channel).
    pub num_frames: u64,
    /// Duration in seconds.
    pub duration_secs: f64,
    /// Audio encoding format.
    pub format: WavFormat,
}

/// Read WAV metadata without loading sample data.
pub fn read_wav_info<P: AsRef<Path>>(path: P) -> Result<WavInfo> {
    let reader = WavReader::open(path)?;
    let spec = reader.spec();
    let total_samples = u64::from(reader.len());
    let num_frames = total_samples / u64::from(spec.channels.max(1));
    let duration_secs = num_frames as f64 / f64::from(spec.sample_rate);

    let format = match spec.sample_format {
        SampleFormat::Float => WavFormat::IeeeFloat,
        SampleFormat::Int => WavFormat::Pcm,
    };

    Ok(WavInfo {
        channels: spec.channels,
        sample_rate: spec.sample_rate,
        bits_per_sample: spec.bits_per_sample,
        num_frames,
        duration_secs,
        format,
    })
}

/// WAV layout and sample format. 32 bits means float, 16 and 24 mean PCM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavSpec {
    /// Number of audio channels.
    pub channels: u16,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Bit depth per sample (16, 24, or 32).
    pub bits_per_sample: u16,
}

impl Default for WavSpec {
    fn default() -> Self {
        Self {
            channels: 2,
            sample_rate: 48000,
            bits_per_sample: 24,
        }
    }
}

impl From<hound::WavSpec> for WavSpec {
    fn from(spec: hound::WavSpec) -> Self {
        Self {
            channels: spec.channels,
            sample_rate: spec.sample_rate,
            bits_per_sample: spec.bits_per_sample,
        }
    }
}

impl WavSpec {
    fn to_hound(self) -> Result<hound::WavSpec> {
        let sample_format = match self.bits_per_sample {
            16 | 24 => SampleFormat::Int,
            32 => SampleFormat::Float,
            other => return Err(Error::UnsupportedBitDepth(other)),
        };
        Ok(hound::WavSpec {
            channels: self.channels,
            sample_rate: self.sample_rate,
            bits_per_sample: self.bits_per_sample,
            sample_format,
        })
    }
}

/// Planar buffer to interleaved frames (`L R L R ...`).
pub fn interleave(buffer: &AudioBuffer) -> Vec<f32> {
    let channels = buffer.num_channels();
    let mut out = Vec::with_capacity(buffer.len() * channels);
    for frame in 0..buffer.len() {
        for ch in 0..channels {
            out.push(buffer.channel(ch)[frame]);
        }
    }
    out
}

/// Read a WAV file as interleaved f32 samples in `[-1, 1)`.
pub fn read_wav<P: AsRef<Path>>(path: P) -> Result<(Vec<f32>, WavSpec)> {
    let reader = WavReader::open(path)?;
    let spec = WavSpec::from(reader.spec());

    let samples = match reader.spec().sample_format {
        SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<std::result::Result<Vec<_>, _>>()?,
        SampleFormat::Int => {
            let max_val = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / max_val))
                .collect::<std::result::Result<Vec<_>, _>>()?
        }
    };

    Ok((samples, spec))
}

fn write_samples<W>(writer: &mut WavWriter<W>, bits: u16, samples: &[f32]) -> Result<()>
where
    W: std::io::Write + std::io::Seek,
{
    if bits == 32 {
        for &sample in samples {
            writer.write_sample(sample)?;
        }
    } else {
        let max_val = (1i64 << (bits - 1)) as f32;
        for &sample in samples {
            let int_sample = (sample * max_val).clamp(-max_val, max_val - 1.0) as i32;
            writer.write_sample(int_sample)?;
        }
    }
    Ok(())
}

/// Write interleaved samples to a WAV file.
///
/// ```rust,no_run
/// use glottis_io::{WavSpec, write_wav};
///
/// let silence = vec![0.0f32; 48000 * 2];
/// write_wav("silence.wav", &silence, WavSpec::default())?;
/// # Ok::<(), glottis_io::Error>(())
/// ```
pub fn write_wav<P: AsRef<Path>>(path: P, samples: &[f32], spec: WavSpec) -> Result<()> {
    let mut writer = WavWriter::create(path, spec.to_hound()?)?;
    write_samples(&mut writer, spec.bits_per_sample, samples)?;
    writer.finalize()?;
    Ok(())
}

/// Incremental WAV writer fed one [`AudioBuffer`] at a time.
pub struct WavSink {
    writer: WavWriter<BufWriter<File>>,
    spec: WavSpec,
    path: PathBuf,
    frames: u64,
}

impl std::fmt::Debug for WavSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WavSink")
            .field("spec", &self.spec)
            .field("path", &self.path)
            .field("frames", &self.frames)
            .finish_non_exhaustive()
    }
}

impl WavSink {
    /// Create (or truncate) `path`.
    pub fn create<P: AsRef<Path>>(path: P, spec: WavSpec) -> Result<Self> {
        let path = path.as_ref();
        let writer = WavWriter::create(path, spec.to_hound()?)?;
        tracing::debug!(path = %path.display(), ?spec, "opened wav output");
        Ok(Self {
            writer,
            spec,
            path: path.to_path_buf(),
            frames: 0,
        })
    }

    /// Format being written.
    pub fn spec(&self) -> WavSpec {
        self.spec
    }

    /// Frames written so far.
    pub fn frames_written(&self) -> u64 {
        self.frames
    }

    /// Append the active region of `buffer`.
    pub fn write_buffer(&mut self, buffer: &AudioBuffer) -> Result<()> {
        let expected = usize::from(self.spec.channels);
        if buffer.num_channels() != expected {
            return Err(Error::ChannelMismatch {
                expected,
                actual: buffer.num_channels(),
            });
        }
        write_samples(&mut self.writer, self.spec.bits_per_sample, &interleave(buffer))?;
        self.frames += buffer.len() as u64;
        Ok(())
    }

    /// Flush the header and close the file.
    pub fn finalize(self) -> Result<()> {
        self.writer.finalize()?;
        tracing::debug!(path = %self.path.display(), frames = self.frames, "closed wav output");
        Ok(())
    }
}
