//! Audio file I/O for glottis.
//!
//! - **WAV writing**: [`write_wav`] for interleaved samples, [`WavSink`] for
//!   streaming [`AudioBuffer`](glottis_core::AudioBuffer) blocks to disk
//! - **WAV reading**: [`read_wav`] and [`read_wav_info`], mostly for
//!   checking renders
//! - **Layout**: [`interleave`] planar buffers into frame order
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use glottis_core::AudioBuffer;
//! use glottis_io::{WavSink, WavSpec};
//!
//! let spec = WavSpec { channels: 2, sample_rate: 48000, bits_per_sample: 24 };
//! let mut sink = WavSink::create("out.wav", spec)?;
//! let block = AudioBuffer::new(2, 512);
//! sink.write_buffer(&block)?;
//! sink.finalize()?;
//! # Ok::<(), glottis_io::Error>(())
//! ```

mod wav;

pub use wav::{WavFormat, WavInfo, WavSink, WavSpec, interleave, read_wav, read_wav_info, write_wav};

/// Error types for audio I/O operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// WAV file read/write error.
    #[error("WAV file error: {0}")]
    Wav(#[from] hound::Error),

    /// Standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A buffer's channel count does not match the file.
    #[error("channel mismatch: file has {expected} channels, buffer has {actual}")]
    ChannelMismatch {
        /// Channels in the file.
        expected: usize,
        /// Channels in the buffer.
        actual: usize,
    },

    /// Only 16- and 24-bit PCM and 32-bit float are written.
    #[error("unsupported bit depth: {0}")]
    UnsupportedBitDepth(u16),
}

/// Convenience result type for audio I/O operations.
pub type Result<T> = std::result::Result<T, Error>;
