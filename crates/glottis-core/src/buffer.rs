//! Planar multichannel audio buffer.
//!
//! [`AudioBuffer`] owns one contiguous allocation holding `num_channels`
//! planes of `capacity` samples each. The active block length can shrink
//! and grow up to the capacity without touching the allocator, so a buffer
//! sized at prepare time can be reused for every render call.

#[cfg(not(feature = "std"))]
use alloc::vec;
#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use crate::math::peak;

/// Fixed-capacity planar audio buffer.
///
/// ```rust
/// use glottis_core::AudioBuffer;
///
/// let mut buf = AudioBuffer::new(2, 512);
/// buf.set_len(128);
/// buf.channel_mut(0).fill(0.25);
/// buf.broadcast_first_channel();
/// assert_eq!(buf.channel(1)[127], 0.25);
/// ```
#[derive(Debug, Clone, Default)]
pub struct AudioBuffer {
    data: Vec<f32>,
    num_channels: usize,
    capacity: usize,
    len: usize,
}

impl AudioBuffer {
    /// Allocates a zeroed buffer. The active length starts at `capacity`.
    pub fn new(num_channels: usize, capacity: usize) -> Self {
        Self {
            data: vec![0.0; num_channels * capacity],
            num_channels,
            capacity,
            len: capacity,
        }
    }

    /// Builds a buffer from per-channel sample slices of equal length.
    ///
    /// # Panics
    ///
    /// Panics if the slices differ in length.
    pub fn from_channels(channels: &[&[f32]]) -> Self {
        let len = channels.first().map_or(0, |c| c.len());
        let mut buffer = Self::new(channels.len(), len);
        for (ch, samples) in channels.iter().enumerate() {
            assert_eq!(samples.len(), len, "channel {ch} length mismatch");
            buffer.channel_mut(ch).copy_from_slice(samples);
        }
        buffer
    }

    /// Reallocates for a new layout and zeroes everything.
    ///
    /// This is the only method that allocates; call it from prepare, not
    /// from a render path.
    pub fn resize(&mut self, num_channels: usize, capacity: usize) {
        #[cfg(feature = "tracing")]
        tracing::debug!(num_channels, capacity, "audio buffer resized");

        self.data.clear();
        self.data.resize(num_channels * capacity, 0.0);
        self.num_channels = num_channels;
        self.capacity = capacity;
        self.len = capacity;
    }

    /// Number of channels.
    #[inline]
    pub fn num_channels(&self) -> usize {
        self.num_channels
    }

    /// Active samples per channel.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// True when the active length is zero.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Maximum samples per channel.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Sets the active length, clamped to the capacity.
    #[inline]
    pub fn set_len(&mut self, len: usize) {
        self.len = len.min(self.capacity);
    }

    /// Active samples of channel `ch`.
    ///
    /// # Panics
    ///
    /// Panics if `ch >= num_channels()`.
    #[inline]
    pub fn channel(&self, ch: usize) -> &[f32] {
        assert!(ch < self.num_channels);
        let start = ch * self.capacity;
        &self.data[start..start + self.len]
    }

    /// Mutable active samples of channel `ch`.
    ///
    /// # Panics
    ///
    /// Panics if `ch >= num_channels()`.
    #[inline]
    pub fn channel_mut(&mut self, ch: usize) -> &mut [f32] {
        assert!(ch < self.num_channels);
        let start = ch * self.capacity;
        &mut self.data[start..start + self.len]
    }

    /// Zeroes the active region of every channel.
    pub fn clear(&mut self) {
        for ch in 0..self.num_channels {
            self.channel_mut(ch).fill(0.0);
        }
    }

    /// Copies channel 0 into every other channel.
    pub fn broadcast_first_channel(&mut self) {
        for ch in 1..self.num_channels {
            let dst = ch * self.capacity;
            self.data.copy_within(0..self.len, dst);
        }
    }

    /// Multiplies every active sample by `gain`.
    pub fn apply_gain(&mut self, gain: f32) {
        for ch in 0..self.num_channels {
            for s in self.channel_mut(ch) {
                *s *= gain;
            }
        }
    }

    /// Adds the first `count` samples of `source` into this buffer starting
    /// at `offset`.
    ///
    /// Source channels are reused cyclically when `source` has fewer
    /// channels than `self`. Samples that would land past the active
    /// length are dropped.
    pub fn add_from(&mut self, source: &AudioBuffer, offset: usize, count: usize) {
        if source.num_channels == 0 || offset >= self.len {
            return;
        }
        let count = count.min(source.len).min(self.len - offset);
        for ch in 0..self.num_channels {
            let src = &source.channel(ch % source.num_channels)[..count];
            let dst = &mut self.channel_mut(ch)[offset..offset + count];
            for (d, s) in dst.iter_mut().zip(src) {
                *d += *s;
            }
        }
    }

    /// Largest absolute sample value across all active channels.
    pub fn peak(&self) -> f32 {
        (0..self.num_channels).fold(0.0f32, |acc, ch| acc.max(peak(self.channel(ch))))
    }
}
