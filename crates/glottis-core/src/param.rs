//! One-pole parameter smoothing for zipper-free gain changes.
//!
//! ```rust
//! use glottis_core::SmoothedParam;
//!
//! let mut gain = SmoothedParam::with_config(0.7, 48000.0, 10.0);
//! gain.set_target(1.4);
//!
//! for _ in 0..480 {
//!     let g = gain.advance();
//!     assert!(g >= 0.7 && g <= 1.4);
//! }
//! ```

use libm::expf;

/// A value that approaches its target exponentially, one sample at a time.
#[derive(Debug, Clone)]
pub struct SmoothedParam {
    current: f32,
    target: f32,
    /// 0 = frozen, 1 = instant
    coeff: f32,
}

impl SmoothedParam {
    /// Create a parameter that follows its target instantly until configured.
    pub fn new(initial: f32) -> Self {
        Self {
            current: initial,
            target: initial,
            coeff: 1.0,
        }
    }

    /// Create a parameter with a sample rate and time constant.
    pub fn with_config(initial: f32, sample_rate: f32, smoothing_time_ms: f32) -> Self {
        Self {
            coeff: smoothing_coeff(sample_rate, smoothing_time_ms),
            ..Self::new(initial)
        }
    }

    /// Set the value to approach.
    #[inline]
    pub fn set_target(&mut self, target: f32) {
        self.target = target;
    }

    /// Advance one sample and return the smoothed value.
    #[inline]
    pub fn advance(&mut self) -> f32 {
        self.current += self.coeff * (self.target - self.current);
        self.current
    }

    /// Current value without advancing.
    #[inline]
    pub fn get(&self) -> f32 {
        self.current
    }

    /// Skip the remaining ramp.
    #[inline]
    pub fn snap_to_target(&mut self) {
        self.current = self.target;
    }
}

// coeff = 1 - exp(-1 / (tau * fs)); reaches 63.2% after one time constant
fn smoothing_coeff(sample_rate: f32, smoothing_time_ms: f32) -> f32 {
    if smoothing_time_ms <= 0.0 || sample_rate <= 0.0 {
        1.0
    } else {
        let samples = smoothing_time_ms / 1000.0 * sample_rate;
        1.0 - expf(-1.0 / samples)
    }
}

impl Default for SmoothedParam {
    fn default() -> Self {
        Self::new(0.0)
    }
}
