//! Glottis Core - DSP primitives for vocal synthesis
//!
//! Foundational building blocks shared by the oscillator, formant, and
//! voice layers. Nothing in the processing paths allocates.
//!
//! # Contents
//!
//! - [`Biquad`] - Direct Form I second-order section, with numerator-only gain
//! - [`bandpass_coefficients`] - RBJ cookbook band-pass design
//! - [`AudioBuffer`] - Planar multichannel buffer sized once at prepare time
//! - [`SmoothedParam`] - One-pole smoothing for click-free gain changes
//! - Math: [`soft_limit`], [`flush_denormal`], [`midi_to_freq`]
//!
//! # no_std Support
//!
//! Disable the default `std` feature:
//!
//! ```toml
//! [dependencies]
//! glottis-core = { version = "0.1", default-features = false }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod biquad;
pub mod buffer;
pub mod math;
pub mod param;

pub use biquad::{Biquad, bandpass_coefficients};
pub use buffer::AudioBuffer;
pub use math::{A4_FREQUENCY, A4_NOTE, flush_denormal, midi_to_freq, peak, soft_limit};
pub use param::SmoothedParam;
