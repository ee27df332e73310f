//! DSP Engine — Pure Rust PC-speaker synthesis and processing.
//!
//! The quantizer and noise stages are chunk driven so a host audio callback
//! can run them directly; the speaker engine and WAV renderer reuse the same
//! stages for offline rendering.

pub mod automation;
pub mod engine;
pub mod noise;
pub mod oscillator;
pub mod quantizer;
pub mod renderer;
