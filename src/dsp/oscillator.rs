//! Phase-accumulating oscillators for the speaker engine.
//!
//! The sine drives vibrato. The square is the speaker cone itself, with its
//! two edges smoothed by a polynomial band-limited step so high PIT
//! frequencies do not fold back as audible aliases.

use std::f64::consts::TAU;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Waveform {
    Sine,
    Square,
}

#[derive(Debug, Clone)]
pub struct Oscillator {
    pub waveform: Waveform,
    /// Hz; may change between samples.
    pub frequency: f64,
    /// Position within the cycle, in `[0, 1)`.
    phase: f64,
    sample_rate: f64,
}

impl Oscillator {
    pub fn new(waveform: Waveform, sample_rate: f64) -> Self {
        Oscillator {
            waveform,
            frequency: 440.0,
            phase: 0.0,
            sample_rate,
        }
    }

    /// Emit the sample at the current phase, then advance by one frame.
    pub fn next_sample(&mut self) -> f64 {
        let step = (self.frequency / self.sample_rate).rem_euclid(1.0);
        let value = match self.waveform {
            Waveform::Sine => (TAU * self.phase).sin(),
            Waveform::Square => square_at(self.phase, step),
        };
        self.phase = (self.phase + step).fract();
        value
    }
}

/// High for the first half cycle, low for the second. `step` is the phase
/// advance per frame and sets how wide each edge correction is.
fn square_at(phase: f64, step: f64) -> f64 {
    let naive = if phase < 0.5 { 1.0 } else { -1.0 };
    naive + blep(phase, step) - blep((phase + 0.5).fract(), step)
}

/// Residual of a unit step at phase 0, spread over one frame either side.
fn blep(phase: f64, step: f64) -> f64 {
    if step <= 0.0 {
        return 0.0;
    }
    if phase < step {
        let x = phase / step;
        2.0 * x - x * x - 1.0
    } else if phase > 1.0 - step {
        let x = (phase - 1.0) / step;
        x * x + 2.0 * x + 1.0
    } else {
        0.0
    }
}
