//! PIT frequency quantizer — PC-speaker pitch "steppiness".
//!
//! The 8253 PIT drives the speaker at `1193182 / n` Hz for an integer reload
//! value `n`, and games reloaded the counter at a fixed update rate. This
//! stage takes a continuous frequency signal (Hz, one value per sample) and
//! rewrites it so that every `repeat_samples`-long step holds one achievable
//! PIT frequency, sampled at the step's first frame.
//!
//! Steps are aligned to the absolute frame counter, not to chunk starts, so a
//! stream cut into chunks of any size produces the same output as the
//! uncut stream. The only state carried between chunks is the last output
//! sample of each channel.

use crate::config::QuantizerOptions;

/// Input clock of the PIT, in Hz.
pub const PIT_BASE_FREQUENCY: f64 = 1_193_182.0;

/// The PIT frequency closest to `hz`: round the divisor, not the frequency.
pub fn pit_quantize(hz: f64) -> f64 {
    PIT_BASE_FREQUENCY / (PIT_BASE_FREQUENCY / hz).round()
}

/// Chunk-driven quantizer with one carried value per input channel.
#[derive(Debug, Clone)]
pub struct PitQuantizer {
    repeat_samples: usize,
    /// Last output sample written, per input port and channel.
    previous: Vec<Vec<f32>>,
}

impl PitQuantizer {
    /// `inputs` ports of `channels` channels each.
    pub fn new(sample_rate: f64, options: QuantizerOptions, inputs: usize, channels: usize) -> Self {
        PitQuantizer {
            repeat_samples: options.repeat_samples(sample_rate),
            previous: vec![vec![0.0; channels]; inputs],
        }
    }

    /// Samples per quantization step.
    pub fn repeat_samples(&self) -> usize {
        self.repeat_samples
    }

    /// Value carried over from the previous chunk.
    pub fn previous(&self, input: usize, channel: usize) -> f32 {
        self.previous[input][channel]
    }

    /// Quantize one chunk of one channel.
    ///
    /// `current_frame` is the absolute index of `input[0]` in the host's
    /// stream. Chunks must arrive in order.
    pub fn process_channel(
        &mut self,
        input_index: usize,
        channel: usize,
        current_frame: u64,
        input: &[f32],
        output: &mut [f32],
    ) {
        let len = input.len().min(output.len());
        if len == 0 {
            return;
        }
        let repeat = self.repeat_samples as u64;
        let first_index = current_frame;
        let last_index = current_frame + len as u64 - 1;

        let first_repeat = first_index / repeat;
        let last_repeat = (last_index + 1).div_ceil(repeat) - 1;

        for repeat_index in first_repeat..=last_repeat {
            let step_start = repeat_index * repeat;
            let value = if step_start >= first_index {
                let offset = (step_start - first_index) as usize;
                pit_quantize(input[offset] as f64) as f32
            } else {
                // Step began in an earlier chunk; its value is already fixed.
                self.previous[input_index][channel]
            };

            let local_start = step_start.saturating_sub(first_index) as usize;
            let local_end = ((step_start + repeat - first_index) as usize).min(len);
            output[local_start..local_end].fill(value);
        }

        self.previous[input_index][channel] = output[len - 1];
    }

    /// Quantize a chunk for every port and channel. `inputs[port][channel]`
    /// and `outputs[port][channel]` must have matching shapes.
    pub fn process(&mut self, current_frame: u64, inputs: &[Vec<Vec<f32>>], outputs: &mut [Vec<Vec<f32>>]) {
        for (port, (input, output)) in inputs.iter().zip(outputs.iter_mut()).enumerate() {
            for (channel, (inp, out)) in input.iter().zip(output.iter_mut()).enumerate() {
                self.process_channel(port, channel, current_frame, inp, out);
            }
        }
    }
}
