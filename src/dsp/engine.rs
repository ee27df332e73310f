//! Speaker Engine — a native [`Beeper`] that renders PC-speaker audio.
//!
//! Scheduled instructions become automation on six parameters. Rendering
//! runs in fixed render quanta: the parameters are sampled into a
//! frequency control signal, the control signal goes through the
//! [`PitQuantizer`], and the quantized frequency drives a square wave
//! gated by the amplitude parameter.

use crate::beeper::{Beeper, PitchBendCurve, PitchBendOptions, semitone_offset};
use crate::config::BeeperConfig;
use crate::error::DosTuneError;
use crate::scheduler::schedule_tune;
use crate::tune::Tune;

use super::automation::AutomationParam;
use super::noise::WhiteNoise;
use super::oscillator::{Oscillator, Waveform};
use super::quantizer::PitQuantizer;

/// Frames per processing block, matching the Web Audio render quantum.
pub const RENDER_QUANTUM: usize = 128;

/// Seed used by [`SpeakerEngine::new`].
pub const DEFAULT_NOISE_SEED: u64 = 0;

/// Audio kept after the last command so the final fade-out is heard.
const RELEASE_TAIL_SECONDS: f64 = 0.1;

/// Longest render a single call may produce, in frames.
pub const MAX_RENDER_FRAMES: usize = 1 << 26;

/// The beeper's frequency before any tone is scheduled.
const IDLE_FREQUENCY: f64 = 440.0;

/// Renders scheduled beeper automation to mono f32 samples.
pub struct SpeakerEngine {
    pub sample_rate: f64,
    config: BeeperConfig,
    frequency: AutomationParam,
    amplitude: AutomationParam,
    vibrato_rate: AutomationParam,
    vibrato_depth: AutomationParam,
    noise_depth: AutomationParam,
    pitch_bend: AutomationParam,
    lfo: Oscillator,
    noise: WhiteNoise,
    quantizer: PitQuantizer,
    speaker: Oscillator,
    /// Absolute index of the next frame to render.
    frame: u64,
}

impl SpeakerEngine {
    pub fn new(sample_rate: f64, config: BeeperConfig) -> Result<Self, DosTuneError> {
        Self::with_seed(sample_rate, config, DEFAULT_NOISE_SEED)
    }

    pub fn with_seed(sample_rate: f64, config: BeeperConfig, noise_seed: u64) -> Result<Self, DosTuneError> {
        config.validate(sample_rate)?;
        let mut lfo = Oscillator::new(Waveform::Sine, sample_rate);
        lfo.frequency = 0.0;
        Ok(SpeakerEngine {
            sample_rate,
            config,
            frequency: AutomationParam::new(IDLE_FREQUENCY),
            amplitude: AutomationParam::new(0.0),
            vibrato_rate: AutomationParam::new(0.0),
            vibrato_depth: AutomationParam::new(0.0),
            noise_depth: AutomationParam::new(0.0),
            pitch_bend: AutomationParam::new(0.0),
            lfo,
            noise: WhiteNoise::new(noise_seed),
            quantizer: PitQuantizer::new(sample_rate, config.quantizer_options(), 1, 1),
            speaker: Oscillator::new(Waveform::Square, sample_rate),
            frame: 0,
        })
    }

    /// Seconds of audio rendered so far.
    pub fn current_time(&self) -> f64 {
        self.frame as f64 / self.sample_rate
    }

    /// Render the next `seconds` of audio.
    pub fn render(&mut self, seconds: f64) -> Result<Vec<f32>, DosTuneError> {
        Ok(self.render_with_frequency(seconds)?.0)
    }

    /// Render the next `seconds` of audio, also returning the quantized
    /// frequency that drove the speaker at every frame.
    pub fn render_with_frequency(&mut self, seconds: f64) -> Result<(Vec<f32>, Vec<f32>), DosTuneError> {
        let frames = (seconds.max(0.0) * self.sample_rate).round();
        if !(frames <= MAX_RENDER_FRAMES as f64) {
            return Err(DosTuneError::TooLong {
                what: "Render",
                length: frames,
                limit: MAX_RENDER_FRAMES,
            });
        }
        let total = frames as usize;
        let mut output = vec![0.0_f32; total];
        let mut frequency = vec![0.0_f32; total];

        let mut control = [0.0_f32; RENDER_QUANTUM];
        let mut pos = 0;
        while pos < total {
            let len = RENDER_QUANTUM.min(total - pos);
            self.fill_control(&mut control[..len]);
            self.quantizer
                .process_channel(0, 0, self.frame, &control[..len], &mut frequency[pos..pos + len]);
            self.drive_speaker(&frequency[pos..pos + len], &mut output[pos..pos + len]);
            self.frame += len as u64;
            pos += len;
        }

        Ok((output, frequency))
    }

    /// Sample the frequency parameters into an unquantized control signal:
    /// `frequency * (1 + vibrato + noise + bend)`.
    fn fill_control(&mut self, control: &mut [f32]) {
        for (i, out) in control.iter_mut().enumerate() {
            let t = (self.frame + i as u64) as f64 / self.sample_rate;
            self.lfo.frequency = self.vibrato_rate.value_at(t);
            let vibrato = self.vibrato_depth.value_at(t) * self.lfo.next_sample();
            let noise = self.noise_depth.value_at(t) * self.noise.next_sample() as f64;
            let bend = self.pitch_bend.value_at(t);
            *out = (self.frequency.value_at(t) * (1.0 + vibrato + noise + bend)) as f32;
        }
    }

    fn drive_speaker(&mut self, frequency: &[f32], output: &mut [f32]) {
        for (i, (&hz, out)) in frequency.iter().zip(output.iter_mut()).enumerate() {
            let t = (self.frame + i as u64) as f64 / self.sample_rate;
            self.speaker.frequency = hz as f64;
            let gain = self.amplitude.value_at(t) * self.config.volume;
            *out = (self.speaker.next_sample() * gain) as f32;
        }
    }
}

impl Beeper for SpeakerEngine {
    fn silence_at(&mut self, time: f64) {
        self.amplitude
            .set_target_at_time(0.0, time, self.config.transition_seconds);
    }

    fn tone_at(&mut self, time: f64, hz: f64, duration: Option<f64>) {
        let tc = self.config.transition_seconds;
        self.frequency.set_target_at_time(hz, time, tc);
        self.amplitude.set_target_at_time(1.0, time, tc);
        if let Some(duration) = duration {
            self.silence_at(time + duration);
        }
    }

    fn vibrato_at(&mut self, start_time: f64, rate_hz: f64, depth_semitones: f64, duration: f64) {
        self.vibrato_rate.set_value_at_time(rate_hz, start_time);
        self.vibrato_depth
            .set_value_at_time(semitone_offset(depth_semitones), start_time);
        self.vibrato_depth.set_value_at_time(0.0, start_time + duration);
    }

    fn noise_at(&mut self, start_time: f64, depth_semitones: f64, duration: f64) {
        self.noise_depth
            .set_value_at_time(semitone_offset(depth_semitones), start_time);
        self.noise_depth.set_value_at_time(0.0, start_time + duration);
    }

    fn pitch_bend(
        &mut self,
        start_time: f64,
        semitones: f64,
        duration: f64,
        options: PitchBendOptions,
    ) -> Result<(), DosTuneError> {
        let curve = PitchBendCurve::build(self.config.update_hz, start_time, semitones, duration, &options)?;
        self.pitch_bend.set_value_at_time(0.0, start_time);
        self.pitch_bend
            .set_value_curve_at_time(curve.samples, curve.curve_start, curve.curve_duration);
        self.pitch_bend.set_value_at_time(0.0, start_time + duration);
        Ok(())
    }
}

/// Schedule `tune` from t = 0 on a fresh engine and render all of it.
pub fn render_tune(tune: &Tune, sample_rate: f64, config: BeeperConfig) -> Result<Vec<f32>, DosTuneError> {
    let mut engine = SpeakerEngine::new(sample_rate, config)?;
    let end = schedule_tune(&mut engine, tune, 0.0)?;
    engine.render(end + RELEASE_TAIL_SECONDS)
}
