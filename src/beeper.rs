//! Beeper sink — the timed automation primitives the scheduler drives.
//!
//! A [`Beeper`] receives absolute-time instructions (tone on, silence,
//! vibrato, noise, pitch bend). [`EventLog`] records them for a browser host
//! to replay onto Web Audio parameters; `dsp::engine::SpeakerEngine` turns
//! them into samples natively.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::config::DEFAULT_UPDATE_HZ;
use crate::error::DosTuneError;

/// Frequency ratio offset for a pitch shift: `2^(semitones/12) - 1`.
/// Zero means "unchanged".
pub fn semitone_offset(semitones: f64) -> f64 {
    2.0_f64.powf(semitones / 12.0) - 1.0
}

/// Easing curves for pitch bends, mapping `[0, 1]` onto `[0, 1]`.
pub mod ease {
    pub fn linear(v: f64) -> f64 {
        v
    }

    /// Fast start, gentle landing.
    pub fn out_cubic(v: f64) -> f64 {
        let omv = 1.0 - v;
        1.0 - omv * omv * omv
    }

    pub fn in_quad(v: f64) -> f64 {
        v * v
    }

    /// `v^exponent`; 1 is linear, larger values start slower.
    pub fn power(exponent: f64) -> impl Fn(f64) -> f64 + Send + Sync + Clone {
        move |v| v.powf(exponent)
    }
}

/// A shaping function over `[0, 1]`, shareable across threads.
pub type Ease = Arc<dyn Fn(f64) -> f64 + Send + Sync>;

/// Most points a single bend curve may hold.
pub const MAX_CURVE_SAMPLES: usize = 1 << 22;

/// Shape of a pitch bend within its window.
#[derive(Clone)]
pub struct PitchBendOptions {
    /// Seconds held at zero before the glide starts.
    pub start_delay: f64,
    /// Seconds held at zero after the glide ends.
    pub end_delay: f64,
    pub ease: Ease,
}

impl PitchBendOptions {
    pub fn with_ease(mut self, ease: impl Fn(f64) -> f64 + Send + Sync + 'static) -> Self {
        self.ease = Arc::new(ease);
        self
    }
}

impl Default for PitchBendOptions {
    fn default() -> Self {
        PitchBendOptions {
            start_delay: 0.0,
            end_delay: 0.0,
            ease: Arc::new(ease::linear),
        }
    }
}

impl fmt::Debug for PitchBendOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PitchBendOptions")
            .field("start_delay", &self.start_delay)
            .field("end_delay", &self.end_delay)
            .finish_non_exhaustive()
    }
}

/// A sampled pitch-bend glide, ready to be played back as a value curve.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PitchBendCurve {
    /// When the glide starts (bend start + start delay).
    pub curve_start: f64,
    /// Length of the glide, excluding both delays.
    pub curve_duration: f64,
    /// `buffer_len + 1` offsets, interpolated linearly by the host.
    pub samples: Vec<f32>,
}

impl PitchBendCurve {
    /// Sample `ease` at `update_hz` across the active part of the bend.
    ///
    /// Fails without allocating when the rate is not a positive finite
    /// number or the curve would exceed [`MAX_CURVE_SAMPLES`].
    pub fn build(
        update_hz: f64,
        start_time: f64,
        semitones: f64,
        duration: f64,
        options: &PitchBendOptions,
    ) -> Result<Self, DosTuneError> {
        if !(update_hz.is_finite() && update_hz > 0.0) {
            return Err(DosTuneError::InvalidConfig(format!(
                "update rate must be positive and finite, got {update_hz}"
            )));
        }
        let active = duration - options.start_delay - options.end_delay;
        if !(active >= 0.0) {
            return Err(DosTuneError::InvalidDelay {
                duration,
                start_delay: options.start_delay,
                end_delay: options.end_delay,
            });
        }

        let length = (update_hz * active).floor();
        if !(length <= MAX_CURVE_SAMPLES as f64) {
            return Err(DosTuneError::TooLong {
                what: "Pitch-bend curve",
                length,
                limit: MAX_CURVE_SAMPLES,
            });
        }
        let buffer_len = length as usize;
        let max_value = semitone_offset(semitones);
        let mut samples = Vec::with_capacity(buffer_len + 1);
        for i in 0..buffer_len {
            samples.push(((options.ease)(i as f64 / buffer_len as f64) * max_value) as f32);
        }
        samples.push(((options.ease)(1.0) * max_value) as f32);

        Ok(PitchBendCurve {
            curve_start: start_time + options.start_delay,
            curve_duration: active,
            samples,
        })
    }
}

/// Receiver of scheduled beeper automation. All times are absolute seconds
/// on the host's audio clock.
pub trait Beeper {
    /// Fade the speaker out.
    fn silence_at(&mut self, time: f64);

    /// Glide to `hz` and fade in at `time`; fade out again after `duration`
    /// when one is given.
    fn tone_at(&mut self, time: f64, hz: f64, duration: Option<f64>);

    /// Sinusoidal modulation of `depth_semitones` at `rate_hz` for `duration`.
    fn vibrato_at(&mut self, start_time: f64, rate_hz: f64, depth_semitones: f64, duration: f64);

    /// White-noise modulation of `depth_semitones` for `duration`.
    fn noise_at(&mut self, start_time: f64, depth_semitones: f64, duration: f64);

    /// Bend the pitch by `semitones` over `duration`, holding zero outside
    /// the curve. Fails before scheduling anything if the delays do not fit.
    fn pitch_bend(
        &mut self,
        start_time: f64,
        semitones: f64,
        duration: f64,
        options: PitchBendOptions,
    ) -> Result<(), DosTuneError>;
}

// ── Event Log ───────────────────────────────────────────────

/// One recorded beeper instruction.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum BeeperEvent {
    /// Frequency → `hz`, amplitude → 1.
    Tone { time: f64, hz: f64 },
    /// Amplitude → 0.
    Silence { time: f64 },
    /// LFO rate and depth set at `start_time`, depth back to 0 at `end_time`.
    Vibrato {
        start_time: f64,
        end_time: f64,
        rate_hz: f64,
        depth: f64,
    },
    /// Noise depth set at `start_time`, back to 0 at `end_time`.
    Noise {
        start_time: f64,
        end_time: f64,
        depth: f64,
    },
    /// Bend held at 0 from `start_time`, curve played, 0 again at `end_time`.
    PitchBend {
        start_time: f64,
        end_time: f64,
        curve: PitchBendCurve,
    },
}

/// A beeper that only records what it is told, in call order.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventLog {
    pub update_hz: f64,
    pub events: Vec<BeeperEvent>,
}

impl Default for EventLog {
    fn default() -> Self {
        EventLog::new(DEFAULT_UPDATE_HZ)
    }
}

impl EventLog {
    pub fn new(update_hz: f64) -> Self {
        EventLog {
            update_hz,
            events: Vec::new(),
        }
    }

    /// Tone-on events as `(time, hz)` pairs.
    pub fn tones(&self) -> Vec<(f64, f64)> {
        self.events
            .iter()
            .filter_map(|e| match e {
                BeeperEvent::Tone { time, hz } => Some((*time, *hz)),
                _ => None,
            })
            .collect()
    }

    /// Times of all silence events.
    pub fn silences(&self) -> Vec<f64> {
        self.events
            .iter()
            .filter_map(|e| match e {
                BeeperEvent::Silence { time } => Some(*time),
                _ => None,
            })
            .collect()
    }
}

impl Beeper for EventLog {
    fn silence_at(&mut self, time: f64) {
        self.events.push(BeeperEvent::Silence { time });
    }

    fn tone_at(&mut self, time: f64, hz: f64, duration: Option<f64>) {
        self.events.push(BeeperEvent::Tone { time, hz });
        if let Some(duration) = duration {
            self.events.push(BeeperEvent::Silence {
                time: time + duration,
            });
        }
    }

    fn vibrato_at(&mut self, start_time: f64, rate_hz: f64, depth_semitones: f64, duration: f64) {
        self.events.push(BeeperEvent::Vibrato {
            start_time,
            end_time: start_time + duration,
            rate_hz,
            depth: semitone_offset(depth_semitones),
        });
    }

    fn noise_at(&mut self, start_time: f64, depth_semitones: f64, duration: f64) {
        self.events.push(BeeperEvent::Noise {
            start_time,
            end_time: start_time + duration,
            depth: semitone_offset(depth_semitones),
        });
    }

    fn pitch_bend(
        &mut self,
        start_time: f64,
        semitones: f64,
        duration: f64,
        options: PitchBendOptions,
    ) -> Result<(), DosTuneError> {
        let curve = PitchBendCurve::build(self.update_hz, start_time, semitones, duration, &options)?;
        self.events.push(BeeperEvent::PitchBend {
            start_time,
            end_time: start_time + duration,
            curve,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn octave_offset_is_one() {
        assert_eq!(semitone_offset(12.0), 1.0);
        assert_eq!(semitone_offset(0.0), 0.0);
        assert_abs_diff_eq!(semitone_offset(-12.0), -0.5, epsilon = 1e-12);
    }

    #[test]
    fn curve_boundaries_with_linear_ease() {
        let curve = PitchBendCurve::build(64.0, 2.0, 12.0, 1.0, &PitchBendOptions::default()).unwrap();
        assert_eq!(curve.samples.len(), 65);
        assert_eq!(curve.samples[0], 0.0);
        assert_eq!(curve.samples[64], 1.0);
        assert_abs_diff_eq!(curve.samples[32], 0.5, epsilon = 1e-6);
        assert_eq!(curve.curve_start, 2.0);
        assert_eq!(curve.curve_duration, 1.0);
    }

    #[test]
    fn curve_is_monotonic_for_monotonic_ease() {
        let opts = PitchBendOptions::default().with_ease(ease::out_cubic);
        let curve = PitchBendCurve::build(64.0, 0.0, -3.0, 0.75, &opts).unwrap();
        let max_value = semitone_offset(-3.0) as f32;
        assert_eq!(curve.samples[0], 0.0);
        assert_abs_diff_eq!(*curve.samples.last().unwrap(), max_value, epsilon = 1e-7);
        assert!(curve.samples.windows(2).all(|w| w[1] <= w[0]));
    }

    #[test]
    fn delays_shrink_the_active_window() {
        let opts = PitchBendOptions {
            start_delay: 0.25,
            end_delay: 0.25,
            ..Default::default()
        }
        .with_ease(ease::in_quad);
        let curve = PitchBendCurve::build(64.0, 1.0, 2.0, 1.0, &opts).unwrap();
        assert_eq!(curve.curve_start, 1.25);
        assert_eq!(curve.curve_duration, 0.5);
        assert_eq!(curve.samples.len(), 33);
    }

    #[test]
    fn zero_length_bend_is_a_single_sample() {
        let curve = PitchBendCurve::build(64.0, 0.0, 12.0, 0.0, &PitchBendOptions::default()).unwrap();
        assert_eq!(curve.samples, vec![1.0]);
    }

    #[test]
    fn capturing_ease_shapes_the_curve() {
        let opts = PitchBendOptions::default().with_ease(ease::power(3.0));
        let curve = PitchBendCurve::build(4.0, 0.0, 12.0, 1.0, &opts).unwrap();
        assert_eq!(curve.samples, vec![0.0, 0.015625, 0.125, 0.421875, 1.0]);
    }

    #[test]
    fn unusable_update_rate_fails_without_allocating() {
        let opts = PitchBendOptions::default();
        for rate in [0.0, -64.0, f64::NAN, f64::INFINITY] {
            let err = PitchBendCurve::build(rate, 0.0, 12.0, 1.0, &opts).unwrap_err();
            assert!(matches!(err, DosTuneError::InvalidConfig(_)), "rate {rate}");
        }
        let err = PitchBendCurve::build(1e20, 0.0, 12.0, 2.0, &opts).unwrap_err();
        assert!(matches!(err, DosTuneError::TooLong { .. }));
        let err = PitchBendCurve::build(64.0, 0.0, 12.0, f64::INFINITY, &opts).unwrap_err();
        assert!(matches!(err, DosTuneError::TooLong { .. }));
    }

    #[test]
    fn event_log_rejects_huge_update_rate() {
        let mut log = EventLog::new(1e20);
        let err = log.pitch_bend(0.0, 12.0, 2.0, PitchBendOptions::default()).unwrap_err();
        assert!(matches!(err, DosTuneError::TooLong { .. }));
        assert!(log.events.is_empty());
    }

    #[test]
    fn oversized_delays_fail_before_recording() {
        let mut log = EventLog::default();
        let opts = PitchBendOptions {
            start_delay: 0.6,
            end_delay: 0.6,
            ..Default::default()
        };
        let err = log.pitch_bend(0.0, 1.0, 1.0, opts).unwrap_err();
        assert!(matches!(err, DosTuneError::InvalidDelay { .. }));
        assert!(log.events.is_empty());
    }

    #[test]
    fn tone_with_duration_records_silence() {
        let mut log = EventLog::default();
        log.tone_at(1.0, 440.0, Some(0.5));
        log.tone_at(2.0, 220.0, None);
        assert_eq!(log.tones(), vec![(1.0, 440.0), (2.0, 220.0)]);
        assert_eq!(log.silences(), vec![1.5]);
    }

    #[test]
    fn vibrato_and_noise_depths_are_ratios() {
        let mut log = EventLog::default();
        log.vibrato_at(0.5, 6.0, 12.0, 1.0);
        log.noise_at(0.0, 12.0, 0.25);
        assert_eq!(
            log.events,
            vec![
                BeeperEvent::Vibrato {
                    start_time: 0.5,
                    end_time: 1.5,
                    rate_hz: 6.0,
                    depth: 1.0,
                },
                BeeperEvent::Noise {
                    start_time: 0.0,
                    end_time: 0.25,
                    depth: 1.0,
                },
            ]
        );
    }

    #[test]
    fn events_serialize_for_the_host() {
        let mut log = EventLog::default();
        log.tone_at(0.0, 440.0, None);
        log.pitch_bend(0.0, 12.0, 0.0, PitchBendOptions::default()).unwrap();
        let value = serde_json::to_value(&log).unwrap();
        assert_eq!(value["updateHz"], 64.0);
        assert_eq!(value["events"][0]["type"], "tone");
        assert_eq!(value["events"][1]["type"], "pitchBend");
        assert_eq!(value["events"][1]["curve"]["curveStart"], 0.0);
        assert_eq!(value["events"][1]["curve"]["samples"][0], 1.0);
    }
}
