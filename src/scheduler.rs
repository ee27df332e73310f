//! Tune interpreter — walks a command tree and schedules it onto a [`Beeper`].
//!
//! Every level of the walk owns a single cursor. Siblings are placed one after
//! another; a scope's children start at the scope's cursor and the scope ends
//! wherever its last child ends. Ornament scopes (vibrato, bend) are applied
//! retroactively: the children are scheduled first, and the measured span is
//! what the envelope covers.

use crate::beeper::{Beeper, PitchBendOptions};
use crate::duration::{DEFAULT_BPM, TempoContext};
use crate::error::DosTuneError;
use crate::tune::{Command, Tune};

/// Silence left at the end of every note so consecutive notes separate.
pub const NOTE_GAP: f64 = 0.01;

/// Schedule `commands` starting at `start_time` (seconds) at `bpm`.
///
/// Returns the time at which the last command ends, which is always
/// `start_time + list_duration(commands, bpm)`. Fails with `InvalidTempo`
/// before scheduling anything if `bpm` is not a positive finite number.
pub fn schedule<B: Beeper + ?Sized>(
    sink: &mut B,
    commands: &[Command],
    start_time: f64,
    bpm: f64,
) -> Result<f64, DosTuneError> {
    let tempo = TempoContext::checked(bpm)?;
    let mut cursor = start_time;

    for cmd in commands {
        match cmd {
            Command::PlayNote { note, octave, .. } => {
                let duration = cmd.duration(tempo);
                let gate = (duration - NOTE_GAP).max(0.0);
                sink.tone_at(cursor, note.frequency(*octave), Some(gate));
                cursor += duration;
            }
            Command::Rest { .. } | Command::Silence { .. } => {
                cursor += cmd.duration(tempo);
            }
            Command::BpmScope { bpm, children } => {
                cursor = schedule(sink, children, cursor, *bpm)?;
            }
            Command::PlayFrequency { hz, milliseconds } => {
                let duration = milliseconds / 1000.0;
                sink.tone_at(cursor, *hz, Some(duration));
                cursor += duration;
            }
            Command::VibratoScope {
                rate_hz,
                depth_semitones,
                children,
            } => {
                let scope_start = cursor;
                cursor = schedule(sink, children, scope_start, bpm)?;
                sink.vibrato_at(scope_start, *rate_hz, *depth_semitones, cursor - scope_start);
            }
            Command::PitchBendScope {
                semitones,
                children,
            } => {
                let scope_start = cursor;
                cursor = schedule(sink, children, scope_start, bpm)?;
                sink.pitch_bend(
                    scope_start,
                    *semitones,
                    cursor - scope_start,
                    PitchBendOptions::default(),
                )?;
            }
            // No ornament of its own yet; only the children sound.
            Command::PerturbScope { children, .. } => {
                cursor = schedule(sink, children, cursor, bpm)?;
            }
        }
    }

    Ok(cursor)
}

/// Schedule a whole tune at the default tempo.
pub fn schedule_tune<B: Beeper + ?Sized>(
    sink: &mut B,
    tune: &Tune,
    start_time: f64,
) -> Result<f64, DosTuneError> {
    schedule(sink, tune.commands(), start_time, DEFAULT_BPM)
}
