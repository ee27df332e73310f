//! Wall-clock length of commands under a tempo context.

use crate::error::DosTuneError;
use crate::tune::{Command, Tune};

/// Tempo used when no `bpm` scope encloses a command.
pub const DEFAULT_BPM: f64 = 120.0;

/// The tempo in force at some point of the tree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TempoContext {
    pub bpm: f64,
}

impl Default for TempoContext {
    fn default() -> Self {
        TempoContext { bpm: DEFAULT_BPM }
    }
}

impl TempoContext {
    pub fn new(bpm: f64) -> Self {
        TempoContext { bpm }
    }

    /// A tempo supplied from outside the tune. Zero, negative and
    /// non-finite values are rejected so the cursor can only move forward.
    pub fn checked(bpm: f64) -> Result<Self, DosTuneError> {
        if bpm.is_finite() && bpm > 0.0 {
            Ok(TempoContext { bpm })
        } else {
            Err(DosTuneError::InvalidTempo(bpm))
        }
    }

    /// Seconds taken by `beat_fraction` sixteenth notes. A quarter note is
    /// `60 / bpm` seconds.
    pub fn semiquavers_to_seconds(&self, beat_fraction: f64) -> f64 {
        beat_fraction / (4.0 * self.bpm / 60.0)
    }
}

impl Command {
    /// Length of this command in seconds.
    pub fn duration(&self, tempo: TempoContext) -> f64 {
        match self {
            Command::BpmScope { bpm, children } => list_duration(children, TempoContext::new(*bpm)),
            Command::PlayFrequency { milliseconds, .. } | Command::Silence { milliseconds } => {
                milliseconds / 1000.0
            }
            Command::PlayNote { beat_fraction, .. } | Command::Rest { beat_fraction } => {
                tempo.semiquavers_to_seconds(*beat_fraction)
            }
            Command::VibratoScope { children, .. }
            | Command::PerturbScope { children, .. }
            | Command::PitchBendScope { children, .. } => list_duration(children, tempo),
        }
    }
}

/// Length of a command sequence in seconds: the sum of its members.
pub fn list_duration(commands: &[Command], tempo: TempoContext) -> f64 {
    commands.iter().map(|cmd| cmd.duration(tempo)).sum()
}

impl Tune {
    /// Total length of the tune when started at `bpm`.
    pub fn duration(&self, bpm: f64) -> Result<f64, DosTuneError> {
        Ok(list_duration(&self.tune, TempoContext::checked(bpm)?))
    }
}
