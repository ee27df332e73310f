//! Tune data model — the command tree and its JSON persistence.
//!
//! A tune document is `{ "tune": [ ...commands ] }`. Each command is a JSON
//! object tagged by `type`; scope commands hold their children in `commands`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DosTuneError;

/// Frequency of A4 in Hz.
pub const REFERENCE_FREQUENCY: f64 = 440.0;

/// Default octave for notes that omit one.
pub const DEFAULT_OCTAVE: i32 = 4;

// ── Pitch Classes ───────────────────────────────────────────

/// The twelve equal-tempered pitch classes, in ascending order from C.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PitchClass {
    #[serde(rename = "C")]
    C,
    #[serde(rename = "C#")]
    CSharp,
    #[serde(rename = "D")]
    D,
    #[serde(rename = "D#")]
    DSharp,
    #[serde(rename = "E")]
    E,
    #[serde(rename = "F")]
    F,
    #[serde(rename = "F#")]
    FSharp,
    #[serde(rename = "G")]
    G,
    #[serde(rename = "G#")]
    GSharp,
    #[serde(rename = "A")]
    A,
    #[serde(rename = "A#")]
    ASharp,
    #[serde(rename = "B")]
    B,
}

impl PitchClass {
    pub const ALL: [PitchClass; 12] = [
        PitchClass::C,
        PitchClass::CSharp,
        PitchClass::D,
        PitchClass::DSharp,
        PitchClass::E,
        PitchClass::F,
        PitchClass::FSharp,
        PitchClass::G,
        PitchClass::GSharp,
        PitchClass::A,
        PitchClass::ASharp,
        PitchClass::B,
    ];

    /// Position within the octave, C = 0 through B = 11.
    pub fn index(self) -> i32 {
        self as i32
    }

    pub fn symbol(self) -> &'static str {
        match self {
            PitchClass::C => "C",
            PitchClass::CSharp => "C#",
            PitchClass::D => "D",
            PitchClass::DSharp => "D#",
            PitchClass::E => "E",
            PitchClass::F => "F",
            PitchClass::FSharp => "F#",
            PitchClass::G => "G",
            PitchClass::GSharp => "G#",
            PitchClass::A => "A",
            PitchClass::ASharp => "A#",
            PitchClass::B => "B",
        }
    }

    /// Equal-tempered frequency of this pitch class in the given octave,
    /// tuned to A4 = 440 Hz.
    pub fn frequency(self, octave: i32) -> f64 {
        let semitones_from_a4 = 12 * (octave - 4) + (self.index() - PitchClass::A.index());
        REFERENCE_FREQUENCY * 2.0_f64.powf(semitones_from_a4 as f64 / 12.0)
    }
}

impl FromStr for PitchClass {
    type Err = DosTuneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PitchClass::ALL
            .into_iter()
            .find(|p| p.symbol() == s)
            .ok_or_else(|| DosTuneError::InvalidPitchClass(s.to_string()))
    }
}

impl fmt::Display for PitchClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Resolve a note symbol (`"C"`, `"F#"`, ...) and octave to Hz.
pub fn note_to_frequency(note: &str, octave: i32) -> Result<f64, DosTuneError> {
    Ok(note.parse::<PitchClass>()?.frequency(octave))
}

// ── Commands ────────────────────────────────────────────────

fn default_octave() -> i32 {
    DEFAULT_OCTAVE
}

fn default_beat_fraction() -> f64 {
    1.0
}

/// One node of the tune tree.
///
/// Scope variants never carry a duration of their own: they last exactly as
/// long as their children.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Command {
    /// Sets the tempo for every descendant.
    #[serde(rename = "bpm")]
    BpmScope {
        bpm: f64,
        #[serde(rename = "commands")]
        children: Vec<Command>,
    },
    /// A tone at a literal frequency.
    #[serde(rename = "hz")]
    PlayFrequency {
        hz: f64,
        #[serde(rename = "ms")]
        milliseconds: f64,
    },
    /// A literal-length rest.
    #[serde(rename = "off")]
    Silence {
        #[serde(rename = "ms")]
        milliseconds: f64,
    },
    /// A pitched note lasting `beat_fraction` sixteenth notes.
    #[serde(rename = "note")]
    PlayNote {
        note: PitchClass,
        #[serde(default = "default_octave")]
        octave: i32,
        #[serde(rename = "semiquavers", default = "default_beat_fraction")]
        beat_fraction: f64,
    },
    /// A rest lasting `beat_fraction` sixteenth notes.
    #[serde(rename = "rest")]
    Rest {
        #[serde(rename = "semiquavers", default = "default_beat_fraction")]
        beat_fraction: f64,
    },
    /// Sinusoidal pitch modulation over the children.
    #[serde(rename = "vibrato")]
    VibratoScope {
        #[serde(rename = "hz")]
        rate_hz: f64,
        #[serde(rename = "semitones")]
        depth_semitones: f64,
        #[serde(rename = "commands")]
        children: Vec<Command>,
    },
    /// Reserved detune ornament; plays its children unchanged.
    #[serde(rename = "perturb")]
    PerturbScope {
        semitones: f64,
        #[serde(rename = "commands")]
        children: Vec<Command>,
    },
    /// A glide of `semitones` spread over the children.
    #[serde(rename = "bend")]
    PitchBendScope {
        semitones: f64,
        #[serde(rename = "commands")]
        children: Vec<Command>,
    },
}

impl Command {
    /// Convenience constructor for a note with the default octave and length.
    pub fn note(note: PitchClass) -> Self {
        Command::PlayNote {
            note,
            octave: DEFAULT_OCTAVE,
            beat_fraction: 1.0,
        }
    }

    /// The `type` tag used in the persisted form.
    pub fn tag(&self) -> &'static str {
        match self {
            Command::BpmScope { .. } => "bpm",
            Command::PlayFrequency { .. } => "hz",
            Command::Silence { .. } => "off",
            Command::PlayNote { .. } => "note",
            Command::Rest { .. } => "rest",
            Command::VibratoScope { .. } => "vibrato",
            Command::PerturbScope { .. } => "perturb",
            Command::PitchBendScope { .. } => "bend",
        }
    }

    /// Child commands of a scope, `None` for leaf commands.
    pub fn children(&self) -> Option<&[Command]> {
        match self {
            Command::BpmScope { children, .. }
            | Command::VibratoScope { children, .. }
            | Command::PerturbScope { children, .. }
            | Command::PitchBendScope { children, .. } => Some(children),
            Command::PlayFrequency { .. }
            | Command::Silence { .. }
            | Command::PlayNote { .. }
            | Command::Rest { .. } => None,
        }
    }

    fn validate(&self, path: &str) -> Result<(), DosTuneError> {
        let invalid = |message: String| DosTuneError::InvalidCommand {
            path: path.to_string(),
            message,
        };
        match self {
            Command::BpmScope { bpm, .. } => {
                if !bpm.is_finite() || *bpm <= 0.0 {
                    return Err(invalid(format!("bpm must be positive, got {bpm}")));
                }
            }
            Command::PlayFrequency { hz, milliseconds } => {
                if !(*hz >= 0.0) {
                    return Err(invalid(format!("hz must be non-negative, got {hz}")));
                }
                if !(*milliseconds >= 0.0) {
                    return Err(invalid(format!("ms must be non-negative, got {milliseconds}")));
                }
            }
            Command::Silence { milliseconds } => {
                if !(*milliseconds >= 0.0) {
                    return Err(invalid(format!("ms must be non-negative, got {milliseconds}")));
                }
            }
            Command::PlayNote { beat_fraction, .. } | Command::Rest { beat_fraction } => {
                if !(*beat_fraction >= 0.0) {
                    return Err(invalid(format!(
                        "semiquavers must be non-negative, got {beat_fraction}"
                    )));
                }
            }
            Command::VibratoScope { .. }
            | Command::PerturbScope { .. }
            | Command::PitchBendScope { .. } => {}
        }

        if let Some(children) = self.children() {
            validate_list(children, &format!("{path}.commands"))?;
        }
        Ok(())
    }
}

fn validate_list(commands: &[Command], path: &str) -> Result<(), DosTuneError> {
    for (i, cmd) in commands.iter().enumerate() {
        cmd.validate(&format!("{path}[{i}]"))?;
    }
    Ok(())
}

// ── Tune Document ───────────────────────────────────────────

/// A persisted tune: `{ "tune": Command[] }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tune {
    pub tune: Vec<Command>,
}

impl Tune {
    pub fn new(commands: Vec<Command>) -> Self {
        Tune { tune: commands }
    }

    /// Parse and validate a tune document.
    pub fn from_json(json: &str) -> Result<Self, DosTuneError> {
        let tune: Tune = serde_json::from_str(json)?;
        tune.validate()?;
        Ok(tune)
    }

    pub fn to_json(&self) -> Result<String, DosTuneError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Replace this tune with the one in `json`. On any error `self` is left
    /// untouched.
    pub fn reload(&mut self, json: &str) -> Result<(), DosTuneError> {
        *self = Tune::from_json(json)?;
        Ok(())
    }

    /// Check every command for values the scheduler cannot honour.
    pub fn validate(&self) -> Result<(), DosTuneError> {
        validate_list(&self.tune, "tune")
    }

    pub fn commands(&self) -> &[Command] {
        &self.tune
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn a4_is_exactly_440() {
        assert_eq!(note_to_frequency("A", 4).unwrap(), 440.0);
    }

    #[test]
    fn a5_is_exactly_880() {
        assert_eq!(note_to_frequency("A", 5).unwrap(), 880.0);
    }

    #[test]
    fn c4_is_middle_c() {
        assert_abs_diff_eq!(note_to_frequency("C", 4).unwrap(), 261.626, epsilon = 1e-2);
    }

    #[test]
    fn sharps_sit_between_naturals() {
        let c = PitchClass::C.frequency(4);
        let cs = PitchClass::CSharp.frequency(4);
        let d = PitchClass::D.frequency(4);
        assert!(c < cs && cs < d);
        assert_abs_diff_eq!(cs / c, 2.0_f64.powf(1.0 / 12.0), epsilon = 1e-12);
    }

    #[test]
    fn unknown_pitch_class_fails() {
        let err = note_to_frequency("H", 4).unwrap_err();
        assert!(matches!(err, DosTuneError::InvalidPitchClass(ref s) if s == "H"));
        // Flats are not part of the symbol set.
        assert!(note_to_frequency("Bb", 4).is_err());
    }

    #[test]
    fn pitch_class_symbols_roundtrip() {
        for p in PitchClass::ALL {
            assert_eq!(p.symbol().parse::<PitchClass>().unwrap(), p);
            assert_eq!(p.to_string(), p.symbol());
        }
    }

    #[test]
    fn parses_every_command_type() {
        let json = r#"{"tune":[
            {"type":"bpm","bpm":90,"commands":[
                {"type":"note","note":"C#","octave":5,"semiquavers":2},
                {"type":"rest","semiquavers":4}
            ]},
            {"type":"hz","hz":1000,"ms":250},
            {"type":"off","ms":100},
            {"type":"vibrato","hz":6,"semitones":0.5,"commands":[{"type":"note","note":"A"}]},
            {"type":"perturb","semitones":1,"commands":[]},
            {"type":"bend","semitones":-3,"commands":[{"type":"rest"}]}
        ]}"#;
        let tune = Tune::from_json(json).unwrap();
        assert_eq!(tune.tune.len(), 6);
        assert_eq!(
            tune.tune[0],
            Command::BpmScope {
                bpm: 90.0,
                children: vec![
                    Command::PlayNote {
                        note: PitchClass::CSharp,
                        octave: 5,
                        beat_fraction: 2.0,
                    },
                    Command::Rest { beat_fraction: 4.0 },
                ],
            }
        );
        assert_eq!(
            tune.tune[1],
            Command::PlayFrequency {
                hz: 1000.0,
                milliseconds: 250.0,
            }
        );
        let tags: Vec<_> = tune.tune.iter().map(Command::tag).collect();
        assert_eq!(tags, ["bpm", "hz", "off", "vibrato", "perturb", "bend"]);
    }

    #[test]
    fn note_and_rest_defaults() {
        let tune = Tune::from_json(r#"{"tune":[{"type":"note","note":"G"},{"type":"rest"}]}"#)
            .unwrap();
        assert_eq!(tune.tune[0], Command::note(PitchClass::G));
        assert_eq!(tune.tune[1], Command::Rest { beat_fraction: 1.0 });
    }

    #[test]
    fn serializes_with_persisted_field_names() {
        let tune = Tune::new(vec![Command::VibratoScope {
            rate_hz: 5.0,
            depth_semitones: 1.0,
            children: vec![Command::Silence { milliseconds: 10.0 }],
        }]);
        let value: serde_json::Value = serde_json::from_str(&tune.to_json().unwrap()).unwrap();
        let vib = &value["tune"][0];
        assert_eq!(vib["type"], "vibrato");
        assert_eq!(vib["hz"], 5.0);
        assert_eq!(vib["semitones"], 1.0);
        assert_eq!(vib["commands"][0]["type"], "off");
        assert_eq!(vib["commands"][0]["ms"], 10.0);
    }

    #[test]
    fn unknown_command_type_is_rejected() {
        let err = Tune::from_json(r#"{"tune":[{"type":"arpeggio","commands":[]}]}"#).unwrap_err();
        assert!(matches!(err, DosTuneError::MalformedTune(_)));
    }

    #[test]
    fn unknown_note_symbol_is_rejected_on_load() {
        let err = Tune::from_json(r#"{"tune":[{"type":"note","note":"X"}]}"#).unwrap_err();
        assert!(matches!(err, DosTuneError::MalformedTune(_)));
    }

    #[test]
    fn negative_duration_is_rejected_with_path() {
        let err = Tune::from_json(
            r#"{"tune":[{"type":"bpm","bpm":120,"commands":[{"type":"off","ms":10},{"type":"off","ms":-5}]}]}"#,
        )
        .unwrap_err();
        match err {
            DosTuneError::InvalidCommand { path, .. } => assert_eq!(path, "tune[0].commands[1]"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn zero_bpm_is_rejected() {
        let err = Tune::from_json(r#"{"tune":[{"type":"bpm","bpm":0,"commands":[]}]}"#).unwrap_err();
        assert!(matches!(err, DosTuneError::InvalidCommand { .. }));
    }

    #[test]
    fn failed_reload_keeps_previous_tune() {
        let mut tune = Tune::new(vec![Command::note(PitchClass::E)]);
        let before = tune.clone();
        assert!(tune.reload("not json").is_err());
        assert_eq!(tune, before);
        assert!(tune.reload(r#"{"tune":[{"type":"hz","hz":-1,"ms":5}]}"#).is_err());
        assert_eq!(tune, before);

        tune.reload(r#"{"tune":[]}"#).unwrap();
        assert!(tune.tune.is_empty());
    }
}
