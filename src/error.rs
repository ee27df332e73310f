use thiserror::Error;

/// Everything that can go wrong between loading a tune and handing audio to the host.
#[derive(Error, Debug)]
pub enum DosTuneError {
    /// A note symbol outside the twelve recognised pitch classes.
    #[error("Invalid pitch class '{0}'")]
    InvalidPitchClass(String),

    /// Pitch-bend delays that do not fit inside the bend duration.
    #[error(
        "Invalid delay: start delay {start_delay}s + end delay {end_delay}s exceeds duration {duration}s"
    )]
    InvalidDelay {
        duration: f64,
        start_delay: f64,
        end_delay: f64,
    },

    /// A tempo that would stall the cursor or run it backwards.
    #[error("Invalid tempo: bpm must be positive and finite, got {0}")]
    InvalidTempo(f64),

    /// Beeper or render settings the engine cannot run with.
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// A buffer that would exceed its allocation limit.
    #[error("{what} too long: {length} samples exceeds the limit of {limit}")]
    TooLong {
        what: &'static str,
        length: f64,
        limit: usize,
    },

    /// The tune document is not valid JSON, or a command has an unknown
    /// `type` tag or ill-typed fields.
    #[error("Malformed tune: {0}")]
    MalformedTune(#[from] serde_json::Error),

    /// The tune parsed but a command carries an impossible value.
    #[error("Invalid command at {path}: {message}")]
    InvalidCommand { path: String, message: String },

    #[error("WAV encoding failed: {0}")]
    Wav(#[from] hound::Error),
}
