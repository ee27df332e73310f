pub mod beeper;
pub mod config;
pub mod dsp;
pub mod duration;
pub mod error;
mod log;
pub mod scheduler;
pub mod tune;

pub use crate::beeper::{Beeper, BeeperEvent, EventLog};
pub use crate::config::{BeeperConfig, QuantizerOptions};
pub use crate::error::DosTuneError;
pub use crate::tune::{Command, PitchClass, Tune};

use crate::dsp::noise::WhiteNoise;
use crate::dsp::quantizer::PitQuantizer;
use crate::duration::DEFAULT_BPM;
use crate::log::console_log;
use serde::Serialize;
use wasm_bindgen::prelude::*;

/// The crate version, read from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Registration name of the quantizer processing stage.
pub const PIT_QUANTIZER_PROCESSOR: &str = "pit-quantizer";

/// Registration name of the white-noise processing stage.
pub const WHITE_NOISE_PROCESSOR: &str = "white-noise";

/// Route panics to the browser console.
#[cfg(feature = "console_error_panic_hook")]
#[wasm_bindgen(start)]
pub fn init_panic_hook() {
    console_error_panic_hook::set_once();
}

/// WASM-exposed: return the dostune-core version string.
#[wasm_bindgen]
pub fn core_version() -> String {
    VERSION.to_string()
}

/// WASM-exposed: names under which the processing stages register.
#[wasm_bindgen]
pub fn processor_names() -> Vec<String> {
    vec![
        PIT_QUANTIZER_PROCESSOR.to_string(),
        WHITE_NOISE_PROCESSOR.to_string(),
    ]
}

/// A scheduled tune, ready to be replayed onto host audio parameters.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    pub end_time: f64,
    pub update_hz: f64,
    pub events: Vec<BeeperEvent>,
}

/// Load a tune document and schedule it onto an [`EventLog`].
pub fn schedule_document(json: &str, start_time: f64, bpm: f64, update_hz: f64) -> Result<Schedule, DosTuneError> {
    let tune = Tune::from_json(json)?;
    let mut log = EventLog::new(update_hz);
    let end_time = scheduler::schedule(&mut log, tune.commands(), start_time, bpm)?;
    Ok(Schedule {
        end_time,
        update_hz: log.update_hz,
        events: log.events,
    })
}

fn to_js_error(err: DosTuneError) -> JsValue {
    console_log!("dostune: {err}");
    JsValue::from_str(&err.to_string())
}

fn load_tune(json: &str) -> Result<Tune, JsValue> {
    Tune::from_json(json).map_err(to_js_error)
}

/// `undefined` and `null` mean "all defaults".
fn options_from_js<T: Default + serde::de::DeserializeOwned>(value: JsValue) -> Result<T, JsValue> {
    if value.is_undefined() || value.is_null() {
        return Ok(T::default());
    }
    serde_wasm_bindgen::from_value(value).map_err(|e| JsValue::from_str(&format!("{e}")))
}

/// WASM-exposed: total length of a tune document in seconds at `bpm`
/// (120 when omitted).
#[wasm_bindgen]
pub fn tune_duration(json: &str, bpm: Option<f64>) -> Result<f64, JsValue> {
    load_tune(json)?
        .duration(bpm.unwrap_or(DEFAULT_BPM))
        .map_err(to_js_error)
}

/// WASM-exposed: schedule a tune document from `start_time` and return
/// `{ endTime, updateHz, events }` for the host to apply. `bpm` defaults
/// to 120 when omitted.
#[wasm_bindgen]
pub fn schedule_tune(json: &str, start_time: f64, bpm: Option<f64>) -> Result<JsValue, JsValue> {
    let bpm = bpm.unwrap_or(DEFAULT_BPM);
    let schedule =
        schedule_document(json, start_time, bpm, config::DEFAULT_UPDATE_HZ).map_err(to_js_error)?;
    serde_wasm_bindgen::to_value(&schedule).map_err(|e| JsValue::from_str(&format!("{e}")))
}

/// WASM-exposed: frequency of `note` (e.g. `"F#"`) in `octave`.
#[wasm_bindgen]
pub fn note_to_frequency(note: &str, octave: i32) -> Result<f64, JsValue> {
    tune::note_to_frequency(note, octave).map_err(to_js_error)
}

/// WASM-exposed: render a tune document to mono f32 samples.
#[wasm_bindgen]
pub fn render_tune_samples(json: &str, sample_rate: u32, config: JsValue) -> Result<Vec<f32>, JsValue> {
    let tune = load_tune(json)?;
    let config: BeeperConfig = options_from_js(config)?;
    dsp::engine::render_tune(&tune, sample_rate as f64, config).map_err(to_js_error)
}

/// WASM-exposed: render a tune document to a 16-bit mono WAV byte array.
#[wasm_bindgen]
pub fn render_tune_wav(json: &str, sample_rate: u32, config: JsValue) -> Result<Vec<u8>, JsValue> {
    let tune = load_tune(json)?;
    let config: BeeperConfig = options_from_js(config)?;
    dsp::renderer::render_tune_wav(&tune, sample_rate, config).map_err(to_js_error)
}

/// WASM-exposed `pit-quantizer` stage: one input, one channel.
#[wasm_bindgen]
pub struct PitQuantizerNode {
    inner: PitQuantizer,
}

#[wasm_bindgen]
impl PitQuantizerNode {
    #[wasm_bindgen(constructor)]
    pub fn new(sample_rate: f64, options: JsValue) -> Result<PitQuantizerNode, JsValue> {
        let options: QuantizerOptions = options_from_js(options)?;
        Ok(PitQuantizerNode {
            inner: PitQuantizer::new(sample_rate, options, 1, 1),
        })
    }

    #[wasm_bindgen(getter)]
    pub fn repeat_samples(&self) -> usize {
        self.inner.repeat_samples()
    }

    /// Quantize one render quantum. `current_frame` is the host's absolute
    /// frame counter at `input[0]`.
    pub fn process(&mut self, current_frame: f64, input: &[f32], output: &mut [f32]) {
        self.inner
            .process_channel(0, 0, current_frame as u64, input, output);
    }
}

/// WASM-exposed `white-noise` stage.
#[wasm_bindgen]
pub struct WhiteNoiseNode {
    inner: WhiteNoise,
}

#[wasm_bindgen]
impl WhiteNoiseNode {
    #[wasm_bindgen(constructor)]
    pub fn new(seed: u32) -> WhiteNoiseNode {
        WhiteNoiseNode {
            inner: WhiteNoise::new(seed as u64),
        }
    }

    pub fn process(&mut self, output: &mut [f32]) {
        self.inner.fill(output);
    }
}
