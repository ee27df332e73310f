//! WAV renderer — encodes rendered speaker audio as a WAV byte buffer.

use std::io::Cursor;

use crate::config::BeeperConfig;
use crate::error::DosTuneError;
use crate::tune::Tune;

use super::engine::render_tune;

/// Encode mono f32 samples as 16-bit PCM WAV bytes.
pub fn render_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>, DosTuneError> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    let mut writer = hound::WavWriter::new(&mut cursor, spec)?;
    for &sample in samples {
        let pcm = (sample.clamp(-1.0, 1.0) * i16::MAX as f32).round() as i16;
        writer.write_sample(pcm)?;
    }
    writer.finalize()?;

    Ok(cursor.into_inner())
}

/// Render a whole tune through the speaker engine and encode it.
pub fn render_tune_wav(tune: &Tune, sample_rate: u32, config: BeeperConfig) -> Result<Vec<u8>, DosTuneError> {
    let samples = render_tune(tune, sample_rate as f64, config)?;
    render_wav(&samples, sample_rate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wav_header_valid() {
        let wav = render_wav(&[0.0, 0.5, -0.5, 1.0], 44100).unwrap();

        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");

        let reader = hound::WavReader::new(Cursor::new(&wav)).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.sample_rate, 44100);
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.bits_per_sample, 16);
        assert_eq!(reader.len(), 4);
    }

    #[test]
    fn samples_are_scaled_and_clipped() {
        let wav = render_wav(&[0.0, 1.0, -1.0, 3.0, -3.0], 8000).unwrap();
        let mut reader = hound::WavReader::new(Cursor::new(wav)).unwrap();
        let pcm: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(pcm, vec![0, 32767, -32767, 32767, -32767]);
    }

    #[test]
    fn full_pipeline_load_schedule_render() {
        let tune = Tune::from_json(
            r#"{"tune":[
                {"type":"bpm","bpm":240,"commands":[
                    {"type":"note","note":"C","octave":4,"semiquavers":2},
                    {"type":"bend","semitones":5,"commands":[
                        {"type":"note","note":"E","octave":4,"semiquavers":2}
                    ]},
                    {"type":"vibrato","hz":6,"semitones":0.5,"commands":[
                        {"type":"note","note":"G","octave":4,"semiquavers":2}
                    ]}
                ]},
                {"type":"hz","hz":880,"ms":100}
            ]}"#,
        )
        .unwrap();
        let wav = render_tune_wav(&tune, 22050, BeeperConfig::default()).unwrap();

        let mut reader = hound::WavReader::new(Cursor::new(wav)).unwrap();
        let pcm: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert!(!pcm.is_empty());
        assert!(pcm.iter().any(|&s| s != 0), "Rendered WAV should contain non-silent audio");
    }
}
