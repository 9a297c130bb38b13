//! Decoding of raw sound bytes into playable sample buffers.
//!
//! Two entry points: [`decode_sound`] for general sound assets (mono f32 at
//! the session's output rate) and [`decode_instrument`] for the fixed
//! instrument-bank format (validated 16-bit PCM window). Both parse the WAV
//! header before trusting any declared length.

use std::io::Cursor;

use crate::error::{StageError, StageResult};

/// Decoded mono sample buffer ready for playback.
#[derive(Clone, Debug, PartialEq)]
pub struct SampleBuffer {
    /// Rate the samples are resampled to.
    pub sample_rate: u32,
    /// Mono samples in [-1, 1].
    pub samples: Vec<f32>,
}

impl SampleBuffer {
    /// Buffer duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Decode WAV bytes to mono samples at `target_rate`.
///
/// Multi-channel input is mixed down by frame average; a rate mismatch is
/// bridged with linear resampling into a freshly allocated buffer.
pub fn decode_sound(bytes: &[u8], target_rate: u32) -> StageResult<SampleBuffer> {
    if target_rate == 0 {
        return Err(StageError::decode("target sample rate must be > 0"));
    }

    let mut reader = hound::WavReader::new(Cursor::new(bytes))
        .map_err(|e| StageError::decode(format!("parse wav header: {e}")))?;
    let spec = reader.spec();

    let samples: Result<Vec<f32>, _> = match spec.sample_format {
        hound::SampleFormat::Float => reader.samples::<f32>().collect(),
        hound::SampleFormat::Int => {
            let max_value = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|sample| sample.map(|s| s as f32 / max_value))
                .collect()
        }
    };
    let samples = samples.map_err(|e| StageError::decode(format!("parse wav samples: {e}")))?;

    let mono = mix_down(&samples, spec.channels);
    let samples = resample_linear(&mono, spec.sample_rate, target_rate);

    Ok(SampleBuffer {
        sample_rate: target_rate,
        samples,
    })
}

/// Decode an instrument-bank WAV into its raw 16-bit sample window.
///
/// The bank format is fixed: integer PCM, 16 bits per sample. Anything else
/// is rejected up front rather than producing garbage downstream.
pub fn decode_instrument(bytes: &[u8]) -> StageResult<Vec<i16>> {
    let mut reader = hound::WavReader::new(Cursor::new(bytes))
        .map_err(|e| StageError::decode(format!("parse instrument wav header: {e}")))?;
    let spec = reader.spec();

    if spec.sample_format != hound::SampleFormat::Int || spec.bits_per_sample != 16 {
        return Err(StageError::decode(format!(
            "instrument wav must be 16-bit integer PCM, got {}-bit {:?}",
            spec.bits_per_sample, spec.sample_format
        )));
    }

    reader
        .samples::<i16>()
        .collect::<Result<Vec<i16>, _>>()
        .map_err(|e| StageError::decode(format!("parse instrument samples: {e}")))
}

fn mix_down(samples: &[f32], channels: u16) -> Vec<f32> {
    let channels = channels.max(1) as usize;
    if channels == 1 {
        return samples.to_vec();
    }
    samples
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

fn resample_linear(input: &[f32], src_rate: u32, dst_rate: u32) -> Vec<f32> {
    if input.is_empty() || src_rate == dst_rate || src_rate == 0 {
        return input.to_vec();
    }

    let out_len = ((input.len() as u64 * dst_rate as u64) / src_rate as u64).max(1) as usize;
    let step = src_rate as f64 / dst_rate as f64;
    let last = input.len() - 1;

    (0..out_len)
        .map(|i| {
            let pos = i as f64 * step;
            let i0 = (pos.floor() as usize).min(last);
            let i1 = (i0 + 1).min(last);
            let frac = (pos - i0 as f64) as f32;
            input[i0] + (input[i1] - input[i0]) * frac
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn wav_bytes(channels: u16, sample_rate: u32, samples: &[i16]) -> Vec<u8> {
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for s in samples {
            writer.write_sample(*s).unwrap();
        }
        writer.finalize().unwrap();
        cursor.into_inner()
    }

    #[test]
    fn decode_sound_mono_same_rate_is_identity_shaped() {
        let bytes = wav_bytes(1, 22_050, &[0, 16_384, -16_384, 0]);
        let buf = decode_sound(&bytes, 22_050).unwrap();
        assert_eq!(buf.sample_rate, 22_050);
        assert_eq!(buf.samples.len(), 4);
        assert!((buf.samples[1] - 0.5).abs() < 1e-3);
        assert!((buf.samples[2] + 0.5).abs() < 1e-3);
    }

    #[test]
    fn decode_sound_mixes_stereo_to_mono() {
        // Two frames: (L=1.0, R=0.0) then (L=0.0, R=0.0).
        let bytes = wav_bytes(2, 44_100, &[i16::MAX, 0, 0, 0]);
        let buf = decode_sound(&bytes, 44_100).unwrap();
        assert_eq!(buf.samples.len(), 2);
        assert!((buf.samples[0] - 0.5).abs() < 1e-2);
        assert!(buf.samples[1].abs() < 1e-6);
    }

    #[test]
    fn decode_sound_resamples_to_target_rate() {
        let samples: Vec<i16> = (0..400).map(|i| (i % 100) as i16).collect();
        let bytes = wav_bytes(1, 44_100, &samples);
        let buf = decode_sound(&bytes, 22_050).unwrap();
        assert_eq!(buf.sample_rate, 22_050);
        assert_eq!(buf.samples.len(), 200);
    }

    #[test]
    fn decode_sound_rejects_malformed_bytes() {
        let err = decode_sound(&[0, 1, 2, 3, 4], 44_100).unwrap_err();
        assert!(matches!(err, StageError::Decode(_)));
    }

    #[test]
    fn decode_instrument_returns_exact_sample_window() {
        let samples = [10i16, -20, 30, -40, 50];
        let bytes = wav_bytes(1, 22_050, &samples);
        let window = decode_instrument(&bytes).unwrap();
        assert_eq!(window, samples);
    }

    #[test]
    fn decode_instrument_rejects_non_16_bit_input() {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 22_050,
            bits_per_sample: 8,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        writer.write_sample(1i8).unwrap();
        writer.finalize().unwrap();

        let err = decode_instrument(&cursor.into_inner()).unwrap_err();
        assert!(matches!(err, StageError::Decode(_)));
    }
}
