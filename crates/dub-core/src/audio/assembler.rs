//! Places synthesized segments onto the original timeline according to the
//! job's sync mode, pads gaps with a silence floor, and RMS-normalizes the
//! result.

use dub_common::{DubError, Result};
use dub_protocol::{SyncMode, SynthesizedSegment};

const SILENCE_FLOOR_SECONDS: f64 = 0.3;
const TARGET_RMS: f32 = 0.1;

pub struct AssembledAudio {
    pub samples: Vec<i16>,
    pub sample_rate: u32,
    pub total_duration_seconds: f64,
    pub video_stretch_factor: Option<f64>,
}

/// `windows` gives each segment's original `(start_seconds, end_seconds)`
/// from the transcript, aligned by index with `segments`.
pub fn assemble(
    segments: &[SynthesizedSegment],
    windows: &[(f64, f64)],
    sync_mode: SyncMode,
    output_sample_rate: u32,
    original_video_duration_seconds: Option<f64>,
) -> Result<AssembledAudio> {
    if segments.len() != windows.len() {
        return Err(DubError::Validation(
            "segment count must match window count".into(),
        ));
    }
    if segments.is_empty() {
        return Ok(AssembledAudio {
            samples: Vec::new(),
            sample_rate: output_sample_rate,
            total_duration_seconds: 0.0,
            video_stretch_factor: None,
        });
    }

    let decoded: Vec<Vec<i16>> = segments
        .iter()
        .map(|s| decode_mono_pcm16(s, output_sample_rate))
        .collect::<Result<_>>()?;

    let mut samples = match sync_mode {
        SyncMode::Natural => assemble_natural(&decoded, windows, output_sample_rate),
        SyncMode::SpeedSync => assemble_speed_sync(&decoded, windows, output_sample_rate),
        SyncMode::VideoStretch => assemble_video_stretch(&decoded, output_sample_rate),
    };

    normalize_rms(&mut samples);

    let total_duration_seconds = samples.len() as f64 / output_sample_rate as f64;
    let video_stretch_factor = match sync_mode {
        SyncMode::VideoStretch => original_video_duration_seconds
            .filter(|d| *d > 0.0)
            .map(|d| total_duration_seconds / d),
        _ => None,
    };

    Ok(AssembledAudio {
        samples,
        sample_rate: output_sample_rate,
        total_duration_seconds,
        video_stretch_factor,
    })
}

fn decode_mono_pcm16(segment: &SynthesizedSegment, expected_sample_rate: u32) -> Result<Vec<i16>> {
    if segment.channels != 1 {
        return Err(DubError::TtsFailed(format!(
            "synthesized segment {} is not mono ({} channels)",
            segment.segment_index, segment.channels
        )));
    }
    let mut samples: Vec<i16> = segment
        .audio_bytes
        .chunks_exact(2)
        .map(|c| i16::from_le_bytes([c[0], c[1]]))
        .collect();
    if segment.sample_rate != expected_sample_rate && segment.sample_rate > 0 {
        samples = resample_linear(&samples, segment.sample_rate, expected_sample_rate);
    }
    Ok(samples)
}

fn silence_floor_samples(sample_rate: u32) -> Vec<i16> {
    vec![0i16; (SILENCE_FLOOR_SECONDS * sample_rate as f64) as usize]
}

fn assemble_natural(decoded: &[Vec<i16>], windows: &[(f64, f64)], sample_rate: u32) -> Vec<i16> {
    let mut out = Vec::new();
    let mut cursor_samples: i64 = 0;

    for (i, samples) in decoded.iter().enumerate() {
        let requested_start = (windows[i].0 * sample_rate as f64) as i64;
        let actual_start = requested_start.max(cursor_samples);
        if actual_start > cursor_samples {
            out.extend(std::iter::repeat(0i16).take((actual_start - cursor_samples) as usize));
        }
        out.extend_from_slice(samples);
        cursor_samples = actual_start + samples.len() as i64;

        if i + 1 < decoded.len() {
            let floor = silence_floor_samples(sample_rate);
            cursor_samples += floor.len() as i64;
            out.extend(floor);
        }
    }
    out
}

fn assemble_speed_sync(decoded: &[Vec<i16>], windows: &[(f64, f64)], sample_rate: u32) -> Vec<i16> {
    let mut out = Vec::new();

    for (i, samples) in decoded.iter().enumerate() {
        let window_len_samples = ((windows[i].1 - windows[i].0) * sample_rate as f64).max(0.0) as usize;
        let fitted = fit_to_window(samples, window_len_samples);
        out.extend_from_slice(&fitted);

        if i + 1 < decoded.len() {
            out.extend(silence_floor_samples(sample_rate));
        }
    }
    out
}

fn assemble_video_stretch(decoded: &[Vec<i16>], sample_rate: u32) -> Vec<i16> {
    let mut out = Vec::new();
    for (i, samples) in decoded.iter().enumerate() {
        out.extend_from_slice(samples);
        if i + 1 < decoded.len() {
            out.extend(silence_floor_samples(sample_rate));
        }
    }
    out
}

/// Fits `samples` to exactly `target_len` samples: time-compresses if
/// longer than the window, pads trailing silence if shorter.
fn fit_to_window(samples: &[i16], target_len: usize) -> Vec<i16> {
    if samples.len() <= target_len {
        let mut out = samples.to_vec();
        out.resize(target_len, 0);
        return out;
    }
    compress_to_length(samples, target_len)
}

/// Tempo-only compression approximated with linear resampling of the
/// sample stream to the target length.
fn compress_to_length(samples: &[i16], target_len: usize) -> Vec<i16> {
    if target_len == 0 || samples.is_empty() {
        return vec![0i16; target_len];
    }
    let ratio = samples.len() as f64 / target_len as f64;
    (0..target_len)
        .map(|i| {
            let src_idx = ((i as f64) * ratio) as usize;
            samples[src_idx.min(samples.len() - 1)]
        })
        .collect()
}

fn resample_linear(samples: &[i16], from_rate: u32, to_rate: u32) -> Vec<i16> {
    if from_rate == to_rate || samples.is_empty() {
        return samples.to_vec();
    }
    let target_len = (samples.len() as f64 * to_rate as f64 / from_rate as f64).round() as usize;
    compress_to_length(samples, target_len.max(1))
}

fn normalize_rms(samples: &mut [i16]) {
    if samples.is_empty() {
        return;
    }
    let sum_sq: f64 = samples.iter().map(|&s| (s as f64).powi(2)).sum();
    let rms = (sum_sq / samples.len() as f64).sqrt() / i16::MAX as f64;
    if rms <= f64::EPSILON {
        return;
    }
    let gain = (TARGET_RMS as f64 / rms).min(i16::MAX as f64);
    for s in samples.iter_mut() {
        let scaled = (*s as f64 * gain).clamp(i16::MIN as f64, i16::MAX as f64);
        *s = scaled as i16;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(index: usize, samples: &[i16], sample_rate: u32) -> SynthesizedSegment {
        let bytes: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
        SynthesizedSegment {
            segment_index: index,
            audio_bytes: bytes,
            duration_seconds: samples.len() as f64 / sample_rate as f64,
            sample_rate,
            channels: 1,
            is_silence_substitute: false,
        }
    }

    #[test]
    fn natural_mode_pushes_overlapping_segment_later() {
        let sr = 1000u32;
        let seg0 = segment(0, &vec![100i16; 1500], sr); // 1.5s, overruns its 1s window
        let seg1 = segment(1, &vec![200i16; 500], sr);
        let windows = vec![(0.0, 1.0), (1.0, 1.5)];
        let result = assemble(&[seg0, seg1], &windows, SyncMode::Natural, sr, None).unwrap();
        // seg1 should start after seg0 actually ends (1.5s), not at its nominal 1.0s
        assert!(result.total_duration_seconds > 2.0);
    }

    #[test]
    fn speed_sync_mode_has_no_drift() {
        let sr = 1000u32;
        let seg0 = segment(0, &vec![100i16; 1500], sr); // overruns, will be compressed
        let seg1 = segment(1, &vec![200i16; 400], sr); // underruns, will be padded
        let windows = vec![(0.0, 1.0), (1.0, 1.5)];
        let result = assemble(&[seg0, seg1], &windows, SyncMode::SpeedSync, sr, None).unwrap();
        let expected_floor = SILENCE_FLOOR_SECONDS;
        assert!((result.total_duration_seconds - (1.5 + expected_floor)).abs() < 0.01);
    }

    #[test]
    fn video_stretch_reports_a_stretch_factor() {
        let sr = 1000u32;
        let seg0 = segment(0, &vec![100i16; 2000], sr);
        let windows = vec![(0.0, 1.0)];
        let result = assemble(&[seg0], &windows, SyncMode::VideoStretch, sr, Some(1.0)).unwrap();
        assert!(result.video_stretch_factor.unwrap() > 1.0);
    }

    #[test]
    fn normalization_brings_loud_signal_toward_target() {
        let mut samples = vec![30000i16; 100];
        normalize_rms(&mut samples);
        let rms = (samples.iter().map(|&s| (s as f64).powi(2)).sum::<f64>() / samples.len() as f64).sqrt() / i16::MAX as f64;
        assert!((rms - TARGET_RMS as f64).abs() < 0.01);
    }
}
