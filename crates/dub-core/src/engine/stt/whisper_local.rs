//! Local GPU/CPU-resident transcription via `whisper-rs`. Must be
//! called only while holding the `ResourceGate` guard — this module does
//! not acquire it itself, the orchestrator does.

use crate::engine::traits::Transcriber;
use async_trait::async_trait;
use dub_common::{DubError, Result};
use dub_protocol::{EngineSpec, Segment};
use std::path::{Path, PathBuf};
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

pub struct WhisperLocalEngine {
    spec: EngineSpec,
    model_path: PathBuf,
}

impl WhisperLocalEngine {
    pub fn new(spec: EngineSpec, model_path: impl Into<PathBuf>) -> Self {
        Self {
            spec,
            model_path: model_path.into(),
        }
    }
}

#[async_trait]
impl Transcriber for WhisperLocalEngine {
    fn spec(&self) -> &EngineSpec {
        &self.spec
    }

    async fn transcribe(&self, audio_path: &Path, language_hint: Option<&str>) -> Result<Vec<Segment>> {
        let model_path = self.model_path.clone();
        let audio_path = audio_path.to_path_buf();
        let language_hint = language_hint.map(|s| s.to_string());

        tokio::task::spawn_blocking(move || transcribe_blocking(&model_path, &audio_path, language_hint.as_deref()))
            .await
            .map_err(|e| DubError::SttFailed(format!("whisper worker panicked: {e}")))?
    }
}

fn transcribe_blocking(model_path: &Path, audio_path: &Path, language_hint: Option<&str>) -> Result<Vec<Segment>> {
    let samples = read_mono_16k_pcm(audio_path)?;
    if samples.is_empty() {
        return Err(DubError::InputExhaustion("audio contains no samples".into()));
    }

    let ctx = WhisperContext::new_with_params(
        model_path
            .to_str()
            .ok_or_else(|| DubError::InvalidPath("model path is not valid UTF-8".into()))?,
        WhisperContextParameters::default(),
    )
    .map_err(|e| DubError::SttFailed(format!("failed to load whisper model: {e}")))?;

    let mut state = ctx
        .create_state()
        .map_err(|e| DubError::SttFailed(format!("failed to create whisper state: {e}")))?;

    let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
    params.set_print_progress(false);
    params.set_print_special(false);
    params.set_print_realtime(false);
    params.set_print_timestamps(false);
    params.set_token_timestamps(true);
    if let Some(lang) = language_hint {
        params.set_language(Some(lang));
    } else {
        params.set_language(None);
    }

    state
        .full(params, &samples)
        .map_err(|e| DubError::SttFailed(format!("whisper inference failed: {e}")))?;

    let num_segments = state
        .full_n_segments()
        .map_err(|e| DubError::SttFailed(format!("failed to read segment count: {e}")))?;

    let mut segments = Vec::with_capacity(num_segments as usize);
    for i in 0..num_segments {
        let text = state
            .full_get_segment_text(i)
            .map_err(|e| DubError::SttFailed(format!("failed to read segment text: {e}")))?;
        if text.trim().is_empty() {
            continue;
        }
        let start = state
            .full_get_segment_t0(i)
            .map_err(|e| DubError::SttFailed(format!("failed to read segment start: {e}")))? as f64
            / 100.0;
        let end = state
            .full_get_segment_t1(i)
            .map_err(|e| DubError::SttFailed(format!("failed to read segment end: {e}")))? as f64
            / 100.0;
        segments.push(Segment {
            start_seconds: start,
            end_seconds: end.max(start),
            text: text.trim().to_string(),
            speaker_label: None,
            confidence: None,
        });
    }

    if segments.is_empty() {
        return Err(DubError::InputExhaustion(
            "whisper produced an empty transcript".into(),
        ));
    }

    Ok(segments)
}

fn read_mono_16k_pcm(path: &Path) -> Result<Vec<f32>> {
    let mut reader = hound::WavReader::open(path)?;
    let spec = reader.spec();
    if spec.channels != 1 || spec.sample_rate != 16_000 {
        return Err(DubError::Wav(format!(
            "expected mono 16 kHz wav, got {} channel(s) at {} Hz",
            spec.channels, spec.sample_rate
        )));
    }
    let samples: std::result::Result<Vec<i16>, _> = reader.samples::<i16>().collect();
    let samples = samples.map_err(|e| DubError::Wav(e.to_string()))?;
    Ok(samples.into_iter().map(|s| s as f32 / i16::MAX as f32).collect())
}
