//! Local TTS via a user-provided command-line synthesizer, invoked through
//! the same explicit-argv subprocess boundary as the media muxer.
//! No voice cloning support — this is the credential-free fallback link,
//! not a capability match for `clone_voice`.

use crate::engine::traits::SynthesizeEngine;
use crate::subprocess;
use async_trait::async_trait;
use dub_common::{DubError, Result};
use dub_protocol::{EngineSpec, SynthesizedSegment};
use std::path::PathBuf;
use std::time::Duration;
use uuid::Uuid;

pub struct LocalSubprocessTtsEngine {
    spec: EngineSpec,
    binary_path: PathBuf,
    work_dir: PathBuf,
    deadline: Duration,
}

impl LocalSubprocessTtsEngine {
    pub fn new(spec: EngineSpec, binary_path: impl Into<PathBuf>, work_dir: impl Into<PathBuf>, deadline: Duration) -> Self {
        Self {
            spec,
            binary_path: binary_path.into(),
            work_dir: work_dir.into(),
            deadline,
        }
    }
}

#[async_trait]
impl SynthesizeEngine for LocalSubprocessTtsEngine {
    fn spec(&self) -> &EngineSpec {
        &self.spec
    }

    async fn synthesize(
        &self,
        segment_index: usize,
        text: &str,
        target_lang: &str,
        voice_sample: Option<&[u8]>,
    ) -> Result<SynthesizedSegment> {
        if text.trim().is_empty() {
            return Err(DubError::Validation("cannot synthesize empty text".into()));
        }
        if voice_sample.is_some() {
            return Err(DubError::Validation(
                "local subprocess TTS does not support voice cloning".into(),
            ));
        }

        let out_path = self.work_dir.join(format!("tts-{}.wav", Uuid::new_v4()));
        subprocess::validate_path_arg(&out_path)?;

        let out_path_str = out_path
            .to_str()
            .ok_or_else(|| DubError::InvalidPath("output path is not valid UTF-8".into()))?;
        let binary = self
            .binary_path
            .to_str()
            .ok_or_else(|| DubError::InvalidPath("TTS binary path is not valid UTF-8".into()))?;

        subprocess::run(
            binary,
            &["--text", text, "--lang", target_lang, "--out", out_path_str],
            self.deadline,
        )
        .await?;

        let mut reader = hound::WavReader::open(&out_path)?;
        let wav_spec = reader.spec();
        let samples: std::result::Result<Vec<i16>, _> = reader.samples::<i16>().collect();
        let samples = samples.map_err(|e| DubError::Wav(e.to_string()))?;
        let audio_bytes = samples.iter().flat_map(|s| s.to_le_bytes()).collect::<Vec<u8>>();
        let duration_seconds = samples.len() as f64 / wav_spec.channels.max(1) as f64 / wav_spec.sample_rate as f64;

        let _ = tokio::fs::remove_file(&out_path).await;

        Ok(SynthesizedSegment {
            segment_index,
            audio_bytes,
            duration_seconds,
            sample_rate: wav_spec.sample_rate,
            channels: wav_spec.channels,
            is_silence_substitute: false,
        })
    }
}
