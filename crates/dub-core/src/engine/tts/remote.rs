//! Remote text-to-speech adapter. Unlike STT/translate, the response body
//! here is raw audio bytes (WAV), not JSON — the engine trusts the remote
//! service's sample rate/channel count and records them verbatim; the
//! audio assembler downstream consumes whatever the synth engine reports.

use crate::engine::traits::SynthesizeEngine;
use async_trait::async_trait;
use dub_common::{DubError, Result};
use dub_protocol::{EngineSpec, SynthesizedSegment};
use serde::Serialize;
use std::time::Duration;

#[derive(Serialize)]
struct SynthesizeRequest<'a> {
    text: &'a str,
    target_lang: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    voice_sample_base64: Option<String>,
}

pub struct RemoteSynthesizeEngine {
    spec: EngineSpec,
    endpoint: String,
    api_key: Option<String>,
    client: reqwest::Client,
    deadline: Duration,
}

impl RemoteSynthesizeEngine {
    pub fn new(spec: EngineSpec, endpoint: String, api_key: Option<String>, deadline: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(deadline)
            .build()
            .map_err(|e| DubError::TtsFailed(format!("HTTP client build failed: {e}")))?;
        Ok(Self {
            spec,
            endpoint,
            api_key,
            client,
            deadline,
        })
    }
}

#[async_trait]
impl SynthesizeEngine for RemoteSynthesizeEngine {
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
        use base64::Engine as _;

        if text.trim().is_empty() {
            return Err(DubError::Validation("cannot synthesize empty text".into()));
        }

        let voice_sample_base64 = voice_sample.map(|bytes| base64::engine::general_purpose::STANDARD.encode(bytes));

        let mut req = self
            .client
            .post(&self.endpoint)
            .timeout(self.deadline)
            .json(&SynthesizeRequest {
                text,
                target_lang,
                voice_sample_base64,
            });
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        let response = req.send().await.map_err(|e| classify_reqwest_error(&e))?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(DubError::QuotaRemote(format!("remote TTS quota: {status}")));
        }
        if status.is_server_error() {
            return Err(DubError::TransientRemote(format!("remote TTS 5xx: {status}")));
        }
        if !status.is_success() {
            return Err(DubError::TtsFailed(format!("remote TTS error: {status}")));
        }

        let sample_rate = response
            .headers()
            .get("x-sample-rate")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(22_050);
        let channels = response
            .headers()
            .get("x-channels")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u16>().ok())
            .unwrap_or(1);

        let audio_bytes = response
            .bytes()
            .await
            .map_err(|e| DubError::TransientRemote(format!("failed to read TTS body: {e}")))?
            .to_vec();
        if audio_bytes.is_empty() {
            return Err(DubError::TtsFailed("remote TTS returned no audio".into()));
        }

        let duration_seconds = estimate_pcm16_duration(audio_bytes.len(), sample_rate, channels);

        Ok(SynthesizedSegment {
            segment_index,
            audio_bytes,
            duration_seconds,
            sample_rate,
            channels,
            is_silence_substitute: false,
        })
    }
}

fn estimate_pcm16_duration(byte_len: usize, sample_rate: u32, channels: u16) -> f64 {
    let bytes_per_frame = 2 * channels.max(1) as usize;
    if sample_rate == 0 || bytes_per_frame == 0 {
        return 0.0;
    }
    (byte_len / bytes_per_frame) as f64 / sample_rate as f64
}

fn classify_reqwest_error(e: &reqwest::Error) -> DubError {
    if e.is_timeout() {
        DubError::TransientRemote(format!("TTS request timed out: {e}"))
    } else if e.is_connect() {
        DubError::TransientRemote(format!("TTS connection failed: {e}"))
    } else {
        DubError::TtsFailed(e.to_string())
    }
}
