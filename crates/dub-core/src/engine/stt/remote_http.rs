//! Remote STT adapter: reads WAV bytes, POSTs them to a configured
//! endpoint, reads back a structured result. Returns a JSON segment
//! array rather than raw SRT bytes, over the async `reqwest` client
//! used everywhere else in this crate.

use crate::engine::traits::Transcriber;
use async_trait::async_trait;
use dub_common::{DubError, Result};
use dub_protocol::{EngineSpec, Segment};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

#[derive(Deserialize)]
struct RemoteSegment {
    start_seconds: f64,
    end_seconds: f64,
    text: String,
    #[serde(default)]
    speaker_label: Option<String>,
    #[serde(default)]
    confidence: Option<f32>,
}

pub struct RemoteSttEngine {
    spec: EngineSpec,
    endpoint: String,
    api_key: Option<String>,
    client: reqwest::Client,
    deadline: Duration,
}

impl RemoteSttEngine {
    pub fn new(spec: EngineSpec, endpoint: String, api_key: Option<String>, deadline: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(deadline)
            .build()
            .map_err(|e| DubError::SttFailed(format!("HTTP client build failed: {e}")))?;
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
impl Transcriber for RemoteSttEngine {
    fn spec(&self) -> &EngineSpec {
        &self.spec
    }

    async fn transcribe(&self, audio_path: &Path, language_hint: Option<&str>) -> Result<Vec<Segment>> {
        let audio_bytes = tokio::fs::read(audio_path)
            .await
            .map_err(|e| DubError::SttFailed(format!("failed to read audio: {e}")))?;
        if audio_bytes.is_empty() {
            return Err(DubError::InputExhaustion("audio file is empty".into()));
        }

        let mut req = self
            .client
            .post(&self.endpoint)
            .timeout(self.deadline)
            .header("content-type", "audio/wav")
            .body(audio_bytes);
        if let Some(lang) = language_hint {
            req = req.header("x-language-hint", lang);
        }
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        let response = req
            .send()
            .await
            .map_err(|e| classify_reqwest_error(&e))?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(DubError::QuotaRemote(format!("remote STT quota: {status}")));
        }
        if status.is_server_error() {
            return Err(DubError::TransientRemote(format!("remote STT 5xx: {status}")));
        }
        if !status.is_success() {
            return Err(DubError::SttFailed(format!("remote STT error: {status}")));
        }

        let remote_segments: Vec<RemoteSegment> = response
            .json()
            .await
            .map_err(|e| DubError::MalformedResponse(format!("invalid STT JSON: {e}")))?;

        if remote_segments.is_empty() {
            return Err(DubError::InputExhaustion(
                "remote STT produced an empty transcript".into(),
            ));
        }

        Ok(remote_segments
            .into_iter()
            .map(|s| Segment {
                start_seconds: s.start_seconds,
                end_seconds: s.end_seconds,
                text: s.text,
                speaker_label: s.speaker_label,
                confidence: s.confidence,
            })
            .collect())
    }
}

fn classify_reqwest_error(e: &reqwest::Error) -> DubError {
    if e.is_timeout() {
        DubError::TransientRemote(format!("STT request timed out: {e}"))
    } else if e.is_connect() {
        DubError::TransientRemote(format!("STT connection failed: {e}"))
    } else {
        DubError::SttFailed(e.to_string())
    }
}
