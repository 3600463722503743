//! Remote text translation adapter. Same request/response shape as
//! [`crate::engine::stt::remote_http::RemoteSttEngine`] but carrying a JSON
//! array of strings both ways, matching an LLM-style translation endpoint's
//! "array in, array out" contract.

use crate::engine::traits::TranslateEngine;
use crate::json_repair;
use async_trait::async_trait;
use dub_common::{DubError, Result};
use dub_protocol::EngineSpec;
use serde::Serialize;
use std::time::Duration;

#[derive(Serialize)]
struct TranslateRequest<'a> {
    source_lang: &'a str,
    target_lang: &'a str,
    texts: &'a [String],
}

pub struct RemoteTranslateEngine {
    spec: EngineSpec,
    endpoint: String,
    api_key: Option<String>,
    client: reqwest::Client,
    deadline: Duration,
}

impl RemoteTranslateEngine {
    pub fn new(spec: EngineSpec, endpoint: String, api_key: Option<String>, deadline: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(deadline)
            .build()
            .map_err(|e| DubError::TranslationFailed(format!("HTTP client build failed: {e}")))?;
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
impl TranslateEngine for RemoteTranslateEngine {
    fn spec(&self) -> &EngineSpec {
        &self.spec
    }

    async fn translate_batch(
        &self,
        texts: &[String],
        source_lang: &str,
        target_lang: &str,
    ) -> Result<Vec<String>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut req = self
            .client
            .post(&self.endpoint)
            .timeout(self.deadline)
            .json(&TranslateRequest {
                source_lang,
                target_lang,
                texts,
            });
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        let response = req.send().await.map_err(|e| classify_reqwest_error(&e))?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(DubError::QuotaRemote(format!("remote translate quota: {status}")));
        }
        if status.is_server_error() {
            return Err(DubError::TransientRemote(format!("remote translate 5xx: {status}")));
        }
        if !status.is_success() {
            return Err(DubError::TranslationFailed(format!("remote translate error: {status}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| DubError::TransientRemote(format!("failed to read response body: {e}")))?;

        let translated = parse_translated_array(&body)?;
        if translated.len() != texts.len() {
            return Err(DubError::MalformedResponse(format!(
                "expected {} translated strings, got {}",
                texts.len(),
                translated.len()
            )));
        }
        Ok(translated)
    }
}

fn parse_translated_array(body: &str) -> Result<Vec<String>> {
    if let Ok(v) = serde_json::from_str::<Vec<String>>(body) {
        return Ok(v);
    }
    if let Some(repaired) = json_repair::try_repair(body) {
        if let Ok(v) = serde_json::from_str::<Vec<String>>(&repaired) {
            return Ok(v);
        }
    }
    Err(DubError::MalformedResponse(
        "translation response was not a JSON array of strings, even after repair".into(),
    ))
}

fn classify_reqwest_error(e: &reqwest::Error) -> DubError {
    if e.is_timeout() {
        DubError::TransientRemote(format!("translate request timed out: {e}"))
    } else if e.is_connect() {
        DubError::TransientRemote(format!("translate connection failed: {e}"))
    } else {
        DubError::TranslationFailed(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_clean_array() {
        let body = r#"["hola", "mundo"]"#;
        assert_eq!(parse_translated_array(body).unwrap(), vec!["hola", "mundo"]);
    }

    #[test]
    fn repairs_truncated_array() {
        let body = r#"["hola", "mundo""#;
        assert_eq!(parse_translated_array(body).unwrap(), vec!["hola", "mundo"]);
    }

    #[test]
    fn rejects_hopeless_body() {
        assert!(parse_translated_array("<html>not json</html>").is_err());
    }
}
