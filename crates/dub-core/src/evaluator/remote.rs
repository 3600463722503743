//! Remote quality-scoring model adapter. Same request shape as the other
//! remote engines; the response body is a single scoring JSON object
//! rather than an array.

use crate::engine::traits::Evaluator;
use crate::json_repair;
use dub_common::{DubError, Result};
use dub_protocol::{EngineSpec, QualityBreakdown, QualityReport, Recommendation, TermPreservation};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const EVALUATION_TEMPERATURE: f32 = 0.1;

#[derive(Serialize)]
struct EvaluateRequest<'a> {
    original: &'a str,
    translated: &'a str,
    target_lang: &'a str,
    temperature: f32,
}

#[derive(Deserialize)]
struct RemoteReport {
    overall_score: u8,
    #[serde(default)]
    accuracy: u8,
    #[serde(default)]
    naturalness: u8,
    #[serde(default)]
    dubbing_fit: u8,
    #[serde(default)]
    consistency: u8,
    #[serde(default)]
    issues: Vec<String>,
    #[serde(default)]
    recommendation: Option<String>,
}

pub struct RemoteEvaluator {
    spec: EngineSpec,
    endpoint: String,
    api_key: Option<String>,
    client: reqwest::Client,
    deadline: Duration,
}

impl RemoteEvaluator {
    pub fn new(spec: EngineSpec, endpoint: String, api_key: Option<String>, deadline: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(deadline)
            .build()
            .map_err(|e| DubError::TransientRemote(format!("HTTP client build failed: {e}")))?;
        Ok(Self {
            spec,
            endpoint,
            api_key,
            client,
            deadline,
        })
    }

    async fn request_once(&self, original: &str, translated: &str, target_lang: &str) -> Result<String> {
        let mut req = self
            .client
            .post(&self.endpoint)
            .timeout(self.deadline)
            .json(&EvaluateRequest {
                original,
                translated,
                target_lang,
                temperature: EVALUATION_TEMPERATURE,
            });
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }
        let response = req.send().await.map_err(|e| classify_reqwest_error(&e))?;
        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(DubError::QuotaRemote(format!("evaluator quota: {status}")));
        }
        if status.is_server_error() {
            return Err(DubError::TransientRemote(format!("evaluator 5xx: {status}")));
        }
        if !status.is_success() {
            return Err(DubError::TransientRemote(format!("evaluator error: {status}")));
        }
        response
            .text()
            .await
            .map_err(|e| DubError::TransientRemote(format!("failed to read evaluator body: {e}")))
    }
}

#[async_trait::async_trait]
impl Evaluator for RemoteEvaluator {
    fn spec(&self) -> &EngineSpec {
        &self.spec
    }

    async fn evaluate_once(&self, original: &str, translated: &str, target_lang: &str) -> Result<QualityReport> {
        let body = self.request_once(original, translated, target_lang).await?;

        let parsed = parse_report(&body).or_else(|_| {
            json_repair::try_repair(&body).as_deref().and_then(|repaired| parse_report(repaired).ok()).ok_or(())
        });

        match parsed {
            Ok(report) => Ok(report),
            Err(_) => {
                // One repair-prompt attempt: ask the same
                // endpoint to fix its own output, then degrade gracefully.
                let repair_prompt = format!("Fix this to be valid JSON matching the scoring schema: {body}");
                match self.request_once(&repair_prompt, translated, target_lang).await {
                    Ok(retry_body) => parse_report(&retry_body).or_else(|_| Ok(degraded_report())),
                    Err(_) => Ok(degraded_report()),
                }
            }
        }
    }
}

fn parse_report(body: &str) -> std::result::Result<QualityReport, ()> {
    let remote: RemoteReport = serde_json::from_str(body).map_err(|_| ())?;
    let recommendation = match remote.recommendation.as_deref() {
        Some("reject") => Recommendation::Reject,
        Some("review_needed") => Recommendation::ReviewNeeded,
        _ if remote.overall_score >= 85 => Recommendation::Approved,
        _ => Recommendation::ReviewNeeded,
    };
    Ok(QualityReport {
        overall_score: remote.overall_score,
        breakdown: QualityBreakdown {
            accuracy: remote.accuracy,
            naturalness: remote.naturalness,
            dubbing_fit: remote.dubbing_fit,
            consistency: remote.consistency,
        },
        issues: remote.issues,
        recommendation,
        term_preservation: TermPreservation {
            score: 0.0,
            missing: Vec::new(),
        },
        sampled: false,
    })
}

fn degraded_report() -> QualityReport {
    QualityReport {
        overall_score: 0,
        breakdown: QualityBreakdown::default(),
        issues: vec!["evaluator returned unrepairable output".into()],
        recommendation: Recommendation::Reject,
        term_preservation: TermPreservation {
            score: 0.0,
            missing: Vec::new(),
        },
        sampled: false,
    }
}

fn classify_reqwest_error(e: &reqwest::Error) -> DubError {
    if e.is_timeout() {
        DubError::TransientRemote(format!("evaluator request timed out: {e}"))
    } else if e.is_connect() {
        DubError::TransientRemote(format!("evaluator connection failed: {e}"))
    } else {
        DubError::TransientRemote(e.to_string())
    }
}
