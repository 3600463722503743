//! Fallback-chain translation with backoff, and the verify refine loop
//! that re-translates chunks the evaluator rejects.

use crate::engine::traits::{Evaluator, TranslateEngine};
use crate::evaluator::evaluate_with_fallback;
use crate::translate::sanitize::sanitize;
use dub_common::{DubError, FailureKind, Result};
use dub_protocol::{QualityReport, Recommendation, SyncMode, TranslationChunk};
use log::{info, warn};
use std::sync::Arc;
use std::time::Duration;

const ACCEPT_SCORE_THRESHOLD: u8 = 85;
const MAX_REFINE_ROUNDS: u8 = 3;
const BACKOFF_SCHEDULE: &[Duration] = &[Duration::from_secs(2), Duration::from_secs(4), Duration::from_secs(8)];

/// Tries each engine in order. A quota error advances to the next engine
/// immediately; a transient error retries the same engine through the
/// fixed backoff schedule before advancing.
pub async fn translate_with_fallback(
    engines: &[Arc<dyn TranslateEngine>],
    texts: &[String],
    source_lang: &str,
    target_lang: &str,
) -> Result<Vec<String>> {
    if engines.is_empty() {
        return Err(DubError::EnginesExhausted("translate".into()));
    }

    let mut last_err = None;
    for engine in engines {
        let mut attempt = 0usize;
        loop {
            match engine.translate_batch(texts, source_lang, target_lang).await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    let kind = e.classify();
                    warn!("translate engine {} failed: {e}", engine.spec().id);
                    if kind == FailureKind::QuotaRemote {
                        last_err = Some(e);
                        break;
                    }
                    if kind == FailureKind::TransientRemote && attempt < BACKOFF_SCHEDULE.len() {
                        tokio::time::sleep(BACKOFF_SCHEDULE[attempt]).await;
                        attempt += 1;
                        continue;
                    }
                    last_err = Some(e);
                    break;
                }
            }
        }
    }
    Err(last_err.unwrap_or_else(|| DubError::EnginesExhausted("translate".into())))
}

/// Runs the translate+refine loop for one chunk, mutating it in place.
/// When `verify_enabled` is false, a single translation pass is performed
/// and the chunk is left `review_needed = false`.
pub async fn refine_chunk(
    chunk: &mut TranslationChunk,
    engines: &[Arc<dyn TranslateEngine>],
    evaluators: &[Arc<dyn Evaluator>],
    source_lang: &str,
    target_lang: &str,
    sync_mode: SyncMode,
    verify_enabled: bool,
) -> Result<Option<QualityReport>> {
    let _ = sync_mode; // carried by the caller across retries, never substituted here

    let sanitized: Vec<String> = chunk.original_texts.iter().map(|t| sanitize(t)).collect();
    let translated = translate_with_fallback(engines, &sanitized, source_lang, target_lang).await?;
    chunk.translated_texts = translated;

    if !verify_enabled {
        return Ok(None);
    }
    if evaluators.is_empty() {
        chunk.review_needed = true;
        return Ok(Some(QualityReport::unavailable()));
    }

    let mut last_report: Option<QualityReport> = None;
    for round in 0..MAX_REFINE_ROUNDS {
        chunk.refine_rounds = round;
        let joined_original = chunk.original_texts.join(" ");
        let joined_translated = chunk.translated_texts.join(" ");
        let report = evaluate_with_fallback(evaluators, &joined_original, &joined_translated, target_lang).await;

        if report.overall_score >= ACCEPT_SCORE_THRESHOLD && !matches!(report.recommendation, Recommendation::Reject) {
            chunk.review_needed = false;
            return Ok(Some(report));
        }

        last_report = Some(report.clone());
        if round + 1 >= MAX_REFINE_ROUNDS {
            break;
        }

        let refined = engines
            .first()
            .ok_or_else(|| DubError::EnginesExhausted("translate".into()))?
            .refine_batch(
                &sanitized,
                &chunk.translated_texts,
                &report.issues,
                source_lang,
                target_lang,
            )
            .await?;
        chunk.translated_texts = refined;
    }

    chunk.refine_rounds = MAX_REFINE_ROUNDS;
    chunk.review_needed = true;
    info!("chunk left REVIEW_NEEDED after {MAX_REFINE_ROUNDS} refine rounds");
    Ok(last_report)
}
