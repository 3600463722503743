//! Orchestrates the quality evaluator: dual scoring, provider fallback,
//! long-text sampling, and term-preservation enforcement.

pub mod remote;
pub mod term_preservation;

pub use remote::RemoteEvaluator;

use crate::engine::traits::Evaluator;
use dub_common::FailureKind;
use dub_protocol::{QualityReport, Recommendation};
use log::warn;
use std::sync::Arc;

const LONG_TEXT_THRESHOLD: usize = 10_000;
const SAMPLE_WINDOW_CHARS: usize = 3_333;

const NON_LATIN_TARGET_LANGS: &[&str] = &["ko", "ja", "zh", "ru", "ar", "he", "th"];

fn is_non_latin_target(target_lang: &str) -> bool {
    NON_LATIN_TARGET_LANGS.contains(&target_lang)
}

/// Samples head/middle/tail windows when the combined text is long enough
/// that a full evaluation would be wasteful.
fn maybe_sample(combined: &str) -> (String, bool) {
    if combined.chars().count() <= LONG_TEXT_THRESHOLD {
        return (combined.to_string(), false);
    }
    let chars: Vec<char> = combined.chars().collect();
    let len = chars.len();
    let head: String = chars[0..SAMPLE_WINDOW_CHARS.min(len)].iter().collect();
    let mid_start = len / 2 - SAMPLE_WINDOW_CHARS / 2;
    let mid_end = (mid_start + SAMPLE_WINDOW_CHARS).min(len);
    let middle: String = chars[mid_start..mid_end].iter().collect();
    let tail: String = chars[len.saturating_sub(SAMPLE_WINDOW_CHARS)..].iter().collect();
    (format!("{head}\n---SAMPLE BREAK---\n{middle}\n---SAMPLE BREAK---\n{tail}"), true)
}

/// Never returns an error: a fully-failed evaluator chain degrades to
/// `QualityReport::unavailable()`.
pub async fn evaluate_with_fallback(
    evaluators: &[Arc<dyn Evaluator>],
    original: &str,
    translated: &str,
    target_lang: &str,
) -> QualityReport {
    let (sampled_original, sampled) = maybe_sample(original);
    let (sampled_translated, _) = maybe_sample(translated);

    for evaluator in evaluators {
        match evaluate_dual(evaluator.as_ref(), &sampled_original, &sampled_translated, target_lang).await {
            Ok(mut report) => {
                report.sampled = sampled;
                apply_term_preservation(&mut report, original, translated, target_lang);
                return report;
            }
            Err(e) if e.classify() == FailureKind::QuotaRemote => {
                warn!("evaluator {} hit quota, falling back", evaluator.spec().id);
                continue;
            }
            Err(e) => {
                warn!("evaluator {} failed: {e}", evaluator.spec().id);
                continue;
            }
        }
    }

    QualityReport::unavailable()
}

fn apply_term_preservation(report: &mut QualityReport, original: &str, translated: &str, target_lang: &str) {
    let (preservation, force_reject) =
        term_preservation::check_preservation(original, translated, is_non_latin_target(target_lang));
    report.term_preservation = preservation;
    if force_reject {
        report.recommendation = Recommendation::Reject;
    }
}

async fn evaluate_dual(
    evaluator: &dyn Evaluator,
    original: &str,
    translated: &str,
    target_lang: &str,
) -> dub_common::Result<QualityReport> {
    let first = evaluator.evaluate_once(original, translated, target_lang).await?;
    let second = evaluator.evaluate_once(original, translated, target_lang).await?;

    let diff = (first.overall_score as i16 - second.overall_score as i16).abs();
    if diff < 20 {
        let averaged = (first.overall_score as u16 + second.overall_score as u16) / 2;
        let mut merged = more_severe(first, second);
        merged.overall_score = averaged as u8;
        return Ok(merged);
    }

    let third = evaluator.evaluate_once(original, translated, target_lang).await?;
    let mut scores = [first.overall_score, second.overall_score, third.overall_score];
    scores.sort_unstable();
    let median = scores[1];
    let mut base = if median == first.overall_score {
        first
    } else if median == second.overall_score {
        second
    } else {
        third
    };
    base.overall_score = median;
    Ok(base)
}

fn more_severe(a: QualityReport, b: QualityReport) -> QualityReport {
    if matches!(a.recommendation, Recommendation::Reject) {
        a
    } else if matches!(b.recommendation, Recommendation::Reject) {
        b
    } else if a.overall_score <= b.overall_score {
        a
    } else {
        b
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_never_sampled() {
        let (text, sampled) = maybe_sample("short text");
        assert_eq!(text, "short text");
        assert!(!sampled);
    }

    #[test]
    fn long_text_is_sampled_into_three_windows() {
        let long = "x".repeat(30_000);
        let (text, sampled) = maybe_sample(&long);
        assert!(sampled);
        assert!(text.contains("SAMPLE BREAK"));
    }
}
