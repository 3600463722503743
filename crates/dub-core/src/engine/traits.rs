//! Per-stage capability interfaces, one dyn-compatible trait for each of
//! the four stage kinds the dispatcher resolves.

use async_trait::async_trait;
use dub_common::Result;
use dub_protocol::{EngineSpec, QualityReport, Segment, SynthesizedSegment};
use std::path::Path;

#[async_trait]
pub trait Transcriber: Send + Sync {
    fn spec(&self) -> &EngineSpec;

    /// Transcribes a 16 kHz mono WAV file into timestamped segments.
    async fn transcribe(&self, audio_path: &Path, language_hint: Option<&str>) -> Result<Vec<Segment>>;
}

#[async_trait]
pub trait TranslateEngine: Send + Sync {
    fn spec(&self) -> &EngineSpec;

    /// Translates `texts` (already sanitized) as one batch, returning one
    /// translated string per input, in order.
    async fn translate_batch(
        &self,
        texts: &[String],
        source_lang: &str,
        target_lang: &str,
    ) -> Result<Vec<String>>;

    /// Re-translates `originals` given the prior attempt and the
    /// evaluator's issues. The default
    /// implementation folds the feedback into the request text for
    /// engines with no dedicated refinement endpoint.
    async fn refine_batch(
        &self,
        originals: &[String],
        previous_translations: &[String],
        issues: &[String],
        source_lang: &str,
        target_lang: &str,
    ) -> Result<Vec<String>> {
        let issues_note = if issues.is_empty() {
            String::new()
        } else {
            format!(" [issues to fix: {}]", issues.join("; "))
        };
        let augmented: Vec<String> = originals
            .iter()
            .zip(previous_translations.iter())
            .map(|(orig, prev)| format!("{orig}\n[previous attempt: {prev}]{issues_note}"))
            .collect();
        self.translate_batch(&augmented, source_lang, target_lang).await
    }
}

#[async_trait]
pub trait SynthesizeEngine: Send + Sync {
    fn spec(&self) -> &EngineSpec;

    async fn synthesize(
        &self,
        segment_index: usize,
        text: &str,
        target_lang: &str,
        voice_sample: Option<&[u8]>,
    ) -> Result<SynthesizedSegment>;
}

#[async_trait]
pub trait Evaluator: Send + Sync {
    fn spec(&self) -> &EngineSpec;

    /// One low-temperature scoring call.
    async fn evaluate_once(
        &self,
        original: &str,
        translated: &str,
        target_lang: &str,
    ) -> Result<QualityReport>;
}
