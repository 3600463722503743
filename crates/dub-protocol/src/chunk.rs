use serde::{Deserialize, Serialize};

/// A contiguous span of transcript segments batched for one translator call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationChunk {
    pub segment_indices: Vec<usize>,
    pub source_text: String,
    pub original_texts: Vec<String>,
    pub translated_texts: Vec<String>,
    pub start_seconds: f64,
    pub end_seconds: f64,
    /// Set once the refine loop has run out its 3 rounds still below 85.
    pub review_needed: bool,
    pub refine_rounds: u8,
}

impl TranslationChunk {
    pub fn is_translated(&self) -> bool {
        !self.translated_texts.is_empty() && self.translated_texts.len() == self.original_texts.len()
    }
}
