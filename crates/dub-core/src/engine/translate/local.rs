//! Credential-free translation link, wrapping the `translators` crate's
//! Google backend instead of any remote adapter requiring an API key.
//! This is the last link in the fallback chain.

use crate::engine::traits::TranslateEngine;
use async_trait::async_trait;
use dub_common::{DubError, Result};
use dub_protocol::EngineSpec;
use translators::{GoogleTranslator, Translator};

pub struct LocalTranslateEngine {
    spec: EngineSpec,
    translator: GoogleTranslator,
}

impl LocalTranslateEngine {
    pub fn new(spec: EngineSpec) -> Self {
        Self {
            spec,
            translator: GoogleTranslator::default(),
        }
    }
}

#[async_trait]
impl TranslateEngine for LocalTranslateEngine {
    fn spec(&self) -> &EngineSpec {
        &self.spec
    }

    async fn translate_batch(
        &self,
        texts: &[String],
        source_lang: &str,
        target_lang: &str,
    ) -> Result<Vec<String>> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            if text.trim().is_empty() {
                out.push(String::new());
                continue;
            }
            let translated = self
                .translator
                .translate_async(text, source_lang, target_lang)
                .await
                .map_err(|e| DubError::TransientRemote(format!("local translate backend failed: {e}")))?;
            out.push(translated);
        }
        Ok(out)
    }
}
