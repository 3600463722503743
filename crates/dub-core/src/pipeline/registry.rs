//! Concrete engine instances keyed by `EngineSpec.id`, looked up after the
//! dispatcher has already decided fallback order.

use crate::engine::{Evaluator, SynthesizeEngine, TranslateEngine, Transcriber};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct EngineRegistry {
    pub stt: HashMap<String, Arc<dyn Transcriber>>,
    pub translate: HashMap<String, Arc<dyn TranslateEngine>>,
    pub tts: HashMap<String, Arc<dyn SynthesizeEngine>>,
    pub evaluate: HashMap<String, Arc<dyn Evaluator>>,
}

impl EngineRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}
