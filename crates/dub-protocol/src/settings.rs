use serde::{Deserialize, Serialize};

/// Sync-mode policy for reconciling synthesized audio with the source
/// video timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    Natural,
    /// Default mode: resamples synthesized audio to match each segment's
    /// original duration.
    SpeedSync,
    VideoStretch,
}

impl Default for SyncMode {
    fn default() -> Self {
        SyncMode::SpeedSync
    }
}

/// A user's (or "auto") choice of engine id for one stage, carried in
/// `JobSettings` and consulted by the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineChoice {
    Auto,
    Specific(String),
}

impl Default for EngineChoice {
    fn default() -> Self {
        EngineChoice::Auto
    }
}

/// Immutable per-job configuration, set once at creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSettings {
    pub source_lang: String,
    pub target_lang: String,
    #[serde(default)]
    pub clone_voice: bool,
    #[serde(default)]
    pub verify_translation: bool,
    #[serde(default)]
    pub sync_mode: SyncMode,
    #[serde(default)]
    pub stt_engine: EngineChoice,
    #[serde(default)]
    pub translation_engine: EngineChoice,
    #[serde(default)]
    pub tts_engine: EngineChoice,
}
