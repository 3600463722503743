use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineKind {
    Stt,
    Translate,
    Tts,
    Evaluate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Locality {
    Local,
    Remote,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    VoiceCloning,
    LowLatency,
    HighAccuracy,
}

/// Describes one concrete engine the dispatcher can hand to the
/// orchestrator. Read-only after construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSpec {
    pub kind: EngineKind,
    pub id: String,
    pub capabilities: Vec<Capability>,
    pub credentials_required: bool,
    pub locality: Locality,
}

impl EngineSpec {
    pub fn new(
        kind: EngineKind,
        id: impl Into<String>,
        locality: Locality,
        credentials_required: bool,
    ) -> Self {
        Self {
            kind,
            id: id.into(),
            capabilities: Vec::new(),
            credentials_required,
            locality,
        }
    }

    pub fn with_capability(mut self, cap: Capability) -> Self {
        self.capabilities.push(cap);
        self
    }

    pub fn has_capability(&self, cap: Capability) -> bool {
        self.capabilities.contains(&cap)
    }
}
