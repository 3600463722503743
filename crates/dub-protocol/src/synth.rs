use serde::{Deserialize, Serialize};

/// One synthesized target-language audio segment, aligned back to a
/// transcript segment index.
#[derive(Clone, Serialize, Deserialize)]
pub struct SynthesizedSegment {
    pub segment_index: usize,
    pub audio_bytes: Vec<u8>,
    pub duration_seconds: f64,
    pub sample_rate: u32,
    pub channels: u16,
    /// True when this stands in for a failed synth (silence substitute);
    /// relaxes the `duration_seconds > 0` invariant.
    pub is_silence_substitute: bool,
}

impl std::fmt::Debug for SynthesizedSegment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SynthesizedSegment")
            .field("segment_index", &self.segment_index)
            .field("audio_bytes_len", &self.audio_bytes.len())
            .field("duration_seconds", &self.duration_seconds)
            .field("sample_rate", &self.sample_rate)
            .field("channels", &self.channels)
            .field("is_silence_substitute", &self.is_silence_substitute)
            .finish()
    }
}
