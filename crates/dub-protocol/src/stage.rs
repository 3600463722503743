use serde::{Deserialize, Serialize};

/// Job lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled
        )
    }
}

/// Pipeline stage a processing job currently occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Extract,
    Transcribe,
    Translate,
    Verify,
    Synthesize,
    Merge,
}

impl PipelineStage {
    /// Stage weight used for progress rescaling.
    pub fn weight(self, verify_enabled: bool) -> u32 {
        match self {
            PipelineStage::Extract => 5,
            PipelineStage::Transcribe => 15,
            PipelineStage::Translate => 25,
            PipelineStage::Verify => {
                if verify_enabled {
                    15
                } else {
                    0
                }
            }
            PipelineStage::Synthesize => 25,
            PipelineStage::Merge => 15,
        }
    }

    pub fn ordered(verify_enabled: bool) -> Vec<PipelineStage> {
        let all = [
            PipelineStage::Extract,
            PipelineStage::Transcribe,
            PipelineStage::Translate,
            PipelineStage::Verify,
            PipelineStage::Synthesize,
            PipelineStage::Merge,
        ];
        all.into_iter()
            .filter(|s| verify_enabled || *s != PipelineStage::Verify)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weights_rescale_to_100_without_verify() {
        let total: u32 = PipelineStage::ordered(false)
            .into_iter()
            .map(|s| s.weight(false))
            .sum();
        assert_eq!(total, 85);
        let total_with_verify: u32 = PipelineStage::ordered(true)
            .into_iter()
            .map(|s| s.weight(true))
            .sum();
        assert_eq!(total_with_verify, 100);
    }
}
