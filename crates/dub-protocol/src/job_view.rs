use crate::{JobId, JobSettings, JobStatus, PipelineStage, QualityReport};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One bounded log line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub message: String,
}

pub const MAX_LOG_MESSAGE_CHARS: usize = 500;
pub const MAX_LOG_ENTRIES: usize = 1000;
pub const LOG_TRIM_BATCH: usize = 100;

impl LogEntry {
    pub fn new(message: impl Into<String>) -> Self {
        let mut message: String = message.into();
        if message.chars().count() > MAX_LOG_MESSAGE_CHARS {
            let truncated: String = message.chars().take(MAX_LOG_MESSAGE_CHARS - 1).collect();
            message = format!("{truncated}\u{2026}");
        }
        Self {
            timestamp: Utc::now(),
            message,
        }
    }
}

/// Read-only consistent snapshot of a job, returned by `JobManager::get`
/// and serialized directly as the `GET /api/jobs/{id}` response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobView {
    pub id: JobId,
    pub settings: JobSettings,
    pub status: JobStatus,
    pub current_stage: Option<PipelineStage>,
    pub progress: u8,
    pub logs: Vec<LogEntry>,
    pub input_path: Option<String>,
    pub output_path: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub quality_report: Option<QualityReport>,
}
