use dub_protocol::{
    JobId, JobSettings, JobStatus, JobView, LogEntry, PipelineStage, QualityReport, LOG_TRIM_BATCH,
    MAX_LOG_ENTRIES,
};
use chrono::{DateTime, Utc};

/// Internal mutable job record owned by the `JobManager` registry. The
/// `JobView` handed out to callers is a deep copy of this.
#[derive(Debug, Clone)]
pub struct Job {
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
    pub cancelled: bool,
}

impl Job {
    pub fn new(settings: JobSettings, input_path: String) -> Self {
        Self {
            id: JobId::new(),
            settings,
            status: JobStatus::Queued,
            current_stage: None,
            progress: 0,
            logs: Vec::new(),
            input_path: Some(input_path),
            output_path: None,
            created_at: Utc::now(),
            completed_at: None,
            quality_report: None,
            cancelled: false,
        }
    }

    /// FIFO-trim policy.
    pub fn push_log(&mut self, message: impl Into<String>) {
        if self.logs.len() >= MAX_LOG_ENTRIES {
            self.logs.drain(0..LOG_TRIM_BATCH);
        }
        self.logs.push(LogEntry::new(message));
    }

    pub fn to_view(&self) -> JobView {
        JobView {
            id: self.id,
            settings: self.settings.clone(),
            status: self.status,
            current_stage: self.current_stage,
            progress: self.progress,
            logs: self.logs.clone(),
            input_path: self.input_path.clone(),
            output_path: self.output_path.clone(),
            created_at: self.created_at,
            completed_at: self.completed_at,
            quality_report: self.quality_report.clone(),
        }
    }
}
