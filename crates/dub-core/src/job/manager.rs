use super::types::Job;
use dub_common::{DubError, Result};
use dub_protocol::{JobId, JobSettings, JobStatus, JobView, PipelineStage, QualityReport};
use log::info;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Single source of truth for job status, logs, progress and cancellation
///. Every mutator serializes under one lock per manager (not
/// per job) because writes are short; reads hand back a deep copy.
#[derive(Clone)]
pub struct JobManager {
    registry: Arc<Mutex<HashMap<JobId, Job>>>,
}

impl JobManager {
    pub fn new() -> Self {
        Self {
            registry: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub async fn create(&self, settings: JobSettings, input_path: String) -> JobId {
        let job = Job::new(settings, input_path);
        let id = job.id;
        let mut reg = self.registry.lock().await;
        reg.insert(id, job);
        info!("job {id} created");
        id
    }

    pub async fn get(&self, id: JobId) -> Result<JobView> {
        let reg = self.registry.lock().await;
        reg.get(&id)
            .map(Job::to_view)
            .ok_or_else(|| DubError::NotFound(id.to_string()))
    }

    pub async fn update_status(&self, id: JobId, status: JobStatus) -> Result<()> {
        let mut reg = self.registry.lock().await;
        let job = reg
            .get_mut(&id)
            .ok_or_else(|| DubError::NotFound(id.to_string()))?;
        // Terminal status is never revised.
        if job.status.is_terminal() {
            return Ok(());
        }
        job.status = status;
        if status.is_terminal() {
            job.completed_at = Some(chrono::Utc::now());
        }
        Ok(())
    }

    pub async fn set_stage(&self, id: JobId, stage: PipelineStage) -> Result<()> {
        let mut reg = self.registry.lock().await;
        let job = reg
            .get_mut(&id)
            .ok_or_else(|| DubError::NotFound(id.to_string()))?;
        job.current_stage = Some(stage);
        Ok(())
    }

    pub async fn append_log(&self, id: JobId, message: impl Into<String>) -> Result<()> {
        let mut reg = self.registry.lock().await;
        let job = reg
            .get_mut(&id)
            .ok_or_else(|| DubError::NotFound(id.to_string()))?;
        job.push_log(message);
        Ok(())
    }

    /// Progress is monotonically non-decreasing.
    pub async fn set_progress(&self, id: JobId, percent: u8) -> Result<()> {
        let mut reg = self.registry.lock().await;
        let job = reg
            .get_mut(&id)
            .ok_or_else(|| DubError::NotFound(id.to_string()))?;
        let clamped = percent.min(100);
        if clamped > job.progress {
            job.progress = clamped;
        }
        Ok(())
    }

    /// Only a successful merge may set this.
    pub async fn set_output(&self, id: JobId, path: String) -> Result<()> {
        let mut reg = self.registry.lock().await;
        let job = reg
            .get_mut(&id)
            .ok_or_else(|| DubError::NotFound(id.to_string()))?;
        job.output_path = Some(path);
        Ok(())
    }

    pub async fn set_quality_report(&self, id: JobId, report: QualityReport) -> Result<()> {
        let mut reg = self.registry.lock().await;
        let job = reg
            .get_mut(&id)
            .ok_or_else(|| DubError::NotFound(id.to_string()))?;
        job.quality_report = Some(report);
        Ok(())
    }

    /// Idempotent set-membership operation. Does not itself stop work —
    /// workers poll `is_cancelled` at checkpoints.
    pub async fn cancel(&self, id: JobId) -> Result<bool> {
        let mut reg = self.registry.lock().await;
        let job = reg
            .get_mut(&id)
            .ok_or_else(|| DubError::NotFound(id.to_string()))?;
        if job.status.is_terminal() {
            return Ok(false);
        }
        job.cancelled = true;
        Ok(true)
    }

    pub async fn is_cancelled(&self, id: JobId) -> Result<bool> {
        let reg = self.registry.lock().await;
        let job = reg
            .get(&id)
            .ok_or_else(|| DubError::NotFound(id.to_string()))?;
        Ok(job.cancelled)
    }

    /// Count of jobs not yet in a terminal state, for `GET /api/system/status`.
    pub async fn active_count(&self) -> usize {
        let reg = self.registry.lock().await;
        reg.values().filter(|j| !j.status.is_terminal()).count()
    }

    pub async fn input_path(&self, id: JobId) -> Result<String> {
        let reg = self.registry.lock().await;
        let job = reg
            .get(&id)
            .ok_or_else(|| DubError::NotFound(id.to_string()))?;
        job.input_path
            .clone()
            .ok_or_else(|| DubError::NotFound(id.to_string()))
    }
}

impl Default for JobManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dub_protocol::{EngineChoice, SyncMode};

    fn settings() -> JobSettings {
        JobSettings {
            source_lang: "ko".into(),
            target_lang: "en".into(),
            clone_voice: false,
            verify_translation: false,
            sync_mode: SyncMode::SpeedSync,
            stt_engine: EngineChoice::Auto,
            translation_engine: EngineChoice::Auto,
            tts_engine: EngineChoice::Auto,
        }
    }

    #[tokio::test]
    async fn created_job_is_always_gettable() {
        let mgr = JobManager::new();
        let id = mgr.create(settings(), "in.mp4".into()).await;
        let view = mgr.get(id).await.expect("create ids always validate via get");
        assert_eq!(view.status, JobStatus::Queued);
    }

    #[tokio::test]
    async fn unknown_id_is_not_found() {
        let mgr = JobManager::new();
        let bogus = JobId::new();
        assert!(matches!(mgr.get(bogus).await, Err(DubError::NotFound(_))));
    }

    #[tokio::test]
    async fn terminal_status_is_never_revised() {
        let mgr = JobManager::new();
        let id = mgr.create(settings(), "in.mp4".into()).await;
        mgr.update_status(id, JobStatus::Completed).await.unwrap();
        mgr.update_status(id, JobStatus::Failed).await.unwrap();
        let view = mgr.get(id).await.unwrap();
        assert_eq!(view.status, JobStatus::Completed);
    }

    #[tokio::test]
    async fn progress_never_decreases() {
        let mgr = JobManager::new();
        let id = mgr.create(settings(), "in.mp4".into()).await;
        mgr.set_progress(id, 50).await.unwrap();
        mgr.set_progress(id, 20).await.unwrap();
        let view = mgr.get(id).await.unwrap();
        assert_eq!(view.progress, 50);
    }

    #[tokio::test]
    async fn cancelling_terminal_job_is_a_noop() {
        let mgr = JobManager::new();
        let id = mgr.create(settings(), "in.mp4".into()).await;
        mgr.update_status(id, JobStatus::Completed).await.unwrap();
        let changed = mgr.cancel(id).await.unwrap();
        assert!(!changed);
    }

    #[tokio::test]
    async fn log_buffer_trims_oldest_on_overflow() {
        let mgr = JobManager::new();
        let id = mgr.create(settings(), "in.mp4".into()).await;
        for i in 0..1005 {
            mgr.append_log(id, format!("line {i}")).await.unwrap();
        }
        let view = mgr.get(id).await.unwrap();
        assert!(view.logs.len() <= 1000);
        assert!(view.logs.first().unwrap().message.contains("line"));
    }

    #[tokio::test]
    async fn long_message_is_truncated_with_ellipsis() {
        let mgr = JobManager::new();
        let id = mgr.create(settings(), "in.mp4".into()).await;
        let long = "x".repeat(600);
        mgr.append_log(id, long).await.unwrap();
        let view = mgr.get(id).await.unwrap();
        let msg = &view.logs[0].message;
        assert!(msg.chars().count() <= 500);
        assert!(msg.ends_with('\u{2026}'));
    }
}
