//! Async worker pool: `tokio::spawn` tasks pulling job ids off a shared
//! queue and driving each through the orchestrator in turn. Pipeline work
//! is async end to end (network calls, subprocesses), so there is no
//! blocking call to isolate onto its own OS thread.

use dub_core::{JobManager, Orchestrator};
use dub_protocol::JobId;
use log::{debug, info};
use std::sync::Arc;
use tokio::sync::Mutex;

pub struct WorkerPool {
    job_tx: tokio::sync::mpsc::UnboundedSender<JobId>,
}

impl WorkerPool {
    /// Spawns `num_workers` tasks pulling from a shared job-id queue, each
    /// running one job to completion via `Orchestrator::run_job` before
    /// pulling the next.
    pub fn new(job_manager: JobManager, orchestrator: Arc<Orchestrator>, num_workers: usize) -> Self {
        let (job_tx, job_rx) = tokio::sync::mpsc::unbounded_channel();
        let job_rx = Arc::new(Mutex::new(job_rx));

        for worker_id in 0..num_workers {
            let job_rx = Arc::clone(&job_rx);
            let orchestrator = Arc::clone(&orchestrator);
            let job_manager = job_manager.clone();
            tokio::spawn(async move {
                worker_loop(worker_id, job_rx, job_manager, orchestrator).await;
            });
        }

        Self { job_tx }
    }

    pub fn job_sender(&self) -> tokio::sync::mpsc::UnboundedSender<JobId> {
        self.job_tx.clone()
    }
}

async fn worker_loop(
    worker_id: usize,
    job_rx: Arc<Mutex<tokio::sync::mpsc::UnboundedReceiver<JobId>>>,
    job_manager: JobManager,
    orchestrator: Arc<Orchestrator>,
) {
    info!("worker {worker_id} started");
    loop {
        let id = {
            let mut rx = job_rx.lock().await;
            rx.recv().await
        };
        let Some(id) = id else {
            debug!("worker {worker_id} shutting down (channel closed)");
            break;
        };

        let settings = match job_manager.get(id).await {
            Ok(view) => view.settings,
            Err(_) => {
                debug!("worker {worker_id} skipping unknown job {id}");
                continue;
            }
        };

        debug!("worker {worker_id} processing job {id}");
        orchestrator.run_job(id, settings).await;
    }
}
