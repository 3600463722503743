//! Single-slot semaphore serializing access to GPU-resident local models.

use dub_common::{DubError, Result};
use log::debug;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

pub type CleanupHook = Arc<dyn Fn() + Send + Sync>;

#[derive(Clone)]
pub struct ResourceGate {
    slot: Arc<Mutex<()>>,
    cleanup: CleanupHook,
}

impl ResourceGate {
    pub fn new(cleanup: CleanupHook) -> Self {
        Self {
            slot: Arc::new(Mutex::new(())),
            cleanup,
        }
    }

    /// Blocks until the gate is free, then returns a guard. Fails fast with
    /// `Cancelled` if `is_cancelled` already reports true, without ever
    /// taking the slot.
    pub async fn acquire(&self, label: &str, is_cancelled: impl Fn() -> bool) -> Result<ResourceGateGuard> {
        if is_cancelled() {
            return Err(DubError::Cancelled);
        }
        debug!("resource gate: acquiring for {label}");
        let guard = self.slot.clone().lock_owned().await;
        if is_cancelled() {
            drop(guard);
            (self.cleanup)();
            return Err(DubError::Cancelled);
        }
        Ok(ResourceGateGuard {
            _guard: guard,
            cleanup: self.cleanup.clone(),
            label: label.to_string(),
        })
    }
}

/// Releases the slot and invokes the cleanup hook on drop, regardless of
/// whether the acquirer's work succeeded.
pub struct ResourceGateGuard {
    _guard: OwnedMutexGuard<()>,
    cleanup: CleanupHook,
    label: String,
}

impl Drop for ResourceGateGuard {
    fn drop(&mut self) {
        debug!("resource gate: releasing for {}", self.label);
        (self.cleanup)();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    #[serial_test::serial]
    async fn second_acquire_waits_for_first_to_drop() {
        let cleanups = Arc::new(AtomicUsize::new(0));
        let cleanups_clone = cleanups.clone();
        let gate = ResourceGate::new(Arc::new(move || {
            cleanups_clone.fetch_add(1, Ordering::SeqCst);
        }));

        let first = gate.acquire("stt", || false).await.unwrap();
        let gate_clone = gate.clone();
        let second_task = tokio::spawn(async move { gate_clone.acquire("tts", || false).await });

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!second_task.is_finished());

        drop(first);
        let second = second_task.await.unwrap().unwrap();
        drop(second);

        assert_eq!(cleanups.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn cancelled_job_fails_fast_without_blocking() {
        let gate = ResourceGate::new(Arc::new(|| {}));
        let result = gate.acquire("stt", || true).await;
        assert!(matches!(result, Err(DubError::Cancelled)));
    }
}
