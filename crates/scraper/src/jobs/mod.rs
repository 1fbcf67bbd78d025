//! Named periodic jobs with an explicit lifecycle.
//!
//! Each [`ScheduledTask`] is registered once under its name. The
//! [`JobRegistry`] owns the running handle of every task, so starting a job
//! that is already running replaces it instead of leaking a second loop.

mod sweeps;

pub use sweeps::{FailoverSweep, FailureResetSweep, FAILOVER_SWEEP_JOB, FAILURE_RESET_SWEEP_JOB};

use async_trait::async_trait;
use log::{debug, info, warn};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::errors::{Result, ScrapeError};

/// A unit of periodic work.
#[async_trait]
pub trait ScheduledTask: Send + Sync {
    /// Registry key.
    fn name(&self) -> &str;

    /// Time between two runs. The first run happens one period after start.
    fn period(&self) -> Duration;

    /// One run. Failures are handled and logged by the task itself.
    async fn run(&self);
}

struct JobEntry {
    task: Arc<dyn ScheduledTask>,
    handle: Option<JoinHandle<()>>,
}

impl JobEntry {
    fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    fn stop(&mut self) -> bool {
        match self.handle.take() {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }
}

/// Registry of periodic jobs keyed by name.
#[derive(Default)]
pub struct JobRegistry {
    jobs: Mutex<HashMap<String, JobEntry>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a task, stopping and replacing any task with the same name.
    pub fn register(&self, task: Arc<dyn ScheduledTask>) {
        let name = task.name().to_string();
        let mut jobs = self.lock_jobs();
        if let Some(mut previous) = jobs.insert(name.clone(), JobEntry { task, handle: None }) {
            if previous.stop() {
                warn!("Job '{}' re-registered while running, previous loop stopped", name);
            }
        }
    }

    /// Start a job, restarting it if it is already running.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(&self, name: &str) -> Result<()> {
        let mut jobs = self.lock_jobs();
        let entry = jobs
            .get_mut(name)
            .ok_or_else(|| ScrapeError::NotFound(format!("job '{}'", name)))?;

        if entry.stop() {
            debug!("Job '{}' restarted", name);
        }
        entry.handle = Some(spawn_loop(entry.task.clone()));
        info!(
            "Job '{}' started (every {:?})",
            name,
            entry.task.period()
        );
        Ok(())
    }

    /// Stop a job. Returns false if it was not running.
    pub fn stop(&self, name: &str) -> Result<bool> {
        let mut jobs = self.lock_jobs();
        let entry = jobs
            .get_mut(name)
            .ok_or_else(|| ScrapeError::NotFound(format!("job '{}'", name)))?;

        let stopped = entry.stop();
        if stopped {
            info!("Job '{}' stopped", name);
        }
        Ok(stopped)
    }

    pub fn start_all(&self) {
        for name in self.names() {
            if let Err(e) = self.start(&name) {
                warn!("Could not start job '{}': {}", name, e);
            }
        }
    }

    pub fn stop_all(&self) {
        let mut jobs = self.lock_jobs();
        for (name, entry) in jobs.iter_mut() {
            if entry.stop() {
                info!("Job '{}' stopped", name);
            }
        }
    }

    pub fn is_running(&self, name: &str) -> bool {
        self.lock_jobs().get(name).is_some_and(JobEntry::is_running)
    }

    /// Registered job names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.lock_jobs().keys().cloned().collect();
        names.sort();
        names
    }

    /// Lock the job table, recovering from poison if necessary.
    fn lock_jobs(&self) -> MutexGuard<'_, HashMap<String, JobEntry>> {
        self.jobs.lock().unwrap_or_else(|poisoned| {
            warn!("Job registry mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }
}

impl Drop for JobRegistry {
    fn drop(&mut self) {
        self.stop_all();
    }
}

fn spawn_loop(task: Arc<dyn ScheduledTask>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let period = task.period();
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            debug!("Job '{}' running", task.name());
            task.run().await;
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct CountingTask {
        name: &'static str,
        runs: AtomicU32,
    }

    impl CountingTask {
        fn new(name: &'static str) -> Arc<Self> {
            Arc::new(Self {
                name,
                runs: AtomicU32::new(0),
            })
        }

        fn runs(&self) -> u32 {
            self.runs.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ScheduledTask for CountingTask {
        fn name(&self) -> &str {
            self.name
        }

        fn period(&self) -> Duration {
            Duration::from_secs(1)
        }

        async fn run(&self) {
            self.runs.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_runs_periodically_and_stop_halts() {
        let registry = JobRegistry::new();
        let task = CountingTask::new("sweep");
        registry.register(task.clone());

        registry.start("sweep").unwrap();
        assert!(registry.is_running("sweep"));
        tokio::time::sleep(Duration::from_millis(3_500)).await;
        let runs = task.runs();
        assert!(runs >= 2, "expected at least 2 runs, got {}", runs);

        assert!(registry.stop("sweep").unwrap());
        assert!(!registry.is_running("sweep"));
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(task.runs(), runs);

        assert!(!registry.stop("sweep").unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_run_waits_one_period() {
        let registry = JobRegistry::new();
        let task = CountingTask::new("sweep");
        registry.register(task.clone());
        registry.start("sweep").unwrap();

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(task.runs(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_keeps_a_single_loop() {
        let registry = JobRegistry::new();
        let task = CountingTask::new("sweep");
        registry.register(task.clone());

        registry.start("sweep").unwrap();
        registry.start("sweep").unwrap();
        tokio::time::sleep(Duration::from_millis(1_500)).await;

        assert_eq!(task.runs(), 1);
    }

    #[tokio::test]
    async fn test_unknown_job() {
        let registry = JobRegistry::new();
        assert!(registry.start("missing").unwrap_err().is_not_found());
        assert!(registry.stop("missing").unwrap_err().is_not_found());
        assert!(!registry.is_running("missing"));
    }

    #[tokio::test]
    async fn test_start_and_stop_all() {
        let registry = JobRegistry::new();
        registry.register(CountingTask::new("b"));
        registry.register(CountingTask::new("a"));

        assert_eq!(registry.names(), vec!["a".to_string(), "b".to_string()]);

        registry.start_all();
        assert!(registry.is_running("a") && registry.is_running("b"));

        registry.stop_all();
        assert!(!registry.is_running("a") && !registry.is_running("b"));
    }
}
