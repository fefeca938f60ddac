//! ExternalTaskWorker: polls one engine topic and completes what it claims.
//!
//! Each cycle issues a single fetch-and-lock for the subscribed topic and
//! then completes every returned task, in order, with a constant result
//! variable. Failures are logged and end only the operation that failed;
//! the loop itself never exits on error.
//!
//! ## Timing
//!
//! Cycles are single-flight: the loop awaits a cycle before waiting for the
//! next tick, so two cycles never overlap. Ticks missed while a slow cycle
//! was running are not replayed (`MissedTickBehavior::Delay`). Each engine
//! call is bounded by the client timeout, and the shutdown signal is
//! observed both between and during cycles.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use crate::config::{BatchFailurePolicy, WorkerConfig};
use crate::engine::{
    CompleteTask, EngineApi, EngineResult, ExternalTask, FetchAndLock, TopicSubscription,
    TypedValue, VariableMap, WorkerId,
};

/// Outcome of one poll cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollReport {
    /// Fetch-and-lock itself failed; nothing else was attempted.
    pub fetch_failed: bool,
    /// Tasks returned by fetch-and-lock.
    pub fetched: usize,
    pub completed: usize,
    pub failed: usize,
    /// Tasks left untouched after an aborted batch.
    pub skipped: usize,
}

impl PollReport {
    fn fetch_failed() -> Self {
        Self {
            fetch_failed: true,
            ..Self::default()
        }
    }

    pub fn is_clean(&self) -> bool {
        !self.fetch_failed && self.failed == 0 && self.skipped == 0
    }
}

// ---------------------------------------------------------------------------
// ExternalTaskWorker
// ---------------------------------------------------------------------------

/// Fixed-identity worker for a single external task topic.
pub struct ExternalTaskWorker {
    engine: Arc<dyn EngineApi>,
    worker_id: WorkerId,
    subscription: TopicSubscription,
    max_tasks: u32,
    interval: Duration,
    /// Variables sent with every completion. Never derived from the task.
    result: VariableMap,
    policy: BatchFailurePolicy,
}

impl ExternalTaskWorker {
    pub fn new(engine: Arc<dyn EngineApi>, config: &WorkerConfig) -> Self {
        let mut result = VariableMap::new();
        result.insert(
            config.result_variable.clone(),
            TypedValue::string(Some(config.result_label.clone())),
        );

        Self {
            engine,
            worker_id: config.worker_id(),
            subscription: config.subscription(),
            max_tasks: config.max_tasks,
            interval: config.poll_interval(),
            result,
            policy: config.batch_failure_policy,
        }
    }

    /// Run the poll loop until the shutdown signal is received (or its
    /// sender is dropped).
    pub async fn run(&self, mut shutdown_rx: watch::Receiver<bool>) {
        tracing::info!(
            worker_id = %self.worker_id,
            topic = %self.subscription.topic_name,
            interval = ?self.interval,
            "ExternalTaskWorker started"
        );

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            if *shutdown_rx.borrow() {
                break;
            }

            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown_rx.changed() => break,
            }

            tokio::select! {
                report = self.poll_once() => {
                    if report.fetched > 0 || !report.is_clean() {
                        tracing::debug!(
                            fetched = report.fetched,
                            completed = report.completed,
                            failed = report.failed,
                            skipped = report.skipped,
                            "ExternalTaskWorker: cycle finished"
                        );
                    }
                }
                _ = shutdown_rx.changed() => {
                    tracing::info!("ExternalTaskWorker: abandoning in-flight cycle for shutdown");
                    break;
                }
            }
        }

        tracing::info!(worker_id = %self.worker_id, "ExternalTaskWorker stopped");
    }

    /// One fetch-and-lock followed by a completion per returned task.
    pub async fn poll_once(&self) -> PollReport {
        let request = FetchAndLock {
            worker_id: self.worker_id.clone(),
            max_tasks: self.max_tasks,
            topics: vec![self.subscription.clone()],
        };

        let tasks = match self.engine.fetch_and_lock(&request).await {
            Ok(tasks) => tasks,
            Err(e) => {
                tracing::error!(
                    topic = %self.subscription.topic_name,
                    error = %e,
                    "ExternalTaskWorker: fetch-and-lock failed"
                );
                return PollReport::fetch_failed();
            }
        };

        let mut report = PollReport {
            fetched: tasks.len(),
            ..PollReport::default()
        };

        for (idx, task) in tasks.iter().enumerate() {
            tracing::info!(
                task_id = %task.id,
                process_instance_id = task.process_instance_id.as_deref().unwrap_or("-"),
                "Task received"
            );

            match self.complete(task).await {
                Ok(()) => {
                    report.completed += 1;
                    tracing::info!(task_id = %task.id, "Task completed");
                }
                Err(e) => {
                    report.failed += 1;
                    tracing::error!(
                        task_id = %task.id,
                        error = %e,
                        "ExternalTaskWorker: completion failed, task stays locked until expiry"
                    );
                    if self.policy == BatchFailurePolicy::Abort {
                        report.skipped = tasks.len() - idx - 1;
                        if report.skipped > 0 {
                            tracing::warn!(
                                skipped = report.skipped,
                                "ExternalTaskWorker: aborting rest of batch"
                            );
                        }
                        break;
                    }
                }
            }
        }

        report
    }

    async fn complete(&self, task: &ExternalTask) -> EngineResult<()> {
        let body = CompleteTask {
            worker_id: self.worker_id.clone(),
            variables: self.result.clone(),
        };
        self.engine.complete_task(&task.id, &body).await
    }
}
