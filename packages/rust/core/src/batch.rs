//! Batch processing of task groups.
//!
//! The drain loop is the sole database writer: it claims tasks, applies
//! completions, and persists research records. Workers only run the network
//! pipeline, bounded by a semaphore.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, instrument, warn};

use serpforge_assistant::AssistantClient;
use serpforge_shared::rules::RuleSet;
use serpforge_shared::types::{GroupStatus, ResearchRecord, Task};
use serpforge_shared::{Result, SerpforgeError};
use serpforge_storage::{STANDARD_INSTRUCTION_ID, Storage};

use crate::pipeline::{self, PipelineOptions, SilentProgress};

/// Progress callback for batch runs.
pub trait BatchProgress: Send + Sync {
    /// Called once before the first task is claimed.
    fn group_started(&self, group_id: &str, total: usize);
    /// Called after each task reaches a terminal state.
    fn task_finished(&self, keyword: &str, ok: bool, done: usize, total: usize, percent: f64);
    /// Called once the group is drained.
    fn group_finished(&self, status: &GroupStatus, elapsed: std::time::Duration);
}

/// No-op batch progress for headless/test usage.
pub struct SilentBatchProgress;

impl BatchProgress for SilentBatchProgress {
    fn group_started(&self, _group_id: &str, _total: usize) {}
    fn task_finished(&self, _keyword: &str, _ok: bool, _done: usize, _total: usize, _percent: f64) {
    }
    fn group_finished(&self, _status: &GroupStatus, _elapsed: std::time::Duration) {}
}

/// Drains a task group through a bounded worker pool.
pub struct BatchProcessor {
    storage: Storage,
    options: PipelineOptions,
    rules: RuleSet,
    assistant: Option<AssistantClient>,
    max_workers: usize,
}

/// What one worker hands back to the drain loop.
struct TaskOutcome {
    task: Task,
    execution_secs: f64,
    result: Result<ResearchRecord>,
}

impl BatchProcessor {
    pub fn new(
        storage: Storage,
        options: PipelineOptions,
        rules: RuleSet,
        assistant: Option<AssistantClient>,
        max_workers: usize,
    ) -> Self {
        Self {
            storage,
            options,
            rules,
            assistant,
            max_workers: max_workers.max(1),
        }
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Drain all pending tasks of a group and mark it completed.
    ///
    /// A failing keyword is recorded on its task and never stops the batch;
    /// only setup and database errors abort.
    #[instrument(skip_all, fields(group_id = %group_id))]
    pub async fn process_group(
        &self,
        group_id: &str,
        progress: &dyn BatchProgress,
    ) -> Result<GroupStatus> {
        let start = Instant::now();

        // Research must not run on an unseeded database.
        self.storage
            .get_instruction(STANDARD_INSTRUCTION_ID)
            .await?;

        let initial = self
            .storage
            .group_status(group_id)
            .await?
            .ok_or_else(|| {
                SerpforgeError::validation(format!("unknown task group: {group_id}"))
            })?;
        let total = initial.total_tasks as usize;

        self.storage.start_group(group_id).await?;
        progress.group_started(group_id, total);
        info!(total, workers = self.max_workers, "draining task group");

        let semaphore = Arc::new(Semaphore::new(self.max_workers));
        let mut workers: JoinSet<TaskOutcome> = JoinSet::new();
        let mut finished = initial.completed_tasks as usize + initial.failed_tasks as usize;

        loop {
            // Claim pending tasks up to the pool width. Claiming happens
            // here, in the single writer, not in the workers.
            while workers.len() < self.max_workers {
                let Some(task) = self.storage.next_pending_task(Some(group_id)).await? else {
                    break;
                };
                if !self.storage.start_task(&task.task_id).await? {
                    continue;
                }

                let options = self.options.clone();
                let rules = self.rules.clone();
                let assistant = self.assistant.clone();
                let permit = semaphore.clone();

                workers.spawn(async move {
                    let _permit = permit.acquire_owned().await.expect("semaphore closed");
                    let started = Instant::now();
                    let result = pipeline::research_keyword(
                        &task.keyword,
                        &options,
                        &rules,
                        assistant.as_ref(),
                        &SilentProgress,
                    )
                    .await;
                    TaskOutcome {
                        task,
                        execution_secs: started.elapsed().as_secs_f64(),
                        result,
                    }
                });
            }

            let Some(joined) = workers.join_next().await else {
                break;
            };
            let outcome = match joined {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!(error = %e, "worker panicked, task left running");
                    continue;
                }
            };

            let ok = match outcome.result {
                Ok(record) => {
                    self.storage.save_research(&record).await?;
                    let summary = serde_json::json!({
                        "research_id": record.id,
                        "keyword": record.keyword,
                    })
                    .to_string();
                    self.storage
                        .complete_task(
                            &outcome.task.task_id,
                            outcome.execution_secs,
                            Some(&summary),
                            None,
                        )
                        .await?;
                    true
                }
                Err(e) => {
                    warn!(keyword = %outcome.task.keyword, error = %e, "task failed");
                    self.storage
                        .complete_task(
                            &outcome.task.task_id,
                            outcome.execution_secs,
                            None,
                            Some(&e.to_string()),
                        )
                        .await?;
                    false
                }
            };

            finished += 1;
            let percent = if total > 0 {
                finished as f64 / total as f64 * 100.0
            } else {
                100.0
            };
            progress.task_finished(&outcome.task.keyword, ok, finished, total, percent);
        }

        self.storage
            .mark_group_completed(group_id, start.elapsed().as_secs_f64())
            .await?;

        let status = self
            .storage
            .group_status(group_id)
            .await?
            .ok_or_else(|| {
                SerpforgeError::validation(format!("unknown task group: {group_id}"))
            })?;

        progress.group_finished(&status, start.elapsed());
        info!(
            completed = status.completed_tasks,
            failed = status.failed_tasks,
            elapsed_ms = start.elapsed().as_millis(),
            "task group drained"
        );

        Ok(status)
    }
}
