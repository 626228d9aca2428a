//! Task queue and task group operations.
//!
//! Status transitions are guarded in SQL: a task starts only from `pending`
//! and completes only from `running`, so a task can never move backward or
//! complete twice. Group counters are incremented in the same guarded path.

use chrono::Utc;
use libsql::params;
use serpforge_shared::types::{GroupId, GroupStatus, Task, TaskStatus};
use serpforge_shared::{Result, SerpforgeError};

use crate::{Storage, get_str, parse_timestamp};

impl Storage {
    // -----------------------------------------------------------------------
    // Groups
    // -----------------------------------------------------------------------

    /// Create a task group with one pending task per keyword.
    ///
    /// Task ids are `<group_id>_task_<ordinal>`, ordinals starting at 1 in
    /// input order.
    pub async fn create_group(
        &self,
        name: &str,
        keywords: &[String],
        priority: i64,
    ) -> Result<GroupId> {
        let group_id = GroupId::new();
        let now = Utc::now().to_rfc3339();

        self.conn
            .execute(
                "INSERT INTO task_groups (group_id, group_name, total_tasks, status, created_at)
                 VALUES (?1, ?2, ?3, 'pending', ?4)",
                params![
                    group_id.to_string(),
                    name,
                    keywords.len() as i64,
                    now.as_str()
                ],
            )
            .await
            .map_err(|e| SerpforgeError::Storage(e.to_string()))?;

        for (i, keyword) in keywords.iter().enumerate() {
            let task_id = format!("{group_id}_task_{}", i + 1);
            self.conn
                .execute(
                    "INSERT INTO task_queue (task_id, group_id, keyword, priority, status, created_at)
                     VALUES (?1, ?2, ?3, ?4, 'pending', ?5)",
                    params![
                        task_id,
                        group_id.to_string(),
                        keyword.as_str(),
                        priority,
                        now.as_str()
                    ],
                )
                .await
                .map_err(|e| SerpforgeError::Storage(e.to_string()))?;
        }

        tracing::info!(%group_id, tasks = keywords.len(), "task group created");
        Ok(group_id)
    }

    /// Mark a group as running.
    pub async fn start_group(&self, group_id: &str) -> Result<()> {
        self.conn
            .execute(
                "UPDATE task_groups
                 SET status = 'running', started_at = ?1
                 WHERE group_id = ?2 AND status = 'pending'",
                params![Utc::now().to_rfc3339(), group_id],
            )
            .await
            .map_err(|e| SerpforgeError::Storage(e.to_string()))?;
        Ok(())
    }

    /// Mark a group as completed and record its wall-clock duration.
    pub async fn mark_group_completed(&self, group_id: &str, total_secs: f64) -> Result<()> {
        self.conn
            .execute(
                "UPDATE task_groups
                 SET status = 'completed', completed_at = ?1,
                     total_execution_time_seconds = ?2
                 WHERE group_id = ?3",
                params![Utc::now().to_rfc3339(), total_secs, group_id],
            )
            .await
            .map_err(|e| SerpforgeError::Storage(e.to_string()))?;
        Ok(())
    }

    /// Progress snapshot for a group.
    pub async fn group_status(&self, group_id: &str) -> Result<Option<GroupStatus>> {
        let mut rows = self
            .conn
            .query(
                "SELECT group_id, group_name, total_tasks, completed_tasks,
                        failed_tasks, status
                 FROM task_groups WHERE group_id = ?1",
                params![group_id],
            )
            .await
            .map_err(|e| SerpforgeError::Storage(e.to_string()))?;

        let Some(row) = rows
            .next()
            .await
            .map_err(|e| SerpforgeError::Storage(e.to_string()))?
        else {
            return Ok(None);
        };

        let total = row
            .get::<u32>(2)
            .map_err(|e| SerpforgeError::Storage(e.to_string()))?;
        let completed = row
            .get::<u32>(3)
            .map_err(|e| SerpforgeError::Storage(e.to_string()))?;
        let failed = row
            .get::<u32>(4)
            .map_err(|e| SerpforgeError::Storage(e.to_string()))?;

        let progress = if total > 0 {
            ((completed + failed) as f64 / total as f64 * 10000.0).round() / 100.0
        } else {
            0.0
        };

        Ok(Some(GroupStatus {
            group_id: get_str(&row, 0)?,
            name: get_str(&row, 1)?,
            total_tasks: total,
            completed_tasks: completed,
            failed_tasks: failed,
            status: get_str(&row, 5)?,
            progress_percent: progress,
        }))
    }

    // -----------------------------------------------------------------------
    // Tasks
    // -----------------------------------------------------------------------

    /// Fetch the next pending task: highest priority first, oldest first
    /// within a priority. Optionally scoped to one group.
    pub async fn next_pending_task(&self, group_id: Option<&str>) -> Result<Option<Task>> {
        let sql_scoped = "SELECT task_id, group_id, keyword, priority, status, created_at,
                        started_at, completed_at, execution_time_seconds,
                        error_message, result_data
                 FROM task_queue
                 WHERE status = 'pending' AND group_id = ?1
                 ORDER BY priority DESC, created_at ASC, id ASC
                 LIMIT 1";
        let sql_any = "SELECT task_id, group_id, keyword, priority, status, created_at,
                        started_at, completed_at, execution_time_seconds,
                        error_message, result_data
                 FROM task_queue
                 WHERE status = 'pending'
                 ORDER BY priority DESC, created_at ASC, id ASC
                 LIMIT 1";

        let mut rows = match group_id {
            Some(gid) => self.conn.query(sql_scoped, params![gid]).await,
            None => self.conn.query(sql_any, params![]).await,
        }
        .map_err(|e| SerpforgeError::Storage(e.to_string()))?;

        match rows
            .next()
            .await
            .map_err(|e| SerpforgeError::Storage(e.to_string()))?
        {
            Some(row) => Ok(Some(row_to_task(&row)?)),
            None => Ok(None),
        }
    }

    /// Transition a task `pending → running`. Returns false when the task is
    /// not pending (already claimed, finished, or unknown).
    pub async fn start_task(&self, task_id: &str) -> Result<bool> {
        let affected = self
            .conn
            .execute(
                "UPDATE task_queue
                 SET status = 'running', started_at = ?1
                 WHERE task_id = ?2 AND status = 'pending'",
                params![Utc::now().to_rfc3339(), task_id],
            )
            .await
            .map_err(|e| SerpforgeError::Storage(e.to_string()))?;
        Ok(affected > 0)
    }

    /// Transition a task `running → completed/failed` and bump the matching
    /// group counter in the same call. Returns false when the task was not
    /// running.
    pub async fn complete_task(
        &self,
        task_id: &str,
        execution_time: f64,
        result_data: Option<&str>,
        error: Option<&str>,
    ) -> Result<bool> {
        let status = if error.is_none() {
            TaskStatus::Completed
        } else {
            TaskStatus::Failed
        };

        let affected = self
            .conn
            .execute(
                "UPDATE task_queue
                 SET status = ?1, completed_at = ?2, execution_time_seconds = ?3,
                     result_data = ?4, error_message = ?5
                 WHERE task_id = ?6 AND status = 'running'",
                params![
                    status.as_str(),
                    Utc::now().to_rfc3339(),
                    execution_time,
                    result_data,
                    error,
                    task_id
                ],
            )
            .await
            .map_err(|e| SerpforgeError::Storage(e.to_string()))?;

        if affected == 0 {
            return Ok(false);
        }

        let counter_sql = match status {
            TaskStatus::Completed => {
                "UPDATE task_groups
                 SET completed_tasks = completed_tasks + 1
                 WHERE group_id = (SELECT group_id FROM task_queue WHERE task_id = ?1)"
            }
            _ => {
                "UPDATE task_groups
                 SET failed_tasks = failed_tasks + 1
                 WHERE group_id = (SELECT group_id FROM task_queue WHERE task_id = ?1)"
            }
        };
        self.conn
            .execute(counter_sql, params![task_id])
            .await
            .map_err(|e| SerpforgeError::Storage(e.to_string()))?;

        Ok(true)
    }

    /// All tasks of a group in ordinal order.
    pub async fn list_group_tasks(&self, group_id: &str) -> Result<Vec<Task>> {
        let mut rows = self
            .conn
            .query(
                "SELECT task_id, group_id, keyword, priority, status, created_at,
                        started_at, completed_at, execution_time_seconds,
                        error_message, result_data
                 FROM task_queue
                 WHERE group_id = ?1
                 ORDER BY id ASC",
                params![group_id],
            )
            .await
            .map_err(|e| SerpforgeError::Storage(e.to_string()))?;

        let mut tasks = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| SerpforgeError::Storage(e.to_string()))?
        {
            tasks.push(row_to_task(&row)?);
        }
        Ok(tasks)
    }
}

fn row_to_task(row: &libsql::Row) -> Result<Task> {
    let status: TaskStatus = get_str(row, 4)?
        .parse()
        .map_err(SerpforgeError::Storage)?;

    let started_at = row
        .get::<String>(6)
        .ok()
        .map(|s| parse_timestamp(&s))
        .transpose()?;
    let completed_at = row
        .get::<String>(7)
        .ok()
        .map(|s| parse_timestamp(&s))
        .transpose()?;

    Ok(Task {
        task_id: get_str(row, 0)?,
        group_id: get_str(row, 1)?,
        keyword: get_str(row, 2)?,
        priority: row
            .get::<i64>(3)
            .map_err(|e| SerpforgeError::Storage(e.to_string()))?,
        status,
        created_at: parse_timestamp(&get_str(row, 5)?)?,
        started_at,
        completed_at,
        execution_time_seconds: row.get::<f64>(8).ok(),
        error_message: row.get::<String>(9).ok(),
        result_data: row.get::<String>(10).ok(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keywords(words: &[&str]) -> Vec<String> {
        words.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn group_creation_and_task_ids() {
        let storage = Storage::open_memory().await.unwrap();
        let group_id = storage
            .create_group("Тест", &keywords(&["кв1", "кв2", "кв3"]), 1)
            .await
            .unwrap();

        let tasks = storage
            .list_group_tasks(&group_id.to_string())
            .await
            .unwrap();
        assert_eq!(tasks.len(), 3);
        assert_eq!(tasks[0].task_id, format!("{group_id}_task_1"));
        assert_eq!(tasks[2].task_id, format!("{group_id}_task_3"));
        assert_eq!(tasks[1].keyword, "кв2");
        assert!(tasks.iter().all(|t| t.status == TaskStatus::Pending));

        let status = storage
            .group_status(&group_id.to_string())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(status.total_tasks, 3);
        assert_eq!(status.completed_tasks, 0);
        assert_eq!(status.failed_tasks, 0);
        assert_eq!(status.progress_percent, 0.0);
    }

    #[tokio::test]
    async fn priority_then_insertion_order() {
        let storage = Storage::open_memory().await.unwrap();
        let low = storage
            .create_group("low", &keywords(&["низкий"]), 1)
            .await
            .unwrap();
        let high = storage
            .create_group("high", &keywords(&["важный"]), 5)
            .await
            .unwrap();

        let next = storage.next_pending_task(None).await.unwrap().unwrap();
        assert_eq!(next.group_id, high.to_string());

        // Scoped fetch ignores the other group.
        let scoped = storage
            .next_pending_task(Some(&low.to_string()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(scoped.keyword, "низкий");
    }

    #[tokio::test]
    async fn start_is_conditional_on_pending() {
        let storage = Storage::open_memory().await.unwrap();
        let group_id = storage
            .create_group("g", &keywords(&["кв"]), 1)
            .await
            .unwrap();
        let task_id = format!("{group_id}_task_1");

        assert!(storage.start_task(&task_id).await.unwrap());
        // Second claim must fail: the task is no longer pending.
        assert!(!storage.start_task(&task_id).await.unwrap());
        assert!(!storage.start_task("unknown").await.unwrap());
    }

    #[tokio::test]
    async fn completion_updates_the_right_counter() {
        let storage = Storage::open_memory().await.unwrap();
        let group_id = storage
            .create_group("g", &keywords(&["a", "b"]), 1)
            .await
            .unwrap();
        let gid = group_id.to_string();

        let t1 = format!("{group_id}_task_1");
        let t2 = format!("{group_id}_task_2");

        storage.start_task(&t1).await.unwrap();
        assert!(
            storage
                .complete_task(&t1, 2.0, Some("{}"), None)
                .await
                .unwrap()
        );

        storage.start_task(&t2).await.unwrap();
        assert!(
            storage
                .complete_task(&t2, 1.0, None, Some("network error"))
                .await
                .unwrap()
        );

        let status = storage.group_status(&gid).await.unwrap().unwrap();
        assert_eq!(status.completed_tasks, 1);
        assert_eq!(status.failed_tasks, 1);
        assert_eq!(status.progress_percent, 100.0);

        let tasks = storage.list_group_tasks(&gid).await.unwrap();
        assert_eq!(tasks[0].status, TaskStatus::Completed);
        assert_eq!(tasks[1].status, TaskStatus::Failed);
        assert_eq!(tasks[1].error_message.as_deref(), Some("network error"));
        assert!(tasks[0].completed_at.is_some());
    }

    #[tokio::test]
    async fn completion_requires_running_state() {
        let storage = Storage::open_memory().await.unwrap();
        let group_id = storage
            .create_group("g", &keywords(&["кв"]), 1)
            .await
            .unwrap();
        let task_id = format!("{group_id}_task_1");

        // Not started yet.
        assert!(
            !storage
                .complete_task(&task_id, 1.0, None, None)
                .await
                .unwrap()
        );

        storage.start_task(&task_id).await.unwrap();
        assert!(
            storage
                .complete_task(&task_id, 1.0, None, None)
                .await
                .unwrap()
        );
        // Terminal states admit no further transition.
        assert!(
            !storage
                .complete_task(&task_id, 1.0, None, None)
                .await
                .unwrap()
        );

        let status = storage
            .group_status(&group_id.to_string())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(status.completed_tasks, 1);
    }

    #[tokio::test]
    async fn group_lifecycle_and_wall_clock_time() {
        let storage = Storage::open_memory().await.unwrap();
        let group_id = storage
            .create_group("g", &keywords(&["кв"]), 1)
            .await
            .unwrap();
        let gid = group_id.to_string();

        storage.start_group(&gid).await.unwrap();
        let status = storage.group_status(&gid).await.unwrap().unwrap();
        assert_eq!(status.status, "running");

        storage.mark_group_completed(&gid, 12.5).await.unwrap();
        let status = storage.group_status(&gid).await.unwrap().unwrap();
        assert_eq!(status.status, "completed");
    }
}
