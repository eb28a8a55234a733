// Event recording
// Structured per-task outcome records, persisted best-effort

use crate::workflow::models::TaskResult;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

/// Outcome derived from a task's exit status and printed record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventOutcome {
    Pass,
    Fail,
    NotApplicable,
}

impl EventOutcome {
    fn from_result(result: &TaskResult) -> Self {
        match result.effective_exit_code() {
            0 => EventOutcome::Pass,
            2 => EventOutcome::NotApplicable,
            _ => EventOutcome::Fail,
        }
    }
}

/// One recorded task outcome
#[derive(Debug, Clone, Serialize)]
pub struct TaskEvent {
    pub unit_id: Uuid,
    pub job_id: Uuid,
    pub link_id: String,
    pub file_id: Option<Uuid>,
    pub outcome: EventOutcome,
    /// Detail note from the task's outcome record, if any
    pub note: String,
    pub exit_code: Option<i32>,
    pub recorded_at: DateTime<Utc>,
}

impl TaskEvent {
    pub fn from_task(
        unit_id: Uuid,
        job_id: Uuid,
        link_id: impl Into<String>,
        result: &TaskResult,
    ) -> Self {
        Self {
            unit_id,
            job_id,
            link_id: link_id.into(),
            file_id: result.file_id,
            outcome: EventOutcome::from_result(result),
            note: result
                .outcome
                .as_ref()
                .map(|o| o.note.clone())
                .unwrap_or_default(),
            exit_code: result.exit_code,
            recorded_at: Utc::now(),
        }
    }
}

/// Persists task events. Recording is best-effort: the engine logs and
/// swallows recorder failures rather than failing the job.
#[async_trait]
pub trait EventRecorder: Send + Sync {
    async fn record(&self, event: TaskEvent) -> Result<(), std::io::Error>;
}

/// Default recorder that emits events to the tracing subscriber
#[derive(Debug, Clone, Default)]
pub struct TracingRecorder;

#[async_trait]
impl EventRecorder for TracingRecorder {
    async fn record(&self, event: TaskEvent) -> Result<(), std::io::Error> {
        info!(
            unit_id = %event.unit_id,
            job_id = %event.job_id,
            link_id = %event.link_id,
            file_id = ?event.file_id,
            outcome = ?event.outcome,
            exit_code = ?event.exit_code,
            note = %event.note,
            "task completed"
        );
        Ok(())
    }
}
