// Task execution seam
// The engine dispatches tasks through this trait; production uses the
// subprocess-backed CommandRunner, tests substitute scripted executors

pub mod command;

pub use command::CommandRunner;

use crate::workflow::models::{TaskCommand, TaskResult};

use async_trait::async_trait;
use uuid::Uuid;

/// One command execution requested by the engine
#[derive(Debug, Clone)]
pub struct TaskRequest {
    pub task_id: Uuid,
    /// Target file for per-file tasks, absent for unit-scoped ones
    pub file_id: Option<Uuid>,
    pub command: TaskCommand,
}

impl TaskRequest {
    pub fn new(file_id: Option<Uuid>, command: TaskCommand) -> Self {
        Self {
            task_id: Uuid::new_v4(),
            file_id,
            command,
        }
    }
}

/// Runs one command for one file or unit and reports its outcome.
///
/// Implementations never abort sibling tasks and never panic on a failing
/// command; every failure mode is encoded in the returned `TaskResult`.
#[async_trait]
pub trait TaskExecutor: Send + Sync {
    async fn execute(&self, request: TaskRequest) -> TaskResult;
}
