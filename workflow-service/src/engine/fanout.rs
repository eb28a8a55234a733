// Bounded-parallel task fan-out
// Dispatches a job's tasks through the executor, at most `parallelism` at
// a time, and waits for the whole set

use crate::runners::{TaskExecutor, TaskRequest};
use crate::workflow::models::TaskResult;

use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::error;

/// Execute every request, collecting results in request order.
///
/// A failing task never aborts its siblings; even a panicking executor
/// only costs that one task, which is folded in as a failure.
pub async fn fan_out(
    executor: Arc<dyn TaskExecutor>,
    requests: Vec<TaskRequest>,
    parallelism: usize,
) -> Vec<TaskResult> {
    let semaphore = Arc::new(Semaphore::new(parallelism.max(1)));
    let mut handles = Vec::with_capacity(requests.len());

    for request in requests {
        let executor = executor.clone();
        let semaphore = semaphore.clone();
        let task_id = request.task_id;
        let file_id = request.file_id;

        let handle = tokio::spawn(async move {
            // The semaphore is never closed while handles are pending
            let _permit = match semaphore.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => return failed_result(task_id, file_id, "fan-out semaphore closed"),
            };
            executor.execute(request).await
        });
        handles.push((task_id, file_id, handle));
    }

    let mut results = Vec::with_capacity(handles.len());
    for (task_id, file_id, handle) in handles {
        match handle.await {
            Ok(result) => results.push(result),
            Err(e) => {
                error!(task_id = %task_id, error = %e, "task execution panicked");
                results.push(failed_result(task_id, file_id, "task execution panicked"));
            }
        }
    }
    results
}

fn failed_result(task_id: uuid::Uuid, file_id: Option<uuid::Uuid>, reason: &str) -> TaskResult {
    TaskResult {
        task_id,
        file_id,
        exit_code: None,
        stdout: String::new(),
        stderr: reason.to_string(),
        outcome: None,
    }
}
