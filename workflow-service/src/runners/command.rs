// Command runner
// Spawns one subprocess per task and parses its structured outcome record

use crate::runners::{TaskExecutor, TaskRequest};
use crate::workflow::models::{TaskOutcome, TaskResult};

use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// Subprocess-backed task executor.
///
/// Shell commands run through `sh -c`; plain commands spawn the program
/// directly with its resolved arguments. Stdout and stderr are captured
/// whole; tasks are expected to be short-lived validators and converters.
#[derive(Debug, Clone, Default)]
pub struct CommandRunner {
    /// Working directory for spawned tasks, inherited when unset
    working_dir: Option<PathBuf>,
}

impl CommandRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }
}

#[async_trait]
impl TaskExecutor for CommandRunner {
    async fn execute(&self, request: TaskRequest) -> TaskResult {
        let mut cmd = if request.command.shell {
            let mut shell = Command::new("sh");
            shell.arg("-c").arg(&request.command.program);
            shell
        } else {
            let mut direct = Command::new(&request.command.program);
            direct.args(&request.command.args);
            direct
        };

        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        debug!(
            task_id = %request.task_id,
            program = %request.command.program,
            "spawning task"
        );

        let output = match cmd.output().await {
            Ok(output) => output,
            Err(e) => {
                // Spawn failure is a failed task, never a failed engine
                return TaskResult {
                    task_id: request.task_id,
                    file_id: request.file_id,
                    exit_code: None,
                    stdout: String::new(),
                    stderr: format!(
                        "failed to spawn '{}': {}",
                        request.command.program, e
                    ),
                    outcome: None,
                };
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        let exit_code = output.status.code();

        // The outcome record is only trusted on a clean exit
        let outcome = if exit_code == Some(0) {
            parse_outcome_record(&stdout)
        } else {
            None
        };

        TaskResult {
            task_id: request.task_id,
            file_id: request.file_id,
            exit_code,
            stdout,
            stderr,
            outcome,
        }
    }
}

/// Parse the single JSON outcome record a task prints on stdout.
///
/// Tolerates leading log noise by scanning lines and taking the last one
/// that parses as a record.
fn parse_outcome_record(stdout: &str) -> Option<TaskOutcome> {
    stdout
        .lines()
        .rev()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .find_map(|line| serde_json::from_str::<TaskOutcome>(line).ok())
}
