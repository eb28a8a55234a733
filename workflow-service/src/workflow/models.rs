// Workflow domain models
// Units, chain links, chains, jobs, tasks, and choices

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Reserved choice label recognized by the ApproveTransfer RPC.
pub const APPROVE_TRANSFER_LABEL: &str = "Approve transfer";

/// The kind of package moving through the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnitKind {
    /// A transfer entering the pipeline
    Transfer,
    /// An ingest package (SIP)
    Sip,
}

/// One file belonging to a unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitFile {
    pub id: Uuid,
    pub path: PathBuf,
}

impl UnitFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            id: Uuid::new_v4(),
            path: path.into(),
        }
    }
}

/// A preservation package being driven through the workflow graph.
///
/// A unit has at most one active job at any time; the engine mutates
/// `current_link` as it advances and `replacements` when an operator
/// selects a replacement dictionary for this unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Unit {
    pub id: Uuid,
    pub kind: UnitKind,
    /// Hidden units are excluded from approval listings
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub current_link: Option<String>,
    #[serde(default)]
    pub files: Vec<UnitFile>,
    /// Key/value parameters selected via a ReplacementDictChoice link
    #[serde(default)]
    pub replacements: HashMap<String, String>,
}

impl Unit {
    pub fn new(kind: UnitKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            hidden: false,
            current_link: None,
            files: Vec::new(),
            replacements: HashMap::new(),
        }
    }

    pub fn with_files(mut self, files: Vec<UnitFile>) -> Self {
        self.files = files;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }
}

/// How a command is handed to the operating system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptKind {
    /// Spawn the program directly with resolved positional arguments
    Command,
    /// Run the command string through `sh -c` after substitution
    Shell,
}

/// One positional argument of a command template
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandArg {
    /// Path of the task's target file
    FilePath,
    /// Identifier of the task's target file
    FileId,
    /// Identifier of the owning unit
    UnitId,
    /// Configured policy directory, empty if none is set
    PolicyDir,
    /// Literal text, subject to `%key%` replacement substitution
    Literal(String),
}

/// A command descriptor configured on a chain link.
///
/// Resolved per task against the unit, the optional target file, and the
/// unit's selected replacement dictionary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandTemplate {
    pub kind: ScriptKind,
    pub command: String,
    #[serde(default)]
    pub args: Vec<CommandArg>,
}

/// A fully resolved command, ready to execute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskCommand {
    pub program: String,
    pub args: Vec<String>,
    /// Run through `sh -c` instead of spawning the program directly
    pub shell: bool,
}

impl CommandTemplate {
    /// Resolve the template into an executable command for one task
    pub fn resolve(
        &self,
        unit: &Unit,
        file: Option<&UnitFile>,
        policy_dir: Option<&Path>,
    ) -> TaskCommand {
        let substitute = |text: &str| -> String {
            let mut out = text.to_string();
            for (key, value) in &unit.replacements {
                out = out.replace(&format!("%{}%", key), value);
            }
            out
        };

        match self.kind {
            ScriptKind::Shell => TaskCommand {
                program: substitute(&self.command),
                args: Vec::new(),
                shell: true,
            },
            ScriptKind::Command => {
                let args = self
                    .args
                    .iter()
                    .map(|arg| match arg {
                        CommandArg::FilePath => file
                            .map(|f| f.path.to_string_lossy().into_owned())
                            .unwrap_or_default(),
                        CommandArg::FileId => {
                            file.map(|f| f.id.to_string()).unwrap_or_default()
                        }
                        CommandArg::UnitId => unit.id.to_string(),
                        CommandArg::PolicyDir => policy_dir
                            .map(|p| p.to_string_lossy().into_owned())
                            .unwrap_or_default(),
                        CommandArg::Literal(text) => substitute(text),
                    })
                    .collect();

                TaskCommand {
                    program: substitute(&self.command),
                    args,
                    shell: false,
                }
            }
        }
    }
}

/// How per-task exit codes combine into a job aggregate.
///
/// Different links assign different meanings to nonzero codes (1 = fail,
/// 2 = not applicable), so the policy is per-link configuration rather
/// than a universal severity order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitCodeAggregation {
    /// Any nonzero task code makes the aggregate 1
    #[default]
    AnyFailure,
    /// The highest task code wins
    WorstCode,
}

impl ExitCodeAggregation {
    /// Combine task exit codes; an empty fan-out aggregates to success
    pub fn aggregate(&self, codes: &[i32]) -> i32 {
        match self {
            ExitCodeAggregation::AnyFailure => {
                if codes.iter().any(|&c| c != 0) {
                    1
                } else {
                    0
                }
            }
            ExitCodeAggregation::WorstCode => codes.iter().copied().max().unwrap_or(0),
        }
    }
}

/// What kind of work a chain link performs, with kind-specific payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JobKind {
    /// One task per eligible file of the unit
    ForEachFile {
        command: CommandTemplate,
        #[serde(default)]
        aggregation: ExitCodeAggregation,
    },
    /// Exactly one task for the unit as a whole
    OneOff { command: CommandTemplate },
    /// Suspend until an operator picks one of the configured chains
    UserChoice { chains: Vec<String> },
    /// Suspend until an operator picks a replacement dictionary entry
    ReplacementDictChoice,
}

impl JobKind {
    /// Whether this kind suspends the unit on an operator decision
    pub fn is_choice(&self) -> bool {
        matches!(
            self,
            JobKind::UserChoice { .. } | JobKind::ReplacementDictChoice
        )
    }
}

/// One node of the workflow graph, immutable at runtime
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainLink {
    pub id: String,
    /// Group label shown to operators ("Validation", "Normalize", ...)
    #[serde(default)]
    pub group: String,
    pub description: String,
    pub kind: JobKind,
    /// Exit-code keyed transitions to the next link
    #[serde(default)]
    pub transitions: HashMap<i32, String>,
    /// Fallback when no transition matches; absent means terminal
    #[serde(default)]
    pub default_next: Option<String>,
}

/// A named alternative branch offered as an option at a UserChoice link
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chain {
    pub id: String,
    pub description: String,
    pub start_link: String,
}

/// An offered (value, label) decision at a suspended job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    /// A chain id, or a replacement dictionary option index
    pub value: String,
    pub description: String,
}

/// Lifecycle of one job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    Running,
    AwaitingApproval,
    Completed,
    Errored,
}

/// One execution of a chain link for one unit
#[derive(Debug, Clone)]
pub struct Job {
    pub id: Uuid,
    pub unit_id: Uuid,
    pub link_id: String,
    pub status: JobStatus,
    /// Aggregate exit code, once all tasks have folded in
    pub exit_code: Option<i32>,
    /// Offered choices while the job is awaiting approval
    pub choices: Vec<Choice>,
}

impl Job {
    pub fn new(unit_id: Uuid, link_id: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            unit_id,
            link_id: link_id.into(),
            status: JobStatus::Running,
            exit_code: None,
            choices: Vec::new(),
        }
    }
}

/// The single structured record a task prints on stdout when it exits zero
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskOutcome {
    /// `pass`, `fail`, or a tool-specific verdict
    pub outcome: String,
    /// Human-readable detail note
    #[serde(default)]
    pub note: String,
}

/// The result of one command execution within a job
#[derive(Debug, Clone)]
pub struct TaskResult {
    pub task_id: Uuid,
    /// Target file, absent for unit-scoped tasks
    pub file_id: Option<Uuid>,
    /// Process exit code; `None` when the process could not be spawned
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    /// Parsed outcome record, only present on a zero exit
    pub outcome: Option<TaskOutcome>,
}

impl TaskResult {
    /// Exit code as seen by the transition machinery.
    ///
    /// A spawn failure or a zero exit with an unparseable record both fold
    /// to 1; any other code passes through untouched.
    pub fn effective_exit_code(&self) -> i32 {
        match self.exit_code {
            None => 1,
            Some(0) if self.outcome.is_none() => 1,
            Some(code) => code,
        }
    }

    /// Whether this task counts as failed
    pub fn failed(&self) -> bool {
        self.effective_exit_code() != 0
    }
}
