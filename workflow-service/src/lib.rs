// Workflow Service Library
// Core engine for driving preservation packages through a chain-link
// graph, with a gRPC approval surface for human-in-the-loop steps

pub mod engine;
pub mod error;
pub mod events;
pub mod grpc;
pub mod registry;
pub mod replacements;
pub mod runners;
pub mod service;
pub mod workflow;

// Re-export commonly used types
pub use error::{EngineError, RegistryError};

// Re-export workflow types
pub use workflow::{
    Chain, ChainLink, Choice, ChoiceDuplicate, CommandArg, CommandTemplate, ExitCodeAggregation,
    Job, JobKind, JobStatus, ScriptKind, StoreError, TaskCommand, TaskOutcome, TaskResult, Unit,
    UnitFile, UnitKind, WorkflowDefinition, WorkflowStore, APPROVE_TRANSFER_LABEL,
};

// Re-export engine types
pub use engine::{AllFiles, ChainEngine, EngineConfig, FileSelector, UnitOutcome, UnitRun};

// Re-export registry and service types
pub use registry::{PendingEntry, PendingJob, PendingRegistry, ResumeHandle};
pub use replacements::{ReplacementDict, ReplacementDictStore, ReplacementError, ReplacementFilter};
pub use service::ApprovalServiceImpl;

// Re-export runner and event types
pub use events::{EventOutcome, EventRecorder, TaskEvent, TracingRecorder};
pub use runners::{CommandRunner, TaskExecutor, TaskRequest};
