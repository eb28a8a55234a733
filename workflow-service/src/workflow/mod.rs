// Workflow graph: domain models and the read-only definition store

pub mod models;
pub mod store;

pub use models::{
    Chain, ChainLink, Choice, CommandArg, CommandTemplate, ExitCodeAggregation, Job, JobKind,
    JobStatus, ScriptKind, TaskCommand, TaskOutcome, TaskResult, Unit, UnitFile, UnitKind,
    APPROVE_TRANSFER_LABEL,
};
pub use store::{ChoiceDuplicate, StoreError, WorkflowDefinition, WorkflowStore};
