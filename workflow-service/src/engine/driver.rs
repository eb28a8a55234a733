// Job/chain engine
// Walks one unit through the workflow graph, fanning tasks out at each
// link and suspending on operator choices

use crate::engine::fanout::fan_out;
use crate::error::EngineError;
use crate::events::{EventRecorder, TaskEvent, TracingRecorder};
use crate::registry::{PendingJob, PendingRegistry};
use crate::replacements::ReplacementDictStore;
use crate::runners::{TaskExecutor, TaskRequest};
use crate::workflow::models::{
    ChainLink, Choice, CommandTemplate, ExitCodeAggregation, Job, JobKind, JobStatus, Unit,
    UnitFile,
};
use crate::workflow::store::WorkflowStore;

use std::path::PathBuf;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Deployment parameters of the engine
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Upper bound on concurrently running tasks within one job
    pub parallelism: usize,
    /// Directory handed to tasks that take a policy-directory argument
    pub policy_dir: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            parallelism: 4,
            policy_dir: None,
        }
    }
}

/// Picks the files a ForEachFile link operates on.
///
/// File-selection policy lives outside the engine; the default selects
/// every file of the unit.
pub trait FileSelector: Send + Sync {
    fn eligible_files(&self, unit: &Unit, link: &ChainLink) -> Vec<UnitFile>;
}

/// Default selector: every file is eligible at every link
#[derive(Debug, Clone, Default)]
pub struct AllFiles;

impl FileSelector for AllFiles {
    fn eligible_files(&self, unit: &Unit, _link: &ChainLink) -> Vec<UnitFile> {
        unit.files.clone()
    }
}

/// How a unit's walk through the graph ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitOutcome {
    /// Reached a link with no applicable transition; normal completion
    Completed,
    /// An engine-internal fault ended this unit's path
    Errored(String),
}

/// The full record of one unit's walk
#[derive(Debug)]
pub struct UnitRun {
    pub unit: Unit,
    /// One job per visited link, in visit order
    pub jobs: Vec<Job>,
    pub outcome: UnitOutcome,
}

enum LinkResult {
    Next(String),
    Terminal,
}

/// Drives units through the chain-link graph.
///
/// Units are processed independently; the pending registry is the only
/// shared mutable state between drivers and the approval service.
pub struct ChainEngine {
    store: Arc<WorkflowStore>,
    executor: Arc<dyn TaskExecutor>,
    registry: Arc<PendingRegistry>,
    replacements: Arc<ReplacementDictStore>,
    recorder: Arc<dyn EventRecorder>,
    selector: Arc<dyn FileSelector>,
    config: EngineConfig,
}

impl ChainEngine {
    pub fn new(
        store: Arc<WorkflowStore>,
        executor: Arc<dyn TaskExecutor>,
        registry: Arc<PendingRegistry>,
        replacements: Arc<ReplacementDictStore>,
    ) -> Self {
        Self {
            store,
            executor,
            registry,
            replacements,
            recorder: Arc::new(TracingRecorder),
            selector: Arc::new(AllFiles),
            config: EngineConfig::default(),
        }
    }

    pub fn with_recorder(mut self, recorder: Arc<dyn EventRecorder>) -> Self {
        self.recorder = recorder;
        self
    }

    pub fn with_selector(mut self, selector: Arc<dyn FileSelector>) -> Self {
        self.selector = selector;
        self
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn registry(&self) -> &Arc<PendingRegistry> {
        &self.registry
    }

    /// Spawn a driver task for one unit; each unit gets its own driver
    pub fn spawn_unit(
        self: &Arc<Self>,
        unit: Unit,
        start_link: impl Into<String>,
    ) -> JoinHandle<UnitRun> {
        let engine = self.clone();
        let start = start_link.into();
        tokio::spawn(async move { engine.process_unit(unit, &start).await })
    }

    /// Walk a unit from `start_link` until its path terminates.
    ///
    /// Engine-internal faults mark the current job Errored and end this
    /// unit's walk; they never propagate out of the driver.
    pub async fn process_unit(&self, mut unit: Unit, start_link: &str) -> UnitRun {
        info!(unit_id = %unit.id, start_link, "unit processing started");

        let mut jobs = Vec::new();
        let mut current = start_link.to_string();

        let outcome = loop {
            let link = match self.store.link(&current) {
                Some(link) => link.clone(),
                None => {
                    let fault = EngineError::UnknownLink(current.clone());
                    error!(unit_id = %unit.id, error = %fault, "unit path errored");
                    let mut job = Job::new(unit.id, current.clone());
                    job.status = JobStatus::Errored;
                    jobs.push(job);
                    break UnitOutcome::Errored(fault.to_string());
                }
            };

            unit.current_link = Some(link.id.clone());
            let mut job = Job::new(unit.id, link.id.clone());
            debug!(unit_id = %unit.id, job_id = %job.id, link_id = %link.id, "job started");

            match self.run_link(&mut unit, &link, &mut job).await {
                Ok(LinkResult::Next(next)) => {
                    job.status = JobStatus::Completed;
                    jobs.push(job);
                    current = next;
                }
                Ok(LinkResult::Terminal) => {
                    job.status = JobStatus::Completed;
                    jobs.push(job);
                    info!(unit_id = %unit.id, link_id = %link.id, "unit reached a terminal link");
                    break UnitOutcome::Completed;
                }
                Err(fault) => {
                    error!(
                        unit_id = %unit.id,
                        job_id = %job.id,
                        link_id = %link.id,
                        error = %fault,
                        "unit path errored"
                    );
                    job.status = JobStatus::Errored;
                    jobs.push(job);
                    break UnitOutcome::Errored(fault.to_string());
                }
            }
        };

        UnitRun {
            unit,
            jobs,
            outcome,
        }
    }

    /// Execute one link for one unit and decide where to go next
    async fn run_link(
        &self,
        unit: &mut Unit,
        link: &ChainLink,
        job: &mut Job,
    ) -> Result<LinkResult, EngineError> {
        match &link.kind {
            JobKind::ForEachFile {
                command,
                aggregation,
            } => {
                let files = self.selector.eligible_files(unit, link);
                let requests = self.file_requests(unit, command, &files);
                self.run_tasks(unit, link, job, requests, *aggregation).await
            }
            JobKind::OneOff { command } => {
                let policy_dir = self.config.policy_dir.as_deref();
                let request =
                    TaskRequest::new(None, command.resolve(unit, None, policy_dir));
                // The single task's exit code passes through unchanged so
                // the link can route on it
                self.run_tasks(unit, link, job, vec![request], ExitCodeAggregation::WorstCode)
                    .await
            }
            JobKind::UserChoice { .. } => self.run_user_choice(unit, link, job).await,
            JobKind::ReplacementDictChoice => {
                self.run_replacement_choice(unit, link, job).await
            }
        }
    }

    fn file_requests(
        &self,
        unit: &Unit,
        command: &CommandTemplate,
        files: &[UnitFile],
    ) -> Vec<TaskRequest> {
        let policy_dir = self.config.policy_dir.as_deref();
        files
            .iter()
            .map(|file| {
                TaskRequest::new(
                    Some(file.id),
                    command.resolve(unit, Some(file), policy_dir),
                )
            })
            .collect()
    }

    /// Fan tasks out, aggregate their exit codes, resolve the transition.
    ///
    /// A ForEachFile link with zero eligible files succeeds immediately
    /// with no tasks at all.
    async fn run_tasks(
        &self,
        unit: &Unit,
        link: &ChainLink,
        job: &mut Job,
        requests: Vec<TaskRequest>,
        aggregation: ExitCodeAggregation,
    ) -> Result<LinkResult, EngineError> {

        if requests.is_empty() {
            // Zero eligible files: immediate success, zero tasks
            debug!(unit_id = %unit.id, link_id = %link.id, "no eligible files, skipping fan-out");
            job.exit_code = Some(0);
            return Ok(self.transition(link, 0));
        }

        let task_count = requests.len();
        let results = fan_out(
            self.executor.clone(),
            requests,
            self.config.parallelism,
        )
        .await;

        for result in &results {
            let event = TaskEvent::from_task(unit.id, job.id, link.id.clone(), result);
            if let Err(e) = self.recorder.record(event).await {
                // Event recording is best-effort
                warn!(job_id = %job.id, error = %e, "failed to record task event");
            }
        }

        let codes: Vec<i32> = results.iter().map(|r| r.effective_exit_code()).collect();
        let aggregate = aggregation.aggregate(&codes);
        job.exit_code = Some(aggregate);
        debug!(
            unit_id = %unit.id,
            job_id = %job.id,
            link_id = %link.id,
            tasks = task_count,
            aggregate,
            "job tasks completed"
        );

        Ok(self.transition(link, aggregate))
    }

    /// Suspend on a chain choice; resume at the chosen chain's start link
    async fn run_user_choice(
        &self,
        unit: &Unit,
        link: &ChainLink,
        job: &mut Job,
    ) -> Result<LinkResult, EngineError> {
        let chains = self.store.chain_choices(link);
        if chains.is_empty() {
            return Err(EngineError::NoChoicesAvailable(link.id.clone()));
        }
        let choices: Vec<Choice> = chains
            .iter()
            .map(|chain| Choice {
                value: chain.id.clone(),
                description: chain.description.clone(),
            })
            .collect();

        let chosen = self.await_choice(unit, link, job, choices).await?;

        let chain = self
            .store
            .chain(&chosen)
            .ok_or_else(|| EngineError::UnknownChain(chosen.clone()))?;
        info!(
            unit_id = %unit.id,
            job_id = %job.id,
            chain_id = %chain.id,
            "choice resolved, continuing at chain start"
        );
        // The chosen chain's start link bypasses exit-code lookup
        Ok(LinkResult::Next(chain.start_link.clone()))
    }

    /// Suspend on a replacement dictionary choice; the selected entry
    /// parameterizes later commands for this unit
    async fn run_replacement_choice(
        &self,
        unit: &mut Unit,
        link: &ChainLink,
        job: &mut Job,
    ) -> Result<LinkResult, EngineError> {
        let entries = self.replacements.entries_for_link(&link.id);
        if entries.is_empty() {
            return Err(EngineError::NoChoicesAvailable(link.id.clone()));
        }
        let choices: Vec<Choice> = entries
            .iter()
            .enumerate()
            .map(|(index, dict)| Choice {
                value: index.to_string(),
                description: dict.description.clone(),
            })
            .collect();

        let chosen = self.await_choice(unit, link, job, choices).await?;

        match chosen
            .parse::<usize>()
            .ok()
            .and_then(|index| self.replacements.arguments_at(&link.id, index))
        {
            Some(arguments) => {
                info!(
                    unit_id = %unit.id,
                    job_id = %job.id,
                    option = %chosen,
                    "replacement dictionary selected"
                );
                unit.replacements.extend(arguments);
            }
            None => {
                // Stale or mistyped option id; resolved anyway, so move on
                warn!(
                    unit_id = %unit.id,
                    job_id = %job.id,
                    option = %chosen,
                    "resolved with an unknown replacement option, leaving parameters unchanged"
                );
            }
        }

        Ok(match &link.default_next {
            Some(next) => LinkResult::Next(next.clone()),
            None => LinkResult::Terminal,
        })
    }

    /// Register the job as pending and park until an operator resolves it
    async fn await_choice(
        &self,
        unit: &Unit,
        link: &ChainLink,
        job: &mut Job,
        choices: Vec<Choice>,
    ) -> Result<String, EngineError> {
        job.status = JobStatus::AwaitingApproval;
        job.choices = choices.clone();

        let (entry, rx) = PendingJob::new(job.id, unit.id, unit.kind, unit.hidden, choices);
        self.registry.register(entry)?;
        info!(
            unit_id = %unit.id,
            job_id = %job.id,
            link_id = %link.id,
            "job awaiting approval"
        );

        // No timeout: resumption is purely event-driven
        rx.await.map_err(|_| EngineError::ResolutionLost(job.id))
    }

    fn transition(&self, link: &ChainLink, exit_code: i32) -> LinkResult {
        match self.store.next_link(link, exit_code) {
            Some(next) => LinkResult::Next(next.to_string()),
            None => LinkResult::Terminal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::replacements::ReplacementDict;
    use crate::workflow::models::{Chain, ScriptKind, TaskOutcome, TaskResult, UnitKind};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Executor scripted by command name: `pass`, `fail`, `skip`, or
    /// anything else (spawn failure). Records every request it sees.
    #[derive(Default)]
    struct ScriptedExecutor {
        seen: Mutex<Vec<TaskRequest>>,
    }

    impl ScriptedExecutor {
        fn task_count(&self) -> usize {
            self.seen.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl TaskExecutor for ScriptedExecutor {
        async fn execute(&self, request: TaskRequest) -> TaskResult {
            self.seen.lock().unwrap().push(request.clone());
            let (exit_code, outcome) = match request.command.program.as_str() {
                "pass" => (
                    Some(0),
                    Some(TaskOutcome {
                        outcome: "pass".to_string(),
                        note: String::new(),
                    }),
                ),
                "fail" => (Some(1), None),
                "skip" => (Some(2), None),
                _ => (None, None),
            };
            TaskResult {
                task_id: request.task_id,
                file_id: request.file_id,
                exit_code,
                stdout: String::new(),
                stderr: String::new(),
                outcome,
            }
        }
    }

    fn command(program: &str) -> CommandTemplate {
        CommandTemplate {
            kind: ScriptKind::Command,
            command: program.to_string(),
            args: Vec::new(),
        }
    }

    fn for_each(id: &str, program: &str) -> ChainLink {
        ChainLink {
            id: id.to_string(),
            group: String::new(),
            description: id.to_string(),
            kind: JobKind::ForEachFile {
                command: command(program),
                aggregation: ExitCodeAggregation::AnyFailure,
            },
            transitions: HashMap::new(),
            default_next: None,
        }
    }

    fn one_off(id: &str, program: &str) -> ChainLink {
        ChainLink {
            id: id.to_string(),
            group: String::new(),
            description: id.to_string(),
            kind: JobKind::OneOff {
                command: command(program),
            },
            transitions: HashMap::new(),
            default_next: None,
        }
    }

    struct Fixture {
        engine: Arc<ChainEngine>,
        executor: Arc<ScriptedExecutor>,
        registry: Arc<PendingRegistry>,
    }

    fn fixture(links: Vec<ChainLink>, chains: Vec<Chain>) -> Fixture {
        fixture_with_dicts(links, chains, Vec::new())
    }

    fn fixture_with_dicts(
        links: Vec<ChainLink>,
        chains: Vec<Chain>,
        dicts: Vec<ReplacementDict>,
    ) -> Fixture {
        let store = Arc::new(WorkflowStore::new(links, chains).unwrap());
        let executor = Arc::new(ScriptedExecutor::default());
        let registry = Arc::new(PendingRegistry::new());
        let replacements = Arc::new(ReplacementDictStore::new(dicts));
        let engine = Arc::new(ChainEngine::new(
            store,
            executor.clone(),
            registry.clone(),
            replacements,
        ));
        Fixture {
            engine,
            executor,
            registry,
        }
    }

    fn unit_with_files(count: usize) -> Unit {
        let files = (0..count)
            .map(|i| UnitFile::new(format!("/data/objects/file{}.txt", i)))
            .collect();
        Unit::new(UnitKind::Transfer).with_files(files)
    }

    /// Wait for the unit driver to park itself in the pending registry
    async fn wait_for_pending(registry: &PendingRegistry) -> crate::registry::PendingEntry {
        for _ in 0..100 {
            if let Some(entry) = registry.list().into_iter().next() {
                return entry;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("no job became pending");
    }

    #[tokio::test]
    async fn test_exit_code_routing_through_transitions() {
        let mut start = for_each("L", "pass");
        start.transitions.insert(0, "M".to_string());
        start.transitions.insert(1, "N".to_string());

        let run = fixture(vec![start, one_off("M", "pass"), one_off("N", "pass")], Vec::new())
            .engine
            .process_unit(unit_with_files(2), "L")
            .await;

        assert_eq!(run.outcome, UnitOutcome::Completed);
        let visited: Vec<&str> = run.jobs.iter().map(|j| j.link_id.as_str()).collect();
        assert_eq!(visited, vec!["L", "M"]);
        assert_eq!(run.jobs[0].exit_code, Some(0));
        assert_eq!(run.jobs[0].status, JobStatus::Completed);
    }

    #[tokio::test]
    async fn test_failing_task_routes_to_failure_branch() {
        let mut start = for_each("L", "fail");
        start.transitions.insert(0, "M".to_string());
        start.transitions.insert(1, "N".to_string());

        let fx = fixture(vec![start, one_off("M", "pass"), one_off("N", "pass")], Vec::new());
        let run = fx.engine.process_unit(unit_with_files(3), "L").await;

        assert_eq!(run.outcome, UnitOutcome::Completed);
        let visited: Vec<&str> = run.jobs.iter().map(|j| j.link_id.as_str()).collect();
        assert_eq!(visited, vec!["L", "N"]);
        assert_eq!(run.jobs[0].exit_code, Some(1));
        // One task per file plus the one-off at N
        assert_eq!(fx.executor.task_count(), 4);
    }

    #[tokio::test]
    async fn test_zero_eligible_files_succeeds_without_tasks() {
        let mut start = for_each("L", "pass");
        start.transitions.insert(0, "M".to_string());

        let fx = fixture(vec![start, one_off("M", "pass")], Vec::new());
        let run = fx
            .engine
            .process_unit(Unit::new(UnitKind::Transfer), "L")
            .await;

        assert_eq!(run.outcome, UnitOutcome::Completed);
        assert_eq!(run.jobs[0].exit_code, Some(0));
        // Only M's one-off task ever ran
        assert_eq!(fx.executor.task_count(), 1);
    }

    #[tokio::test]
    async fn test_worst_code_aggregation_routes_skip() {
        let mut start = for_each("L", "skip");
        if let JobKind::ForEachFile { aggregation, .. } = &mut start.kind {
            *aggregation = ExitCodeAggregation::WorstCode;
        }
        start.transitions.insert(2, "S".to_string());
        start.transitions.insert(1, "N".to_string());

        let run = fixture(vec![start, one_off("S", "pass"), one_off("N", "pass")], Vec::new())
            .engine
            .process_unit(unit_with_files(1), "L")
            .await;

        let visited: Vec<&str> = run.jobs.iter().map(|j| j.link_id.as_str()).collect();
        assert_eq!(visited, vec!["L", "S"]);
        assert_eq!(run.jobs[0].exit_code, Some(2));
    }

    #[tokio::test]
    async fn test_one_off_exit_code_passes_through() {
        let mut start = one_off("L", "skip");
        start.transitions.insert(2, "S".to_string());
        start.transitions.insert(1, "N".to_string());

        let run = fixture(vec![start, one_off("S", "pass"), one_off("N", "pass")], Vec::new())
            .engine
            .process_unit(unit_with_files(0), "L")
            .await;

        // The task exited 2, so the job aggregate is 2 and routing
        // follows the not-applicable branch
        assert_eq!(run.jobs[0].exit_code, Some(2));
        let visited: Vec<&str> = run.jobs.iter().map(|j| j.link_id.as_str()).collect();
        assert_eq!(visited, vec!["L", "S"]);
    }

    #[tokio::test]
    async fn test_unknown_start_link_errors_unit_only() {
        let run = fixture(vec![one_off("L", "pass")], Vec::new())
            .engine
            .process_unit(unit_with_files(1), "missing")
            .await;

        assert!(matches!(run.outcome, UnitOutcome::Errored(_)));
        assert_eq!(run.jobs.len(), 1);
        assert_eq!(run.jobs[0].status, JobStatus::Errored);
    }

    #[tokio::test]
    async fn test_user_choice_suspends_and_resumes_at_chosen_chain() {
        let choice_link = ChainLink {
            id: "C".to_string(),
            group: String::new(),
            description: "Continue?".to_string(),
            kind: JobKind::UserChoice {
                chains: vec!["chainA".to_string(), "chainB".to_string()],
            },
            transitions: HashMap::new(),
            default_next: None,
        };
        let chains = vec![
            Chain {
                id: "chainA".to_string(),
                description: "Yes".to_string(),
                start_link: "A".to_string(),
            },
            Chain {
                id: "chainB".to_string(),
                description: "No".to_string(),
                start_link: "B".to_string(),
            },
        ];

        let fx = fixture(
            vec![choice_link, one_off("A", "pass"), one_off("B", "pass")],
            chains,
        );
        let handle = fx
            .engine
            .spawn_unit(unit_with_files(0), "C");

        let pending = wait_for_pending(&fx.registry).await;
        assert_eq!(pending.choices.len(), 2);
        assert_eq!(pending.choices[0].description, "Yes");

        let resume = fx.registry.resolve(pending.job_id).unwrap();
        assert!(resume.resume("chainB"));

        let run = handle.await.unwrap();
        assert_eq!(run.outcome, UnitOutcome::Completed);
        let visited: Vec<&str> = run.jobs.iter().map(|j| j.link_id.as_str()).collect();
        assert_eq!(visited, vec!["C", "B"]);
        assert!(fx.registry.is_empty());
    }

    #[tokio::test]
    async fn test_user_choice_unknown_chain_errors_unit() {
        let choice_link = ChainLink {
            id: "C".to_string(),
            group: String::new(),
            description: "Continue?".to_string(),
            kind: JobKind::UserChoice {
                chains: vec!["chainA".to_string()],
            },
            transitions: HashMap::new(),
            default_next: None,
        };
        let chains = vec![Chain {
            id: "chainA".to_string(),
            description: "Yes".to_string(),
            start_link: "A".to_string(),
        }];

        let fx = fixture(vec![choice_link, one_off("A", "pass")], chains);
        let handle = fx.engine.spawn_unit(unit_with_files(0), "C");

        let pending = wait_for_pending(&fx.registry).await;
        let resume = fx.registry.resolve(pending.job_id).unwrap();
        // A value that is not a configured chain id
        assert!(resume.resume("no-such-chain"));

        let run = handle.await.unwrap();
        assert!(matches!(run.outcome, UnitOutcome::Errored(_)));
        assert_eq!(run.jobs.last().unwrap().status, JobStatus::Errored);
    }

    #[tokio::test]
    async fn test_replacement_choice_parameterizes_unit() {
        let choice_link = ChainLink {
            id: "pick".to_string(),
            group: String::new(),
            description: "Pick a format".to_string(),
            kind: JobKind::ReplacementDictChoice,
            transitions: HashMap::new(),
            default_next: Some("done".to_string()),
        };

        let dicts = vec![
            ReplacementDict {
                link_id: "pick".to_string(),
                description: "Lossless".to_string(),
                arguments: HashMap::from([("codec".to_string(), "ffv1".to_string())]),
            },
            ReplacementDict {
                link_id: "pick".to_string(),
                description: "Lossy".to_string(),
                arguments: HashMap::from([("codec".to_string(), "h264".to_string())]),
            },
        ];

        let fx = fixture_with_dicts(
            vec![choice_link, one_off("done", "pass")],
            Vec::new(),
            dicts,
        );
        let handle = fx.engine.spawn_unit(unit_with_files(0), "pick");

        let pending = wait_for_pending(&fx.registry).await;
        assert_eq!(pending.choices[1].value, "1");
        assert_eq!(pending.choices[1].description, "Lossy");

        let resume = fx.registry.resolve(pending.job_id).unwrap();
        assert!(resume.resume("1"));

        let run = handle.await.unwrap();
        assert_eq!(run.outcome, UnitOutcome::Completed);
        assert_eq!(run.unit.replacements.get("codec").unwrap(), "h264");
        let visited: Vec<&str> = run.jobs.iter().map(|j| j.link_id.as_str()).collect();
        assert_eq!(visited, vec!["pick", "done"]);
    }

    #[tokio::test]
    async fn test_concurrent_units_are_independent() {
        let mut start = for_each("L", "pass");
        start.transitions.insert(0, "M".to_string());

        let fx = fixture(vec![start, one_off("M", "pass")], Vec::new());
        let handles: Vec<_> = (0..8)
            .map(|_| fx.engine.spawn_unit(unit_with_files(2), "L"))
            .collect();

        for handle in handles {
            let run = handle.await.unwrap();
            assert_eq!(run.outcome, UnitOutcome::Completed);
        }
        // 8 units x (2 file tasks + 1 one-off)
        assert_eq!(fx.executor.task_count(), 24);
    }
}
