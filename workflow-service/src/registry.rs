// Pending-approval registry
// Concurrent index of jobs suspended on an operator decision

use crate::error::RegistryError;
use crate::workflow::models::{Choice, UnitKind};

use std::collections::HashMap;
use std::sync::Mutex;
use tokio::sync::oneshot;
use tracing::warn;
use uuid::Uuid;

/// A job suspended until an operator picks a choice.
///
/// Holds the sending half of the resolution channel; the unit's driver
/// keeps the receiver and stays parked on it.
#[derive(Debug)]
pub struct PendingJob {
    pub job_id: Uuid,
    pub unit_id: Uuid,
    pub unit_kind: UnitKind,
    pub hidden: bool,
    pub choices: Vec<Choice>,
    resolver: oneshot::Sender<String>,
}

impl PendingJob {
    /// Create a pending entry plus the receiver the driver awaits on
    pub fn new(
        job_id: Uuid,
        unit_id: Uuid,
        unit_kind: UnitKind,
        hidden: bool,
        choices: Vec<Choice>,
    ) -> (Self, oneshot::Receiver<String>) {
        let (tx, rx) = oneshot::channel();
        let entry = Self {
            job_id,
            unit_id,
            unit_kind,
            hidden,
            choices,
            resolver: tx,
        };
        (entry, rx)
    }
}

/// Read-only snapshot of one pending entry
#[derive(Debug, Clone)]
pub struct PendingEntry {
    pub job_id: Uuid,
    pub unit_id: Uuid,
    pub unit_kind: UnitKind,
    pub choices: Vec<Choice>,
}

/// Ticket returned by a successful resolve.
///
/// The entry is already removed from the registry by the time a handle
/// exists, so at most one caller can ever resume a given job.
#[derive(Debug)]
pub struct ResumeHandle {
    job_id: Uuid,
    resolver: oneshot::Sender<String>,
}

impl ResumeHandle {
    pub fn job_id(&self) -> Uuid {
        self.job_id
    }

    /// Deliver the chosen value to the suspended driver.
    ///
    /// Returns false if the driver has already gone away, which can only
    /// happen when its unit was torn down after registration.
    pub fn resume(self, choice_value: impl Into<String>) -> bool {
        let value = choice_value.into();
        if self.resolver.send(value).is_err() {
            warn!(job_id = %self.job_id, "pending job resolved but its driver is gone");
            return false;
        }
        true
    }
}

/// Process-wide index of suspended jobs, keyed by job id.
///
/// The engine inserts on suspension; the approval service lists and
/// resolves. All mutation goes through one mutex with short critical
/// sections; `list` copies a snapshot rather than holding the lock.
///
/// State is in-memory only: a process restart forgets any job that was
/// awaiting approval.
#[derive(Debug, Default)]
pub struct PendingRegistry {
    inner: Mutex<HashMap<Uuid, PendingJob>>,
}

impl PendingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a pending entry. A duplicate job id is a programming error.
    pub fn register(&self, entry: PendingJob) -> Result<(), RegistryError> {
        let mut pending = self.inner.lock().expect("pending registry poisoned");
        if pending.contains_key(&entry.job_id) {
            return Err(RegistryError::DuplicateJob(entry.job_id));
        }
        pending.insert(entry.job_id, entry);
        Ok(())
    }

    /// Snapshot of pending entries, excluding hidden units
    pub fn list(&self) -> Vec<PendingEntry> {
        let pending = self.inner.lock().expect("pending registry poisoned");
        pending
            .values()
            .filter(|entry| !entry.hidden)
            .map(|entry| PendingEntry {
                job_id: entry.job_id,
                unit_id: entry.unit_id,
                unit_kind: entry.unit_kind,
                choices: entry.choices.clone(),
            })
            .collect()
    }

    /// Atomically remove a pending job and hand back its resume ticket.
    ///
    /// `Err(NotFound)` is the expected result of stale or duplicate
    /// approval attempts; exactly one concurrent caller can succeed.
    pub fn resolve(&self, job_id: Uuid) -> Result<ResumeHandle, RegistryError> {
        let mut pending = self.inner.lock().expect("pending registry poisoned");
        let entry = pending.remove(&job_id).ok_or(RegistryError::NotFound)?;
        Ok(ResumeHandle {
            job_id: entry.job_id,
            resolver: entry.resolver,
        })
    }

    /// Find and remove the pending job of `unit_id` offering a choice with
    /// the given label; returns the handle and that choice's value.
    ///
    /// Backs the ApproveTransfer RPC, which approves by unit rather than
    /// by job id.
    pub fn resolve_unit_choice(
        &self,
        unit_id: Uuid,
        label: &str,
    ) -> Result<(ResumeHandle, String), RegistryError> {
        let mut pending = self.inner.lock().expect("pending registry poisoned");
        let job_id = pending
            .values()
            .find(|entry| {
                entry.unit_id == unit_id
                    && entry.choices.iter().any(|c| c.description == label)
            })
            .map(|entry| entry.job_id)
            .ok_or(RegistryError::NotFound)?;

        // Entry is guaranteed present: the map is still locked
        let entry = pending.remove(&job_id).ok_or(RegistryError::NotFound)?;
        let value = entry
            .choices
            .iter()
            .find(|c| c.description == label)
            .map(|c| c.value.clone())
            .ok_or(RegistryError::NotFound)?;

        Ok((
            ResumeHandle {
                job_id: entry.job_id,
                resolver: entry.resolver,
            },
            value,
        ))
    }

    /// Number of pending entries, hidden units included
    pub fn len(&self) -> usize {
        self.inner.lock().expect("pending registry poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn choices() -> Vec<Choice> {
        vec![
            Choice {
                value: "chainA".to_string(),
                description: "Yes".to_string(),
            },
            Choice {
                value: "chainB".to_string(),
                description: "No".to_string(),
            },
        ]
    }

    #[test]
    fn test_register_and_list() {
        let registry = PendingRegistry::new();
        let job_id = Uuid::new_v4();
        let unit_id = Uuid::new_v4();
        let (entry, _rx) =
            PendingJob::new(job_id, unit_id, UnitKind::Transfer, false, choices());
        registry.register(entry).unwrap();

        let listed = registry.list();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].job_id, job_id);
        assert_eq!(listed[0].choices.len(), 2);
    }

    #[test]
    fn test_register_duplicate_is_error() {
        let registry = PendingRegistry::new();
        let job_id = Uuid::new_v4();
        let (first, _rx1) =
            PendingJob::new(job_id, Uuid::new_v4(), UnitKind::Sip, false, choices());
        let (second, _rx2) =
            PendingJob::new(job_id, Uuid::new_v4(), UnitKind::Sip, false, choices());

        registry.register(first).unwrap();
        assert!(matches!(
            registry.register(second),
            Err(RegistryError::DuplicateJob(id)) if id == job_id
        ));
    }

    #[test]
    fn test_list_excludes_hidden_units() {
        let registry = PendingRegistry::new();
        let (visible, _rx1) = PendingJob::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            UnitKind::Transfer,
            false,
            choices(),
        );
        let (hidden, _rx2) = PendingJob::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            UnitKind::Transfer,
            true,
            choices(),
        );
        let visible_id = visible.job_id;
        registry.register(visible).unwrap();
        registry.register(hidden).unwrap();

        let listed = registry.list();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].job_id, visible_id);
        // Hidden entries are still resolvable, just not listed
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_resolve_unknown_job_is_not_found() {
        let registry = PendingRegistry::new();
        assert!(matches!(
            registry.resolve(Uuid::new_v4()),
            Err(RegistryError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_resolve_delivers_choice_to_receiver() {
        let registry = PendingRegistry::new();
        let job_id = Uuid::new_v4();
        let (entry, rx) =
            PendingJob::new(job_id, Uuid::new_v4(), UnitKind::Transfer, false, choices());
        registry.register(entry).unwrap();

        let handle = registry.resolve(job_id).unwrap();
        assert!(handle.resume("chainB"));
        assert_eq!(rx.await.unwrap(), "chainB");
        assert!(registry.list().is_empty());
    }

    #[test]
    fn test_concurrent_duplicate_resolution() {
        let registry = Arc::new(PendingRegistry::new());
        let job_id = Uuid::new_v4();
        let (entry, _rx) =
            PendingJob::new(job_id, Uuid::new_v4(), UnitKind::Transfer, false, choices());
        registry.register(entry).unwrap();

        let successes = Arc::new(AtomicUsize::new(0));
        let mut handles = Vec::new();
        for _ in 0..16 {
            let registry = registry.clone();
            let successes = successes.clone();
            handles.push(std::thread::spawn(move || {
                if registry.resolve(job_id).is_ok() {
                    successes.fetch_add(1, Ordering::SeqCst);
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        // Exactly one approval wins; the rest observe NotFound
        assert_eq!(successes.load(Ordering::SeqCst), 1);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_resolve_unit_choice_by_label() {
        let registry = PendingRegistry::new();
        let unit_id = Uuid::new_v4();
        let approve = vec![Choice {
            value: "chainGo".to_string(),
            description: "Approve transfer".to_string(),
        }];
        let (entry, _rx) =
            PendingJob::new(Uuid::new_v4(), unit_id, UnitKind::Transfer, false, approve);
        registry.register(entry).unwrap();

        let (_handle, value) = registry
            .resolve_unit_choice(unit_id, "Approve transfer")
            .unwrap();
        assert_eq!(value, "chainGo");
        assert!(registry.is_empty());
    }

    #[test]
    fn test_resolve_unit_choice_wrong_label_is_not_found() {
        let registry = PendingRegistry::new();
        let unit_id = Uuid::new_v4();
        let (entry, _rx) =
            PendingJob::new(Uuid::new_v4(), unit_id, UnitKind::Transfer, false, choices());
        registry.register(entry).unwrap();

        assert!(matches!(
            registry.resolve_unit_choice(unit_id, "Approve transfer"),
            Err(RegistryError::NotFound)
        ));
        // A failed lookup must not disturb the registry
        assert_eq!(registry.len(), 1);
    }
}
