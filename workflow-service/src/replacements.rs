// Replacement dictionaries
// Named parameter sets offered at ReplacementDictChoice links

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;
use thiserror::Error;

/// Errors from the replacement store's administrative write path
#[derive(Debug, Error)]
pub enum ReplacementError {
    #[error("arguments map must not be empty")]
    EmptyArguments,

    #[error("no replacement dictionary matches the given filter")]
    NotFound,
}

/// One named key/value parameter set attached to a chain link
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplacementDict {
    /// The choice link this dictionary is offered at
    pub link_id: String,
    pub description: String,
    pub arguments: HashMap<String, String>,
}

/// Filter for list/set operations; unset fields match everything
#[derive(Debug, Clone, Default)]
pub struct ReplacementFilter {
    pub link_id: Option<String>,
    pub description: Option<String>,
}

impl ReplacementFilter {
    fn matches(&self, dict: &ReplacementDict) -> bool {
        self.link_id
            .as_ref()
            .map(|id| *id == dict.link_id)
            .unwrap_or(true)
            && self
                .description
                .as_ref()
                .map(|d| *d == dict.description)
                .unwrap_or(true)
    }
}

/// Mutex-guarded collection of replacement dictionaries.
///
/// Read by the engine when it enumerates choices at a
/// ReplacementDictChoice link; written only through the administrative
/// RPC path.
#[derive(Debug, Default)]
pub struct ReplacementDictStore {
    inner: Mutex<Vec<ReplacementDict>>,
}

impl ReplacementDictStore {
    pub fn new(dicts: Vec<ReplacementDict>) -> Self {
        Self {
            inner: Mutex::new(dicts),
        }
    }

    /// Snapshot of dictionaries matching the filter, in configured order
    pub fn list(&self, filter: &ReplacementFilter) -> Vec<ReplacementDict> {
        let dicts = self.inner.lock().expect("replacement store poisoned");
        dicts
            .iter()
            .filter(|dict| filter.matches(dict))
            .cloned()
            .collect()
    }

    /// Dictionaries offered at one link, in choice order
    pub fn entries_for_link(&self, link_id: &str) -> Vec<ReplacementDict> {
        self.list(&ReplacementFilter {
            link_id: Some(link_id.to_string()),
            description: None,
        })
    }

    /// Arguments of the option at `index` within a link's choice list
    pub fn arguments_at(&self, link_id: &str, index: usize) -> Option<HashMap<String, String>> {
        self.entries_for_link(link_id)
            .into_iter()
            .nth(index)
            .map(|dict| dict.arguments)
    }

    /// Replace the argument map of the first dictionary matching the
    /// filter. Empty arguments are rejected before the store is touched.
    pub fn set(
        &self,
        filter: &ReplacementFilter,
        arguments: HashMap<String, String>,
    ) -> Result<(), ReplacementError> {
        if arguments.is_empty() {
            return Err(ReplacementError::EmptyArguments);
        }
        let mut dicts = self.inner.lock().expect("replacement store poisoned");
        let dict = dicts
            .iter_mut()
            .find(|dict| filter.matches(dict))
            .ok_or(ReplacementError::NotFound)?;
        dict.arguments = arguments;
        Ok(())
    }
}
