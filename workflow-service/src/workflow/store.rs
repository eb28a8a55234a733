// Workflow graph store
// Read-only lookup of chain links, transitions, and chains, loaded once

use crate::workflow::models::{Chain, ChainLink, JobKind};

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Errors raised while loading or validating a workflow definition
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read workflow definition: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse workflow definition: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("duplicate chain link id: {0}")]
    DuplicateLink(String),

    #[error("duplicate chain id: {0}")]
    DuplicateChain(String),

    #[error("link {link} references unknown link {target}")]
    DanglingTransition { link: String, target: String },

    #[error("link {link} offers unknown chain {chain}")]
    DanglingChoice { link: String, chain: String },

    #[error("chain {chain} starts at unknown link {start}")]
    DanglingChainStart { chain: String, start: String },
}

/// On-disk shape of a workflow definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowDefinition {
    pub links: Vec<ChainLink>,
    #[serde(default)]
    pub chains: Vec<Chain>,
}

/// A distinct (link, chain) pair found by the duplicate-name scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceDuplicate {
    pub link_id: String,
    pub chain_id: String,
}

/// Immutable index over the workflow graph.
///
/// Built once at startup; every engine lookup goes through here. Absent
/// entries are `None`, never an error — the engine decides what a missing
/// link means for the unit it is driving.
#[derive(Debug, Clone, Default)]
pub struct WorkflowStore {
    links: HashMap<String, ChainLink>,
    chains: HashMap<String, Chain>,
}

impl WorkflowStore {
    /// Build a store from parts, validating every cross-reference
    pub fn new(links: Vec<ChainLink>, chains: Vec<Chain>) -> Result<Self, StoreError> {
        let mut link_index = HashMap::with_capacity(links.len());
        for link in links {
            if link_index.insert(link.id.clone(), link.clone()).is_some() {
                return Err(StoreError::DuplicateLink(link.id));
            }
        }

        let mut chain_index = HashMap::with_capacity(chains.len());
        for chain in chains {
            if chain_index.insert(chain.id.clone(), chain.clone()).is_some() {
                return Err(StoreError::DuplicateChain(chain.id));
            }
        }

        let store = Self {
            links: link_index,
            chains: chain_index,
        };
        store.validate()?;
        Ok(store)
    }

    /// Load a definition from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse a definition from a JSON string
    pub fn from_json(content: &str) -> Result<Self, StoreError> {
        let definition: WorkflowDefinition = serde_json::from_str(content)?;
        Self::new(definition.links, definition.chains)
    }

    fn validate(&self) -> Result<(), StoreError> {
        for link in self.links.values() {
            for target in link.transitions.values().chain(link.default_next.iter()) {
                if !self.links.contains_key(target) {
                    return Err(StoreError::DanglingTransition {
                        link: link.id.clone(),
                        target: target.clone(),
                    });
                }
            }
            if let JobKind::UserChoice { chains } = &link.kind {
                for chain_id in chains {
                    if !self.chains.contains_key(chain_id) {
                        return Err(StoreError::DanglingChoice {
                            link: link.id.clone(),
                            chain: chain_id.clone(),
                        });
                    }
                }
            }
        }
        for chain in self.chains.values() {
            if !self.links.contains_key(&chain.start_link) {
                return Err(StoreError::DanglingChainStart {
                    chain: chain.id.clone(),
                    start: chain.start_link.clone(),
                });
            }
        }
        Ok(())
    }

    /// Look up a chain link by id
    pub fn link(&self, id: &str) -> Option<&ChainLink> {
        self.links.get(id)
    }

    /// Look up a chain by id
    pub fn chain(&self, id: &str) -> Option<&Chain> {
        self.chains.get(id)
    }

    /// Resolve the next link for an exit code.
    ///
    /// The explicit transition wins; otherwise the link's default next
    /// link; otherwise `None`, meaning the unit's path ends here.
    pub fn next_link<'a>(&self, link: &'a ChainLink, exit_code: i32) -> Option<&'a str> {
        link.transitions
            .get(&exit_code)
            .or(link.default_next.as_ref())
            .map(String::as_str)
    }

    /// Chains offered at a UserChoice link, in configured order
    pub fn chain_choices(&self, link: &ChainLink) -> Vec<&Chain> {
        match &link.kind {
            JobKind::UserChoice { chains } => chains
                .iter()
                .filter_map(|id| self.chains.get(id))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Scan for distinct link/chain pairs sharing the given display names.
    ///
    /// Guards against ambiguous configuration where two different links or
    /// chains carry the same human-readable labels.
    pub fn find_choice_duplicates(
        &self,
        link_name: &str,
        choice_name: &str,
    ) -> Vec<ChoiceDuplicate> {
        let mut duplicates = Vec::new();
        for link in self.links.values() {
            if link.description != link_name {
                continue;
            }
            for chain in self.chain_choices(link) {
                if chain.description == choice_name {
                    duplicates.push(ChoiceDuplicate {
                        link_id: link.id.clone(),
                        chain_id: chain.id.clone(),
                    });
                }
            }
        }
        duplicates.sort_by(|a, b| {
            (&a.link_id, &a.chain_id).cmp(&(&b.link_id, &b.chain_id))
        });
        duplicates
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }
}
