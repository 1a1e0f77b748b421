//! LineagePolicy: how a clone relates to the lineage it was copied from
//!
//! A fork starts a new lineage. It gets a fresh UUID, and the cloning agent
//! becomes its progenitor. A join stays in the source lineage. UUID and
//! progenitor are kept verbatim, so the cloning agent is a new participant
//! rather than an originator.

use super::descriptor::{Dna, Progenitor};
use crate::agent::AgentIdentity;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineagePolicy {
    /// New UUID, new progenitor
    Fork { progenitor: Progenitor },
    /// Same UUID, preserved progenitor
    Join,
}

impl LineagePolicy {
    /// Fork with `agent` as the originator of the new lineage
    pub fn fork(agent: &AgentIdentity) -> Self {
        LineagePolicy::Fork {
            progenitor: Progenitor::from(agent),
        }
    }

    pub fn join() -> Self {
        LineagePolicy::Join
    }

    pub fn label(&self) -> &'static str {
        match self {
            LineagePolicy::Fork { .. } => "fork",
            LineagePolicy::Join => "join",
        }
    }

    /// Rewrite the identity fields of a cloned DNA.
    ///
    /// A fork is renamed to `clone_name` and records `source_hash` as the DNA
    /// it was based on.
    pub fn apply(&self, dna: &mut Dna, clone_name: &str, source_hash: Option<String>) {
        match self {
            LineagePolicy::Fork { progenitor } => {
                dna.new_uuid();
                dna.name = clone_name.to_string();
                dna.progenitor = progenitor.clone();
                if source_hash.is_some() {
                    dna.based_on = source_hash;
                }
            }
            LineagePolicy::Join => {}
        }
    }
}
