use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::chemistry::model::ModificationId;

/// One `position(id,id,...)` entry of a partial modification string, as written.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct PartialSiteDecl {
    pub position: usize,
    pub modification_ids: Vec<ModificationId>,
}

/// A sequence position that may carry any one of its candidate modifications.
/// Candidates are sorted and free of duplicates.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct PartialSite {
    pub position: usize,
    pub candidates: Vec<ModificationId>,
}

/// Positions sharing the exact same candidate set. Any modification of the set may
/// go to any of the positions, so only how many positions take each candidate matters.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ModificationGroup {
    pub candidates: Vec<ModificationId>,
    pub positions: Vec<usize>,
}

impl ModificationGroup {
    pub fn capacity(&self) -> usize {
        self.positions.len()
    }

    pub fn accepts(&self, id: ModificationId) -> bool {
        self.candidates.binary_search(&id).is_ok()
    }
}

/// Overall modifications falling inside one fragment.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct OverallSummary {
    pub net_mass: f64,
    pub counts: BTreeMap<ModificationId, usize>,
}
