use anyhow::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::chemistry::model::ModificationId;
use crate::combination::model::{AnnotationMethod, RealizedCombination};

/// Identifies one modification scenario of one protein. Positionless combinations
/// are stored per fragment-local group set, named by `group_signature`; positional
/// ones cover the whole protein and leave it empty.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct ScenarioKey {
    pub protein_id: String,
    pub overall_modifications: Vec<ModificationId>,
    pub method: AnnotationMethod,
    pub partial_modifications: String,
    pub group_signature: String,
}

impl std::fmt::Display for ScenarioKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} / overall {:?} / {} / \"{}\"",
            self.protein_id, self.overall_modifications, self.method, self.partial_modifications
        )?;
        if !self.group_signature.is_empty() {
            write!(f, " / groups {}", self.group_signature)?;
        }
        std::result::Result::Ok(())
    }
}

/// Keeps the combination sets of scenarios that were already enumerated.
pub trait CombinationStore {
    fn load(&mut self, key: &ScenarioKey) -> Result<Option<Vec<RealizedCombination>>>;
    fn store(&mut self, key: &ScenarioKey, combinations: &[RealizedCombination]) -> Result<()>;
}

/// Always recomputes.
#[derive(Default, Debug)]
pub struct NoStore;

impl CombinationStore for NoStore {
    fn load(&mut self, _key: &ScenarioKey) -> Result<Option<Vec<RealizedCombination>>> {
        Ok(None)
    }

    fn store(&mut self, _key: &ScenarioKey, _combinations: &[RealizedCombination]) -> Result<()> {
        Ok(())
    }
}

#[derive(Default, Debug)]
pub struct MemoryStore {
    entries: BTreeMap<ScenarioKey, Vec<RealizedCombination>>,
}

impl MemoryStore {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(&self.entries).context("failed to serialize the combination store")
    }
}

impl CombinationStore for MemoryStore {
    fn load(&mut self, key: &ScenarioKey) -> Result<Option<Vec<RealizedCombination>>> {
        Ok(self.entries.get(key).cloned())
    }

    fn store(&mut self, key: &ScenarioKey, combinations: &[RealizedCombination]) -> Result<()> {
        self.entries.insert(key.clone(), combinations.to_vec());
        Ok(())
    }
}

/// A [`MemoryStore`] mirrored to a single bincode file, rewritten on every store.
#[derive(Debug)]
pub struct BincodeStore {
    path: PathBuf,
    memory: MemoryStore,
}

impl BincodeStore {
    pub fn open(path: impl AsRef<Path>) -> Result<BincodeStore> {
        let path = path.as_ref().to_path_buf();

        let entries: BTreeMap<ScenarioKey, Vec<RealizedCombination>> = if path.exists() {
            let data = std::fs::read(&path)
                .with_context(|| format!("failed to read combination cache {}", path.display()))?;
            bincode::deserialize(&data)
                .with_context(|| format!("failed to deserialize combination cache {}", path.display()))?
        } else {
            BTreeMap::new()
        };

        log::info!("combination cache {} holds {} scenarios", path.display(), entries.len());
        Ok(BincodeStore { path, memory: MemoryStore { entries } })
    }
}

impl CombinationStore for BincodeStore {
    fn load(&mut self, key: &ScenarioKey) -> Result<Option<Vec<RealizedCombination>>> {
        self.memory.load(key)
    }

    fn store(&mut self, key: &ScenarioKey, combinations: &[RealizedCombination]) -> Result<()> {
        self.memory.store(key, combinations)?;

        let data = self.memory.to_bytes()?;
        std::fs::write(&self.path, &data)
            .with_context(|| format!("failed to write combination cache {}", self.path.display()))?;

        log::debug!("stored {} combinations for {} ({} bytes)", combinations.len(), key, data.len());
        Ok(())
    }
}
