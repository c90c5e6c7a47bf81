use anyhow::*;
use std::collections::BTreeMap;

use crate::annotation::annotator::Annotator;
use crate::annotation::assembler::AnnotationContext;
use crate::annotation::model::{Peak, PeakReport};
use crate::chemistry::model::{MassType, ModificationId, ProteinSequence};
use crate::chemistry::table::{ModificationCatalog, PROTEINOGENIC_AMINO_ACID_TABLE};
use crate::combination::enumerate::PositionalEnumeration;
use crate::combination::improved::GroupedEnumeration;
use crate::combination::model::{AnnotationMethod, RealizedCombination};
use crate::config::{AnnotationConfig, ProteinSource};
use crate::digest::digester::digest_with_enzyme;
use crate::digest::enzyme::Enzyme;
use crate::io::cache::{CombinationStore, ScenarioKey};
use crate::io::fasta::find_fasta_sequence;
use crate::modification::applier::ModificationPlan;
use crate::modification::parser::parse_partial_modifications;

/// One protein together with the modification scenario it is annotated under.
#[derive(Clone, Debug)]
pub struct Sample<'c> {
    pub protein_id: String,
    pub sequence: String,
    pub enzyme: Option<Enzyme>,
    /// Names or ids, applied in order.
    pub overall_modifications: Vec<String>,
    pub partial_modification_string: String,
    pub method: AnnotationMethod,
    pub mass_type: MassType,
    pub search_range: f64,
    catalog: &'c ModificationCatalog,
}

impl<'c> Sample<'c> {
    pub fn new(
        protein_id: &str,
        sequence: &str,
        method: AnnotationMethod,
        search_range: f64,
        catalog: &'c ModificationCatalog,
    ) -> Sample<'c> {
        Sample {
            protein_id: protein_id.to_string(),
            sequence: sequence.to_string(),
            enzyme: None,
            overall_modifications: Vec::new(),
            partial_modification_string: String::new(),
            method,
            mass_type: MassType::Mono,
            search_range,
            catalog,
        }
    }

    /// Resolves the protein sequence and the enzyme named by `config`.
    pub fn from_config(config: &AnnotationConfig, catalog: &'c ModificationCatalog) -> Result<Sample<'c>> {
        let sequence = match &config.protein {
            ProteinSource::Sequence(sequence) => sequence.clone(),
            ProteinSource::Fasta { path, accession } => {
                let entry = find_fasta_sequence(path, accession)?
                    .ok_or_else(|| anyhow!("no entry {} in FASTA file {}", accession, path.display()))?;
                log::info!("using FASTA entry {}", entry.header);
                entry.sequence
            }
        };

        let enzyme = match &config.enzyme {
            Some(enzyme_config) => enzyme_config
                .resolve()
                .with_context(|| format!("invalid enzyme {:?}", enzyme_config))?,
            None => None,
        };

        Ok(Sample {
            protein_id: config.protein_id.clone(),
            sequence,
            enzyme,
            overall_modifications: config.overall_modifications.clone(),
            partial_modification_string: config.partial_modification_string.clone(),
            method: config.annotation_method,
            mass_type: config.mass_type,
            search_range: config.search_range,
            catalog,
        })
    }

    /// Runs one annotation pass and returns one report per peak, in peak order.
    pub fn annotate(&self, peaks: &[Peak], store: &mut dyn CombinationStore) -> Result<Vec<PeakReport>> {
        let sequence = ProteinSequence::new(&self.protein_id, &self.sequence, &PROTEINOGENIC_AMINO_ACID_TABLE)
            .with_context(|| format!("invalid sequence for protein {}", self.protein_id))?;

        log::info!(
            "digesting protein {} ({} residues) with {}",
            self.protein_id,
            sequence.len(),
            self.enzyme.as_ref().map_or("no enzyme", |e| e.name.as_str())
        );
        let digest = digest_with_enzyme(&sequence, self.enzyme.as_ref());
        log::debug!("{} fragments", digest.len());

        log::info!("applying modifications");
        let (plan, overall_ids) = self.modification_plan(&sequence)?;

        let ctx = AnnotationContext {
            sequence: &sequence,
            plan: &plan,
            method: self.method,
            enzyme: self.enzyme.as_ref().map(|e| e.name.as_str()),
        };
        let annotator = Annotator::new(ctx, &digest, self.search_range)?;

        let key = ScenarioKey {
            protein_id: self.protein_id.clone(),
            overall_modifications: overall_ids,
            method: self.method,
            partial_modifications: self.partial_modification_string.trim().to_string(),
            group_signature: String::new(),
        };

        log::info!("annotating {} peaks with method {}", peaks.len(), self.method);
        let annotations = match self.method {
            AnnotationMethod::Enumerate => {
                let combinations = cached_combinations(store, &key, || {
                    PositionalEnumeration::new(&sequence, &plan).run()
                })?;
                annotator.annotate_positional(peaks, &combinations)?
            }
            AnnotationMethod::ImprovedEnumerate => {
                // fragments with the same group set share one enumeration
                let mut enumerated: BTreeMap<String, Vec<RealizedCombination>> = BTreeMap::new();
                let mut signatures = Vec::with_capacity(digest.len());
                for groups in annotator.local_groups()? {
                    let enumeration = GroupedEnumeration::new(&groups, &plan);
                    let signature = enumeration.signature();
                    if !enumerated.contains_key(&signature) {
                        let key = ScenarioKey { group_signature: signature.clone(), ..key.clone() };
                        let combinations = cached_combinations(store, &key, || enumeration.run())?;
                        enumerated.insert(signature.clone(), combinations);
                    }
                    signatures.push(signature);
                }
                log::debug!("{} distinct fragment-local group sets", enumerated.len());

                let local: Vec<&[RealizedCombination]> = signatures.iter().map(|s| enumerated[s].as_slice()).collect();
                annotator.annotate_positionless(peaks, &local)?
            }
            AnnotationMethod::PeakwiseCormen => annotator.annotate_peakwise(peaks)?,
        };

        let reports: Vec<PeakReport> = peaks
            .iter()
            .zip(annotations)
            .map(|(&peak, peak_annotations)| PeakReport::new(peak, peak_annotations))
            .collect();

        let n_annotated = reports.iter().filter(|r| !r.annotations().is_empty()).count();
        log::info!("{} of {} peaks annotated", n_annotated, reports.len());

        Ok(reports)
    }

    fn modification_plan(&self, sequence: &ProteinSequence) -> Result<(ModificationPlan<'c>, Vec<ModificationId>)> {
        let mut plan = ModificationPlan::new(sequence, self.catalog, self.mass_type);

        let mut overall_ids = Vec::with_capacity(self.overall_modifications.len());
        for name in &self.overall_modifications {
            let modification = self
                .catalog
                .find(name)
                .with_context(|| format!("invalid overall modification {:?}", name))?;
            plan.apply_overall(sequence, modification);
            overall_ids.push(modification.id);
        }
        overall_ids.sort_unstable();
        overall_ids.dedup();

        let decls = parse_partial_modifications(&self.partial_modification_string)
            .with_context(|| format!("invalid partial modifications for protein {}", self.protein_id))?;
        plan.declare_partial(sequence, decls)
            .with_context(|| format!("partial modifications {:?}", self.partial_modification_string))?;
        for site in plan.partial_sites() {
            plan.check_site(sequence, site)
                .with_context(|| format!("partial modifications {:?}", self.partial_modification_string))?;
        }
        log::debug!("{} partial modification sites", plan.partial_sites().len());

        Ok((plan, overall_ids))
    }
}

fn cached_combinations<F>(store: &mut dyn CombinationStore, key: &ScenarioKey, compute: F) -> Result<Vec<RealizedCombination>>
where
    F: FnOnce() -> crate::errors::Result<Vec<RealizedCombination>>,
{
    if let Some(combinations) = store.load(key)? {
        log::info!("reusing {} stored combinations for {}", combinations.len(), key);
        return Ok(combinations);
    }

    let combinations = compute().with_context(|| format!("while enumerating combinations for {}", key))?;
    log::debug!("{} combinations enumerated", combinations.len());
    store.store(key, &combinations)?;

    Ok(combinations)
}
