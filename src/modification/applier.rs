use std::collections::BTreeMap;

use crate::chemistry::model::{MassType, Modification, ModificationId, ProteinSequence};
use crate::chemistry::table::ModificationCatalog;
use crate::digest::digester::Fragment;
use crate::errors::{AnnotateError, Result};
use crate::modification::model::*;

/// The modification scenario of one protein: which overall modification sits on each
/// position and which positions carry a partial modification choice.
#[derive(Clone, Debug)]
pub struct ModificationPlan<'c> {
    catalog: &'c ModificationCatalog,
    mass_type: MassType,
    overall: Vec<Option<ModificationId>>,
    partial: Vec<PartialSite>,
}

impl<'c> ModificationPlan<'c> {
    pub fn new(sequence: &ProteinSequence, catalog: &'c ModificationCatalog, mass_type: MassType) -> ModificationPlan<'c> {
        ModificationPlan {
            catalog,
            mass_type,
            overall: vec![None; sequence.len()],
            partial: Vec::new(),
        }
    }

    pub fn catalog(&self) -> &'c ModificationCatalog {
        self.catalog
    }

    pub fn mass_type(&self) -> MassType {
        self.mass_type
    }

    pub fn overall_slot(&self, position: usize) -> Option<ModificationId> {
        self.overall.get(position).copied().flatten()
    }

    pub fn partial_sites(&self) -> &[PartialSite] {
        &self.partial
    }

    pub fn net_mass(&self, id: ModificationId) -> Result<f64> {
        self.catalog.net_mass(id, self.mass_type)
    }

    /// Puts `modification` on every eligible free position and returns how many
    /// positions it took. A position already holding an overall modification keeps it.
    pub fn apply_overall(&mut self, sequence: &ProteinSequence, modification: &Modification) -> usize {
        let mut n_applied = 0;

        for (position, aa) in sequence.residues().iter().enumerate() {
            if !modification.can_modify(aa.code1) {
                continue;
            }

            match self.overall[position] {
                None => {
                    self.overall[position] = Some(modification.id);
                    n_applied += 1;
                }
                Some(current) if current != modification.id => {
                    log::warn!(
                        "position {} already carries overall modification {}, ignoring {}",
                        position,
                        current,
                        modification.name
                    );
                }
                Some(_) => {}
            }
        }

        log::debug!("overall modification {} applied at {} positions", modification.name, n_applied);

        n_applied
    }

    /// Registers the partial sites. Unknown ids and positions outside the protein are
    /// fatal; a position holding an overall modification loses it to the partial site.
    pub fn declare_partial(&mut self, sequence: &ProteinSequence, decls: Vec<PartialSiteDecl>) -> Result<()> {
        for decl in decls {
            if decl.position >= sequence.len() {
                return Err(AnnotateError::position(decl.position, decl.position, sequence.len()));
            }

            let mut candidates = decl
                .modification_ids
                .iter()
                .map(|&id| self.catalog.get(id).map(|m| m.id))
                .collect::<Result<Vec<_>>>()?;
            candidates.sort_unstable();
            candidates.dedup();

            if let Some(overall_id) = self.overall[decl.position].take() {
                log::info!(
                    "using partial modification at position {} instead of overall modification {}",
                    decl.position,
                    overall_id
                );
            }

            self.partial.push(PartialSite { position: decl.position, candidates });
        }

        Ok(())
    }

    /// Fails with `WrongModification` when a candidate of `site` cannot act on its residue.
    pub fn check_site(&self, sequence: &ProteinSequence, site: &PartialSite) -> Result<()> {
        let residue = sequence.residue(site.position)?;
        for &id in &site.candidates {
            if !self.catalog.get(id)?.can_modify(residue.code1) {
                return Err(AnnotateError::WrongModification {
                    modification_id: id,
                    position: site.position,
                    residue: residue.code1,
                });
            }
        }

        Ok(())
    }

    /// Groups the partial sites lying in `region` by candidate set, in candidate set order.
    pub fn groups(&self, sequence: &ProteinSequence, region: Fragment) -> Result<Vec<ModificationGroup>> {
        let mut positions_by_candidates: BTreeMap<&[ModificationId], Vec<usize>> = BTreeMap::new();

        for site in self.partial.iter().filter(|site| region.contains(site.position)) {
            self.check_site(sequence, site)?;
            positions_by_candidates
                .entry(site.candidates.as_slice())
                .or_default()
                .push(site.position);
        }

        Ok(positions_by_candidates
            .into_iter()
            .map(|(candidates, mut positions)| {
                positions.sort_unstable();
                ModificationGroup { candidates: candidates.to_vec(), positions }
            })
            .collect())
    }

    pub fn overall_summary(&self, fragment: Fragment) -> Result<OverallSummary> {
        let mut summary = OverallSummary::default();

        for position in fragment.start..=fragment.end {
            if let Some(id) = self.overall_slot(position) {
                summary.net_mass += self.net_mass(id)?;
                *summary.counts.entry(id).or_insert(0) += 1;
            }
        }

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chemistry::table::{DEFAULT_MODIFICATION_CATALOG, PROTEINOGENIC_AMINO_ACID_TABLE};
    use crate::modification::parser::parse_partial_modifications;

    fn protein(seq: &str) -> ProteinSequence<'static> {
        ProteinSequence::new("P1", seq, &PROTEINOGENIC_AMINO_ACID_TABLE).unwrap()
    }

    #[test]
    fn overall_modification_hits_every_eligible_residue() {
        let seq = protein("MKMAM");
        let mut plan = ModificationPlan::new(&seq, &DEFAULT_MODIFICATION_CATALOG, MassType::Mono);
        let oxidation = DEFAULT_MODIFICATION_CATALOG.find("Oxidation").unwrap();

        assert_eq!(plan.apply_overall(&seq, oxidation), 3);
        assert_eq!(plan.overall_slot(0), Some(2));
        assert_eq!(plan.overall_slot(1), None);

        let summary = plan.overall_summary(Fragment::new(0, 2)).unwrap();
        assert_eq!(summary.counts.get(&2), Some(&2));
        assert!((summary.net_mass - 2.0 * 15.99491461956).abs() < 1e-9);
    }

    #[test]
    fn first_overall_modification_keeps_the_slot() {
        let seq = protein("KRK");
        let mut plan = ModificationPlan::new(&seq, &DEFAULT_MODIFICATION_CATALOG, MassType::Mono);
        plan.apply_overall(&seq, DEFAULT_MODIFICATION_CATALOG.find("Acetylation").unwrap());
        let n = plan.apply_overall(&seq, DEFAULT_MODIFICATION_CATALOG.find("Methylation").unwrap());

        assert_eq!(n, 1);
        assert_eq!(plan.overall_slot(0), Some(4));
        assert_eq!(plan.overall_slot(1), Some(5));
    }

    #[test]
    fn partial_site_overrides_overall_modification() {
        let seq = protein("AMAM");
        let mut plan = ModificationPlan::new(&seq, &DEFAULT_MODIFICATION_CATALOG, MassType::Mono);
        plan.apply_overall(&seq, DEFAULT_MODIFICATION_CATALOG.find("Oxidation").unwrap());

        let decls = parse_partial_modifications("3(2,1,2)*").unwrap();
        plan.declare_partial(&seq, decls).unwrap();

        assert_eq!(plan.overall_slot(1), Some(2));
        assert_eq!(plan.overall_slot(3), None);
        assert_eq!(plan.partial_sites(), &[PartialSite { position: 3, candidates: vec![1, 2] }]);
    }

    #[test]
    fn partial_declarations_are_resolved() {
        let seq = protein("ACDEFG");
        let mut plan = ModificationPlan::new(&seq, &DEFAULT_MODIFICATION_CATALOG, MassType::Mono);

        let out_of_range = parse_partial_modifications("6(1)*").unwrap();
        assert_eq!(
            plan.declare_partial(&seq, out_of_range),
            Err(AnnotateError::WrongPositionInProtein { start: 6, end: 6, length: 6 })
        );

        let unknown = parse_partial_modifications("1(42)*").unwrap();
        assert_eq!(
            plan.declare_partial(&seq, unknown),
            Err(AnnotateError::UnknownModification { name: "42".to_string() })
        );
    }

    #[test]
    fn groups_share_identical_candidate_sets() {
        let seq = protein("STSTY");
        let mut plan = ModificationPlan::new(&seq, &DEFAULT_MODIFICATION_CATALOG, MassType::Mono);
        let decls = parse_partial_modifications("0(1,3);1(3,1);2(1,3);4(1)*").unwrap();
        plan.declare_partial(&seq, decls).unwrap();

        let whole = plan.groups(&seq, Fragment::new(0, 4)).unwrap();
        assert_eq!(
            whole,
            vec![
                ModificationGroup { candidates: vec![1], positions: vec![4] },
                ModificationGroup { candidates: vec![1, 3], positions: vec![0, 1, 2] },
            ]
        );

        let local = plan.groups(&seq, Fragment::new(1, 3)).unwrap();
        assert_eq!(local, vec![ModificationGroup { candidates: vec![1, 3], positions: vec![1, 2] }]);
        assert!(local[0].accepts(3));
        assert_eq!(local[0].capacity(), 2);
    }

    #[test]
    fn ineligible_candidate_is_fatal() {
        let seq = protein("ACDEFG");
        let mut plan = ModificationPlan::new(&seq, &DEFAULT_MODIFICATION_CATALOG, MassType::Mono);
        plan.declare_partial(&seq, parse_partial_modifications("1(3)*").unwrap()).unwrap();

        assert_eq!(
            plan.groups(&seq, Fragment::new(0, 5)),
            Err(AnnotateError::WrongModification { modification_id: 3, position: 1, residue: 'C' })
        );
    }
}
