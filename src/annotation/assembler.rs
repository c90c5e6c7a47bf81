use std::collections::BTreeMap;

use crate::annotation::model::*;
use crate::chemistry::model::{ModificationId, ProteinSequence};
use crate::combination::model::{AnnotationMethod, Assignment, RealizedCombination};
use crate::digest::digester::{Digest, Fragment};
use crate::errors::Result;
use crate::modification::applier::ModificationPlan;
use crate::modification::model::OverallSummary;

/// Masses a fragment carries before any partial modification is placed.
#[derive(Clone, PartialEq, Debug)]
pub struct FragmentBaseline {
    pub fragment_index: usize,
    pub fragment: Fragment,
    pub unmodified_mass: f64,
    pub overall: OverallSummary,
}

impl FragmentBaseline {
    pub fn compute(
        fragment_index: usize,
        fragment: Fragment,
        sequence: &ProteinSequence,
        plan: &ModificationPlan,
    ) -> Result<FragmentBaseline> {
        let unmodified_mass = sequence.unmodified_mass(fragment.start, fragment.end, plan.mass_type())?;
        let overall = plan.overall_summary(fragment)?;

        Ok(FragmentBaseline { fragment_index, fragment, unmodified_mass, overall })
    }

    pub fn overall_modified_mass(&self) -> f64 {
        self.unmodified_mass + self.overall.net_mass
    }

    /// Fragment mass once `combination_mass` is added on top of the overall modifications.
    pub fn calculated_mass(&self, combination_mass: f64) -> f64 {
        self.overall_modified_mass() + combination_mass
    }
}

pub fn compute_baselines(digest: &Digest, sequence: &ProteinSequence, plan: &ModificationPlan) -> Result<Vec<FragmentBaseline>> {
    digest
        .iter()
        .map(|(idx, fragment)| FragmentBaseline::compute(idx, fragment, sequence, plan))
        .collect()
}

/// Everything an annotation records besides the fragment and the combination.
pub struct AnnotationContext<'a> {
    pub sequence: &'a ProteinSequence<'a>,
    pub plan: &'a ModificationPlan<'a>,
    pub method: AnnotationMethod,
    pub enzyme: Option<&'a str>,
}

impl<'a> AnnotationContext<'a> {
    /// Net mass the combination adds to the fragment: positional assignments only
    /// count the sites inside it.
    pub fn combination_mass(&self, fragment: Fragment, combination: &RealizedCombination) -> Result<f64> {
        match &combination.assignment {
            Assignment::Positional(pairs) => {
                let mut mass = 0.0;
                for &(position, id) in pairs {
                    if fragment.contains(position) {
                        mass += self.plan.net_mass(id)?;
                    }
                }
                Ok(mass)
            }
            Assignment::Positionless(_) => Ok(combination.net_mass),
        }
    }

    /// Returns an annotation iff the calculated mass lies within `tolerance` of the peak.
    pub fn assemble(
        &self,
        baseline: &FragmentBaseline,
        combination: &RealizedCombination,
        peak: Peak,
        tolerance: f64,
    ) -> Result<Option<Annotation>> {
        let combination_mass = self.combination_mass(baseline.fragment, combination)?;
        let total = baseline.calculated_mass(combination_mass);

        if (total - peak.mass).abs() > tolerance {
            return Ok(None);
        }

        self.build(baseline, combination, peak).map(Some)
    }

    /// Builds the annotation without looking at the tolerance.
    pub fn build(&self, baseline: &FragmentBaseline, combination: &RealizedCombination, peak: Peak) -> Result<Annotation> {
        let fragment = baseline.fragment;
        let combination_mass = self.combination_mass(fragment, combination)?;

        let mut positions_by_id: BTreeMap<ModificationId, Vec<usize>> = BTreeMap::new();
        for (position, id) in combination.positions_within(fragment) {
            positions_by_id.entry(id).or_default().push(position);
        }

        let modifications = combination
            .counts_within(Some(fragment))
            .into_iter()
            .map(|(id, occurrences)| {
                let positions = positions_by_id.remove(&id).unwrap_or_default();
                self.realize(id, occurrences, positions)
            })
            .collect::<Result<Vec<_>>>()?;

        let overall_modifications = baseline
            .overall
            .counts
            .iter()
            .map(|(&id, &occurrences)| {
                let positions = (fragment.start..=fragment.end)
                    .filter(|&p| self.plan.overall_slot(p) == Some(id))
                    .collect();
                self.realize(id, occurrences, positions)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Annotation {
            protein_id: self.sequence.id.clone(),
            peak_mass: peak.mass,
            peak_intensity: peak.intensity,
            fragment_index: baseline.fragment_index,
            fragment_start: fragment.start,
            fragment_end: fragment.end,
            fragment_start_residue: self.sequence.residue(fragment.start)?.code3.clone(),
            fragment_end_residue: self.sequence.residue(fragment.end)?.code3.clone(),
            enzyme: self.enzyme.unwrap_or("none").to_string(),
            unmodified_fragment_mass: baseline.unmodified_mass,
            overall_modified_fragment_mass: baseline.overall_modified_mass(),
            calculated_mass: baseline.calculated_mass(combination_mass),
            overall_modification_mass: baseline.overall.net_mass,
            combination_mass,
            modifications,
            overall_modifications,
            method: self.method,
            mass_type: self.plan.mass_type(),
        })
    }

    fn realize(&self, id: ModificationId, occurrences: usize, positions: Vec<usize>) -> Result<RealizedModification> {
        let modification = self.plan.catalog().get(id)?;

        Ok(RealizedModification {
            id,
            name: modification.name.clone(),
            net_mass: modification.net_mass(self.plan.mass_type()),
            occurrences,
            positions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chemistry::model::MassType;
    use crate::chemistry::table::{DEFAULT_MODIFICATION_CATALOG, PROTEINOGENIC_AMINO_ACID_TABLE};

    #[test]
    fn assemble_applies_the_tolerance_and_is_repeatable() {
        let seq = ProteinSequence::new("P1", "SMAK", &PROTEINOGENIC_AMINO_ACID_TABLE).unwrap();
        let mut plan = ModificationPlan::new(&seq, &DEFAULT_MODIFICATION_CATALOG, MassType::Mono);
        plan.apply_overall(&seq, DEFAULT_MODIFICATION_CATALOG.find("Oxidation").unwrap());

        let ctx = AnnotationContext { sequence: &seq, plan: &plan, method: AnnotationMethod::Enumerate, enzyme: None };
        let fragment = Fragment::new(0, 2);
        let baseline = FragmentBaseline::compute(1, fragment, &seq, &plan).unwrap();
        assert!((baseline.overall.net_mass - 15.99491461956).abs() < 1e-9);

        let combination = RealizedCombination {
            assignment: Assignment::Positional(vec![(0, 3), (3, 4)]),
            net_mass: 79.96633052075 + 42.0105646837,
        };
        let expected = baseline.overall_modified_mass() + 79.96633052075;
        let peak = Peak { mass: expected + 0.004, intensity: 12.0 };

        let annotation = ctx.assemble(&baseline, &combination, peak, 0.005).unwrap().unwrap();
        assert_eq!(annotation.fragment_start_residue, "Ser");
        assert_eq!(annotation.fragment_end_residue, "Ala");
        assert_eq!(annotation.enzyme, "none");
        assert_eq!(annotation.modifications.len(), 1);
        assert_eq!(annotation.modifications[0].positions, vec![0]);
        assert_eq!(annotation.overall_modifications[0].name, "Oxidation");
        assert_eq!(annotation.overall_modifications[0].positions, vec![1]);
        assert!((annotation.mass_error() - 0.004).abs() < 1e-9);

        let again = ctx.assemble(&baseline, &combination, peak, 0.005).unwrap().unwrap();
        assert_eq!(annotation, again);

        assert_eq!(ctx.assemble(&baseline, &combination, peak, 0.003).unwrap(), None);
    }

    #[test]
    fn positionless_combination_mass_is_taken_as_is() {
        let seq = ProteinSequence::new("P1", "SK", &PROTEINOGENIC_AMINO_ACID_TABLE).unwrap();
        let plan = ModificationPlan::new(&seq, &DEFAULT_MODIFICATION_CATALOG, MassType::Mono);
        let ctx = AnnotationContext {
            sequence: &seq,
            plan: &plan,
            method: AnnotationMethod::ImprovedEnumerate,
            enzyme: Some("Trypsin"),
        };
        let baseline = FragmentBaseline::compute(0, Fragment::new(0, 1), &seq, &plan).unwrap();
        let combination = RealizedCombination { assignment: Assignment::Positionless(vec![(3, 1)]), net_mass: 79.96633052075 };

        let annotation = ctx.build(&baseline, &combination, Peak { mass: 0.0, intensity: 0.0 }).unwrap();
        assert_eq!(annotation.combination_mass, 79.96633052075);
        assert!(annotation.modifications[0].positions.is_empty());
        assert_eq!(annotation.enzyme, "Trypsin");
    }
}
