use rstar::primitives::{GeomWithData, Rectangle};
use rstar::RTree;
use std::collections::{BTreeMap, HashSet};

use crate::annotation::assembler::{compute_baselines, AnnotationContext, FragmentBaseline};
use crate::annotation::model::*;
use crate::chemistry::model::ModificationId;
use crate::combination::model::{Assignment, RealizedCombination};
use crate::combination::peakwise::SubsetSumSearch;
use crate::digest::digester::Digest;
use crate::errors::Result;
use crate::modification::model::ModificationGroup;

type ExpPeak = GeomWithData<[f64; 2], usize>;
// data = (fragment index, candidate index within the fragment)
type TheoMassWindow = GeomWithData<Rectangle<[f64; 2]>, (usize, usize)>;

/// Matches the combinations of one modification scenario against a peak list,
/// fragment by fragment. Results are indexed like the input peaks.
pub struct Annotator<'a> {
    ctx: AnnotationContext<'a>,
    baselines: Vec<FragmentBaseline>,
    tolerance: f64,
}

impl<'a> Annotator<'a> {
    pub fn new(ctx: AnnotationContext<'a>, digest: &Digest, tolerance: f64) -> Result<Annotator<'a>> {
        let baselines = compute_baselines(digest, ctx.sequence, ctx.plan)?;
        Ok(Annotator { ctx, baselines, tolerance })
    }

    pub fn baselines(&self) -> &[FragmentBaseline] {
        &self.baselines
    }

    /// Positional combinations: per fragment, assignments agreeing on every site
    /// inside the fragment are matched once.
    pub fn annotate_positional(&self, peaks: &[Peak], combinations: &[RealizedCombination]) -> Result<Vec<Vec<Annotation>>> {
        let mut candidates = Vec::with_capacity(self.baselines.len());

        for baseline in &self.baselines {
            let mut seen: HashSet<Vec<(usize, ModificationId)>> = HashSet::new();
            let mut fragment_candidates = Vec::new();

            for combination in combinations {
                let local = combination.positions_within(baseline.fragment);
                if !seen.insert(local.clone()) {
                    continue;
                }

                let local = RealizedCombination { assignment: Assignment::Positional(local), net_mass: 0.0 };
                let net_mass = self.ctx.combination_mass(baseline.fragment, &local)?;
                fragment_candidates.push(RealizedCombination { net_mass, ..local });
            }

            candidates.push(fragment_candidates);
        }

        self.match_candidates(peaks, &candidates)
    }

    /// Partial modification groups found inside each fragment, in digest order.
    pub fn local_groups(&self) -> Result<Vec<Vec<ModificationGroup>>> {
        self.baselines
            .iter()
            .map(|baseline| self.ctx.plan.groups(self.ctx.sequence, baseline.fragment))
            .collect()
    }

    /// Turns the positionless combinations enumerated on each fragment's own groups
    /// (one slice per fragment, in digest order) into the fragment's candidates:
    /// placeholders are dropped and equal remaining totals are kept once.
    pub fn positionless_candidates(
        &self,
        local_combinations: &[&[RealizedCombination]],
    ) -> Result<Vec<Vec<RealizedCombination>>> {
        let plan = self.ctx.plan;
        let mass_type = plan.mass_type();
        let mut candidates = Vec::with_capacity(self.baselines.len());

        for (baseline, combinations) in self.baselines.iter().zip(local_combinations) {
            let mut seen: HashSet<Vec<(ModificationId, usize)>> = HashSet::new();
            let mut fragment_candidates = Vec::new();

            for combination in combinations.iter() {
                let mut pairs = Vec::new();
                let mut net_mass = 0.0;
                for (id, n) in combination.counts_within(None) {
                    if !plan.catalog().get(id)?.is_placeholder(mass_type) {
                        net_mass += n as f64 * plan.net_mass(id)?;
                        pairs.push((id, n));
                    }
                }

                if seen.insert(pairs.clone()) {
                    fragment_candidates.push(RealizedCombination { assignment: Assignment::Positionless(pairs), net_mass });
                }
            }

            log::debug!("fragment {} has {} positionless candidates", baseline.fragment, fragment_candidates.len());
            candidates.push(fragment_candidates);
        }

        Ok(candidates)
    }

    pub fn annotate_positionless(
        &self,
        peaks: &[Peak],
        local_combinations: &[&[RealizedCombination]],
    ) -> Result<Vec<Vec<Annotation>>> {
        let candidates = self.positionless_candidates(local_combinations)?;
        self.match_candidates(peaks, &candidates)
    }

    /// Runs one subset sum search per (peak, fragment) on the residual mass.
    pub fn annotate_peakwise(&self, peaks: &[Peak]) -> Result<Vec<Vec<Annotation>>> {
        let plan = self.ctx.plan;
        let mass_type = plan.mass_type();

        let local_groups = self.local_groups()?;

        let mut annotations = Vec::with_capacity(peaks.len());
        for &peak in peaks {
            let mut peak_annotations = Vec::new();

            for (baseline, groups) in self.baselines.iter().zip(&local_groups) {
                let residual = peak.mass - baseline.overall_modified_mass();
                let found = SubsetSumSearch::new(groups, plan, residual, self.tolerance).run()?;

                let mut seen: HashSet<Vec<(ModificationId, usize)>> = HashSet::new();
                for subset in found {
                    let mut counts: BTreeMap<ModificationId, usize> = BTreeMap::new();
                    for id in subset.modifications {
                        if !plan.catalog().get(id)?.is_placeholder(mass_type) {
                            *counts.entry(id).or_insert(0) += 1;
                        }
                    }

                    let pairs: Vec<(ModificationId, usize)> = counts.into_iter().collect();
                    if seen.insert(pairs.clone()) {
                        let combination = RealizedCombination { assignment: Assignment::Positionless(pairs), net_mass: subset.sum };
                        peak_annotations.push(self.ctx.build(baseline, &combination, peak)?);
                    }
                }
            }

            annotations.push(peak_annotations);
        }

        Ok(annotations)
    }

    fn match_candidates(&self, peaks: &[Peak], candidates: &[Vec<RealizedCombination>]) -> Result<Vec<Vec<Annotation>>> {
        let mut annotations: Vec<Vec<Annotation>> = vec![Vec::new(); peaks.len()];
        if peaks.is_empty() {
            return Ok(annotations);
        }

        // --- R*Tree of the experimental masses --- //
        let exp_points: Vec<ExpPeak> = peaks
            .iter()
            .enumerate()
            .map(|(i, peak)| ExpPeak::new([peak.mass, 0.0], i))
            .collect();
        let exp_tree = RTree::bulk_load(exp_points);

        // --- R*Tree of the theoretical mass windows --- //
        let mut theo_windows = Vec::with_capacity(candidates.iter().map(Vec::len).sum());
        for (f, fragment_candidates) in candidates.iter().enumerate() {
            let baseline = &self.baselines[f];
            for (c, combination) in fragment_candidates.iter().enumerate() {
                let mass = baseline.calculated_mass(combination.net_mass);
                let rect = Rectangle::from_corners([mass - self.tolerance, 0.0], [mass + self.tolerance, 0.0]);
                theo_windows.push(TheoMassWindow::new(rect, (f, c)));
            }
        }
        let theo_tree = RTree::bulk_load(theo_windows);

        for (exp_point, theo_window) in exp_tree.intersection_candidates_with_other_tree(&theo_tree) {
            let peak_idx = exp_point.data;
            let (f, c) = theo_window.data;

            let annotation = self.ctx.assemble(&self.baselines[f], &candidates[f][c], peaks[peak_idx], self.tolerance)?;
            if let Some(annotation) = annotation {
                annotations[peak_idx].push(annotation);
            }
        }

        for peak_annotations in &mut annotations {
            sort_annotations(peak_annotations);
        }

        Ok(annotations)
    }
}
