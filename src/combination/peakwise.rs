use itertools::Itertools;
use std::collections::HashSet;

use crate::chemistry::model::ModificationId;
use crate::errors::Result;
use crate::modification::applier::ModificationPlan;
use crate::modification::model::ModificationGroup;

/// A tuple of the working list: the mass reached, the modifications used (sorted)
/// and how many positions of each group they take.
#[derive(Clone, PartialEq, Debug)]
pub struct SubsetSum {
    pub sum: f64,
    pub modifications: Vec<ModificationId>,
    pub usage: Vec<usize>,
}

#[derive(Clone, Copy, Debug)]
struct Instance {
    id: ModificationId,
    group: usize,
    mass: f64,
}

/// Exact subset sum over modification instances, answering one target window
/// `[target - range, target + range]`. Every modification appears once per position
/// of its group, and a seen-set of sorted id lists keeps each multiset unique.
pub struct SubsetSumSearch<'a> {
    groups: &'a [ModificationGroup],
    plan: &'a ModificationPlan<'a>,
    target: f64,
    range: f64,
}

impl<'a> SubsetSumSearch<'a> {
    pub fn new(groups: &'a [ModificationGroup], plan: &'a ModificationPlan<'a>, target: f64, range: f64) -> SubsetSumSearch<'a> {
        SubsetSumSearch { groups, plan, target, range }
    }

    pub fn run(self) -> Result<Vec<SubsetSum>> {
        let low = self.target - self.range;
        let high = self.target + self.range;

        let mut instances = Vec::new();
        for (g, group) in self.groups.iter().enumerate() {
            for &id in &group.candidates {
                let mass = self.plan.net_mass(id)?;
                instances.extend(std::iter::repeat(Instance { id, group: g, mass }).take(group.capacity()));
            }
        }

        // lowest mass the instances after i can still add
        let mut negative_tail = vec![0.0; instances.len() + 1];
        for i in (0..instances.len()).rev() {
            negative_tail[i] = negative_tail[i + 1] + instances[i].mass.min(0.0);
        }

        let capacities: Vec<usize> = self.groups.iter().map(ModificationGroup::capacity).collect();

        let mut list = vec![SubsetSum { sum: 0.0, modifications: Vec::new(), usage: vec![0; self.groups.len()] }];
        let mut seen: HashSet<Vec<ModificationId>> = HashSet::new();
        seen.insert(Vec::new());

        if negative_tail[0] > high {
            return Ok(Vec::new());
        }

        for (i, x) in instances.iter().enumerate() {
            let extended: Vec<SubsetSum> = list
                .iter()
                .filter_map(|t| {
                    let mut modifications = t.modifications.clone();
                    let at = modifications.partition_point(|&m| m <= x.id);
                    modifications.insert(at, x.id);

                    if !seen.insert(modifications.clone()) {
                        return None;
                    }

                    let mut usage = t.usage.clone();
                    usage[x.group] += 1;
                    Some(SubsetSum { sum: t.sum + x.mass, modifications, usage })
                })
                .collect();

            list = list.into_iter().merge_by(extended, |a, b| a.sum <= b.sum).collect();

            let floor = negative_tail[i + 1];
            list.retain(|t| {
                let keep = t.sum + floor <= high && t.usage.iter().zip(&capacities).all(|(u, c)| u <= c);
                if !keep {
                    seen.remove(&t.modifications);
                }
                keep
            });
        }

        log::debug!(
            "subset sum over {} instances kept {} tuples for target {:.4}",
            instances.len(),
            list.len(),
            self.target
        );

        let mut found: Vec<SubsetSum> = list.into_iter().filter(|t| t.sum >= low && t.sum <= high).collect();
        found.sort_by(|a, b| {
            a.sum
                .partial_cmp(&b.sum)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.modifications.cmp(&b.modifications))
        });

        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chemistry::model::{MassType, ProteinSequence};
    use crate::chemistry::table::{DEFAULT_MODIFICATION_CATALOG, PROTEINOGENIC_AMINO_ACID_TABLE};
    use crate::digest::digester::Fragment;
    use crate::modification::parser::parse_partial_modifications;

    const PHOSPHO: f64 = 79.96633052075;
    const ACETYL: f64 = 42.0105646837;

    fn search(seq: &str, partial: &str, target: f64, range: f64) -> Vec<SubsetSum> {
        let seq = ProteinSequence::new("P1", seq, &PROTEINOGENIC_AMINO_ACID_TABLE).unwrap();
        let mut plan = ModificationPlan::new(&seq, &DEFAULT_MODIFICATION_CATALOG, MassType::Mono);
        plan.declare_partial(&seq, parse_partial_modifications(partial).unwrap()).unwrap();
        let groups = plan.groups(&seq, Fragment::new(0, seq.len() - 1)).unwrap();
        SubsetSumSearch::new(&groups, &plan, target, range).run().unwrap()
    }

    #[test]
    fn finds_the_multiset_matching_the_target() {
        let found = search("SKS", "0(1,3);1(1,4);2(1,3)*", PHOSPHO + ACETYL, 0.01);
        let ids: Vec<Vec<ModificationId>> = found.iter().map(|t| t.modifications.clone()).collect();

        // with or without the zero mass placeholders
        assert!(ids.contains(&vec![3, 4]));
        assert!(ids.contains(&vec![1, 3, 4]));
        assert!(found.iter().all(|t| (t.sum - PHOSPHO - ACETYL).abs() <= 0.01));
    }

    #[test]
    fn capacities_bound_the_usage() {
        // a single serine cannot be phosphorylated twice
        assert!(search("S", "0(1,3)*", 2.0 * PHOSPHO, 0.01).is_empty());
        let found = search("SS", "0(1,3);1(1,3)*", 2.0 * PHOSPHO, 0.01);
        assert_eq!(found.iter().map(|t| t.modifications.clone()).collect::<Vec<_>>(), vec![vec![3, 3]]);
        assert_eq!(found[0].usage, vec![2]);
    }

    #[test]
    fn empty_tuple_matches_a_residual_inside_the_window() {
        let found = search("S", "0(1,3)*", -0.2, 0.5);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].modifications, Vec::<ModificationId>::new());
        assert_eq!(found[1].modifications, vec![1]);
    }

    #[test]
    fn negative_masses_are_not_pruned_too_early() {
        // pyro-glu loses ammonia: phospho + pyro-glu lies below phospho alone
        let pyro = -17.02654910101;
        let found = search("SQ", "0(1,3);1(1,9)*", PHOSPHO + pyro, 0.01);
        assert!(found.iter().any(|t| t.modifications == vec![3, 9]));
    }
}
