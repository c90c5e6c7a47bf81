use itertools::Itertools;
use std::collections::{BTreeMap, HashSet};

use crate::chemistry::model::ModificationId;
use crate::combination::model::{Assignment, RealizedCombination};
use crate::errors::Result;
use crate::modification::applier::ModificationPlan;
use crate::modification::model::ModificationGroup;

struct Frame {
    group: usize,
    free: usize,
    next_candidate: usize,
    acc: Vec<(ModificationId, usize)>,
}

/// Positionless search: every group's capacity is split among its candidates, each
/// split counted once whatever the positions.
pub struct GroupedEnumeration<'a> {
    groups: &'a [ModificationGroup],
    plan: &'a ModificationPlan<'a>,
}

impl<'a> GroupedEnumeration<'a> {
    pub fn new(groups: &'a [ModificationGroup], plan: &'a ModificationPlan<'a>) -> GroupedEnumeration<'a> {
        GroupedEnumeration { groups, plan }
    }

    /// Candidate sets and capacities of the groups, e.g. `1,3x2;1,4x1`. Group sets
    /// with the same signature enumerate the same combinations.
    pub fn signature(&self) -> String {
        self.groups
            .iter()
            .map(|group| format!("{}x{}", group.candidates.iter().join(","), group.capacity()))
            .join(";")
    }

    pub fn run(self) -> Result<Vec<RealizedCombination>> {
        let groups = self.groups;
        let capacity = |g: usize| groups.get(g).map_or(0, ModificationGroup::capacity);

        let mut combinations = Vec::new();
        let mut seen: HashSet<Vec<(ModificationId, usize)>> = HashSet::new();

        let mut stack = vec![Frame { group: 0, free: capacity(0), next_candidate: 0, acc: Vec::new() }];

        while let Some(frame) = stack.pop() {
            if frame.group == groups.len() {
                let mut counts: BTreeMap<ModificationId, usize> = BTreeMap::new();
                for (id, n) in frame.acc {
                    *counts.entry(id).or_insert(0) += n;
                }
                let pairs: Vec<(ModificationId, usize)> = counts.into_iter().collect();

                // different splits may add up to the same totals
                if seen.insert(pairs.clone()) {
                    let mut net_mass = 0.0;
                    for &(id, n) in &pairs {
                        net_mass += n as f64 * self.plan.net_mass(id)?;
                    }
                    combinations.push(RealizedCombination { assignment: Assignment::Positionless(pairs), net_mass });
                }
                continue;
            }

            if frame.free == 0 {
                let next = frame.group + 1;
                stack.push(Frame { group: next, free: capacity(next), next_candidate: 0, acc: frame.acc });
                continue;
            }

            let candidates = &groups[frame.group].candidates;
            let mut children = Vec::new();
            for k in frame.next_candidate..candidates.len() {
                for i in (1..=frame.free).rev() {
                    let rest = frame.free - i;
                    if rest > 0 && k + 1 == candidates.len() {
                        continue;
                    }

                    let mut acc = frame.acc.clone();
                    acc.push((candidates[k], i));
                    children.push(Frame { group: frame.group, free: rest, next_candidate: k + 1, acc });
                }
            }
            stack.extend(children.into_iter().rev());
        }

        log::debug!("{} positionless combinations over {} groups", combinations.len(), groups.len());

        Ok(combinations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chemistry::model::{MassType, ProteinSequence};
    use crate::chemistry::table::{DEFAULT_MODIFICATION_CATALOG, PROTEINOGENIC_AMINO_ACID_TABLE};
    use crate::digest::digester::Fragment;
    use crate::modification::parser::parse_partial_modifications;

    fn protein(seq: &str) -> ProteinSequence<'static> {
        ProteinSequence::new("P1", seq, &PROTEINOGENIC_AMINO_ACID_TABLE).unwrap()
    }

    fn counts_of(combinations: &[RealizedCombination]) -> Vec<Vec<(ModificationId, usize)>> {
        combinations
            .iter()
            .map(|c| match &c.assignment {
                Assignment::Positionless(pairs) => pairs.clone(),
                Assignment::Positional(_) => unreachable!(),
            })
            .collect()
    }

    #[test]
    fn capacity_is_split_among_candidates() {
        let seq = ProteinSequence::new("P1", "SST", &PROTEINOGENIC_AMINO_ACID_TABLE).unwrap();
        let mut plan = ModificationPlan::new(&seq, &DEFAULT_MODIFICATION_CATALOG, MassType::Mono);
        plan.declare_partial(&seq, parse_partial_modifications("0(1,3);1(1,3);2(1,3)*").unwrap()).unwrap();
        let groups = plan.groups(&seq, Fragment::new(0, 2)).unwrap();

        let combinations = GroupedEnumeration::new(&groups, &plan).run().unwrap();
        assert_eq!(
            counts_of(&combinations),
            vec![
                vec![(1, 3)],
                vec![(1, 2), (3, 1)],
                vec![(1, 1), (3, 2)],
                vec![(3, 3)],
            ]
        );
        assert!((combinations[2].net_mass - 2.0 * 79.96633052075).abs() < 1e-9);
    }

    #[test]
    fn signature_ignores_positions() {
        let seq = protein("SKSTK");
        let mut plan = ModificationPlan::new(&seq, &DEFAULT_MODIFICATION_CATALOG, MassType::Mono);
        plan.declare_partial(&seq, parse_partial_modifications("0(1,3);1(1,4);2(3,1);3(3)*").unwrap()).unwrap();

        let whole = plan.groups(&seq, Fragment::new(0, 4)).unwrap();
        assert_eq!(GroupedEnumeration::new(&whole, &plan).signature(), "1,3x2;1,4x1;3x1");

        let left = plan.groups(&seq, Fragment::new(0, 1)).unwrap();
        let right = plan.groups(&seq, Fragment::new(1, 2)).unwrap();
        assert_ne!(left, right);
        assert_eq!(
            GroupedEnumeration::new(&left, &plan).signature(),
            GroupedEnumeration::new(&right, &plan).signature()
        );
        assert_eq!(GroupedEnumeration::new(&[], &plan).signature(), "");
    }

    #[test]
    fn groups_multiply_their_splits() {
        let seq = ProteinSequence::new("P1", "KSK", &PROTEINOGENIC_AMINO_ACID_TABLE).unwrap();
        let mut plan = ModificationPlan::new(&seq, &DEFAULT_MODIFICATION_CATALOG, MassType::Mono);
        plan.declare_partial(&seq, parse_partial_modifications("0(1,4);1(1,3);2(1,4)*").unwrap()).unwrap();
        let groups = plan.groups(&seq, Fragment::new(0, 2)).unwrap();
        assert_eq!(groups.len(), 2);

        let combinations = GroupedEnumeration::new(&groups, &plan).run().unwrap();
        // group {1,3} x1 and group {1,4} x2 give 2 * 3 splits, all with distinct totals
        assert_eq!(combinations.len(), 6);
        assert_eq!(counts_of(&combinations)[0], vec![(1, 3)]);
        assert!(counts_of(&combinations).contains(&vec![(1, 1), (3, 1), (4, 1)]));
    }

    #[test]
    fn totals_shared_across_groups_are_reported_once() {
        let seq = ProteinSequence::new("P1", "KK", &PROTEINOGENIC_AMINO_ACID_TABLE).unwrap();
        let mut plan = ModificationPlan::new(&seq, &DEFAULT_MODIFICATION_CATALOG, MassType::Mono);
        plan.declare_partial(&seq, parse_partial_modifications("0(1,4);1(1,4,5)*").unwrap()).unwrap();
        let groups = plan.groups(&seq, Fragment::new(0, 1)).unwrap();

        let combinations = GroupedEnumeration::new(&groups, &plan).run().unwrap();
        // {1 from the first group, 4 from the second} and the reverse both give {1:1, 4:1}
        assert_eq!(combinations.len(), 5);
        let totals = counts_of(&combinations);
        assert_eq!(totals.iter().filter(|t| **t == vec![(1, 1), (4, 1)]).count(), 1);
    }

    #[test]
    fn no_groups_yield_one_empty_combination() {
        let seq = ProteinSequence::new("P1", "AAA", &PROTEINOGENIC_AMINO_ACID_TABLE).unwrap();
        let plan = ModificationPlan::new(&seq, &DEFAULT_MODIFICATION_CATALOG, MassType::Mono);
        let combinations = GroupedEnumeration::new(&[], &plan).run().unwrap();
        assert_eq!(counts_of(&combinations), vec![Vec::<(ModificationId, usize)>::new()]);
    }
}
