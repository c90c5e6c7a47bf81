use crate::chemistry::model::{ModificationId, ProteinSequence};
use crate::combination::model::{Assignment, RealizedCombination};
use crate::errors::Result;
use crate::modification::applier::ModificationPlan;

/// Naive search: one combination per positional assignment of the partial sites,
/// so the output size is the product of the candidate set sizes.
pub struct PositionalEnumeration<'a> {
    sequence: &'a ProteinSequence<'a>,
    plan: &'a ModificationPlan<'a>,
}

impl<'a> PositionalEnumeration<'a> {
    pub fn new(sequence: &'a ProteinSequence<'a>, plan: &'a ModificationPlan<'a>) -> PositionalEnumeration<'a> {
        PositionalEnumeration { sequence, plan }
    }

    /// Assignments come out in lexicographic candidate order, sites taken in
    /// declaration order.
    pub fn run(self) -> Result<Vec<RealizedCombination>> {
        let sites = self.plan.partial_sites();

        let mut choices: Vec<Vec<(ModificationId, f64)>> = Vec::with_capacity(sites.len());
        for site in sites {
            self.plan.check_site(self.sequence, site)?;
            let masses = site
                .candidates
                .iter()
                .map(|&id| self.plan.net_mass(id).map(|mass| (id, mass)))
                .collect::<Result<Vec<_>>>()?;
            choices.push(masses);
        }

        let mut combinations = Vec::new();
        let mut stack: Vec<(usize, Vec<(usize, ModificationId)>, f64)> =
            vec![(0, Vec::with_capacity(sites.len()), 0.0)];

        while let Some((depth, acc, net_mass)) = stack.pop() {
            if depth == sites.len() {
                combinations.push(RealizedCombination { assignment: Assignment::Positional(acc), net_mass });
                continue;
            }

            let position = sites[depth].position;
            for &(id, mass) in choices[depth].iter().rev() {
                let mut next = acc.clone();
                next.push((position, id));
                stack.push((depth + 1, next, net_mass + mass));
            }
        }

        log::debug!("{} positional combinations over {} partial sites", combinations.len(), sites.len());

        Ok(combinations)
    }
}
