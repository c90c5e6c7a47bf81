use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::chemistry::model::ModificationId;
use crate::digest::digester::Fragment;

#[derive(Clone, Copy, Eq, PartialEq, Hash, Ord, PartialOrd, Debug, Serialize, Deserialize)]
pub enum AnnotationMethod {
    #[serde(rename = "enumerate")]
    Enumerate,
    #[serde(rename = "improved_enumerate")]
    ImprovedEnumerate,
    #[serde(rename = "peakwise_cormen")]
    PeakwiseCormen,
}

impl AnnotationMethod {
    /// Extension of the per-peak report files written for this method.
    pub fn report_suffix(self) -> &'static str {
        match self {
            AnnotationMethod::Enumerate => "enum_annot",
            AnnotationMethod::ImprovedEnumerate => "improved_enum_annot",
            AnnotationMethod::PeakwiseCormen => "peakw_cormen_annot",
        }
    }
}

impl std::str::FromStr for AnnotationMethod {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<AnnotationMethod> {
        match s {
            "enumerate" => Ok(AnnotationMethod::Enumerate),
            "improved_enumerate" => Ok(AnnotationMethod::ImprovedEnumerate),
            "peakwise_cormen" => Ok(AnnotationMethod::PeakwiseCormen),
            _ => anyhow::bail!(
                "annotation method must be one of \"enumerate\", \"improved_enumerate\" or \"peakwise_cormen\", got {:?}",
                s
            ),
        }
    }
}

impl std::fmt::Display for AnnotationMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnnotationMethod::Enumerate => write!(f, "enumerate"),
            AnnotationMethod::ImprovedEnumerate => write!(f, "improved_enumerate"),
            AnnotationMethod::PeakwiseCormen => write!(f, "peakwise_cormen"),
        }
    }
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub enum Assignment {
    /// `(position, modification)` pairs in site order.
    Positional(Vec<(usize, ModificationId)>),
    /// `(modification, occurrences)` pairs sorted by modification id.
    Positionless(Vec<(ModificationId, usize)>),
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct RealizedCombination {
    pub assignment: Assignment,
    pub net_mass: f64,
}

impl RealizedCombination {
    /// Occurrence count per modification; positional assignments only count the
    /// positions inside `fragment` when one is given.
    pub fn counts_within(&self, fragment: Option<Fragment>) -> BTreeMap<ModificationId, usize> {
        let mut counts = BTreeMap::new();

        match &self.assignment {
            Assignment::Positional(pairs) => {
                for &(position, id) in pairs {
                    if fragment.map_or(true, |f| f.contains(position)) {
                        *counts.entry(id).or_insert(0) += 1;
                    }
                }
            }
            Assignment::Positionless(pairs) => {
                for &(id, n) in pairs {
                    *counts.entry(id).or_insert(0) += n;
                }
            }
        }

        counts
    }

    /// Positional pairs lying inside `fragment`, empty for positionless assignments.
    pub fn positions_within(&self, fragment: Fragment) -> Vec<(usize, ModificationId)> {
        match &self.assignment {
            Assignment::Positional(pairs) => pairs
                .iter()
                .copied()
                .filter(|&(position, _)| fragment.contains(position))
                .collect(),
            Assignment::Positionless(_) => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_names_round_trip_through_display() {
        for name in ["enumerate", "improved_enumerate", "peakwise_cormen"] {
            let method: AnnotationMethod = name.parse().unwrap();
            assert_eq!(method.to_string(), name);
        }
        assert!("cormen".parse::<AnnotationMethod>().is_err());
        assert_eq!(AnnotationMethod::PeakwiseCormen.report_suffix(), "peakw_cormen_annot");
    }

    #[test]
    fn positional_counts_are_restricted_to_the_fragment() {
        let combination = RealizedCombination {
            assignment: Assignment::Positional(vec![(1, 2), (3, 2), (5, 4)]),
            net_mass: 0.0,
        };

        let counts = combination.counts_within(Some(Fragment::new(0, 3)));
        assert_eq!(counts.into_iter().collect::<Vec<_>>(), vec![(2, 2)]);
        assert_eq!(combination.counts_within(None).len(), 2);
        assert_eq!(combination.positions_within(Fragment::new(3, 5)), vec![(3, 2), (5, 4)]);
    }
}
