use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::chemistry::model::ProteinSequence;
use crate::digest::enzyme::{CleavageMode, Enzyme};
use crate::errors::Result;

/// Inclusive `[start, end]` range of sequence positions.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Ord, PartialOrd, Debug, Serialize, Deserialize)]
pub struct Fragment {
    pub start: usize,
    pub end: usize,
}

impl Fragment {
    pub fn new(start: usize, end: usize) -> Fragment {
        Fragment { start, end }
    }

    pub fn contains(&self, position: usize) -> bool {
        self.start <= position && position <= self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start + 1
    }
}

impl std::fmt::Display for Fragment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.start, self.end)
    }
}

/// Ordered fragment list of one protein and, for every position, the indices of
/// the fragments covering it. Fragment 0 is always the whole protein.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Digest {
    pub fragments: Vec<Fragment>,
    pub membership: Vec<Vec<usize>>,
}

impl Digest {
    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    pub fn fragments_at(&self, position: usize) -> &[usize] {
        self.membership.get(position).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, Fragment)> + '_ {
        self.fragments.iter().copied().enumerate()
    }
}

/// Digests `sequence` with the given cleavage residues; `cleavage_mode` must be "N" or "C".
pub fn digest(sequence: &ProteinSequence, cleavage_sites: &[char], cleavage_mode: &str) -> Result<Digest> {
    let mode: CleavageMode = cleavage_mode.parse()?;
    Ok(cleave(sequence, cleavage_sites, mode))
}

/// Without an enzyme the whole protein is the only fragment.
pub fn digest_with_enzyme(sequence: &ProteinSequence, enzyme: Option<&Enzyme>) -> Digest {
    match enzyme {
        Some(enzyme) => cleave(sequence, &enzyme.cleavage_sites, enzyme.cleavage_mode),
        None => cleave(sequence, &[], CleavageMode::CTerm),
    }
}

fn cleave(sequence: &ProteinSequence, cleavage_sites: &[char], mode: CleavageMode) -> Digest {
    let n_residues = sequence.len();
    let offset = mode.offset();

    let cleavage_positions: Vec<usize> = sequence
        .residues()
        .iter()
        .enumerate()
        .filter(|(_, aa)| cleavage_sites.contains(&aa.code1))
        .map(|(pos, _)| pos)
        .collect();

    let mut fragments = Vec::with_capacity(1 + cleavage_positions.len() * (cleavage_positions.len() + 3) / 2);
    let mut seen = HashSet::new();

    let mut push_fragment = |start: usize, end: Option<usize>| {
        let end = match end {
            Some(end) if start <= end && end < n_residues => end,
            _ => return,
        };
        let fragment = Fragment::new(start, end);
        if seen.insert(fragment) {
            fragments.push(fragment);
        }
    };

    // whole protein
    push_fragment(0, n_residues.checked_sub(1));

    for &p in &cleavage_positions {
        push_fragment(0, (p + offset).checked_sub(1));
    }

    for (i, &a) in cleavage_positions.iter().enumerate() {
        for &b in &cleavage_positions[i + 1..] {
            push_fragment(a + offset, (b + offset).checked_sub(1));
        }
    }

    for &a in &cleavage_positions {
        push_fragment(a + offset, n_residues.checked_sub(1));
    }

    let mut membership = vec![Vec::new(); n_residues];
    for (idx, fragment) in fragments.iter().enumerate() {
        for members in &mut membership[fragment.start..=fragment.end] {
            members.push(idx);
        }
    }

    log::debug!(
        "{} fragments from {} cleavage positions in protein {}",
        fragments.len(),
        cleavage_positions.len(),
        sequence.id
    );

    Digest { fragments, membership }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chemistry::table::PROTEINOGENIC_AMINO_ACID_TABLE;
    use crate::errors::AnnotateError;

    fn protein(seq: &str) -> ProteinSequence<'static> {
        ProteinSequence::new("P1", seq, &PROTEINOGENIC_AMINO_ACID_TABLE).unwrap()
    }

    fn bounds(digest: &Digest) -> Vec<(usize, usize)> {
        digest.fragments.iter().map(|f| (f.start, f.end)).collect()
    }

    #[test]
    fn c_terminal_cleavage_after_aspartate() {
        let digest = digest(&protein("ACDEFG"), &['D'], "C").unwrap();
        assert_eq!(bounds(&digest), vec![(0, 5), (0, 2), (3, 5)]);
        assert_eq!(digest.fragments_at(1), &[0, 1]);
        assert_eq!(digest.fragments_at(4), &[0, 2]);
    }

    #[test]
    fn emission_order_is_prefixes_then_pairs_then_suffixes() {
        let digest = digest(&protein("AKAKAKA"), &['K'], "C").unwrap();
        assert_eq!(
            bounds(&digest),
            vec![
                (0, 6),
                (0, 1), (0, 3), (0, 5),
                (2, 3), (2, 5), (4, 5),
                (2, 6), (4, 6), (6, 6),
            ]
        );
    }

    #[test]
    fn n_terminal_cleavage_skips_degenerate_fragments() {
        let digest = digest(&protein("DADA"), &['D'], "N").unwrap();
        // the prefix before position 0 is empty and the pair (0,2) repeats prefix [0,1]
        assert_eq!(bounds(&digest), vec![(0, 3), (0, 1), (2, 3)]);
    }

    #[test]
    fn cleavage_at_the_last_residue_does_not_repeat_the_whole_protein() {
        let digest = digest(&protein("AAK"), &['K'], "C").unwrap();
        assert_eq!(bounds(&digest), vec![(0, 2)]);
        assert_eq!(digest.fragments_at(2), &[0]);
    }

    #[test]
    fn invalid_cleavage_mode() {
        assert_eq!(
            digest(&protein("ACDEFG"), &['D'], "X"),
            Err(AnnotateError::InvalidCleavageMode { mode: "X".to_string() })
        );
    }

    #[test]
    fn no_enzyme_yields_the_whole_protein_only() {
        let digest = digest_with_enzyme(&protein("ACDKEFG"), None);
        assert_eq!(bounds(&digest), vec![(0, 6)]);
        assert!(digest.membership.iter().all(|m| m == &vec![0]));
    }
}
