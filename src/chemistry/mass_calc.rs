use std::collections::HashMap;

use crate::chemistry::composition::*;
use crate::chemistry::model::{AminoAcidResidue, MassType, ResiduePosition};
use crate::chemistry::table::{AminoAcidTable, AtomTable};
use crate::errors::{AnnotateError, Result};

/// Mass of a free peptide given as one-letter codes (sum of residues plus water).
pub fn calc_aa_seq_mass(aa_seq: &str, aa_table: &AminoAcidTable, mass_type: MassType) -> Result<f64> {
    let aa_comp = parse_aa_composition(aa_seq);

    let get_aa_mass = |aa_code1: char| -> Result<f64> {
        let aa = aa_table.find_code1(aa_code1)?;
        Ok(aa.mass(mass_type))
    };

    let seq_mass = _calc_mass(aa_comp, get_aa_mass)?;

    let water = match mass_type {
        MassType::Mono => crate::chemistry::constants::WATER_MONO_MASS,
        MassType::Average => crate::chemistry::constants::WATER_AVERAGE_MASS,
    };

    Ok(seq_mass + water)
}

pub fn calc_formula_mass(formula: &str, atom_table: &AtomTable, mass_type: MassType) -> Result<f64> {
    let atom_comp = parse_atom_composition(formula)?;

    let get_atom_mass = |symbol: String| -> Result<f64> {
        let atom = atom_table
            .atom_by_symbol
            .get(&symbol)
            .ok_or(AnnotateError::UnknownElement { symbol })?;
        Ok(atom.mass(mass_type))
    };

    _calc_mass(atom_comp, get_atom_mass)
}

/// Unmodified mass of the fragment `[start, end]`: the first residue carries the
/// N-terminal hydrogen, the last one the C-terminal hydroxyl, and a single residue
/// fragment carries both as water.
pub fn calc_fragment_mass(
    residues: &[&AminoAcidResidue],
    start: usize,
    end: usize,
    mass_type: MassType,
) -> Result<f64> {
    if start > end || end >= residues.len() {
        return Err(AnnotateError::position(start, end, residues.len()));
    }

    if start == end {
        return Ok(residues[start].positional_mass(ResiduePosition::Isolated, mass_type));
    }

    let middle_mass: f64 = residues[start + 1..end]
        .iter()
        .map(|aa| aa.positional_mass(ResiduePosition::Middle, mass_type))
        .sum();

    Ok(residues[start].positional_mass(ResiduePosition::NTerm, mass_type)
        + middle_mass
        + residues[end].positional_mass(ResiduePosition::CTerm, mass_type))
}

fn _calc_mass<T, F>(abundance_map: HashMap<T, f32>, get_entity_mass: F) -> Result<f64>
where
    F: Fn(T) -> Result<f64>,
{
    let mut mass: f64 = 0.0;
    for (entity, entity_ab) in abundance_map {
        let entity_mass = get_entity_mass(entity)?;
        mass += entity_ab as f64 * entity_mass;
    }

    Ok(mass)
}
