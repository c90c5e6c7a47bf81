use serde::{Deserialize, Serialize};

use crate::chemistry::constants::*;
use crate::chemistry::mass_calc::calc_fragment_mass;
use crate::chemistry::table::AminoAcidTable;
use crate::errors::{AnnotateError, Result};

/// Catalog identifier of a modification. Identifiers start at 1, a missing
/// modification is represented by `None` rather than by a reserved id.
pub type ModificationId = u32;

#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MassType {
    #[default]
    Mono,
    Average,
}

impl std::str::FromStr for MassType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<MassType> {
        match s {
            "mono" => Ok(MassType::Mono),
            "average" => Ok(MassType::Average),
            _ => anyhow::bail!("masstype must be \"mono\" or \"average\", got {:?}", s),
        }
    }
}

impl std::fmt::Display for MassType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MassType::Mono => write!(f, "mono"),
            MassType::Average => write!(f, "average"),
        }
    }
}

/// Where a residue sits inside a fragment, which decides the terminal groups it carries.
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub enum ResiduePosition {
    Middle,
    NTerm,
    CTerm,
    Isolated,
}

#[derive(Clone, Default, PartialEq, Debug)]
pub struct AminoAcidResidue {
    pub code1: char,
    pub code3: String,
    pub name: String,
    pub formula: Option<String>,
    pub mono_mass: f64,
    pub average_mass: f64,
}

impl AminoAcidResidue {
    /// Residue mass, i.e. the mass of the residue when it sits in the middle of a chain.
    pub fn mass(&self, mass_type: MassType) -> f64 {
        match mass_type {
            MassType::Mono => self.mono_mass,
            MassType::Average => self.average_mass,
        }
    }

    pub fn positional_mass(&self, position: ResiduePosition, mass_type: MassType) -> f64 {
        let (h, oh, water) = match mass_type {
            MassType::Mono => (HYDROGEN_MONO_MASS, HYDROXYL_MONO_MASS, WATER_MONO_MASS),
            MassType::Average => (HYDROGEN_AVERAGE_MASS, HYDROXYL_AVERAGE_MASS, WATER_AVERAGE_MASS),
        };

        let residue_mass = self.mass(mass_type);
        match position {
            ResiduePosition::Middle => residue_mass,
            ResiduePosition::NTerm => residue_mass + h,
            ResiduePosition::CTerm => residue_mass + oh,
            ResiduePosition::Isolated => residue_mass + water,
        }
    }
}

// The atomic_number uniquely identifies an element
#[derive(Clone, Default, PartialEq, Debug)]
pub struct Atom {
    pub atomic_number: u16,
    pub symbol: String,
    pub name: String,
    pub isotopes: Vec<Isotope>,
}

impl Atom {
    /// Mass of the most abundant isotope, listed first in the table.
    pub fn mono_mass(&self) -> f64 {
        self.isotopes.first().map(|iso| iso.mass).unwrap_or_default()
    }

    pub fn calc_average_mass(&self) -> f64 {
        let mut weighted_mass_sum: f64 = 0.0;
        let mut weight_sum: f64 = 0.0;

        for iso in self.isotopes.iter() {
            let ab = iso.abundance as f64;
            weighted_mass_sum += iso.mass * ab;
            weight_sum += ab;
        }

        if weight_sum == 0.0 { return self.mono_mass() }

        weighted_mass_sum / weight_sum
    }

    pub fn mass(&self, mass_type: MassType) -> f64 {
        match mass_type {
            MassType::Mono => self.mono_mass(),
            MassType::Average => self.calc_average_mass(),
        }
    }
}

#[derive(Clone, Default, PartialEq, Debug)]
pub struct Isotope {
    pub mass_number: u16,
    pub mass: f64,
    pub abundance: f32,
}

/// A catalog modification. The plus part is added to the residue and the minus part
/// removed from it, so the mass shift is always `plus - minus`.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Modification {
    pub id: ModificationId,
    pub name: String,
    pub plus_formula: Option<String>,
    pub minus_formula: Option<String>,
    pub plus_mono_mass: f64,
    pub plus_average_mass: f64,
    pub minus_mono_mass: f64,
    pub minus_average_mass: f64,
    pub residues: Vec<char>,
}

impl Modification {
    pub fn plus_mass(&self, mass_type: MassType) -> f64 {
        match mass_type {
            MassType::Mono => self.plus_mono_mass,
            MassType::Average => self.plus_average_mass,
        }
    }

    pub fn minus_mass(&self, mass_type: MassType) -> f64 {
        match mass_type {
            MassType::Mono => self.minus_mono_mass,
            MassType::Average => self.minus_average_mass,
        }
    }

    pub fn net_mass(&self, mass_type: MassType) -> f64 {
        self.plus_mass(mass_type) - self.minus_mass(mass_type)
    }

    pub fn can_modify(&self, code1: char) -> bool {
        self.residues.contains(&code1)
    }

    /// Placeholders stand for "this site stays as it is" and never need a free site
    /// when a combination is packed into a fragment.
    pub fn is_placeholder(&self, mass_type: MassType) -> bool {
        self.name.eq_ignore_ascii_case(UNMODIFIED_NAME) || self.net_mass(mass_type) == 0.0
    }
}

/// A protein sequence resolved against a residue table. Residues are borrowed from
/// the table, so building a sequence never copies residue records.
#[derive(Clone, Debug)]
pub struct ProteinSequence<'t> {
    pub id: String,
    residues: Vec<&'t AminoAcidResidue>,
}

impl<'t> ProteinSequence<'t> {
    pub fn new(id: &str, sequence: &str, aa_table: &'t AminoAcidTable) -> Result<ProteinSequence<'t>> {
        let residues = sequence
            .chars()
            .filter(|c| !c.is_whitespace())
            .map(|c| aa_table.find_code1(c.to_ascii_uppercase()))
            .collect::<Result<Vec<_>>>()?;

        if residues.is_empty() {
            return Err(AnnotateError::EmptySequence { protein_id: id.to_string() });
        }

        Ok(ProteinSequence { id: id.to_string(), residues })
    }

    pub fn len(&self) -> usize {
        self.residues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.residues.is_empty()
    }

    pub fn residues(&self) -> &[&'t AminoAcidResidue] {
        &self.residues
    }

    pub fn residue(&self, position: usize) -> Result<&'t AminoAcidResidue> {
        self.residues
            .get(position)
            .copied()
            .ok_or_else(|| AnnotateError::position(position, position, self.len()))
    }

    pub fn to_code1_string(&self) -> String {
        self.residues.iter().map(|aa| aa.code1).collect()
    }

    pub fn unmodified_mass(&self, start: usize, end: usize, mass_type: MassType) -> Result<f64> {
        calc_fragment_mass(&self.residues, start, end, mass_type)
    }
}
