use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

use crate::chemistry::table::STANDARD_AMINO_ACID_TABLE;
use crate::errors::{AnnotateError, Result};

/// Side of the cleavage residue on which the enzyme cuts.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
pub enum CleavageMode {
    /// Cuts before the residue, which starts the next fragment.
    #[serde(rename = "N")]
    NTerm,
    /// Cuts after the residue, which ends the previous fragment.
    #[serde(rename = "C")]
    CTerm,
}

impl CleavageMode {
    pub fn offset(self) -> usize {
        match self {
            CleavageMode::NTerm => 0,
            CleavageMode::CTerm => 1,
        }
    }
}

impl std::str::FromStr for CleavageMode {
    type Err = AnnotateError;

    fn from_str(s: &str) -> Result<CleavageMode> {
        match s {
            "N" => Ok(CleavageMode::NTerm),
            "C" => Ok(CleavageMode::CTerm),
            _ => Err(AnnotateError::cleavage_mode(s)),
        }
    }
}

impl std::fmt::Display for CleavageMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CleavageMode::NTerm => write!(f, "N"),
            CleavageMode::CTerm => write!(f, "C"),
        }
    }
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Enzyme {
    pub name: String,
    pub cleavage_sites: Vec<char>,
    pub cleavage_mode: CleavageMode,
}

impl Enzyme {
    /// Cleavage sites may be given as one- or three-letter residue codes.
    pub fn new<S: AsRef<str>>(name: &str, cleavage_sites: &[S], cleavage_mode: &str) -> Result<Enzyme> {
        let cleavage_mode = cleavage_mode.parse()?;
        let cleavage_sites = cleavage_sites
            .iter()
            .map(|site| STANDARD_AMINO_ACID_TABLE.find(site.as_ref()).map(|aa| aa.code1))
            .collect::<Result<Vec<char>>>()?;

        Ok(Enzyme { name: name.to_string(), cleavage_sites, cleavage_mode })
    }
}

fn enzyme(name: &str, sites: &str, cleavage_mode: CleavageMode) -> Enzyme {
    Enzyme { name: name.to_string(), cleavage_sites: sites.chars().collect(), cleavage_mode }
}

#[derive(Clone, Default, PartialEq, Debug)]
pub struct EnzymeTable {
    pub enzymes: Vec<Enzyme>,
}

impl EnzymeTable {
    pub fn find(&self, name: &str) -> Result<&Enzyme> {
        let name = name.trim();
        self.enzymes
            .iter()
            .find(|e| e.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| AnnotateError::enzyme_lookup(name))
    }
}

lazy_static! {
    pub static ref ENZYME_TABLE: EnzymeTable = EnzymeTable {
        enzymes: vec![
            enzyme("Trypsin", "KR", CleavageMode::CTerm),
            enzyme("Lys-C", "K", CleavageMode::CTerm),
            enzyme("Arg-C", "R", CleavageMode::CTerm),
            enzyme("Glu-C", "E", CleavageMode::CTerm),
            enzyme("Asp-N", "D", CleavageMode::NTerm),
            enzyme("Chymotrypsin", "FWY", CleavageMode::CTerm),
            enzyme("CNBr", "M", CleavageMode::CTerm),
        ]
    };
}
