use lazy_static::lazy_static;
use serde::Deserialize;
use std::collections::HashMap;
use std::io::Read;

use crate::chemistry::constants::*;
use crate::chemistry::mass_calc::calc_formula_mass;
use crate::chemistry::model::*;
use crate::errors::{AnnotateError, Result};

#[derive(Clone, Default, PartialEq, Debug)]
pub struct AtomTable {
    pub atoms: Vec<Atom>,
    pub atom_by_symbol: HashMap<String, Atom>,
}

impl AtomTable {
    pub fn new(atoms: Vec<Atom>) -> anyhow::Result<AtomTable> {
        if atoms.is_empty() { anyhow::bail!("atoms is empty") }

        let table = Self::from_atoms(atoms);
        if table.atom_by_symbol.len() != table.atoms.len() {
            anyhow::bail!("atoms contains duplicated entries")
        }

        Ok(table)
    }

    fn from_atoms(atoms: Vec<Atom>) -> AtomTable {
        let atom_by_symbol = atoms
            .iter()
            .map(|atom| (atom.symbol.to_owned(), atom.clone()))
            .collect();

        AtomTable { atoms, atom_by_symbol }
    }
}

fn atom(atomic_number: u16, symbol: &str, name: &str, isotopes: &[(u16, f64, f32)]) -> Atom {
    Atom {
        atomic_number,
        symbol: symbol.to_string(),
        name: name.to_string(),
        isotopes: isotopes
            .iter()
            .map(|&(mass_number, mass, abundance)| Isotope { mass_number, mass, abundance })
            .collect(),
    }
}

lazy_static! {
    pub static ref BIOMOLECULE_ATOM_TABLE: AtomTable = AtomTable::from_atoms(vec![
        atom(1, "H", "Hydrogen", &[(1, 1.00782503207, 0.999885), (2, 2.0141017778, 0.000115)]),
        atom(6, "C", "Carbon", &[(12, 12.0000000, 0.9893), (13, 13.0033548378, 0.0107)]),
        atom(7, "N", "Nitrogen", &[(14, 14.0030740048, 0.99636), (15, 15.0001088982, 0.00364)]),
        atom(8, "O", "Oxygen", &[(16, 15.99491461956, 0.99757), (17, 16.99913170, 0.00038), (18, 17.9991610, 0.00205)]),
        atom(15, "P", "Phosphorus", &[(31, 30.97376163, 1.0000)]),
        atom(16, "S", "Sulfur", &[(32, 31.97207100, 0.9499), (33, 32.97145876, 0.0075), (34, 33.96786690, 0.0425), (36, 35.96708076, 0.0001)]),
        atom(34, "Se", "Selenium", &[
            (74, 73.922475934, 0.0089), (76, 75.919213704, 0.0937), (77, 76.919914154, 0.0763),
            (78, 77.91730928, 0.2377), (80, 79.9165218, 0.4961), (82, 81.9166995, 0.0873),
        ]),
    ]);
}

/// Residue lookup by one- or three-letter code. Records are stored once and
/// handed out by reference.
#[derive(Clone, Default, PartialEq, Debug)]
pub struct AminoAcidTable {
    pub amino_acids: Vec<AminoAcidResidue>,
    aa_by_code1: HashMap<char, usize>,
    aa_by_code3: HashMap<String, usize>,
}

impl AminoAcidTable {
    pub fn new(amino_acids: Vec<AminoAcidResidue>) -> anyhow::Result<AminoAcidTable> {
        if amino_acids.is_empty() { anyhow::bail!("amino_acids is empty") }

        let table = Self::from_residues(amino_acids);
        if table.aa_by_code1.len() != table.amino_acids.len() {
            anyhow::bail!("amino_acids contains duplicated entries")
        }

        Ok(table)
    }

    fn from_residues(amino_acids: Vec<AminoAcidResidue>) -> AminoAcidTable {
        let aa_by_code1 = amino_acids.iter().enumerate().map(|(i, aa)| (aa.code1, i)).collect();
        let aa_by_code3 = amino_acids
            .iter()
            .enumerate()
            .map(|(i, aa)| (aa.code3.to_ascii_uppercase(), i))
            .collect();

        AminoAcidTable { amino_acids, aa_by_code1, aa_by_code3 }
    }

    pub fn get_code1(&self, code1: char) -> Option<&AminoAcidResidue> {
        self.aa_by_code1.get(&code1).map(|&i| &self.amino_acids[i])
    }

    pub fn find_code1(&self, code1: char) -> Result<&AminoAcidResidue> {
        self.get_code1(code1)
            .ok_or_else(|| AnnotateError::amino_acid_lookup(&code1.to_string()))
    }

    /// Accepts either a one-letter or a three-letter code (case-insensitive).
    pub fn find(&self, code: &str) -> Result<&AminoAcidResidue> {
        let code = code.trim();
        let mut chars = code.chars();
        let found = match (chars.next(), chars.next()) {
            (Some(c), None) => self.get_code1(c.to_ascii_uppercase()),
            _ => self
                .aa_by_code3
                .get(&code.to_ascii_uppercase())
                .map(|&i| &self.amino_acids[i]),
        };

        found.ok_or_else(|| AnnotateError::amino_acid_lookup(code))
    }
}

fn residue(code1: char, code3: &str, name: &str, formula: Option<&str>, mono_mass: f64, average_mass: f64) -> AminoAcidResidue {
    AminoAcidResidue {
        code1,
        code3: code3.to_string(),
        name: name.to_string(),
        formula: formula.map(|f| f.to_string()),
        mono_mass,
        average_mass,
    }
}

// Sources :
// - http://en.wikipedia.org/wiki/Proteinogenic_amino_acid
// - https://proteomicsresource.washington.edu/tools/masses.php
// - http://www.matrixscience.com/help/aa_help.html
lazy_static! {
    pub static ref STANDARD_AMINO_ACID_TABLE: AminoAcidTable = AminoAcidTable::from_residues(vec![
        residue('A', "Ala", "Alanine", Some("C(3) H(5) O N"), 71.03711381, 71.0779),
        residue('R', "Arg", "Arginine", Some("C(6) H(12) O N(4)"), 156.1011111, 156.18568),
        residue('N', "Asn", "Asparagine", Some("C(4) H(6) O(2) N(2)"), 114.0429275, 114.10264),
        residue('D', "Asp", "Aspartic acid", Some("C(4) H(5) O(3) N"), 115.0269431, 115.0874),
        residue('C', "Cys", "Cysteine", Some("C(3) H(5) O N S"), 103.0091845, 103.1429),
        residue('E', "Glu", "Glutamic acid", Some("C(5) H(7) O(3) N"), 129.0425931, 129.11398),
        residue('Q', "Gln", "Glutamine", Some("C(5) H(8) O(2) N(2)"), 128.0585775, 128.12922),
        residue('G', "Gly", "Glycine", Some("C(2) H(3) O N"), 57.02146374, 57.05132),
        residue('H', "His", "Histidine", Some("C(6) H(7) O N(3)"), 137.0589119, 137.13928),
        residue('I', "Ile", "Isoleucine", Some("C(6) H(11) O N"), 113.084064, 113.15764),
        residue('L', "Leu", "Leucine", Some("C(6) H(11) O N"), 113.084064, 113.15764),
        residue('K', "Lys", "Lysine", Some("C(6) H(12) O N(2)"), 128.0949631, 128.17228),
        residue('M', "Met", "Methionine", Some("C(5) H(9) O N S"), 131.0404846, 131.19606),
        residue('F', "Phe", "Phenylalanine", Some("C(9) H(9) O N"), 147.0684139, 147.17386),
        residue('P', "Pro", "Proline", Some("C(5) H(7) O N"), 97.05276388, 97.11518),
        residue('U', "Sec", "Selenocysteine", Some("C(3) H(5) N O Se"), 150.9536353, 150.0379),
        residue('S', "Ser", "Serine", Some("C(3) H(5) O(2) N"), 87.03202844, 87.0773),
        residue('T', "Thr", "Threonine", Some("C(4) H(7) O(2) N"), 101.0476785, 101.10388),
        residue('W', "Trp", "Tryptophan", Some("C(11) H(10) O N(2)"), 186.079313, 186.2099),
        residue('Y', "Tyr", "Tyrosine", Some("C(9) H(9) O(2) N"), 163.0633286, 163.17326),
        residue('V', "Val", "Valine", Some("C(5) H(9) O N"), 99.06841395, 99.13106),
    ]);

    /// Standard residues plus the ambiguity codes found in sequence databases.
    pub static ref PROTEINOGENIC_AMINO_ACID_TABLE: AminoAcidTable = AminoAcidTable::from_residues({
        let mut v = STANDARD_AMINO_ACID_TABLE.amino_acids.to_vec();
        v.extend(vec![
            residue('B', "Asx", "Asn or Asp", None, 114.5349353, 114.59502),
            residue('J', "Xle", "Ile or Leu", Some("C(6) H(11) O N"), 113.084064, 113.15764),
            residue('O', "Pyl", "Pyrrolysine", Some("C(12) H(21) O(3) N(3)"), 237.1477266, 237.298143),
            residue('X', "Xaa", "Unknown", None, AVERAGE_AA_MASS, AVERAGE_AA_MASS),
            residue('Z', "Glx", "Glu or Gln", None, 128.5505853, 128.6216),
        ]);
        v
    });
}

/// Modification records indexed by id and by (case-insensitive) name.
#[derive(Clone, Default, PartialEq, Debug)]
pub struct ModificationCatalog {
    pub modifications: Vec<Modification>,
    mod_by_id: HashMap<ModificationId, usize>,
    mod_by_name: HashMap<String, usize>,
}

impl ModificationCatalog {
    pub fn new(modifications: Vec<Modification>) -> anyhow::Result<ModificationCatalog> {
        if modifications.is_empty() { anyhow::bail!("modifications is empty") }
        if modifications.iter().any(|m| m.id == 0) { anyhow::bail!("modification ids must be strictly positive") }

        let catalog = Self::from_modifications(modifications);
        if catalog.mod_by_id.len() != catalog.modifications.len() {
            anyhow::bail!("modifications contains duplicated ids")
        }
        if catalog.mod_by_name.len() != catalog.modifications.len() {
            anyhow::bail!("modifications contains duplicated names")
        }

        Ok(catalog)
    }

    fn from_modifications(modifications: Vec<Modification>) -> ModificationCatalog {
        let mod_by_id = modifications.iter().enumerate().map(|(i, m)| (m.id, i)).collect();
        let mod_by_name = modifications
            .iter()
            .enumerate()
            .map(|(i, m)| (m.name.to_ascii_lowercase(), i))
            .collect();

        ModificationCatalog { modifications, mod_by_id, mod_by_name }
    }

    pub fn get(&self, id: ModificationId) -> Result<&Modification> {
        self.mod_by_id
            .get(&id)
            .map(|&i| &self.modifications[i])
            .ok_or_else(|| AnnotateError::modification_lookup(&id.to_string()))
    }

    /// Looks a modification up by name first, then by numeric id.
    pub fn find(&self, name_or_id: &str) -> Result<&Modification> {
        let key = name_or_id.trim();
        if let Some(&i) = self.mod_by_name.get(&key.to_ascii_lowercase()) {
            return Ok(&self.modifications[i]);
        }

        match key.parse::<ModificationId>() {
            Ok(id) => self.get(id).map_err(|_| AnnotateError::modification_lookup(key)),
            Err(_) => Err(AnnotateError::modification_lookup(key)),
        }
    }

    pub fn net_mass(&self, id: ModificationId, mass_type: MassType) -> Result<f64> {
        Ok(self.get(id)?.net_mass(mass_type))
    }

    /// Loads a catalog from CSV with the columns
    /// `id,name,plus_formula,minus_formula,residues`; masses are derived from the formulas.
    pub fn from_csv_reader<R: Read>(reader: R, atom_table: &AtomTable) -> anyhow::Result<ModificationCatalog> {
        #[derive(Deserialize)]
        struct ModificationRecord {
            id: ModificationId,
            name: String,
            plus_formula: Option<String>,
            minus_formula: Option<String>,
            residues: String,
        }

        let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

        let mut modifications = Vec::new();
        for record in csv_reader.deserialize() {
            let record: ModificationRecord = record?;
            let modification = modification_from_formulas(
                record.id,
                &record.name,
                record.plus_formula.as_deref(),
                record.minus_formula.as_deref(),
                &record.residues,
                atom_table,
            )?;
            modifications.push(modification);
        }

        ModificationCatalog::new(modifications)
    }
}

/// Builds a modification record from its plus and minus formulas. Residues are given
/// as one-letter codes, optionally separated by commas or spaces.
pub fn modification_from_formulas(
    id: ModificationId,
    name: &str,
    plus_formula: Option<&str>,
    minus_formula: Option<&str>,
    residues: &str,
    atom_table: &AtomTable,
) -> Result<Modification> {
    let plus_formula = plus_formula.filter(|f| !f.trim().is_empty());
    let minus_formula = minus_formula.filter(|f| !f.trim().is_empty());

    let formula_mass = |formula: Option<&str>, mass_type| -> Result<f64> {
        formula.map_or(Ok(0.0), |f| calc_formula_mass(f, atom_table, mass_type))
    };

    let residues = residues
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .map(|c| STANDARD_AMINO_ACID_TABLE.find_code1(c.to_ascii_uppercase()).map(|aa| aa.code1))
        .collect::<Result<Vec<char>>>()?;

    Ok(Modification {
        id,
        name: name.to_string(),
        plus_formula: plus_formula.map(|f| f.to_string()),
        minus_formula: minus_formula.map(|f| f.to_string()),
        plus_mono_mass: formula_mass(plus_formula, MassType::Mono)?,
        plus_average_mass: formula_mass(plus_formula, MassType::Average)?,
        minus_mono_mass: formula_mass(minus_formula, MassType::Mono)?,
        minus_average_mass: formula_mass(minus_formula, MassType::Average)?,
        residues,
    })
}

fn modification(
    id: ModificationId,
    name: &str,
    (plus_formula, plus_mono_mass, plus_average_mass): (Option<&str>, f64, f64),
    (minus_formula, minus_mono_mass, minus_average_mass): (Option<&str>, f64, f64),
    residues: &str,
) -> Modification {
    Modification {
        id,
        name: name.to_string(),
        plus_formula: plus_formula.map(|f| f.to_string()),
        minus_formula: minus_formula.map(|f| f.to_string()),
        plus_mono_mass,
        plus_average_mass,
        minus_mono_mass,
        minus_average_mass,
        residues: residues.chars().collect(),
    }
}

const NOTHING: (Option<&str>, f64, f64) = (None, 0.0, 0.0);

// Masses computed from BIOMOLECULE_ATOM_TABLE
lazy_static! {
    pub static ref DEFAULT_MODIFICATION_CATALOG: ModificationCatalog = ModificationCatalog::from_modifications(vec![
        modification(1, UNMODIFIED_NAME, NOTHING, NOTHING, "ACDEFGHIKLMNPQRSTUVWY"),
        modification(2, "Oxidation", (Some("O"), 15.99491461956, 15.99940493), NOTHING, "MW"),
        modification(3, "Phosphorylation", (Some("H P O(3)"), 79.96633052075, 79.97991717), NOTHING, "STY"),
        modification(4, "Acetylation", (Some("C(2) H(2) O"), 42.0105646837, 42.03675823), NOTHING, "K"),
        modification(5, "Methylation", (Some("C H(2)"), 14.01565006414, 14.02661740), NOTHING, "KR"),
        modification(6, "Dimethylation", (Some("C(2) H(4)"), 28.03130012828, 28.05323481), NOTHING, "KR"),
        modification(7, "Carbamidomethylation", (Some("C(2) H(3) N O"), 57.02146372057, 57.05140219), NOTHING, "C"),
        modification(8, "Deamidation", (Some("O"), 15.99491461956, 15.99940493), (Some("N H"), 15.01089903687, 15.01464397), "NQ"),
        modification(9, "Gln->pyro-Glu", NOTHING, (Some("N H(3)"), 17.02654910101, 17.03052547), "Q"),
    ]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn residue_lookup_by_both_codes() {
        let asp = STANDARD_AMINO_ACID_TABLE.find("D").unwrap();
        assert_eq!(asp.code3, "Asp");
        assert_eq!(STANDARD_AMINO_ACID_TABLE.find("asp").unwrap().code1, 'D');
        assert_eq!(
            STANDARD_AMINO_ACID_TABLE.find("Xyz"),
            Err(AnnotateError::UnknownAminoAcid { code: "Xyz".to_string() })
        );
        assert!(STANDARD_AMINO_ACID_TABLE.find_code1('X').is_err());
        assert!(PROTEINOGENIC_AMINO_ACID_TABLE.find_code1('X').is_ok());
    }

    #[test]
    fn duplicated_residues_are_rejected() {
        let mut residues = STANDARD_AMINO_ACID_TABLE.amino_acids.clone();
        residues.push(residues[0].clone());
        assert!(AminoAcidTable::new(residues).is_err());
        assert!(AtomTable::new(BIOMOLECULE_ATOM_TABLE.atoms.clone()).is_ok());
    }

    #[test]
    fn default_catalog_masses_agree_with_formulas() {
        for m in &DEFAULT_MODIFICATION_CATALOG.modifications {
            let rebuilt = modification_from_formulas(
                m.id,
                &m.name,
                m.plus_formula.as_deref(),
                m.minus_formula.as_deref(),
                &m.residues.iter().collect::<String>(),
                &BIOMOLECULE_ATOM_TABLE,
            )
            .unwrap();
            assert!((rebuilt.net_mass(MassType::Mono) - m.net_mass(MassType::Mono)).abs() < 1e-6, "{}", m.name);
            assert!((rebuilt.net_mass(MassType::Average) - m.net_mass(MassType::Average)).abs() < 1e-4, "{}", m.name);
            assert_eq!(rebuilt.residues, m.residues);
        }
    }

    #[test]
    fn catalog_lookup_by_name_or_id() {
        let catalog = &*DEFAULT_MODIFICATION_CATALOG;
        assert_eq!(catalog.find("phosphorylation").unwrap().id, 3);
        assert_eq!(catalog.find("2").unwrap().name, "Oxidation");
        assert_eq!(
            catalog.find("Sulfation"),
            Err(AnnotateError::UnknownModification { name: "Sulfation".to_string() })
        );
        assert!(catalog.get(1).unwrap().is_placeholder(MassType::Mono));
        assert!(catalog.net_mass(9, MassType::Mono).unwrap() < 0.0);
    }

    #[test]
    fn catalog_from_csv() {
        let data = "\
id,name,plus_formula,minus_formula,residues
1,unmodified,,,\"S,T\"
10,Sulfation,S O(3),,Y
";
        let catalog = ModificationCatalog::from_csv_reader(data.as_bytes(), &BIOMOLECULE_ATOM_TABLE).unwrap();
        let sulfation = catalog.find("sulfation").unwrap();
        assert!((sulfation.net_mass(MassType::Mono) - 79.95681486).abs() < 1e-6);
        assert_eq!(sulfation.residues, vec!['Y']);
        assert_eq!(catalog.get(1).unwrap().residues, vec!['S', 'T']);

        let duplicated = "id,name,plus_formula,minus_formula,residues\n2,a,O,,M\n2,b,O,,M\n";
        assert!(ModificationCatalog::from_csv_reader(duplicated.as_bytes(), &BIOMOLECULE_ATOM_TABLE).is_err());
    }
}
