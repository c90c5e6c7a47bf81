use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;

use crate::errors::{AnnotateError, Result};

lazy_static! {
    // One formula token, e.g. "C", "Se", "H(3)" or "N(-1)"
    static ref ATOM_TOKEN_REGEX: Regex = Regex::new(r"^([A-Z][a-z]?)(?:\((-?\d+)\))?$").unwrap();
}

pub fn parse_aa_composition(sequence: &str) -> HashMap<char, f32> {
    let mut aa_count_by_char: HashMap<char, i32> = HashMap::new();

    for aa in sequence.chars().filter(|c| !c.is_whitespace()) {
        *aa_count_by_char.entry(aa).or_insert(0) += 1;
    }

    aa_count_by_char.into_iter().map(|(aa, count)| (aa, count as f32)).collect()
}

/// Parses a space separated formula such as `"C(2) H(3) N O"`. Repeated symbols are
/// summed, an empty formula yields an empty composition.
pub fn parse_atom_composition(formula: &str) -> Result<HashMap<String, f32>> {
    let mut abundance_map: HashMap<String, f32> = HashMap::new();

    for elem in formula.split_ascii_whitespace() {
        let caps = ATOM_TOKEN_REGEX
            .captures(elem)
            .ok_or_else(|| AnnotateError::formula(formula, format!("malformed token {:?}", elem)))?;

        let atom_symbol = &caps[1];
        let abundance: i32 = match caps.get(2) {
            None => 1,
            Some(quant) => quant
                .as_str()
                .parse()
                .map_err(|_| AnnotateError::formula(formula, format!("abundance of {:?} is too large", atom_symbol)))?,
        };

        *abundance_map.entry(atom_symbol.to_string()).or_insert(0.0) += abundance as f32;
    }

    Ok(abundance_map)
}
