use thiserror::Error;

use crate::chemistry::model::ModificationId;

pub type Result<T, E = AnnotateError> = std::result::Result<T, E>;

/// Fatal failures of the annotation engine. None of them is retried: they abort the
/// current pass and are reported together with the scenario input that caused them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnnotateError {
    #[error("the cleavage mode {mode:?} is neither \"N\" nor \"C\"")]
    InvalidCleavageMode { mode: String },

    #[error("invalid partial modification string {input:?} at offset {offset}: {reason}")]
    InvalidModificationString {
        input: String,
        offset: usize,
        reason: String,
    },

    #[error("the modification {modification_id} cannot act on residue {residue:?} at position {position}")]
    WrongModification {
        modification_id: ModificationId,
        position: usize,
        residue: char,
    },

    #[error("the amino acid {code:?} could not be found in the residue table")]
    UnknownAminoAcid { code: String },

    #[error("the modification {name:?} could not be found in the modification catalog")]
    UnknownModification { name: String },

    #[error("the enzyme {name:?} could not be found in the enzyme table")]
    UnknownEnzyme { name: String },

    #[error("the range [{start}, {end}] does not lie within a protein of length {length}")]
    WrongPositionInProtein {
        start: usize,
        end: usize,
        length: usize,
    },

    #[error("the protein {protein_id:?} has an empty sequence")]
    EmptySequence { protein_id: String },

    #[error("invalid formula {formula:?}: {reason}")]
    InvalidFormula { formula: String, reason: String },

    #[error("the element {symbol:?} is missing from the atom table")]
    UnknownElement { symbol: String },
}

impl AnnotateError {
    pub(crate) fn cleavage_mode(mode: &str) -> Self {
        let mode = mode.to_owned();

        Self::InvalidCleavageMode { mode }
    }

    pub(crate) fn modification_string(input: &str, offset: usize, reason: impl Into<String>) -> Self {
        let input = input.to_owned();
        let reason = reason.into();

        Self::InvalidModificationString {
            input,
            offset,
            reason,
        }
    }

    pub(crate) fn amino_acid_lookup(code: &str) -> Self {
        let code = code.to_owned();

        Self::UnknownAminoAcid { code }
    }

    pub(crate) fn modification_lookup(name: &str) -> Self {
        let name = name.to_owned();

        Self::UnknownModification { name }
    }

    pub(crate) fn enzyme_lookup(name: &str) -> Self {
        let name = name.to_owned();

        Self::UnknownEnzyme { name }
    }

    pub(crate) fn position(start: usize, end: usize, length: usize) -> Self {
        Self::WrongPositionInProtein { start, end, length }
    }

    pub(crate) fn formula(formula: &str, reason: impl Into<String>) -> Self {
        let formula = formula.to_owned();
        let reason = reason.into();

        Self::InvalidFormula { formula, reason }
    }
}
