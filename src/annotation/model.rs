use serde::{Deserialize, Serialize};

use crate::chemistry::model::{MassType, ModificationId};
use crate::combination::model::AnnotationMethod;

#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
pub struct Peak {
    pub mass: f64,
    pub intensity: f64,
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct RealizedModification {
    pub id: ModificationId,
    pub name: String,
    pub net_mass: f64,
    pub occurrences: usize,
    /// Empty when the search does not track positions.
    pub positions: Vec<usize>,
}

/// One explanation of a peak: a fragment, its modifications and the mass breakdown
/// leading to `calculated_mass`.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Annotation {
    pub protein_id: String,
    pub peak_mass: f64,
    pub peak_intensity: f64,
    pub fragment_index: usize,
    pub fragment_start: usize,
    pub fragment_end: usize,
    pub fragment_start_residue: String,
    pub fragment_end_residue: String,
    pub enzyme: String,
    pub unmodified_fragment_mass: f64,
    pub overall_modified_fragment_mass: f64,
    pub calculated_mass: f64,
    pub overall_modification_mass: f64,
    pub combination_mass: f64,
    pub modifications: Vec<RealizedModification>,
    pub overall_modifications: Vec<RealizedModification>,
    pub method: AnnotationMethod,
    pub mass_type: MassType,
}

impl Annotation {
    pub fn mass_error(&self) -> f64 {
        self.peak_mass - self.calculated_mass
    }

    fn modification_key(&self) -> Vec<(ModificationId, usize, &[usize])> {
        self.modifications
            .iter()
            .map(|m| (m.id, m.occurrences, m.positions.as_slice()))
            .collect()
    }
}

/// Orders annotations by fragment, then calculated mass, then modifications.
pub fn sort_annotations(annotations: &mut [Annotation]) {
    annotations.sort_by(|a, b| {
        a.fragment_index
            .cmp(&b.fragment_index)
            .then_with(|| a.calculated_mass.partial_cmp(&b.calculated_mass).unwrap_or(std::cmp::Ordering::Equal))
            .then_with(|| a.modification_key().cmp(&b.modification_key()))
    });
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub enum PeakOutcome {
    Annotated(Vec<Annotation>),
    NoAnnotation,
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct PeakReport {
    pub peak: Peak,
    pub outcome: PeakOutcome,
}

impl PeakReport {
    pub fn new(peak: Peak, mut annotations: Vec<Annotation>) -> PeakReport {
        if annotations.is_empty() {
            return PeakReport { peak, outcome: PeakOutcome::NoAnnotation };
        }

        sort_annotations(&mut annotations);
        PeakReport { peak, outcome: PeakOutcome::Annotated(annotations) }
    }

    pub fn annotations(&self) -> &[Annotation] {
        match &self.outcome {
            PeakOutcome::Annotated(annotations) => annotations,
            PeakOutcome::NoAnnotation => &[],
        }
    }
}
