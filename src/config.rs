use anyhow::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::chemistry::model::MassType;
use crate::combination::model::AnnotationMethod;
use crate::digest::enzyme::{Enzyme, ENZYME_TABLE};
use crate::io::peaklist::PeakListFormat;

/// Either the name of a built-in enzyme (`"none"` disables digestion) or a
/// custom cleavage rule.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EnzymeConfig {
    Named(String),
    Custom {
        name: String,
        /// One- or three-letter residue codes
        #[serde(alias = "cleavageSites")]
        cleavage_sites: Vec<String>,
        #[serde(alias = "cleavageMode")]
        cleavage_mode: String,
    },
}

impl EnzymeConfig {
    pub fn resolve(&self) -> crate::errors::Result<Option<Enzyme>> {
        match self {
            EnzymeConfig::Named(name) if name.trim().eq_ignore_ascii_case("none") => std::result::Result::Ok(None),
            EnzymeConfig::Named(name) => ENZYME_TABLE.find(name).map(|e| Some(e.clone())),
            EnzymeConfig::Custom { name, cleavage_sites, cleavage_mode } => {
                Enzyme::new(name, cleavage_sites, cleavage_mode).map(Some)
            }
        }
    }
}

#[derive(Clone, PartialEq, Debug, Serialize)]
pub enum ProteinSource {
    Sequence(String),
    /// Entry of a FASTA file, selected by accession.
    Fasta { path: PathBuf, accession: String },
}

/// Raw configuration as found in the JSON file: every key is optional here,
/// defaults and validation are applied by [`AnnotationConfigBuilder::build`].
#[derive(Deserialize, Default, Debug)]
pub struct AnnotationConfigBuilder {
    #[serde(alias = "proteinId", alias = "protein")]
    pub protein_id: Option<String>,
    pub sequence: Option<String>,
    pub fasta: Option<PathBuf>,
    pub accession: Option<String>,
    pub enzyme: Option<EnzymeConfig>,
    #[serde(alias = "overallModifications", alias = "overall_mods")]
    pub overall_modifications: Option<Vec<String>>,
    #[serde(alias = "partialModificationString", alias = "partial_mods")]
    pub partial_modification_string: Option<String>,
    #[serde(alias = "annotationMethod")]
    pub annotation_method: Option<AnnotationMethod>,
    #[serde(alias = "mass_type", alias = "massType")]
    pub masstype: Option<MassType>,
    #[serde(alias = "searchRange")]
    pub search_range: Option<f64>,
    pub peakfile: Option<PathBuf>,
    #[serde(alias = "peakfileFormat")]
    pub peakfile_format: Option<PeakListFormat>,
    #[serde(alias = "outputDir", alias = "output_dir")]
    pub outputdir: Option<PathBuf>,
    pub cache: Option<PathBuf>,
    /// CSV catalog replacing the built-in modifications
    pub modifications: Option<PathBuf>,
}

#[derive(Clone, PartialEq, Debug, Serialize)]
pub struct AnnotationConfig {
    pub protein_id: String,
    pub protein: ProteinSource,
    pub enzyme: Option<EnzymeConfig>,
    pub overall_modifications: Vec<String>,
    pub partial_modification_string: String,
    pub annotation_method: AnnotationMethod,
    pub mass_type: MassType,
    pub search_range: f64,
    pub peakfile: Option<PathBuf>,
    pub peakfile_format: PeakListFormat,
    pub outputdir: Option<PathBuf>,
    pub cache: Option<PathBuf>,
    pub modifications: Option<PathBuf>,
}

impl AnnotationConfigBuilder {
    pub fn build(self) -> Result<AnnotationConfig> {
        let protein_id = self.protein_id.ok_or_else(|| anyhow!("a protein_id must be provided"))?;

        let protein = match (self.sequence, self.fasta) {
            (Some(_), Some(_)) => bail!("protein {}: give either a sequence or a FASTA file, not both", protein_id),
            (Some(sequence), None) => ProteinSource::Sequence(sequence),
            (None, Some(path)) => ProteinSource::Fasta {
                path,
                accession: self.accession.unwrap_or_else(|| protein_id.clone()),
            },
            (None, None) => bail!("protein {}: a sequence or a FASTA file must be provided", protein_id),
        };

        let search_range = self.search_range.ok_or_else(|| anyhow!("a search_range must be provided"))?;
        if !search_range.is_finite() || search_range < 0.0 {
            bail!("search_range must be a non-negative number of Daltons, got {}", search_range);
        }

        let annotation_method = self
            .annotation_method
            .ok_or_else(|| anyhow!("an annotation_method must be provided"))?;

        Ok(AnnotationConfig {
            protein_id,
            protein,
            enzyme: self.enzyme,
            overall_modifications: self.overall_modifications.unwrap_or_default(),
            partial_modification_string: self.partial_modification_string.unwrap_or_default(),
            annotation_method,
            mass_type: self.masstype.unwrap_or_default(),
            search_range,
            peakfile: self.peakfile,
            peakfile_format: self.peakfile_format.unwrap_or_default(),
            outputdir: self.outputdir,
            cache: self.cache,
            modifications: self.modifications,
        })
    }
}

impl AnnotationConfig {
    pub fn from_json_str(json: &str) -> Result<AnnotationConfig> {
        let builder: AnnotationConfigBuilder = serde_json::from_str(json).context("invalid configuration")?;
        builder.build()
    }

    pub fn load(path: impl AsRef<Path>) -> Result<AnnotationConfig> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("can't read configuration file {}", path.display()))?;

        Self::from_json_str(&json).with_context(|| format!("in configuration file {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digest::enzyme::CleavageMode;

    #[test]
    fn reads_camel_case_aliases() {
        let config = AnnotationConfig::from_json_str(
            r#"{
                "protein_id": "P1",
                "sequence": "SMAKSK",
                "enzyme": "Trypsin",
                "overall_modifications": ["Oxidation"],
                "partialModificationString": "0(1,3);5(1,3)*",
                "annotationMethod": "peakwise_cormen",
                "masstype": "average",
                "searchRange": 0.5,
                "peakfile": "peaks.txt",
                "peakfile_format": "toll"
            }"#,
        )
        .unwrap();

        assert_eq!(config.protein, ProteinSource::Sequence("SMAKSK".to_string()));
        assert_eq!(config.annotation_method, AnnotationMethod::PeakwiseCormen);
        assert_eq!(config.mass_type, MassType::Average);
        assert_eq!(config.search_range, 0.5);
        assert_eq!(config.partial_modification_string, "0(1,3);5(1,3)*");
        assert_eq!(config.peakfile_format, PeakListFormat::Toll);
        assert_eq!(config.enzyme.unwrap().resolve().unwrap().unwrap().name, "Trypsin");
    }

    #[test]
    fn custom_enzymes_and_fasta_sources() {
        let config = AnnotationConfig::from_json_str(
            r#"{
                "protein_id": "P2",
                "fasta": "db.fasta",
                "enzyme": {"name": "mine", "cleavage_sites": ["D", "Glu"], "cleavageMode": "N"},
                "annotation_method": "enumerate",
                "search_range": 0
            }"#,
        )
        .unwrap();

        assert_eq!(
            config.protein,
            ProteinSource::Fasta { path: PathBuf::from("db.fasta"), accession: "P2".to_string() }
        );
        assert_eq!(config.mass_type, MassType::Mono);
        assert_eq!(config.peakfile_format, PeakListFormat::Kerber);

        let enzyme = config.enzyme.unwrap().resolve().unwrap().unwrap();
        assert_eq!(enzyme.cleavage_sites, vec!['D', 'E']);
        assert_eq!(enzyme.cleavage_mode, CleavageMode::NTerm);

        assert_eq!(EnzymeConfig::Named("none".to_string()).resolve().unwrap(), None);
        assert!(EnzymeConfig::Named("Pepsin".to_string()).resolve().is_err());
    }

    #[test]
    fn rejects_invalid_configurations() {
        let base = r#""protein_id": "P1", "sequence": "AK", "annotation_method": "enumerate""#;

        assert!(AnnotationConfig::from_json_str(&format!("{{{}, \"search_range\": -1.0}}", base)).is_err());
        assert!(AnnotationConfig::from_json_str(&format!("{{{}}}", base)).is_err());
        assert!(AnnotationConfig::from_json_str(&format!("{{{}, \"search_range\": 1, \"masstype\": \"heavy\"}}", base)).is_err());
        assert!(AnnotationConfig::from_json_str(
            r#"{"protein_id": "P1", "annotation_method": "enumerate", "search_range": 1}"#
        )
        .is_err());
        assert!(AnnotationConfig::from_json_str(
            r#"{"protein_id": "P1", "sequence": "AK", "annotation_method": "fastest", "search_range": 1}"#
        )
        .is_err());
    }
}
