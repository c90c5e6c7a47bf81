use anyhow::*;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::annotation::model::Peak;
use crate::io::reader::TextReader;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeakListFormat {
    /// `type mass height rel_height left_width right_width`
    #[default]
    Kerber,
    /// A header line, then `index mass height`
    Toll,
    /// `mass,intensity` with a header row
    Csv,
}

impl std::str::FromStr for PeakListFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "kerber" => Ok(PeakListFormat::Kerber),
            "toll" => Ok(PeakListFormat::Toll),
            "csv" => Ok(PeakListFormat::Csv),
            _ => bail!("unknown peak list format '{}'", s),
        }
    }
}

pub fn read_peak_list(path: impl AsRef<Path>, format: PeakListFormat) -> Result<Vec<Peak>> {
    let path = path.as_ref();

    let peaks = match format {
        PeakListFormat::Kerber => read_columns(path, false, 1, 2)?,
        PeakListFormat::Toll => read_columns(path, true, 1, 2)?,
        PeakListFormat::Csv => read_csv(path)?,
    };

    log::info!("read {} peaks from {}", peaks.len(), path.display());
    Ok(peaks)
}

fn read_columns(path: &Path, skip_header: bool, mass_col: usize, height_col: usize) -> Result<Vec<Peak>> {
    let text_reader = TextReader::open(path, 1024 * 1024)
        .with_context(|| format!("can't open peak list {}", path.display()))?;

    let mut peaks = Vec::new();
    for line in text_reader {
        let (line_number, line) = line?;
        if (skip_header && line_number == 1) || line.trim().is_empty() {
            continue;
        }

        let columns: Vec<&str> = line.split_ascii_whitespace().collect();
        if columns.len() <= mass_col.max(height_col) {
            bail!("{}:{}: expected at least {} columns", path.display(), line_number, mass_col.max(height_col) + 1);
        }

        let mass: f64 = fast_float::parse(columns[mass_col])
            .with_context(|| format!("{}:{}: invalid mass '{}'", path.display(), line_number, columns[mass_col]))?;
        let intensity: f64 = fast_float::parse(columns[height_col])
            .with_context(|| format!("{}:{}: invalid height '{}'", path.display(), line_number, columns[height_col]))?;

        peaks.push(Peak { mass, intensity });
    }

    Ok(peaks)
}

fn read_csv(path: &Path) -> Result<Vec<Peak>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("can't open peak list {}", path.display()))?;

    let mut peaks = Vec::new();
    for record in reader.deserialize() {
        let peak: Peak = record.with_context(|| format!("{}: invalid peak row", path.display()))?;
        peaks.push(peak);
    }

    Ok(peaks)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_temp(name: &str, content: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("specannotate_peaks_{}_{}", name, std::process::id()));
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn reads_kerber_lists() {
        let path = write_temp("kerber", "P 1000.5 120.0 0.8 0.1 0.1\nP\t2000.25 40 0.2 0.1 0.1\n\n");
        let peaks = read_peak_list(&path, PeakListFormat::Kerber).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(peaks, vec![Peak { mass: 1000.5, intensity: 120.0 }, Peak { mass: 2000.25, intensity: 40.0 }]);
    }

    #[test]
    fn reads_toll_lists_without_their_header() {
        let path = write_temp("toll", "nr mass height\n1 1500.0 10\n2 1600.5 20\n");
        let peaks = read_peak_list(&path, PeakListFormat::Toll).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(peaks.len(), 2);
        assert_eq!(peaks[1], Peak { mass: 1600.5, intensity: 20.0 });
    }

    #[test]
    fn reads_csv_lists() {
        let path = write_temp("csv", "mass,intensity\n799.36, 5\n");
        let peaks = read_peak_list(&path, PeakListFormat::Csv).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(peaks, vec![Peak { mass: 799.36, intensity: 5.0 }]);
    }

    #[test]
    fn rejects_short_and_malformed_lines() {
        let path = write_temp("bad", "P 1000.5\n");
        assert!(read_peak_list(&path, PeakListFormat::Kerber).is_err());
        std::fs::write(&path, "P abc 1 1 1 1\n").unwrap();
        assert!(read_peak_list(&path, PeakListFormat::Kerber).is_err());
        std::fs::remove_file(&path).unwrap();

        assert_eq!("TOLL".parse::<PeakListFormat>().unwrap(), PeakListFormat::Toll);
        assert!("mzml".parse::<PeakListFormat>().is_err());
    }
}
