use anyhow::*;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::annotation::model::{Annotation, PeakReport, RealizedModification};
use crate::combination::model::AnnotationMethod;

const RULE: &str = "#########################################################################################################";

pub fn peak_report_file_name(peak_mass: f64, method: AnnotationMethod) -> String {
    format!("peak_{:09.2}.{}", peak_mass, method.report_suffix())
}

pub fn write_peak_report<W: Write>(writer: &mut W, report: &PeakReport, search_range: f64) -> Result<()> {
    writeln!(writer, "{}", RULE)?;
    writeln!(
        writer,
        "ANNOTATIONS found for PEAK at a m/z value of {:.6}, within a search range of {:.6} Daltons.",
        report.peak.mass, search_range
    )?;
    writeln!(writer, "{}", RULE)?;
    writeln!(writer)?;
    writeln!(writer)?;

    for (i, annotation) in report.annotations().iter().enumerate() {
        write_annotation(writer, i + 1, annotation)?;
    }

    Ok(())
}

fn write_annotation<W: Write>(writer: &mut W, number: usize, a: &Annotation) -> Result<()> {
    writeln!(writer, "Annotation {} ({}, {} masses)", number, a.method, a.mass_type)?;
    writeln!(writer, "  protein:                   {}", a.protein_id)?;
    writeln!(
        writer,
        "  fragment:                  #{} [{}, {}] {}..{} (enzyme: {})",
        a.fragment_index, a.fragment_start, a.fragment_end, a.fragment_start_residue, a.fragment_end_residue, a.enzyme
    )?;
    writeln!(writer, "  unmodified fragment mass:  {:.6}", a.unmodified_fragment_mass)?;
    writeln!(writer, "  overall modified mass:     {:.6}", a.overall_modified_fragment_mass)?;
    writeln!(writer, "  calculated mass:           {:.6}", a.calculated_mass)?;
    writeln!(writer, "  mass error:                {:.6}", a.mass_error())?;
    writeln!(writer, "  overall modifications:     {}", describe(&a.overall_modifications))?;
    writeln!(writer, "  partial modifications:     {}", describe(&a.modifications))?;
    writeln!(writer)?;
    Ok(())
}

fn describe(modifications: &[RealizedModification]) -> String {
    if modifications.is_empty() {
        return "none".to_string();
    }

    modifications
        .iter()
        .map(|m| {
            let mut s = format!("{} x{} ({:+.6})", m.name, m.occurrences, m.net_mass);
            if !m.positions.is_empty() {
                let positions: Vec<String> = m.positions.iter().map(usize::to_string).collect();
                s.push_str(&format!(" at {}", positions.join(",")));
            }
            s
        })
        .collect::<Vec<String>>()
        .join("; ")
}

/// Writes one file per annotated peak into `dir`; peaks without annotations get no file.
pub fn write_peak_reports(
    dir: impl AsRef<Path>,
    reports: &[PeakReport],
    method: AnnotationMethod,
    search_range: f64,
) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir).with_context(|| format!("can't create output directory {}", dir.display()))?;

    let mut written = Vec::new();
    for report in reports.iter().filter(|r| !r.annotations().is_empty()) {
        let path = dir.join(peak_report_file_name(report.peak.mass, method));
        let file = File::create(&path).with_context(|| format!("can't create report file {}", path.display()))?;

        let mut writer = BufWriter::new(file);
        write_peak_report(&mut writer, report, search_range)?;
        writer.flush()?;

        log::info!("file {} created", path.display());
        written.push(path);
    }

    Ok(written)
}

#[derive(Serialize)]
struct SummaryRow<'a> {
    peak_mass: f64,
    peak_intensity: f64,
    annotation: Option<usize>,
    fragment_start: Option<usize>,
    fragment_end: Option<usize>,
    calculated_mass: Option<f64>,
    mass_error: Option<f64>,
    overall_modifications: Option<String>,
    modifications: Option<String>,
    method: Option<&'a str>,
}

fn counts(modifications: &[RealizedModification]) -> String {
    modifications
        .iter()
        .map(|m| format!("{}:{}", m.name, m.occurrences))
        .collect::<Vec<String>>()
        .join(";")
}

/// One CSV row per annotation, and one row with empty annotation columns per
/// peak without annotation.
pub fn write_summary<W: Write>(writer: W, reports: &[PeakReport]) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    for report in reports {
        let annotations = report.annotations();
        if annotations.is_empty() {
            csv_writer.serialize(SummaryRow {
                peak_mass: report.peak.mass,
                peak_intensity: report.peak.intensity,
                annotation: None,
                fragment_start: None,
                fragment_end: None,
                calculated_mass: None,
                mass_error: None,
                overall_modifications: None,
                modifications: None,
                method: None,
            })?;
            continue;
        }

        for (i, a) in annotations.iter().enumerate() {
            let method = a.method.to_string();
            csv_writer.serialize(SummaryRow {
                peak_mass: a.peak_mass,
                peak_intensity: a.peak_intensity,
                annotation: Some(i + 1),
                fragment_start: Some(a.fragment_start),
                fragment_end: Some(a.fragment_end),
                calculated_mass: Some(a.calculated_mass),
                mass_error: Some(a.mass_error()),
                overall_modifications: Some(counts(&a.overall_modifications)),
                modifications: Some(counts(&a.modifications)),
                method: Some(method.as_str()),
            })?;
        }
    }

    csv_writer.flush()?;
    Ok(())
}
