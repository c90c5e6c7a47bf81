use anyhow::*;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use specannotate::chemistry::table::{ModificationCatalog, BIOMOLECULE_ATOM_TABLE, DEFAULT_MODIFICATION_CATALOG};
use specannotate::config::AnnotationConfig;
use specannotate::io::cache::{BincodeStore, CombinationStore, NoStore};
use specannotate::io::peaklist::read_peak_list;
use specannotate::io::report::{write_peak_reports, write_summary};
use specannotate::sample::Sample;

fn load_catalog(path: &Path) -> Result<ModificationCatalog> {
    let file = File::open(path).with_context(|| format!("can't open modification catalog {}", path.display()))?;
    ModificationCatalog::from_csv_reader(file, &BIOMOLECULE_ATOM_TABLE)
        .with_context(|| format!("invalid modification catalog {}", path.display()))
}

fn run(config_path: &str) -> Result<()> {
    let config = AnnotationConfig::load(config_path)?;
    log::info!("annotating protein {} with {}", config.protein_id, config.annotation_method);

    let custom_catalog;
    let catalog = match &config.modifications {
        Some(path) => {
            custom_catalog = load_catalog(path)?;
            &custom_catalog
        }
        None => &*DEFAULT_MODIFICATION_CATALOG,
    };

    let sample = Sample::from_config(&config, catalog)?;

    let peakfile = config
        .peakfile
        .as_ref()
        .ok_or_else(|| anyhow!("no peakfile given in {}", config_path))?;
    let peaks = read_peak_list(peakfile, config.peakfile_format)?;

    let mut store: Box<dyn CombinationStore> = match &config.cache {
        Some(path) => Box::new(BincodeStore::open(path)?),
        None => Box::new(NoStore),
    };

    let reports = sample.annotate(&peaks, store.as_mut())?;

    match &config.outputdir {
        Some(dir) => {
            let written = write_peak_reports(dir, &reports, config.annotation_method, config.search_range)?;
            log::info!("{} report files written to {}", written.len(), dir.display());

            let summary_path = dir.join(format!("summary.{}.csv", config.annotation_method.report_suffix()));
            let summary = File::create(&summary_path)
                .with_context(|| format!("can't create summary file {}", summary_path.display()))?;
            write_summary(BufWriter::new(summary), &reports)?;
        }
        None => write_summary(std::io::stdout().lock(), &reports)?,
    }

    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();

    let config_path = std::env::args()
        .nth(1)
        .ok_or_else(|| anyhow!("usage: specannotate <config.json>"))?;

    run(&config_path)
}
