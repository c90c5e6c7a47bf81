use anyhow::*;
use std::path::Path;

use crate::io::reader::TextReader;

#[derive(Clone, PartialEq, Debug)]
pub struct FastaEntry {
    pub header: String,
    pub sequence: String,
}

impl FastaEntry {
    /// First word of the header.
    pub fn accession(&self) -> &str {
        self.header.split_ascii_whitespace().next().unwrap_or("")
    }

    /// Matches the whole accession or one of its `|` separated parts,
    /// so both `P02769` and `sp|P02769|ALBU_BOVIN` select a UniProt entry.
    pub fn matches_accession(&self, accession: &str) -> bool {
        let own = self.accession();
        own == accession || own.split('|').any(|part| part == accession)
    }
}

/// Calls `cb` with every entry of the file, in file order, until it returns `false`.
pub fn for_each_fasta_entry<F>(path: impl AsRef<Path>, mut cb: F) -> Result<()>
where
    F: FnMut(FastaEntry) -> bool,
{
    let path = path.as_ref();
    let text_reader = TextReader::open(path, 1024 * 1024)
        .with_context(|| format!("can't open FASTA file {}", path.display()))?;

    let mut header: Option<String> = None;
    let mut sequence = String::with_capacity(64 * 1024);

    for line in text_reader {
        let (_, line) = line?;

        if let Some(next_header) = line.strip_prefix('>') {
            if let Some(header) = header.take() {
                if !cb(FastaEntry { header, sequence: std::mem::take(&mut sequence) }) {
                    return Ok(());
                }
            }
            header = Some(next_header.trim().to_string());
        } else if header.is_some() {
            sequence.push_str(line.trim());
        } else if !line.trim().is_empty() {
            bail!("{}: sequence data found before the first FASTA header", path.display());
        }
    }

    if let Some(header) = header {
        cb(FastaEntry { header, sequence });
    }

    Ok(())
}

/// Returns the sequence of the first entry whose accession matches.
pub fn find_fasta_sequence(path: impl AsRef<Path>, accession: &str) -> Result<Option<FastaEntry>> {
    let mut found = None;

    for_each_fasta_entry(path, |entry| {
        if entry.matches_accession(accession) {
            found = Some(entry);
            return false;
        }
        true
    })?;

    Ok(found)
}
