pub mod cache;
pub mod fasta;
pub mod peaklist;
pub mod reader;
pub mod report;
