//! Designed sequences and FASTA pairing.
use crate::alphabet::SEQUENCE_LEGEND;
use serde::Serialize;
use std::fmt;

/// FASTA text exactly as the tool wrote it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DesignedSequences {
    pub fasta: String,
}

impl DesignedSequences {
    pub fn records(&self) -> Vec<FastaRecord> {
        parse_fasta_pairs(&self.fasta)
    }
}

impl fmt::Display for DesignedSequences {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.fasta, SEQUENCE_LEGEND)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FastaRecord {
    pub header: String,
    pub sequence: String,
}

impl From<(&str, &str)> for FastaRecord {
    fn from((header, sequence): (&str, &str)) -> Self {
        Self {
            header: header.to_string(),
            sequence: sequence.to_string(),
        }
    }
}

/// Pair each `>` header with the line right after it.
///
/// A header followed by another header (or by nothing) is skipped. Lines that are
/// neither headers nor directly after one, such as the legend, are ignored.
pub fn parse_fasta_pairs(text: &str) -> Vec<FastaRecord> {
    let lines: Vec<&str> = text.trim().lines().collect();
    let mut records = Vec::new();
    let mut i = 0;
    while i < lines.len() {
        match lines[i].strip_prefix('>') {
            Some(header) => match lines.get(i + 1) {
                Some(next) if !next.starts_with('>') => {
                    records.push(FastaRecord::from((header, *next)));
                    i += 2;
                }
                _ => i += 1,
            },
            None => i += 1,
        }
    }
    records
}
