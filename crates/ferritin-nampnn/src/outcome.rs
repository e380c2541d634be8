//! Typed result of a request, and collection of the tool's output folder.
//!
//! Every request ends in exactly one `Outcome`. Its `Display` is the text shown to
//! users, so callers never need an error path of their own.
use crate::archive::SpecificityArchive;
use crate::config::{describe_duration, Mode};
use crate::fasta::DesignedSequences;
use crate::ppm::PpmTable;
use crate::runner::InvokeError;
use anyhow::{Context, Result};
use serde::Serialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Outcome {
    Sequences(DesignedSequences),
    Specificity(PpmTable),
    Empty(EmptyOutput),
    Failed(Failure),
}

/// The tool succeeded but left nothing to show. Not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyOutput {
    OutputDirMissing,
    NoFiles(Mode),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Failure {
    /// Non-zero exit.
    Inference { stderr: String },
    Timeout {
        #[serde(with = "humantime_serde")]
        after: Duration,
    },
    /// Anything else: validation, spawn errors, unreadable output.
    Internal { mode: Mode, message: String },
}

impl Failure {
    pub fn internal(mode: Mode, err: &anyhow::Error) -> Self {
        Failure::Internal {
            mode,
            message: format!("{err:#}"),
        }
    }

    pub fn from_invoke(mode: Mode, err: InvokeError) -> Self {
        match err {
            InvokeError::Failed { stderr, .. } => Failure::Inference { stderr },
            InvokeError::TimedOut(after) => Failure::Timeout { after },
            other => Failure::Internal {
                mode,
                message: other.to_string(),
            },
        }
    }
}

impl Outcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failed(_))
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Sequences(sequences) => sequences.fmt(f),
            Outcome::Specificity(table) => table.fmt(f),
            Outcome::Empty(empty) => empty.fmt(f),
            Outcome::Failed(failure) => failure.fmt(f),
        }
    }
}

impl fmt::Display for EmptyOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmptyOutput::OutputDirMissing => write!(
                f,
                "Output directory not created. Check if inference completed successfully."
            ),
            EmptyOutput::NoFiles(Mode::Design) => write!(f, "No sequence files generated."),
            EmptyOutput::NoFiles(Mode::Specificity) => {
                write!(f, "No specificity files generated.")
            }
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Failure::Inference { stderr } => write!(f, "Error running inference:\n{stderr}"),
            Failure::Timeout { after } => write!(
                f,
                "Error: Inference timed out after {}.",
                describe_duration(*after)
            ),
            Failure::Internal { mode, message } => {
                write!(f, "Error during {}: {message}", mode.label())
            }
        }
    }
}

/// Lexicographically first regular file in `dir` with extension `ext`.
pub fn first_file_with_extension(dir: &Path, ext: &str) -> Result<Option<PathBuf>> {
    let mut candidates = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("listing {}", dir.display()))? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|e| e == ext) {
            candidates.push(path);
        }
    }
    if candidates.len() > 1 {
        log::debug!(
            "{} .{ext} files in {}, using the first by name",
            candidates.len(),
            dir.display()
        );
    }
    Ok(candidates.into_iter().min())
}

fn collect(
    out_dir: &Path,
    mode: Mode,
    parse: impl FnOnce(&Path) -> Result<Outcome>,
) -> Result<Outcome> {
    let dir = out_dir.join(mode.output_subdir());
    if !dir.is_dir() {
        return Ok(Outcome::Empty(EmptyOutput::OutputDirMissing));
    }
    match first_file_with_extension(&dir, mode.output_extension())? {
        Some(path) => {
            log::info!("reading {}", path.display());
            parse(&path)
        }
        None => Ok(Outcome::Empty(EmptyOutput::NoFiles(mode))),
    }
}

/// Read `<out_dir>/seqs/*.fa`.
pub fn collect_design(out_dir: &Path) -> Result<Outcome> {
    collect(out_dir, Mode::Design, |path| {
        let fasta =
            fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        let sequences = DesignedSequences { fasta };
        log::info!("{} designed sequence record(s)", sequences.records().len());
        Ok(Outcome::Sequences(sequences))
    })
}

/// Read `<out_dir>/specificity/*.npz`.
pub fn collect_specificity(out_dir: &Path) -> Result<Outcome> {
    collect(out_dir, Mode::Specificity, |path| {
        let archive = SpecificityArchive::load(path)?;
        log::info!(
            "{} of {} positions are DNA",
            archive.num_dna_positions(),
            archive.num_positions()
        );
        Ok(Outcome::Specificity(PpmTable::from_archive(&archive)?))
    })
}
