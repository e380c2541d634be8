//! DNA position probability matrix.
use crate::alphabet::DnaBase;
use crate::archive::SpecificityArchive;
use anyhow::{anyhow, ensure, Result};
use itertools::Itertools;
use serde::Serialize;
use std::fmt;
use strum::IntoEnumIterator;

/// One DNA position. `position` is 1-based over DNA positions only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PpmRow {
    pub position: usize,
    /// DA, DC, DG, DT
    pub probabilities: [f64; 4],
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PpmTable {
    pub rows: Vec<PpmRow>,
}

impl PpmTable {
    /// Subset the full PPM to DNA positions and the four DNA base columns.
    ///
    /// Columns are located through the archive's own `restype_to_int`; the tool's
    /// residue ordering is not fixed across versions. Rows stay in archive order.
    pub fn from_archive(archive: &SpecificityArchive) -> Result<Self> {
        let ppm = &archive.predicted_ppm;
        ensure!(
            archive.dna_mask.len() == ppm.nrows(),
            "dna_mask has {} entries but predicted_ppm has {} positions",
            archive.dna_mask.len(),
            ppm.nrows()
        );

        let columns: Vec<usize> = DnaBase::iter()
            .map(|base| -> Result<usize> {
                let symbol = base.to_string();
                let index = *archive
                    .restype_to_int
                    .get(&symbol)
                    .ok_or_else(|| anyhow!("restype_to_int has no entry for {symbol}"))?;
                ensure!(
                    index < ppm.ncols(),
                    "{symbol} maps to column {index} but predicted_ppm has {} columns",
                    ppm.ncols()
                );
                Ok(index)
            })
            .collect::<Result<_>>()?;

        let rows = ppm
            .outer_iter()
            .zip(archive.dna_mask.iter())
            .filter(|(_, is_dna)| **is_dna)
            .enumerate()
            .map(|(i, (row, _))| PpmRow {
                position: i + 1,
                probabilities: [
                    row[columns[0]],
                    row[columns[1]],
                    row[columns[2]],
                    row[columns[3]],
                ],
            })
            .collect();

        Ok(Self { rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl fmt::Display for PpmTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "## Predicted DNA Position Probability Matrix (PPM)")?;
        writeln!(f)?;
        writeln!(f, "Position | {}", DnaBase::iter().join(" | "))?;
        writeln!(f, "---------|----|----|----|----")?;
        for row in &self.rows {
            writeln!(
                f,
                "{} | {}",
                row.position,
                row.probabilities
                    .iter()
                    .map(|p| format!("{p:.4}"))
                    .join(" | ")
            )?;
        }
        write!(f, "\n\nTotal DNA positions: {}\n", self.rows.len())
    }
}
