//! # Residue Alphabet
//!
//! NA-MPNN writes protein, DNA and RNA residues in a single one-letter alphabet:
//!
//! - Protein: the 20 standard codes, `X` for unknown
//! - DNA: `a c g t`, `x` for unknown
//! - RNA: `b d h u`, `y` for unknown
//!
use strum::{Display, EnumIter, EnumString};

/// Protein one-letter codes plus the unknown-protein symbol. Specificity runs omit all
/// of them from sampling.
pub const PROTEIN_OMIT_AA: &str = "ARNDCQEGHILKMFPSTWYVX";

/// Appended to every successful design result. Independent of the request.
pub const SEQUENCE_LEGEND: &str = "\n\n## Sequence Legend:\n\
Protein residues: A, R, N, D, C, Q, E, G, H, I, L, K, M, F, P, S, T, W, Y, V\n\
DNA residues: a (DA), c (DC), g (DG), t (DT)\n\
RNA residues: b (A), d (C), h (G), u (U)\n\
Unknown: X (protein), x (DNA), y (RNA)\n";

/// DNA bases as named in the archive's `restype_to_int` map, in PPM column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, EnumIter)]
pub enum DnaBase {
    DA,
    DC,
    DG,
    DT,
}
