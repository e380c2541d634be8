//! ferritin-nampnn
//!
//! Run NA-MPNN (protein/nucleic-acid design and DNA specificity prediction) through its
//! command-line inference script, and turn what it writes into text.
//!
//! - `design`: sample sequences for a structure; returns FASTA plus a residue legend.
//! - `specificity`: predict the DNA position probability matrix; returns a Markdown table.
//!
//! The network itself is not part of this crate. Each request launches
//! `python inference/run.py ...` in a fresh scratch directory, waits for it with a
//! timeout and parses the output folder. Both entry points always return text.
//!
//! ```shell
//! ferritin-nampnn design --structure inference/examples/4oqu.pdb --num-sequences 3
//! ferritin-nampnn specificity --structure inference/examples/1am9.pdb --na-only
//! ferritin-nampnn serve --addr 127.0.0.1:7860
//! ```
pub mod alphabet;
pub mod api;
pub mod archive;
pub mod batch;
pub mod config;
pub mod fasta;
pub mod outcome;
pub mod ppm;
pub mod request;
pub mod runner;
pub mod web;

pub use api::{design, run_design, run_specificity, specificity};
pub use batch::run_batch;
pub use config::{Mode, ToolConfig};
pub use fasta::{parse_fasta_pairs, DesignedSequences, FastaRecord};
pub use outcome::{EmptyOutput, Failure, Outcome};
pub use ppm::{PpmRow, PpmTable};
pub use request::{DesignRequest, DesignSettings, SpecificityRequest};
