//! Requests and their translation into the inference tool's command line.
//!
//! The tool's flags are fixed per mode: design asks for sequences only, specificity asks
//! for the PPM archive only and omits every protein residue from sampling.
use crate::alphabet::PROTEIN_OMIT_AA;
use crate::config::{Mode, ToolConfig};
use anyhow::{ensure, Result};
use std::ffi::OsString;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

pub const TEMPERATURE_RANGE: RangeInclusive<f32> = 0.05..=1.0;

/// Sampling settings for a design run.
#[derive(Debug, Clone, PartialEq)]
pub struct DesignSettings {
    pub temperature: f32,
    pub num_sequences: u32,
    pub seed: i64,
    pub na_only: bool,
}

impl Default for DesignSettings {
    fn default() -> Self {
        Self {
            temperature: 0.1,
            num_sequences: 3,
            seed: 42,
            na_only: false,
        }
    }
}

impl DesignSettings {
    pub fn validate(&self) -> Result<()> {
        ensure!(
            TEMPERATURE_RANGE.contains(&self.temperature),
            "temperature {} is outside {}..={}",
            self.temperature,
            TEMPERATURE_RANGE.start(),
            TEMPERATURE_RANGE.end()
        );
        ensure!(
            self.num_sequences > 0,
            "number of sequences must be at least 1"
        );
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct DesignRequest {
    pub structure: PathBuf,
    pub settings: DesignSettings,
}

#[derive(Debug, Clone)]
pub struct SpecificityRequest {
    pub structure: PathBuf,
    pub na_only: bool,
}

/// The tool may run from `working_dir`, so relative paths are resolved against ours first.
fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Flags shared by both modes.
fn common_args(config: &ToolConfig, mode: Mode, structure: &Path, out_folder: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = Vec::with_capacity(24);
    args.push("--model_type".into());
    args.push(config.model_type.clone().into());
    args.push("--mode".into());
    args.push(mode.to_string().into());
    args.push("--checkpoint_na_mpnn".into());
    args.push(config.checkpoint(mode).into());
    args.push("--pdb_path".into());
    args.push(absolute(structure).into());
    args.push("--out_folder".into());
    args.push(absolute(out_folder).into());
    args
}

fn push_flag(args: &mut Vec<OsString>, name: &str, value: impl ToString) {
    args.push(name.into());
    args.push(value.to_string().into());
}

impl DesignRequest {
    pub fn new(structure: impl Into<PathBuf>, settings: DesignSettings) -> Self {
        Self {
            structure: structure.into(),
            settings,
        }
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.structure.is_file(),
            "structure file not found: {}",
            self.structure.display()
        );
        self.settings.validate()
    }

    pub fn to_args(&self, config: &ToolConfig, out_folder: &Path) -> Vec<OsString> {
        let settings = &self.settings;
        let mut args = common_args(config, Mode::Design, &self.structure, out_folder);
        push_flag(&mut args, "--temperature", settings.temperature);
        push_flag(&mut args, "--batch_size", settings.num_sequences);
        push_flag(&mut args, "--seed", settings.seed);
        push_flag(&mut args, "--output_pdbs", 0);
        push_flag(&mut args, "--output_sequences", 1);
        push_flag(&mut args, "--output_specificity", 0);
        if settings.na_only {
            push_flag(&mut args, "--design_na_only", 1);
        }
        args
    }
}

impl SpecificityRequest {
    pub fn new(structure: impl Into<PathBuf>, na_only: bool) -> Self {
        Self {
            structure: structure.into(),
            na_only,
        }
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.structure.is_file(),
            "structure file not found: {}",
            self.structure.display()
        );
        Ok(())
    }

    pub fn to_args(&self, config: &ToolConfig, out_folder: &Path) -> Vec<OsString> {
        let mut args = common_args(config, Mode::Specificity, &self.structure, out_folder);
        push_flag(&mut args, "--output_pdbs", 0);
        push_flag(&mut args, "--output_sequences", 0);
        push_flag(&mut args, "--output_specificity", 1);
        push_flag(&mut args, "--omit_AA", PROTEIN_OMIT_AA);
        if self.na_only {
            push_flag(&mut args, "--design_na_only", 1);
        }
        args
    }
}
