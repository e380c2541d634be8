//! Request handlers.
//!
//! `run_design` / `run_specificity` return a typed [`Outcome`]; `design` / `specificity`
//! render it to text for direct display. None of them return an error: every failure
//! becomes an [`Outcome::Failed`].
//!
//! Each call owns a fresh scratch directory that is removed when the call returns,
//! whatever the outcome.
use crate::config::{Mode, ToolConfig};
use crate::outcome::{collect_design, collect_specificity, Failure, Outcome};
use crate::request::{DesignRequest, DesignSettings, SpecificityRequest};
use crate::runner::run_tool;
use anyhow::Result;
use std::ffi::OsString;
use std::path::Path;

async fn run_mode(
    config: &ToolConfig,
    mode: Mode,
    validate: Result<()>,
    build_args: impl FnOnce(&Path) -> Vec<OsString>,
    collect: fn(&Path) -> Result<Outcome>,
) -> Outcome {
    if let Err(e) = validate {
        return Outcome::Failed(Failure::internal(mode, &e));
    }
    let scratch = match config.scratch_dir() {
        Ok(dir) => dir,
        Err(e) => return Outcome::Failed(Failure::internal(mode, &e.into())),
    };
    log::debug!("{mode} scratch dir {}", scratch.path().display());

    let args = build_args(scratch.path());
    let outcome = match run_tool(config, &args).await {
        Ok(output) => {
            if !output.stdout.trim().is_empty() {
                log::debug!(
                    "{mode} tool output ({}):\n{}",
                    output.status,
                    output.stdout.trim_end()
                );
            }
            collect(scratch.path())
                .unwrap_or_else(|e| Outcome::Failed(Failure::internal(mode, &e)))
        }
        Err(e) => Outcome::Failed(Failure::from_invoke(mode, e)),
    };

    // explicit close so a failed cleanup is at least logged
    let path = scratch.path().to_path_buf();
    if let Err(e) = scratch.close() {
        log::warn!("failed to remove {}: {e}", path.display());
    }
    outcome
}

pub async fn run_design(config: &ToolConfig, request: &DesignRequest) -> Outcome {
    run_mode(
        config,
        Mode::Design,
        request.validate(),
        |out| request.to_args(config, out),
        collect_design,
    )
    .await
}

pub async fn run_specificity(config: &ToolConfig, request: &SpecificityRequest) -> Outcome {
    run_mode(
        config,
        Mode::Specificity,
        request.validate(),
        |out| request.to_args(config, out),
        collect_specificity,
    )
    .await
}

/// Design sequences for `structure`. Always returns displayable text.
pub async fn design(
    config: &ToolConfig,
    structure: &Path,
    temperature: f32,
    num_sequences: u32,
    seed: i64,
    na_only: bool,
) -> String {
    let request = DesignRequest::new(
        structure,
        DesignSettings {
            temperature,
            num_sequences,
            seed,
            na_only,
        },
    );
    run_design(config, &request).await.to_string()
}

/// Predict the DNA PPM for `structure`. Always returns displayable text.
pub async fn specificity(config: &ToolConfig, structure: &Path, na_only: bool) -> String {
    run_specificity(config, &SpecificityRequest::new(structure, na_only))
        .await
        .to_string()
}
