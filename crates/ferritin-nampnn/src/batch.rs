//! Run every structure file in a directory through one mode, one text file per input.
use crate::api::{run_design, run_specificity};
use crate::config::{Mode, ToolConfig};
use crate::request::{DesignRequest, DesignSettings, SpecificityRequest};
use anyhow::{Context, Result};
use itertools::Itertools;
use std::fs;
use std::path::{Path, PathBuf};

/// `*.pdb` files directly inside `dir`, sorted by name.
pub fn find_structures(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut structures = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("listing {}", dir.display()))? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|e| e == "pdb") {
            structures.push(path);
        }
    }
    Ok(structures.into_iter().sorted().collect())
}

/// `<output_dir>/<stem>_<mode>.txt`
pub fn output_path(output_dir: &Path, structure: &Path, mode: Mode) -> PathBuf {
    let stem = structure
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "structure".to_string());
    output_dir.join(format!("{stem}_{mode}.txt"))
}

/// Process `input_dir` sequentially and return the files written.
///
/// A failing structure still gets a result file (holding the failure text); only I/O
/// problems with the directories themselves abort the batch.
pub async fn run_batch(
    config: &ToolConfig,
    input_dir: &Path,
    output_dir: &Path,
    mode: Mode,
    settings: &DesignSettings,
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("creating {}", output_dir.display()))?;
    let structures = find_structures(input_dir)?;
    log::info!(
        "found {} PDB files in {}",
        structures.len(),
        input_dir.display()
    );

    let mut written = Vec::with_capacity(structures.len());
    for structure in &structures {
        log::info!("processing {}", structure.display());
        let outcome = match mode {
            Mode::Design => {
                run_design(config, &DesignRequest::new(structure, settings.clone())).await
            }
            Mode::Specificity => {
                run_specificity(
                    config,
                    &SpecificityRequest::new(structure, settings.na_only),
                )
                .await
            }
        };
        if outcome.is_failure() {
            log::warn!("{}: {outcome}", structure.display());
        }
        let path = output_path(output_dir, structure, mode);
        fs::write(&path, outcome.to_string())
            .with_context(|| format!("writing {}", path.display()))?;
        log::info!("saved to {}", path.display());
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_path() {
        let path = output_path(Path::new("/out"), Path::new("/in/4oqu.pdb"), Mode::Design);
        assert_eq!(path, PathBuf::from("/out/4oqu_design.txt"));
        let path = output_path(Path::new("out"), Path::new("1am9.pdb"), Mode::Specificity);
        assert_eq!(path, PathBuf::from("out/1am9_specificity.txt"));
    }

    #[test]
    fn test_find_structures_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.pdb", "a.pdb", "notes.txt", "c.cif"] {
            fs::write(dir.path().join(name), "").unwrap();
        }
        fs::create_dir(dir.path().join("nested.pdb")).unwrap();
        let found = find_structures(dir.path()).unwrap();
        let names: Vec<_> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["a.pdb", "b.pdb"]);
    }
}
