use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use strum::{Display, EnumString};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Inference mode, passed to the tool as `--mode`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, clap::ValueEnum,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Design,
    Specificity,
}

impl Mode {
    /// Used in "Error during ..." messages.
    pub fn label(&self) -> &'static str {
        match self {
            Mode::Design => "design",
            Mode::Specificity => "specificity prediction",
        }
    }

    /// Subdirectory of the output folder holding this mode's artifacts.
    pub fn output_subdir(&self) -> &'static str {
        match self {
            Mode::Design => "seqs",
            Mode::Specificity => "specificity",
        }
    }

    pub fn output_extension(&self) -> &'static str {
        match self {
            Mode::Design => "fa",
            Mode::Specificity => "npz",
        }
    }
}

/// How to reach the external inference tool.
///
/// The tool is run as `<program> [<script>] <args...>`, from `working_dir` when set.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    pub program: PathBuf,
    pub script: Option<PathBuf>,
    pub model_type: String,
    pub design_checkpoint: PathBuf,
    pub specificity_checkpoint: PathBuf,
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
    /// Parent directory for per-request scratch folders. System temp dir when unset.
    pub scratch_root: Option<PathBuf>,
    pub working_dir: Option<PathBuf>,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from("python"),
            script: Some(PathBuf::from("inference/run.py")),
            model_type: "na_mpnn".to_string(),
            design_checkpoint: PathBuf::from("./models/design_model/s_19137.pt"),
            specificity_checkpoint: PathBuf::from("./models/specificity_model/s_70114.pt"),
            timeout: DEFAULT_TIMEOUT,
            scratch_root: None,
            working_dir: None,
        }
    }
}

impl ToolConfig {
    /// Load from a JSON file. Missing keys keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn checkpoint(&self, mode: Mode) -> &Path {
        match mode {
            Mode::Design => &self.design_checkpoint,
            Mode::Specificity => &self.specificity_checkpoint,
        }
    }

    /// A fresh scratch directory, removed when the handle drops.
    pub fn scratch_dir(&self) -> std::io::Result<tempfile::TempDir> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("nampnn-");
        match &self.scratch_root {
            Some(root) => builder.tempdir_in(root),
            None => builder.tempdir(),
        }
    }
}

/// "5 minutes", "1 minute", "90 seconds".
pub fn describe_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    let plural = |n: u64, unit: &str| {
        if n == 1 {
            format!("1 {unit}")
        } else {
            format!("{n} {unit}s")
        }
    };
    if secs >= 60 && secs % 60 == 0 {
        plural(secs / 60, "minute")
    } else if secs > 0 {
        plural(secs, "second")
    } else {
        format!("{} ms", duration.as_millis())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ToolConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(300));
        assert_eq!(config.model_type, "na_mpnn");
        assert_eq!(
            config.checkpoint(Mode::Specificity),
            Path::new("./models/specificity_model/s_70114.pt")
        );
    }

    #[test]
    fn test_partial_json_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"program": "python3", "timeout": "90s"}}"#).unwrap();
        let config = ToolConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.program, PathBuf::from("python3"));
        assert_eq!(config.timeout, Duration::from_secs(90));
        assert_eq!(config.script, Some(PathBuf::from("inference/run.py")));
    }

    #[test]
    fn test_mode_names() {
        assert_eq!(Mode::Design.to_string(), "design");
        assert_eq!(Mode::Specificity.to_string(), "specificity");
        assert_eq!(Mode::Specificity.label(), "specificity prediction");
    }

    #[test]
    fn test_describe_duration() {
        assert_eq!(describe_duration(Duration::from_secs(300)), "5 minutes");
        assert_eq!(describe_duration(Duration::from_secs(60)), "1 minute");
        assert_eq!(describe_duration(Duration::from_secs(90)), "90 seconds");
        assert_eq!(describe_duration(Duration::from_secs(1)), "1 second");
        assert_eq!(describe_duration(Duration::from_millis(250)), "250 ms");
    }

    #[test]
    fn test_scratch_dir_removed_on_drop() {
        let root = tempfile::tempdir().unwrap();
        let config = ToolConfig {
            scratch_root: Some(root.path().to_path_buf()),
            ..Default::default()
        };
        let scratch = config.scratch_dir().unwrap();
        assert!(scratch.path().starts_with(root.path()));
        drop(scratch);
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }
}
