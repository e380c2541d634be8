use super::commands;
use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};
use ferritin_nampnn::config::{Mode, ToolConfig};
use ferritin_nampnn::request::{DesignSettings, TEMPERATURE_RANGE};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    tool: ToolArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Where the inference tool lives. Flags override the config file; unset values keep
/// the defaults (`python inference/run.py`, 5 minute timeout).
#[derive(Args, Debug, Clone)]
pub struct ToolArgs {
    /// JSON file with `ToolConfig` keys
    #[arg(long, global = true, env = "NAMPNN_CONFIG")]
    config: Option<PathBuf>,

    /// Interpreter or executable used to launch the tool
    #[arg(long, global = true, env = "NAMPNN_PROGRAM")]
    program: Option<PathBuf>,

    /// Script passed as the first argument to `program`
    #[arg(long, global = true, env = "NAMPNN_SCRIPT")]
    script: Option<PathBuf>,

    #[arg(long, global = true, env = "NAMPNN_MODEL_TYPE")]
    model_type: Option<String>,

    #[arg(long, global = true, env = "NAMPNN_DESIGN_CHECKPOINT")]
    design_checkpoint: Option<PathBuf>,

    #[arg(long, global = true, env = "NAMPNN_SPECIFICITY_CHECKPOINT")]
    specificity_checkpoint: Option<PathBuf>,

    /// e.g. `300s`, `5m`
    #[arg(long, global = true, env = "NAMPNN_TIMEOUT", value_parser = humantime::parse_duration)]
    timeout: Option<Duration>,

    /// Parent directory for per-request scratch folders
    #[arg(long, global = true, env = "NAMPNN_SCRATCH_ROOT")]
    scratch_root: Option<PathBuf>,

    /// Directory the tool is launched from
    #[arg(long, global = true, env = "NAMPNN_WORKING_DIR")]
    working_dir: Option<PathBuf>,
}

impl ToolArgs {
    pub fn resolve(&self) -> Result<ToolConfig> {
        let mut config = match &self.config {
            Some(path) => ToolConfig::from_json_file(path)?,
            None => ToolConfig::default(),
        };
        if let Some(program) = &self.program {
            config.program = program.clone();
        }
        if let Some(script) = &self.script {
            config.script = Some(script.clone());
        }
        if let Some(model_type) = &self.model_type {
            config.model_type = model_type.clone();
        }
        if let Some(path) = &self.design_checkpoint {
            config.design_checkpoint = path.clone();
        }
        if let Some(path) = &self.specificity_checkpoint {
            config.specificity_checkpoint = path.clone();
        }
        if let Some(timeout) = self.timeout {
            config.timeout = timeout;
        }
        if let Some(root) = &self.scratch_root {
            config.scratch_root = Some(root.clone());
        }
        if let Some(dir) = &self.working_dir {
            config.working_dir = Some(dir.clone());
        }
        if config.timeout.is_zero() {
            bail!("timeout must be greater than zero");
        }
        log::debug!("tool config: {config:?}");
        Ok(config)
    }
}

fn parse_temperature(value: &str) -> Result<f32, String> {
    let t: f32 = value.parse().map_err(|_| format!("{value:?} is not a number"))?;
    if TEMPERATURE_RANGE.contains(&t) {
        Ok(t)
    } else {
        Err(format!(
            "must be within {}..={}",
            TEMPERATURE_RANGE.start(),
            TEMPERATURE_RANGE.end()
        ))
    }
}

#[derive(Args, Debug, Clone)]
pub struct DesignArgs {
    /// Sampling temperature; lower is more conservative
    #[arg(long, default_value_t = 0.1, value_parser = parse_temperature)]
    temperature: f32,

    #[arg(long, default_value_t = 3, value_parser = clap::value_parser!(u32).range(1..))]
    num_sequences: u32,

    #[arg(long, default_value_t = 42, allow_negative_numbers = true)]
    seed: i64,

    /// Design nucleic acids only, keeping the protein fixed
    #[arg(long)]
    na_only: bool,
}

impl From<DesignArgs> for DesignSettings {
    fn from(args: DesignArgs) -> Self {
        DesignSettings {
            temperature: args.temperature,
            num_sequences: args.num_sequences,
            seed: args.seed,
            na_only: args.na_only,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Design sequences for a structure
    Design {
        #[arg(long, required = true)]
        structure: PathBuf,

        #[command(flatten)]
        settings: DesignArgs,

        /// Print the outcome as JSON
        #[arg(long)]
        json: bool,
    },
    /// Predict the DNA position probability matrix for a protein-DNA complex
    Specificity {
        #[arg(long, required = true)]
        structure: PathBuf,

        /// Predict for nucleic acids only
        #[arg(long)]
        na_only: bool,

        #[arg(long)]
        json: bool,
    },
    /// Run every `*.pdb` in a directory, writing `<stem>_<mode>.txt` per input
    Batch {
        #[arg(long, required = true)]
        input_dir: PathBuf,

        #[arg(long, required = true)]
        output_dir: PathBuf,

        #[arg(long, value_enum, default_value_t = Mode::Design)]
        mode: Mode,

        #[command(flatten)]
        settings: DesignArgs,
    },
    /// Extract (header, sequence) pairs from saved design output; `-` reads stdin
    Parse {
        input: PathBuf,

        #[arg(long)]
        json: bool,
    },
    /// Serve the web form
    Serve {
        #[arg(long, default_value = "127.0.0.1:7860", env = "NAMPNN_ADDR")]
        addr: SocketAddr,
    },
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Design {
                structure,
                settings,
                json,
            } => {
                let config = self.tool.resolve()?;
                commands::design::execute(&config, structure, settings.into(), json).await
            }
            Commands::Specificity {
                structure,
                na_only,
                json,
            } => {
                let config = self.tool.resolve()?;
                commands::specificity::execute(&config, structure, na_only, json).await
            }
            Commands::Batch {
                input_dir,
                output_dir,
                mode,
                settings,
            } => {
                let config = self.tool.resolve()?;
                commands::batch::execute(&config, input_dir, output_dir, mode, settings.into())
                    .await
            }
            Commands::Parse { input, json } => commands::parse::execute(input, json),
            Commands::Serve { addr } => {
                let config = self.tool.resolve()?;
                commands::serve::execute(config, addr).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_flags_override_defaults() {
        let cli = Cli::try_parse_from([
            "ferritin-nampnn",
            "--program",
            "python3",
            "--timeout",
            "90s",
            "specificity",
            "--structure",
            "x.pdb",
        ])
        .unwrap();
        let config = cli.tool.resolve().unwrap();
        assert_eq!(config.program, PathBuf::from("python3"));
        assert_eq!(config.timeout, Duration::from_secs(90));
        assert_eq!(config.script, Some(PathBuf::from("inference/run.py")));
    }

    #[test]
    fn test_temperature_bounds() {
        assert_eq!(parse_temperature("0.5"), Ok(0.5));
        assert!(parse_temperature("0.01").is_err());
        assert!(parse_temperature("hot").is_err());
    }
}
