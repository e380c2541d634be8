//! Drive NA-MPNN from Rust.
//!
//! ```shell
//! cargo run --example usage -- /path/to/NA-MPNN
//! ```
//!
//! The argument is the NA-MPNN checkout (containing `inference/run.py`, `models/` and
//! `inference/examples/`). It defaults to the current directory.
use anyhow::Result;
use ferritin_nampnn::{
    design, parse_fasta_pairs, run_batch, specificity, DesignSettings, Mode, ToolConfig,
};
use std::path::{Path, PathBuf};

const RULE: &str = "============================================================";
const PREVIEW_CHARS: usize = 1000;

fn banner(title: &str) {
    println!("{RULE}\n{title}\n{RULE}");
}

fn truncated(text: &str) -> &str {
    match text.char_indices().nth(PREVIEW_CHARS) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

async fn design_mode(config: &ToolConfig, repo: &Path) -> String {
    banner("Example 1: Design Mode");
    let pdb = repo.join("inference/examples/4oqu.pdb");
    let result = design(config, &pdb, 0.1, 3, 12345, false).await;
    println!("\nDesign results for {}:", pdb.display());
    println!("{}", truncated(&result));
    println!("\n... (truncated)\n");
    result
}

async fn design_na_only(config: &ToolConfig, repo: &Path) {
    banner("Example 2: Design Mode (NA only)");
    let pdb = repo.join("inference/examples/4oqu.pdb");
    let result = design(config, &pdb, 0.2, 5, 42, true).await;
    println!("\nNA-only design results for {}:", pdb.display());
    println!("{}", truncated(&result));
    println!("\n... (truncated)\n");
}

async fn specificity_mode(config: &ToolConfig, repo: &Path) {
    banner("Example 3: Specificity Mode");
    let pdb = repo.join("inference/examples/1am9.pdb");
    let result = specificity(config, &pdb, true).await;
    println!("\nSpecificity predictions for {}:", pdb.display());
    println!("{result}\n");
}

async fn batch_mode(config: &ToolConfig, repo: &Path) -> Result<()> {
    banner("Example 4: Batch Processing");
    let settings = DesignSettings {
        num_sequences: 2,
        ..Default::default()
    };
    let written = run_batch(
        config,
        &repo.join("inference/examples"),
        Path::new("/tmp/na_mpnn_batch_output"),
        Mode::Design,
        &settings,
    )
    .await?;
    for path in &written {
        println!("  Saved to {}", path.display());
    }
    println!("\nBatch processing complete! Results in /tmp/na_mpnn_batch_output\n");
    Ok(())
}

fn parse_mode(design_output: &str) {
    banner("Example 5: Parse FASTA Output");
    let records = parse_fasta_pairs(design_output);
    println!("\nExtracted {} sequences:", records.len());
    for (i, record) in records.iter().take(3).enumerate() {
        println!("\n{}. {}", i + 1, record.header);
        let preview: String = record.sequence.chars().take(60).collect();
        let ellipsis = if record.sequence.chars().count() > 60 { "..." } else { "" };
        println!("   {preview}{ellipsis}");
    }
    println!();
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let repo = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    let config = ToolConfig {
        working_dir: Some(repo.clone()),
        ..Default::default()
    };

    println!("\nNA-MPNN usage examples\n");
    let designed = design_mode(&config, &repo).await;
    design_na_only(&config, &repo).await;
    specificity_mode(&config, &repo).await;
    batch_mode(&config, &repo).await?;
    parse_mode(&designed);
    println!("{RULE}\nAll examples completed!\n{RULE}");
    Ok(())
}
