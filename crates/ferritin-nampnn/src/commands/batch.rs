use ferritin_nampnn::{run_batch, DesignSettings, Mode, ToolConfig};
use std::path::PathBuf;

pub async fn execute(
    config: &ToolConfig,
    input_dir: PathBuf,
    output_dir: PathBuf,
    mode: Mode,
    settings: DesignSettings,
) -> anyhow::Result<()> {
    let written = run_batch(config, &input_dir, &output_dir, mode, &settings).await?;
    for path in &written {
        println!("{}", path.display());
    }
    log::info!(
        "batch complete: {} result(s) in {}",
        written.len(),
        output_dir.display()
    );
    Ok(())
}
