use ferritin_nampnn::{run_design, DesignRequest, DesignSettings, ToolConfig};
use std::path::PathBuf;

pub async fn execute(
    config: &ToolConfig,
    structure: PathBuf,
    settings: DesignSettings,
    json: bool,
) -> anyhow::Result<()> {
    log::info!(
        "designing {} sequence(s) for {} at T={}",
        settings.num_sequences,
        structure.display(),
        settings.temperature
    );
    let outcome = run_design(config, &DesignRequest::new(structure, settings)).await;
    super::emit(&outcome, json)
}
