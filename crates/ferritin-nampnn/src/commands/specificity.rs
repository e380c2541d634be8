use ferritin_nampnn::{run_specificity, SpecificityRequest, ToolConfig};
use std::path::PathBuf;

pub async fn execute(
    config: &ToolConfig,
    structure: PathBuf,
    na_only: bool,
    json: bool,
) -> anyhow::Result<()> {
    log::info!("predicting specificity for {}", structure.display());
    let outcome = run_specificity(config, &SpecificityRequest::new(structure, na_only)).await;
    super::emit(&outcome, json)
}
