pub mod batch;
pub mod design;
pub mod parse;
pub mod serve;
pub mod specificity;

use anyhow::Result;
use ferritin_nampnn::Outcome;

/// Print an outcome as text (or JSON) on stdout; a failed outcome becomes a non-zero exit.
pub(crate) fn emit(outcome: &Outcome, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(outcome)?);
    } else {
        let text = outcome.to_string();
        if text.ends_with('\n') {
            print!("{text}");
        } else {
            println!("{text}");
        }
    }
    if outcome.is_failure() {
        anyhow::bail!("inference did not complete");
    }
    Ok(())
}
