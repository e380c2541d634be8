use anyhow::Context;
use ferritin_nampnn::{parse_fasta_pairs, FastaRecord};
use std::io::Read;
use std::path::PathBuf;

const PREVIEW_RECORDS: usize = 3;
const PREVIEW_WIDTH: usize = 60;

fn preview(sequence: &str) -> String {
    if sequence.chars().count() > PREVIEW_WIDTH {
        let head: String = sequence.chars().take(PREVIEW_WIDTH).collect();
        format!("{head}...")
    } else {
        sequence.to_string()
    }
}

pub fn render(records: &[FastaRecord]) -> String {
    let mut out = format!("Extracted {} sequences:\n", records.len());
    for (i, record) in records.iter().take(PREVIEW_RECORDS).enumerate() {
        out.push_str(&format!(
            "\n{}. {}\n   {}\n",
            i + 1,
            record.header,
            preview(&record.sequence)
        ));
    }
    out
}

pub fn execute(input: PathBuf, json: bool) -> anyhow::Result<()> {
    let text = if input.as_os_str() == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("reading stdin")?;
        text
    } else {
        std::fs::read_to_string(&input).with_context(|| format!("reading {}", input.display()))?
    };
    let records = parse_fasta_pairs(&text);
    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
    } else {
        print!("{}", render(&records));
    }
    Ok(())
}
