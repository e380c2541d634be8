use assert_cmd::Command;
use ferritin_test_data::{FakeTool, SpecificityFixture, TestFile, DESIGN_FASTA};
use std::fs;

#[test]
fn test_cli_parse_command() {
    let dir = tempfile::tempdir().unwrap();
    let saved = dir.path().join("4oqu_design.txt");
    fs::write(&saved, format!("{DESIGN_FASTA}\n\n## Sequence Legend:\nDNA residues: a\n")).unwrap();

    let mut cmd = Command::cargo_bin("ferritin-nampnn").unwrap();
    cmd.arg("parse").arg(&saved);

    let assert = cmd.assert().success();
    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).into_owned();
    assert!(stdout.starts_with("Extracted 3 sequences:\n"));
    assert!(stdout.contains("   ARKacg\n"));
    assert!(stdout.contains("3. dna_complex, id=2"));
}

#[test]
fn test_cli_parse_json_from_stdin() {
    let mut cmd = Command::cargo_bin("ferritin-nampnn").unwrap();
    cmd.arg("parse")
        .arg("-")
        .arg("--json")
        .write_stdin(">h1\n>h2\nCCCC\n");

    let assert = cmd.assert().success();
    let records: serde_json::Value = serde_json::from_slice(&assert.get_output().stdout).unwrap();
    assert_eq!(
        records,
        serde_json::json!([{ "header": "h2", "sequence": "CCCC" }])
    );
}

#[test]
fn test_cli_rejects_out_of_range_temperature() {
    let mut cmd = Command::cargo_bin("ferritin-nampnn").unwrap();
    cmd.arg("design")
        .arg("--structure")
        .arg("x.pdb")
        .arg("--temperature")
        .arg("2.0");
    cmd.assert().failure();
}

#[cfg(unix)]
#[test]
fn test_cli_design_command() {
    let (pdbfile, _tmp) = TestFile::dna_complex_01().create_temp().unwrap();
    let tool = FakeTool::writes_sequences(&[("dna_complex.fa", DESIGN_FASTA)]).unwrap();
    let mut cmd = Command::cargo_bin("ferritin-nampnn").unwrap();

    cmd.arg("--program")
        .arg("sh")
        .arg("--script")
        .arg(tool.script())
        .arg("design")
        .arg("--structure")
        .arg(&pdbfile)
        .arg("--temperature")
        .arg("0.2")
        .arg("--num-sequences")
        .arg("5")
        .arg("--seed")
        .arg("12345")
        .arg("--na-only");

    let assert = cmd.assert().success();
    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).into_owned();
    assert!(stdout.starts_with(DESIGN_FASTA));
    assert!(stdout.contains("## Sequence Legend:"));

    let args = tool.recorded_args().unwrap();
    let i = args.iter().position(|a| a == "--batch_size").unwrap();
    assert_eq!(args[i + 1], "5");
    assert!(args.iter().any(|a| a == "--design_na_only"));
}

#[cfg(unix)]
#[test]
fn test_cli_specificity_json() {
    let (pdbfile, _tmp) = TestFile::dna_complex_01().create_temp().unwrap();
    let fixtures = tempfile::tempdir().unwrap();
    let npz = fixtures.path().join("fixture.npz");
    SpecificityFixture::example_01().write_npz(&npz).unwrap();
    let tool = FakeTool::writes_archive(&npz, "dna_complex.npz").unwrap();
    let mut cmd = Command::cargo_bin("ferritin-nampnn").unwrap();

    cmd.arg("--program")
        .arg("sh")
        .arg("--script")
        .arg(tool.script())
        .arg("specificity")
        .arg("--structure")
        .arg(&pdbfile)
        .arg("--json");

    let assert = cmd.assert().success();
    let outcome: serde_json::Value = serde_json::from_slice(&assert.get_output().stdout).unwrap();
    assert_eq!(outcome["kind"], "specificity");
    let rows = outcome["value"]["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0]["position"], 1);
}

#[cfg(unix)]
#[test]
fn test_cli_failure_exits_nonzero() {
    let (pdbfile, _tmp) = TestFile::dna_complex_01().create_temp().unwrap();
    let tool = FakeTool::fails("CUDA out of memory", 1).unwrap();
    let mut cmd = Command::cargo_bin("ferritin-nampnn").unwrap();

    cmd.arg("--program")
        .arg("sh")
        .arg("--script")
        .arg(tool.script())
        .arg("specificity")
        .arg("--structure")
        .arg(&pdbfile);

    let assert = cmd.assert().failure();
    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).into_owned();
    assert_eq!(stdout, "Error running inference:\nCUDA out of memory\n");
}

#[cfg(unix)]
#[test]
fn test_cli_timeout_leaves_no_scratch() {
    let (pdbfile, _tmp) = TestFile::dna_complex_01().create_temp().unwrap();
    let tool = FakeTool::sleeps(30).unwrap();
    let scratch = tempfile::tempdir().unwrap();
    let mut cmd = Command::cargo_bin("ferritin-nampnn").unwrap();

    cmd.arg("--program")
        .arg("sh")
        .arg("--script")
        .arg(tool.script())
        .arg("--timeout")
        .arg("1s")
        .arg("--scratch-root")
        .arg(scratch.path())
        .arg("design")
        .arg("--structure")
        .arg(&pdbfile);

    let assert = cmd.assert().failure();
    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).into_owned();
    assert_eq!(stdout, "Error: Inference timed out after 1 second.\n");
    assert_eq!(fs::read_dir(scratch.path()).unwrap().count(), 0);
}

#[cfg(unix)]
#[test]
fn test_cli_batch_command() {
    let inputs = tempfile::tempdir().unwrap();
    for name in ["a.pdb", "b.pdb"] {
        TestFile::dna_complex_01().write_to(inputs.path(), name).unwrap();
    }
    let outputs = tempfile::tempdir().unwrap();
    let tool = FakeTool::writes_sequences(&[("x.fa", DESIGN_FASTA)]).unwrap();
    let mut cmd = Command::cargo_bin("ferritin-nampnn").unwrap();

    cmd.arg("--program")
        .arg("sh")
        .arg("--script")
        .arg(tool.script())
        .arg("batch")
        .arg("--input-dir")
        .arg(inputs.path())
        .arg("--output-dir")
        .arg(outputs.path())
        .arg("--num-sequences")
        .arg("2");

    cmd.assert().success();
    assert!(outputs.path().join("a_design.txt").exists());
    assert!(outputs.path().join("b_design.txt").exists());
    assert_eq!(fs::read_dir(outputs.path()).unwrap().count(), 2);
}
