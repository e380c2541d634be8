//! Form submissions through the router, against a fake inference tool.
#![cfg(unix)]

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use ferritin_nampnn::web::router;
use ferritin_nampnn::ToolConfig;
use ferritin_test_data::{FakeTool, SpecificityFixture, TestFile, DESIGN_FASTA};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tower::ServiceExt;

const BOUNDARY: &str = "nampnn-form-boundary";

fn config_for(tool: &FakeTool) -> ToolConfig {
    ToolConfig {
        program: "sh".into(),
        script: Some(tool.script().to_path_buf()),
        timeout: Duration::from_secs(30),
        ..Default::default()
    }
}

/// A `multipart/form-data` body with text fields and an optional `structure` upload.
fn form(fields: &[(&str, &str)], structure: Option<&[u8]>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some(bytes) = structure {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"structure\"; \
                 filename=\"4oqu.pdb\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

async fn post(config: ToolConfig, uri: &str, body: Vec<u8>) -> (StatusCode, String) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap();
    let response = router(config).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

fn value_of(args: &[String], flag: &str) -> Option<String> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

#[tokio::test]
async fn test_design_form_upload_reaches_tool() {
    let kept = tempfile::tempdir().unwrap();
    let copy = kept.path().join("seen.pdb");
    let tool = FakeTool::keeps_structure(&copy, &[("upload.fa", DESIGN_FASTA)]).unwrap();
    let pdb = TestFile::dna_complex_01();

    let body = form(
        &[
            ("temperature", "0.2"),
            ("num_sequences", "5"),
            ("seed", "12345"),
            ("na_only", "on"),
        ],
        Some(pdb.bytes()),
    );
    let (status, text) = post(config_for(&tool), "/design", body).await;

    assert_eq!(status, StatusCode::OK);
    assert!(text.starts_with(DESIGN_FASTA), "{text}");
    assert!(text.contains("## Sequence Legend:"));

    let args = tool.recorded_args().unwrap();
    let pdb_path = value_of(&args, "--pdb_path").unwrap();
    assert!(pdb_path.ends_with(".pdb"));
    assert_eq!(fs::read(&copy).unwrap(), pdb.bytes());
    assert_eq!(value_of(&args, "--temperature").as_deref(), Some("0.2"));
    assert_eq!(value_of(&args, "--batch_size").as_deref(), Some("5"));
    assert_eq!(value_of(&args, "--seed").as_deref(), Some("12345"));
    assert_eq!(value_of(&args, "--design_na_only").as_deref(), Some("1"));

    // the upload lives only as long as the request
    assert!(!Path::new(&pdb_path).exists());
}

#[tokio::test]
async fn test_design_form_defaults() {
    let tool = FakeTool::writes_sequences(&[("upload.fa", DESIGN_FASTA)]).unwrap();
    let body = form(&[], Some(TestFile::dna_complex_01().bytes()));
    let (status, _) = post(config_for(&tool), "/design", body).await;

    assert_eq!(status, StatusCode::OK);
    let args = tool.recorded_args().unwrap();
    assert_eq!(value_of(&args, "--temperature").as_deref(), Some("0.1"));
    assert_eq!(value_of(&args, "--batch_size").as_deref(), Some("3"));
    assert_eq!(value_of(&args, "--seed").as_deref(), Some("42"));
    assert!(!args.iter().any(|a| a == "--design_na_only"));
}

#[tokio::test]
async fn test_specificity_form() {
    let fixtures = tempfile::tempdir().unwrap();
    let npz = fixtures.path().join("fixture.npz");
    SpecificityFixture::example_01().write_npz(&npz).unwrap();
    let tool = FakeTool::writes_archive(&npz, "upload.npz").unwrap();

    let body = form(&[], Some(TestFile::dna_complex_01().bytes()));
    let (status, text) = post(config_for(&tool), "/specificity", body).await;

    assert_eq!(status, StatusCode::OK);
    assert!(text.starts_with("## Predicted DNA Position Probability Matrix (PPM)\n"));
    assert!(text.contains("1 | 0.7000 | 0.1000 | 0.1000 | 0.1000\n"));
    assert!(text.ends_with("Total DNA positions: 3\n"));

    let args = tool.recorded_args().unwrap();
    assert_eq!(value_of(&args, "--mode").as_deref(), Some("specificity"));
    assert!(!args.iter().any(|a| a == "--design_na_only"));
}

#[tokio::test]
async fn test_missing_structure_is_rejected() {
    let tool = FakeTool::writes_nothing().unwrap();
    let body = form(&[("na_only", "on")], None);
    let (status, text) = post(config_for(&tool), "/specificity", body).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(text, "Invalid request: no PDB file uploaded");
    assert!(tool.recorded_args().is_err());
}

#[tokio::test]
async fn test_non_numeric_field_is_rejected() {
    let tool = FakeTool::writes_nothing().unwrap();
    let body = form(
        &[("num_sequences", "three")],
        Some(TestFile::dna_complex_01().bytes()),
    );
    let (status, text) = post(config_for(&tool), "/design", body).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(text.contains("num_sequences"), "{text}");
    assert!(tool.recorded_args().is_err());
}

#[tokio::test]
async fn test_out_of_range_temperature_is_reported() {
    let tool = FakeTool::writes_nothing().unwrap();
    let body = form(
        &[("temperature", "5")],
        Some(TestFile::dna_complex_01().bytes()),
    );
    let (status, text) = post(config_for(&tool), "/design", body).await;

    assert_eq!(status, StatusCode::OK);
    assert!(text.starts_with("Error during design: temperature"), "{text}");
    assert!(tool.recorded_args().is_err());
}
