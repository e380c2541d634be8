//! Web form for design and specificity runs.
//!
//! - `GET /`: HTML page with both forms
//! - `POST /design`: multipart `structure`, `temperature`, `num_sequences`, `seed`, `na_only`
//! - `POST /specificity`: multipart `structure`, `na_only`
//! - `GET /health`: `OK`
//!
//! Results come back as `text/plain`, exactly the text the CLI prints.
use crate::api::{run_design, run_specificity};
use crate::config::ToolConfig;
use crate::request::{DesignRequest, DesignSettings, SpecificityRequest};
use anyhow::Result;
use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Router,
};
use std::io::Write;
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;
use tempfile::NamedTempFile;

const MAX_UPLOAD_BYTES: usize = 64 * 1024 * 1024;

const INDEX_HTML: &str = r#"<!doctype html>
<html>
<head>
<meta charset="utf-8">
<title>NA-MPNN: Protein-Nucleic Acid Design and Specificity Prediction</title>
<style>
body { font-family: sans-serif; max-width: 52rem; margin: 2rem auto; }
fieldset { margin-bottom: 1.5rem; }
label { display: block; margin: 0.4rem 0; }
</style>
</head>
<body>
<h1>NA-MPNN: Protein-Nucleic Acid Design and Specificity Prediction</h1>
<p>Upload a PDB file and choose a mode. Results are returned as plain text.</p>

<form action="/design" method="post" enctype="multipart/form-data">
<fieldset>
<legend>Design Mode</legend>
<p>Design protein and/or nucleic acid sequences for a backbone structure.</p>
<label>PDB file <input type="file" name="structure" accept=".pdb" required></label>
<label>Sampling temperature <input type="number" name="temperature" min="0.05" max="1.0" step="0.05" value="0.1"></label>
<label>Number of sequences <input type="number" name="num_sequences" min="1" max="10" step="1" value="3"></label>
<label>Random seed <input type="number" name="seed" step="1" value="42"></label>
<label><input type="checkbox" name="na_only"> Design nucleic acids only (keep protein fixed)</label>
<button type="submit">Run Design</button>
</fieldset>
</form>

<form action="/specificity" method="post" enctype="multipart/form-data">
<fieldset>
<legend>Specificity Mode</legend>
<p>Predict the DNA position probability matrix (PPM) for a protein-DNA complex.</p>
<label>PDB file <input type="file" name="structure" accept=".pdb" required></label>
<label><input type="checkbox" name="na_only" checked> Predict for nucleic acids only</label>
<button type="submit">Run Specificity Prediction</button>
</fieldset>
</form>

<h2>About</h2>
<p>NA-MPNN (Nucleic Acid Message Passing Neural Network) designs protein and nucleic acid
sequences for given backbone structures and predicts protein-DNA binding specificity.</p>
<p>Residue encoding:</p>
<ul>
<li>Protein: A, R, N, D, C, Q, E, G, H, I, L, K, M, F, P, S, T, W, Y, V</li>
<li>DNA: a (DA), c (DC), g (DG), t (DT)</li>
<li>RNA: b (A), d (C), h (G), u (U)</li>
<li>Unknown: X (protein), x (DNA), y (RNA)</li>
</ul>
<p><a href="https://github.com/baker-laboratory/NA-MPNN">https://github.com/baker-laboratory/NA-MPNN</a></p>
</body>
</html>
"#;

#[derive(Clone)]
struct AppState {
    config: Arc<ToolConfig>,
}

/// Rejected form submission.
#[derive(Debug)]
struct FormError(String);

impl IntoResponse for FormError {
    fn into_response(self) -> Response {
        log::warn!("rejected form: {}", self.0);
        (StatusCode::BAD_REQUEST, format!("Invalid request: {}", self.0)).into_response()
    }
}

impl From<axum::extract::multipart::MultipartError> for FormError {
    fn from(e: axum::extract::multipart::MultipartError) -> Self {
        FormError(e.to_string())
    }
}

impl From<std::io::Error> for FormError {
    fn from(e: std::io::Error) -> Self {
        FormError(format!("storing upload: {e}"))
    }
}

/// Fields common to both forms, plus the raw text of the rest.
#[derive(Debug, Default)]
struct FormFields {
    structure: Option<NamedTempFile>,
    temperature: Option<String>,
    num_sequences: Option<String>,
    seed: Option<String>,
    na_only: bool,
}

impl FormFields {
    async fn read(mut multipart: Multipart) -> Result<Self, FormError> {
        let mut fields = FormFields::default();
        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "structure" => {
                    let bytes = field.bytes().await?;
                    if bytes.is_empty() {
                        continue;
                    }
                    // the tool recognises structures by suffix
                    let mut upload = tempfile::Builder::new()
                        .prefix("nampnn-upload-")
                        .suffix(".pdb")
                        .tempfile()?;
                    upload.write_all(&bytes)?;
                    upload.flush()?;
                    fields.structure = Some(upload);
                }
                "temperature" => fields.temperature = Some(field.text().await?),
                "num_sequences" => fields.num_sequences = Some(field.text().await?),
                "seed" => fields.seed = Some(field.text().await?),
                "na_only" => {
                    let value = field.text().await?;
                    fields.na_only = matches!(value.as_str(), "on" | "true" | "1");
                }
                other => log::debug!("ignoring form field {other:?}"),
            }
        }
        Ok(fields)
    }

    fn structure(&self) -> Result<&NamedTempFile, FormError> {
        self.structure
            .as_ref()
            .ok_or_else(|| FormError("no PDB file uploaded".to_string()))
    }
}

fn parse_or<T: FromStr>(value: Option<&str>, default: T, name: &str) -> Result<T, FormError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => v
            .parse()
            .map_err(|_| FormError(format!("{name} must be a number, got {v:?}"))),
        None => Ok(default),
    }
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

async fn design_handler(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<String, FormError> {
    let fields = FormFields::read(multipart).await?;
    let defaults = DesignSettings::default();
    let settings = DesignSettings {
        temperature: parse_or(
            fields.temperature.as_deref(),
            defaults.temperature,
            "temperature",
        )?,
        num_sequences: parse_or(
            fields.num_sequences.as_deref(),
            defaults.num_sequences,
            "num_sequences",
        )?,
        seed: parse_or(fields.seed.as_deref(), defaults.seed, "seed")?,
        na_only: fields.na_only,
    };
    let request = DesignRequest::new(fields.structure()?.path(), settings);
    let outcome = run_design(&state.config, &request).await;
    Ok(outcome.to_string())
}

async fn specificity_handler(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<String, FormError> {
    let fields = FormFields::read(multipart).await?;
    let request = SpecificityRequest::new(fields.structure()?.path(), fields.na_only);
    let outcome = run_specificity(&state.config, &request).await;
    Ok(outcome.to_string())
}

pub fn router(config: ToolConfig) -> Router {
    let state = AppState {
        config: Arc::new(config),
    };
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/design", post(design_handler))
        .route("/specificity", post(specificity_handler))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("failed to listen for ctrl-c: {e}");
    }
    log::info!("shutting down");
}

/// Serve the form until ctrl-c.
pub async fn serve(config: ToolConfig, addr: SocketAddr) -> Result<()> {
    let app = router(config);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    log::info!("NA-MPNN form listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_health() {
        let response = health().await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_index_has_both_forms() {
        let Html(page) = index().await;
        assert!(page.contains(r#"action="/design""#));
        assert!(page.contains(r#"action="/specificity""#));
        assert!(page.contains(r#"name="structure""#));
    }

    #[test]
    fn test_parse_or() {
        assert_eq!(parse_or::<f32>(None, 0.1, "t").unwrap(), 0.1);
        assert_eq!(parse_or::<f32>(Some(" "), 0.1, "t").unwrap(), 0.1);
        assert_eq!(parse_or::<u32>(Some("5"), 3, "n").unwrap(), 5);
        let err = parse_or::<u32>(Some("five"), 3, "num_sequences").unwrap_err();
        assert!(err.0.contains("num_sequences"));
    }

    #[test]
    fn test_form_error_is_bad_request() {
        let response = FormError("no PDB file uploaded".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
