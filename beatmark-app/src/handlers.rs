//! HTTP request handlers

use axum::extract::{Multipart, State};
use axum::response::Json;
use beatmark_analysis::Beat;
use beatmark_library::{BeatReport, StagedUpload};
use serde::Serialize;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::server::AppState;

/// Successful beat detection response
#[derive(Debug, Serialize)]
pub struct DetectResponse {
    pub success: bool,
    /// Tempo rounded to a whole BPM
    pub bpm: i64,
    pub beats: Vec<Beat>,
    /// Track duration in seconds
    pub duration: f64,
    pub sample_rate: u32,
}

impl From<BeatReport> for DetectResponse {
    fn from(report: BeatReport) -> Self {
        Self {
            success: true,
            bpm: round_half_even(report.bpm) as i64,
            beats: report.beats,
            duration: report.duration,
            sample_rate: report.sample_rate,
        }
    }
}

/// Round to the nearest integer, ties to even
fn round_half_even(value: f64) -> f64 {
    let rounded = value.round();
    if (value - value.trunc()).abs() == 0.5 {
        2.0 * (value / 2.0).round()
    } else {
        rounded
    }
}

/// Form fields of a detection request
#[derive(Debug, Default)]
struct DetectForm {
    audio: Option<(Option<String>, Vec<u8>)>,
    sensitivity: Option<String>,
    detect_extra: Option<String>,
}

impl DetectForm {
    async fn read(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Invalid form data: {}", e)))?
        {
            let name = field.name().map(str::to_string);
            match name.as_deref() {
                Some("audio") => {
                    let file_name = field.file_name().map(str::to_string);
                    let bytes = field
                        .bytes()
                        .await
                        .map_err(|e| ApiError::BadRequest(format!("Invalid audio upload: {}", e)))?;
                    form.audio = Some((file_name, bytes.to_vec()));
                }
                Some("sensitivity") => {
                    form.sensitivity = Some(field.text().await.map_err(|e| {
                        ApiError::BadRequest(format!("Invalid sensitivity field: {}", e))
                    })?);
                }
                Some("detect_extra") => {
                    form.detect_extra = Some(field.text().await.map_err(|e| {
                        ApiError::BadRequest(format!("Invalid detect_extra field: {}", e))
                    })?);
                }
                _ => {}
            }
        }

        Ok(form)
    }
}

/// Parse the optional sensitivity field
fn parse_sensitivity(value: Option<&str>, default: f32) -> Result<f32, ApiError> {
    let Some(value) = value else {
        return Ok(default);
    };

    let sensitivity: f32 = value
        .trim()
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("Invalid sensitivity: {:?}", value)))?;

    if !sensitivity.is_finite() || sensitivity <= 0.0 {
        return Err(ApiError::BadRequest(format!(
            "Invalid sensitivity: {} (must be positive)",
            value
        )));
    }
    Ok(sensitivity)
}

/// Only a literal "true" (any case) enables extra-beat detection
fn parse_detect_extra(value: Option<&str>) -> bool {
    value.is_some_and(|v| v.eq_ignore_ascii_case("true"))
}

/// GET / - Service status
pub async fn home() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "message": "Beat Detector API is running",
        "endpoints": {
            "/detect-beats": "POST - Upload audio file to detect beats"
        }
    }))
}

/// POST /detect-beats - Detect and classify beats in an uploaded file
pub async fn detect_beats(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<DetectResponse>, ApiError> {
    let form = DetectForm::read(multipart).await?;

    let sensitivity = parse_sensitivity(
        form.sensitivity.as_deref(),
        state.config.default_sensitivity,
    )?;
    let detect_extra = parse_detect_extra(form.detect_extra.as_deref());

    let (file_name, bytes) = form
        .audio
        .ok_or_else(|| ApiError::BadRequest("No audio file provided".to_string()))?;

    let analysis = state.config.analysis_config(sensitivity, detect_extra);
    let upload_dir = state.config.upload_dir.clone();
    let analyzer = state.analyzer.clone();

    // Decoding and analysis are CPU-bound
    let report = tokio::task::spawn_blocking(move || -> Result<BeatReport, ApiError> {
        let staged = StagedUpload::write(upload_dir.as_deref(), file_name.as_deref(), &bytes)
            .map_err(|e| ApiError::Internal(e.to_string()))?;
        let result = analyzer.analyze(staged.path(), &analysis);
        staged.finish();
        Ok(result?)
    })
    .await
    .map_err(|e| ApiError::Internal(format!("Analysis task failed: {}", e)))??;

    Ok(Json(report.into()))
}
