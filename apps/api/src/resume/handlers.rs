//! Axum route handler for résumé upload and analysis.

use axum::{
    extract::{Multipart, State},
    Json,
};
use bytes::Bytes;
use serde::Serialize;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::models::profile::CandidateProfile;
use crate::resume::analyzer::analyze_resume;
use crate::resume::extractor::{extract_text, DocumentFormat};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct AnalyzeResumeResponse {
    pub success: bool,
    pub analysis: CandidateProfile,
    pub extracted_text_length: usize,
}

/// POST /api/analyze-resume
///
/// Multipart upload with a `file` part (PDF, DOC or DOCX).
pub async fn handle_analyze_resume(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<AnalyzeResumeResponse>, AppError> {
    let mut upload: Option<(String, Bytes)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read upload: {e}")))?;
        upload = Some((filename, data));
        break;
    }

    let (filename, data) =
        upload.ok_or_else(|| AppError::Validation("No file uploaded".to_string()))?;
    let format = DocumentFormat::from_filename(&filename)?;

    let size = data.len();
    let text = extract_text_blocking(data, format).await;
    info!(
        "Analyzing resume '{}' ({} bytes, {} chars extracted)",
        filename,
        size,
        text.chars().count()
    );

    let analysis = analyze_resume(state.llm.as_ref(), &text).await;

    Ok(Json(AnalyzeResumeResponse {
        success: true,
        analysis,
        extracted_text_length: text.chars().count(),
    }))
}

/// Runs extraction on the blocking pool; PDF parsing is CPU-bound.
/// A failed blocking task counts as an unreadable document.
async fn extract_text_blocking(data: Bytes, format: DocumentFormat) -> String {
    tokio::task::spawn_blocking(move || extract_text(&data, format))
        .await
        .unwrap_or_else(|e| {
            warn!(?format, error = %e, "text extraction task failed");
            String::new()
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_blocking_extraction_yields_empty_text_for_garbage() {
        let data = Bytes::from_static(b"not a pdf at all");
        assert_eq!(extract_text_blocking(data, DocumentFormat::Pdf).await, "");
    }
}
