//! Axum route handlers for the Resume API.

use anyhow::anyhow;
use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderName},
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::generation::generator::generate_resume;
use crate::generation::jd_analyzer::{analyze_job_description, JobAnalysis};
use crate::models::resume::GeneratedResume;
use crate::profile::handlers::UserIdQuery;
use crate::render::replay_pdf;
use crate::state::AppState;

const RESUME_ID_HEADER: HeaderName = HeaderName::from_static("x-resume-id");

// ────────────────────────────────────────────────────────────────────────────
// Request types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub job_description: String,
}

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub user_id: Uuid,
    pub job_description: String,
}

fn pdf_response(pdf: Vec<u8>, file_name: &str, resume_id: Uuid) -> Response {
    (
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{file_name}\""),
            ),
            (RESUME_ID_HEADER, resume_id.to_string()),
        ],
        Bytes::from(pdf),
    )
        .into_response()
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/resumes/analyze
///
/// Previews the JobAnalysis for a job description. Nothing is stored.
pub async fn handle_analyze(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeRequest>,
) -> Result<Json<JobAnalysis>, AppError> {
    if request.job_description.trim().is_empty() {
        return Err(AppError::Validation(
            "job_description cannot be empty".to_string(),
        ));
    }

    let analysis = analyze_job_description(state.llm.as_deref(), &request.job_description).await;
    Ok(Json(analysis))
}

/// POST /api/v1/resumes/generate
///
/// Runs the full pipeline and returns the PDF. The stored record's id is in
/// the `x-resume-id` header.
pub async fn handle_generate(
    State(state): State<AppState>,
    Json(request): Json<GenerateRequest>,
) -> Result<Response, AppError> {
    let output = generate_resume(
        state.store.as_ref(),
        state.llm.as_deref(),
        request.user_id,
        &request.job_description,
    )
    .await?;

    Ok(pdf_response(output.pdf, &output.file_name, output.record.id))
}

/// GET /api/v1/resumes?user_id=
pub async fn handle_list_resumes(
    State(state): State<AppState>,
    Query(query): Query<UserIdQuery>,
) -> Result<Json<Vec<GeneratedResume>>, AppError> {
    Ok(Json(state.store.list_generated_resumes(query.user_id).await?))
}

async fn find_resume(state: &AppState, resume_id: Uuid) -> Result<GeneratedResume, AppError> {
    state
        .store
        .get_generated_resume(resume_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Resume {resume_id} not found")))
}

/// GET /api/v1/resumes/:id
pub async fn handle_get_resume(
    State(state): State<AppState>,
    Path(resume_id): Path<Uuid>,
) -> Result<Json<GeneratedResume>, AppError> {
    Ok(Json(find_resume(&state, resume_id).await?))
}

/// GET /api/v1/resumes/:id/pdf
///
/// Re-typesets the stored Markdown. The pipeline does not run again, so the
/// document matches the original download.
pub async fn handle_resume_pdf(
    State(state): State<AppState>,
    Path(resume_id): Path<Uuid>,
) -> Result<Response, AppError> {
    let resume = find_resume(&state, resume_id).await?;
    let full_name = state
        .store
        .get_profile(resume.user_id)
        .await?
        .map(|p| p.full_name)
        .unwrap_or_default();

    let markdown = resume.markdown_source.clone();
    let pdf = tokio::task::spawn_blocking(move || replay_pdf(&markdown, &full_name))
        .await
        .map_err(|e| AppError::Internal(anyhow!("Render task failed: {e}")))??;

    Ok(pdf_response(pdf, &resume.pdf_file_name(), resume.id))
}
