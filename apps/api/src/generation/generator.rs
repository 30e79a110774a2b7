//! Resume Generation: One full pipeline run, from job description to
//! persisted record and PDF.
//!
//! Flow: validate → load profile snapshot → run pipeline → render on the
//! blocking pool → persist → return.

use anyhow::anyhow;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::generation::pipeline::{run_pipeline, PipelineState, ProfileSnapshot};
use crate::llm_client::CompletionService;
use crate::models::resume::{GeneratedResume, NewGeneratedResume};
use crate::profile::ProfileStore;
use crate::render::render_resume;

/// Result of a successful run.
#[derive(Debug)]
pub struct GeneratedOutput {
    pub record: GeneratedResume,
    pub pdf: Vec<u8>,
    pub file_name: String,
}

/// Loads everything the store holds for `user_id`.
pub async fn load_snapshot(
    store: &dyn ProfileStore,
    user_id: Uuid,
) -> Result<ProfileSnapshot, AppError> {
    let profile = store
        .get_profile(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Profile {user_id} not found")))?;

    Ok(ProfileSnapshot {
        profile,
        experiences: store.list_experiences(user_id).await?,
        projects: store.list_projects(user_id).await?,
        skills: store.list_skills(user_id).await?,
        education: store.list_education(user_id).await?,
        certifications: store.list_certifications(user_id).await?,
    })
}

/// Runs the tailoring pipeline for `user_id` and persists the result.
///
/// Steps:
/// 1. Reject a blank job description (nothing else runs)
/// 2. Load the profile snapshot (missing profile → `NotFound`)
/// 3. Run the five pipeline stages
/// 4. Build the Markdown and typeset the PDF on the blocking pool
/// 5. INSERT one generated_resumes row
///
/// Any error before step 5 leaves the store untouched.
pub async fn generate_resume(
    store: &dyn ProfileStore,
    llm: Option<&dyn CompletionService>,
    user_id: Uuid,
    jd_text: &str,
) -> Result<GeneratedOutput, AppError> {
    // Step 1: Validate input
    if jd_text.trim().is_empty() {
        return Err(AppError::Validation(
            "job_description cannot be empty".to_string(),
        ));
    }

    // Step 2: Load candidate data
    let snapshot = load_snapshot(store, user_id).await?;
    info!(
        "Loaded profile for user {}: {} experiences, {} projects, {} skills",
        user_id,
        snapshot.experiences.len(),
        snapshot.projects.len(),
        snapshot.skills.len()
    );

    // Step 3: Pipeline
    let state = run_pipeline(llm, PipelineState::new(jd_text, snapshot)).await?;

    // Step 4: Render
    let (state, pdf) = tokio::task::spawn_blocking(move || {
        let mut state = state;
        let pdf = render_resume(&mut state);
        (state, pdf)
    })
    .await
    .map_err(|e| AppError::Internal(anyhow!("Render task failed: {e}")))?;
    let pdf = pdf?;

    // Step 5: Persist
    let record = store
        .save_generated_resume(&NewGeneratedResume {
            user_id,
            job_title: state.analysis.job_title.clone(),
            company_name: state.analysis.company_name.clone(),
            job_description: state.job_description.clone(),
            jd_analysis: state.analysis.clone(),
            tailored_summary: state.tailored_summary.clone(),
            markdown_source: state.resume_markdown.clone(),
        })
        .await?;

    info!(
        "Generated resume {} for user {} ({} bytes)",
        record.id,
        user_id,
        pdf.len()
    );

    let file_name = record.pdf_file_name();
    Ok(GeneratedOutput {
        record,
        pdf,
        file_name,
    })
}
