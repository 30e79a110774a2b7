//! Tailoring pipeline: A fixed, linear state machine.
//!
//! `AnalyzeJd → SelectContent → TailorSummary → TailorExperiences →
//! TailorProjects → Done`. Every stage reads and writes the same
//! `PipelineState`; there is no branching and no retry. A stage error
//! aborts the run.

use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::generation::content_selector::{
    select_experiences, select_projects, select_skills, DEFAULT_SELECTION_LIMIT,
};
use crate::generation::jd_analyzer::{analyze_job_description, JobAnalysis};
use crate::generation::tailoring::{generate_summary, tailor_experience, tailor_project};
use crate::llm_client::CompletionService;
use crate::models::profile::{
    Certification, Education, Project, Skill, UserProfile, WorkExperience,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    AnalyzeJd,
    SelectContent,
    TailorSummary,
    TailorExperiences,
    TailorProjects,
    Done,
}

impl Stage {
    pub fn next(self) -> Stage {
        match self {
            Stage::AnalyzeJd => Stage::SelectContent,
            Stage::SelectContent => Stage::TailorSummary,
            Stage::TailorSummary => Stage::TailorExperiences,
            Stage::TailorExperiences => Stage::TailorProjects,
            Stage::TailorProjects | Stage::Done => Stage::Done,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Stage::AnalyzeJd => "analyze_jd",
            Stage::SelectContent => "select_content",
            Stage::TailorSummary => "tailor_summary",
            Stage::TailorExperiences => "tailor_experiences",
            Stage::TailorProjects => "tailor_projects",
            Stage::Done => "done",
        }
    }
}

/// Everything the store holds for one user, loaded before a run.
#[derive(Debug, Clone)]
pub struct ProfileSnapshot {
    pub profile: UserProfile,
    pub experiences: Vec<WorkExperience>,
    pub projects: Vec<Project>,
    pub skills: Vec<Skill>,
    pub education: Vec<Education>,
    pub certifications: Vec<Certification>,
}

/// The single working object of a run. Candidate lists are snapshots and
/// are never modified; tailoring writes to the `tailored_*` copies.
#[derive(Debug, Clone)]
pub struct PipelineState {
    pub user_id: Uuid,
    pub job_description: String,
    pub stage: Stage,
    pub analysis: JobAnalysis,
    pub profile: UserProfile,
    pub all_experiences: Vec<WorkExperience>,
    pub all_projects: Vec<Project>,
    pub all_skills: Vec<Skill>,
    pub education: Vec<Education>,
    pub certifications: Vec<Certification>,
    pub selected_experiences: Vec<WorkExperience>,
    pub selected_projects: Vec<Project>,
    pub selected_skills: Vec<Skill>,
    pub tailored_summary: String,
    pub tailored_experiences: Vec<WorkExperience>,
    pub tailored_projects: Vec<Project>,
    /// Filled by the renderer once the pipeline is done.
    pub resume_markdown: String,
}

impl PipelineState {
    pub fn new(job_description: impl Into<String>, snapshot: ProfileSnapshot) -> Self {
        Self {
            user_id: snapshot.profile.id,
            job_description: job_description.into(),
            stage: Stage::AnalyzeJd,
            analysis: JobAnalysis::default(),
            profile: snapshot.profile,
            all_experiences: snapshot.experiences,
            all_projects: snapshot.projects,
            all_skills: snapshot.skills,
            education: snapshot.education,
            certifications: snapshot.certifications,
            selected_experiences: Vec::new(),
            selected_projects: Vec::new(),
            selected_skills: Vec::new(),
            tailored_summary: String::new(),
            tailored_experiences: Vec::new(),
            tailored_projects: Vec::new(),
            resume_markdown: String::new(),
        }
    }
}

/// Runs every remaining stage in order and returns the finished state.
pub async fn run_pipeline(
    llm: Option<&dyn CompletionService>,
    mut state: PipelineState,
) -> Result<PipelineState, AppError> {
    while state.stage != Stage::Done {
        info!(
            "Pipeline stage '{}' for user {}",
            state.stage.name(),
            state.user_id
        );
        run_stage(llm, &mut state).await?;
        state.stage = state.stage.next();
    }
    Ok(state)
}

async fn run_stage(
    llm: Option<&dyn CompletionService>,
    state: &mut PipelineState,
) -> Result<(), AppError> {
    match state.stage {
        Stage::AnalyzeJd => {
            state.analysis = analyze_job_description(llm, &state.job_description).await;
            info!(
                "Analyzed job description: '{}' at '{}' ({} required skills)",
                state.analysis.job_title,
                state.analysis.company_name,
                state.analysis.required_skills.len()
            );
        }
        Stage::SelectContent => {
            state.selected_experiences = select_experiences(
                llm,
                &state.all_experiences,
                &state.analysis,
                DEFAULT_SELECTION_LIMIT,
            )
            .await;
            state.selected_projects = select_projects(
                llm,
                &state.all_projects,
                &state.analysis,
                DEFAULT_SELECTION_LIMIT,
            )
            .await;
            state.selected_skills = select_skills(&state.all_skills, &state.analysis);
            info!(
                "Selected {} experiences, {} projects, {} skills",
                state.selected_experiences.len(),
                state.selected_projects.len(),
                state.selected_skills.len()
            );
        }
        Stage::TailorSummary => {
            state.tailored_summary = generate_summary(
                llm,
                Some(&state.profile),
                &state.analysis,
                state.selected_experiences.first(),
            )
            .await;
        }
        Stage::TailorExperiences => {
            let mut tailored = Vec::with_capacity(state.selected_experiences.len());
            for experience in &state.selected_experiences {
                tailored.push(tailor_experience(llm, experience, &state.analysis).await);
            }
            state.tailored_experiences = tailored;
        }
        Stage::TailorProjects => {
            let mut tailored = Vec::with_capacity(state.selected_projects.len());
            for project in &state.selected_projects {
                tailored.push(tailor_project(llm, project, &state.analysis).await);
            }
            state.tailored_projects = tailored;
        }
        Stage::Done => {}
    }
    Ok(())
}
