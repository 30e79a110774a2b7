pub mod health;

use axum::{
    routing::{delete, get, patch, post},
    Router,
};

use crate::generation::handlers as resumes;
use crate::profile::handlers as profile;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Profile API
        .route("/api/v1/session", post(profile::handle_session))
        .route(
            "/api/v1/profile",
            get(profile::handle_get_profile).put(profile::handle_save_profile),
        )
        .route("/api/v1/profile/stats", get(profile::handle_profile_stats))
        .route(
            "/api/v1/experiences",
            get(profile::handle_list_experiences).post(profile::handle_add_experience),
        )
        .route(
            "/api/v1/experiences/:id",
            patch(profile::handle_update_experience).delete(profile::handle_delete_experience),
        )
        .route(
            "/api/v1/projects",
            get(profile::handle_list_projects).post(profile::handle_add_project),
        )
        .route(
            "/api/v1/projects/:id",
            patch(profile::handle_update_project).delete(profile::handle_delete_project),
        )
        .route(
            "/api/v1/education",
            get(profile::handle_list_education).post(profile::handle_add_education),
        )
        .route(
            "/api/v1/education/:id",
            delete(profile::handle_delete_education),
        )
        .route(
            "/api/v1/skills",
            get(profile::handle_list_skills).post(profile::handle_add_skill),
        )
        .route("/api/v1/skills/:id", delete(profile::handle_delete_skill))
        .route(
            "/api/v1/certifications",
            get(profile::handle_list_certifications).post(profile::handle_add_certification),
        )
        .route(
            "/api/v1/certifications/:id",
            delete(profile::handle_delete_certification),
        )
        // Resume API
        .route("/api/v1/resumes", get(resumes::handle_list_resumes))
        .route("/api/v1/resumes/analyze", post(resumes::handle_analyze))
        .route("/api/v1/resumes/generate", post(resumes::handle_generate))
        .route("/api/v1/resumes/:id", get(resumes::handle_get_resume))
        .route("/api/v1/resumes/:id/pdf", get(resumes::handle_resume_pdf))
        .with_state(state)
}
