//! Axum route handlers for the profile API: session lookup, the profile
//! itself, and CRUD over each kind of career record.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::profile::{
    Certification, Education, ExperienceUpdate, NewCertification, NewEducation, NewExperience,
    NewProject, NewSkill, ProfileInput, ProfileStats, Project, ProjectUpdate, Skill, UserProfile,
    WorkExperience,
};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct UserIdQuery {
    pub user_id: Uuid,
}

#[derive(Deserialize)]
pub struct SkillQuery {
    pub user_id: Uuid,
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SessionRequest {
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub user_id: Uuid,
    /// No profile exists yet; the client should prompt for one and `PUT` it
    /// under this id.
    pub is_new: bool,
}

fn not_found_unless(removed: bool, what: &str, id: Uuid) -> Result<StatusCode, AppError> {
    if removed {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("{what} {id} not found")))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Session + profile
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/session
///
/// Resolves an email to its user id. Unknown emails get a fresh id that
/// becomes permanent once a profile is saved under it.
pub async fn handle_session(
    State(state): State<AppState>,
    Json(request): Json<SessionRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    let email = request.email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::Validation(
            "email must be a valid address".to_string(),
        ));
    }

    let response = match state.store.find_profile_by_email(email).await? {
        Some(profile) => SessionResponse {
            user_id: profile.id,
            is_new: false,
        },
        None => SessionResponse {
            user_id: Uuid::new_v4(),
            is_new: true,
        },
    };
    info!(
        "Session resolved for user {} (new: {})",
        response.user_id, response.is_new
    );
    Ok(Json(response))
}

/// GET /api/v1/profile?user_id=
pub async fn handle_get_profile(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<UserProfile>, AppError> {
    let profile = state
        .store
        .get_profile(params.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Profile {} not found", params.user_id)))?;
    Ok(Json(profile))
}

/// PUT /api/v1/profile
pub async fn handle_save_profile(
    State(state): State<AppState>,
    Json(input): Json<ProfileInput>,
) -> Result<Json<UserProfile>, AppError> {
    input.validate()?;

    if let Some(owner) = state.store.find_profile_by_email(&input.email).await? {
        if owner.id != input.user_id {
            return Err(AppError::Conflict(format!(
                "Email {} is already registered to another profile",
                input.email.trim()
            )));
        }
    }

    Ok(Json(state.store.save_profile(&input).await?))
}

/// GET /api/v1/profile/stats?user_id=
pub async fn handle_profile_stats(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<ProfileStats>, AppError> {
    Ok(Json(state.store.profile_stats(params.user_id).await?))
}

// ────────────────────────────────────────────────────────────────────────────
// Work experience
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/experiences?user_id=
pub async fn handle_list_experiences(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Vec<WorkExperience>>, AppError> {
    Ok(Json(state.store.list_experiences(params.user_id).await?))
}

/// POST /api/v1/experiences
pub async fn handle_add_experience(
    State(state): State<AppState>,
    Json(input): Json<NewExperience>,
) -> Result<(StatusCode, Json<WorkExperience>), AppError> {
    input.validate()?;
    let row = state.store.add_experience(&input).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// PATCH /api/v1/experiences/:id
pub async fn handle_update_experience(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(update): Json<ExperienceUpdate>,
) -> Result<Json<WorkExperience>, AppError> {
    state
        .store
        .update_experience(id, &update)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Experience {id} not found")))
}

/// DELETE /api/v1/experiences/:id
pub async fn handle_delete_experience(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    not_found_unless(state.store.delete_experience(id).await?, "Experience", id)
}

// ────────────────────────────────────────────────────────────────────────────
// Projects
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/projects?user_id=
pub async fn handle_list_projects(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Vec<Project>>, AppError> {
    Ok(Json(state.store.list_projects(params.user_id).await?))
}

/// POST /api/v1/projects
pub async fn handle_add_project(
    State(state): State<AppState>,
    Json(input): Json<NewProject>,
) -> Result<(StatusCode, Json<Project>), AppError> {
    input.validate()?;
    let row = state.store.add_project(&input).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// PATCH /api/v1/projects/:id
pub async fn handle_update_project(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(update): Json<ProjectUpdate>,
) -> Result<Json<Project>, AppError> {
    state
        .store
        .update_project(id, &update)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Project {id} not found")))
}

/// DELETE /api/v1/projects/:id
pub async fn handle_delete_project(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    not_found_unless(state.store.delete_project(id).await?, "Project", id)
}

// ────────────────────────────────────────────────────────────────────────────
// Education, skills, certifications
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/education?user_id=
pub async fn handle_list_education(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Vec<Education>>, AppError> {
    Ok(Json(state.store.list_education(params.user_id).await?))
}

/// POST /api/v1/education
pub async fn handle_add_education(
    State(state): State<AppState>,
    Json(input): Json<NewEducation>,
) -> Result<(StatusCode, Json<Education>), AppError> {
    input.validate()?;
    let row = state.store.add_education(&input).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// DELETE /api/v1/education/:id
pub async fn handle_delete_education(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    not_found_unless(state.store.delete_education(id).await?, "Education", id)
}

/// GET /api/v1/skills?user_id=&category=
pub async fn handle_list_skills(
    State(state): State<AppState>,
    Query(params): Query<SkillQuery>,
) -> Result<Json<Vec<Skill>>, AppError> {
    let skills = match params.category.as_deref().map(str::trim) {
        Some(category) if !category.is_empty() => {
            state
                .store
                .list_skills_by_category(params.user_id, category)
                .await?
        }
        _ => state.store.list_skills(params.user_id).await?,
    };
    Ok(Json(skills))
}

/// POST /api/v1/skills
pub async fn handle_add_skill(
    State(state): State<AppState>,
    Json(input): Json<NewSkill>,
) -> Result<(StatusCode, Json<Skill>), AppError> {
    input.validate()?;
    let row = state.store.add_skill(&input).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// DELETE /api/v1/skills/:id
pub async fn handle_delete_skill(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    not_found_unless(state.store.delete_skill(id).await?, "Skill", id)
}

/// GET /api/v1/certifications?user_id=
pub async fn handle_list_certifications(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Vec<Certification>>, AppError> {
    Ok(Json(state.store.list_certifications(params.user_id).await?))
}

/// POST /api/v1/certifications
pub async fn handle_add_certification(
    State(state): State<AppState>,
    Json(input): Json<NewCertification>,
) -> Result<(StatusCode, Json<Certification>), AppError> {
    input.validate()?;
    let row = state.store.add_certification(&input).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// DELETE /api/v1/certifications/:id
pub async fn handle_delete_certification(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    not_found_unless(
        state.store.delete_certification(id).await?,
        "Certification",
        id,
    )
}
