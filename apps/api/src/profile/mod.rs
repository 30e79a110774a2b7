//! Profile Store: Typed CRUD over the user's career data and resume history.
//!
//! Handlers and the generation pipeline depend on the `ProfileStore` trait.
//! `PgProfileStore` is the production backend; tests use `memory::MemoryProfileStore`.

use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::profile::{
    Certification, Education, ExperienceUpdate, NewCertification, NewEducation, NewExperience,
    NewProject, NewSkill, ProfileInput, ProfileStats, Project, ProjectUpdate, Skill, UserProfile,
    WorkExperience,
};
use crate::models::resume::{GeneratedResume, NewGeneratedResume};

pub mod handlers;
#[cfg(test)]
pub mod memory;
pub mod postgres;

pub use postgres::PgProfileStore;

/// Store operations. Identifiers and timestamps are generated by the store.
///
/// List operations are ordered: experiences, projects and education by
/// start date (newest first), skills by proficiency (highest first),
/// certifications by issue date and resumes by creation time (newest first).
/// Delete operations report whether a row was removed.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn get_profile(&self, user_id: Uuid) -> Result<Option<UserProfile>, AppError>;
    async fn find_profile_by_email(&self, email: &str) -> Result<Option<UserProfile>, AppError>;
    /// Inserts the profile, or updates every mutable field if it already exists.
    async fn save_profile(&self, input: &ProfileInput) -> Result<UserProfile, AppError>;
    async fn profile_stats(&self, user_id: Uuid) -> Result<ProfileStats, AppError>;

    async fn add_experience(&self, input: &NewExperience) -> Result<WorkExperience, AppError>;
    async fn list_experiences(&self, user_id: Uuid) -> Result<Vec<WorkExperience>, AppError>;
    async fn update_experience(
        &self,
        id: Uuid,
        update: &ExperienceUpdate,
    ) -> Result<Option<WorkExperience>, AppError>;
    async fn delete_experience(&self, id: Uuid) -> Result<bool, AppError>;

    async fn add_project(&self, input: &NewProject) -> Result<Project, AppError>;
    async fn list_projects(&self, user_id: Uuid) -> Result<Vec<Project>, AppError>;
    async fn update_project(
        &self,
        id: Uuid,
        update: &ProjectUpdate,
    ) -> Result<Option<Project>, AppError>;
    async fn delete_project(&self, id: Uuid) -> Result<bool, AppError>;

    async fn add_education(&self, input: &NewEducation) -> Result<Education, AppError>;
    async fn list_education(&self, user_id: Uuid) -> Result<Vec<Education>, AppError>;
    async fn delete_education(&self, id: Uuid) -> Result<bool, AppError>;

    async fn add_skill(&self, input: &NewSkill) -> Result<Skill, AppError>;
    async fn list_skills(&self, user_id: Uuid) -> Result<Vec<Skill>, AppError>;
    async fn list_skills_by_category(
        &self,
        user_id: Uuid,
        category: &str,
    ) -> Result<Vec<Skill>, AppError>;
    async fn delete_skill(&self, id: Uuid) -> Result<bool, AppError>;

    async fn add_certification(&self, input: &NewCertification)
        -> Result<Certification, AppError>;
    async fn list_certifications(&self, user_id: Uuid) -> Result<Vec<Certification>, AppError>;
    async fn delete_certification(&self, id: Uuid) -> Result<bool, AppError>;

    async fn save_generated_resume(
        &self,
        input: &NewGeneratedResume,
    ) -> Result<GeneratedResume, AppError>;
    async fn list_generated_resumes(&self, user_id: Uuid)
        -> Result<Vec<GeneratedResume>, AppError>;
    async fn get_generated_resume(&self, id: Uuid) -> Result<Option<GeneratedResume>, AppError>;
}
