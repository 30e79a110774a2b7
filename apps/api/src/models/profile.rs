use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::errors::AppError;

// ────────────────────────────────────────────────────────────────────────────
// Stored records
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub linkedin_url: Option<String>,
    pub github_url: Option<String>,
    pub portfolio_url: Option<String>,
    pub years_of_experience: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct WorkExperience {
    pub id: Uuid,
    pub user_id: Uuid,
    pub company_name: String,
    pub position: String,
    pub location: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub is_current: bool,
    pub description: Option<String>,
    pub achievements: Vec<String>,
    pub technologies: Vec<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Project {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub url: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub achievements: Vec<String>,
    pub technologies: Vec<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Education {
    pub id: Uuid,
    pub user_id: Uuid,
    pub institution: String,
    pub degree: String,
    pub field_of_study: Option<String>,
    pub location: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Skill {
    pub id: Uuid,
    pub user_id: Uuid,
    pub skill_name: String,
    pub category: String,
    /// 1 (familiar) – 5 (expert)
    pub proficiency_level: i16,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Certification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub issuing_organization: Option<String>,
    pub issue_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

/// Per-user record counts shown on the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ProfileStats {
    pub experiences: i64,
    pub projects: i64,
    pub skills: i64,
    pub generated_resumes: i64,
}

// ────────────────────────────────────────────────────────────────────────────
// Write models
// ────────────────────────────────────────────────────────────────────────────

/// Body of `PUT /api/v1/profile`. Creates the profile on first save.
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileInput {
    pub user_id: Uuid,
    pub email: String,
    pub full_name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub linkedin_url: Option<String>,
    #[serde(default)]
    pub github_url: Option<String>,
    #[serde(default)]
    pub portfolio_url: Option<String>,
    #[serde(default)]
    pub years_of_experience: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewExperience {
    pub user_id: Uuid,
    pub company_name: String,
    pub position: String,
    #[serde(default)]
    pub location: Option<String>,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub is_current: bool,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub achievements: Vec<String>,
    #[serde(default)]
    pub technologies: Vec<String>,
}

/// Partial update; `None` leaves the stored column untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExperienceUpdate {
    pub company_name: Option<String>,
    pub position: Option<String>,
    pub location: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub is_current: Option<bool>,
    pub description: Option<String>,
    pub achievements: Option<Vec<String>>,
    pub technologies: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewProject {
    pub user_id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub achievements: Vec<String>,
    #[serde(default)]
    pub technologies: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub achievements: Option<Vec<String>>,
    pub technologies: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewEducation {
    pub user_id: Uuid,
    pub institution: String,
    pub degree: String,
    #[serde(default)]
    pub field_of_study: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewSkill {
    pub user_id: Uuid,
    pub skill_name: String,
    pub category: String,
    #[serde(default = "default_proficiency")]
    pub proficiency_level: i16,
}

fn default_proficiency() -> i16 {
    3
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewCertification {
    pub user_id: Uuid,
    pub name: String,
    #[serde(default)]
    pub issuing_organization: Option<String>,
    #[serde(default)]
    pub issue_date: Option<NaiveDate>,
}

// ────────────────────────────────────────────────────────────────────────────
// Validation (mirrors the required fields of the profile forms)
// ────────────────────────────────────────────────────────────────────────────

fn require(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

impl ProfileInput {
    pub fn validate(&self) -> Result<(), AppError> {
        require("email", &self.email)?;
        require("full_name", &self.full_name)?;
        if self.years_of_experience < 0 {
            return Err(AppError::Validation(
                "years_of_experience cannot be negative".to_string(),
            ));
        }
        Ok(())
    }
}

impl NewExperience {
    pub fn validate(&self) -> Result<(), AppError> {
        require("company_name", &self.company_name)?;
        require("position", &self.position)
    }
}

impl NewProject {
    pub fn validate(&self) -> Result<(), AppError> {
        require("title", &self.title)
    }
}

impl NewEducation {
    pub fn validate(&self) -> Result<(), AppError> {
        require("institution", &self.institution)?;
        require("degree", &self.degree)
    }
}

impl NewSkill {
    pub fn validate(&self) -> Result<(), AppError> {
        require("skill_name", &self.skill_name)?;
        require("category", &self.category)?;
        if !(1..=5).contains(&self.proficiency_level) {
            return Err(AppError::Validation(
                "proficiency_level must be between 1 and 5".to_string(),
            ));
        }
        Ok(())
    }
}

impl NewCertification {
    pub fn validate(&self) -> Result<(), AppError> {
        require("name", &self.name)
    }
}
