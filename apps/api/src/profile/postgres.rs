use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use super::ProfileStore;
use crate::errors::AppError;
use crate::models::profile::{
    Certification, Education, ExperienceUpdate, NewCertification, NewEducation, NewExperience,
    NewProject, NewSkill, ProfileInput, ProfileStats, Project, ProjectUpdate, Skill, UserProfile,
    WorkExperience,
};
use crate::models::resume::{GeneratedResume, NewGeneratedResume};

/// PostgreSQL-backed profile store. Each call is an independent statement;
/// no transaction spans multiple records.
#[derive(Clone)]
pub struct PgProfileStore {
    pool: PgPool,
}

impl PgProfileStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Maps a foreign-key violation on `user_id` to `NotFound`.
fn owner_missing(user_id: Uuid) -> impl FnOnce(sqlx::Error) -> AppError {
    move |e| {
        let orphan = matches!(
            &e,
            sqlx::Error::Database(db) if db.code().as_deref() == Some("23503")
        );
        if orphan {
            AppError::NotFound(format!("Profile {user_id} not found"))
        } else {
            e.into()
        }
    }
}

async fn delete_by_id(pool: &PgPool, table: &'static str, id: Uuid) -> Result<bool, AppError> {
    let result = sqlx::query(&format!("DELETE FROM {table} WHERE id = $1"))
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

#[async_trait]
impl ProfileStore for PgProfileStore {
    async fn get_profile(&self, user_id: Uuid) -> Result<Option<UserProfile>, AppError> {
        Ok(
            sqlx::query_as::<_, UserProfile>("SELECT * FROM user_profiles WHERE id = $1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn find_profile_by_email(&self, email: &str) -> Result<Option<UserProfile>, AppError> {
        Ok(sqlx::query_as::<_, UserProfile>(
            "SELECT * FROM user_profiles WHERE lower(email) = lower($1)",
        )
        .bind(email.trim())
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn save_profile(&self, input: &ProfileInput) -> Result<UserProfile, AppError> {
        let profile = sqlx::query_as::<_, UserProfile>(
            r#"
            INSERT INTO user_profiles
                (id, email, full_name, phone, location, linkedin_url, github_url,
                 portfolio_url, years_of_experience)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (id) DO UPDATE SET
                email = EXCLUDED.email,
                full_name = EXCLUDED.full_name,
                phone = EXCLUDED.phone,
                location = EXCLUDED.location,
                linkedin_url = EXCLUDED.linkedin_url,
                github_url = EXCLUDED.github_url,
                portfolio_url = EXCLUDED.portfolio_url,
                years_of_experience = EXCLUDED.years_of_experience,
                updated_at = now()
            RETURNING *
            "#,
        )
        .bind(input.user_id)
        .bind(input.email.trim())
        .bind(&input.full_name)
        .bind(&input.phone)
        .bind(&input.location)
        .bind(&input.linkedin_url)
        .bind(&input.github_url)
        .bind(&input.portfolio_url)
        .bind(input.years_of_experience)
        .fetch_one(&self.pool)
        .await?;

        info!("Saved profile for user {}", profile.id);
        Ok(profile)
    }

    async fn profile_stats(&self, user_id: Uuid) -> Result<ProfileStats, AppError> {
        Ok(sqlx::query_as::<_, ProfileStats>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM work_experiences WHERE user_id = $1) AS experiences,
                (SELECT COUNT(*) FROM projects WHERE user_id = $1) AS projects,
                (SELECT COUNT(*) FROM skills WHERE user_id = $1) AS skills,
                (SELECT COUNT(*) FROM generated_resumes WHERE user_id = $1) AS generated_resumes
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?)
    }

    // ── Work experience ──────────────────────────────────────────────────────

    async fn add_experience(&self, input: &NewExperience) -> Result<WorkExperience, AppError> {
        Ok(sqlx::query_as::<_, WorkExperience>(
            r#"
            INSERT INTO work_experiences
                (user_id, company_name, position, location, start_date, end_date,
                 is_current, description, achievements, technologies)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(input.user_id)
        .bind(&input.company_name)
        .bind(&input.position)
        .bind(&input.location)
        .bind(input.start_date)
        // a current role has no end date
        .bind(if input.is_current { None } else { input.end_date })
        .bind(input.is_current)
        .bind(&input.description)
        .bind(&input.achievements)
        .bind(&input.technologies)
        .fetch_one(&self.pool)
        .await
        .map_err(owner_missing(input.user_id))?)
    }

    async fn list_experiences(&self, user_id: Uuid) -> Result<Vec<WorkExperience>, AppError> {
        Ok(sqlx::query_as::<_, WorkExperience>(
            "SELECT * FROM work_experiences WHERE user_id = $1 ORDER BY start_date DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn update_experience(
        &self,
        id: Uuid,
        update: &ExperienceUpdate,
    ) -> Result<Option<WorkExperience>, AppError> {
        Ok(sqlx::query_as::<_, WorkExperience>(
            r#"
            UPDATE work_experiences SET
                company_name = COALESCE($2, company_name),
                position = COALESCE($3, position),
                location = COALESCE($4, location),
                start_date = COALESCE($5, start_date),
                end_date = CASE WHEN COALESCE($7, is_current) THEN NULL
                                ELSE COALESCE($6, end_date) END,
                is_current = COALESCE($7, is_current),
                description = COALESCE($8, description),
                achievements = COALESCE($9, achievements),
                technologies = COALESCE($10, technologies)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&update.company_name)
        .bind(&update.position)
        .bind(&update.location)
        .bind(update.start_date)
        .bind(update.end_date)
        .bind(update.is_current)
        .bind(&update.description)
        .bind(&update.achievements)
        .bind(&update.technologies)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn delete_experience(&self, id: Uuid) -> Result<bool, AppError> {
        delete_by_id(&self.pool, "work_experiences", id).await
    }

    // ── Projects ─────────────────────────────────────────────────────────────

    async fn add_project(&self, input: &NewProject) -> Result<Project, AppError> {
        Ok(sqlx::query_as::<_, Project>(
            r#"
            INSERT INTO projects
                (user_id, title, description, url, start_date, end_date, achievements, technologies)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(input.user_id)
        .bind(&input.title)
        .bind(&input.description)
        .bind(&input.url)
        .bind(input.start_date)
        .bind(input.end_date)
        .bind(&input.achievements)
        .bind(&input.technologies)
        .fetch_one(&self.pool)
        .await
        .map_err(owner_missing(input.user_id))?)
    }

    async fn list_projects(&self, user_id: Uuid) -> Result<Vec<Project>, AppError> {
        Ok(sqlx::query_as::<_, Project>(
            "SELECT * FROM projects WHERE user_id = $1 ORDER BY start_date DESC NULLS LAST, created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn update_project(
        &self,
        id: Uuid,
        update: &ProjectUpdate,
    ) -> Result<Option<Project>, AppError> {
        Ok(sqlx::query_as::<_, Project>(
            r#"
            UPDATE projects SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                url = COALESCE($4, url),
                start_date = COALESCE($5, start_date),
                end_date = COALESCE($6, end_date),
                achievements = COALESCE($7, achievements),
                technologies = COALESCE($8, technologies)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&update.title)
        .bind(&update.description)
        .bind(&update.url)
        .bind(update.start_date)
        .bind(update.end_date)
        .bind(&update.achievements)
        .bind(&update.technologies)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn delete_project(&self, id: Uuid) -> Result<bool, AppError> {
        delete_by_id(&self.pool, "projects", id).await
    }

    // ── Education ────────────────────────────────────────────────────────────

    async fn add_education(&self, input: &NewEducation) -> Result<Education, AppError> {
        Ok(sqlx::query_as::<_, Education>(
            r#"
            INSERT INTO education
                (user_id, institution, degree, field_of_study, location, start_date, end_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(input.user_id)
        .bind(&input.institution)
        .bind(&input.degree)
        .bind(&input.field_of_study)
        .bind(&input.location)
        .bind(input.start_date)
        .bind(input.end_date)
        .fetch_one(&self.pool)
        .await
        .map_err(owner_missing(input.user_id))?)
    }

    async fn list_education(&self, user_id: Uuid) -> Result<Vec<Education>, AppError> {
        Ok(sqlx::query_as::<_, Education>(
            "SELECT * FROM education WHERE user_id = $1 ORDER BY start_date DESC NULLS LAST",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn delete_education(&self, id: Uuid) -> Result<bool, AppError> {
        delete_by_id(&self.pool, "education", id).await
    }

    // ── Skills ───────────────────────────────────────────────────────────────

    async fn add_skill(&self, input: &NewSkill) -> Result<Skill, AppError> {
        Ok(sqlx::query_as::<_, Skill>(
            r#"
            INSERT INTO skills (user_id, skill_name, category, proficiency_level)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(input.user_id)
        .bind(&input.skill_name)
        .bind(&input.category)
        .bind(input.proficiency_level)
        .fetch_one(&self.pool)
        .await
        .map_err(owner_missing(input.user_id))?)
    }

    async fn list_skills(&self, user_id: Uuid) -> Result<Vec<Skill>, AppError> {
        Ok(sqlx::query_as::<_, Skill>(
            "SELECT * FROM skills WHERE user_id = $1 ORDER BY proficiency_level DESC, created_at",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn list_skills_by_category(
        &self,
        user_id: Uuid,
        category: &str,
    ) -> Result<Vec<Skill>, AppError> {
        Ok(sqlx::query_as::<_, Skill>(
            r#"
            SELECT * FROM skills
            WHERE user_id = $1 AND lower(category) = lower($2)
            ORDER BY proficiency_level DESC, created_at
            "#,
        )
        .bind(user_id)
        .bind(category)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn delete_skill(&self, id: Uuid) -> Result<bool, AppError> {
        delete_by_id(&self.pool, "skills", id).await
    }

    // ── Certifications ───────────────────────────────────────────────────────

    async fn add_certification(
        &self,
        input: &NewCertification,
    ) -> Result<Certification, AppError> {
        Ok(sqlx::query_as::<_, Certification>(
            r#"
            INSERT INTO certifications (user_id, name, issuing_organization, issue_date)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(input.user_id)
        .bind(&input.name)
        .bind(&input.issuing_organization)
        .bind(input.issue_date)
        .fetch_one(&self.pool)
        .await
        .map_err(owner_missing(input.user_id))?)
    }

    async fn list_certifications(&self, user_id: Uuid) -> Result<Vec<Certification>, AppError> {
        Ok(sqlx::query_as::<_, Certification>(
            "SELECT * FROM certifications WHERE user_id = $1 ORDER BY issue_date DESC NULLS LAST",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn delete_certification(&self, id: Uuid) -> Result<bool, AppError> {
        delete_by_id(&self.pool, "certifications", id).await
    }

    // ── Generated resumes (append-only) ──────────────────────────────────────

    async fn save_generated_resume(
        &self,
        input: &NewGeneratedResume,
    ) -> Result<GeneratedResume, AppError> {
        let resume = sqlx::query_as::<_, GeneratedResume>(
            r#"
            INSERT INTO generated_resumes
                (user_id, job_title, company_name, job_description, jd_analysis,
                 tailored_summary, markdown_source)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(input.user_id)
        .bind(&input.job_title)
        .bind(&input.company_name)
        .bind(&input.job_description)
        .bind(Json(&input.jd_analysis))
        .bind(&input.tailored_summary)
        .bind(&input.markdown_source)
        .fetch_one(&self.pool)
        .await
        .map_err(owner_missing(input.user_id))?;

        info!(
            "Recorded generated resume {} for user {}",
            resume.id, resume.user_id
        );
        Ok(resume)
    }

    async fn list_generated_resumes(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<GeneratedResume>, AppError> {
        Ok(sqlx::query_as::<_, GeneratedResume>(
            "SELECT * FROM generated_resumes WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn get_generated_resume(&self, id: Uuid) -> Result<Option<GeneratedResume>, AppError> {
        Ok(
            sqlx::query_as::<_, GeneratedResume>("SELECT * FROM generated_resumes WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }
}
