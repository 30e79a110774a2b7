//! In-memory `ProfileStore` used by pipeline and route tests.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::ProfileStore;
use crate::errors::AppError;
use crate::models::profile::{
    Certification, Education, ExperienceUpdate, NewCertification, NewEducation, NewExperience,
    NewProject, NewSkill, ProfileInput, ProfileStats, Project, ProjectUpdate, Skill, UserProfile,
    WorkExperience,
};
use crate::models::resume::{GeneratedResume, NewGeneratedResume};
use sqlx::types::Json;

#[derive(Default)]
struct Tables {
    profiles: Vec<UserProfile>,
    experiences: Vec<WorkExperience>,
    projects: Vec<Project>,
    education: Vec<Education>,
    skills: Vec<Skill>,
    certifications: Vec<Certification>,
    resumes: Vec<GeneratedResume>,
}

#[derive(Default)]
pub struct MemoryProfileStore {
    tables: Mutex<Tables>,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with<T>(&self, f: impl FnOnce(&mut Tables) -> T) -> T {
        let mut tables = self.tables.lock().unwrap();
        f(&mut tables)
    }

    /// Runs `insert` only when `user_id` has a profile, like the
    /// `user_profiles` foreign key does in Postgres.
    fn insert_for(&self, user_id: Uuid, insert: impl FnOnce(&mut Tables)) -> Result<(), AppError> {
        self.with(|t| {
            if !t.profiles.iter().any(|p| p.id == user_id) {
                return Err(AppError::NotFound(format!("Profile {user_id} not found")));
            }
            insert(t);
            Ok(())
        })
    }

    pub fn resume_count(&self) -> usize {
        self.with(|t| t.resumes.len())
    }
}

fn remove_where<T>(rows: &mut Vec<T>, pred: impl Fn(&T) -> bool) -> bool {
    let before = rows.len();
    rows.retain(|row| !pred(row));
    rows.len() != before
}

#[async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn get_profile(&self, user_id: Uuid) -> Result<Option<UserProfile>, AppError> {
        Ok(self.with(|t| t.profiles.iter().find(|p| p.id == user_id).cloned()))
    }

    async fn find_profile_by_email(&self, email: &str) -> Result<Option<UserProfile>, AppError> {
        let email = email.trim().to_lowercase();
        Ok(self.with(|t| {
            t.profiles
                .iter()
                .find(|p| p.email.to_lowercase() == email)
                .cloned()
        }))
    }

    async fn save_profile(&self, input: &ProfileInput) -> Result<UserProfile, AppError> {
        Ok(self.with(|t| {
            let now = Utc::now();
            if let Some(existing) = t.profiles.iter_mut().find(|p| p.id == input.user_id) {
                existing.email = input.email.trim().to_string();
                existing.full_name = input.full_name.clone();
                existing.phone = input.phone.clone();
                existing.location = input.location.clone();
                existing.linkedin_url = input.linkedin_url.clone();
                existing.github_url = input.github_url.clone();
                existing.portfolio_url = input.portfolio_url.clone();
                existing.years_of_experience = input.years_of_experience;
                existing.updated_at = now;
                return existing.clone();
            }
            let profile = UserProfile {
                id: input.user_id,
                email: input.email.trim().to_string(),
                full_name: input.full_name.clone(),
                phone: input.phone.clone(),
                location: input.location.clone(),
                linkedin_url: input.linkedin_url.clone(),
                github_url: input.github_url.clone(),
                portfolio_url: input.portfolio_url.clone(),
                years_of_experience: input.years_of_experience,
                created_at: now,
                updated_at: now,
            };
            t.profiles.push(profile.clone());
            profile
        }))
    }

    async fn profile_stats(&self, user_id: Uuid) -> Result<ProfileStats, AppError> {
        Ok(self.with(|t| ProfileStats {
            experiences: t.experiences.iter().filter(|r| r.user_id == user_id).count() as i64,
            projects: t.projects.iter().filter(|r| r.user_id == user_id).count() as i64,
            skills: t.skills.iter().filter(|r| r.user_id == user_id).count() as i64,
            generated_resumes: t.resumes.iter().filter(|r| r.user_id == user_id).count() as i64,
        }))
    }

    async fn add_experience(&self, input: &NewExperience) -> Result<WorkExperience, AppError> {
        let row = WorkExperience {
            id: Uuid::new_v4(),
            user_id: input.user_id,
            company_name: input.company_name.clone(),
            position: input.position.clone(),
            location: input.location.clone(),
            start_date: input.start_date,
            end_date: if input.is_current { None } else { input.end_date },
            is_current: input.is_current,
            description: input.description.clone(),
            achievements: input.achievements.clone(),
            technologies: input.technologies.clone(),
            created_at: Utc::now(),
        };
        self.insert_for(input.user_id, |t| t.experiences.push(row.clone()))?;
        Ok(row)
    }

    async fn list_experiences(&self, user_id: Uuid) -> Result<Vec<WorkExperience>, AppError> {
        let mut rows: Vec<_> = self.with(|t| {
            t.experiences
                .iter()
                .filter(|r| r.user_id == user_id)
                .cloned()
                .collect()
        });
        rows.sort_by(|a, b| b.start_date.cmp(&a.start_date));
        Ok(rows)
    }

    async fn update_experience(
        &self,
        id: Uuid,
        update: &ExperienceUpdate,
    ) -> Result<Option<WorkExperience>, AppError> {
        Ok(self.with(|t| {
            let row = t.experiences.iter_mut().find(|r| r.id == id)?;
            if let Some(v) = &update.company_name {
                row.company_name = v.clone();
            }
            if let Some(v) = &update.position {
                row.position = v.clone();
            }
            if update.location.is_some() {
                row.location = update.location.clone();
            }
            if let Some(v) = update.start_date {
                row.start_date = v;
            }
            if update.end_date.is_some() {
                row.end_date = update.end_date;
            }
            if let Some(v) = update.is_current {
                row.is_current = v;
            }
            if row.is_current {
                row.end_date = None;
            }
            if update.description.is_some() {
                row.description = update.description.clone();
            }
            if let Some(v) = &update.achievements {
                row.achievements = v.clone();
            }
            if let Some(v) = &update.technologies {
                row.technologies = v.clone();
            }
            Some(row.clone())
        }))
    }

    async fn delete_experience(&self, id: Uuid) -> Result<bool, AppError> {
        Ok(self.with(|t| remove_where(&mut t.experiences, |r| r.id == id)))
    }

    async fn add_project(&self, input: &NewProject) -> Result<Project, AppError> {
        let row = Project {
            id: Uuid::new_v4(),
            user_id: input.user_id,
            title: input.title.clone(),
            description: input.description.clone(),
            url: input.url.clone(),
            start_date: input.start_date,
            end_date: input.end_date,
            achievements: input.achievements.clone(),
            technologies: input.technologies.clone(),
            created_at: Utc::now(),
        };
        self.insert_for(input.user_id, |t| t.projects.push(row.clone()))?;
        Ok(row)
    }

    async fn list_projects(&self, user_id: Uuid) -> Result<Vec<Project>, AppError> {
        let mut rows: Vec<_> = self.with(|t| {
            t.projects
                .iter()
                .filter(|r| r.user_id == user_id)
                .cloned()
                .collect()
        });
        // undated projects sort last
        rows.sort_by(|a, b| match (a.start_date, b.start_date) {
            (Some(x), Some(y)) => y.cmp(&x),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        });
        Ok(rows)
    }

    async fn update_project(
        &self,
        id: Uuid,
        update: &ProjectUpdate,
    ) -> Result<Option<Project>, AppError> {
        Ok(self.with(|t| {
            let row = t.projects.iter_mut().find(|r| r.id == id)?;
            if let Some(v) = &update.title {
                row.title = v.clone();
            }
            if update.description.is_some() {
                row.description = update.description.clone();
            }
            if update.url.is_some() {
                row.url = update.url.clone();
            }
            if update.start_date.is_some() {
                row.start_date = update.start_date;
            }
            if update.end_date.is_some() {
                row.end_date = update.end_date;
            }
            if let Some(v) = &update.achievements {
                row.achievements = v.clone();
            }
            if let Some(v) = &update.technologies {
                row.technologies = v.clone();
            }
            Some(row.clone())
        }))
    }

    async fn delete_project(&self, id: Uuid) -> Result<bool, AppError> {
        Ok(self.with(|t| remove_where(&mut t.projects, |r| r.id == id)))
    }

    async fn add_education(&self, input: &NewEducation) -> Result<Education, AppError> {
        let row = Education {
            id: Uuid::new_v4(),
            user_id: input.user_id,
            institution: input.institution.clone(),
            degree: input.degree.clone(),
            field_of_study: input.field_of_study.clone(),
            location: input.location.clone(),
            start_date: input.start_date,
            end_date: input.end_date,
            created_at: Utc::now(),
        };
        self.insert_for(input.user_id, |t| t.education.push(row.clone()))?;
        Ok(row)
    }

    async fn list_education(&self, user_id: Uuid) -> Result<Vec<Education>, AppError> {
        let mut rows: Vec<_> = self.with(|t| {
            t.education
                .iter()
                .filter(|r| r.user_id == user_id)
                .cloned()
                .collect()
        });
        rows.sort_by(|a, b| b.start_date.cmp(&a.start_date));
        Ok(rows)
    }

    async fn delete_education(&self, id: Uuid) -> Result<bool, AppError> {
        Ok(self.with(|t| remove_where(&mut t.education, |r| r.id == id)))
    }

    async fn add_skill(&self, input: &NewSkill) -> Result<Skill, AppError> {
        let row = Skill {
            id: Uuid::new_v4(),
            user_id: input.user_id,
            skill_name: input.skill_name.clone(),
            category: input.category.clone(),
            proficiency_level: input.proficiency_level,
            created_at: Utc::now(),
        };
        self.insert_for(input.user_id, |t| t.skills.push(row.clone()))?;
        Ok(row)
    }

    async fn list_skills(&self, user_id: Uuid) -> Result<Vec<Skill>, AppError> {
        let mut rows: Vec<_> = self.with(|t| {
            t.skills
                .iter()
                .filter(|r| r.user_id == user_id)
                .cloned()
                .collect()
        });
        rows.sort_by(|a, b| b.proficiency_level.cmp(&a.proficiency_level));
        Ok(rows)
    }

    async fn list_skills_by_category(
        &self,
        user_id: Uuid,
        category: &str,
    ) -> Result<Vec<Skill>, AppError> {
        let mut rows = self.list_skills(user_id).await?;
        rows.retain(|s| s.category.eq_ignore_ascii_case(category));
        Ok(rows)
    }

    async fn delete_skill(&self, id: Uuid) -> Result<bool, AppError> {
        Ok(self.with(|t| remove_where(&mut t.skills, |r| r.id == id)))
    }

    async fn add_certification(
        &self,
        input: &NewCertification,
    ) -> Result<Certification, AppError> {
        let row = Certification {
            id: Uuid::new_v4(),
            user_id: input.user_id,
            name: input.name.clone(),
            issuing_organization: input.issuing_organization.clone(),
            issue_date: input.issue_date,
            created_at: Utc::now(),
        };
        self.insert_for(input.user_id, |t| t.certifications.push(row.clone()))?;
        Ok(row)
    }

    async fn list_certifications(&self, user_id: Uuid) -> Result<Vec<Certification>, AppError> {
        let mut rows: Vec<_> = self.with(|t| {
            t.certifications
                .iter()
                .filter(|r| r.user_id == user_id)
                .cloned()
                .collect()
        });
        rows.sort_by(|a, b| b.issue_date.cmp(&a.issue_date));
        Ok(rows)
    }

    async fn delete_certification(&self, id: Uuid) -> Result<bool, AppError> {
        Ok(self.with(|t| remove_where(&mut t.certifications, |r| r.id == id)))
    }

    async fn save_generated_resume(
        &self,
        input: &NewGeneratedResume,
    ) -> Result<GeneratedResume, AppError> {
        let row = GeneratedResume {
            id: Uuid::new_v4(),
            user_id: input.user_id,
            job_title: input.job_title.clone(),
            company_name: input.company_name.clone(),
            job_description: input.job_description.clone(),
            jd_analysis: Json(input.jd_analysis.clone()),
            tailored_summary: input.tailored_summary.clone(),
            markdown_source: input.markdown_source.clone(),
            created_at: Utc::now(),
        };
        self.insert_for(input.user_id, |t| t.resumes.push(row.clone()))?;
        Ok(row)
    }

    async fn list_generated_resumes(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<GeneratedResume>, AppError> {
        // newest first; insertion order breaks timestamp ties
        Ok(self.with(|t| {
            t.resumes
                .iter()
                .rev()
                .filter(|r| r.user_id == user_id)
                .cloned()
                .collect()
        }))
    }

    async fn get_generated_resume(&self, id: Uuid) -> Result<Option<GeneratedResume>, AppError> {
        Ok(self.with(|t| t.resumes.iter().find(|r| r.id == id).cloned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn profile(user_id: Uuid, email: &str) -> ProfileInput {
        ProfileInput {
            user_id,
            email: email.to_string(),
            full_name: "Test User".to_string(),
            phone: None,
            location: None,
            linkedin_url: None,
            github_url: None,
            portfolio_url: None,
            years_of_experience: 3,
        }
    }

    async fn with_user(store: &MemoryProfileStore) -> Uuid {
        let user_id = Uuid::new_v4();
        store
            .save_profile(&profile(user_id, &format!("{user_id}@example.com")))
            .await
            .unwrap();
        user_id
    }

    fn date(y: i32, m: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, 1).unwrap()
    }

    fn experience(user_id: Uuid, company: &str, start: (i32, u32)) -> NewExperience {
        NewExperience {
            user_id,
            company_name: company.to_string(),
            position: "Engineer".to_string(),
            location: None,
            start_date: date(start.0, start.1),
            end_date: None,
            is_current: false,
            description: None,
            achievements: vec![],
            technologies: vec![],
        }
    }

    #[tokio::test]
    async fn test_experiences_listed_newest_first() {
        let store = MemoryProfileStore::new();
        let user = with_user(&store).await;
        let other = with_user(&store).await;
        store.add_experience(&experience(user, "Old", (2015, 1))).await.unwrap();
        store.add_experience(&experience(user, "New", (2022, 6))).await.unwrap();
        store.add_experience(&experience(other, "Other", (2023, 1))).await.unwrap();

        let rows = store.list_experiences(user).await.unwrap();
        let names: Vec<_> = rows.iter().map(|r| r.company_name.as_str()).collect();
        assert_eq!(names, vec!["New", "Old"]);
    }

    #[tokio::test]
    async fn test_partial_update_keeps_untouched_fields() {
        let store = MemoryProfileStore::new();
        let user = with_user(&store).await;
        let row = store.add_experience(&experience(user, "Acme", (2020, 1))).await.unwrap();

        let update = ExperienceUpdate {
            position: Some("Staff Engineer".to_string()),
            ..Default::default()
        };
        let updated = store.update_experience(row.id, &update).await.unwrap().unwrap();
        assert_eq!(updated.position, "Staff Engineer");
        assert_eq!(updated.company_name, "Acme");

        assert!(store
            .update_experience(Uuid::new_v4(), &update)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_marking_role_current_clears_end_date() {
        let store = MemoryProfileStore::new();
        let user = with_user(&store).await;
        let mut input = experience(user, "Acme", (2020, 1));
        input.end_date = Some(date(2022, 1));
        let row = store.add_experience(&input).await.unwrap();
        assert_eq!(row.end_date, Some(date(2022, 1)));

        let update = ExperienceUpdate {
            is_current: Some(true),
            ..Default::default()
        };
        let updated = store.update_experience(row.id, &update).await.unwrap().unwrap();
        assert!(updated.is_current);
        assert_eq!(updated.end_date, None);

        // an end date sent together with is_current is dropped too
        let update = ExperienceUpdate {
            end_date: Some(date(2024, 1)),
            ..Default::default()
        };
        let updated = store.update_experience(row.id, &update).await.unwrap().unwrap();
        assert_eq!(updated.end_date, None);
    }

    #[tokio::test]
    async fn test_delete_reports_missing_rows() {
        let store = MemoryProfileStore::new();
        let user = with_user(&store).await;
        let row = store.add_experience(&experience(user, "Acme", (2020, 1))).await.unwrap();
        assert!(store.delete_experience(row.id).await.unwrap());
        assert!(!store.delete_experience(row.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_resave_updates_email() {
        let store = MemoryProfileStore::new();
        let user = Uuid::new_v4();
        store.save_profile(&profile(user, "old@example.com")).await.unwrap();

        let saved = store.save_profile(&profile(user, "new@example.com")).await.unwrap();
        assert_eq!(saved.email, "new@example.com");
        let stored = store.get_profile(user).await.unwrap().unwrap();
        assert_eq!(stored.email, "new@example.com");
        assert!(store
            .find_profile_by_email("old@example.com")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_records_need_an_existing_profile() {
        let store = MemoryProfileStore::new();
        let err = store
            .add_experience(&experience(Uuid::new_v4(), "Acme", (2020, 1)))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let err = store
            .add_skill(&NewSkill {
                user_id: Uuid::new_v4(),
                skill_name: "Rust".to_string(),
                category: "Programming Languages".to_string(),
                proficiency_level: 4,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
