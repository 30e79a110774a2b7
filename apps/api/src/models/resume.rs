use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use crate::generation::jd_analyzer::JobAnalysis;

/// One completed pipeline run. Append-only: inserted once, never updated.
///
/// `markdown_source` is enough to re-render the PDF without the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct GeneratedResume {
    pub id: Uuid,
    pub user_id: Uuid,
    pub job_title: String,
    pub company_name: String,
    pub job_description: String,
    pub jd_analysis: Json<JobAnalysis>,
    pub tailored_summary: String,
    pub markdown_source: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewGeneratedResume {
    pub user_id: Uuid,
    pub job_title: String,
    pub company_name: String,
    pub job_description: String,
    pub jd_analysis: JobAnalysis,
    pub tailored_summary: String,
    pub markdown_source: String,
}

impl GeneratedResume {
    /// Download name for the rendered PDF, e.g. `Resume_Acme_Corp.pdf`.
    pub fn pdf_file_name(&self) -> String {
        pdf_file_name(&self.company_name)
    }
}

pub fn pdf_file_name(company_name: &str) -> String {
    let safe: String = company_name
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let safe = if safe.is_empty() { "Company".to_string() } else { safe };
    format!("Resume_{safe}.pdf")
}
