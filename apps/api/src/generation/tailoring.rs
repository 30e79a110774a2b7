//! Content Tailoring: Rewrites achievements toward the job description and
//! writes the professional summary.
//!
//! Nothing here returns an error. Each operation works on a clone of its
//! input and falls back to the untouched clone (or a templated summary) when
//! the completion service is missing, fails, or answers with something
//! unusable.

use serde_json::Value;
use tracing::debug;

use crate::generation::jd_analyzer::JobAnalysis;
use crate::generation::prompts::{achievements_prompt, summary_prompt};
use crate::llm_client::decode::decode_object;
use crate::llm_client::{try_complete, CompletionRequest, CompletionService};
use crate::models::profile::{Project, UserProfile, WorkExperience};

const MAX_FOCUS_TERMS: usize = 5;
const MAX_SUMMARY_SKILLS: usize = 3;
const MAX_FALLBACK_SKILLS: usize = 2;
/// Generated summaries at or under this many characters are discarded.
const MIN_SUMMARY_CHARS: usize = 50;
pub const DEFAULT_YEARS_OF_EXPERIENCE: i32 = 5;
const DEFAULT_ROLE: &str = "Software Engineer";

/// Returns a copy of `experience` with achievements rewritten around the
/// JD keywords when possible.
pub async fn tailor_experience(
    llm: Option<&dyn CompletionService>,
    experience: &WorkExperience,
    analysis: &JobAnalysis,
) -> WorkExperience {
    let mut tailored = experience.clone();
    if let Some(achievements) = rewrite_achievements(
        llm,
        "work experience",
        "keywords",
        &analysis.keywords,
        &experience.achievements,
    )
    .await
    {
        tailored.achievements = achievements;
    }
    tailored
}

/// Returns a copy of `project` with achievements rewritten around the
/// JD's required skills when possible.
pub async fn tailor_project(
    llm: Option<&dyn CompletionService>,
    project: &Project,
    analysis: &JobAnalysis,
) -> Project {
    let mut tailored = project.clone();
    if let Some(achievements) = rewrite_achievements(
        llm,
        "project",
        "skills",
        &analysis.required_skills,
        &project.achievements,
    )
    .await
    {
        tailored.achievements = achievements;
    }
    tailored
}

async fn rewrite_achievements(
    llm: Option<&dyn CompletionService>,
    subject: &str,
    focus_label: &str,
    focus: &[String],
    achievements: &[String],
) -> Option<Vec<String>> {
    if llm.is_none() || achievements.is_empty() {
        return None;
    }

    let focus: Vec<String> = focus.iter().take(MAX_FOCUS_TERMS).cloned().collect();
    let prompt = achievements_prompt(subject, focus_label, &focus, achievements);
    let request = CompletionRequest {
        prompt: &prompt,
        temperature: 0.5,
        max_tokens: 300,
    };
    let text = try_complete(llm, &request, "achievement rewrite").await?;
    let decoded = decode_object(&text).ok()?;
    let rewritten = parse_achievements(decoded.get("achievements")?);
    if rewritten.is_none() {
        debug!("Discarding unusable {subject} achievement rewrite");
    }
    rewritten
}

/// Accepts only an array of strings holding at least one non-blank entry.
fn parse_achievements(value: &Value) -> Option<Vec<String>> {
    let items = value.as_array()?;
    let strings = items
        .iter()
        .map(|v| v.as_str().map(str::to_string))
        .collect::<Option<Vec<_>>>()?;
    strings
        .iter()
        .any(|s| !s.trim().is_empty())
        .then_some(strings)
}

/// Writes the professional summary for the resume header.
///
/// `most_recent` is the first selected experience, if any.
pub async fn generate_summary(
    llm: Option<&dyn CompletionService>,
    profile: Option<&UserProfile>,
    analysis: &JobAnalysis,
    most_recent: Option<&WorkExperience>,
) -> String {
    let years = profile
        .map(|p| p.years_of_experience)
        .unwrap_or(DEFAULT_YEARS_OF_EXPERIENCE);
    let current_role = most_recent
        .map(|e| e.position.as_str())
        .filter(|p| !p.trim().is_empty())
        .unwrap_or(DEFAULT_ROLE);
    let skills: Vec<String> = analysis
        .required_skills
        .iter()
        .take(MAX_SUMMARY_SKILLS)
        .cloned()
        .collect();

    let prompt = summary_prompt(years, current_role, &analysis.job_title, &skills);
    let request = CompletionRequest {
        prompt: &prompt,
        temperature: 0.7,
        max_tokens: 150,
    };

    match try_complete(llm, &request, "summary").await {
        Some(text) if text.trim().chars().count() > MIN_SUMMARY_CHARS => text.trim().to_string(),
        Some(_) => {
            debug!("Generated summary too short; using template");
            fallback_summary(years, analysis)
        }
        None => fallback_summary(years, analysis),
    }
}

pub fn fallback_summary(years: i32, analysis: &JobAnalysis) -> String {
    let skills: Vec<&str> = analysis
        .required_skills
        .iter()
        .take(MAX_FALLBACK_SKILLS)
        .map(String::as_str)
        .collect();
    let skills = if skills.is_empty() {
        "software development".to_string()
    } else {
        skills.join(", ")
    };
    format!(
        "Experienced professional with {years}+ years in software development. \
         Skilled in {skills} with a proven track record of delivering high-quality solutions. \
         Seeking to leverage technical expertise and problem-solving abilities in a challenging role."
    )
}
