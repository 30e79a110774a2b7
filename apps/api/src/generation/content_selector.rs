//! Content Selector: Picks the experiences, projects and skills that go on
//! the resume.
//!
//! Experiences and projects run an ordered fallback chain: completion-service
//! ranking, then keyword scoring, then plain truncation. The first strategy
//! that produces a usable selection wins. Skills are partitioned
//! deterministically and never touch the completion service.

use std::collections::HashSet;

use serde_json::Value;
use tracing::{debug, info};

use crate::generation::jd_analyzer::JobAnalysis;
use crate::generation::prompts::selection_prompt;
use crate::llm_client::decode::decode_json;
use crate::llm_client::{try_complete, CompletionRequest, CompletionService};
use crate::models::profile::{Project, Skill, WorkExperience};

/// Experiences and projects kept per resume unless the caller says otherwise.
pub const DEFAULT_SELECTION_LIMIT: usize = 3;
pub const MAX_SELECTED_SKILLS: usize = 20;
/// Candidates shown to the completion service; indices outside this window are ignored.
const MAX_LISTED_CANDIDATES: usize = 10;
const MAX_PROMPT_SKILLS: usize = 5;

/// A record that can be ranked against a job description.
pub trait Candidate: Clone {
    /// Plural noun used in the ranking prompt.
    const KIND: &'static str;

    /// One-line label shown in the numbered listing.
    fn listing_label(&self) -> String;

    /// Text searched by keyword scoring.
    fn search_text(&self) -> String;
}

impl Candidate for WorkExperience {
    const KIND: &'static str = "work experiences";

    fn listing_label(&self) -> String {
        format!("{} at {}", self.position, self.company_name)
    }

    fn search_text(&self) -> String {
        format!(
            "{} {} {}",
            self.position,
            self.description.as_deref().unwrap_or_default(),
            self.technologies.join(" ")
        )
    }
}

impl Candidate for Project {
    const KIND: &'static str = "projects";

    fn listing_label(&self) -> String {
        self.title.clone()
    }

    fn search_text(&self) -> String {
        format!(
            "{} {} {}",
            self.title,
            self.description.as_deref().unwrap_or_default(),
            self.technologies.join(" ")
        )
    }
}

pub async fn select_experiences(
    llm: Option<&dyn CompletionService>,
    experiences: &[WorkExperience],
    analysis: &JobAnalysis,
    limit: usize,
) -> Vec<WorkExperience> {
    select_ranked(llm, experiences, analysis, limit).await
}

pub async fn select_projects(
    llm: Option<&dyn CompletionService>,
    projects: &[Project],
    analysis: &JobAnalysis,
    limit: usize,
) -> Vec<Project> {
    select_ranked(llm, projects, analysis, limit).await
}

/// Returns at most `limit` candidates. When everything fits, the input is
/// returned unchanged and in order.
pub async fn select_ranked<T: Candidate>(
    llm: Option<&dyn CompletionService>,
    candidates: &[T],
    analysis: &JobAnalysis,
    limit: usize,
) -> Vec<T> {
    if candidates.len() <= limit {
        return candidates.to_vec();
    }

    if let Some(selected) = rank_with_completion(llm, candidates, analysis, limit).await {
        info!("Selected {} {} by completion ranking", selected.len(), T::KIND);
        return selected;
    }
    if let Some(selected) = rank_by_keywords(candidates, analysis, limit) {
        info!("Selected {} {} by keyword scoring", selected.len(), T::KIND);
        return selected;
    }

    info!("Selected the first {limit} {}", T::KIND);
    candidates[..limit].to_vec()
}

async fn rank_with_completion<T: Candidate>(
    llm: Option<&dyn CompletionService>,
    candidates: &[T],
    analysis: &JobAnalysis,
    limit: usize,
) -> Option<Vec<T>> {
    // without required skills there is nothing to rank against
    if llm.is_none() || analysis.required_skills.is_empty() {
        return None;
    }

    let window = &candidates[..candidates.len().min(MAX_LISTED_CANDIDATES)];
    let listing = window
        .iter()
        .enumerate()
        .map(|(i, c)| format!("{i}. {}", c.listing_label()))
        .collect::<Vec<_>>()
        .join("\n");
    let skills: Vec<String> = analysis
        .required_skills
        .iter()
        .take(MAX_PROMPT_SKILLS)
        .cloned()
        .collect();
    let prompt = selection_prompt(T::KIND, window.len(), limit, &skills, &listing);
    let request = CompletionRequest {
        prompt: &prompt,
        temperature: 0.3,
        max_tokens: 50,
    };

    let text = try_complete(llm, &request, T::KIND).await?;
    let indices = match decode_json(&text) {
        Ok(Value::Array(items)) => items,
        _ => {
            debug!("Ranking response for {} was not an index array", T::KIND);
            return None;
        }
    };

    let mut seen = HashSet::new();
    let selected: Vec<T> = indices
        .iter()
        .filter_map(Value::as_u64)
        .filter_map(|i| usize::try_from(i).ok())
        .filter(|&i| i < window.len() && seen.insert(i))
        .take(limit)
        .map(|i| window[i].clone())
        .collect();

    (!selected.is_empty()).then_some(selected)
}

/// Scores each candidate by how many JD keywords its text contains.
/// Returns `None` when the analysis has no keywords to score with.
fn rank_by_keywords<T: Candidate>(
    candidates: &[T],
    analysis: &JobAnalysis,
    limit: usize,
) -> Option<Vec<T>> {
    let bag = keyword_bag(analysis);
    if bag.is_empty() {
        return None;
    }

    let mut scored: Vec<(usize, &T)> = candidates
        .iter()
        .map(|c| {
            let text = c.search_text().to_lowercase();
            let score = bag.iter().filter(|kw| text.contains(kw.as_str())).count();
            (score, c)
        })
        .collect();
    // stable: equal scores keep their stored order
    scored.sort_by(|a, b| b.0.cmp(&a.0));

    Some(
        scored
            .into_iter()
            .take(limit)
            .map(|(_, c)| c.clone())
            .collect(),
    )
}

/// Lowercased union of required skills and keywords, first occurrence wins.
fn keyword_bag(analysis: &JobAnalysis) -> Vec<String> {
    let mut seen = HashSet::new();
    analysis
        .required_skills
        .iter()
        .chain(analysis.keywords.iter())
        .map(|kw| kw.trim().to_lowercase())
        .filter(|kw| !kw.is_empty() && seen.insert(kw.clone()))
        .collect()
}

/// Puts skills matching the JD first, the rest after, each group in stored
/// order, and caps the list at [`MAX_SELECTED_SKILLS`].
pub fn select_skills(skills: &[Skill], analysis: &JobAnalysis) -> Vec<Skill> {
    let tokens: Vec<String> = analysis
        .required_skills
        .iter()
        .chain(analysis.preferred_skills.iter())
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect();

    let (mut matching, rest): (Vec<&Skill>, Vec<&Skill>) = skills.iter().partition(|skill| {
        let name = skill.skill_name.trim().to_lowercase();
        !name.is_empty()
            && tokens
                .iter()
                .any(|t| name.contains(t.as_str()) || t.contains(name.as_str()))
    });
    matching.extend(rest);

    matching
        .into_iter()
        .take(MAX_SELECTED_SKILLS)
        .cloned()
        .collect()
}
