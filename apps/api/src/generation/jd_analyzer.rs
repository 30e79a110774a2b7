//! JD Analyzer: Turns a raw job description into a fully-populated `JobAnalysis`.
//!
//! The completion service does the extraction when it is available. When it
//! is not, or its answer cannot be decoded, a keyword heuristic stands in.
//! Either way the raw result passes through [`complete_or_default`], so
//! callers never see a partial analysis.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::{info, warn};

use crate::generation::prompts::jd_analysis_prompt;
use crate::llm_client::decode::decode_object;
use crate::llm_client::{try_complete, CompletionRequest, CompletionService};

/// Characters of job description sent to the completion service.
pub const MAX_JD_CHARS: usize = 2000;
const MAX_TITLE_CHARS: usize = 100;
const MAX_HEURISTIC_SKILLS: usize = 10;
const MAX_HEURISTIC_KEYWORDS: usize = 5;

/// (search term, display form) pairs recognised by the heuristic extractor.
const SKILL_VOCABULARY: &[(&str, &str)] = &[
    ("python", "Python"),
    ("java", "Java"),
    ("javascript", "JavaScript"),
    ("react", "React"),
    ("node", "Node"),
    ("sql", "SQL"),
    ("aws", "AWS"),
    ("docker", "Docker"),
];

/// Structured view of a job description. Every field is always populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobAnalysis {
    pub job_title: String,
    pub company_name: String,
    pub required_skills: Vec<String>,
    pub preferred_skills: Vec<String>,
    pub responsibilities: Vec<String>,
    pub qualifications: Vec<String>,
    pub experience_required: String,
    pub education_required: String,
    pub keywords: Vec<String>,
    pub industry: String,
    pub job_type: String,
}

impl Default for JobAnalysis {
    fn default() -> Self {
        Self {
            job_title: "Software Engineer".to_string(),
            company_name: "Company".to_string(),
            required_skills: Vec::new(),
            preferred_skills: Vec::new(),
            responsibilities: Vec::new(),
            qualifications: Vec::new(),
            experience_required: "Not specified".to_string(),
            education_required: "Not specified".to_string(),
            keywords: Vec::new(),
            industry: "Technology".to_string(),
            job_type: "Full-time".to_string(),
        }
    }
}

/// Analyzes `jd_text`. Never fails: completion and decoding problems are
/// logged and replaced by the heuristic extraction.
pub async fn analyze_job_description(
    llm: Option<&dyn CompletionService>,
    jd_text: &str,
) -> JobAnalysis {
    if jd_text.trim().is_empty() {
        return JobAnalysis::default();
    }

    let prompt = jd_analysis_prompt(truncate_chars(jd_text, MAX_JD_CHARS));
    let request = CompletionRequest {
        prompt: &prompt,
        temperature: 0.3,
        max_tokens: 1000,
    };

    let extracted = match try_complete(llm, &request, "job description analysis").await {
        Some(text) => match decode_object(&text) {
            Ok(map) => Some(map),
            Err(e) => {
                warn!("Could not decode job description analysis: {e}; using heuristic");
                None
            }
        },
        None => None,
    };

    let raw = match extracted {
        Some(map) => map,
        None => {
            info!("Analyzing job description with keyword heuristic");
            heuristic_extract(jd_text)
        }
    };
    complete_or_default(&raw)
}

/// Builds an analysis from arbitrary decoded JSON. Missing, null, blank and
/// wrongly-typed keys take their default. Lists also accept a comma-separated
/// string; text fields also accept numbers. `title` and `company` are accepted
/// as aliases for `job_title` and `company_name`.
pub fn complete_or_default(raw: &Map<String, Value>) -> JobAnalysis {
    let defaults = JobAnalysis::default();
    let field = |keys: &[&str]| keys.iter().find_map(|k| raw.get(*k));
    let text = |keys: &[&str], default: String| field(keys).and_then(coerce_text).unwrap_or(default);
    let list = |key: &str| raw.get(key).and_then(coerce_list).unwrap_or_default();

    JobAnalysis {
        job_title: text(&["job_title", "title"], defaults.job_title),
        company_name: text(&["company_name", "company"], defaults.company_name),
        required_skills: list("required_skills"),
        preferred_skills: list("preferred_skills"),
        responsibilities: list("responsibilities"),
        qualifications: list("qualifications"),
        experience_required: text(&["experience_required"], defaults.experience_required),
        education_required: text(&["education_required"], defaults.education_required),
        keywords: list("keywords"),
        industry: text(&["industry"], defaults.industry),
        job_type: text(&["job_type"], defaults.job_type),
    }
}

fn coerce_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn coerce_list(value: &Value) -> Option<Vec<String>> {
    match value {
        Value::Array(items) => Some(items.iter().filter_map(coerce_text).collect()),
        Value::String(s) => Some(
            s.split(',')
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .map(str::to_string)
                .collect(),
        ),
        _ => None,
    }
}

/// Deterministic extraction: first non-empty line as the title plus any
/// vocabulary skills mentioned anywhere in the text.
pub fn heuristic_extract(jd_text: &str) -> Map<String, Value> {
    let title = jd_text
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(|line| truncate_chars(line, MAX_TITLE_CHARS).to_string());

    let lowered = jd_text.to_lowercase();
    let skills: Vec<&str> = SKILL_VOCABULARY
        .iter()
        .filter(|(term, _)| lowered.contains(term))
        .map(|(_, display)| *display)
        .collect();

    let mut raw = Map::new();
    if let Some(title) = title {
        raw.insert("job_title".to_string(), json!(title));
    }
    raw.insert(
        "required_skills".to_string(),
        json!(skills.iter().take(MAX_HEURISTIC_SKILLS).collect::<Vec<_>>()),
    );
    raw.insert(
        "keywords".to_string(),
        json!(skills.iter().take(MAX_HEURISTIC_KEYWORDS).collect::<Vec<_>>()),
    );
    raw
}

/// Returns the prefix of `text` holding at most `max` characters.
fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::stub::ScriptedCompletion;

    const BACKEND_JD: &str = "Senior Backend Engineer\n\
        Acme Cloud is hiring.\n\
        Requirements: Python, AWS, Docker and strong SQL skills.";

    fn to_map(analysis: &JobAnalysis) -> Map<String, Value> {
        match serde_json::to_value(analysis).unwrap() {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[tokio::test]
    async fn test_empty_input_returns_defaults_without_calling_service() {
        let llm = ScriptedCompletion::always(r#"{"job_title": "Ignored"}"#);
        let analysis = analyze_job_description(Some(&llm), "   \n ").await;
        assert_eq!(analysis, JobAnalysis::default());
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn test_uses_completion_output_and_fills_gaps() {
        let llm = ScriptedCompletion::always(
            "Here you go:\n```json\n{\"job_title\": \"Data Engineer\", \"company_name\": \"Initech\", \"required_skills\": [\"Spark\", \"SQL\"]}\n```",
        );
        let analysis = analyze_job_description(Some(&llm), BACKEND_JD).await;
        assert_eq!(analysis.job_title, "Data Engineer");
        assert_eq!(analysis.company_name, "Initech");
        assert_eq!(analysis.required_skills, vec!["Spark", "SQL"]);
        assert_eq!(analysis.industry, "Technology");
        assert_eq!(analysis.experience_required, "Not specified");
        assert!(llm.prompts()[0].contains("Senior Backend Engineer"));
    }

    #[tokio::test]
    async fn test_same_response_gives_same_analysis() {
        let llm = ScriptedCompletion::always(
            r#"{"job_title": "Data Engineer", "required_skills": ["Spark", " ", "SQL"], "keywords": ["ETL"]}"#,
        );
        let first = analyze_job_description(Some(&llm), BACKEND_JD).await;
        let second = analyze_job_description(Some(&llm), BACKEND_JD).await;
        assert_eq!(first, second);
        assert_eq!(first.required_skills, vec!["Spark", "SQL"]);
        assert_eq!(llm.call_count(), 2);
        assert_eq!(llm.prompts()[0], llm.prompts()[1]);

        let failing = ScriptedCompletion::failing();
        let first = analyze_job_description(Some(&failing), BACKEND_JD).await;
        let second = analyze_job_description(Some(&failing), BACKEND_JD).await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_heuristic_when_service_fails() {
        let llm = ScriptedCompletion::failing();
        let analysis = analyze_job_description(Some(&llm), BACKEND_JD).await;
        assert_eq!(analysis.job_title, "Senior Backend Engineer");
        assert_eq!(analysis.company_name, "Company");
        assert_eq!(analysis.required_skills, vec!["Python", "SQL", "AWS", "Docker"]);
        assert_eq!(analysis.keywords, vec!["Python", "SQL", "AWS", "Docker"]);
    }

    #[tokio::test]
    async fn test_heuristic_when_output_is_not_an_object() {
        let llm = ScriptedCompletion::always("[1, 2, 3]");
        let analysis = analyze_job_description(Some(&llm), BACKEND_JD).await;
        assert_eq!(analysis.job_title, "Senior Backend Engineer");
    }

    #[tokio::test]
    async fn test_heuristic_without_service() {
        let analysis = analyze_job_description(None, "\n\n  Frontend Dev  \nReact and JavaScript").await;
        assert_eq!(analysis.job_title, "Frontend Dev");
        // "java" also occurs inside "javascript"
        assert_eq!(analysis.required_skills, vec!["Java", "JavaScript", "React"]);
    }

    #[tokio::test]
    async fn test_prompt_truncates_long_descriptions() {
        let llm = ScriptedCompletion::failing();
        let long = format!("Title\n{}", "é".repeat(3000));
        analyze_job_description(Some(&llm), &long).await;
        let prompt = &llm.prompts()[0];
        let sent = prompt.matches('é').count();
        assert_eq!(sent, MAX_JD_CHARS - "Title\n".chars().count());
    }

    #[test]
    fn test_heuristic_title_is_capped() {
        let raw = heuristic_extract(&"x".repeat(250));
        assert_eq!(raw["job_title"].as_str().unwrap().len(), MAX_TITLE_CHARS);
    }

    #[test]
    fn test_heuristic_caps_keywords_at_five() {
        let raw = heuristic_extract("python java react node sql aws docker");
        let analysis = complete_or_default(&raw);
        assert_eq!(analysis.required_skills.len(), 7);
        assert_eq!(analysis.keywords.len(), 5);
    }

    #[test]
    fn test_complete_or_default_coerces_types() {
        let raw = json!({
            "title": "Platform Engineer",
            "company": 42,
            "required_skills": "Rust, Go , ,Kubernetes",
            "preferred_skills": ["Terraform", 7, null, "  "],
            "responsibilities": null,
            "qualifications": {"unexpected": true},
            "experience_required": "",
            "industry": "   ",
            "job_type": false
        });
        let analysis = complete_or_default(raw.as_object().unwrap());
        assert_eq!(analysis.job_title, "Platform Engineer");
        assert_eq!(analysis.company_name, "42");
        assert_eq!(analysis.required_skills, vec!["Rust", "Go", "Kubernetes"]);
        assert_eq!(analysis.preferred_skills, vec!["Terraform", "7"]);
        assert!(analysis.responsibilities.is_empty());
        assert!(analysis.qualifications.is_empty());
        assert_eq!(analysis.experience_required, "Not specified");
        assert_eq!(analysis.industry, "Technology");
        assert_eq!(analysis.job_type, "Full-time");
    }

    #[test]
    fn test_complete_or_default_prefers_canonical_keys() {
        let raw = json!({"job_title": "A", "title": "B"});
        assert_eq!(complete_or_default(raw.as_object().unwrap()).job_title, "A");
    }

    #[test]
    fn test_complete_or_default_is_idempotent() {
        let raw = json!({
            "job_title": "SRE",
            "required_skills": ["Linux"],
            "keywords": "on-call, observability"
        });
        let once = complete_or_default(raw.as_object().unwrap());
        let twice = complete_or_default(&to_map(&once));
        assert_eq!(once, twice);
        assert_eq!(complete_or_default(&Map::new()), JobAnalysis::default());
    }

    #[test]
    fn test_truncate_chars_respects_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("hi", 10), "hi");
    }
}
