// All completion prompt templates for the Generation module.
// Placeholders in `{braces}` are filled by `fill` before sending; shared fragments
// come from llm_client::prompts.

use crate::llm_client::prompts::JSON_ONLY_INSTRUCTION;

/// JD analysis prompt. Replace `{jd_text}` before sending.
pub const JD_ANALYSIS_PROMPT_TEMPLATE: &str = r#"Analyze this job description and extract information in JSON format:
{
  "job_title": "extracted job title",
  "company_name": "extracted company name",
  "required_skills": ["skill1", "skill2"],
  "preferred_skills": ["skill1", "skill2"],
  "responsibilities": ["resp1", "resp2"],
  "qualifications": ["qual1", "qual2"],
  "experience_required": "X years",
  "education_required": "degree requirement",
  "keywords": ["keyword1", "keyword2"],
  "industry": "industry name",
  "job_type": "full-time/part-time/contract/remote"
}

Job Description:
{jd_text}

{json_only}"#;

/// Candidate ranking prompt. Replace `{count}`, `{kind}`, `{limit}`,
/// `{skills}` and `{listing}` before sending.
pub const SELECTION_PROMPT_TEMPLATE: &str = r#"From these {count} {kind}, select the {limit} most relevant for the role.
Return ONLY a JSON array of 0-based indices. Example: [0, 2, 3]

Required skills: {skills}

{kind_title}:
{listing}"#;

/// Achievement rewrite prompt. Replace `{subject}`, `{focus_label}`,
/// `{focus}` and `{achievements}` before sending.
pub const ACHIEVEMENTS_PROMPT_TEMPLATE: &str = r#"Rewrite these {subject} achievements to better match the job requirements.
Focus on {focus_label}: {focus}

Original Achievements:
{achievements}

Return ONLY JSON with an "achievements" key containing a list of strings.
Example: {"achievements": ["achievement1", "achievement2"]}
{json_only}"#;

/// Summary prompt. Replace `{years}`, `{current_role}`, `{target_role}` and
/// `{skills}` before sending.
pub const SUMMARY_PROMPT_TEMPLATE: &str = r#"Write a 3-4 sentence professional summary for a resume.
- {years} years of experience
- Current/Recent: {current_role}
- Applying for: {target_role}
- Key skills: {skills}

Make it compelling and ATS-friendly. No first person pronouns. Return only the summary text."#;

/// Fills `{key}` placeholders in one pass over `template`. Inserted values
/// are never scanned again, so braces inside user text stay literal.
/// Unknown `{...}` spans (the JSON examples) are copied through.
fn fill(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open + 1..];
        let known = values.iter().find(|(key, _)| {
            tail.strip_prefix(*key)
                .is_some_and(|after| after.starts_with('}'))
        });
        match known {
            Some((key, value)) => {
                out.push_str(value);
                rest = &tail[key.len() + 1..];
            }
            None => {
                out.push('{');
                rest = tail;
            }
        }
    }
    out.push_str(rest);
    out
}

pub fn jd_analysis_prompt(jd_text: &str) -> String {
    fill(
        JD_ANALYSIS_PROMPT_TEMPLATE,
        &[("json_only", JSON_ONLY_INSTRUCTION), ("jd_text", jd_text)],
    )
}

/// `listing` holds one `"{i}. {label}"` line per candidate.
pub fn selection_prompt(kind: &str, count: usize, limit: usize, skills: &[String], listing: &str) -> String {
    let mut kind_title = kind.to_string();
    if let Some(first) = kind_title.get_mut(0..1) {
        first.make_ascii_uppercase();
    }
    fill(
        SELECTION_PROMPT_TEMPLATE,
        &[
            ("count", count.to_string().as_str()),
            ("kind_title", kind_title.as_str()),
            ("kind", kind),
            ("limit", limit.to_string().as_str()),
            ("skills", skills.join(", ").as_str()),
            ("listing", listing),
        ],
    )
}

pub fn achievements_prompt(
    subject: &str,
    focus_label: &str,
    focus: &[String],
    achievements: &[String],
) -> String {
    let listed = achievements
        .iter()
        .map(|a| format!("- {a}"))
        .collect::<Vec<_>>()
        .join("\n");
    fill(
        ACHIEVEMENTS_PROMPT_TEMPLATE,
        &[
            ("json_only", JSON_ONLY_INSTRUCTION),
            ("subject", subject),
            ("focus_label", focus_label),
            ("focus", focus.join(", ").as_str()),
            ("achievements", listed.as_str()),
        ],
    )
}

pub fn summary_prompt(years: i32, current_role: &str, target_role: &str, skills: &[String]) -> String {
    fill(
        SUMMARY_PROMPT_TEMPLATE,
        &[
            ("years", years.to_string().as_str()),
            ("current_role", current_role),
            ("target_role", target_role),
            ("skills", skills.join(", ").as_str()),
        ],
    )
}
