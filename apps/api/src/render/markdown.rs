//! Markdown source builder.
//!
//! The Markdown is the canonical resume text: it is stored with every
//! generated resume and re-typeset on download.

use std::fmt::Write;

use chrono::{Datelike, NaiveDate};

use crate::generation::pipeline::PipelineState;
use crate::models::profile::{Certification, Education, Project, Skill, UserProfile, WorkExperience};

/// Builds the resume Markdown from the tailored pipeline output.
/// Sections without content are left out entirely.
pub fn build_markdown(state: &PipelineState) -> String {
    let mut md = String::new();
    write_header(&mut md, &state.profile);

    if !state.tailored_summary.trim().is_empty() {
        section(&mut md, "Professional Summary");
        paragraph(&mut md, &escape(&state.tailored_summary));
    }
    if !state.tailored_experiences.is_empty() {
        section(&mut md, "Work Experience");
        for experience in &state.tailored_experiences {
            write_experience(&mut md, experience);
        }
    }
    if !state.tailored_projects.is_empty() {
        section(&mut md, "Projects");
        for project in &state.tailored_projects {
            write_project(&mut md, project);
        }
    }
    if !state.selected_skills.is_empty() {
        section(&mut md, "Skills");
        write_skills(&mut md, &state.selected_skills);
    }
    if !state.education.is_empty() {
        section(&mut md, "Education");
        for education in &state.education {
            write_education(&mut md, education);
        }
    }
    if !state.certifications.is_empty() {
        section(&mut md, "Certifications");
        for certification in &state.certifications {
            write_certification(&mut md, certification);
        }
    }

    md.truncate(md.trim_end().len());
    md.push('\n');
    md
}

fn section(md: &mut String, title: &str) {
    let _ = writeln!(md, "## {title}\n");
}

fn paragraph(md: &mut String, text: &str) {
    let _ = writeln!(md, "{text}\n");
}

fn bullets(md: &mut String, items: &[String]) {
    let mut wrote = false;
    for item in items.iter().filter(|i| !i.trim().is_empty()) {
        let _ = writeln!(md, "- {}", escape(item));
        wrote = true;
    }
    if wrote {
        md.push('\n');
    }
}

fn technologies(md: &mut String, technologies: &[String]) {
    let listed = join_escaped(technologies);
    if !listed.is_empty() {
        paragraph(md, &format!("**Technologies:** {listed}"));
    }
}

fn write_header(md: &mut String, profile: &UserProfile) {
    let _ = writeln!(md, "# {}\n", escape(&profile.full_name));

    let contact = join_present(
        &[
            profile.location.as_deref(),
            profile.phone.as_deref(),
            Some(profile.email.as_str()),
        ],
        " | ",
    );
    if !contact.is_empty() {
        paragraph(md, &contact);
    }

    let links = [
        ("LinkedIn", profile.linkedin_url.as_deref()),
        ("GitHub", profile.github_url.as_deref()),
        ("Portfolio", profile.portfolio_url.as_deref()),
    ]
    .iter()
    .filter_map(|(label, url)| {
        url.filter(|u| !u.trim().is_empty())
            .map(|u| format!("{label}: {}", escape(u)))
    })
    .collect::<Vec<_>>()
    .join(" | ");
    if !links.is_empty() {
        paragraph(md, &links);
    }
}

fn write_experience(md: &mut String, experience: &WorkExperience) {
    let _ = writeln!(
        md,
        "### {} at {}\n",
        escape(&experience.position),
        escape(&experience.company_name)
    );

    let end = if experience.is_current {
        "Present".to_string()
    } else {
        year_or(experience.end_date, "Present")
    };
    let mut dates = format!("{} - {end}", experience.start_date.year());
    if let Some(location) = present(experience.location.as_deref()) {
        let _ = write!(dates, " | {}", escape(location));
    }
    paragraph(md, &format!("*{dates}*"));

    bullets(md, &experience.achievements);
    technologies(md, &experience.technologies);
}

fn write_project(md: &mut String, project: &Project) {
    let _ = writeln!(md, "### {}\n", escape(&project.title));
    if let Some(start) = project.start_date {
        paragraph(
            md,
            &format!("*{} - {}*", start.year(), year_or(project.end_date, "Present")),
        );
    }
    bullets(md, &project.achievements);
    technologies(md, &project.technologies);
}

/// One `**Category:** a, b` line per category, in first-seen order.
fn write_skills(md: &mut String, skills: &[Skill]) {
    let mut groups: Vec<(String, Vec<String>)> = Vec::new();
    for skill in skills {
        let category = title_case(&skill.category);
        let category = if category.is_empty() {
            "General".to_string()
        } else {
            category
        };
        match groups.iter_mut().find(|(name, _)| *name == category) {
            Some((_, names)) => names.push(skill.skill_name.clone()),
            None => groups.push((category, vec![skill.skill_name.clone()])),
        }
    }
    for (category, names) in groups {
        paragraph(md, &format!("**{}:** {}", escape(&category), join_escaped(&names)));
    }
}

fn write_education(md: &mut String, education: &Education) {
    match present(education.field_of_study.as_deref()) {
        Some(field) => {
            let _ = writeln!(
                md,
                "### {} in {}\n",
                escape(&education.degree),
                escape(field)
            );
        }
        None => {
            let _ = writeln!(md, "### {}\n", escape(&education.degree));
        }
    }
    if education.start_date.is_some() || education.end_date.is_some() {
        paragraph(
            md,
            &format!(
                "*{} - {}*",
                year_or(education.start_date, "N/A"),
                year_or(education.end_date, "N/A")
            ),
        );
    }
    let place = join_present(
        &[
            Some(education.institution.as_str()),
            education.location.as_deref(),
        ],
        ", ",
    );
    paragraph(md, &place);
}

fn write_certification(md: &mut String, certification: &Certification) {
    let mut line = escape(&certification.name);
    if let Some(issuer) = present(certification.issuing_organization.as_deref()) {
        let _ = write!(line, " - {}", escape(issuer));
    }
    if let Some(date) = certification.issue_date {
        let _ = write!(line, " ({})", date.year());
    }
    let _ = writeln!(md, "- {line}");
}

fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn year_or(date: Option<NaiveDate>, missing: &str) -> String {
    date.map(|d| d.year().to_string())
        .unwrap_or_else(|| missing.to_string())
}

/// Escapes and joins the non-blank parts.
fn join_present(parts: &[Option<&str>], separator: &str) -> String {
    parts
        .iter()
        .filter_map(|p| present(*p))
        .map(escape)
        .collect::<Vec<_>>()
        .join(separator)
}

fn join_escaped(items: &[String]) -> String {
    items
        .iter()
        .filter_map(|i| present(Some(i.as_str())))
        .map(escape)
        .collect::<Vec<_>>()
        .join(", ")
}

/// `"machine learning"` -> `"Machine Learning"`.
fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Escapes user text so it renders literally inside a single Markdown line.
pub fn escape(text: &str) -> String {
    let flattened = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut out = String::with_capacity(flattened.len());
    for c in flattened.chars() {
        if matches!(
            c,
            '\\' | '`' | '*' | '_' | '[' | ']' | '<' | '>' | '#' | '&' | '!' | '|'
        ) {
            out.push('\\');
        }
        out.push(c);
    }

    // block markers only matter at the start of a line
    if out.starts_with('-') || out.starts_with('+') || out.starts_with('~') {
        out.insert(0, '\\');
    }
    let digits = out.chars().take_while(char::is_ascii_digit).count();
    if digits > 0 && matches!(out[digits..].chars().next(), Some('.') | Some(')')) {
        out.insert(digits, '\\');
    }
    out
}
