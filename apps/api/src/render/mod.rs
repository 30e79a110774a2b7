//! Document Renderer: Resume Markdown and its PDF typesetting.
//!
//! Rendering is CPU-bound and synchronous; async callers run it on the
//! blocking pool.

use thiserror::Error;

use crate::generation::pipeline::PipelineState;

pub mod markdown;
pub mod metrics;
pub mod pdf;

pub use markdown::build_markdown;
pub use pdf::typeset_pdf;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("PDF generation failed: {0}")]
    Pdf(String),
}

/// Builds the Markdown for a finished pipeline run, stores it on the state
/// and returns the typeset PDF.
pub fn render_resume(state: &mut PipelineState) -> Result<Vec<u8>, RenderError> {
    state.resume_markdown = build_markdown(state);
    typeset_pdf(&state.resume_markdown, &document_title(&state.profile.full_name))
}

/// Re-typesets previously stored Markdown. No pipeline stage runs.
pub fn replay_pdf(markdown: &str, full_name: &str) -> Result<Vec<u8>, RenderError> {
    typeset_pdf(markdown, &document_title(full_name))
}

fn document_title(full_name: &str) -> String {
    let name = full_name.trim();
    if name.is_empty() {
        "Resume".to_string()
    } else {
        format!("{name} - Resume")
    }
}
