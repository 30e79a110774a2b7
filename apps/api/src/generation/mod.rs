// Resume generation: JD analysis, content selection, tailoring, and the
// pipeline that ties them together. All completion calls go through
// llm_client and every one of them has a deterministic fallback.

pub mod content_selector;
pub mod generator;
pub mod handlers;
pub mod jd_analyzer;
pub mod pipeline;
pub mod prompts;
pub mod tailoring;
