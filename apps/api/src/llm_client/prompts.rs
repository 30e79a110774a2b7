// Cross-cutting prompt fragments.
// Each stage that calls the completion service keeps its own templates in
// generation/prompts.rs; this file only holds the shared pieces.

/// Appended to every prompt whose answer is decoded as JSON.
pub const JSON_ONLY_INSTRUCTION: &str = "Respond with valid JSON only. \
    Do NOT include any text outside the JSON value. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";
