// Shared prompt fragments used by every generator.
// Each feature module defines its own prompts.rs alongside it.

/// Appended to every system instruction so the model answers with JSON only.
pub const JSON_ONLY_INSTRUCTION: &str = "\
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON value. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Follow-up user turn sent after a rejected answer. Replace `{reason}`.
pub const REPROMPT_TEMPLATE: &str = "Your previous answer was rejected: {reason}. \
    Answer again with a single JSON value that follows the required schema exactly. \
    Output JSON only.";

/// Joins a task instruction with the JSON-only fragment.
pub fn system_with_json_rule(task_instruction: &str) -> String {
    format!("{}\n\n{}", task_instruction.trim(), JSON_ONLY_INSTRUCTION)
}
