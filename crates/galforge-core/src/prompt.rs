//! Prompt construction for every executor flow.
//!
//! Fresh generation renders the agent's own templates with minijinja.
//! Repair, feedback, and revision prompts are fixed texts assembled here;
//! they never re-render the agent's human template.

use std::collections::BTreeMap;

use minijinja::{Environment, UndefinedBehavior};
use serde::Serialize;
use serde_json::Value;

use galforge_contracts::{
    agent::{JsonObject, PromptInputs},
    error::{GalforgeError, GalforgeResult},
    feedback::{Issue, Severity},
    plan::RevisionRequest,
};

/// System prompt for fix-this-JSON repair rounds.
pub const REPAIR_SYSTEM_PROMPT: &str = "You repair JSON documents that failed validation. \
Reply with exactly one complete JSON object and nothing else.";

/// System prompt for feedback repairs and global revisions.
pub const REVISION_SYSTEM_PROMPT: &str = "You revise one section of a visual novel design \
document. Change only what you are asked to change and reply with exactly one complete JSON \
object and nothing else.";

/// Render an agent template with strict undefined handling.
///
/// String inputs are substituted as-is; every other value is substituted as
/// pretty-printed JSON. A placeholder with no matching input is an error.
pub fn render(agent: &str, template: &str, inputs: &PromptInputs) -> GalforgeResult<String> {
    let mut env = Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::Strict);

    let context: BTreeMap<&str, String> = inputs
        .iter()
        .map(|(name, value)| (name.as_str(), display_value(value)))
        .collect();

    env.render_str(template, context)
        .map_err(|e| GalforgeError::Template {
            agent: agent.to_string(),
            reason: e.to_string(),
        })
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => pretty_json(other),
    }
}

pub(crate) fn pretty_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_default()
}

fn field_list(required: &[String]) -> String {
    if required.is_empty() {
        return "(none declared)".to_string();
    }
    required
        .iter()
        .map(|f| format!("- {f}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// The user prompt for repair round `n > 0` of a fresh generation.
///
/// `previous` is the rejected output: pretty JSON when it parsed, the raw
/// response text when extraction failed.
pub fn repair_prompt(reason: &str, previous: &str, required: &[String]) -> String {
    format!(
        "Your previous response could not be accepted.\n\n\
         ## Problem\n{reason}\n\n\
         ## Previous response\n{previous}\n\n\
         ## Required fields\n{fields}\n\n\
         Return one complete JSON object that fixes the problem and contains every required \
         field with a non-empty value. Reply with JSON only.",
        fields = field_list(required),
    )
}

// ── Feedback repair ──────────────────────────────────────────────────────────

/// The issues that made it into a feedback prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct IssueSelection<'a> {
    /// Highest severity first.
    pub issues: Vec<&'a Issue>,
    /// Relevant issues left out because of the limit.
    pub omitted: usize,
}

/// Choose which issues an agent's feedback prompt lists.
///
/// Issues are filtered to those naming `agent`; when none do, the whole list
/// is used. Critical and high issues are always kept, even past `limit`.
/// Remaining slots go to medium issues, then low.
pub fn select_issues<'a>(issues: &'a [Issue], agent: &str, limit: usize) -> IssueSelection<'a> {
    let mut relevant: Vec<&Issue> = issues.iter().filter(|i| i.source_agent == agent).collect();
    if relevant.is_empty() {
        relevant = issues.iter().collect();
    }
    relevant.sort_by(|a, b| b.severity.cmp(&a.severity));

    let urgent = relevant.iter().filter(|i| i.severity >= Severity::High).count();
    let keep = urgent.max(limit.min(relevant.len()));
    let omitted = relevant.len() - keep;
    relevant.truncate(keep);

    IssueSelection {
        issues: relevant,
        omitted,
    }
}

pub fn feedback_prompt(previous: &JsonObject, selection: &IssueSelection<'_>) -> String {
    let mut problems = String::new();
    for issue in &selection.issues {
        problems.push_str(&format!(
            "{} [{}] {}\n",
            issue.severity.icon(),
            issue.severity,
            issue.description
        ));
        if !issue.fix_suggestion.is_empty() {
            problems.push_str(&format!("   Suggested fix: {}\n", issue.fix_suggestion));
        }
        if let Some(field) = &issue.related_field {
            problems.push_str(&format!("   Field: {field}\n"));
        }
    }
    if selection.omitted > 0 {
        problems.push_str(&format!(
            "({} lower-severity issue(s) omitted)\n",
            selection.omitted
        ));
    }

    format!(
        "A reviewer reported problems in the JSON output below.\n\n\
         ## Current output\n```json\n{current}\n```\n\n\
         ## Problems to fix\n{problems}\n\
         ## Instructions\n\
         - Fix only the problems listed above.\n\
         - Keep every unrelated field and structure exactly as it is.\n\
         - Return the complete corrected JSON object, not a fragment, with no commentary.",
        current = pretty_json(previous),
    )
}

/// Appended as a system message after a rejected feedback repair.
pub fn corrective_message(reason: &str) -> String {
    format!(
        "The output still has problems: {reason}. Fix them and return the complete JSON \
         object only."
    )
}

// ── Global revision ──────────────────────────────────────────────────────────

fn revision_body(request: &RevisionRequest) -> String {
    let mut body = format!("## Revision instructions\n{}\n", request.instructions);
    if let Some(expected) = &request.expected_outcome {
        body.push_str(&format!("\n## Expected outcome\n{expected}\n"));
    }
    if !request.context.is_empty() {
        body.push_str("\n## Related sections\n");
        for snippet in &request.context {
            body.push_str(&format!(
                "### {}\n```json\n{}\n```\n",
                snippet.section,
                pretty_json(&snippet.content)
            ));
        }
    }
    body
}

/// First-round prompt for a planner-directed revision of one section.
pub fn revision_prompt(current: &JsonObject, request: &RevisionRequest) -> String {
    format!(
        "Revise the section below so the whole story stays consistent.\n\n\
         ## Current section\n```json\n{current}\n```\n\n\
         {body}\n\
         Return the complete revised section as one JSON object. Keep every field the \
         instructions do not mention.",
        current = pretty_json(current),
        body = revision_body(request),
    )
}

/// Prompt for revision rounds after a rejected attempt.
///
/// Focuses on field completeness, the usual reason a revised section fails.
pub fn completeness_repair_prompt(
    reason: &str,
    previous: &str,
    request: &RevisionRequest,
    required: &[String],
) -> String {
    format!(
        "Your revised section could not be accepted: {reason}\n\n\
         ## Previous attempt\n{previous}\n\n\
         {body}\n\
         ## Required fields\n{fields}\n\n\
         Every required field must be present and non-empty. Return the complete section as \
         one JSON object.",
        body = revision_body(request),
        fields = field_list(required),
    )
}
