//! Prompt templates used by the agent graph.

use chrono::{DateTime, SecondsFormat, Utc};
use react_agent_core::provider::ToolDefinition;

pub const TOOL_MATCHING_PROMPT: &str = "\
You select tools for an assistant. Given the user's request and the list of \
available tools, decide which tools could help answer it.

User request:
{user_text}

Available tools:
{tools_description}

Respond with JSON only, in the form {\"match_tools\": [\"tool_name\", ...]}. \
Use an empty list if no tool is relevant.";

pub const REFUSAL_PROMPT: &str = "\
You are an assistant that may only answer questions using its tools, and none \
of them fits the user's question.

User question:
{user_question}

Your capabilities:
{capability_info}

Politely explain that the question is outside what you can help with, and \
briefly describe what you can do instead. Reply in the language of the question.";

/// Fill `{system_time}` (and the `{current_time}` alias) with `now`.
pub fn render_system_prompt(template: &str, now: DateTime<Utc>) -> String {
    let time = now.to_rfc3339_opts(SecondsFormat::Secs, true);
    template
        .replace("{system_time}", &time)
        .replace("{current_time}", &time)
}

/// One `- name: description` line per tool.
pub fn describe_tools(tools: &[ToolDefinition]) -> String {
    tools
        .iter()
        .map(|t| format!("- {}: {}", t.name, t.description))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn tool_matching_prompt(user_text: &str, tools: &[ToolDefinition]) -> String {
    TOOL_MATCHING_PROMPT
        .replace("{tools_description}", &describe_tools(tools))
        .replace("{user_text}", user_text)
}

pub fn refusal_prompt(user_question: &str, tools: &[ToolDefinition]) -> String {
    REFUSAL_PROMPT
        .replace("{capability_info}", &describe_tools(tools))
        .replace("{user_question}", user_question)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn defs() -> Vec<ToolDefinition> {
        vec![ToolDefinition {
            name: "calculator".into(),
            description: "Evaluate arithmetic".into(),
            parameters: serde_json::json!({"type": "object"}),
        }]
    }

    #[test]
    fn system_time_is_rfc3339() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap();
        let rendered = render_system_prompt("Now: {system_time}. Also {current_time}.", now);
        assert_eq!(
            rendered,
            "Now: 2024-05-01T12:30:00Z. Also 2024-05-01T12:30:00Z."
        );
    }

    #[test]
    fn template_without_placeholder_is_unchanged() {
        assert_eq!(render_system_prompt("Be brief.", Utc::now()), "Be brief.");
    }

    #[test]
    fn matching_prompt_lists_tools() {
        let prompt = tool_matching_prompt("What is 2+2?", &defs());
        assert!(prompt.contains("What is 2+2?"));
        assert!(prompt.contains("- calculator: Evaluate arithmetic"));
        assert!(prompt.contains(r#"{"match_tools": ["#));
    }

    #[test]
    fn refusal_prompt_lists_capabilities() {
        let prompt = refusal_prompt("Write me a poem", &defs());
        assert!(prompt.contains("Write me a poem"));
        assert!(prompt.contains("- calculator"));
    }
}
