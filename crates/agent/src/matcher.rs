//! Parsing the tool-matching reply.
//!
//! Models asked for `{"match_tools": [...]}` often wrap it in prose or a
//! code fence, so the first balanced-looking object in the text is tried
//! when the whole reply is not JSON.

use react_agent_core::tool::ToolRegistry;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct ToolSelection {
    match_tools: Vec<String>,
}

/// Extract the selected tool names, or `None` if the reply is unusable.
pub fn parse_match_tools(reply: &str) -> Option<Vec<String>> {
    let trimmed = reply.trim();
    if let Ok(selection) = serde_json::from_str::<ToolSelection>(trimmed) {
        return Some(selection.match_tools);
    }
    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str::<ToolSelection>(&trimmed[start..=end])
        .ok()
        .map(|s| s.match_tools)
}

/// Keep registered names only, first occurrence wins.
pub fn retain_known(names: Vec<String>, registry: &ToolRegistry) -> Vec<String> {
    let mut known: Vec<String> = Vec::with_capacity(names.len());
    for name in names {
        if registry.contains(&name) && !known.contains(&name) {
            known.push(name);
        }
    }
    known
}
