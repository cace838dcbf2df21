//! Ranking prompt construction and output parsing

use crate::agents::AgentDescriptor;
use crate::ai::Message;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashSet;

pub const MAX_RANKED_AGENTS: usize = 3;
pub const SCHEMA_NAME: &str = "agent_ranking";

#[derive(Debug, Deserialize)]
struct RankingOutput {
    agents: Vec<String>,
}

/// JSON schema for `{"agents": [name, ...]}` restricted to the candidates
pub fn ranking_schema(candidates: &[AgentDescriptor]) -> Value {
    let names: Vec<&str> = candidates.iter().map(|d| d.name.as_str()).collect();
    json!({
        "type": "object",
        "properties": {
            "agents": {
                "type": "array",
                "items": { "type": "string", "enum": names },
                "maxItems": MAX_RANKED_AGENTS,
                "uniqueItems": true,
            }
        },
        "required": ["agents"],
        "additionalProperties": false,
    })
}

pub fn ranking_messages(candidates: &[AgentDescriptor], prompt: &str, history: &str) -> Vec<Message> {
    let agent_list = candidates
        .iter()
        .map(|d| format!("- {}: {}", d.name, d.description))
        .collect::<Vec<_>>()
        .join("\n");

    let system = format!(
        "Your primary function is to select the correct agent based on the user's input. \
         Available agents and their descriptions:\n{}\n\nAnalyze the user's input and select the most \
         appropriate agents, up to {}, most relevant first. Only choose from the agents listed \
         above. Respond with a JSON object of the form {{\"agents\": [\"name\", ...]}}.",
        agent_list, MAX_RANKED_AGENTS
    );

    let mut user = String::new();
    if !history.trim().is_empty() {
        user.push_str("Conversation so far:\n");
        user.push_str(history);
        user.push_str("\n\n");
    }
    user.push_str("Latest message:\n");
    user.push_str(prompt);

    vec![Message::system(system), Message::user(user)]
}

/// Parse the ranking output: a direct parse first, then a lenient pass that
/// tolerates code fences or prose around the JSON object. The capability's
/// order is kept, repeats are dropped and the list is capped at
/// `MAX_RANKED_AGENTS`.
pub fn parse_ranking(raw: &str) -> Option<Vec<String>> {
    let agents = match serde_json::from_str::<RankingOutput>(raw) {
        Ok(output) => output.agents,
        Err(_) => lenient_parse(raw)?,
    };
    let mut seen = HashSet::new();
    let agents: Vec<String> = agents
        .into_iter()
        .map(|a| a.trim().to_string())
        .filter(|a| !a.is_empty() && seen.insert(a.clone()))
        .take(MAX_RANKED_AGENTS)
        .collect();
    (!agents.is_empty()).then_some(agents)
}

fn lenient_parse(raw: &str) -> Option<Vec<String>> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end <= start {
        return None;
    }
    let value: Value = serde_json::from_str(&raw[start..=end]).ok()?;
    value
        .get("agents")?
        .as_array()?
        .iter()
        .map(|v| v.as_str().map(str::to_string))
        .collect()
}
