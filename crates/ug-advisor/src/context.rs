//! ---
//! ug_section: "05-networking-external-interfaces"
//! ug_subsection: "module"
//! ug_type: "source"
//! ug_scope: "code"
//! ug_description: "City summaries and prompt assembly for the advisor."
//! ug_version: "v0.1.0"
//! ug_owner: "tbd"
//! ---
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};
use ug_core::FleetSnapshot;
use ug_sim::{City, HealthStatus};

/// Read-only summary of one city handed to the advisor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvisoryContext {
    pub city: City,
    pub asset_count: usize,
    pub overall_health: u32,
    #[serde(rename = "criticalNodes")]
    pub critical_node_names: Vec<String>,
}

impl AdvisoryContext {
    pub fn for_city(snapshot: &FleetSnapshot, city: City) -> Self {
        let mut asset_count = 0;
        let mut critical_node_names = Vec::new();
        for asset in snapshot.city_assets(city) {
            asset_count += 1;
            if asset.status() == HealthStatus::Critical {
                critical_node_names.push(asset.name().to_owned());
            }
        }
        Self {
            city,
            asset_count,
            overall_health: snapshot.city_health(city),
            critical_node_names,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

impl ChatRole {
    fn label(self) -> &'static str {
        match self {
            ChatRole::System => "SYSTEM",
            ChatRole::User => "USER",
            ChatRole::Assistant => "ASSISTANT",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }
}

/// Assemble the system prompt from the city summary and the prior turns.
pub fn system_prompt(context: &AdvisoryContext, history: &[ChatTurn]) -> String {
    let critical = if context.critical_node_names.is_empty() {
        "None".to_owned()
    } else {
        context.critical_node_names.join(", ")
    };

    let mut prompt = String::new();
    prompt.push_str(
        "You are UrbanGuard AI, an urban infrastructure intelligence assistant.\n\
         Help users analyze and understand the health of infrastructure assets in \
         cities like Chennai and Coimbatore.\n\n",
    );
    prompt.push_str("CURRENT CONTEXT:\n");
    let _ = writeln!(prompt, "- Analyzing City: {}", context.city);
    let _ = writeln!(prompt, "- Total Assets Tracked: {}", context.asset_count);
    let _ = writeln!(prompt, "- Overall Network Health: {}%", context.overall_health);
    let _ = writeln!(prompt, "- Current Critical Nodes: {critical}");
    prompt.push_str(
        "\nGUIDELINES:\n\
         1. Be professional and technical, yet helpful.\n\
         2. Use urban planning and structural engineering terminology when appropriate.\n\
         3. Reference the context above when answering questions about asset state.\n\
         4. Keep responses concise and focused on infrastructure health.\n\
         5. Politely redirect unrelated questions to urban intelligence matters.\n",
    );
    if !history.is_empty() {
        prompt.push_str("\nCURRENT CONVERSATION HISTORY:\n");
        for turn in history {
            let _ = writeln!(prompt, "{}: {}", turn.role.label(), turn.content);
        }
    }
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(critical: &[&str]) -> AdvisoryContext {
        AdvisoryContext {
            city: City::Coimbatore,
            asset_count: 20,
            overall_health: 88,
            critical_node_names: critical.iter().map(|name| (*name).to_owned()).collect(),
        }
    }

    #[test]
    fn prompt_lists_context_and_history() {
        let history = vec![
            ChatTurn::user("Which bridge is worst?"),
            ChatTurn::assistant("Gandhipuram Flyover."),
        ];
        let prompt = system_prompt(&context(&["Gandhipuram Flyover", "Podanur Junction"]), &history);
        assert!(prompt.contains("- Analyzing City: Coimbatore\n"));
        assert!(prompt.contains("- Total Assets Tracked: 20\n"));
        assert!(prompt.contains("- Overall Network Health: 88%\n"));
        assert!(prompt.contains("- Current Critical Nodes: Gandhipuram Flyover, Podanur Junction\n"));
        assert!(prompt.contains("USER: Which bridge is worst?\nASSISTANT: Gandhipuram Flyover.\n"));
    }

    #[test]
    fn prompt_without_critical_nodes_says_none() {
        let prompt = system_prompt(&context(&[]), &[]);
        assert!(prompt.contains("- Current Critical Nodes: None\n"));
        assert!(!prompt.contains("CONVERSATION HISTORY"));
    }

    #[test]
    fn context_serializes_with_wire_names() {
        let value = serde_json::to_value(context(&["A"])).unwrap();
        assert_eq!(value["assetCount"], 20);
        assert_eq!(value["overallHealth"], 88);
        assert_eq!(value["criticalNodes"][0], "A");
        assert_eq!(value["city"], "Coimbatore");
    }
}
