//! Learning roadmap generation. The output is a node/edge graph ready for a
//! flow-chart renderer.

use std::collections::HashSet;

use serde::{Deserialize, Deserializer, Serialize};

use crate::errors::AppError;
use crate::llm_client::prompts::system_with_json_rule;
use crate::llm_client::structured::{check_non_empty, generate_validated, Validate};
use crate::llm_client::LlmBackend;
use crate::roadmap::prompts::{ROADMAP_INSTRUCTION, ROADMAP_PROMPT};

const DEFAULT_NODE_TYPE: &str = "turbo";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Roadmap {
    pub roadmap_title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub duration: String,
    pub initial_nodes: Vec<RoadmapNode>,
    #[serde(default)]
    pub initial_edges: Vec<RoadmapEdge>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoadmapNode {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(rename = "type", default = "default_node_type")]
    pub node_type: String,
    #[serde(default)]
    pub position: Position,
    pub data: NodeData,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeData {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub link: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoadmapEdge {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub source: String,
    #[serde(deserialize_with = "string_or_number")]
    pub target: String,
}

fn default_node_type() -> String {
    DEFAULT_NODE_TYPE.to_string()
}

/// Models sometimes emit numeric ids.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(s) => s,
        Id::Number(n) => n.to_string(),
    })
}

impl Validate for Roadmap {
    fn validate(&mut self) -> Result<(), String> {
        check_non_empty("roadmapTitle", &mut self.roadmap_title)?;
        if self.initial_nodes.is_empty() {
            return Err("`initialNodes` must contain at least one node".to_string());
        }

        let mut ids = HashSet::new();
        for (i, node) in self.initial_nodes.iter_mut().enumerate() {
            check_non_empty(&format!("initialNodes[{i}].id"), &mut node.id)?;
            check_non_empty(&format!("initialNodes[{i}].data.title"), &mut node.data.title)?;
            check_non_empty(
                &format!("initialNodes[{i}].data.description"),
                &mut node.data.description,
            )?;
            if !ids.insert(node.id.clone()) {
                return Err(format!("duplicate node id \"{}\"", node.id));
            }
        }

        for edge in &mut self.initial_edges {
            for end in [&edge.source, &edge.target] {
                if !ids.contains(end.as_str()) {
                    return Err(format!(
                        "edge {} -> {} references unknown node \"{end}\"",
                        edge.source, edge.target
                    ));
                }
            }
            if edge.id.trim().is_empty() {
                edge.id = format!("e{}-{}", edge.source, edge.target);
            }
        }
        Ok(())
    }
}

pub async fn generate_roadmap(llm: &dyn LlmBackend, user_input: &str) -> Result<Roadmap, AppError> {
    let system = system_with_json_rule(ROADMAP_INSTRUCTION);
    let prompt = ROADMAP_PROMPT.replace("{user_input}", user_input);
    Ok(generate_validated(llm, &system, &prompt).await?)
}
