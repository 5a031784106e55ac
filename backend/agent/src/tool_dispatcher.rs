//! Dispatcher for agent tool calls.
//!
//! Routes the model's requested tool invocations to the registry and turns
//! every outcome, including failures, into an observation string.

use docquery_core::ToolRegistry;
use serde_json::Value;
use tracing::{debug, warn};

pub struct ToolDispatcher {
    registry: ToolRegistry,
}

impl ToolDispatcher {
    pub fn new(registry: ToolRegistry) -> Self {
        Self { registry }
    }

    /// Tool listing for the agent's instructions, one `name: description` per line.
    pub fn describe(&self) -> String {
        self.registry
            .iter()
            .map(|tool| format!("{}: {}", tool.name(), tool.description()))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn tool_names(&self) -> Vec<String> {
        self.registry.list()
    }

    /// Run one tool call. `raw_input` is the model's `Action Input` text.
    pub async fn dispatch(&self, name: &str, raw_input: &str) -> String {
        let name = name.trim().trim_matches('`');
        let Some(tool) = self.registry.get(name) else {
            warn!(tool = %name, "Model requested unknown tool");
            return format!(
                "Unknown tool '{name}'. Available tools: {}",
                self.tool_names().join(", ")
            );
        };

        let args = match parse_input(raw_input) {
            Ok(args) => args,
            Err(e) => {
                return format!("Invalid Action Input for {name}: {e}. Provide a JSON object.")
            }
        };

        debug!(tool = %name, args = %args, "Executing tool");
        match tool.execute(args).await {
            Ok(observation) => observation,
            Err(e) => format!("Error from {name}: {e}"),
        }
    }
}

/// Action input as a JSON object. Blank input is an empty object; code fences
/// around the JSON are tolerated.
fn parse_input(raw: &str) -> Result<Value, String> {
    let trimmed = raw
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();
    if trimmed.is_empty() {
        return Ok(Value::Object(Default::default()));
    }
    match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::Object(map)) => Ok(Value::Object(map)),
        Ok(other) => Err(format!("expected a JSON object, got {other}")),
        Err(e) => Err(e.to_string()),
    }
}
