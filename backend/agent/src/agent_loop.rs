//! ReAct loop for the table agent.
//!
//! The model is asked to think in `Thought:` / `Action:` / `Action Input:`
//! steps. Generation stops before `Observation:`, the dispatcher runs the
//! action and its output is appended to the scratchpad for the next step.
//! The loop ends at `Final Answer:` or when the step limit is hit.

use std::sync::{Arc, LazyLock};

use anyhow::{bail, Result};
use docquery_core::{LlmProvider, LlmRequest};
use regex::Regex;
use tracing::{debug, info, instrument, warn};

use crate::tool_dispatcher::ToolDispatcher;

pub const DEFAULT_MAX_STEPS: usize = 10;
pub const OBSERVATION_STOP: &str = "\nObservation:";

const FINAL_ANSWER: &str = "Final Answer:";

static ACTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)Action\s*\d*\s*:[ \t]*(?P<tool>[^\n]*?)[ \t]*\n\s*Action\s*\d*\s*Input\s*\d*\s*:[ \t]*(?P<input>.*)")
        .expect("valid action regex")
});

const FORMAT_REMINDER: &str = "Invalid format. Either call a tool with `Action:` and \
`Action Input:` lines, or reply with `Final Answer:` followed by the answer.";

/// One parsed model step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepResult {
    /// Agent produced a final response to the user.
    Final(String),
    /// Agent called a tool; run it and loop.
    Action { tool: String, input: String },
    /// Output matched neither form.
    Malformed,
}

impl StepResult {
    pub fn parse(output: &str) -> Self {
        let final_at = output.find(FINAL_ANSWER);
        let action = ACTION_RE.captures(output).and_then(|caps| {
            let whole = caps.get(0)?;
            Some((whole.start(), caps["tool"].to_string(), caps["input"].to_string()))
        });

        match (final_at, action) {
            (Some(at), Some((action_at, _, _))) if at < action_at => {
                Self::Final(output[at + FINAL_ANSWER.len()..].trim().to_string())
            }
            (_, Some((_, tool, input))) => {
                let input = input
                    .split(OBSERVATION_STOP)
                    .next()
                    .unwrap_or_default()
                    .trim()
                    .to_string();
                Self::Action { tool, input }
            }
            (Some(at), None) => Self::Final(output[at + FINAL_ANSWER.len()..].trim().to_string()),
            (None, None) => Self::Malformed,
        }
    }
}

/// Tool-using agent over one loaded table.
pub struct TableAgent {
    provider: Arc<dyn LlmProvider>,
    model: String,
    max_tokens: u32,
    max_steps: usize,
}

impl TableAgent {
    pub fn new(provider: Arc<dyn LlmProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            max_tokens: 1024,
            max_steps: DEFAULT_MAX_STEPS,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps.max(1);
        self
    }

    fn instructions(tools: &ToolDispatcher) -> String {
        format!(
            "You are working with a table loaded from the user's CSV/XLSX file. \
             You cannot see the table directly; use the tools below to inspect it.\n\n\
             TOOLS:\n{tools}\n\n\
             Use this format:\n\n\
             Thought: what to do next\n\
             Action: one of [{names}]\n\
             Action Input: a JSON object with the tool's arguments\n\
             Observation: the tool's output\n\
             ... (Thought/Action/Action Input/Observation can repeat)\n\
             Thought: I now know the final answer\n\
             Final Answer: the answer to the user's input",
            tools = tools.describe(),
            names = tools.tool_names().join(", "),
        )
    }

    /// Run the loop on `prompt` until a final answer or the step limit.
    #[instrument(skip_all, fields(model = %self.model, max_steps = self.max_steps))]
    pub async fn run(&self, prompt: &str, tools: &ToolDispatcher, temperature: f32) -> Result<String> {
        info!("Starting agent loop");
        let system_prompt = Self::instructions(tools);
        let mut scratchpad = String::new();

        for step in 1..=self.max_steps {
            let request = LlmRequest {
                model: self.model.clone(),
                system_prompt: system_prompt.clone(),
                user_prompt: format!("{prompt}\n\nThought:{scratchpad}"),
                max_tokens: self.max_tokens,
                temperature,
                stop: vec![OBSERVATION_STOP.to_string()],
            };
            let response = self.provider.complete(&request).await?;
            let output = response.content;
            debug!(step, tokens = response.tokens_used, "Agent step completed");

            let observation = match StepResult::parse(&output) {
                StepResult::Final(answer) => {
                    info!(step, "Agent produced final answer");
                    return Ok(answer);
                }
                StepResult::Action { tool, input } => {
                    debug!(step, tool = %tool, "Agent invoked tool");
                    tools.dispatch(&tool, &input).await
                }
                StepResult::Malformed => {
                    warn!(step, "Agent output did not follow the format");
                    FORMAT_REMINDER.to_string()
                }
            };

            scratchpad.push(' ');
            scratchpad.push_str(output.trim());
            scratchpad.push_str("\nObservation: ");
            scratchpad.push_str(&observation);
            scratchpad.push_str("\nThought:");
        }

        warn!("Max steps ({}) reached without a final answer", self.max_steps);
        bail!(
            "agent stopped after {} steps without reaching a final answer",
            self.max_steps
        )
    }
}
