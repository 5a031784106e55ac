//! DocQuery Agent
//!
//! Session state, prompt building, the tool-using table agent, query
//! execution and transcript rendering.

pub mod agent_loop;
pub mod context_window;
pub mod dataset_tools;
pub mod executor;
pub mod export;
pub mod renderer;
pub mod session_state;
pub mod system_prompt;
pub mod tool_dispatcher;

pub use agent_loop::{StepResult, TableAgent};
pub use context_window::PromptBudget;
pub use executor::{ModelConfig, QueryExecutor};
pub use renderer::{HistoryRenderer, RenderedTurn};
pub use session_state::{ChatHistory, Session};
pub use system_prompt::{PromptBuilder, PromptSections, DOCUMENT_SENTINEL};
pub use tool_dispatcher::ToolDispatcher;
