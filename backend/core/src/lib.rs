pub mod chat;
pub mod error;
pub mod tools;
pub mod traits;

pub use chat::{ChatTurn, Speaker};
pub use error::{DocQueryError, Result};
pub use tools::ToolRegistry;
pub use traits::{LlmProvider, LlmRequest, LlmResponse, Tool};
