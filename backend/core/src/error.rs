use thiserror::Error;

/// Every failure a document-query session can surface to its caller.
///
/// None of these are fatal: each one is scoped to the current interaction and
/// the session stays usable afterwards.
#[derive(Debug, Error)]
pub enum DocQueryError {
    #[error("unsupported file kind: {0} (expected .csv, .xlsx or .pdf)")]
    UnsupportedKind(String),

    #[error("could not parse document: {0}")]
    ParseError(String),

    #[error("agent execution failed: {0}")]
    AgentExecutionError(String),

    #[error("no document loaded; upload a CSV, XLSX or PDF file first")]
    NoDocument,

    #[error("setup error: {0}")]
    Setup(String),
}

impl DocQueryError {
    /// Wrap any agent-side failure into the single agent error class.
    pub fn agent(err: impl std::fmt::Display) -> Self {
        Self::AgentExecutionError(err.to_string())
    }

    pub fn parse(err: impl std::fmt::Display) -> Self {
        Self::ParseError(err.to_string())
    }

    /// Stable, machine-readable identifier used in API error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnsupportedKind(_) => "unsupported_kind",
            Self::ParseError(_) => "parse_error",
            Self::AgentExecutionError(_) => "agent_execution_error",
            Self::NoDocument => "no_document",
            Self::Setup(_) => "setup_error",
        }
    }
}

pub type Result<T> = std::result::Result<T, DocQueryError>;
