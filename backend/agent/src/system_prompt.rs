//! Query prompt construction.
//!
//! A query prompt is one block of text: a fixed preamble, the document
//! content, the chat history as a JSON array of `USER: …` / `AI: …` lines, and
//! the user's input.

use docquery_core::{ChatTurn, DocQueryError, Result};
use docquery_loader::Document;

use crate::context_window::PromptBudget;
use crate::session_state::Session;

/// Stand-in for the document content of tabular uploads. The table itself is
/// reached through the agent's tools.
pub const DOCUMENT_SENTINEL: &str = "CSV/XLSX data";

const PREAMBLE: &str = "Consider the uploaded document, respond intelligently to user input.";
const DOCUMENT_MARKER: &str = "\n\nDOCUMENT CONTENT: ";
const HISTORY_MARKER: &str = "\n\nCHAT HISTORY: ";
const INPUT_MARKER: &str = "\n\nUSER INPUT: ";
const RESPONSE_MARKER: &str = "\n\nAI RESPONSE HERE:";

pub struct PromptBuilder;

impl PromptBuilder {
    /// Builds the query prompt. Pure and deterministic.
    pub fn build(document_label: &str, history: &[ChatTurn], query: &str) -> String {
        let lines: Vec<String> = history.iter().map(ChatTurn::labeled).collect();
        // Serializing a Vec<String> cannot fail.
        let history_json = serde_json::to_string(&lines).unwrap_or_else(|_| "[]".to_string());

        let mut prompt = String::with_capacity(
            PREAMBLE.len() + document_label.len() + history_json.len() + query.len() + 96,
        );
        prompt.push_str(PREAMBLE);
        prompt.push_str(DOCUMENT_MARKER);
        prompt.push_str(document_label);
        prompt.push_str(HISTORY_MARKER);
        prompt.push_str(&history_json);
        prompt.push_str(INPUT_MARKER);
        prompt.push_str(query);
        prompt.push_str(RESPONSE_MARKER);
        prompt
    }

    /// The document content placed in the prompt: full text for pdf, the
    /// sentinel for tabular data.
    pub fn document_label(document: &Document) -> Result<&str> {
        match document {
            Document::None => Err(DocQueryError::NoDocument),
            Document::Tabular(_) => Ok(DOCUMENT_SENTINEL),
            Document::Pdf(pdf) => Ok(&pdf.text),
        }
    }

    /// Builds the prompt for the next turn of a session, bounded by `budget`.
    pub fn for_session(session: &Session, query: &str, budget: &PromptBudget) -> Result<String> {
        let label = Self::document_label(&session.document)?;
        let label = budget.document(label);
        let history = budget.history(session.history.history());
        Ok(Self::build(&label, history, query))
    }
}

/// The parts of a prompt produced by [`PromptBuilder::build`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptSections {
    pub document_label: String,
    pub history: Vec<String>,
    pub query: String,
}

impl PromptSections {
    /// Splits a built prompt back into its parts. Returns `None` for text that
    /// was not produced by [`PromptBuilder::build`].
    ///
    /// The history line is JSON and never contains a raw newline, so the
    /// history section is the last `CHAT HISTORY:` line that parses as a
    /// string array and is directly followed by the `USER INPUT:` marker.
    /// A query that itself contains such a complete history section is
    /// ambiguous and splits at the copy inside the query.
    pub fn parse(prompt: &str) -> Option<Self> {
        let body = prompt
            .strip_prefix(PREAMBLE)?
            .strip_prefix(DOCUMENT_MARKER)?
            .strip_suffix(RESPONSE_MARKER)?;

        body.rmatch_indices(HISTORY_MARKER).find_map(|(idx, _)| {
            let after = &body[idx + HISTORY_MARKER.len()..];
            let line_end = after.find('\n')?;
            let history: Vec<String> = serde_json::from_str(&after[..line_end]).ok()?;
            let query = after[line_end..].strip_prefix(INPUT_MARKER)?;
            Some(Self {
                document_label: body[..idx].to_string(),
                history,
                query: query.to_string(),
            })
        })
    }
}
