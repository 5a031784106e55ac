//! Bounds on what a query prompt may carry.

use std::borrow::Cow;

use docquery_core::{ChatTurn, Speaker};

pub const DEFAULT_MAX_HISTORY_TURNS: usize = 20;
pub const DEFAULT_MAX_DOCUMENT_CHARS: usize = 100_000;
pub const TRUNCATION_NOTICE: &str = "\n[document truncated]";

/// Limits applied to history and document text before a prompt is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptBudget {
    /// Most recent history entries kept (one exchange is two entries).
    pub max_history_turns: usize,
    pub max_document_chars: usize,
}

impl Default for PromptBudget {
    fn default() -> Self {
        Self {
            max_history_turns: DEFAULT_MAX_HISTORY_TURNS,
            max_document_chars: DEFAULT_MAX_DOCUMENT_CHARS,
        }
    }
}

impl PromptBudget {
    pub fn new(max_history_turns: usize, max_document_chars: usize) -> Self {
        Self {
            max_history_turns,
            max_document_chars,
        }
    }

    /// The most recent entries that fit, never starting on an assistant entry.
    pub fn history<'a>(&self, turns: &'a [ChatTurn]) -> &'a [ChatTurn] {
        let mut start = turns.len().saturating_sub(self.max_history_turns);
        while start < turns.len() && turns[start].speaker == Speaker::Assistant {
            start += 1;
        }
        &turns[start..]
    }

    /// Document text cut to `max_document_chars` characters, with a notice
    /// appended when anything was dropped.
    pub fn document<'a>(&self, text: &'a str) -> Cow<'a, str> {
        match text.char_indices().nth(self.max_document_chars) {
            None => Cow::Borrowed(text),
            Some((cut, _)) => {
                let mut kept = String::with_capacity(cut + TRUNCATION_NOTICE.len());
                kept.push_str(&text[..cut]);
                kept.push_str(TRUNCATION_NOTICE);
                Cow::Owned(kept)
            }
        }
    }
}
