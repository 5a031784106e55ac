//! Per-session state: the bound document and the conversation log.

use chrono::{DateTime, Utc};
use docquery_core::ChatTurn;
use docquery_loader::Document;
use serde::Serialize;
use uuid::Uuid;

/// Append-only conversation log. Entries come in (user, assistant) pairs.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct ChatHistory {
    turns: Vec<ChatTurn>,
}

impl ChatHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one completed exchange. Both entries land together or not at all.
    pub fn append_turn(&mut self, user_text: impl Into<String>, assistant_text: impl Into<String>) {
        self.turns.reserve(2);
        self.turns.push(ChatTurn::user(user_text));
        self.turns.push(ChatTurn::assistant(assistant_text));
    }

    /// Entries in conversation order.
    pub fn history(&self) -> &[ChatTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

/// One user's interactive session.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,
    pub document: Document,
    pub history: ChatHistory,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn new() -> Self {
        Self::with_id(Uuid::new_v4().to_string())
    }

    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            document: Document::None,
            history: ChatHistory::new(),
            created_at: Utc::now(),
        }
    }

    /// Bind a new document. History is kept across uploads.
    pub fn replace_document(&mut self, document: Document) {
        self.document = document;
    }

    /// Drop the bound document, e.g. after a failed upload.
    pub fn clear_document(&mut self) {
        self.document = Document::None;
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docquery_core::Speaker;
    use docquery_loader::{Cell, TabularDataset};
    use std::sync::Arc;

    #[test]
    fn append_turn_adds_user_then_assistant() {
        let mut history = ChatHistory::new();
        history.append_turn("how many rows?", "3");
        history.append_turn("and columns?", "2");

        assert_eq!(history.len(), 4);
        let speakers: Vec<Speaker> = history.history().iter().map(|t| t.speaker).collect();
        assert_eq!(
            speakers,
            vec![Speaker::User, Speaker::Assistant, Speaker::User, Speaker::Assistant]
        );
        assert_eq!(history.history()[1].text, "3");
    }

    #[test]
    fn new_session_is_empty() {
        let session = Session::new();
        assert!(!session.document.is_loaded());
        assert!(session.history.is_empty());
        assert_eq!(session.id.len(), 36);
    }

    #[test]
    fn document_can_be_replaced_and_cleared_without_touching_history() {
        let mut session = Session::with_id("s1");
        session.history.append_turn("hi", "hello");

        let data = TabularDataset::new(vec!["a".into()], vec![vec![Cell::Int(1)]]).unwrap();
        session.replace_document(Document::Tabular(Arc::new(data)));
        assert!(session.document.as_tabular().is_some());

        session.clear_document();
        assert!(!session.document.is_loaded());
        assert_eq!(session.history.len(), 2);
    }

    #[test]
    fn history_serializes_as_plain_array() {
        let mut history = ChatHistory::new();
        history.append_turn("q", "a");
        let json = serde_json::to_value(&history).unwrap();
        assert_eq!(json[0]["speaker"], "user");
        assert_eq!(json[1]["text"], "a");
    }
}
