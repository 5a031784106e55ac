//! Transcript rendering, most recent entry first.

use docquery_core::{ChatTurn, Speaker};
use serde::Serialize;

pub const USER_TEMPLATE: &str = r#"<div class="chat-message user"><div class="avatar">You</div><div class="message">{{MSG}}</div></div>"#;
pub const BOT_TEMPLATE: &str = r#"<div class="chat-message bot"><div class="avatar">AI</div><div class="message">{{MSG}}</div></div>"#;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedTurn {
    pub speaker: Speaker,
    /// `USER: …` / `AI: …`, unescaped.
    pub text: String,
    pub html: String,
}

pub struct HistoryRenderer;

impl HistoryRenderer {
    /// Entries in reverse insertion order, each filled into the template of
    /// its stored speaker.
    pub fn render(history: &[ChatTurn]) -> Vec<RenderedTurn> {
        history
            .iter()
            .rev()
            .map(|turn| {
                let text = turn.labeled();
                let template = match turn.speaker {
                    Speaker::User => USER_TEMPLATE,
                    Speaker::Assistant => BOT_TEMPLATE,
                };
                RenderedTurn {
                    speaker: turn.speaker,
                    html: template.replace("{{MSG}}", &html_escape(&text)),
                    text,
                }
            })
            .collect()
    }

    /// Plain-text transcript, one entry per block, most recent first.
    pub fn render_text(history: &[ChatTurn]) -> String {
        Self::render(history)
            .into_iter()
            .map(|t| t.text)
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

pub fn html_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
