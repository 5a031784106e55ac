//! Standalone HTML export of a session transcript.

use crate::renderer::html_escape;
use crate::session_state::Session;

/// File name offered for a session's export, e.g. `docquery-3f2a9c1e.html`.
pub fn export_filename(session_id: &str) -> String {
    let short: String = session_id.chars().take(8).collect();
    format!("docquery-{short}.html")
}

/// Full HTML page with the session's history in conversation order.
pub fn render_html(title: &str, session: &Session) -> String {
    let messages = session
        .history
        .history()
        .iter()
        .map(|turn| {
            let role = turn.speaker.label();
            let class = match role {
                "AI" => "msg-assistant",
                _ => "msg-user",
            };
            format!(
                r#"<div class="message {class}"><span class="role">{role}</span><div class="content">{content}</div></div>"#,
                content = html_escape(&turn.text),
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<title>{title}</title>
<style>
body {{ font-family: system-ui, sans-serif; max-width: 800px; margin: 2rem auto; padding: 0 1rem; }}
.message {{ margin-bottom: 1rem; border-radius: 8px; padding: 0.75rem 1rem; }}
.msg-user {{ background: #eef2f7; }}
.msg-assistant {{ background: #f7f7f9; border-left: 3px solid #3b82f6; }}
.role {{ font-weight: 700; font-size: 0.75rem; color: #6b7280; display: block; margin-bottom: 0.25rem; }}
.content {{ white-space: pre-wrap; line-height: 1.6; }}
.meta {{ color: #6b7280; font-size: 0.85rem; }}
</style>
</head>
<body>
<h1>{title}</h1>
<p class="meta">Session {id} started {started} &middot; document: {document}</p>
{messages}
</body>
</html>"#,
        title = html_escape(title),
        id = html_escape(&session.id),
        started = session.created_at.format("%Y-%m-%d %H:%M UTC"),
        document = session.document.kind_label(),
    )
}
