//! Terminal output utilities: notes, ANSI formatting, preview tables.

use docquery_agent::HistoryRenderer;
use docquery_core::{ChatTurn, Speaker};
use docquery_loader::DataPreview;

pub const RESET: &str = "\x1b[0m";
pub const BOLD: &str = "\x1b[1m";
pub const DIM: &str = "\x1b[2m";

pub const RED: &str = "\x1b[31m";
pub const GREEN: &str = "\x1b[32m";
pub const YELLOW: &str = "\x1b[33m";
pub const CYAN: &str = "\x1b[36m";

/// Widest a preview cell may get before it is cut with an ellipsis.
const MAX_CELL_WIDTH: usize = 24;

/// Check if the terminal supports color output.
pub fn supports_color() -> bool {
    std::env::var("NO_COLOR").is_err()
        && (std::env::var("COLORTERM").is_ok()
            || std::env::var("TERM")
                .map(|t| t != "dumb")
                .unwrap_or(false))
}

/// Strip ANSI escape codes from a string.
pub fn strip_ansi(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\x1b' {
            for next in chars.by_ref() {
                if next == 'm' {
                    break;
                }
            }
        } else {
            result.push(c);
        }
    }
    result
}

#[derive(Debug, Clone, Copy)]
enum NoteKind {
    Info,
    Warn,
    Error,
    Success,
}

impl NoteKind {
    fn styled(self) -> (&'static str, &'static str) {
        match self {
            NoteKind::Info => (CYAN, "ℹ"),
            NoteKind::Warn => (YELLOW, "⚠"),
            NoteKind::Error => (RED, "✗"),
            NoteKind::Success => (GREEN, "✓"),
        }
    }

    fn plain(self) -> &'static str {
        match self {
            NoteKind::Info => "INFO",
            NoteKind::Warn => "WARN",
            NoteKind::Error => "ERROR",
            NoteKind::Success => "OK",
        }
    }
}

fn format_note(kind: NoteKind, msg: &str, color: bool) -> String {
    if color {
        let (code, symbol) = kind.styled();
        format!("{code}{BOLD}{symbol}{RESET} {msg}")
    } else {
        format!("{}: {msg}", kind.plain())
    }
}

pub fn note_info(msg: &str) {
    println!("{}", format_note(NoteKind::Info, msg, supports_color()));
}

pub fn note_warn(msg: &str) {
    println!("{}", format_note(NoteKind::Warn, msg, supports_color()));
}

/// Errors go to stderr.
pub fn note_error(msg: &str) {
    eprintln!("{}", format_note(NoteKind::Error, msg, supports_color()));
}

pub fn note_success(msg: &str) {
    println!("{}", format_note(NoteKind::Success, msg, supports_color()));
}

fn truncate_cell(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut cut: String = s.chars().take(max.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

/// Render the first `limit` rows of a preview as an aligned text table,
/// with a leading row-index column.
pub fn render_preview(preview: &DataPreview, limit: usize) -> String {
    let mut header = vec![String::new()];
    header.extend(preview.columns.iter().map(|c| truncate_cell(&c.name, MAX_CELL_WIDTH)));

    let rows: Vec<Vec<String>> = preview
        .rows
        .iter()
        .take(limit)
        .enumerate()
        .map(|(i, row)| {
            let mut cells = vec![i.to_string()];
            cells.extend(row.iter().map(|v| truncate_cell(v, MAX_CELL_WIDTH)));
            cells
        })
        .collect();

    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
    for row in &rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(cell.chars().count());
            }
        }
    }

    let mut out = String::new();
    out.push_str(&join_padded(&header, &widths));
    let sep: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(&join_padded(&sep, &widths));
    for row in &rows {
        out.push_str(&join_padded(row, &widths));
    }
    out.push_str(&format!(
        "[{} of {} rows x {} columns]\n",
        rows.len(),
        preview.total_rows,
        preview.columns.len()
    ));
    out
}

fn join_padded(cells: &[String], widths: &[usize]) -> String {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, w)| {
            let pad = w.saturating_sub(strip_ansi(cell).chars().count());
            format!("{cell}{}", " ".repeat(pad))
        })
        .collect();
    format!("  {}\n", padded.join("  ").trim_end())
}

/// Transcript entries with speaker coloring, most recent first.
pub fn format_transcript(history: &[ChatTurn], color: bool) -> String {
    if !color {
        return HistoryRenderer::render_text(history);
    }
    HistoryRenderer::render(history)
        .into_iter()
        .map(|turn| match turn.speaker {
            Speaker::Assistant => format!("{GREEN}{}{RESET}", turn.text),
            Speaker::User => format!("{DIM}{}{RESET}", turn.text),
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use docquery_loader::{Column, ColumnType};

    fn preview(rows: usize) -> DataPreview {
        DataPreview {
            columns: vec![
                Column { name: "name".into(), dtype: ColumnType::Text },
                Column { name: "age".into(), dtype: ColumnType::Int },
            ],
            rows: (0..rows).map(|i| vec![format!("p{i}"), (20 + i).to_string()]).collect(),
            total_rows: rows + 5,
        }
    }

    #[test]
    fn notes_fall_back_to_plain_labels() {
        assert_eq!(format_note(NoteKind::Error, "boom", false), "ERROR: boom");
        assert_eq!(strip_ansi(&format_note(NoteKind::Success, "done", true)), "✓ done");
    }

    #[test]
    fn strips_ansi() {
        let colored = format!("{GREEN}hello{RESET}");
        assert_eq!(strip_ansi(&colored), "hello");
    }

    #[test]
    fn preview_has_index_header_and_footer() {
        let table = render_preview(&preview(3), 100);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[0], "     name  age");
        assert!(lines[2].starts_with("  0  p0"));
        assert_eq!(lines.last().copied(), Some("[3 of 8 rows x 2 columns]"));
    }

    #[test]
    fn preview_respects_limit() {
        let table = render_preview(&preview(10), 2);
        assert!(table.contains("p1"));
        assert!(!table.contains("p2"));
        assert!(table.contains("[2 of 15 rows"));
    }

    #[test]
    fn long_cells_are_cut() {
        assert_eq!(truncate_cell("abcdef", 4), "abc…");
        assert_eq!(truncate_cell("abcd", 4), "abcd");
    }

    #[test]
    fn transcript_without_color_is_plain_and_newest_first() {
        let history = vec![ChatTurn::user("hi"), ChatTurn::assistant("hello")];
        let out = format_transcript(&history, false);
        assert_eq!(out, "AI: hello\n\nUSER: hi");
        assert_eq!(strip_ansi(&format_transcript(&history, true)), out);
    }
}
