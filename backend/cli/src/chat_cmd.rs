//! Interactive terminal chat over one document.

use std::path::Path;

use anyhow::{bail, Context, Result};
use docquery_agent::{QueryExecutor, Session};
use docquery_core::DocQueryError;
use docquery_loader::{Document, DocumentLoader, UploadedFile, PREVIEW_ROWS};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::info;

use crate::runtime::Runtime;
use crate::terminal_output::{
    format_transcript, note_error, note_info, note_success, note_warn, render_preview,
    supports_color,
};

/// Rows printed when a table is loaded in the terminal.
const TERMINAL_PREVIEW_ROWS: usize = 10;

/// What a line of input asks the loop to do.
#[derive(Debug, PartialEq, Eq)]
pub enum Input<'a> {
    Query(&'a str),
    History,
    Quit,
    Skip,
}

impl<'a> Input<'a> {
    pub fn parse(line: &'a str) -> Self {
        match line.trim() {
            "" => Input::Skip,
            ":q" | ":quit" | "exit" | "quit" => Input::Quit,
            ":history" => Input::History,
            query => Input::Query(query),
        }
    }
}

/// Read and parse a file from disk as an upload.
pub async fn load_file(loader: &DocumentLoader, path: &Path) -> Result<Document, DocQueryError> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let upload = UploadedFile::new(name, Vec::new())?;
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| DocQueryError::ParseError(format!("cannot read {}: {e}", path.display())))?;
    let upload = UploadedFile { bytes: bytes.into(), ..upload };

    let loader = loader.clone();
    tokio::task::spawn_blocking(move || loader.load(&upload))
        .await
        .map_err(DocQueryError::parse)?
}

fn describe(document: &Document) {
    match document {
        Document::Tabular(data) => {
            println!("Data Preview:");
            print!("{}", render_preview(&data.preview(PREVIEW_ROWS), TERMINAL_PREVIEW_ROWS));
        }
        Document::Pdf(pdf) => {
            note_success(&format!(
                "PDF processed ({} pages). Ask your questions below.",
                pdf.page_count()
            ));
        }
        Document::None => {}
    }
}

/// Drive a session from `input` until it ends or a quit command arrives.
/// Errors from a single turn are printed and the loop continues.
pub async fn chat_loop<R>(
    executor: &QueryExecutor,
    session: &mut Session,
    input: R,
    temperature: f32,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let color = supports_color();
    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await.context("Failed to read input")? {
        match Input::parse(&line) {
            Input::Skip => continue,
            Input::Quit => break,
            Input::History => {
                println!("{}", format_transcript(session.history.history(), color));
            }
            Input::Query(query) => match executor.run_turn(session, query, temperature).await {
                Ok(answer) => println!("\nAI: {answer}\n"),
                Err(e) => note_error(&format!("An error occurred: {e}")),
            },
        }
    }
    Ok(())
}

/// The `--temperature` flag, or the configured default.
pub fn resolve_temperature(flag: Option<f32>, default: f32) -> Result<f32> {
    let temperature = flag.unwrap_or(default);
    if !(0.0..=1.0).contains(&temperature) {
        bail!("temperature must be within [0.0, 1.0], got {temperature}");
    }
    Ok(temperature)
}

/// Entry point for `docquery chat`.
pub async fn run(runtime: &Runtime, file: &Path, temperature: Option<f32>) -> Result<()> {
    let temperature = resolve_temperature(temperature, runtime.config.llm.temperature)?;
    let mut session = Session::new();

    match load_file(&runtime.loader, file).await {
        Ok(document) => {
            describe(&document);
            session.replace_document(document);
        }
        Err(e) => {
            note_error(&format!("An error occurred: {e}"));
            return Ok(());
        }
    }

    let executor = match runtime.executor() {
        Ok(executor) => executor,
        Err(e) => {
            note_warn(&e.to_string());
            return Ok(());
        }
    };

    info!(session_id = %session.id, temperature, "Chat session started");
    note_info("Enter a query (:history shows the transcript, :quit exits)");
    chat_loop(executor, &mut session, BufReader::new(tokio::io::stdin()), temperature).await?;

    println!("{}", format_transcript(session.history.history(), supports_color()));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use docquery_agent::ModelConfig;
    use docquery_loader::{PageImage, PageRasterizer};
    use docquery_planner::MockProvider;
    use std::sync::Arc;

    struct NoPages;

    impl PageRasterizer for NoPages {
        fn rasterize(&self, _path: &Path) -> anyhow::Result<Vec<PageImage>> {
            Ok(Vec::new())
        }
    }

    fn loader() -> DocumentLoader {
        DocumentLoader::new(Arc::new(NoPages))
    }

    #[test]
    fn parses_input_lines() {
        assert_eq!(Input::parse("  "), Input::Skip);
        assert_eq!(Input::parse(":q"), Input::Quit);
        assert_eq!(Input::parse(":history"), Input::History);
        assert_eq!(Input::parse(" how many rows? "), Input::Query("how many rows?"));
    }

    #[test]
    fn temperature_flag_must_be_in_range() {
        assert_eq!(resolve_temperature(None, 0.3).unwrap(), 0.3);
        assert_eq!(resolve_temperature(Some(0.0), 0.3).unwrap(), 0.0);
        let err = resolve_temperature(Some(1.5), 0.3).unwrap_err();
        assert_eq!(err.to_string(), "temperature must be within [0.0, 1.0], got 1.5");
        assert!(resolve_temperature(Some(f32::NAN), 0.3).is_err());
    }

    #[tokio::test]
    async fn loads_csv_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("people.csv");
        std::fs::write(&path, "name,age\nAnn,34\nBo,27\n").unwrap();

        let document = load_file(&loader(), &path).await.unwrap();
        assert_eq!(document.as_tabular().unwrap().row_count(), 2);
    }

    #[tokio::test]
    async fn rejects_unsupported_extension_before_reading() {
        let err = load_file(&loader(), Path::new("/nonexistent/notes.txt"))
            .await
            .unwrap_err();
        assert!(matches!(err, DocQueryError::UnsupportedKind(_)));
    }

    #[tokio::test]
    async fn missing_file_is_parse_error() {
        let err = load_file(&loader(), Path::new("/nonexistent/data.csv"))
            .await
            .unwrap_err();
        assert!(matches!(err, DocQueryError::ParseError(_)));
    }

    #[tokio::test]
    async fn loop_runs_queries_and_survives_failures() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("people.csv");
        std::fs::write(&path, "name,age\nAnn,34\n").unwrap();

        let provider = Arc::new(MockProvider::new("mock").with_script([
            "Thought: easy\nFinal Answer: one row",
            "Thought: again\nFinal Answer: still one",
        ]));
        let executor = QueryExecutor::new(provider, ModelConfig::default());
        let mut session = Session::new();
        session.replace_document(load_file(&loader(), &path).await.unwrap());

        let input: &[u8] = b"how many rows?\n\n:history\nand now?\n:quit\nignored\n";
        chat_loop(&executor, &mut session, input, 0.3).await.unwrap();

        let labels: Vec<String> = session.history.history().iter().map(|t| t.labeled()).collect();
        assert_eq!(
            labels,
            ["USER: how many rows?", "AI: one row", "USER: and now?", "AI: still one"]
        );
    }

    #[tokio::test]
    async fn failed_turn_leaves_history_untouched() {
        let provider = Arc::new(MockProvider::new("mock").failing("boom"));
        let executor = QueryExecutor::new(provider, ModelConfig::default());
        let mut session = Session::new();

        let input: &[u8] = b"anything?\n";
        chat_loop(&executor, &mut session, input, 0.3).await.unwrap();
        assert!(session.history.is_empty());
    }
}
