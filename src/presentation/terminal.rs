// Terminal front end - intents from input lines, views to stdout
use crate::application::intents::{Intent, IntentSource};
use crate::domain::chart::ScaleLabel;
use crate::domain::dashboard::DashboardView;
use crate::infrastructure::config::ViewFormat;
use crate::presentation::commands::{parse_command, Command, HELP};
use async_trait::async_trait;
use std::fmt::Write;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio_stream::wrappers::LinesStream;
use tokio_stream::StreamExt;

pub struct TerminalIntentSource<R> {
    lines: LinesStream<BufReader<R>>,
}

impl<R: AsyncRead + Unpin> TerminalIntentSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: LinesStream::new(BufReader::new(reader).lines()),
        }
    }
}

impl TerminalIntentSource<tokio::io::Stdin> {
    pub fn stdin() -> Self {
        Self::new(tokio::io::stdin())
    }
}

#[async_trait]
impl<R: AsyncRead + Unpin + Send> IntentSource for TerminalIntentSource<R> {
    async fn next_intent(&mut self) -> Option<Intent> {
        while let Some(line) = self.lines.next().await {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    tracing::warn!("Failed to read input: {}", e);
                    return None;
                }
            };

            match parse_command(&line) {
                Ok(Command::Intent(intent)) => return Some(intent),
                Ok(Command::Quit) => return None,
                Err(e) => eprintln!("{} ({})", e, HELP),
            }
        }
        None
    }
}

pub fn render(view: &DashboardView, format: ViewFormat) -> Result<String, serde_json::Error> {
    match format {
        ViewFormat::Text => Ok(render_view(view)),
        ViewFormat::Json => render_view_json(view),
    }
}

/// Single-line JSON rendering, for piping views into other tools
pub fn render_view_json(view: &DashboardView) -> Result<String, serde_json::Error> {
    serde_json::to_string(view)
}

/// Plain-text rendering of the whole view
pub fn render_view(view: &DashboardView) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "== {} [{} / {}] data: {:?}, filters: {:?}",
        view.caption, view.scale, view.aggregator, view.data_connection, view.filter_connection
    );

    if view.data_points.is_empty() {
        let _ = writeln!(out, "   (no data)");
    }
    for point in &view.data_points {
        let label = match &point.scale {
            ScaleLabel::Month(month) => month.to_string(),
            ScaleLabel::DayMonth(day_month) => day_month.clone(),
        };
        let _ = writeln!(out, "   {:>6}  {}", label, point.value);
    }

    if !view.active_filters.is_empty() {
        let _ = writeln!(out, "   filters: {}", view.active_filters.join(", "));
    }
    let _ = write!(out, "   filter by: \"{}\"", view.free_text);
    if let Some(suggestions) = &view.suggestions {
        let _ = write!(out, "\n   dropdown:");
        for suggestion in suggestions {
            let _ = write!(out, "\n     - {}", suggestion);
        }
    }

    out
}
