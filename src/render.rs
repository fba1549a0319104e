//! Terminal rendering for the chat client
//!
//! Formatting is kept in pure functions returning `String` so it can be
//! tested; [`TerminalRenderer`] adds optional ANSI styling and writes to
//! stdout.

use crate::api::{BudgetStatus, Document, HealthStatus, UploadStatus};
use crate::session::{ChatMessage, Sender, SessionState};
use std::fmt::Write as _;
use std::io::{self, Write};

const ANSI_DIM: &str = "\x1b[2m";
const ANSI_BOLD: &str = "\x1b[1m";
const ANSI_RESET: &str = "\x1b[0m";
const ANSI_CYAN: &str = "\x1b[36m";
const ANSI_YELLOW: &str = "\x1b[33m";
const ANSI_GREEN: &str = "\x1b[32m";
const ANSI_RED: &str = "\x1b[31m";

/// How close the model budget is to running out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageBand {
    Normal,
    Elevated,
    High,
}

impl UsageBand {
    pub fn from_percentage(usage: f64) -> Self {
        if usage > 80.0 {
            UsageBand::High
        } else if usage > 60.0 {
            UsageBand::Elevated
        } else {
            UsageBand::Normal
        }
    }

    fn color(self) -> &'static str {
        match self {
            UsageBand::Normal => ANSI_GREEN,
            UsageBand::Elevated => ANSI_YELLOW,
            UsageBand::High => ANSI_RED,
        }
    }
}

#[allow(clippy::cast_precision_loss)]
pub fn format_file_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * 1024;
    if bytes < KB {
        format!("{bytes} B")
    } else if bytes < MB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    }
}

pub fn file_icon(file_type: &str) -> &'static str {
    if file_type.contains("pdf") {
        "📄"
    } else if file_type.contains("word") {
        "📝"
    } else if file_type.contains("sheet") || file_type.contains("excel") {
        "📊"
    } else {
        "📎"
    }
}

/// Ten-cell bar, clamped to 100%
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn usage_bar(usage: f64) -> String {
    let filled = (usage.clamp(0.0, 100.0) / 10.0).round() as usize;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(10 - filled))
}

pub fn format_document(document: &Document) -> String {
    let mut line = format!(
        "{} [{}] {} ({})",
        file_icon(&document.file_type),
        document.id,
        document.file_name,
        format_file_size(document.file_size)
    );
    if let Some(chunks) = document.chunk_count {
        let _ = write!(line, ", {chunks} chunks");
    }
    match document.upload_status {
        UploadStatus::Completed => {}
        UploadStatus::Processing => line.push_str(", processing"),
        UploadStatus::Failed => line.push_str(", failed"),
    }
    line
}

/// Plain text renderer with optional ANSI styling
pub struct TerminalRenderer {
    use_color: bool,
}

impl TerminalRenderer {
    pub fn with_color(use_color: bool) -> Self {
        Self { use_color }
    }

    fn paint(&self, style: &str, text: &str) -> String {
        if self.use_color {
            format!("{style}{text}{ANSI_RESET}")
        } else {
            text.to_string()
        }
    }

    pub fn format_message(&self, message: &ChatMessage) -> String {
        let label = match message.sender {
            Sender::User => self.paint(ANSI_BOLD, "you"),
            Sender::Assistant => self.paint(ANSI_CYAN, "assistant"),
        };
        let mut out = format!(
            "{} {label}: {}",
            self.paint(ANSI_DIM, &message.timestamp.format("%H:%M").to_string()),
            message.content
        );

        let Some(annotations) = &message.annotations else {
            return out;
        };
        match annotations.is_shariah_compliant {
            Some(true) => {
                let _ = write!(out, "\n  {}", self.paint(ANSI_GREEN, "Shariah compliant"));
            }
            Some(false) => {
                let _ = write!(out, "\n  {}", self.paint(ANSI_RED, "Not Shariah compliant"));
            }
            None => {}
        }
        if !annotations.principles_involved.is_empty() {
            let _ = write!(
                out,
                "\n  Principles: {}",
                annotations.principles_involved.join(", ")
            );
        }
        if !annotations.recommended_issuances.is_empty() {
            let _ = write!(
                out,
                "\n  Recommended issuances: {}",
                annotations.recommended_issuances.len()
            );
        }
        for action in &annotations.platform_actions {
            let _ = write!(out, "\n  > {action}");
        }
        for source in &annotations.sources {
            let _ = write!(out, "\n  [{}] {}", source.title, source.url);
        }
        if let Some(model) = &annotations.model_used {
            let meta = match annotations.cost {
                Some(cost) => format!("{model}, ${cost:.4}"),
                None => model.clone(),
            };
            let _ = write!(out, "\n  {}", self.paint(ANSI_DIM, &meta));
        }
        out
    }

    pub fn format_suggestions(&self, suggestions: &[String]) -> Option<String> {
        if suggestions.is_empty() {
            return None;
        }
        let items: Vec<String> = suggestions
            .iter()
            .enumerate()
            .map(|(i, s)| format!("{}. {s}", i + 1))
            .collect();
        Some(self.paint(ANSI_DIM, &format!("Try: {}", items.join("  "))))
    }

    pub fn format_budget(&self, budget: &BudgetStatus) -> String {
        let band = UsageBand::from_percentage(budget.usage_percentage);
        format!(
            "Budget: {} {:.1}% used, ${:.4} remaining, recommended model {}",
            self.paint(band.color(), &usage_bar(budget.usage_percentage)),
            budget.usage_percentage,
            budget.remaining_budget,
            budget.recommended_model
        )
    }

    pub fn format_health(&self, health: &HealthStatus) -> String {
        format!(
            "Backend: {} ({} {})",
            health.status, health.service, health.version
        )
    }

    pub fn print_message(&self, message: &ChatMessage) {
        self.print_line(&self.format_message(message));
    }

    pub fn print_suggestions(&self, suggestions: &[String]) {
        if let Some(line) = self.format_suggestions(suggestions) {
            self.print_line(&line);
        }
    }

    pub fn print_documents(&self, documents: &[Document]) {
        if documents.is_empty() {
            self.print_info("No documents attached");
            return;
        }
        self.print_line(&format!("Documents ({})", documents.len()));
        for document in documents {
            self.print_line(&format!("  {}", format_document(document)));
        }
    }

    pub fn print_status(&self, state: &SessionState) {
        let session = if state.session.has_session() {
            state.session.session_id.as_str()
        } else {
            "none"
        };
        self.print_info(&format!(
            "Session {session} ({}), {} messages, {} documents",
            state.phase.name(),
            state.session.messages.len(),
            state.session.documents.len()
        ));
    }

    pub fn print_info(&self, info: &str) {
        self.print_line(&self.paint(ANSI_DIM, info));
    }

    pub fn print_error(&self, error: &str) {
        let _ = writeln!(io::stderr(), "{}", self.paint(ANSI_RED, error));
    }

    fn print_line(&self, line: &str) {
        let mut stdout = io::stdout().lock();
        let _ = writeln!(stdout, "{line}");
        let _ = stdout.flush();
    }
}

impl Default for TerminalRenderer {
    fn default() -> Self {
        Self::with_color(true)
    }
}
