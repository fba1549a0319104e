//! Sukuk chat - terminal client for the Sukuk assistant backend
//!
//! Drives a single chat session through a pure state machine and renders
//! the conversation in the terminal.

mod api;
mod cli;
mod config;
mod render;
mod runtime;
mod session;

use api::{ChatBackend, HttpChatBackend, LoggingBackend, UploadFile};
use cli::{help_text, parse_command, ChatCommand};
use config::ClientConfig;
use render::TerminalRenderer;
use runtime::{spawn_session, RuntimeError, SessionHandle};
use session::{Notice, SessionPhase, Sender};
use std::io::IsTerminal;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging; stdout belongs to the conversation
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sukuk_chat=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let config = ClientConfig::from_env()?;
    tracing::info!(
        base_url = %config.base_url,
        user_id = config.user_id,
        provider = %config.provider,
        "Starting chat client"
    );

    let http = HttpChatBackend::new(&config)?;
    let backend: Arc<dyn ChatBackend> = Arc::new(LoggingBackend::new(Arc::new(http)));
    let handle = spawn_session(backend.clone());

    let use_color = std::io::stdout().is_terminal();
    let renderer = TerminalRenderer::with_color(use_color);

    tokio::spawn(print_notices(
        handle.clone(),
        handle.subscribe(),
        TerminalRenderer::with_color(use_color),
    ));

    handle.initialize().await?;
    print_backend_status(backend.as_ref(), &renderer).await;
    renderer.print_info("Type a question, or /help for commands.");

    let mut provider = Some(config.provider);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let Some(command) = parse_command(&line) else {
            if handle.snapshot().is_loading() {
                renderer.print_info("Still waiting on the previous request");
                continue;
            }
            handle.send_message(line, provider).await?;
            continue;
        };

        match command {
            ChatCommand::Quit => break,
            ChatCommand::Help => renderer.print_info(help_text()),
            ChatCommand::Clear => {
                handle.clear().await?;
                renderer.print_info("Conversation cleared");
            }
            ChatCommand::Reset => handle.reset().await?,
            ChatCommand::Upload(path) => match UploadFile::from_path(&path).await {
                Ok(file) => {
                    renderer.print_info(&format!("Uploading {}...", file.file_name));
                    handle.upload_document(file).await?;
                }
                Err(e) => renderer.print_error(&format!("Cannot read {}: {e}", path.display())),
            },
            ChatCommand::Documents => {
                renderer.print_documents(&handle.snapshot().session.documents);
            }
            ChatCommand::Attach(document_id) => {
                attach_stored_document(backend.as_ref(), &handle, &renderer, document_id).await?;
            }
            ChatCommand::Detach(document_id) => handle.detach_document(document_id).await?,
            ChatCommand::Provider(choice) => {
                provider = Some(choice);
                renderer.print_info(&format!("Preferred provider: {choice}"));
            }
            ChatCommand::Status => {
                renderer.print_status(&handle.snapshot());
                print_backend_status(backend.as_ref(), &renderer).await;
            }
            ChatCommand::Suggest(n) => {
                let snapshot = handle.snapshot();
                match snapshot.quick_suggestions.get(n - 1) {
                    Some(suggestion) => {
                        renderer.print_info(&format!("> {suggestion}"));
                        handle.send_message(suggestion.clone(), provider).await?;
                    }
                    None => renderer.print_error(&format!("No suggestion number {n}")),
                }
            }
            ChatCommand::History => {
                print_history(backend.as_ref(), &handle, &renderer).await;
            }
            ChatCommand::Invalid(message) => renderer.print_error(&message),
        }
    }

    tracing::info!("Chat client exiting");
    Ok(())
}

/// Render notices from the runtime as they arrive
async fn print_notices(
    handle: SessionHandle,
    mut notices: broadcast::Receiver<Notice>,
    renderer: TerminalRenderer,
) {
    loop {
        match notices.recv().await {
            Ok(Notice::MessageAppended(message)) => {
                // The user just typed their own message
                if message.sender == Sender::Assistant {
                    renderer.print_message(&message);
                }
            }
            Ok(Notice::PhaseChanged(phase)) => match phase {
                SessionPhase::Initializing => renderer.print_info("Connecting..."),
                SessionPhase::Sending => renderer.print_info("Thinking..."),
                SessionPhase::Ready => {
                    renderer.print_suggestions(&handle.snapshot().quick_suggestions);
                }
                SessionPhase::Uninitialized | SessionPhase::Failed { .. } => {}
            },
            Ok(Notice::Error(message)) => renderer.print_error(&message),
            Ok(Notice::DocumentsChanged) => {
                let count = handle.snapshot().session.documents.len();
                tracing::debug!(count, "Documents changed");
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Notice printer fell behind");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

async fn print_backend_status(backend: &dyn ChatBackend, renderer: &TerminalRenderer) {
    let (health, budget) = tokio::join!(backend.health(), backend.budget());
    match health {
        Ok(health) => renderer.print_info(&renderer.format_health(&health)),
        Err(e) => renderer.print_error(&format!("Backend health unavailable: {e}")),
    }
    // Budget endpoint is optional on older backends
    if let Ok(budget) = budget {
        renderer.print_info(&renderer.format_budget(&budget));
    }
}

/// Look a document up in the server listing and attach it locally
async fn attach_stored_document(
    backend: &dyn ChatBackend,
    handle: &SessionHandle,
    renderer: &TerminalRenderer,
    document_id: i64,
) -> Result<(), RuntimeError> {
    let session_id = handle.snapshot().session.session_id;
    if session_id.is_empty() {
        renderer.print_error("No active session");
        return Ok(());
    }
    match backend.list_documents(&session_id).await {
        Ok(documents) => match documents.into_iter().find(|d| d.id == document_id) {
            Some(document) => handle.attach_document(document).await?,
            None => renderer.print_error(&format!("No stored document with id {document_id}")),
        },
        Err(e) => renderer.print_error(&format!("Failed to load documents: {e}")),
    }
    Ok(())
}

async fn print_history(
    backend: &dyn ChatBackend,
    handle: &SessionHandle,
    renderer: &TerminalRenderer,
) {
    let snapshot = handle.snapshot();
    if !snapshot.session.has_session() {
        renderer.print_error("No active session");
        return;
    }
    match backend.session_history(&snapshot.session.session_id).await {
        Ok(history) => match serde_json::to_string_pretty(&history) {
            Ok(text) => renderer.print_info(&text),
            Err(e) => renderer.print_error(&format!("Cannot display history: {e}")),
        },
        Err(e) => renderer.print_error(&format!("Failed to load history: {e}")),
    }
}
