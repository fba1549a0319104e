//! Slash command parsing for the terminal client
//!
//! Lines starting with `/` control the session; anything else is sent to
//! the assistant as a chat message.

use crate::api::ProviderPreference;
use std::path::PathBuf;

/// A parsed slash command
#[derive(Debug, Clone, PartialEq)]
pub enum ChatCommand {
    /// Clear the transcript, keeping the session and documents
    Clear,
    /// Start a fresh backend session
    Reset,
    /// Upload a local file to the session
    Upload(PathBuf),
    /// List attached documents
    Documents,
    /// Attach a document the backend already stores for this session
    Attach(i64),
    /// Remove a document from the session
    Detach(i64),
    /// Switch the preferred model provider
    Provider(ProviderPreference),
    /// Backend health and budget
    Status,
    /// Send the Nth quick suggestion (1-based)
    Suggest(usize),
    /// Server-side transcript
    History,
    Help,
    Quit,
    /// Report a parsing error back to the caller
    Invalid(String),
}

/// Parses user input for slash commands.
///
/// Returns `None` if the input should be sent as a regular message.
pub fn parse_command(input: &str) -> Option<ChatCommand> {
    let input = input.trim();
    let rest = input.strip_prefix('/')?;

    let mut parts = rest.splitn(2, ' ');
    let command = parts.next()?.to_lowercase();
    let argument = parts.next().map(str::trim).filter(|s| !s.is_empty());

    let result = match command.as_str() {
        "clear" => ChatCommand::Clear,
        "reset" | "new" => ChatCommand::Reset,
        "upload" => match argument {
            Some(path) => ChatCommand::Upload(PathBuf::from(path)),
            None => ChatCommand::Invalid("/upload requires a file path".to_string()),
        },
        "docs" | "documents" => ChatCommand::Documents,
        "attach" => parse_document_id(argument, ChatCommand::Attach, "/attach"),
        "detach" => parse_document_id(argument, ChatCommand::Detach, "/detach"),
        "provider" => match argument {
            Some(name) => match name.parse() {
                Ok(provider) => ChatCommand::Provider(provider),
                Err(err) => ChatCommand::Invalid(format!("/provider {err}")),
            },
            None => ChatCommand::Invalid("/provider expects 'gemini' or 'openai'".to_string()),
        },
        "status" | "health" => ChatCommand::Status,
        "suggest" | "s" => match argument.map(str::parse::<usize>) {
            Some(Ok(n)) if n >= 1 => ChatCommand::Suggest(n),
            _ => ChatCommand::Invalid("/suggest expects a suggestion number".to_string()),
        },
        "history" => ChatCommand::History,
        "help" | "?" => ChatCommand::Help,
        "quit" | "exit" | "q" => ChatCommand::Quit,
        _ => ChatCommand::Invalid(format!("Unknown command: /{command}")),
    };

    Some(result)
}

fn parse_document_id<F>(argument: Option<&str>, constructor: F, name: &str) -> ChatCommand
where
    F: FnOnce(i64) -> ChatCommand,
{
    match argument.map(str::parse::<i64>) {
        Some(Ok(id)) => constructor(id),
        Some(Err(_)) => ChatCommand::Invalid(format!("{name} expects a numeric document id")),
        None => ChatCommand::Invalid(format!("{name} requires a document id")),
    }
}

pub fn help_text() -> &'static str {
    "Commands:
  /clear             Clear the conversation (documents stay attached)
  /reset             Start a new session
  /upload <path>     Upload a PDF, DOCX, TXT, or Excel file (10MB max)
  /docs              List attached documents
  /attach <id>       Attach a document already stored on the server
  /detach <id>       Remove a document
  /provider <name>   Prefer 'gemini' or 'openai'
  /suggest <n>       Send quick suggestion number n
  /status            Show backend health and budget
  /history           Show the server-side transcript
  /help              Show this help
  /quit              Exit"
}
