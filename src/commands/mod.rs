/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint.

It exposes three top-level command modules:

- `chat`   — Interactive chat session
- `users`  — List candidate correspondents
- `unread` — Show unread incoming messages

These handlers are intentionally small and use the library components:
the transport, the session controller, and the rendering helpers below.
*/

use crate::api::HttpTransport;
use crate::config::Config;
use crate::error::Result;
use crate::models::Message;
use crate::session::ChatSession;

use colored::Colorize;
use std::sync::Arc;

/// Build the shared transport and a session for the configured user
fn make_session(config: &Config) -> Result<ChatSession> {
    let user_id = config.require_user_id()?;
    let transport = Arc::new(HttpTransport::new(&config.api)?);
    Ok(ChatSession::new(user_id, transport))
}

/// Render one message line: timestamp, author, content, edited marker
fn format_message(message: &Message, current_user_id: &str) -> String {
    let time = message.sent_at.format("%H:%M").to_string().dimmed();
    let author = if message.sender_id == current_user_id {
        "you".green().bold()
    } else {
        message.sender_id.as_str().cyan().bold()
    };
    let edited = if message.is_edited {
        format!(" {}", "(edited)".yellow())
    } else {
        String::new()
    };
    format!(
        "{} [{}] {}: {}{}",
        time,
        message.id.dimmed(),
        author,
        message.content,
        edited
    )
}

/// Print the full history of the active conversation
fn print_history(session: &ChatSession) {
    if session.messages().is_empty() {
        println!("{}", "No messages yet. Start the conversation!".dimmed());
        return;
    }
    for message in session.messages() {
        println!("{}", format_message(message, session.current_user_id()));
    }
}

/// Slash-commands accepted inside the chat loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Users,
    Select(String),
    Refresh,
    Edit { message_id: String, content: String },
    Delete(String),
    Unread,
    Status,
    Help,
    Exit,
    /// Not a slash-command: send as a message
    None,
    /// A slash-command with missing/extra arguments
    Invalid(String),
}

/// Parse a line from the chat loop
///
/// Anything not starting with `/` is a message to send.
pub fn parse_shell_command(line: &str) -> ShellCommand {
    let trimmed = line.trim();
    if !trimmed.starts_with('/') {
        return ShellCommand::None;
    }

    let mut parts = trimmed.splitn(3, char::is_whitespace);
    let command = parts.next().unwrap_or_default();
    match command {
        "/users" => ShellCommand::Users,
        "/select" => match parts.next() {
            Some(id) if !id.is_empty() => ShellCommand::Select(id.to_string()),
            _ => ShellCommand::Invalid("usage: /select <user-id>".to_string()),
        },
        "/refresh" => ShellCommand::Refresh,
        "/edit" => match (parts.next(), parts.next()) {
            (Some(id), Some(content)) if !content.trim().is_empty() => ShellCommand::Edit {
                message_id: id.to_string(),
                content: content.trim().to_string(),
            },
            _ => ShellCommand::Invalid("usage: /edit <message-id> <new text>".to_string()),
        },
        "/delete" => match parts.next() {
            Some(id) if !id.is_empty() => ShellCommand::Delete(id.to_string()),
            _ => ShellCommand::Invalid("usage: /delete <message-id>".to_string()),
        },
        "/unread" => ShellCommand::Unread,
        "/status" => ShellCommand::Status,
        "/help" => ShellCommand::Help,
        "/quit" | "/exit" => ShellCommand::Exit,
        other => ShellCommand::Invalid(format!("unknown command: {}", other)),
    }
}

fn print_help() {
    println!("Commands:");
    println!("  /users                      list correspondents");
    println!("  /select <user-id>           open a conversation");
    println!("  /refresh                    reload the conversation");
    println!("  /edit <message-id> <text>   edit one of your messages");
    println!("  /delete <message-id>        delete one of your messages");
    println!("  /unread                     show unread incoming messages");
    println!("  /status                     show session status");
    println!("  /help                       this help");
    println!("  /quit                       leave");
    println!();
    println!("Anything else is sent as a message.");
}

/// Print the candidate table shared by `/users` and the `users` command
async fn print_candidates(session: &mut ChatSession) -> Result<()> {
    use prettytable::{row, Table};

    let candidates = session.list_candidates().await?;
    if candidates.is_empty() {
        println!("No other users found.");
        return Ok(());
    }

    let mut table = Table::new();
    table.add_row(row!["ID", "NAME"]);
    for user in &candidates {
        table.add_row(row![user.id, user.display_name]);
    }
    table.printstd();
    Ok(())
}

fn print_unread(messages: &[Message]) {
    if messages.is_empty() {
        println!("No unread messages.");
        return;
    }
    println!("{} unread:", messages.len());
    for message in messages {
        println!(
            "  {} {}: {}",
            message.sent_at.format("%Y-%m-%d %H:%M").to_string().dimmed(),
            message.sender_id.cyan(),
            message.content
        );
    }
}

// Interactive chat handler
pub mod chat {
    //! Interactive chat session handler.
    //!
    //! Creates a session over the HTTP transport and runs a
    //! readline-based loop: plain lines are sent as messages,
    //! slash-commands drive selection, editing, and deletion.

    use super::*;
    use crate::session::SessionPhase;
    use rustyline::error::ReadlineError;
    use rustyline::DefaultEditor;

    /// Run the interactive chat loop
    pub async fn run_chat(config: Config, with: Option<String>) -> Result<()> {
        let mut session = make_session(&config)?;

        println!(
            "Signed in as {}. Type /help for commands.",
            session.current_user_id().green().bold()
        );

        if let Some(correspondent) = with {
            open_conversation(&mut session, &correspondent).await;
        } else {
            print_candidates(&mut session).await.ok();
            println!("Use /select <user-id> to start chatting.");
        }

        let mut rl = DefaultEditor::new()?;
        loop {
            let prompt = match session.correspondent() {
                Some(correspondent) => format!("{} > ", correspondent),
                None => "(no chat) > ".to_string(),
            };

            match rl.readline(&prompt) {
                Ok(line) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    rl.add_history_entry(trimmed)?;

                    match parse_shell_command(trimmed) {
                        ShellCommand::Users => {
                            if let Err(e) = print_candidates(&mut session).await {
                                print_error(&e);
                            }
                        }
                        ShellCommand::Select(user_id) => {
                            open_conversation(&mut session, &user_id).await;
                        }
                        ShellCommand::Refresh => match session.refresh().await {
                            Ok(()) => print_history(&session),
                            Err(e) => print_error(&e),
                        },
                        ShellCommand::Edit {
                            message_id,
                            content,
                        } => match session.edit_message(&message_id, &content).await {
                            Ok(updated) => println!(
                                "{}",
                                format_message(&updated, session.current_user_id())
                            ),
                            Err(e) => print_error(&e),
                        },
                        ShellCommand::Delete(message_id) => {
                            match session.delete_message(&message_id).await {
                                Ok(()) => println!("Deleted {}", message_id),
                                Err(e) => print_error(&e),
                            }
                        }
                        ShellCommand::Unread => match session.unread_messages().await {
                            Ok(messages) => print_unread(&messages),
                            Err(e) => print_error(&e),
                        },
                        ShellCommand::Status => print_status(&session),
                        ShellCommand::Help => print_help(),
                        ShellCommand::Exit => break,
                        ShellCommand::Invalid(usage) => println!("{}", usage.yellow()),
                        ShellCommand::None => match session.send_message(trimmed).await {
                            Ok(sent) => {
                                println!(
                                    "{}",
                                    format_message(&sent, session.current_user_id())
                                )
                            }
                            Err(e) => print_error(&e),
                        },
                    }
                }
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
                Err(e) => {
                    print_error(&e.into());
                    break;
                }
            }
        }

        println!("Bye.");
        Ok(())
    }

    /// Select a correspondent, load history, and render it
    ///
    /// Failures are printed, not returned: the loop keeps running and
    /// the user can retry (`/select` again or `/refresh`).
    async fn open_conversation(session: &mut ChatSession, correspondent: &str) {
        let request = match session.select_correspondent(correspondent) {
            Ok(request) => request,
            Err(e) => {
                print_error(&e);
                return;
            }
        };
        match session.load_history(&request).await {
            Ok(()) => {
                print_history(session);
                // Everything on screen counts as read.
                if let Err(e) = session.mark_displayed().await {
                    tracing::debug!("mark_displayed failed: {}", e);
                }
            }
            Err(e) => print_error(&e),
        }
    }

    fn print_status(session: &ChatSession) {
        let phase = match session.phase() {
            SessionPhase::Idle => "idle",
            SessionPhase::CorrespondentSelected => "correspondent selected",
            SessionPhase::HistoryLoading => "loading history",
            SessionPhase::HistoryReady => "ready",
            SessionPhase::Failed => "failed",
        };
        println!("User:          {}", session.current_user_id());
        println!(
            "Correspondent: {}",
            session.correspondent().unwrap_or("(none)")
        );
        println!(
            "Conversation:  {}",
            session
                .active_conversation()
                .map(|c| c.id.as_str())
                .unwrap_or("(none)")
        );
        println!("Messages:      {}", session.messages().len());
        println!("Phase:         {}", phase);
        if let Some(error) = session.last_error() {
            println!("Last error:    {}", error.to_string().red());
        }
    }

    fn print_error(error: &anyhow::Error) {
        eprintln!("{}", error.to_string().red());
    }
}

// User directory listing handler
pub mod users {
    //! One-shot candidate listing.

    use super::*;

    pub async fn run_users(config: Config) -> Result<()> {
        let mut session = make_session(&config)?;
        print_candidates(&mut session).await
    }
}

// Unread messages handler
pub mod unread {
    //! One-shot unread-messages listing.

    use super::*;

    pub async fn run_unread(config: Config) -> Result<()> {
        let mut session = make_session(&config)?;
        let messages = session.unread_messages().await?;
        print_unread(&messages);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_parse_plain_line_is_message() {
        assert_eq!(parse_shell_command("hello there"), ShellCommand::None);
    }

    #[test]
    fn test_parse_select() {
        assert_eq!(
            parse_shell_command("/select u2"),
            ShellCommand::Select("u2".to_string())
        );
        assert!(matches!(
            parse_shell_command("/select"),
            ShellCommand::Invalid(_)
        ));
    }

    #[test]
    fn test_parse_edit_keeps_spaces_in_content() {
        assert_eq!(
            parse_shell_command("/edit msg-1 new text here"),
            ShellCommand::Edit {
                message_id: "msg-1".to_string(),
                content: "new text here".to_string(),
            }
        );
        assert!(matches!(
            parse_shell_command("/edit msg-1"),
            ShellCommand::Invalid(_)
        ));
    }

    #[test]
    fn test_parse_delete_and_exit() {
        assert_eq!(
            parse_shell_command("/delete msg-2"),
            ShellCommand::Delete("msg-2".to_string())
        );
        assert_eq!(parse_shell_command("/quit"), ShellCommand::Exit);
        assert_eq!(parse_shell_command("/exit"), ShellCommand::Exit);
    }

    #[test]
    fn test_parse_unknown_command() {
        assert!(matches!(
            parse_shell_command("/frobnicate"),
            ShellCommand::Invalid(_)
        ));
    }

    #[test]
    fn test_format_message_marks_edits() {
        colored::control::set_override(false);
        let message = Message {
            id: "msg-1".to_string(),
            conversation_id: "conv-1".to_string(),
            sender_id: "u1".to_string(),
            recipient_id: "u2".to_string(),
            content: "hello".to_string(),
            sent_at: Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap(),
            is_edited: true,
            read_at: None,
        };
        let line = format_message(&message, "u1");
        assert!(line.contains("you"));
        assert!(line.contains("hello"));
        assert!(line.contains("(edited)"));
        colored::control::unset_override();
    }
}
