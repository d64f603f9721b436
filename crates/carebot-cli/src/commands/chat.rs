//! Interactive chat with one persona.

use std::borrow::Cow::{self, Borrowed, Owned};

use anyhow::Result;
use carebot_application::{AssistantSession, RejectReason, SessionFactory, SubmitOutcome};
use carebot_core::speech::SpeechCapabilities;
use colored::Colorize;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};

const COMMANDS: [&str; 5] = ["/new", "/speak", "/listen", "/help", "/quit"];

/// A line typed at the chat prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ReplCommand {
    Empty,
    NewConversation,
    Speak,
    Listen,
    Help,
    Quit,
    Unknown(String),
    Message(String),
}

impl ReplCommand {
    fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        match trimmed {
            "" => ReplCommand::Empty,
            "/new" => ReplCommand::NewConversation,
            "/speak" => ReplCommand::Speak,
            "/listen" => ReplCommand::Listen,
            "/help" => ReplCommand::Help,
            "/quit" | "/exit" | "quit" | "exit" => ReplCommand::Quit,
            cmd if cmd.starts_with('/') && !cmd.contains(' ') => {
                ReplCommand::Unknown(cmd.to_string())
            }
            text => ReplCommand::Message(text.to_string()),
        }
    }
}

/// Notice for a speech command this session cannot serve.
fn unavailable_notice(command: &ReplCommand, capabilities: SpeechCapabilities) -> Option<&'static str> {
    match command {
        ReplCommand::Speak if !capabilities.can_speak => Some("Text-to-speech is not available."),
        ReplCommand::Listen if !capabilities.can_listen => {
            Some("Speech recognition is not available.")
        }
        _ => None,
    }
}

/// rustyline helper: completes and highlights slash commands.
struct ChatHelper;

impl Helper for ChatHelper {}

impl Completer for ChatHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line = &line[..pos];
        if !line.starts_with('/') {
            return Ok((0, vec![]));
        }
        let candidates = COMMANDS
            .iter()
            .filter(|cmd| cmd.starts_with(line))
            .map(|cmd| Pair {
                display: cmd.to_string(),
                replacement: cmd.to_string(),
            })
            .collect();
        Ok((0, candidates))
    }
}

impl Highlighter for ChatHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if line.starts_with('/') {
            Owned(line.bright_cyan().to_string())
        } else {
            Borrowed(line)
        }
    }

    fn highlight_char(&self, line: &str, _pos: usize, _forced: bool) -> bool {
        line.starts_with('/')
    }
}

impl Hinter for ChatHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        let line = &line[..pos];
        if !line.starts_with('/') || line.contains(' ') {
            return None;
        }
        COMMANDS
            .iter()
            .find(|cmd| cmd.starts_with(line) && cmd.len() > line.len())
            .map(|cmd| cmd[line.len()..].to_string())
    }
}

impl Validator for ChatHelper {}

fn print_bot(session: &AssistantSession, text: &str) {
    println!("{}", format!("[{}]", session.persona().name).bright_magenta());
    for line in text.lines() {
        println!("{}", line.bright_blue());
    }
    println!();
}

fn print_help(session: &AssistantSession) {
    let capabilities = session.speech_capabilities();
    println!("{}", "Commands:".bright_black());
    println!("{}", "  /new     start a new conversation".bright_black());
    if capabilities.can_speak {
        println!("{}", "  /speak   read the last reply aloud (again to stop)".bright_black());
    }
    if capabilities.can_listen {
        println!("{}", "  /listen  dictate a message".bright_black());
    }
    println!("{}", "  /quit    leave".bright_black());
}

async fn send(session: &AssistantSession, text: &str) {
    println!("{}", "...".bright_black());
    match session.submit(text).await {
        SubmitOutcome::Answered(message) | SubmitOutcome::FellBack { message, .. } => {
            print_bot(session, message.text());
        }
        SubmitOutcome::Rejected(RejectReason::RequestPending) => {
            println!("{}", "Still waiting for the previous reply.".yellow());
        }
        SubmitOutcome::Rejected(RejectReason::EmptyInput) | SubmitOutcome::Discarded => {}
    }
}

/// Runs the chat REPL until the user quits.
pub async fn run(factory: &SessionFactory, persona_id: &str) -> Result<()> {
    let session = factory.create(persona_id)?;

    let mut rl: Editor<ChatHelper, DefaultHistory> = Editor::new()?;
    rl.set_helper(Some(ChatHelper));

    println!(
        "{}",
        format!("=== CareBot: {} ===", session.persona().name)
            .bright_magenta()
            .bold()
    );
    println!("{}", "Type /help for commands.".bright_black());
    println!();
    if let Some(greeting) = session.transcript().await.last() {
        print_bot(&session, greeting.text());
    }

    loop {
        match rl.readline(">> ") {
            Ok(line) => {
                let command = ReplCommand::parse(&line);
                if command != ReplCommand::Empty {
                    let _ = rl.add_history_entry(line.as_str());
                }
                if let Some(notice) = unavailable_notice(&command, session.speech_capabilities()) {
                    println!("{}", notice.yellow());
                    continue;
                }

                match command {
                    ReplCommand::Empty => continue,
                    ReplCommand::Quit => break,
                    ReplCommand::Help => print_help(&session),
                    ReplCommand::NewConversation => {
                        session.reset().await;
                        println!("{}", "--- new conversation ---".bright_black());
                        if let Some(greeting) = session.transcript().await.last() {
                            print_bot(&session, greeting.text());
                        }
                    }
                    ReplCommand::Speak => {
                        let transcript = session.transcript().await;
                        if let Some(reply) = transcript.iter().rev().find(|m| m.is_bot()) {
                            session.toggle_speech(reply.text());
                        }
                    }
                    ReplCommand::Listen => match session.dictate().await {
                        Some(text) => {
                            println!("{}", format!("> {text}").green());
                            send(&session, &text).await;
                        }
                        None => println!("{}", "Nothing was heard.".yellow()),
                    },
                    ReplCommand::Unknown(cmd) => {
                        println!("{}", format!("Unknown command: {cmd}").bright_black());
                    }
                    ReplCommand::Message(text) => send(&session, &text).await,
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("{}", "CTRL-C detected. Type /quit to exit.".yellow());
            }
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("{}", format!("Error: {err:?}").red());
                break;
            }
        }
    }

    // Silence any playback before exiting.
    let speech_state = session.speech_state();
    if let Some(text) = speech_state.speaking_text() {
        session.toggle_speech(text);
    }
    println!("{}", "Take care!".bright_green());
    Ok(())
}
