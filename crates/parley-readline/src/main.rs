use std::borrow::Cow::{self, Borrowed, Owned};
use std::sync::Arc;

use anyhow::{Context as AnyhowContext, Result};
use colored::Colorize;
use rustyline::Editor;
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Helper};
use tokio::sync::Mutex;

use parley_core::session::{Role, SessionStore};
use parley_core::settings::{PromptMode, SettingsState, Theme};
use parley_core::turn::{TurnController, TurnOutcome};
use parley_infrastructure::{JsonSessionRepository, JsonSettingsRepository};
use parley_interaction::GeminiApiAgent;

/// CLI helper for rustyline that provides completion, highlighting, and hints.
#[derive(Clone)]
struct CliHelper {
    commands: Vec<String>,
}

impl CliHelper {
    fn new() -> Self {
        Self {
            commands: vec![
                "/new".to_string(),
                "/sessions".to_string(),
                "/switch".to_string(),
                "/delete".to_string(),
                "/mode".to_string(),
                "/theme".to_string(),
                "/help".to_string(),
            ],
        }
    }
}

impl Helper for CliHelper {}

impl Completer for CliHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line = &line[..pos];

        if line.starts_with('/') {
            let candidates: Vec<Pair> = self
                .commands
                .iter()
                .filter(|cmd| cmd.starts_with(line))
                .map(|cmd| Pair {
                    display: cmd.clone(),
                    replacement: cmd.clone(),
                })
                .collect();
            Ok((0, candidates))
        } else {
            Ok((0, vec![]))
        }
    }
}

impl Highlighter for CliHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if line.starts_with('/') {
            Owned(line.bright_cyan().to_string())
        } else {
            Borrowed(line)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Hinter for CliHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        let line = &line[..pos];

        if line.starts_with('/') && !line.contains(' ') {
            self.commands
                .iter()
                .find(|cmd| cmd.starts_with(line) && cmd.len() > line.len())
                .map(|cmd| cmd[line.len()..].to_string())
        } else {
            None
        }
    }
}

impl Validator for CliHelper {}

fn mode_label(mode: PromptMode) -> &'static str {
    match mode {
        PromptMode::Technical => "technical",
        PromptMode::General => "general",
    }
}

fn theme_label(theme: Theme) -> &'static str {
    match theme {
        Theme::Light => "light",
        Theme::Dark => "dark",
    }
}

async fn print_session_list(store: &Arc<Mutex<SessionStore>>) {
    let store = store.lock().await;
    if store.sessions().is_empty() {
        println!("{}", "No sessions yet. Just type to start one.".bright_black());
        return;
    }
    let selected = store.selected_id().map(str::to_string);
    for (index, session) in store.sessions().iter().enumerate() {
        let marker = if selected.as_deref() == Some(session.id.as_str()) {
            "*"
        } else {
            " "
        };
        println!(
            "{} {:>2}. {} {}",
            marker,
            index + 1,
            session.title,
            format!("({} messages)", session.messages.len()).bright_black()
        );
    }
}

/// Resolves a 1-based index argument to a session id.
async fn session_id_at(store: &Arc<Mutex<SessionStore>>, arg: Option<&str>) -> Option<String> {
    let index: usize = arg?.parse().ok()?;
    let store = store.lock().await;
    store
        .sessions()
        .get(index.checked_sub(1)?)
        .map(|s| s.id.clone())
}

async fn print_latest_reply(store: &Arc<Mutex<SessionStore>>, session_id: &str) {
    let store = store.lock().await;
    let Some(session) = store.session(session_id) else {
        // Deleted while the turn was in flight; nothing to show.
        return;
    };
    let Some(reply) = session
        .messages
        .iter()
        .rev()
        .find(|m| m.role == Role::Assistant)
    else {
        return;
    };

    for line in reply.content.lines() {
        println!("{}", line.bright_blue());
    }
    if let Some(sources) = reply.sources.as_ref().filter(|s| !s.is_empty()) {
        println!("{}", "Sources:".bright_black());
        for source in sources {
            println!("{}", format!("  {} <{}>", source.title, source.uri).bright_black());
        }
    }
    println!();
}

fn print_help() {
    println!("{}", "/new       start a new conversation".bright_black());
    println!("{}", "/sessions  list conversations".bright_black());
    println!("{}", "/switch N  switch to conversation N".bright_black());
    println!("{}", "/delete N  delete conversation N".bright_black());
    println!("{}", "/mode      toggle technical/general mode".bright_black());
    println!("{}", "/theme     toggle light/dark theme".bright_black());
    println!("{}", "quit       exit".bright_black());
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "parley=info".to_string()))
        .init();

    // ===== Backend Initialization =====
    let session_repository = Arc::new(
        JsonSessionRepository::default_location().context("resolving session storage")?,
    );
    let settings_repository = Arc::new(
        JsonSettingsRepository::default_location().context("resolving settings storage")?,
    );

    let store = Arc::new(Mutex::new(
        SessionStore::load(session_repository)
            .await
            .context("loading sessions")?,
    ));
    let mut settings = SettingsState::load(settings_repository)
        .await
        .context("loading settings")?;

    let agent = GeminiApiAgent::try_from_env().context("loading Gemini credentials")?;
    let controller = TurnController::new(store.clone(), agent);

    // ===== REPL Setup =====
    let helper = CliHelper::new();
    let mut rl = Editor::new()?;
    rl.set_helper(Some(helper));

    println!("{}", "=== Parley ===".bright_magenta().bold());
    println!(
        "{}",
        format!(
            "Mode: {}. Type a message, '/help' for commands, or 'quit' to exit.",
            mode_label(settings.settings().mode)
        )
        .bright_black()
    );
    println!();

    // ===== Main REPL Loop =====
    loop {
        let readline = rl.readline(">> ");

        match readline {
            Ok(line) => {
                let trimmed = line.trim();

                if trimmed == "quit" || trimmed == "exit" {
                    println!("{}", "Goodbye!".bright_green());
                    break;
                }
                if trimmed.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(&line);

                let mut words = trimmed.split_whitespace();
                let command = words.next().unwrap_or_default();
                let arg = words.next();

                match command {
                    "/help" => print_help(),
                    "/new" => {
                        let mut store = store.lock().await;
                        match store.create_session().await {
                            Ok(_) => println!("{}", "Started a new conversation.".green()),
                            Err(e) => eprintln!("{}", e.user_message().red()),
                        }
                    }
                    "/sessions" => print_session_list(&store).await,
                    "/switch" => match session_id_at(&store, arg).await {
                        Some(id) => {
                            let mut store = store.lock().await;
                            store.select_session(&id);
                            let title = store
                                .session(&id)
                                .map(|s| s.title.clone())
                                .unwrap_or_default();
                            println!("{}", format!("Switched to: {}", title).green());
                        }
                        None => eprintln!("{}", "Usage: /switch <number>".yellow()),
                    },
                    "/delete" => match session_id_at(&store, arg).await {
                        Some(id) => {
                            let mut store = store.lock().await;
                            match store.delete_session(&id).await {
                                Ok(()) => println!("{}", "Conversation deleted.".green()),
                                Err(e) => eprintln!("{}", e.user_message().red()),
                            }
                        }
                        None => eprintln!("{}", "Usage: /delete <number>".yellow()),
                    },
                    "/mode" => match settings.toggle_mode().await {
                        Ok(mode) => {
                            println!("{}", format!("Mode: {}", mode_label(mode)).green())
                        }
                        Err(e) => eprintln!("{}", e.user_message().red()),
                    },
                    "/theme" => match settings.toggle_theme().await {
                        Ok(theme) => {
                            println!("{}", format!("Theme: {}", theme_label(theme)).green())
                        }
                        Err(e) => eprintln!("{}", e.user_message().red()),
                    },
                    _ if command.starts_with('/') => {
                        eprintln!("{}", "Unknown command, try /help".yellow())
                    }
                    _ => {
                        // A plain message: submit a turn against the selected
                        // (or a fresh) session.
                        match controller.submit_turn(trimmed, settings.settings()).await {
                            Ok(TurnOutcome::Completed { session_id }) => {
                                print_latest_reply(&store, &session_id).await;
                            }
                            Ok(TurnOutcome::Skipped) => {}
                            Err(e) => {
                                eprintln!("{}", e.user_message().red());
                            }
                        }
                    }
                }
            }
            Err(rustyline::error::ReadlineError::Interrupted) => {
                println!("{}", "CTRL-C detected. Type 'quit' to exit.".yellow());
            }
            Err(rustyline::error::ReadlineError::Eof) => {
                println!("{}", "CTRL-D detected. Exiting...".bright_green());
                break;
            }
            Err(err) => {
                eprintln!("{}", format!("Error: {:?}", err).red());
                break;
            }
        }
    }

    Ok(())
}
