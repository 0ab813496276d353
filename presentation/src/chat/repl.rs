//! REPL (Read-Eval-Print Loop) for interactive sessions

use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::{DefaultEditor, Result as RlResult};
use std::path::PathBuf;
use std::sync::Arc;
use tether_application::SessionEngine;
use tether_application::turn::TurnFault;

/// Interactive session REPL
pub struct ChatRepl {
    engine: Arc<SessionEngine>,
    history_file: Option<PathBuf>,
}

impl ChatRepl {
    /// Create a new ChatRepl over a running engine
    pub fn new(engine: Arc<SessionEngine>) -> Self {
        Self {
            engine,
            history_file: dirs::data_dir().map(|p| p.join("tether").join("history.txt")),
        }
    }

    /// Override the readline history file (None disables it)
    pub fn with_history_file(mut self, path: Option<PathBuf>) -> Self {
        self.history_file = path;
        self
    }

    /// Run the interactive REPL until the user quits or input ends
    pub async fn run(&self) -> RlResult<()> {
        let mut rl = DefaultEditor::new()?;

        if let Some(ref path) = self.history_file {
            if let Some(parent) = path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            let _ = rl.load_history(path);
        }

        self.print_welcome();

        loop {
            let readline = rl.readline(">>> ");

            match readline {
                Ok(line) => {
                    let line = line.trim();

                    // Skip empty lines
                    if line.is_empty() {
                        continue;
                    }

                    // Handle commands
                    if line.starts_with('/') {
                        if self.handle_command(line) {
                            break;
                        }
                        continue;
                    }

                    // Add to history
                    let _ = rl.add_history_entry(line);

                    self.process_prompt(line).await;

                    if self.engine.shutdown_advised() {
                        eprintln!(
                            "{}",
                            "The agent connection keeps failing; /quit to end the session."
                                .yellow()
                        );
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!("Bye!");
                    break;
                }
                Err(err) => {
                    eprintln!("Error: {:?}", err);
                    break;
                }
            }
        }

        // Save history
        if let Some(ref path) = self.history_file {
            let _ = rl.save_history(path);
        }

        Ok(())
    }

    /// Submit one prompt and wait for the turn, honoring Ctrl-C.
    async fn process_prompt(&self, prompt: &str) {
        if let Some(stale) = self.engine.submit(prompt).await {
            // A turn that failed while nobody was waiting
            eprintln!("{} {}", "Previous turn:".red().bold(), stale);
        }

        tokio::select! {
            fault = self.engine.wait_turn() => {
                if let Some(fault) = fault {
                    eprintln!("{} {}", "Error:".red().bold(), fault);
                }
            }
            _ = tokio::signal::ctrl_c() => {
                println!("^C");
                self.engine.interrupt().await;
                if let Some(TurnFault::Cancelled) = self.engine.wait_turn().await {
                    println!("{}", "(turn cancelled)".dimmed());
                }
            }
        }
        println!();
    }

    fn print_welcome(&self) {
        println!();
        println!("╭─────────────────────────────────────────────╮");
        println!("│           Tether - Interactive Mode         │");
        println!("╰─────────────────────────────────────────────╯");
        println!();
        println!("Commands:");
        println!("  /help     - Show this help");
        println!("  /stats    - Show session statistics");
        println!("  /quit     - Exit");
        println!();
    }

    /// Handle slash commands. Returns true if should exit.
    fn handle_command(&self, cmd: &str) -> bool {
        match cmd {
            "/quit" | "/exit" | "/q" => {
                println!("Bye!");
                true
            }
            "/help" | "/h" | "/?" => {
                println!();
                println!("Commands:");
                println!("  /help, /h, /?    - Show this help");
                println!("  /stats           - Show session statistics");
                println!("  /quit, /exit, /q - Exit");
                println!();
                false
            }
            "/stats" => {
                let stats = self.engine.stats();
                println!();
                match self.engine.session_id() {
                    Some(id) => println!("Session: {}", id),
                    None => println!("Session: (not yet assigned)"),
                }
                println!("Turns:   {}", stats.turns);
                println!(
                    "Tokens:  {} in / {} out",
                    stats.input_tokens, stats.output_tokens
                );
                println!("Cost:    ${:.4}", stats.cost_usd);
                println!(
                    "Time:    {:.1}s total",
                    stats.total_duration_ms as f64 / 1000.0
                );
                println!();
                false
            }
            _ => {
                println!("Unknown command: {}", cmd);
                println!("Type /help for available commands");
                false
            }
        }
    }
}
