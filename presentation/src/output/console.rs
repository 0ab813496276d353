//! Console renderer for session output
//!
//! Implements the [`Renderer`] port against stdout. Text fragments are
//! printed incrementally as they stream; everything else gets its own
//! line(s). All formatting decisions live here, behind pure functions the
//! tests can call directly.

use colored::Colorize;
use std::io::Write;
use tether_application::Renderer;
use tether_domain::RenderInstruction;

/// Longest tool result printed in full; anything longer is elided.
const TOOL_RESULT_PREVIEW_CHARS: usize = 400;

/// Renders session output to the terminal.
pub struct ConsoleRenderer;

impl ConsoleRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ConsoleRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for ConsoleRenderer {
    fn render(&self, instruction: RenderInstruction) {
        match instruction {
            RenderInstruction::TextFragment { text } => {
                print!("{}", text);
                // Streamed fragments rarely end in a newline
                let _ = std::io::stdout().flush();
            }
            RenderInstruction::ToolCall { name, order } => {
                println!("\n{}", format_tool_call(&name, order));
            }
            RenderInstruction::ToolResult {
                name,
                order,
                content,
                is_error,
            } => {
                println!("{}", format_tool_result(&name, order, &content, is_error));
            }
            RenderInstruction::TurnSummary {
                duration_ms,
                cost_usd,
                usage,
            } => {
                println!(
                    "\n{}",
                    format_turn_summary(
                        duration_ms,
                        cost_usd,
                        usage.input_tokens,
                        usage.output_tokens
                    )
                );
            }
            RenderInstruction::ErrorLine { message } => {
                eprintln!("{}", format_error_line(&message));
            }
        }
    }
}

/// `→ read (#1)`
pub fn format_tool_call(name: &str, order: u64) -> String {
    format!(
        "{} {} {}",
        "→".yellow().bold(),
        name.yellow().bold(),
        format!("(#{})", order + 1).dimmed()
    )
}

/// `← read (#1): <content>` — long content is elided, errors are red.
pub fn format_tool_result(name: &str, order: u64, content: &str, is_error: bool) -> String {
    let preview = elide(content, TOOL_RESULT_PREVIEW_CHARS);
    let arrow = if is_error {
        "←".red().bold()
    } else {
        "←".green().bold()
    };
    let body = if is_error {
        preview.red().to_string()
    } else {
        preview
    };
    format!(
        "{} {} {}: {}",
        arrow,
        name.bold(),
        format!("(#{})", order + 1).dimmed(),
        body
    )
}

/// One dimmed line of turn statistics.
pub fn format_turn_summary(
    duration_ms: u64,
    cost_usd: f64,
    input_tokens: u64,
    output_tokens: u64,
) -> String {
    format!(
        "{}",
        format!(
            "[{:.1}s · {} in / {} out · ${:.4}]",
            duration_ms as f64 / 1000.0,
            input_tokens,
            output_tokens,
            cost_usd
        )
        .dimmed()
    )
}

pub fn format_error_line(message: &str) -> String {
    format!("{} {}", "Error:".red().bold(), message)
}

fn elide(content: &str, limit: usize) -> String {
    if content.chars().count() <= limit {
        return content.to_string();
    }
    let cut: String = content.chars().take(limit).collect();
    format!("{}… ({} chars)", cut, content.chars().count())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_call_shows_one_based_position() {
        let line = format_tool_call("read_file", 0);
        assert!(line.contains("read_file"));
        assert!(line.contains("#1"));
    }

    #[test]
    fn tool_result_elides_long_content() {
        let long = "x".repeat(1000);
        let line = format_tool_result("grep", 2, &long, false);
        assert!(line.contains("#3"));
        assert!(line.contains("(1000 chars)"));
        assert!(line.len() < 700);
    }

    #[test]
    fn tool_result_keeps_short_content_intact() {
        let line = format_tool_result("grep", 0, "3 matches", false);
        assert!(line.contains("3 matches"));
        assert!(!line.contains("chars)"));
    }

    #[test]
    fn turn_summary_formats_seconds_and_cost() {
        let line = format_turn_summary(1234, 0.0056, 150, 80);
        assert!(line.contains("1.2s"));
        assert!(line.contains("150 in"));
        assert!(line.contains("80 out"));
        assert!(line.contains("$0.0056"));
    }

    #[test]
    fn elide_respects_char_boundaries() {
        // Multibyte input must not split a char
        let content = "é".repeat(500);
        let line = format_tool_result("read", 0, &content, false);
        assert!(line.contains("(500 chars)"));
    }
}
