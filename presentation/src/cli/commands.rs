//! CLI command definitions

use clap::Parser;
use std::path::PathBuf;

/// CLI arguments for tether
#[derive(Parser, Debug)]
#[command(name = "tether")]
#[command(author, version, about = "Interactive session client for a streaming agent CLI")]
#[command(long_about = r#"
Tether conducts a conversation with an agent service over its CLI's stdio,
streaming responses, tool activity, and per-turn statistics to the terminal.

Configuration files are loaded from (in priority order):
1. --config <path>     Explicit config file
2. ./tether.toml       Project-level config
3. ~/.config/tether/config.toml   Global config

Example:
  tether "Summarize the open TODOs in this repo"
  tether --chat
  tether --agent-cmd "my-agent --stdio" --turn-deadline 120 --chat
"#)]
pub struct Cli {
    /// One-shot prompt to send (omit with --chat for interactive mode)
    pub prompt: Option<String>,

    /// Start interactive chat mode
    #[arg(short, long)]
    pub chat: bool,

    /// Agent command to spawn, overriding the config (e.g. "my-agent --stdio")
    #[arg(long, value_name = "CMD")]
    pub agent_cmd: Option<String>,

    /// Per-turn deadline in seconds, overriding the config
    #[arg(long, value_name = "SECONDS")]
    pub turn_deadline: Option<u64>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Disable the JSONL session transcript
    #[arg(long)]
    pub no_history: bool,
}
