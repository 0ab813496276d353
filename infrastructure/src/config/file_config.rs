//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file and
//! are deserialized directly.

use std::time::Duration;
use serde::{Deserialize, Serialize};
use tether_application::EngineOptions;
use thiserror::Error;

/// Configuration validation errors
#[derive(Debug, Error)]
pub enum ConfigValidationError {
    #[error("agent command cannot be empty")]
    EmptyAgentCommand,

    #[error("shutdown_grace_seconds cannot be 0")]
    InvalidShutdownGrace,
}

/// Raw agent subprocess configuration from TOML
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileAgentConfig {
    /// Program to spawn for the agent service
    pub command: String,
    /// Arguments passed to the program
    pub args: Vec<String>,
}

impl Default for FileAgentConfig {
    fn default() -> Self {
        Self {
            command: "agent".to_string(),
            args: vec!["--stdio".to_string()],
        }
    }
}

/// Raw session tuning configuration from TOML
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileSessionConfig {
    /// Per-turn deadline in seconds; absent disables the deadline
    pub turn_deadline_seconds: Option<u64>,
    /// Grace period for cancellation and shutdown steps
    pub shutdown_grace_seconds: u64,
    /// Consecutive transport faults before ending the session is advised
    pub transport_error_threshold: u32,
}

impl Default for FileSessionConfig {
    fn default() -> Self {
        Self {
            turn_deadline_seconds: None,
            shutdown_grace_seconds: 2,
            transport_error_threshold: 3,
        }
    }
}

/// Raw REPL configuration from TOML
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileReplConfig {
    /// Enable colored terminal output
    pub color: bool,
    /// Path to the readline history file
    pub history_file: Option<String>,
}

impl Default for FileReplConfig {
    fn default() -> Self {
        Self {
            color: true,
            history_file: None,
        }
    }
}

/// Raw session transcript configuration from TOML
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileHistoryConfig {
    /// Record session transcripts to JSONL files
    pub enabled: bool,
    /// Directory for transcript files; defaults to the platform data dir
    pub dir: Option<String>,
}

impl Default for FileHistoryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: None,
        }
    }
}

/// Complete raw configuration from TOML
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub agent: FileAgentConfig,
    pub session: FileSessionConfig,
    pub repl: FileReplConfig,
    pub history: FileHistoryConfig,
}

impl FileConfig {
    /// Validate cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.agent.command.trim().is_empty() {
            return Err(ConfigValidationError::EmptyAgentCommand);
        }
        if self.session.shutdown_grace_seconds == 0 {
            return Err(ConfigValidationError::InvalidShutdownGrace);
        }
        Ok(())
    }

    /// Engine tunables derived from the session section.
    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            turn_deadline: self
                .session
                .turn_deadline_seconds
                .map(Duration::from_secs),
            shutdown_grace: Duration::from_secs(self.session.shutdown_grace_seconds),
            transport_error_threshold: self.session.transport_error_threshold,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = FileConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.agent.command, "agent");
        assert!(config.history.enabled);
    }

    #[test]
    fn empty_agent_command_rejected() {
        let mut config = FileConfig::default();
        config.agent.command = "  ".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigValidationError::EmptyAgentCommand)
        ));
    }

    #[test]
    fn engine_options_derive_from_session_section() {
        let mut config = FileConfig::default();
        config.session.turn_deadline_seconds = Some(120);
        config.session.transport_error_threshold = 5;

        let options = config.engine_options();
        assert_eq!(options.turn_deadline, Some(Duration::from_secs(120)));
        assert_eq!(options.shutdown_grace, Duration::from_secs(2));
        assert_eq!(options.transport_error_threshold, 5);
    }

    #[test]
    fn partial_toml_merges_over_defaults() {
        let config: FileConfig = toml::from_str(
            r#"
            [agent]
            command = "my-agent"

            [session]
            turn_deadline_seconds = 60
            "#,
        )
        .unwrap();

        assert_eq!(config.agent.command, "my-agent");
        assert_eq!(config.agent.args, vec!["--stdio"]);
        assert_eq!(config.session.turn_deadline_seconds, Some(60));
        assert_eq!(config.session.transport_error_threshold, 3);
    }
}
