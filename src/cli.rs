//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use std::path::PathBuf;

/// Tipsheet - multi-agent data analysis for newsrooms
///
/// Point it at a dataset and a dataset description; an analyst agent
/// (optionally challenged by reporter and editor agents) investigates
/// the data question by question and compiles a ranked tipsheet of
/// newsworthy findings.
///
/// Examples:
///   tipsheet --project permits --dataset data/permits.csv --description data/permits.md
///   tipsheet --project permits --dataset data/permits.csv --description data/permits.md --no-editor
///   tipsheet --project permits --dataset data/permits.csv --description data/permits.md --questions 5
///   tipsheet --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Project identifier
    ///
    /// Names the run directory (outputs/<project>-<roles>) and the
    /// project-scoped assistants on the backend.
    #[arg(short, long, value_name = "ID", required_unless_present = "init_config")]
    pub project: Option<String>,

    /// Path to the tabular dataset the analyst executes code against
    #[arg(short, long, value_name = "FILE", required_unless_present = "init_config")]
    pub dataset: Option<PathBuf>,

    /// Path to the dataset description text
    ///
    /// Prepended to prompts so freshly created (or reset) agents know
    /// what the dataset contains.
    #[arg(long, value_name = "FILE", required_unless_present = "init_config")]
    pub description: Option<PathBuf>,

    /// Number of questions to brainstorm and process
    #[arg(short = 'n', long, value_name = "COUNT")]
    pub questions: Option<usize>,

    /// Number of bullets requested for the final tipsheet
    #[arg(short, long, value_name = "COUNT")]
    pub bullets: Option<usize>,

    /// Maximum revise rounds per question in the feedback loop
    #[arg(long, value_name = "COUNT")]
    pub max_feedback: Option<usize>,

    /// Disable the editor role (no plan critique, no post-hoc revision)
    #[arg(long)]
    pub no_editor: bool,

    /// Disable the reporter role (single execution pass per question)
    #[arg(long)]
    pub no_reporter: bool,

    /// Keep agent sessions across questions instead of resetting them
    #[arg(long)]
    pub no_reset: bool,

    /// Model to create assistants with
    #[arg(short, long, env = "TIPSHEET_MODEL", value_name = "MODEL")]
    pub model: Option<String>,

    /// Backend API key
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true, value_name = "KEY")]
    pub api_key: Option<String>,

    /// Backend API base URL
    #[arg(long, value_name = "URL")]
    pub api_url: Option<String>,

    /// Deadline for one agent round-trip in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Directory of .txt reference documents for the editor
    #[arg(long, value_name = "DIR")]
    pub editor_docs: Option<PathBuf>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .tipsheet.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .tipsheet.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if self.api_key.as_deref().unwrap_or("").is_empty() {
            return Err(
                "Backend API key is required (set OPENAI_API_KEY or pass --api-key)".to_string(),
            );
        }

        if let Some(ref dataset) = self.dataset {
            if !dataset.is_file() {
                return Err(format!("Dataset file does not exist: {}", dataset.display()));
            }
        }

        if let Some(ref description) = self.description {
            if !description.is_file() {
                return Err(format!(
                    "Dataset description file does not exist: {}",
                    description.display()
                ));
            }
        }

        if let Some(ref api_url) = self.api_url {
            if !api_url.starts_with("http://") && !api_url.starts_with("https://") {
                return Err("API URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if self.questions == Some(0) {
            return Err("Question count must be at least 1".to_string());
        }

        if self.bullets == Some(0) {
            return Err("Bullet count must be at least 1".to_string());
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args() -> Args {
        Args {
            project: Some("permits".to_string()),
            dataset: None,
            description: None,
            questions: None,
            bullets: None,
            max_feedback: None,
            no_editor: false,
            no_reporter: false,
            no_reset: false,
            model: None,
            api_key: Some("sk-test".to_string()),
            api_url: None,
            timeout: None,
            editor_docs: None,
            config: None,
            verbose: false,
            quiet: false,
            init_config: false,
        }
    }

    #[test]
    fn test_validation_requires_api_key() {
        let mut args = make_args();
        args.api_key = None;
        assert!(args.validate().is_err());

        args.init_config = true;
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_zero_counts() {
        let mut args = make_args();
        args.questions = Some(0);
        assert!(args.validate().is_err());

        let mut args = make_args();
        args.bullets = Some(0);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_invalid_api_url() {
        let mut args = make_args();
        args.api_url = Some("localhost:8080".to_string());
        assert!(args.validate().is_err());

        args.api_url = Some("https://api.example.com/v1".to_string());
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }
}
