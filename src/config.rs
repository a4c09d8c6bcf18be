//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.tipsheet.toml` files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Backend settings.
    #[serde(default)]
    pub backend: BackendConfig,

    /// Pipeline settings.
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Root directory all run directories are created under.
    #[serde(default = "default_output_root")]
    pub output_root: String,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output_root: default_output_root(),
            verbose: false,
        }
    }
}

fn default_output_root() -> String {
    "outputs".to_string()
}

/// Assistants backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// API base URL.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model every assistant is created with.
    #[serde(default = "default_model")]
    pub model: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,

    /// Overall deadline for one agent round-trip in seconds.
    #[serde(default = "default_send_timeout")]
    pub send_timeout_seconds: u64,

    /// Interval between run-status polls in milliseconds.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    /// Retries after a transient backend failure.
    #[serde(default = "default_retries")]
    pub retries: usize,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            request_timeout_seconds: default_request_timeout(),
            send_timeout_seconds: default_send_timeout(),
            poll_interval_ms: default_poll_interval(),
            retries: default_retries(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4-turbo-preview".to_string()
}

fn default_request_timeout() -> u64 {
    120
}

fn default_send_timeout() -> u64 {
    600
}

fn default_poll_interval() -> u64 {
    100
}

fn default_retries() -> usize {
    3
}

/// Pipeline settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Questions to brainstorm and process.
    #[serde(default = "default_questions")]
    pub questions: usize,

    /// Bullets requested for the final tipsheet.
    #[serde(default = "default_bullets")]
    pub bullets: usize,

    /// Maximum revise rounds per question.
    #[serde(default = "default_max_feedback")]
    pub max_feedback: usize,

    /// Enable the editor role.
    #[serde(default = "default_true")]
    pub use_editor: bool,

    /// Enable the reporter role.
    #[serde(default = "default_true")]
    pub use_reporter: bool,

    /// Reset agent sessions between questions.
    #[serde(default = "default_true")]
    pub reset_agents: bool,

    /// Directory of .txt reference documents for the editor.
    #[serde(default = "default_editor_docs")]
    pub editor_docs: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            questions: default_questions(),
            bullets: default_bullets(),
            max_feedback: default_max_feedback(),
            use_editor: true,
            use_reporter: true,
            reset_agents: true,
            editor_docs: default_editor_docs(),
        }
    }
}

fn default_questions() -> usize {
    10
}

fn default_bullets() -> usize {
    10
}

fn default_max_feedback() -> usize {
    3
}

fn default_true() -> bool {
    true
}

fn default_editor_docs() -> String {
    "editor_docs".to_string()
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(".tipsheet.toml");

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// This method only overrides config when CLI provides explicit values.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref model) = args.model {
            self.backend.model = model.clone();
        }
        if let Some(ref api_url) = args.api_url {
            self.backend.base_url = api_url.clone();
        }
        if let Some(timeout) = args.timeout {
            self.backend.send_timeout_seconds = timeout;
        }

        if let Some(questions) = args.questions {
            self.pipeline.questions = questions;
        }
        if let Some(bullets) = args.bullets {
            self.pipeline.bullets = bullets;
        }
        if let Some(max_feedback) = args.max_feedback {
            self.pipeline.max_feedback = max_feedback;
        }
        if let Some(ref editor_docs) = args.editor_docs {
            self.pipeline.editor_docs = editor_docs.display().to_string();
        }

        // Disabling flags only ever switch a role off.
        if args.no_editor {
            self.pipeline.use_editor = false;
        }
        if args.no_reporter {
            self.pipeline.use_reporter = false;
        }
        if args.no_reset {
            self.pipeline.reset_agents = false;
        }

        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
