//! Backend collaborator for conversational agents.
//!
//! The pipeline talks to an assistants-style backend through the
//! [`AssistantBackend`] trait: named assistants carrying either a
//! code-execution or a document-search tool binding, persistent
//! threads, and asynchronous runs that the agent layer polls to
//! completion. The production implementation is the HTTP client in
//! [`openai`]; tests script responses through a mock.

mod openai;

pub use openai::{OpenAiBackend, OpenAiConfig};

#[cfg(test)]
pub mod mock;

use async_trait::async_trait;
use serde_json::Value;
use std::path::Path;
use thiserror::Error;

/// Errors from the backend collaborator.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("backend API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("file I/O: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed backend payload: {0}")]
    Payload(String),

    #[error("run {run_id} ended in state {status}")]
    RunFailed { run_id: String, status: String },
}

impl BackendError {
    /// Whether retrying the same request can reasonably succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            BackendError::Transport(e) => e.is_timeout() || e.is_connect(),
            BackendError::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// Tool binding given to an assistant at creation time.
///
/// Exactly one binding mode per role: code execution over a single
/// tabular dataset, or document search over a set of reference
/// documents.
#[derive(Debug, Clone)]
pub enum Binding {
    CodeExecution { file_id: String },
    DocumentSearch { vector_store_id: String },
}

/// Parameters for creating a named assistant.
#[derive(Debug, Clone)]
pub struct AssistantSpec {
    pub name: String,
    pub instructions: String,
    pub model: String,
    pub binding: Binding,
}

/// Lifecycle status of an asynchronous run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStatus {
    Queued,
    InProgress,
    Completed,
    /// Any terminal non-success state (failed, cancelled, expired, ...).
    Failed(String),
}

impl RunStatus {
    pub fn parse(status: &str) -> Self {
        match status {
            "queued" => RunStatus::Queued,
            "in_progress" => RunStatus::InProgress,
            "completed" => RunStatus::Completed,
            other => RunStatus::Failed(other.to_string()),
        }
    }
}

/// One content segment of a thread message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentPart {
    Text(String),
    /// Non-text segment (image, file, ...), kept only for its type tag.
    Other(String),
}

/// One message on a thread, newest first in listings.
#[derive(Debug, Clone)]
pub struct ThreadMessage {
    pub role: String,
    pub content: Vec<ContentPart>,
}

/// Messages produced by one run plus the raw payload for trace logging.
#[derive(Debug, Clone)]
pub struct RunMessages {
    pub messages: Vec<ThreadMessage>,
    pub raw: Value,
}

/// The backend's single collaboration surface.
///
/// Session (thread) creation, assistant lookup, and run bookkeeping are
/// backend responsibilities; polling cadence and deadlines belong to
/// the agent layer.
#[async_trait]
pub trait AssistantBackend: Send + Sync {
    /// Look up an assistant by its project-scoped name.
    async fn find_assistant(&self, name: &str) -> Result<Option<String>, BackendError>;

    /// Create an assistant, returning its id.
    async fn create_assistant(&self, spec: &AssistantSpec) -> Result<String, BackendError>;

    /// Upload a file, reusing an already-uploaded file with the same
    /// name. Returns the file id.
    async fn ensure_file(&self, path: &Path) -> Result<String, BackendError>;

    /// Create a vector store over the given files for document search.
    async fn create_vector_store(
        &self,
        name: &str,
        file_ids: &[String],
    ) -> Result<String, BackendError>;

    /// Create a fresh conversation thread.
    async fn create_thread(&self) -> Result<String, BackendError>;

    /// Append a user message to a thread.
    async fn add_message(&self, thread_id: &str, text: &str) -> Result<(), BackendError>;

    /// Start a run of the assistant over the thread, returning the run id.
    async fn create_run(&self, thread_id: &str, assistant_id: &str)
        -> Result<String, BackendError>;

    async fn run_status(&self, thread_id: &str, run_id: &str) -> Result<RunStatus, BackendError>;

    /// Messages the run produced, newest first.
    async fn run_messages(&self, thread_id: &str, run_id: &str)
        -> Result<RunMessages, BackendError>;

    /// Raw step trace of the run, for durable logging.
    async fn run_steps(&self, thread_id: &str, run_id: &str) -> Result<Value, BackendError>;
}
