//! Stateful proxy for one conversational role.
//!
//! An [`AgentHandle`] binds a role to a named backend assistant and one
//! persistent thread. Its single operation, [`AgentHandle::send`],
//! blocks until the backend finishes the asynchronous run: the wait
//! polls at a fixed short interval but always carries an explicit
//! deadline and honors a cancellation token. Every round-trip durably
//! logs the raw message and step traces before returning.

use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::backend::{
    AssistantBackend, AssistantSpec, BackendError, Binding, RunStatus, ThreadMessage,
};
use crate::models::Role;
use crate::store::ArtifactStore;

/// Errors from one agent round-trip.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("{role} run {run_id} exceeded the {timeout:?} deadline")]
    DeadlineExceeded {
        role: Role,
        run_id: String,
        timeout: Duration,
    },

    #[error("send cancelled")]
    Cancelled,

    #[error("failed to persist run trace: {0}")]
    Trace(anyhow::Error),
}

/// Per-handle settings.
#[derive(Debug, Clone)]
pub struct AgentOptions {
    /// Model every assistant of this run is created with.
    pub model: String,
    /// Fixed interval between run-status polls.
    pub poll_interval: Duration,
    /// Overall deadline for one `send` round-trip.
    pub send_timeout: Duration,
}

impl Default for AgentOptions {
    fn default() -> Self {
        Self {
            model: "gpt-4-turbo-preview".to_string(),
            poll_interval: Duration::from_millis(100),
            send_timeout: Duration::from_secs(600),
        }
    }
}

/// A bound conversational role with persistent session state.
pub struct AgentHandle {
    role: Role,
    assistant_id: String,
    thread_id: String,
    backend: Arc<dyn AssistantBackend>,
    store: Arc<dyn ArtifactStore>,
    options: AgentOptions,
    cancel: CancellationToken,
}

impl AgentHandle {
    /// Bind `role` to the assistant named `<role>-<project>`, creating
    /// it with the given tool binding when it does not exist yet, and
    /// open a fresh thread.
    pub async fn create(
        backend: Arc<dyn AssistantBackend>,
        store: Arc<dyn ArtifactStore>,
        role: Role,
        binding: Binding,
        project: &str,
        options: AgentOptions,
        cancel: CancellationToken,
    ) -> Result<Self, AgentError> {
        let name = format!("{}-{}", role, project);
        let assistant_id = match backend.find_assistant(&name).await? {
            Some(id) => {
                debug!("reusing assistant {} ({})", name, id);
                id
            }
            None => {
                info!("creating assistant {}", name);
                backend
                    .create_assistant(&AssistantSpec {
                        name,
                        instructions: role.instructions().to_string(),
                        model: options.model.clone(),
                        binding,
                    })
                    .await?
            }
        };
        let thread_id = backend.create_thread().await?;

        Ok(Self {
            role,
            assistant_id,
            thread_id,
            backend,
            store,
            options,
            cancel,
        })
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Replace the thread with a fresh one. Conversational history is
    /// discarded; the assistant, and with it the bound dataset or
    /// document context, stays.
    pub async fn reset(&mut self) -> Result<(), AgentError> {
        self.thread_id = self.backend.create_thread().await?;
        debug!("{} session reset to thread {}", self.role, self.thread_id);
        Ok(())
    }

    /// Send one message and block until the run completes.
    ///
    /// Returns the first text segment of the newest message the run
    /// produced, or the empty string when the run produced no text.
    pub async fn send(&self, text: &str) -> Result<String, AgentError> {
        debug!("{} <- {} chars", self.role, text.len());
        self.backend.add_message(&self.thread_id, text).await?;
        let run_id = self
            .backend
            .create_run(&self.thread_id, &self.assistant_id)
            .await?;

        self.wait_for_run(&run_id).await?;

        let messages = self.backend.run_messages(&self.thread_id, &run_id).await?;
        let steps = self.backend.run_steps(&self.thread_id, &run_id).await?;
        self.store
            .put_log(self.role.as_str(), &run_id, "messages.json", &messages.raw)
            .map_err(AgentError::Trace)?;
        self.store
            .put_log(self.role.as_str(), &run_id, "steps.json", &steps)
            .map_err(AgentError::Trace)?;

        let reply = first_text(&messages.messages);
        debug!("{} -> {} chars", self.role, reply.len());
        Ok(reply)
    }

    /// Poll the run at a fixed interval until it completes, fails, hits
    /// the deadline, or is cancelled.
    async fn wait_for_run(&self, run_id: &str) -> Result<(), AgentError> {
        let deadline = Instant::now() + self.options.send_timeout;
        loop {
            match self.backend.run_status(&self.thread_id, run_id).await? {
                RunStatus::Completed => return Ok(()),
                RunStatus::Failed(status) => {
                    return Err(BackendError::RunFailed {
                        run_id: run_id.to_string(),
                        status,
                    }
                    .into())
                }
                RunStatus::Queued | RunStatus::InProgress => {}
            }

            if Instant::now() >= deadline {
                return Err(AgentError::DeadlineExceeded {
                    role: self.role,
                    run_id: run_id.to_string(),
                    timeout: self.options.send_timeout,
                });
            }

            tokio::select! {
                _ = self.cancel.cancelled() => return Err(AgentError::Cancelled),
                _ = tokio::time::sleep(self.options.poll_interval) => {}
            }
        }
    }
}

/// First text segment of the newest message, empty string when absent.
fn first_text(messages: &[ThreadMessage]) -> String {
    messages
        .first()
        .and_then(|message| {
            message.content.iter().find_map(|part| match part {
                crate::backend::ContentPart::Text(t) => Some(t.clone()),
                crate::backend::ContentPart::Other(_) => None,
            })
        })
        .unwrap_or_default()
}
