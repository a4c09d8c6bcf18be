//! The multi-agent tipsheet pipeline.
//!
//! Control flow: question generation, then per question a plan stage,
//! the execution/feedback loop, and insight summarization (with an
//! optional post-hoc editor revision), and finally tipsheet
//! compilation. Questions are processed strictly one at a time; every
//! stage persists its result through the artifact store and consults
//! the store first so an interrupted run resumes where it stopped.

mod feedback;
mod insights;
mod plan;
mod questions;
mod tipsheet;

use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use crate::agent::{AgentError, AgentHandle};
use crate::store::ArtifactStore;

/// Pipeline-level failures.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The brainstorm response contained no numbered items. Fatal for
    /// the run; never retried.
    #[error("no questions generated: the brainstorm response contained no numbered items")]
    QuestionGeneration,

    #[error(transparent)]
    Agent(#[from] AgentError),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

/// Knobs of one pipeline run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Questions to brainstorm and process.
    pub n_questions: usize,
    /// Bullets requested for the final tipsheet.
    pub n_bullets: usize,
    /// Maximum revise rounds per question.
    pub max_feedback: usize,
    /// Reset agent sessions between questions.
    pub reset_agents: bool,
    /// Draw a per-question progress bar.
    pub show_progress: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            n_questions: 10,
            n_bullets: 10,
            max_feedback: 3,
            reset_agents: true,
            show_progress: true,
        }
    }
}

/// One configured pipeline run.
pub struct Pipeline {
    pub(crate) config: RunConfig,
    pub(crate) store: Arc<dyn ArtifactStore>,
    pub(crate) analyst: AgentHandle,
    pub(crate) editor: Option<AgentHandle>,
    pub(crate) reporter: Option<AgentHandle>,
    pub(crate) dataset_description: String,
}

impl Pipeline {
    pub fn new(
        config: RunConfig,
        store: Arc<dyn ArtifactStore>,
        analyst: AgentHandle,
        editor: Option<AgentHandle>,
        reporter: Option<AgentHandle>,
        dataset_description: String,
    ) -> Self {
        Self {
            config,
            store,
            analyst,
            editor,
            reporter,
            dataset_description,
        }
    }

    /// The reviewer capability: the role that brainstorms questions,
    /// condenses insights, and compiles the tipsheet. Fixed by the run
    /// configuration: the reporter when one is configured, otherwise
    /// the analyst.
    pub(crate) fn reviewer(&self) -> &AgentHandle {
        self.reporter.as_ref().unwrap_or(&self.analyst)
    }

    /// Run the pipeline end to end and return the tipsheet text.
    pub async fn run(&mut self) -> Result<String, PipelineError> {
        let questions = self.brainstorm_questions().await?;
        info!("processing {} question(s)", questions.len().min(self.config.n_questions));

        let bar = if self.config.show_progress {
            let bar = ProgressBar::new(questions.len().min(self.config.n_questions) as u64);
            bar.set_style(
                ProgressStyle::with_template("{bar:40} {pos}/{len} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar()),
            );
            bar
        } else {
            ProgressBar::hidden()
        };

        for (i, question) in questions.iter().enumerate().take(self.config.n_questions) {
            let index = i + 1;
            bar.set_message(format!("question {}", index));

            if self.config.reset_agents {
                self.reset_sessions().await?;
            }

            let plan = self.write_plan(index, question).await?;
            let outcome = self.execute_with_feedback(index, question, &plan).await?;

            match outcome.into_summaries() {
                Some(mut summaries) => {
                    let bullets = self.summarize_insights(index, question, &summaries).await?;
                    if let Some(editor) = &self.editor {
                        self.revise_with_editor(editor, index, question, &bullets, &mut summaries)
                            .await?;
                        self.summarize_insights(index, question, &summaries).await?;
                    }
                }
                None => {
                    info!("question {} abandoned; no insights to summarize", index);
                }
            }

            bar.inc(1);
        }
        bar.finish_and_clear();

        self.compile_tipsheet().await
    }

    /// Point-in-time rebind of every agent session: history is
    /// discarded, dataset/document contexts survive.
    async fn reset_sessions(&mut self) -> Result<(), PipelineError> {
        self.analyst.reset().await?;
        if let Some(editor) = &mut self.editor {
            editor.reset().await?;
        }
        if let Some(reporter) = &mut self.reporter {
            reporter.reset().await?;
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::backend::mock::MockBackend;
    use crate::backend::Binding;
    use crate::models::Role;
    use crate::store::memory::MemoryStore;
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;

    use crate::agent::AgentOptions;

    /// Build a pipeline over a scripted backend and an in-memory store.
    pub(crate) async fn pipeline_with(
        replies: &[&str],
        use_editor: bool,
        use_reporter: bool,
    ) -> (Pipeline, Arc<MockBackend>, Arc<MemoryStore>) {
        let backend = Arc::new(MockBackend::new(replies));
        let store = Arc::new(MemoryStore::new());

        let options = AgentOptions {
            poll_interval: Duration::from_millis(1),
            send_timeout: Duration::from_secs(5),
            ..AgentOptions::default()
        };
        let cancel = CancellationToken::new();

        let analyst = AgentHandle::create(
            backend.clone(),
            store.clone(),
            Role::Analyst,
            Binding::CodeExecution {
                file_id: "file_data".to_string(),
            },
            "test",
            options.clone(),
            cancel.clone(),
        )
        .await
        .unwrap();

        let editor = if use_editor {
            Some(
                AgentHandle::create(
                    backend.clone(),
                    store.clone(),
                    Role::Editor,
                    Binding::DocumentSearch {
                        vector_store_id: "vs_docs".to_string(),
                    },
                    "test",
                    options.clone(),
                    cancel.clone(),
                )
                .await
                .unwrap(),
            )
        } else {
            None
        };

        let reporter = if use_reporter {
            Some(
                AgentHandle::create(
                    backend.clone(),
                    store.clone(),
                    Role::Reporter,
                    Binding::CodeExecution {
                        file_id: "file_data".to_string(),
                    },
                    "test",
                    options,
                    cancel,
                )
                .await
                .unwrap(),
            )
        } else {
            None
        };

        let config = RunConfig {
            n_questions: 10,
            n_bullets: 5,
            max_feedback: 3,
            reset_agents: false,
            show_progress: false,
        };

        let pipeline = Pipeline::new(
            config,
            store.clone(),
            analyst,
            editor,
            reporter,
            "# Dataset\nMonthly permit filings, 2015-2024.".to_string(),
        );
        (pipeline, backend, store)
    }
}
