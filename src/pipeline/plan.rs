//! Plan stage.
//!
//! One analytical plan per question, memoized on its artifact. With an
//! editor configured the plan gets exactly one critique round, and the
//! revised plan is what gets persisted; the first draft is not kept.

use tracing::debug;

use super::{Pipeline, PipelineError};
use crate::prompts;
use crate::store::{ArtifactKey, Stage};

impl Pipeline {
    /// Produce (or reload) the analytical plan for one question.
    pub(crate) async fn write_plan(
        &self,
        index: usize,
        question: &str,
    ) -> Result<String, PipelineError> {
        let key = ArtifactKey::question(index, Stage::Plan);
        if let Some(plan) = self.store.get(&key)? {
            debug!("question {}: plan already on disk", index);
            return Ok(plan);
        }

        let mut plan = self
            .analyst
            .send(&prompts::analytical_plan(&self.dataset_description, question))
            .await?;

        if let Some(editor) = &self.editor {
            let critique_prompt = format!(
                "{}\n#Task\n{}",
                self.dataset_description,
                prompts::plan_critique(question, &plan)
            );
            let critique = editor.send(&critique_prompt).await?;
            self.store
                .put(&ArtifactKey::question(index, Stage::PlanEditorFeedback), &critique)?;

            plan = self
                .analyst
                .send(&prompts::implement_plan_critique(&critique))
                .await?;
        }

        self.store.put(&key, &plan)?;
        Ok(plan)
    }
}
