//! Insight summarization and the post-hoc editor revision.
//!
//! Condenses a question's accumulated summaries into its `bullets.txt`
//! artifact. Bullets are the one artifact written twice: once after
//! the feedback loop and again after the optional editor revision.

use super::{Pipeline, PipelineError};
use crate::agent::AgentHandle;
use crate::prompts;
use crate::store::{ArtifactKey, Stage};

impl Pipeline {
    /// Condense the accumulated summaries into the question's bullet
    /// artifact, overwriting any prior value.
    pub(crate) async fn summarize_insights(
        &self,
        index: usize,
        question: &str,
        summaries: &[String],
    ) -> Result<String, PipelineError> {
        let joined = summaries.join("\n");
        let bullets = self
            .reviewer()
            .send(&prompts::summarize_insights(question, &joined))
            .await?;
        self.store
            .put(&ArtifactKey::question(index, Stage::Bullets), &bullets)?;
        Ok(bullets)
    }

    /// Post-hoc editor round over the condensed bullets: critique, a
    /// final analyst revision, and a summary of that revision, which is
    /// appended to the accumulated list so the bullets can be
    /// regenerated from it.
    pub(crate) async fn revise_with_editor(
        &self,
        editor: &AgentHandle,
        index: usize,
        question: &str,
        bullets: &str,
        summaries: &mut Vec<String>,
    ) -> Result<(), PipelineError> {
        let critique = editor
            .send(&prompts::insights_critique(question, bullets))
            .await?;
        self.store
            .put(&ArtifactKey::question(index, Stage::EditorFeedback), &critique)?;

        let revision = self
            .analyst
            .send(&prompts::implement_insights_critique(&critique))
            .await?;
        self.store
            .put(&ArtifactKey::question(index, Stage::FinalRevision), &revision)?;

        let summary = self.analyst.send(prompts::SUMMARIZE_REVISED_FINDINGS).await?;
        self.store
            .put(&ArtifactKey::question(index, Stage::FinalAnalysis), &summary)?;
        summaries.push(summary);
        Ok(())
    }
}
