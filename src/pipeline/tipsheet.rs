//! Tipsheet compilation.
//!
//! Walks question indices in order, embeds every existing bullet
//! artifact into one aggregate prompt, and makes a single backend call
//! for the ranked tipsheet. Abandoned questions have no bullet
//! artifact and are skipped silently; an all-abandoned run still
//! produces a tipsheet from an empty aggregate.

use tracing::{debug, info};

use super::{Pipeline, PipelineError};
use crate::prompts;
use crate::store::{ArtifactKey, Stage};

impl Pipeline {
    /// Compile and persist the run's terminal `tipsheet.txt`.
    pub(crate) async fn compile_tipsheet(&self) -> Result<String, PipelineError> {
        let mut analyses = String::new();
        for index in 1..=self.config.n_questions {
            match self
                .store
                .get(&ArtifactKey::question(index, Stage::Bullets))?
            {
                Some(bullets) => {
                    analyses.push_str(&format!("```\nAnalysis [{}]\n\n{}\n```\n", index, bullets));
                }
                None => debug!("question {}: no bullets, skipping", index),
            }
        }

        let tipsheet = self
            .reviewer()
            .send(&prompts::create_tipsheet(self.config.n_bullets, &analyses))
            .await?;
        self.store.put(&ArtifactKey::Tipsheet, &tipsheet)?;
        info!("tipsheet written");
        Ok(tipsheet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::testing::pipeline_with;
    use crate::store::ArtifactStore;

    #[tokio::test]
    async fn test_aggregate_preserves_order_and_skips_gaps() {
        let (mut pipeline, backend, store) = pipeline_with(&["the tipsheet"], false, false).await;
        pipeline.config.n_questions = 3;

        // Question 2 was abandoned: no bullets artifact.
        store
            .put(&ArtifactKey::question(1, Stage::Bullets), "- first insight")
            .unwrap();
        store
            .put(&ArtifactKey::question(3, Stage::Bullets), "- third insight")
            .unwrap();

        let tipsheet = pipeline.compile_tipsheet().await.unwrap();
        assert_eq!(tipsheet, "the tipsheet");
        assert!(store.has(&ArtifactKey::Tipsheet));

        let prompt = &backend.sent()[0];
        let first = prompt.find("Analysis [1]").unwrap();
        let third = prompt.find("Analysis [3]").unwrap();
        assert!(first < third);
        assert!(!prompt.contains("Analysis [2]"));
    }

    #[tokio::test]
    async fn test_all_abandoned_still_produces_tipsheet() {
        let (mut pipeline, backend, store) =
            pipeline_with(&["nothing newsworthy this week"], false, false).await;
        pipeline.config.n_questions = 4;

        let tipsheet = pipeline.compile_tipsheet().await.unwrap();
        assert_eq!(tipsheet, "nothing newsworthy this week");
        assert_eq!(
            store.get(&ArtifactKey::Tipsheet).unwrap().as_deref(),
            Some("nothing newsworthy this week")
        );
        // The aggregate prompt embeds zero analyses.
        assert!(!backend.sent()[0].contains("Analysis ["));
    }
}
