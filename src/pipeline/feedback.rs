//! Execution/feedback loop: the pipeline's core state machine.
//!
//! Each pass executes the current instructions and condenses the
//! result into a summary; with a reporter configured, every summary is
//! then judged and the loop transitions on the three-way decision:
//! accept (terminal, success), revise (another pass, bounded by
//! `max_feedback`), or abandon (terminal, the question contributes
//! nothing). Unrecognized feedback also terminates the loop and is
//! treated as an abandonment, loudly. Without a reporter the loop is
//! degenerate: a single pass, always accepted.

use tracing::{info, warn};

use super::{Pipeline, PipelineError};
use crate::models::{FeedbackDecision, LoopOutcome};
use crate::prompts;
use crate::store::{ArtifactKey, Stage};

impl Pipeline {
    /// Run the execution/feedback loop for one question.
    pub(crate) async fn execute_with_feedback(
        &self,
        index: usize,
        question: &str,
        plan: &str,
    ) -> Result<LoopOutcome, PipelineError> {
        let mut summaries = Vec::new();

        // Pass 1: execute the plan itself.
        let execution = self.analyst.send(&prompts::execute_plan(plan)).await?;
        self.store
            .put(&ArtifactKey::question(index, Stage::Execution(1)), &execution)?;

        let mut summary = self.analyst.send(prompts::SUMMARIZE_FINDINGS).await?;
        self.store
            .put(&ArtifactKey::question(index, Stage::Analysis(1)), &summary)?;
        summaries.push(summary.clone());

        let Some(reporter) = &self.reporter else {
            return Ok(LoopOutcome::Accepted(summaries));
        };

        let mut revisions = 0;
        while revisions < self.config.max_feedback {
            let round = revisions + 1;
            let mut prompt = prompts::execution_feedback(question, &summary);
            if self.config.reset_agents {
                // A freshly reset reporter session has no memory of the
                // dataset; re-prime it with the description.
                prompt = format!("{}\n#Task\n{}", self.dataset_description, prompt);
            }

            let feedback = reporter.send(&prompt).await?;
            self.store
                .put(&ArtifactKey::question(index, Stage::Feedback(round)), &feedback)?;

            match FeedbackDecision::classify(&feedback) {
                FeedbackDecision::Accept => {
                    info!(
                        "question {}: accepted after {} feedback round(s)",
                        index, round
                    );
                    return Ok(LoopOutcome::Accepted(summaries));
                }
                FeedbackDecision::Abandon => {
                    info!("question {}: abandoned by reporter", index);
                    return Ok(LoopOutcome::Abandoned);
                }
                FeedbackDecision::Unrecognized => {
                    warn!(
                        "question {}: unrecognized feedback, treating as abandoned: {:?}",
                        index,
                        feedback.chars().take(80).collect::<String>()
                    );
                    return Ok(LoopOutcome::Abandoned);
                }
                FeedbackDecision::Revise => {
                    let pass = round + 1;
                    let execution = self
                        .analyst
                        .send(&prompts::implement_reporter_feedback(&feedback))
                        .await?;
                    self.store.put(
                        &ArtifactKey::question(index, Stage::Execution(pass)),
                        &execution,
                    )?;

                    summary = self.analyst.send(prompts::SUMMARIZE_REVISED_FINDINGS).await?;
                    self.store
                        .put(&ArtifactKey::question(index, Stage::Analysis(pass)), &summary)?;
                    summaries.push(summary.clone());
                    revisions += 1;
                }
            }
        }

        info!(
            "question {}: feedback budget exhausted, keeping {} summaries",
            index,
            summaries.len()
        );
        Ok(LoopOutcome::Exhausted(summaries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::testing::pipeline_with;
    use crate::store::ArtifactStore;

    const QUESTION: &str = "1. Which district issued the most permits?";
    const PLAN: &str = "group by district, count permits";

    #[tokio::test]
    async fn test_no_reporter_is_single_accepted_pass() {
        let (pipeline, backend, store) =
            pipeline_with(&["execution output", "- summary"], false, false).await;

        let outcome = pipeline
            .execute_with_feedback(1, QUESTION, PLAN)
            .await
            .unwrap();
        assert_eq!(
            outcome,
            LoopOutcome::Accepted(vec!["- summary".to_string()])
        );
        assert!(store.has(&ArtifactKey::question(1, Stage::Execution(1))));
        assert!(store.has(&ArtifactKey::question(1, Stage::Analysis(1))));
        assert!(!store.has(&ArtifactKey::question(1, Stage::Feedback(1))));
        assert_eq!(backend.remaining(), 0);
    }

    #[tokio::test]
    async fn test_accept_after_revisions_accumulates_summaries() {
        // One revise round, then accept: summaries length = 1 + 1.
        let (pipeline, _, store) = pipeline_with(
            &[
                "execution 1",
                "- summary 1",
                "Option 2: split by year",
                "execution 2",
                "- summary 2",
                "Option 1",
            ],
            false,
            true,
        )
        .await;

        let outcome = pipeline
            .execute_with_feedback(1, QUESTION, PLAN)
            .await
            .unwrap();
        assert_eq!(
            outcome,
            LoopOutcome::Accepted(vec!["- summary 1".to_string(), "- summary 2".to_string()])
        );

        // Revised pass artifacts carry the 1-based pass counter.
        assert!(store.has(&ArtifactKey::question(1, Stage::Execution(2))));
        assert!(store.has(&ArtifactKey::question(1, Stage::Analysis(2))));
        assert_eq!(
            store
                .get(&ArtifactKey::question(1, Stage::Feedback(1)))
                .unwrap()
                .as_deref(),
            Some("Option 2: split by year")
        );
        assert_eq!(
            store
                .get(&ArtifactKey::question(1, Stage::Feedback(2)))
                .unwrap()
                .as_deref(),
            Some("Option 1")
        );
    }

    #[tokio::test]
    async fn test_budget_exhaustion_stops_without_extra_feedback_call() {
        // max_feedback = 3, reporter says "Option 2" three times. The
        // loop must stop with 4 accumulated summaries and never ask for
        // a fourth round: the queue holds exactly the replies the bound
        // allows, and the mock errors on any extra call.
        let (pipeline, backend, _) = pipeline_with(
            &[
                "execution 1",
                "- summary 1",
                "Option 2",
                "execution 2",
                "- summary 2",
                "Option 2",
                "execution 3",
                "- summary 3",
                "Option 2",
                "execution 4",
                "- summary 4",
            ],
            false,
            true,
        )
        .await;

        let outcome = pipeline
            .execute_with_feedback(1, QUESTION, PLAN)
            .await
            .unwrap();
        assert_eq!(
            outcome,
            LoopOutcome::Exhausted(vec![
                "- summary 1".to_string(),
                "- summary 2".to_string(),
                "- summary 3".to_string(),
                "- summary 4".to_string(),
            ])
        );
        assert_eq!(backend.remaining(), 0);
    }

    #[tokio::test]
    async fn test_abandon_is_terminal() {
        let (pipeline, backend, store) = pipeline_with(
            &["execution 1", "- summary 1", "Option 3, nothing here"],
            false,
            true,
        )
        .await;

        let outcome = pipeline
            .execute_with_feedback(2, QUESTION, PLAN)
            .await
            .unwrap();
        assert_eq!(outcome, LoopOutcome::Abandoned);
        // The feedback itself is still persisted for the record.
        assert!(store.has(&ArtifactKey::question(2, Stage::Feedback(1))));
        assert_eq!(backend.remaining(), 0);
    }

    #[tokio::test]
    async fn test_unrecognized_feedback_terminates_as_abandonment() {
        let (pipeline, backend, _) = pipeline_with(
            &["execution 1", "- summary 1", "sounds good, ship it"],
            false,
            true,
        )
        .await;

        let outcome = pipeline
            .execute_with_feedback(1, QUESTION, PLAN)
            .await
            .unwrap();
        assert_eq!(outcome, LoopOutcome::Abandoned);
        assert_eq!(backend.remaining(), 0);
    }

    #[tokio::test]
    async fn test_reset_runs_reprime_reporter_with_description() {
        let (mut pipeline, backend, _) = pipeline_with(
            &["execution 1", "- summary 1", "Option 1"],
            false,
            true,
        )
        .await;
        pipeline.config.reset_agents = true;

        pipeline
            .execute_with_feedback(1, QUESTION, PLAN)
            .await
            .unwrap();

        let sent = backend.sent();
        let feedback_prompt = &sent[2];
        assert!(feedback_prompt.starts_with("# Dataset"));
        assert!(feedback_prompt.contains("#Task"));
    }
}
