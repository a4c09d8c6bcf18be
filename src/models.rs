//! Data models for the tipsheet pipeline.
//!
//! This module contains the core types shared across the pipeline:
//! agent roles, the three-way feedback classification that drives the
//! execution loop, and the loop's terminal outcome.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::prompts;

/// Conversational role an agent plays in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Runs the analysis: plans, executes code against the dataset,
    /// summarizes findings.
    Analyst,
    /// Critiques plans and insights against editorial reference
    /// documents. Optional.
    Editor,
    /// Judges summaries for newsworthiness and drives the feedback
    /// loop. Optional.
    Reporter,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Analyst => "analyst",
            Role::Editor => "editor",
            Role::Reporter => "reporter",
        }
    }

    /// Standing instructions attached to this role's assistant.
    pub fn instructions(&self) -> &'static str {
        match self {
            Role::Analyst => prompts::ANALYST_INSTRUCTIONS,
            Role::Editor => prompts::EDITOR_INSTRUCTIONS,
            Role::Reporter => prompts::REPORTER_INSTRUCTIONS,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Three-way classification of reporter feedback.
///
/// Classified by substring containment in fixed priority:
/// Accept > Revise > Abandon. Text matching none of the markers is
/// `Unrecognized` and terminates the loop as an implicit abandonment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackDecision {
    /// "Option 1": the findings are good; stop and keep them.
    Accept,
    /// "Option 2": revise the analysis and run another pass.
    Revise,
    /// "Option 3": drop this question entirely.
    Abandon,
    /// No recognized marker in the feedback text.
    Unrecognized,
}

impl FeedbackDecision {
    /// Classify free-text feedback.
    pub fn classify(feedback: &str) -> Self {
        if feedback.contains("Option 1") {
            FeedbackDecision::Accept
        } else if feedback.contains("Option 2") {
            FeedbackDecision::Revise
        } else if feedback.contains("Option 3") {
            FeedbackDecision::Abandon
        } else {
            FeedbackDecision::Unrecognized
        }
    }
}

impl fmt::Display for FeedbackDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FeedbackDecision::Accept => "accept",
            FeedbackDecision::Revise => "revise",
            FeedbackDecision::Abandon => "abandon",
            FeedbackDecision::Unrecognized => "unrecognized",
        };
        f.write_str(s)
    }
}

/// Terminal outcome of the execution/feedback loop for one question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopOutcome {
    /// The reporter accepted a summary (or no reporter is configured).
    Accepted(Vec<String>),
    /// The revise budget ran out without an accept or abandon; the
    /// accumulated summaries are valid but incomplete.
    Exhausted(Vec<String>),
    /// The question contributes nothing downstream.
    Abandoned,
}

impl LoopOutcome {
    /// The accumulated per-pass summaries, when the question is still
    /// usable downstream.
    pub fn into_summaries(self) -> Option<Vec<String>> {
        match self {
            LoopOutcome::Accepted(s) | LoopOutcome::Exhausted(s) => Some(s),
            LoopOutcome::Abandoned => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_each_option() {
        assert_eq!(
            FeedbackDecision::classify("Option 1 - publish it"),
            FeedbackDecision::Accept
        );
        assert_eq!(
            FeedbackDecision::classify("I'd go with Option 2: check outliers"),
            FeedbackDecision::Revise
        );
        assert_eq!(
            FeedbackDecision::classify("Option 3"),
            FeedbackDecision::Abandon
        );
    }

    #[test]
    fn test_classify_priority_order() {
        // Accept wins over revise, revise over abandon.
        assert_eq!(
            FeedbackDecision::classify("Option 1, though Option 2 was tempting"),
            FeedbackDecision::Accept
        );
        assert_eq!(
            FeedbackDecision::classify("Not Option 3, definitely Option 2"),
            FeedbackDecision::Revise
        );
    }

    #[test]
    fn test_classify_unrecognized() {
        assert_eq!(
            FeedbackDecision::classify("looks fine to me"),
            FeedbackDecision::Unrecognized
        );
        assert_eq!(FeedbackDecision::classify(""), FeedbackDecision::Unrecognized);
    }

    #[test]
    fn test_outcome_summaries() {
        let s = vec!["a".to_string(), "b".to_string()];
        assert_eq!(
            LoopOutcome::Accepted(s.clone()).into_summaries(),
            Some(s.clone())
        );
        assert_eq!(LoopOutcome::Exhausted(s.clone()).into_summaries(), Some(s));
        assert_eq!(LoopOutcome::Abandoned.into_summaries(), None);
    }

    #[test]
    fn test_role_display() {
        assert_eq!(Role::Analyst.to_string(), "analyst");
        assert_eq!(Role::Reporter.to_string(), "reporter");
    }
}
