//! Question generation.
//!
//! One composed prompt produces the candidate questions; the response
//! is split on blank lines and only numbered segments ("1.", "2.", ...)
//! are kept. The persisted `questions.txt` is canonical: once written
//! it is never regenerated, and a resumed run parses it with the same
//! delimiter instead of calling the backend.

use tracing::{debug, info};

use super::{Pipeline, PipelineError};
use crate::prompts;
use crate::store::ArtifactKey;

impl Pipeline {
    /// Produce (or reload) the ordered question list.
    pub(crate) async fn brainstorm_questions(&self) -> Result<Vec<String>, PipelineError> {
        if let Some(existing) = self.store.get(&ArtifactKey::Questions)? {
            debug!("questions.txt already present; skipping brainstorm");
            return Ok(parse_questions(&existing));
        }

        let prompt = format!(
            "{}\n\n{}",
            self.dataset_description,
            prompts::brainstorm_questions(self.config.n_questions)
        );
        let raw = self.reviewer().send(&prompt).await?;

        let questions = parse_questions(&raw);
        if questions.is_empty() {
            return Err(PipelineError::QuestionGeneration);
        }
        info!("generated {} question(s)", questions.len());

        let persisted: String = questions.iter().map(|q| format!("{}\n\n", q)).collect();
        self.store.put(&ArtifactKey::Questions, &persisted)?;
        Ok(questions)
    }
}

/// Blank-line-delimited segments that start with `<digits>.`.
pub(crate) fn parse_questions(text: &str) -> Vec<String> {
    text.split("\n\n")
        .filter(|segment| is_numbered(segment))
        .map(str::to_string)
        .collect()
}

fn is_numbered(segment: &str) -> bool {
    let digits = segment.chars().take_while(|c| c.is_ascii_digit()).count();
    digits > 0 && segment.chars().nth(digits) == Some('.')
}
