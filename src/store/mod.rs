//! Artifact persistence for pipeline runs.
//!
//! Every intermediate text result is an artifact keyed by
//! [`ArtifactKey`]. Existence of an artifact is the only
//! "already computed" signal the pipeline consults, which is what
//! makes an interrupted run resumable: stages check the store before
//! calling the backend and skip work whose artifact is already there.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Pipeline stage owning an artifact inside one question directory.
///
/// `Execution`/`Analysis` carry the 1-based execution pass counter;
/// `Feedback` carries the 1-based feedback round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Plan,
    PlanEditorFeedback,
    Execution(usize),
    Analysis(usize),
    Feedback(usize),
    EditorFeedback,
    FinalRevision,
    FinalAnalysis,
    Bullets,
}

impl Stage {
    fn file_name(&self) -> String {
        match self {
            Stage::Plan => "analytical_plan.txt".to_string(),
            Stage::PlanEditorFeedback => "plan_editor_feedback.txt".to_string(),
            Stage::Execution(n) => format!("{}_execution.txt", n),
            Stage::Analysis(n) => format!("{}_analysis.txt", n),
            Stage::Feedback(k) => format!("{}_feedback.txt", k),
            Stage::EditorFeedback => "editor_feedback.txt".to_string(),
            Stage::FinalRevision => "final_revision.txt".to_string(),
            Stage::FinalAnalysis => "final_analysis.txt".to_string(),
            Stage::Bullets => "bullets.txt".to_string(),
        }
    }
}

/// Key identifying one artifact within a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactKey {
    /// The canonical question list at the run root.
    Questions,
    /// The run's terminal output at the run root.
    Tipsheet,
    /// A per-question artifact; `index` is 1-based.
    Question { index: usize, stage: Stage },
}

impl ArtifactKey {
    pub fn question(index: usize, stage: Stage) -> Self {
        ArtifactKey::Question { index, stage }
    }

    /// Path of the artifact relative to the run root.
    pub fn rel_path(&self) -> PathBuf {
        match self {
            ArtifactKey::Questions => PathBuf::from("questions.txt"),
            ArtifactKey::Tipsheet => PathBuf::from("tipsheet.txt"),
            ArtifactKey::Question { index, stage } => {
                PathBuf::from(index.to_string()).join(stage.file_name())
            }
        }
    }
}

/// Keyed text-artifact persistence.
///
/// `put` overwrites unconditionally; write-at-most-once is a pipeline
/// invariant (stages check `get`/`has` first), not a store one, since
/// the bullets stage legitimately writes twice.
pub trait ArtifactStore: Send + Sync {
    fn has(&self, key: &ArtifactKey) -> bool;
    fn get(&self, key: &ArtifactKey) -> Result<Option<String>>;
    fn put(&self, key: &ArtifactKey, value: &str) -> Result<()>;

    /// Persist a raw backend trace under `logs/<role>/<run-id>/<name>`.
    fn put_log(&self, role: &str, run_id: &str, name: &str, value: &serde_json::Value)
        -> Result<()>;
}

/// Directory name for one run: `<project>-analyst[-reporter][-editor]`.
///
/// The suffix encodes which optional roles were enabled, so runs with
/// different role configurations never share artifacts.
pub fn run_dir_name(project: &str, use_reporter: bool, use_editor: bool) -> String {
    let mut name = format!("{}-analyst", project);
    if use_reporter {
        name.push_str("-reporter");
    }
    if use_editor {
        name.push_str("-editor");
    }
    name
}

/// Filesystem-backed artifact store rooted at one run directory.
pub struct FsArtifactStore {
    root: PathBuf,
}

impl FsArtifactStore {
    /// Open (creating if needed) the store at `root`.
    pub fn create(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)
            .with_context(|| format!("Failed to create run directory: {}", root.display()))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn full_path(&self, key: &ArtifactKey) -> PathBuf {
        self.root.join(key.rel_path())
    }
}

impl ArtifactStore for FsArtifactStore {
    fn has(&self, key: &ArtifactKey) -> bool {
        self.full_path(key).exists()
    }

    fn get(&self, key: &ArtifactKey) -> Result<Option<String>> {
        let path = self.full_path(key);
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read artifact: {}", path.display()))?;
        Ok(Some(content))
    }

    fn put(&self, key: &ArtifactKey, value: &str) -> Result<()> {
        let path = self.full_path(key);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        std::fs::write(&path, value)
            .with_context(|| format!("Failed to write artifact: {}", path.display()))?;
        Ok(())
    }

    fn put_log(
        &self,
        role: &str,
        run_id: &str,
        name: &str,
        value: &serde_json::Value,
    ) -> Result<()> {
        let dir = self.root.join("logs").join(role).join(run_id);
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create log directory: {}", dir.display()))?;
        let path = dir.join(name);
        let pretty = serde_json::to_string_pretty(value).context("Failed to serialize trace")?;
        std::fs::write(&path, pretty)
            .with_context(|| format!("Failed to write trace: {}", path.display()))?;
        Ok(())
    }
}
