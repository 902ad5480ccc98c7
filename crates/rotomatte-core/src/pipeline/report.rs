use serde::Serialize;

use crate::frame::FrameIndex;
use crate::io::StoreOutcome;

/// Lifecycle of one stage execution. A stage never fails as a whole.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Pending,
    Running,
    Completed,
    CompletedWithSkips,
}

impl std::fmt::Display for StageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "Pending"),
            Self::Running => write!(f, "Running"),
            Self::Completed => write!(f, "Completed"),
            Self::CompletedWithSkips => write!(f, "Completed with skips"),
        }
    }
}

/// Why a frame produced no artifact.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    MissingInput,
    InvalidImage,
    ShapeIrreconcilable,
    InvalidInput,
    Collaborator,
    Cancelled,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingInput => write!(f, "missing input"),
            Self::InvalidImage => write!(f, "invalid image"),
            Self::ShapeIrreconcilable => write!(f, "shape irreconcilable"),
            Self::InvalidInput => write!(f, "invalid input"),
            Self::Collaborator => write!(f, "collaborator failure"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// How an artifact came to be present after the run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactOutcome {
    /// New or changed content was committed.
    Written,
    /// Recomputed, identical to the stored artifact; file left untouched.
    Unchanged,
    /// Already present and not recomputed.
    Kept,
}

impl From<StoreOutcome> for ArtifactOutcome {
    fn from(outcome: StoreOutcome) -> Self {
        match outcome {
            StoreOutcome::Written => Self::Written,
            StoreOutcome::Unchanged => Self::Unchanged,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ProducedFrame {
    pub index: FrameIndex,
    pub outcome: ArtifactOutcome,
    /// A substitute input stood in for a missing one.
    pub fallback: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SkippedFrame {
    pub index: FrameIndex,
    pub reason: SkipReason,
    pub detail: String,
}

/// Per-frame and per-stage outcome of one stage execution.
#[derive(Clone, Debug, Serialize)]
pub struct StageReport {
    pub stage: String,
    pub kind: String,
    pub status: StageStatus,
    /// Upstream stages, primary first.
    pub upstream: Vec<String>,
    /// Frames found in the primary upstream when the stage started.
    pub available: usize,
    pub produced: Vec<ProducedFrame>,
    pub skipped: Vec<SkippedFrame>,
    /// The primary upstream was empty and no frame was attempted.
    pub aborted: bool,
    pub note: Option<String>,
    pub elapsed_secs: f64,
}

impl StageReport {
    pub fn new(stage: &str, kind: &str, upstream: Vec<String>) -> Self {
        Self {
            stage: stage.to_string(),
            kind: kind.to_string(),
            status: StageStatus::Pending,
            upstream,
            available: 0,
            produced: Vec::new(),
            skipped: Vec::new(),
            aborted: false,
            note: None,
            elapsed_secs: 0.0,
        }
    }

    fn count(&self, outcome: ArtifactOutcome) -> usize {
        self.produced.iter().filter(|p| p.outcome == outcome).count()
    }

    pub fn written(&self) -> usize {
        self.count(ArtifactOutcome::Written)
    }

    pub fn unchanged(&self) -> usize {
        self.count(ArtifactOutcome::Unchanged)
    }

    pub fn kept(&self) -> usize {
        self.count(ArtifactOutcome::Kept)
    }

    /// Indices produced through a fallback input.
    pub fn fallbacks(&self) -> Vec<FrameIndex> {
        self.produced
            .iter()
            .filter(|p| p.fallback)
            .map(|p| p.index)
            .collect()
    }

    pub fn produced_indices(&self) -> Vec<FrameIndex> {
        self.produced.iter().map(|p| p.index).collect()
    }

    pub fn skipped_with(&self, reason: SkipReason) -> Vec<FrameIndex> {
        self.skipped
            .iter()
            .filter(|s| s.reason == reason)
            .map(|s| s.index)
            .collect()
    }

    /// Sort entries by frame index and settle the terminal status.
    pub(crate) fn finish(&mut self) {
        self.produced.sort_by_key(|p| p.index);
        self.skipped.sort_by_key(|s| s.index);
        self.status = if self.aborted || !self.skipped.is_empty() || !self.fallbacks().is_empty() {
            StageStatus::CompletedWithSkips
        } else {
            StageStatus::Completed
        };
    }
}

/// Summary of a whole run, in execution order.
#[derive(Clone, Debug, Default, Serialize)]
pub struct RunReport {
    pub stages: Vec<StageReport>,
    /// The run was cancelled before every frame was attempted.
    pub cancelled: bool,
}

impl RunReport {
    pub fn stage(&self, name: &str) -> Option<&StageReport> {
        self.stages.iter().find(|s| s.stage == name)
    }

    /// Stages that terminated without attempting any frame.
    pub fn stage_failures(&self) -> usize {
        self.stages.iter().filter(|s| s.aborted).count()
    }

    pub fn total_produced(&self) -> usize {
        self.stages.iter().map(|s| s.produced.len()).sum()
    }

    pub fn total_skipped(&self) -> usize {
        self.stages.iter().map(|s| s.skipped.len()).sum()
    }

    /// Every stage completed without skips or fallbacks.
    pub fn is_clean(&self) -> bool {
        self.stages
            .iter()
            .all(|s| s.status == StageStatus::Completed)
    }
}
