use thiserror::Error;

use crate::frame::FrameIndex;
use crate::pipeline::SkipReason;

#[derive(Error, Debug)]
pub enum RotoError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image format error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("Artifact missing: stage '{stage}', frame {index}")]
    ArtifactMissing { stage: String, index: FrameIndex },

    #[error("Artifact unreadable: stage '{stage}', frame {index}: {reason}")]
    ArtifactUnreadable {
        stage: String,
        index: FrameIndex,
        reason: String,
    },

    #[error("Shape irreconcilable: {width}x{height}")]
    ShapeIrreconcilable { width: usize, height: usize },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("External collaborator failed: {0}")]
    Collaborator(String),

    #[error("Cancelled")]
    Cancelled,
}

impl RotoError {
    /// Classify a per-frame error for the run report.
    pub fn skip_reason(&self) -> SkipReason {
        match self {
            Self::ArtifactMissing { .. } => SkipReason::MissingInput,
            Self::ArtifactUnreadable { .. } | Self::ImageError(_) => SkipReason::InvalidImage,
            Self::ShapeIrreconcilable { .. } => SkipReason::ShapeIrreconcilable,
            Self::Collaborator(_) => SkipReason::Collaborator,
            Self::Cancelled => SkipReason::Cancelled,
            Self::InvalidInput(_) | Self::Config(_) | Self::Io(_) => SkipReason::InvalidInput,
        }
    }
}

pub type Result<T> = std::result::Result<T, RotoError>;
