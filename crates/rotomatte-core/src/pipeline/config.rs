use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_CUTOUT_CLOSE_KERNEL, DEFAULT_OVERLAY_WEIGHT};
use crate::edge::EdgeConfig;
use crate::io::FrameLayout;
use crate::refine::{MorphologyConfig, RefineConfig};
use crate::segment::SegmentConfig;

/// Stage names written by external collaborators.
pub const FRAMES_STAGE: &str = "frames";
pub const MOTION_VECTORS_STAGE: &str = "motion_vectors";
pub const MASKS_STAGE: &str = "masks";

/// Stage names of the default chain.
pub const REFINED_MASKS_STAGE: &str = "refined_masks";
pub const CUTOUTS_STAGE: &str = "cutouts";
pub const FINAL_CUTOUTS_STAGE: &str = "final_cutouts";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Root directory holding one sub-directory per stage.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default)]
    pub layout: FrameLayout,
    /// Stages produced outside the pipeline (decoder, segmentation model).
    #[serde(default = "default_sources")]
    pub sources: Vec<String>,
    /// Worker threads per stage; 0 uses the global rayon pool.
    #[serde(default)]
    pub workers: usize,
    #[serde(default)]
    pub existing: ExistingPolicy,
    /// Stages in execution order.
    #[serde(default = "default_stages")]
    pub stages: Vec<StageDefinition>,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

fn default_sources() -> Vec<String> {
    vec![
        FRAMES_STAGE.into(),
        MOTION_VECTORS_STAGE.into(),
        MASKS_STAGE.into(),
    ]
}

/// refined_masks -> cutouts -> final_cutouts
pub fn default_stages() -> Vec<StageDefinition> {
    vec![
        StageDefinition {
            name: REFINED_MASKS_STAGE.into(),
            kind: StageKind::Refine {
                mask: MASKS_STAGE.into(),
                motion: MOTION_VECTORS_STAGE.into(),
                refine: RefineConfig::default(),
            },
        },
        StageDefinition {
            name: CUTOUTS_STAGE.into(),
            kind: StageKind::Cutout {
                color: FRAMES_STAGE.into(),
                matte: REFINED_MASKS_STAGE.into(),
                cleanup: default_cutout_cleanup(),
            },
        },
        StageDefinition {
            name: FINAL_CUTOUTS_STAGE.into(),
            kind: StageKind::EdgeRefine {
                input: CUTOUTS_STAGE.into(),
                edges: EdgeConfig::default(),
            },
        },
    ]
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            layout: FrameLayout::default(),
            sources: default_sources(),
            workers: 0,
            existing: ExistingPolicy::default(),
            stages: default_stages(),
        }
    }
}

/// What to do with frames that already have an artifact in the target stage.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExistingPolicy {
    /// Recompute; the file is left untouched when the new bytes are identical.
    #[default]
    Recompute,
    /// Leave existing artifacts as they are and only fill in missing frames.
    Keep,
}

impl std::fmt::Display for ExistingPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Recompute => write!(f, "Recompute"),
            Self::Keep => write!(f, "Keep existing"),
        }
    }
}

/// One named stage: where it reads from and what it computes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StageDefinition {
    pub name: String,
    #[serde(flatten)]
    pub kind: StageKind,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StageKind {
    /// Segmentation mask AND motion signal, cleaned into a binary matte.
    Refine {
        mask: String,
        motion: String,
        #[serde(default)]
        refine: RefineConfig,
    },
    /// Color frame + matte -> RGBA cutout.
    Cutout {
        color: String,
        matte: String,
        #[serde(default = "default_cutout_cleanup")]
        cleanup: MorphologyConfig,
    },
    /// Feather the alpha boundary of RGBA cutouts.
    EdgeRefine {
        input: String,
        #[serde(default)]
        edges: EdgeConfig,
    },
    /// Color frame + matte over a background plate -> opaque color frame.
    Background {
        color: String,
        matte: String,
        plate: PathBuf,
    },
    /// Color frame with the matted area blacked out.
    Subtract { color: String, matte: String },
    /// Base signal blended with a matte for inspection.
    Overlay {
        base: String,
        matte: String,
        #[serde(default = "default_overlay_weight")]
        weight: f32,
    },
    /// Run the injected segmenter over color frames.
    Segment {
        frames: String,
        #[serde(default)]
        segment: SegmentConfig,
    },
}

fn default_cutout_cleanup() -> MorphologyConfig {
    MorphologyConfig::close_only(DEFAULT_CUTOUT_CLOSE_KERNEL)
}

fn default_overlay_weight() -> f32 {
    DEFAULT_OVERLAY_WEIGHT
}

impl StageKind {
    /// The upstream stage whose frame indices drive this stage.
    pub fn primary(&self) -> &str {
        match self {
            Self::Refine { mask, .. } => mask.as_str(),
            Self::Cutout { matte, .. }
            | Self::Background { matte, .. }
            | Self::Subtract { matte, .. }
            | Self::Overlay { matte, .. } => matte.as_str(),
            Self::EdgeRefine { input, .. } => input.as_str(),
            Self::Segment { frames, .. } => frames.as_str(),
        }
    }

    /// Every upstream stage read by this stage, primary first.
    pub fn inputs(&self) -> Vec<&str> {
        match self {
            Self::Refine { mask, motion, .. } => vec![mask.as_str(), motion.as_str()],
            Self::Cutout { color, matte, .. }
            | Self::Background { color, matte, .. }
            | Self::Subtract { color, matte } => vec![matte.as_str(), color.as_str()],
            Self::Overlay { base, matte, .. } => vec![matte.as_str(), base.as_str()],
            Self::EdgeRefine { input, .. } => vec![input.as_str()],
            Self::Segment { frames, .. } => vec![frames.as_str()],
        }
    }
}

impl std::fmt::Display for StageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Refine { .. } => write!(f, "Refine"),
            Self::Cutout { .. } => write!(f, "Cutout"),
            Self::EdgeRefine { .. } => write!(f, "Edge Refine"),
            Self::Background { .. } => write!(f, "Background"),
            Self::Subtract { .. } => write!(f, "Subtract"),
            Self::Overlay { .. } => write!(f, "Overlay"),
            Self::Segment { .. } => write!(f, "Segment"),
        }
    }
}
