use serde::{Deserialize, Serialize};

use crate::consts::{
    DEFAULT_ADAPTIVE_BLOCK_SIZE, DEFAULT_ADAPTIVE_OFFSET, DEFAULT_BINARY_THRESHOLD,
    DEFAULT_CLOSE_KERNEL, DEFAULT_FEATHER_SIGMA, DEFAULT_OPEN_KERNEL,
};

/// How a grayscale signal is turned into a strict 0/255 matte.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum ThresholdMethod {
    /// Values strictly above `level` become 255, everything else 0.
    Global {
        #[serde(default = "default_level")]
        level: u8,
    },
    /// Pixel becomes 255 when it exceeds its Gaussian-weighted local mean
    /// (over a `block_size` neighbourhood) minus `offset`.
    Adaptive {
        #[serde(default = "default_block_size")]
        block_size: usize,
        #[serde(default = "default_offset")]
        offset: f32,
    },
}

fn default_level() -> u8 {
    DEFAULT_BINARY_THRESHOLD
}
fn default_block_size() -> usize {
    DEFAULT_ADAPTIVE_BLOCK_SIZE
}
fn default_offset() -> f32 {
    DEFAULT_ADAPTIVE_OFFSET
}

impl Default for ThresholdMethod {
    fn default() -> Self {
        Self::Global {
            level: DEFAULT_BINARY_THRESHOLD,
        }
    }
}

impl std::fmt::Display for ThresholdMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Global { level } => write!(f, "Global (> {level})"),
            Self::Adaptive { block_size, offset } => {
                write!(f, "Adaptive (block {block_size}, offset {offset})")
            }
        }
    }
}

/// Square structuring elements for the close-then-open cleanup. A kernel
/// side of 0 or 1 disables that pass.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MorphologyConfig {
    #[serde(default = "default_close_kernel")]
    pub close_kernel: usize,
    #[serde(default = "default_open_kernel")]
    pub open_kernel: usize,
}

fn default_close_kernel() -> usize {
    DEFAULT_CLOSE_KERNEL
}
fn default_open_kernel() -> usize {
    DEFAULT_OPEN_KERNEL
}

impl Default for MorphologyConfig {
    fn default() -> Self {
        Self {
            close_kernel: DEFAULT_CLOSE_KERNEL,
            open_kernel: DEFAULT_OPEN_KERNEL,
        }
    }
}

impl MorphologyConfig {
    /// Closing only, for "connect disjoint regions" passes.
    pub fn close_only(kernel: usize) -> Self {
        Self {
            close_kernel: kernel,
            open_kernel: 0,
        }
    }
}

/// Optional blur applied after morphology.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SmoothingConfig {
    #[serde(default = "default_sigma")]
    pub sigma: f32,
    /// Threshold again at the global level after blurring. When false the
    /// soft edge is kept.
    #[serde(default = "default_rebinarize")]
    pub rebinarize: bool,
}

fn default_sigma() -> f32 {
    DEFAULT_FEATHER_SIGMA
}
fn default_rebinarize() -> bool {
    true
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            sigma: DEFAULT_FEATHER_SIGMA,
            rebinarize: true,
        }
    }
}

/// What to do when a frame has a segmentation mask but no motion signal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingMotionPolicy {
    /// Substitute an all-white motion signal (segmentation-only output).
    #[default]
    Fallback,
    /// Skip the frame as missing input.
    Skip,
}

impl std::fmt::Display for MissingMotionPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fallback => write!(f, "Fallback to white"),
            Self::Skip => write!(f, "Skip frame"),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RefineConfig {
    #[serde(default)]
    pub threshold: ThresholdMethod,
    #[serde(default)]
    pub morphology: MorphologyConfig,
    #[serde(default)]
    pub smoothing: Option<SmoothingConfig>,
    #[serde(default)]
    pub missing_motion: MissingMotionPolicy,
}
