use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_BINARY_THRESHOLD, DEFAULT_SEGMENT_CLOSE_KERNEL, MATTE_OFF, MATTE_ON};
use crate::error::{Result, RotoError};
use crate::frame::{ColorFrame, Mask};
use crate::refine::morphology::cleanup;
use crate::refine::threshold::binarize;
use crate::refine::MorphologyConfig;

/// Raw output of a segmentation model for one frame.
#[derive(Clone, Debug)]
pub struct Segmentation {
    /// Foreground = 255, background = 0.
    pub mask: Mask,
    /// Optional per-pixel confidence in [0, 1], same shape as `mask`.
    pub confidence: Option<Array2<f32>>,
}

/// External segmentation collaborator. Implementations may run inference on
/// any device with any internal concurrency; the pipeline only calls
/// `segment` and may do so from several worker threads at once.
pub trait Segmenter: Send + Sync {
    fn name(&self) -> &str;

    fn segment(&self, frame: &ColorFrame) -> Result<Segmentation>;
}

/// Deterministic keyer: foreground where luminance is above `level`
/// (or at/below it when `invert` is set).
#[derive(Clone, Debug)]
pub struct LumaKeySegmenter {
    pub level: u8,
    pub invert: bool,
}

impl Segmenter for LumaKeySegmenter {
    fn name(&self) -> &str {
        "luma-key"
    }

    fn segment(&self, frame: &ColorFrame) -> Result<Segmentation> {
        let luma = frame.luminance();
        let keyed = luma.data.mapv(|v| {
            if (v > self.level) != self.invert {
                MATTE_ON
            } else {
                MATTE_OFF
            }
        });
        Ok(Segmentation {
            mask: Mask::new(keyed),
            confidence: None,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SegmentConfig {
    /// Pixels whose confidence is below this value are forced to background.
    #[serde(default)]
    pub confidence_threshold: Option<f32>,
    #[serde(default = "default_segment_cleanup")]
    pub cleanup: MorphologyConfig,
}

fn default_segment_cleanup() -> MorphologyConfig {
    MorphologyConfig::close_only(DEFAULT_SEGMENT_CLOSE_KERNEL)
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: None,
            cleanup: default_segment_cleanup(),
        }
    }
}

/// Turn a raw segmentation into a clean binary mask.
pub fn postprocess(segmentation: &Segmentation, config: &SegmentConfig) -> Result<Mask> {
    let mut mask = binarize(&segmentation.mask, DEFAULT_BINARY_THRESHOLD);

    if let (Some(threshold), Some(confidence)) =
        (config.confidence_threshold, segmentation.confidence.as_ref())
    {
        if confidence.dim() != mask.dim() {
            return Err(RotoError::Collaborator(format!(
                "confidence map {:?} does not match mask {:?}",
                confidence.dim(),
                mask.dim()
            )));
        }
        mask.data.zip_mut_with(confidence, |m, &c| {
            if c < threshold {
                *m = MATTE_OFF;
            }
        });
    }

    Ok(cleanup(&mask, &config.cleanup))
}
