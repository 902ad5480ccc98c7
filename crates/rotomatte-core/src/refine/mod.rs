pub mod config;
pub mod morphology;
pub mod threshold;

pub use config::{
    MissingMotionPolicy, MorphologyConfig, RefineConfig, SmoothingConfig, ThresholdMethod,
};

use crate::consts::{DEFAULT_BINARY_THRESHOLD, MATTE_ON};
use crate::error::{Result, RotoError};
use crate::filters::gaussian_blur::gaussian_blur_mask;
use crate::filters::resize::resize_nearest;
use crate::frame::Mask;

use morphology::cleanup;
use threshold::{apply_threshold, binarize};

/// Output of [`refine`].
#[derive(Clone, Debug)]
pub struct RefinedMatte {
    pub matte: Mask,
    /// The motion signal was absent and an all-white signal stood in for it.
    pub used_fallback: bool,
    /// Original (height, width) of the segmentation mask when it had to be
    /// resized to the motion signal's resolution.
    pub resized_from: Option<(usize, usize)>,
}

/// Bring the segmentation mask to the motion signal's resolution using
/// nearest-neighbour sampling.
pub fn reconcile(mask: &Mask, motion: &Mask) -> Result<Mask> {
    mask.require_area()?;
    motion.require_area()?;
    let (h, w) = motion.dim();
    Ok(resize_nearest(mask, h, w))
}

/// All-white stand-in for a missing motion signal, shaped like `mask`.
pub fn fallback_motion(mask: &Mask) -> Mask {
    let (h, w) = mask.dim();
    Mask::filled(h, w, MATTE_ON)
}

/// Per-pixel bitwise AND. Both inputs must already share a shape.
pub fn combine(a: &Mask, b: &Mask) -> Result<Mask> {
    if a.dim() != b.dim() {
        return Err(RotoError::InvalidInput(format!(
            "cannot combine {}x{} with {}x{}",
            a.width(),
            a.height(),
            b.width(),
            b.height()
        )));
    }
    let mut out = a.data.clone();
    ndarray::Zip::from(&mut out)
        .and(&b.data)
        .for_each(|o, &v| *o &= v);
    Ok(Mask::new(out))
}

/// Full refinement chain: fallback substitution, shape reconciliation,
/// combination, binarization, close-then-open cleanup and optional
/// smoothing.
pub fn refine(mask: &Mask, motion: Option<&Mask>, config: &RefineConfig) -> Result<RefinedMatte> {
    mask.require_area()?;

    let fallback;
    let (motion, used_fallback) = match motion {
        Some(m) => (m, false),
        None => {
            fallback = fallback_motion(mask);
            (&fallback, true)
        }
    };

    let resized_from = (mask.dim() != motion.dim()).then(|| mask.dim());
    let mask = reconcile(mask, motion)?;

    let combined = combine(&mask, motion)?;
    let binary = apply_threshold(&combined, &config.threshold)?;
    let mut matte = cleanup(&binary, &config.morphology);

    if let Some(ref smoothing) = config.smoothing {
        matte = gaussian_blur_mask(&matte, smoothing.sigma);
        if smoothing.rebinarize {
            matte = binarize(&matte, DEFAULT_BINARY_THRESHOLD);
        }
    }

    Ok(RefinedMatte {
        matte,
        used_fallback,
        resized_from,
    })
}
