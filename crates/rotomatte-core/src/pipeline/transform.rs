use tracing::warn;

use crate::composite::{composite, composite_with_background, overlay, prepare_matte, subtract};
use crate::edge::refine_edge_signal;
use crate::error::{Result, RotoError};
use crate::frame::{ColorFrame, FrameIndex, ImageSignal};
use crate::io::FrameStore;
use crate::refine::{refine, MissingMotionPolicy};
use crate::segment::{postprocess, Segmenter};

use super::config::StageKind;

/// Everything a stage needs besides its own definition.
pub(super) struct StageContext<'a> {
    pub store: &'a FrameStore,
    pub segmenter: Option<&'a dyn Segmenter>,
    /// Background plate, loaded once per stage.
    pub plate: Option<&'a ColorFrame>,
}

pub(super) struct FrameOutput {
    pub signal: ImageSignal,
    pub used_fallback: bool,
}

impl From<ImageSignal> for FrameOutput {
    fn from(signal: ImageSignal) -> Self {
        Self {
            signal,
            used_fallback: false,
        }
    }
}

/// Compute one frame of a stage from its upstream artifacts.
pub(super) fn transform_frame(
    kind: &StageKind,
    index: FrameIndex,
    ctx: &StageContext<'_>,
) -> Result<FrameOutput> {
    let store = ctx.store;
    match kind {
        StageKind::Refine {
            mask,
            motion,
            refine: config,
        } => {
            let mask_signal = store.load(mask, index)?.to_mask();
            let motion_signal = match store.load(motion, index) {
                Ok(signal) => Some(signal.to_mask()),
                Err(RotoError::ArtifactMissing { .. })
                    if config.missing_motion == MissingMotionPolicy::Fallback =>
                {
                    warn!(
                        stage = %motion,
                        index,
                        "Motion signal missing, using all-white fallback"
                    );
                    None
                }
                Err(e) => return Err(e),
            };
            let refined = refine(&mask_signal, motion_signal.as_ref(), config)?;
            Ok(FrameOutput {
                signal: refined.matte.into(),
                used_fallback: refined.used_fallback,
            })
        }
        StageKind::Cutout {
            color,
            matte,
            cleanup,
        } => {
            let matte = store.load(matte, index)?.to_mask();
            let color = store.load(color, index)?.to_color();
            let prepared = prepare_matte(&matte, cleanup);
            Ok(ImageSignal::from(composite(&color, &prepared)?).into())
        }
        StageKind::EdgeRefine { input, edges } => {
            let cutout = refine_edge_signal(store.load(input, index)?, edges)?;
            Ok(ImageSignal::from(cutout).into())
        }
        StageKind::Background { color, matte, .. } => {
            let plate = ctx
                .plate
                .ok_or_else(|| RotoError::Config("background plate not loaded".into()))?;
            let matte = store.load(matte, index)?.to_mask();
            let color = store.load(color, index)?.to_color();
            Ok(ImageSignal::from(composite_with_background(&color, &matte, plate)?).into())
        }
        StageKind::Subtract { color, matte } => {
            let matte = store.load(matte, index)?.to_mask();
            let color = store.load(color, index)?.to_color();
            Ok(ImageSignal::from(subtract(&color, &matte)?).into())
        }
        StageKind::Overlay {
            base,
            matte,
            weight,
        } => {
            let matte = store.load(matte, index)?.to_mask();
            let base = store.load(base, index)?.to_mask();
            Ok(ImageSignal::from(overlay(&base, &matte, *weight)?).into())
        }
        StageKind::Segment { frames, segment } => {
            let segmenter = ctx
                .segmenter
                .ok_or_else(|| RotoError::Config("no segmenter configured".into()))?;
            let frame = store.load(frames, index)?.to_color();
            let raw = segmenter.segment(&frame)?;
            if raw.mask.dim() != (frame.height(), frame.width()) {
                return Err(RotoError::Collaborator(format!(
                    "{} returned a {}x{} mask for a {}x{} frame",
                    segmenter.name(),
                    raw.mask.width(),
                    raw.mask.height(),
                    frame.width(),
                    frame.height()
                )));
            }
            Ok(ImageSignal::from(postprocess(&raw, segment)?).into())
        }
    }
}
