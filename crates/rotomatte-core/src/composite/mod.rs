use ndarray::{Array2, Array3};

use crate::consts::{DEFAULT_BINARY_THRESHOLD, MATTE_OFF};
use crate::error::{Result, RotoError};
use crate::filters::resize::{resize_color_smooth, resize_nearest};
use crate::frame::{ColorFrame, CutoutFrame, Mask};
use crate::refine::morphology::cleanup;
use crate::refine::threshold::binarize;
use crate::refine::MorphologyConfig;

fn require_color_area(color: &ColorFrame) -> Result<()> {
    if color.is_empty() {
        return Err(RotoError::ShapeIrreconcilable {
            width: color.width(),
            height: color.height(),
        });
    }
    Ok(())
}

/// Resize a matte to the color frame's resolution (nearest-neighbour).
fn matte_for(color: &ColorFrame, matte: &Mask) -> Result<Mask> {
    require_color_area(color)?;
    matte.require_area()?;
    Ok(resize_nearest(matte, color.height(), color.width()))
}

/// Prepare a matte for compositing: re-binarize at the global threshold and
/// close it to connect disjoint regions.
pub fn prepare_matte(matte: &Mask, cleanup_config: &MorphologyConfig) -> Mask {
    let binary = binarize(matte, DEFAULT_BINARY_THRESHOLD);
    cleanup(&binary, cleanup_config)
}

/// Attach `matte` as the alpha channel of `color`. The matte value is used
/// verbatim: 255 is opaque, 0 transparent.
pub fn composite(color: &ColorFrame, matte: &Mask) -> Result<CutoutFrame> {
    let alpha = matte_for(color, matte)?;
    CutoutFrame::from_parts(color, &alpha)
}

/// Replace the background of `color` with `background`, weighting by the
/// matte: `color * m + background * (255 - m)`, scaled by 1/255. For a
/// binary matte this is exactly foreground where the matte is set and
/// background elsewhere. The plate is resized to the color frame first.
pub fn composite_with_background(
    color: &ColorFrame,
    matte: &Mask,
    background: &ColorFrame,
) -> Result<ColorFrame> {
    let alpha = matte_for(color, matte)?;
    if background.is_empty() {
        return Err(RotoError::InvalidInput("background plate has zero area".into()));
    }
    let plate = resize_color_smooth(background, color.height(), color.width())?;

    let (h, w, _) = color.data.dim();
    let data = Array3::from_shape_fn((h, w, 3), |(row, col, c)| {
        let m = alpha.data[[row, col]] as u32;
        let fg = color.data[[row, col, c]] as u32 * m;
        let bg = plate.data[[row, col, c]] as u32 * (255 - m);
        ((fg + bg + 127) / 255) as u8
    });
    Ok(ColorFrame { data })
}

/// Keep only the area outside the matte: pixels where the (binarized)
/// matte is set are blacked out.
pub fn subtract(color: &ColorFrame, matte: &Mask) -> Result<ColorFrame> {
    let alpha = binarize(&matte_for(color, matte)?, DEFAULT_BINARY_THRESHOLD);
    let mut data = color.data.clone();
    for ((row, col, _), v) in data.indexed_iter_mut() {
        if alpha.data[[row, col]] != MATTE_OFF {
            *v = 0;
        }
    }
    Ok(ColorFrame { data })
}

/// Blend a matte over a grayscale base for visual inspection:
/// `base * (1 - weight) + matte * weight`.
pub fn overlay(base: &Mask, matte: &Mask, weight: f32) -> Result<Mask> {
    base.require_area()?;
    matte.require_area()?;
    if !(0.0..=1.0).contains(&weight) {
        return Err(RotoError::InvalidInput(format!(
            "overlay weight must be in [0, 1], got {weight}"
        )));
    }
    let (h, w) = base.dim();
    let matte = resize_nearest(matte, h, w);
    let data = Array2::from_shape_fn((h, w), |(row, col)| {
        let b = base.data[[row, col]] as f32;
        let m = matte.data[[row, col]] as f32;
        (b * (1.0 - weight) + m * weight).round().clamp(0.0, 255.0) as u8
    });
    Ok(Mask::new(data))
}
