use image::imageops::{self, FilterType};
use ndarray::{Array2, Array3};

use crate::error::Result;
use crate::frame::{ColorFrame, Mask};
use crate::io::image_io::{color_to_rgb, rgb_to_color};

/// Nearest-neighbour source coordinate: floor(dst * src / dst_len).
#[inline]
fn nearest(dst: usize, src_len: usize, dst_len: usize) -> usize {
    ((dst * src_len) / dst_len).min(src_len - 1)
}

/// Nearest-neighbour resize. Never introduces values absent from the input,
/// so a binary mask stays binary. The source must have non-zero area.
pub fn resize_nearest(mask: &Mask, height: usize, width: usize) -> Mask {
    let (src_h, src_w) = mask.dim();
    if (src_h, src_w) == (height, width) {
        return mask.clone();
    }
    Mask::new(Array2::from_shape_fn((height, width), |(row, col)| {
        mask.data[[nearest(row, src_h, height), nearest(col, src_w, width)]]
    }))
}

/// Nearest-neighbour resize of a color frame.
pub fn resize_color_nearest(color: &ColorFrame, height: usize, width: usize) -> ColorFrame {
    let (src_h, src_w, _) = color.data.dim();
    if (src_h, src_w) == (height, width) {
        return color.clone();
    }
    ColorFrame {
        data: Array3::from_shape_fn((height, width, 3), |(row, col, c)| {
            color.data[[nearest(row, src_h, height), nearest(col, src_w, width), c]]
        }),
    }
}

/// Smooth (triangle filter) resize, for photographic plates only.
pub fn resize_color_smooth(color: &ColorFrame, height: usize, width: usize) -> Result<ColorFrame> {
    if (color.height(), color.width()) == (height, width) {
        return Ok(color.clone());
    }
    let rgb = color_to_rgb(color)?;
    let resized = imageops::resize(&rgb, width as u32, height as u32, FilterType::Triangle);
    Ok(rgb_to_color(&resized))
}
