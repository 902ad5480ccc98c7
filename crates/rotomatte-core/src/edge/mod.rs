//! Feathering of hard matte boundaries on RGBA cutouts.
//!
//! Edges are detected independently on the color channels and on the alpha
//! channel, unioned, widened by one 3x3 dilation, blurred and normalized to
//! [0, 1]. A fraction of that feather signal, weighted by the current alpha,
//! is then subtracted from alpha.

use image::GrayImage;
use imageproc::edges::canny;
use ndarray::Zip;
use serde::{Deserialize, Serialize};

use crate::consts::{
    DEFAULT_ALPHA_EDGE_HIGH, DEFAULT_ALPHA_EDGE_LOW, DEFAULT_COLOR_EDGE_HIGH,
    DEFAULT_COLOR_EDGE_LOW, DEFAULT_FEATHER_SIGMA, DEFAULT_FEATHER_STRENGTH,
};
use crate::error::{Result, RotoError};
use crate::filters::gaussian_blur::gaussian_blur_array;
use crate::frame::{CutoutFrame, ImageSignal, Mask};
use crate::io::image_io::{gray_to_mask, mask_to_gray};
use crate::refine::morphology::dilate;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EdgeConfig {
    #[serde(default = "default_color_low")]
    pub color_low: f32,
    #[serde(default = "default_color_high")]
    pub color_high: f32,
    #[serde(default = "default_alpha_low")]
    pub alpha_low: f32,
    #[serde(default = "default_alpha_high")]
    pub alpha_high: f32,
    /// Side of the square kernel used to widen the edge map.
    #[serde(default = "default_dilate_kernel")]
    pub dilate_kernel: usize,
    /// Blur applied to the widened edge map.
    #[serde(default = "default_sigma")]
    pub sigma: f32,
    /// Fraction of the feather signal removed from alpha.
    #[serde(default = "default_strength")]
    pub strength: f32,
}

fn default_color_low() -> f32 {
    DEFAULT_COLOR_EDGE_LOW
}
fn default_color_high() -> f32 {
    DEFAULT_COLOR_EDGE_HIGH
}
fn default_alpha_low() -> f32 {
    DEFAULT_ALPHA_EDGE_LOW
}
fn default_alpha_high() -> f32 {
    DEFAULT_ALPHA_EDGE_HIGH
}
fn default_dilate_kernel() -> usize {
    3
}
fn default_sigma() -> f32 {
    DEFAULT_FEATHER_SIGMA
}
fn default_strength() -> f32 {
    DEFAULT_FEATHER_STRENGTH
}

impl Default for EdgeConfig {
    fn default() -> Self {
        Self {
            color_low: DEFAULT_COLOR_EDGE_LOW,
            color_high: DEFAULT_COLOR_EDGE_HIGH,
            alpha_low: DEFAULT_ALPHA_EDGE_LOW,
            alpha_high: DEFAULT_ALPHA_EDGE_HIGH,
            dilate_kernel: default_dilate_kernel(),
            sigma: DEFAULT_FEATHER_SIGMA,
            strength: DEFAULT_FEATHER_STRENGTH,
        }
    }
}

impl EdgeConfig {
    pub fn validate(&self) -> Result<()> {
        for (name, low, high) in [
            ("color", self.color_low, self.color_high),
            ("alpha", self.alpha_low, self.alpha_high),
        ] {
            if !(low > 0.0 && high >= low) {
                return Err(RotoError::Config(format!(
                    "{name} edge thresholds need 0 < low <= high, got {low}/{high}"
                )));
            }
        }
        if !(0.0..=1.0).contains(&self.strength) {
            return Err(RotoError::Config(format!(
                "feather strength must be in [0, 1], got {}",
                self.strength
            )));
        }
        Ok(())
    }
}

/// Union of Canny edges over the R, G and B channels.
fn color_edges(cutout: &CutoutFrame, low: f32, high: f32) -> Result<Mask> {
    let color = cutout.color();
    let mut union = Mask::filled(cutout.height(), cutout.width(), 0);
    for c in 0..3 {
        let channel = mask_to_gray(&Mask::new(color.channel(c)))?;
        let edges = detect(&channel, low, high);
        union.data.zip_mut_with(&edges.data, |u, &e| *u |= e);
    }
    Ok(union)
}

fn detect(image: &GrayImage, low: f32, high: f32) -> Mask {
    gray_to_mask(&canny(image, low, high))
}

/// Soften the alpha boundary of an RGBA cutout. Color channels are kept.
pub fn refine_edges(cutout: &CutoutFrame, config: &EdgeConfig) -> Result<CutoutFrame> {
    config.validate()?;
    let alpha = cutout.alpha();
    alpha.require_area()?;

    let mut edges = color_edges(cutout, config.color_low, config.color_high)?;
    let alpha_edges = detect(&mask_to_gray(&alpha)?, config.alpha_low, config.alpha_high);
    edges.data.zip_mut_with(&alpha_edges.data, |u, &e| *u |= e);

    let widened = dilate(&edges, config.dilate_kernel, 1);
    let feather = gaussian_blur_array(&widened.data.mapv(f32::from), config.sigma);
    let max = feather.iter().copied().fold(0.0f32, f32::max);
    if max <= 0.0 {
        return Ok(cutout.clone());
    }

    let mut refined = alpha.data.clone();
    Zip::from(&mut refined)
        .and(&feather)
        .for_each(|a, &f| {
            let current = *a as f32;
            let value = current - config.strength * (f / max) * current;
            // Truncate like an 8-bit cast after clipping.
            *a = value.clamp(0.0, 255.0) as u8;
        });

    let mut out = cutout.clone();
    out.set_alpha(&Mask::new(refined));
    Ok(out)
}

/// Entry point for stored artifacts: rejects anything that is not RGBA.
pub fn refine_edge_signal(signal: ImageSignal, config: &EdgeConfig) -> Result<CutoutFrame> {
    let cutout = signal.into_cutout()?;
    refine_edges(&cutout, config)
}
