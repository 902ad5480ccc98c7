use std::io::Cursor;
use std::path::Path;

use image::{DynamicImage, GrayImage, ImageFormat, RgbImage, RgbaImage};
use ndarray::{Array2, Array3};

use crate::error::{Result, RotoError};
use crate::frame::{ColorFrame, CutoutFrame, ImageSignal, Mask};

/// Convert a mask into an `image` grayscale buffer.
pub fn mask_to_gray(mask: &Mask) -> Result<GrayImage> {
    let (h, w) = mask.dim();
    let pixels: Vec<u8> = mask.data.iter().copied().collect();
    GrayImage::from_raw(w as u32, h as u32, pixels)
        .ok_or_else(|| RotoError::InvalidInput(format!("buffer does not fit {w}x{h}")))
}

/// Convert an `image` grayscale buffer into a mask.
pub fn gray_to_mask(img: &GrayImage) -> Mask {
    let (w, h) = img.dimensions();
    Mask::new(Array2::from_shape_fn((h as usize, w as usize), |(row, col)| {
        img.get_pixel(col as u32, row as u32).0[0]
    }))
}

pub fn color_to_rgb(color: &ColorFrame) -> Result<RgbImage> {
    let (h, w, _) = color.data.dim();
    let pixels: Vec<u8> = color.data.iter().copied().collect();
    RgbImage::from_raw(w as u32, h as u32, pixels)
        .ok_or_else(|| RotoError::InvalidInput(format!("buffer does not fit {w}x{h}x3")))
}

pub fn rgb_to_color(img: &RgbImage) -> ColorFrame {
    let (w, h) = img.dimensions();
    ColorFrame {
        data: Array3::from_shape_fn((h as usize, w as usize, 3), |(row, col, c)| {
            img.get_pixel(col as u32, row as u32).0[c]
        }),
    }
}

pub fn cutout_to_rgba(cutout: &CutoutFrame) -> Result<RgbaImage> {
    let (h, w, _) = cutout.data.dim();
    let pixels: Vec<u8> = cutout.data.iter().copied().collect();
    RgbaImage::from_raw(w as u32, h as u32, pixels)
        .ok_or_else(|| RotoError::InvalidInput(format!("buffer does not fit {w}x{h}x4")))
}

pub fn rgba_to_cutout(img: &RgbaImage) -> CutoutFrame {
    let (w, h) = img.dimensions();
    CutoutFrame {
        data: Array3::from_shape_fn((h as usize, w as usize, 4), |(row, col, c)| {
            img.get_pixel(col as u32, row as u32).0[c]
        }),
    }
}

/// Classify a decoded image by channel layout. Anything with alpha becomes
/// RGBA, single-channel images stay gray, everything else is RGB.
pub fn signal_from_dynamic(img: DynamicImage) -> ImageSignal {
    let color = img.color();
    if color.has_alpha() {
        ImageSignal::Rgba(rgba_to_cutout(&img.to_rgba8()))
    } else if color.channel_count() == 1 {
        ImageSignal::Gray(gray_to_mask(&img.to_luma8()))
    } else {
        ImageSignal::Color(rgb_to_color(&img.to_rgb8()))
    }
}

pub fn signal_to_dynamic(signal: &ImageSignal) -> Result<DynamicImage> {
    Ok(match signal {
        ImageSignal::Gray(m) => DynamicImage::ImageLuma8(mask_to_gray(m)?),
        ImageSignal::Color(c) => DynamicImage::ImageRgb8(color_to_rgb(c)?),
        ImageSignal::Rgba(c) => DynamicImage::ImageRgba8(cutout_to_rgba(c)?),
    })
}

/// Decode an in-memory image file.
pub fn decode_signal(bytes: &[u8]) -> Result<ImageSignal> {
    let img = image::load_from_memory(bytes)?;
    Ok(signal_from_dynamic(img))
}

/// Encode a signal into an in-memory image file of the given format.
pub fn encode_signal(signal: &ImageSignal, format: ImageFormat) -> Result<Vec<u8>> {
    let img = signal_to_dynamic(signal)?;
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, format)?;
    Ok(buf.into_inner())
}

/// Load any supported image file.
pub fn load_signal(path: &Path) -> Result<ImageSignal> {
    let img = image::open(path)?;
    Ok(signal_from_dynamic(img))
}

/// Load an image file as a color frame (alpha dropped, gray replicated).
pub fn load_color(path: &Path) -> Result<ColorFrame> {
    Ok(load_signal(path)?.to_color())
}

/// Save a signal, choosing the format from the file extension.
pub fn save_signal(signal: &ImageSignal, path: &Path) -> Result<()> {
    let format = format_for_path(path)?;
    let bytes = encode_signal(signal, format)?;
    std::fs::write(path, bytes)?;
    Ok(())
}

pub fn format_for_path(path: &Path) -> Result<ImageFormat> {
    path.extension()
        .and_then(ImageFormat::from_extension)
        .ok_or_else(|| {
            RotoError::InvalidInput(format!("unsupported image extension: {}", path.display()))
        })
}
