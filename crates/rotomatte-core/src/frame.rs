use ndarray::{s, Array2, Array3, Axis};

use crate::consts::{LUMINANCE_B, LUMINANCE_G, LUMINANCE_R, MATTE_OFF, MATTE_ON};
use crate::error::{Result, RotoError};

/// Temporal position of a frame, shared by every stage of a run.
pub type FrameIndex = u32;

/// A single-channel 8-bit signal: segmentation mask, motion map or matte.
/// 0 = background / transparent, 255 = foreground / opaque.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mask {
    /// Pixel data, row-major, shape = (height, width)
    pub data: Array2<u8>,
}

impl Mask {
    pub fn new(data: Array2<u8>) -> Self {
        Self { data }
    }

    /// A mask of the given shape with every pixel set to `value`.
    pub fn filled(height: usize, width: usize, value: u8) -> Self {
        Self::new(Array2::from_elem((height, width), value))
    }

    pub fn width(&self) -> usize {
        self.data.ncols()
    }

    pub fn height(&self) -> usize {
        self.data.nrows()
    }

    /// (height, width)
    pub fn dim(&self) -> (usize, usize) {
        self.data.dim()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// True when every pixel is exactly 0 or 255.
    pub fn is_binary(&self) -> bool {
        self.data.iter().all(|&v| v == MATTE_OFF || v == MATTE_ON)
    }

    /// Fail with `ShapeIrreconcilable` when the mask has no pixels.
    pub fn require_area(&self) -> Result<()> {
        if self.is_empty() {
            return Err(RotoError::ShapeIrreconcilable {
                width: self.width(),
                height: self.height(),
            });
        }
        Ok(())
    }
}

/// Interleaved 8-bit RGB frame, shape = (height, width, 3).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColorFrame {
    pub data: Array3<u8>,
}

impl ColorFrame {
    pub fn new(data: Array3<u8>) -> Result<Self> {
        check_channels(&data, 3)?;
        Ok(Self { data })
    }

    pub fn filled(height: usize, width: usize, rgb: [u8; 3]) -> Self {
        let data = Array3::from_shape_fn((height, width, 3), |(_, _, c)| rgb[c]);
        Self { data }
    }

    pub fn width(&self) -> usize {
        self.data.dim().1
    }

    pub fn height(&self) -> usize {
        self.data.dim().0
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Single channel `c` (0 = R, 1 = G, 2 = B) as a mask-shaped array.
    pub fn channel(&self, c: usize) -> Array2<u8> {
        self.data.index_axis(Axis(2), c).to_owned()
    }

    /// BT.601 luminance, rounded to the nearest integer.
    pub fn luminance(&self) -> Mask {
        let (h, w, _) = self.data.dim();
        Mask::new(Array2::from_shape_fn((h, w), |(row, col)| {
            luma(
                self.data[[row, col, 0]],
                self.data[[row, col, 1]],
                self.data[[row, col, 2]],
            )
        }))
    }
}

/// Interleaved 8-bit RGBA cutout, shape = (height, width, 4).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CutoutFrame {
    pub data: Array3<u8>,
}

impl CutoutFrame {
    pub fn new(data: Array3<u8>) -> Result<Self> {
        check_channels(&data, 4)?;
        Ok(Self { data })
    }

    /// Assemble a cutout from a color frame and an alpha channel of the same shape.
    pub fn from_parts(color: &ColorFrame, alpha: &Mask) -> Result<Self> {
        let (h, w, _) = color.data.dim();
        if alpha.dim() != (h, w) {
            return Err(RotoError::InvalidInput(format!(
                "alpha {}x{} does not match color {}x{}",
                alpha.width(),
                alpha.height(),
                w,
                h
            )));
        }
        let mut data = Array3::<u8>::zeros((h, w, 4));
        data.slice_mut(s![.., .., 0..3]).assign(&color.data);
        data.index_axis_mut(Axis(2), 3).assign(&alpha.data);
        Ok(Self { data })
    }

    pub fn width(&self) -> usize {
        self.data.dim().1
    }

    pub fn height(&self) -> usize {
        self.data.dim().0
    }

    pub fn alpha(&self) -> Mask {
        Mask::new(self.data.index_axis(Axis(2), 3).to_owned())
    }

    pub fn color(&self) -> ColorFrame {
        ColorFrame {
            data: self.data.slice(s![.., .., 0..3]).to_owned(),
        }
    }

    pub fn set_alpha(&mut self, alpha: &Mask) {
        self.data.index_axis_mut(Axis(2), 3).assign(&alpha.data);
    }
}

/// Any image a stage can persist, tagged by channel layout.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ImageSignal {
    Gray(Mask),
    Color(ColorFrame),
    Rgba(CutoutFrame),
}

impl ImageSignal {
    pub fn channels(&self) -> usize {
        match self {
            Self::Gray(_) => 1,
            Self::Color(_) => 3,
            Self::Rgba(_) => 4,
        }
    }

    pub fn width(&self) -> usize {
        match self {
            Self::Gray(m) => m.width(),
            Self::Color(c) => c.width(),
            Self::Rgba(c) => c.width(),
        }
    }

    pub fn height(&self) -> usize {
        match self {
            Self::Gray(m) => m.height(),
            Self::Color(c) => c.height(),
            Self::Rgba(c) => c.height(),
        }
    }

    /// Grayscale view: luminance of the color channels, alpha ignored.
    pub fn to_mask(&self) -> Mask {
        match self {
            Self::Gray(m) => m.clone(),
            Self::Color(c) => c.luminance(),
            Self::Rgba(c) => c.color().luminance(),
        }
    }

    /// Color view: gray is replicated into three channels, alpha is dropped.
    pub fn to_color(&self) -> ColorFrame {
        match self {
            Self::Gray(m) => {
                let (h, w) = m.dim();
                ColorFrame {
                    data: Array3::from_shape_fn((h, w, 3), |(row, col, _)| m.data[[row, col]]),
                }
            }
            Self::Color(c) => c.clone(),
            Self::Rgba(c) => c.color(),
        }
    }

    /// Require a 4-channel signal.
    pub fn into_cutout(self) -> Result<CutoutFrame> {
        match self {
            Self::Rgba(c) => Ok(c),
            other => Err(RotoError::InvalidInput(format!(
                "expected 4 channels, got {}",
                other.channels()
            ))),
        }
    }
}

impl From<Mask> for ImageSignal {
    fn from(m: Mask) -> Self {
        Self::Gray(m)
    }
}

impl From<ColorFrame> for ImageSignal {
    fn from(c: ColorFrame) -> Self {
        Self::Color(c)
    }
}

impl From<CutoutFrame> for ImageSignal {
    fn from(c: CutoutFrame) -> Self {
        Self::Rgba(c)
    }
}

fn check_channels(data: &Array3<u8>, expected: usize) -> Result<()> {
    let channels = data.dim().2;
    if channels != expected {
        return Err(RotoError::InvalidInput(format!(
            "expected {expected} channels, got {channels}"
        )));
    }
    Ok(())
}

fn luma(r: u8, g: u8, b: u8) -> u8 {
    let y = LUMINANCE_R * r as f32 + LUMINANCE_G * g as f32 + LUMINANCE_B * b as f32;
    y.round().clamp(0.0, 255.0) as u8
}
