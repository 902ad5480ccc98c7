use crate::frame::FrameIndex;

/// Minimum pixel count (h*w) to use row-level Rayon parallelism.
pub const PARALLEL_PIXEL_THRESHOLD: usize = 65_536;

/// Minimum frame count to use frame-level Rayon parallelism.
pub const PARALLEL_FRAME_THRESHOLD: usize = 4;

/// ITU-R BT.601 luminance coefficient for the red channel.
pub const LUMINANCE_R: f32 = 0.299;

/// ITU-R BT.601 luminance coefficient for the green channel.
pub const LUMINANCE_G: f32 = 0.587;

/// ITU-R BT.601 luminance coefficient for the blue channel.
pub const LUMINANCE_B: f32 = 0.114;

/// Fully opaque / foreground value of an 8-bit matte.
pub const MATTE_ON: u8 = 255;

/// Fully transparent / background value of an 8-bit matte.
pub const MATTE_OFF: u8 = 0;

/// Global binarization threshold: values strictly above it become 255.
pub const DEFAULT_BINARY_THRESHOLD: u8 = 127;

/// Block size (odd) of the Gaussian-weighted adaptive threshold.
pub const DEFAULT_ADAPTIVE_BLOCK_SIZE: usize = 11;

/// Constant subtracted from the local weighted mean in adaptive thresholding.
pub const DEFAULT_ADAPTIVE_OFFSET: f32 = 2.0;

/// Closing kernel side used by the refinement pass ("smooth jagged edges").
pub const DEFAULT_CLOSE_KERNEL: usize = 3;

/// Opening kernel side used by the refinement pass.
pub const DEFAULT_OPEN_KERNEL: usize = 3;

/// Closing kernel side used on cutout mattes ("connect disjoint regions").
pub const DEFAULT_CUTOUT_CLOSE_KERNEL: usize = 15;

/// Closing kernel side applied to raw segmentation output.
pub const DEFAULT_SEGMENT_CLOSE_KERNEL: usize = 5;

/// Sigma equivalent to a 5x5 Gaussian kernel with automatic sigma
/// (0.3 * ((5 - 1) * 0.5 - 1) + 0.8).
pub const DEFAULT_FEATHER_SIGMA: f32 = 1.1;

/// Canny thresholds on the color channels.
pub const DEFAULT_COLOR_EDGE_LOW: f32 = 100.0;
pub const DEFAULT_COLOR_EDGE_HIGH: f32 = 200.0;

/// Canny thresholds on the alpha channel.
pub const DEFAULT_ALPHA_EDGE_LOW: f32 = 50.0;
pub const DEFAULT_ALPHA_EDGE_HIGH: f32 = 150.0;

/// Fraction of the normalized, alpha-weighted feather signal removed from alpha.
pub const DEFAULT_FEATHER_STRENGTH: f32 = 0.3;

/// Blend weight of the matte in an inspection overlay.
pub const DEFAULT_OVERLAY_WEIGHT: f32 = 0.5;

/// Zero-padded width of the numeric frame suffix.
pub const DEFAULT_FRAME_WIDTH: usize = 4;

/// Index of the first frame produced by the motion extractor.
pub const DEFAULT_FRAME_ORIGIN: FrameIndex = 1;

/// Image extensions recognised when enumerating a stage directory.
pub const RECOGNISED_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];
