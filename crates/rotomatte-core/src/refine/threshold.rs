use crate::consts::{MATTE_OFF, MATTE_ON};
use crate::error::{Result, RotoError};
use crate::filters::gaussian_blur::gaussian_blur_array;
use crate::frame::Mask;

use super::config::ThresholdMethod;

/// Global threshold: values strictly above `level` become 255, the rest 0.
pub fn binarize(mask: &Mask, level: u8) -> Mask {
    Mask::new(mask.data.mapv(|v| if v > level { MATTE_ON } else { MATTE_OFF }))
}

/// Gaussian-weighted adaptive threshold.
///
/// The local mean uses sigma = 0.3 * ((block_size - 1) * 0.5 - 1) + 0.8 with
/// replicated borders; a pixel is foreground when it is strictly greater
/// than that mean minus `offset`.
pub fn adaptive_threshold(mask: &Mask, block_size: usize, offset: f32) -> Result<Mask> {
    if block_size < 3 || block_size % 2 == 0 {
        return Err(RotoError::InvalidInput(format!(
            "adaptive block size must be odd and >= 3, got {block_size}"
        )));
    }
    let sigma = 0.3 * ((block_size as f32 - 1.0) * 0.5 - 1.0) + 0.8;
    let src = mask.data.mapv(f32::from);
    let mean = gaussian_blur_array(&src, sigma);
    let mut out = mask.data.clone();
    ndarray::Zip::from(&mut out)
        .and(&src)
        .and(&mean)
        .for_each(|o, &v, &m| {
            *o = if v > m - offset { MATTE_ON } else { MATTE_OFF };
        });
    Ok(Mask::new(out))
}

/// Apply the configured threshold method.
pub fn apply_threshold(mask: &Mask, method: &ThresholdMethod) -> Result<Mask> {
    match method {
        ThresholdMethod::Global { level } => Ok(binarize(mask, *level)),
        ThresholdMethod::Adaptive { block_size, offset } => {
            adaptive_threshold(mask, *block_size, *offset)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binarize_boundary() {
        let mut m = Mask::filled(1, 3, 127);
        m.data[[0, 1]] = 128;
        m.data[[0, 2]] = 255;
        let b = binarize(&m, 127);
        assert_eq!(b.data.as_slice().unwrap(), &[0, 255, 255]);
    }

    #[test]
    fn test_adaptive_rejects_even_block() {
        let m = Mask::filled(4, 4, 10);
        assert!(adaptive_threshold(&m, 4, 2.0).is_err());
    }

    #[test]
    fn test_adaptive_uniform_is_foreground() {
        // v > v - offset for any positive offset.
        let m = Mask::filled(8, 8, 90);
        let t = adaptive_threshold(&m, 11, 2.0).unwrap();
        assert!(t.data.iter().all(|&v| v == 255));
    }
}
