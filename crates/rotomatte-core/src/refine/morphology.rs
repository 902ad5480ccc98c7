use ndarray::{Array2, Axis};

use crate::frame::Mask;

use super::config::MorphologyConfig;

/// Grayscale erosion with a `kernel` x `kernel` square: each pixel becomes
/// the minimum of its neighbourhood. Out-of-bounds neighbours are ignored,
/// so foreground touching the image border is not eaten away.
pub fn erode(mask: &Mask, kernel: usize, iterations: usize) -> Mask {
    repeat(mask, kernel, iterations, u8::min)
}

/// Grayscale dilation with a square kernel: each pixel becomes the maximum
/// of its neighbourhood. Out-of-bounds neighbours are ignored.
pub fn dilate(mask: &Mask, kernel: usize, iterations: usize) -> Mask {
    repeat(mask, kernel, iterations, u8::max)
}

/// Closing (dilate then erode): fills holes and bridges gaps narrower than
/// the kernel.
pub fn close(mask: &Mask, kernel: usize) -> Mask {
    erode(&dilate(mask, kernel, 1), kernel, 1)
}

/// Opening (erode then dilate): removes specks smaller than the kernel.
pub fn open(mask: &Mask, kernel: usize) -> Mask {
    dilate(&erode(mask, kernel, 1), kernel, 1)
}

/// Close, then open. Closing first fills interior holes before opening
/// strips isolated noise.
pub fn cleanup(mask: &Mask, config: &MorphologyConfig) -> Mask {
    let closed = close(mask, config.close_kernel);
    open(&closed, config.open_kernel)
}

fn repeat(mask: &Mask, kernel: usize, iterations: usize, pick: fn(u8, u8) -> u8) -> Mask {
    if kernel <= 1 || iterations == 0 || mask.is_empty() {
        return mask.clone();
    }
    let mut data = mask.data.clone();
    for _ in 0..iterations {
        // A square element is separable into a row pass and a column pass.
        let rows = extremum_pass(&data, kernel, Axis(1), pick);
        data = extremum_pass(&rows, kernel, Axis(0), pick);
    }
    Mask::new(data)
}

/// 1D min/max filter along `axis`. The window spans
/// [-(kernel / 2), kernel - 1 - kernel / 2] around each pixel.
fn extremum_pass(
    data: &Array2<u8>,
    kernel: usize,
    axis: Axis,
    pick: fn(u8, u8) -> u8,
) -> Array2<u8> {
    let (h, w) = data.dim();
    let before = (kernel / 2) as isize;
    let after = (kernel - 1 - kernel / 2) as isize;

    Array2::from_shape_fn((h, w), |(row, col)| {
        let (pos, len) = if axis == Axis(1) {
            (col as isize, w as isize)
        } else {
            (row as isize, h as isize)
        };
        let lo = (pos - before).max(0);
        let hi = (pos + after).min(len - 1);
        let mut acc = data[[row, col]];
        for p in lo..=hi {
            let v = if axis == Axis(1) {
                data[[row, p as usize]]
            } else {
                data[[p as usize, col]]
            };
            acc = pick(acc, v);
        }
        acc
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(h: usize, w: usize, r0: usize, r1: usize, c0: usize, c1: usize) -> Mask {
        Mask::new(Array2::from_shape_fn((h, w), |(r, c)| {
            if (r0..r1).contains(&r) && (c0..c1).contains(&c) {
                255
            } else {
                0
            }
        }))
    }

    #[test]
    fn test_erode_shrinks_interior_block() {
        let m = block(10, 10, 2, 8, 2, 8);
        let e = erode(&m, 3, 1);
        assert_eq!(e.data.iter().filter(|&&v| v == 255).count(), 16);
        assert_eq!(e.data[[3, 3]], 255);
        assert_eq!(e.data[[2, 2]], 0);
    }

    #[test]
    fn test_erode_keeps_border_foreground() {
        let m = Mask::filled(5, 5, 255);
        assert_eq!(erode(&m, 3, 1), m);
    }

    #[test]
    fn test_dilate_grows_single_pixel() {
        let m = block(7, 7, 3, 4, 3, 4);
        let d = dilate(&m, 3, 1);
        assert_eq!(d, block(7, 7, 2, 5, 2, 5));
    }

    #[test]
    fn test_kernel_one_is_identity() {
        let m = block(6, 6, 1, 3, 1, 3);
        assert_eq!(close(&m, 1), m);
        assert_eq!(open(&m, 0), m);
    }
}
