use ndarray::Array2;
use rayon::prelude::*;

use crate::consts::PARALLEL_PIXEL_THRESHOLD;
use crate::frame::Mask;

/// Blur an 8-bit mask, rounding back to integers. Non-positive sigma returns
/// the mask unchanged.
pub fn gaussian_blur_mask(mask: &Mask, sigma: f32) -> Mask {
    if sigma <= 0.0 || mask.is_empty() {
        return mask.clone();
    }
    let blurred = gaussian_blur_array(&mask.data.mapv(f32::from), sigma);
    Mask::new(blurred.mapv(|v| v.round().clamp(0.0, 255.0) as u8))
}

/// Apply Gaussian blur to a raw array using separable 1D convolution.
/// Borders are replicated.
pub fn gaussian_blur_array(data: &Array2<f32>, sigma: f32) -> Array2<f32> {
    if sigma <= 0.0 || data.is_empty() {
        return data.clone();
    }
    let kernel = make_gaussian_kernel(sigma);
    let row_pass = convolve(data, &kernel, Direction::Rows);
    convolve(&row_pass, &kernel, Direction::Cols)
}

fn make_gaussian_kernel(sigma: f32) -> Vec<f32> {
    let radius = (sigma * 3.0).ceil() as usize;
    let size = 2 * radius + 1;
    let mut kernel = vec![0.0f32; size];
    let s2 = 2.0 * sigma * sigma;
    let mut sum = 0.0f32;

    for (i, k) in kernel.iter_mut().enumerate() {
        let x = i as f32 - radius as f32;
        *k = (-x * x / s2).exp();
        sum += *k;
    }

    for v in &mut kernel {
        *v /= sum;
    }

    kernel
}

#[derive(Clone, Copy)]
enum Direction {
    Rows,
    Cols,
}

fn convolve(data: &Array2<f32>, kernel: &[f32], direction: Direction) -> Array2<f32> {
    let (h, w) = data.dim();
    let radius = kernel.len() as isize / 2;

    let sample = |row: usize, col: usize| -> f32 {
        let mut sum = 0.0f32;
        for (ki, &kv) in kernel.iter().enumerate() {
            let offset = ki as isize - radius;
            let v = match direction {
                Direction::Rows => {
                    let c = (col as isize + offset).clamp(0, w as isize - 1) as usize;
                    data[[row, c]]
                }
                Direction::Cols => {
                    let r = (row as isize + offset).clamp(0, h as isize - 1) as usize;
                    data[[r, col]]
                }
            };
            sum += v * kv;
        }
        sum
    };

    if h * w >= PARALLEL_PIXEL_THRESHOLD {
        let rows: Vec<Vec<f32>> = (0..h)
            .into_par_iter()
            .map(|row| (0..w).map(|col| sample(row, col)).collect())
            .collect();

        let mut result = Array2::<f32>::zeros((h, w));
        for (row, row_data) in rows.into_iter().enumerate() {
            for (col, val) in row_data.into_iter().enumerate() {
                result[[row, col]] = val;
            }
        }
        result
    } else {
        Array2::from_shape_fn((h, w), |(row, col)| sample(row, col))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kernel_is_normalized() {
        let k = make_gaussian_kernel(1.1);
        let sum: f32 = k.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
        assert_eq!(k.len(), 9);
    }
}
