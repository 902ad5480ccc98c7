use ndarray::Array2;
use tempfile::TempDir;

use rotomatte_core::frame::{ColorFrame, CutoutFrame, FrameIndex, ImageSignal, Mask};
use rotomatte_core::io::{FrameLayout, FrameStore};

/// Mask of `value` with an axis-aligned block of `block` starting at
/// (`top`, `left`).
pub fn block_mask(
    h: usize,
    w: usize,
    value: u8,
    top: usize,
    left: usize,
    size: usize,
    block: u8,
) -> Mask {
    Mask::new(Array2::from_shape_fn((h, w), |(r, c)| {
        if r >= top && r < top + size && c >= left && c < left + size {
            block
        } else {
            value
        }
    }))
}

/// Color frame whose pixel values depend on position, so channel mix-ups show.
pub fn gradient_color(h: usize, w: usize) -> ColorFrame {
    let mut frame = ColorFrame::filled(h, w, [0, 0, 0]);
    for ((r, c, ch), v) in frame.data.indexed_iter_mut() {
        *v = ((r * 7 + c * 3 + ch * 50) % 256) as u8;
    }
    frame
}

/// RGBA cutout: `color` everywhere, alpha 255 inside a centered square.
pub fn square_cutout(h: usize, w: usize, color: [u8; 3], size: usize) -> CutoutFrame {
    let alpha = block_mask(h, w, 0, (h - size) / 2, (w - size) / 2, size, 255);
    CutoutFrame::from_parts(&ColorFrame::filled(h, w, color), &alpha).unwrap()
}

/// Temporary frame store using the default layout.
pub fn temp_store() -> (TempDir, FrameStore) {
    let dir = TempDir::new().unwrap();
    let store = FrameStore::new(dir.path().join("output"), FrameLayout::default());
    (dir, store)
}

pub fn put(store: &FrameStore, stage: &str, index: FrameIndex, signal: impl Into<ImageSignal>) {
    store.store(stage, index, &signal.into()).unwrap();
}

pub fn load_mask(store: &FrameStore, stage: &str, index: FrameIndex) -> Mask {
    store.load(stage, index).unwrap().to_mask()
}

pub fn count_value(mask: &Mask, value: u8) -> usize {
    mask.data.iter().filter(|&&v| v == value).count()
}
