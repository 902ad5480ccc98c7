#[allow(dead_code)]
mod common;

use rotomatte_core::composite::{
    composite, composite_with_background, overlay, prepare_matte, subtract,
};
use rotomatte_core::error::RotoError;
use rotomatte_core::filters::resize::resize_nearest;
use rotomatte_core::frame::{ColorFrame, Mask};
use rotomatte_core::refine::MorphologyConfig;

use common::{block_mask, count_value, gradient_color};

// ---------------------------------------------------------------------------
// composite
// ---------------------------------------------------------------------------

#[test]
fn test_composite_alpha_equals_matte() {
    let color = gradient_color(20, 30);
    let matte = block_mask(20, 30, 0, 4, 6, 10, 255);
    let cutout = composite(&color, &matte).unwrap();
    assert_eq!(cutout.alpha(), matte);
    assert_eq!(cutout.color(), color);
}

#[test]
fn test_composite_reconciles_matte_shape() {
    let color = gradient_color(20, 30);
    let matte = block_mask(10, 15, 0, 2, 3, 5, 255);
    let cutout = composite(&color, &matte).unwrap();
    assert_eq!(cutout.alpha(), resize_nearest(&matte, 20, 30));
    assert!(cutout.alpha().is_binary());
}

#[test]
fn test_composite_uses_matte_verbatim() {
    let color = ColorFrame::filled(4, 4, [10, 20, 30]);
    let matte = Mask::filled(4, 4, 90);
    let cutout = composite(&color, &matte).unwrap();
    assert!(cutout.alpha().data.iter().all(|&a| a == 90));
}

#[test]
fn test_composite_zero_area_color_is_irreconcilable() {
    let color = ColorFrame::filled(0, 5, [0, 0, 0]);
    let result = composite(&color, &Mask::filled(3, 3, 255));
    assert!(matches!(result, Err(RotoError::ShapeIrreconcilable { .. })));
}

// ---------------------------------------------------------------------------
// prepare_matte
// ---------------------------------------------------------------------------

#[test]
fn test_prepare_matte_connects_nearby_regions() {
    // Two blocks separated by a 4-pixel gap.
    let mut matte = block_mask(40, 40, 0, 10, 5, 10, 200);
    for r in 10..20 {
        for c in 19..29 {
            matte.data[[r, c]] = 200;
        }
    }
    let prepared = prepare_matte(&matte, &MorphologyConfig::close_only(15));
    assert!(prepared.is_binary());
    for c in 15..19 {
        assert_eq!(prepared.data[[14, c]], 255, "gap column {c} not bridged");
    }
}

#[test]
fn test_prepare_matte_binarizes_soft_values() {
    let matte = block_mask(10, 10, 100, 0, 0, 5, 128);
    let prepared = prepare_matte(&matte, &MorphologyConfig::close_only(0));
    assert_eq!(count_value(&prepared, 255), 25);
    assert_eq!(count_value(&prepared, 0), 75);
}

// ---------------------------------------------------------------------------
// composite_with_background
// ---------------------------------------------------------------------------

#[test]
fn test_background_substitution_with_binary_matte() {
    let color = gradient_color(16, 16);
    let plate = ColorFrame::filled(16, 16, [0, 200, 0]);
    let matte = block_mask(16, 16, 0, 4, 4, 8, 255);
    let out = composite_with_background(&color, &matte, &plate).unwrap();
    for ((r, c, ch), &v) in out.data.indexed_iter() {
        if matte.data[[r, c]] == 255 {
            assert_eq!(v, color.data[[r, c, ch]]);
        } else {
            assert_eq!(v, plate.data[[r, c, ch]]);
        }
    }
}

#[test]
fn test_background_does_not_leak_into_foreground() {
    let color = gradient_color(12, 12);
    let matte = block_mask(12, 12, 0, 2, 2, 6, 255);
    let black = ColorFrame::filled(12, 12, [0, 0, 0]);
    let a = composite_with_background(&color, &matte, &black).unwrap();
    let plate = ColorFrame::filled(12, 12, [255, 9, 77]);
    let b = composite_with_background(&color, &matte, &plate).unwrap();
    for r in 2..8 {
        for c in 2..8 {
            for ch in 0..3 {
                assert_eq!(a.data[[r, c, ch]], b.data[[r, c, ch]]);
            }
        }
    }
}

#[test]
fn test_background_plate_is_resized() {
    let color = gradient_color(20, 10);
    let plate = ColorFrame::filled(7, 33, [50, 60, 70]);
    let matte = Mask::filled(5, 5, 255);
    let out = composite_with_background(&color, &matte, &plate).unwrap();
    assert_eq!(out.data.dim(), (20, 10, 3));
    assert_eq!(out, color);
}

#[test]
fn test_background_rejects_empty_plate() {
    let color = gradient_color(4, 4);
    let plate = ColorFrame::filled(0, 0, [0, 0, 0]);
    let result = composite_with_background(&color, &Mask::filled(4, 4, 255), &plate);
    assert!(matches!(result, Err(RotoError::InvalidInput(_))));
}

// ---------------------------------------------------------------------------
// subtract / overlay
// ---------------------------------------------------------------------------

#[test]
fn test_subtract_blacks_out_matted_area() {
    let color = ColorFrame::filled(10, 10, [40, 80, 120]);
    let matte = block_mask(10, 10, 0, 0, 0, 5, 255);
    let out = subtract(&color, &matte).unwrap();
    assert_eq!(out.data[[2, 2, 1]], 0);
    assert_eq!(out.data[[7, 7, 1]], 80);
}

#[test]
fn test_overlay_blends_half_and_half() {
    let base = Mask::filled(8, 8, 100);
    let matte = block_mask(8, 8, 0, 0, 0, 4, 255);
    let out = overlay(&base, &matte, 0.5).unwrap();
    assert_eq!(out.data[[1, 1]], 178);
    assert_eq!(out.data[[6, 6]], 50);
}

#[test]
fn test_overlay_rejects_bad_weight() {
    let base = Mask::filled(2, 2, 0);
    assert!(overlay(&base, &base, 1.5).is_err());
}
