#[allow(dead_code)]
mod common;

use std::fs;

use rotomatte_core::error::RotoError;
use rotomatte_core::frame::{ColorFrame, ImageSignal, Mask};
use rotomatte_core::io::image_io::{decode_signal, encode_signal};
use rotomatte_core::io::{FrameLayout, FrameStore, StoreOutcome};

use common::{block_mask, gradient_color, put, square_cutout, temp_store};

// ---------------------------------------------------------------------------
// Addressing
// ---------------------------------------------------------------------------

#[test]
fn test_frame_path_layout() {
    let store = FrameStore::new("/data/out", FrameLayout::default());
    assert_eq!(
        store.frame_path("refined_masks", 3),
        std::path::Path::new("/data/out/refined_masks/frame_0003.png")
    );
}

#[test]
fn test_list_frames_sorted_numerically() {
    let (_dir, store) = temp_store();
    for i in [10, 2, 1, 100] {
        put(&store, "masks", i, Mask::filled(2, 2, 255));
    }
    // Stray files are ignored.
    fs::write(store.stage_dir("masks").join("notes.txt"), b"x").unwrap();
    fs::write(store.stage_dir("masks").join("frame_0005.txt"), b"x").unwrap();
    assert_eq!(store.list_frames("masks"), vec![1, 2, 10, 100]);
}

#[test]
fn test_list_frames_of_missing_stage_is_empty() {
    let (_dir, store) = temp_store();
    assert!(store.list_frames("motion_vectors").is_empty());
}

#[test]
fn test_has_frame_accepts_other_extensions() {
    let (_dir, store) = temp_store();
    let dir = store.stage_dir("frames");
    fs::create_dir_all(&dir).unwrap();
    let bytes = encode_signal(
        &ImageSignal::Color(gradient_color(4, 4)),
        image::ImageFormat::Png,
    )
    .unwrap();
    fs::write(dir.join("frame_0007.jpg"), &bytes).unwrap();
    assert!(store.has_frame("frames", 7));
    assert!(!store.has_frame("frames", 8));
    assert_eq!(store.list_frames("frames"), vec![7]);
}

#[test]
fn test_listed_frames_are_loadable() {
    let (_dir, store) = temp_store();
    let dir = store.stage_dir("masks");
    fs::create_dir_all(&dir).unwrap();
    let bytes = encode_signal(
        &ImageSignal::Gray(Mask::filled(3, 3, 255)),
        image::ImageFormat::Png,
    )
    .unwrap();
    // Foreign paddings are not part of the layout.
    fs::write(dir.join("frame_1.png"), &bytes).unwrap();
    fs::write(dir.join("frame_00002.png"), &bytes).unwrap();
    // Wider than the padding, or an upper-case extension, still are.
    fs::write(dir.join("frame_12345.png"), &bytes).unwrap();
    fs::write(dir.join("frame_0007.PNG"), &bytes).unwrap();

    let listed = store.list_frames("masks");
    assert_eq!(listed, vec![7, 12345]);
    for index in listed {
        assert!(store.has_frame("masks", index));
        assert_eq!(
            store.load("masks", index).unwrap(),
            ImageSignal::Gray(Mask::filled(3, 3, 255))
        );
    }
    assert!(!store.has_frame("masks", 1));
    assert!(!store.has_frame("masks", 2));
}

// ---------------------------------------------------------------------------
// Load / store
// ---------------------------------------------------------------------------

#[test]
fn test_store_and_load_each_layout() {
    let (_dir, store) = temp_store();
    let gray = block_mask(6, 5, 0, 1, 1, 3, 255);
    let color = gradient_color(6, 5);
    let cutout = square_cutout(6, 6, [1, 2, 3], 2);
    put(&store, "a", 1, gray.clone());
    put(&store, "b", 1, color.clone());
    put(&store, "c", 1, cutout.clone());
    assert_eq!(store.load("a", 1).unwrap(), ImageSignal::Gray(gray));
    assert_eq!(store.load("b", 1).unwrap(), ImageSignal::Color(color));
    assert_eq!(store.load("c", 1).unwrap(), ImageSignal::Rgba(cutout));
}

#[test]
fn test_load_missing_artifact() {
    let (_dir, store) = temp_store();
    let err = store.load("masks", 4).unwrap_err();
    assert!(matches!(
        err,
        RotoError::ArtifactMissing { ref stage, index: 4 } if stage == "masks"
    ));
}

#[test]
fn test_load_unreadable_artifact() {
    let (_dir, store) = temp_store();
    fs::create_dir_all(store.stage_dir("masks")).unwrap();
    fs::write(store.frame_path("masks", 1), b"").unwrap();
    fs::write(store.frame_path("masks", 2), b"not a png at all").unwrap();
    assert!(matches!(
        store.load("masks", 1),
        Err(RotoError::ArtifactUnreadable { index: 1, .. })
    ));
    assert!(matches!(
        store.load("masks", 2),
        Err(RotoError::ArtifactUnreadable { index: 2, .. })
    ));
}

#[test]
fn test_store_identical_bytes_left_untouched() {
    let (_dir, store) = temp_store();
    let mask = block_mask(8, 8, 0, 2, 2, 4, 255).into();
    assert_eq!(store.store("m", 1, &mask).unwrap(), StoreOutcome::Written);
    let path = store.frame_path("m", 1);
    let before = fs::metadata(&path).unwrap().modified().unwrap();
    let bytes = fs::read(&path).unwrap();

    std::thread::sleep(std::time::Duration::from_millis(20));
    assert_eq!(store.store("m", 1, &mask).unwrap(), StoreOutcome::Unchanged);
    assert_eq!(fs::metadata(&path).unwrap().modified().unwrap(), before);
    assert_eq!(fs::read(&path).unwrap(), bytes);

    let other = Mask::filled(8, 8, 0).into();
    assert_eq!(store.store("m", 1, &other).unwrap(), StoreOutcome::Written);
    assert_eq!(decode_signal(&fs::read(&path).unwrap()).unwrap(), other);
}

#[test]
fn test_store_leaves_no_temporary_files() {
    let (_dir, store) = temp_store();
    for i in 1..=3 {
        put(&store, "cutouts", i, square_cutout(10, 10, [5, 5, 5], 4));
    }
    let names: Vec<String> = fs::read_dir(store.stage_dir("cutouts"))
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names.len(), 3);
    assert!(names.iter().all(|n| !n.ends_with(".tmp")));
}

#[test]
fn test_store_rejects_path_like_stage() {
    let (_dir, store) = temp_store();
    let signal = ImageSignal::Color(ColorFrame::filled(2, 2, [0, 0, 0]));
    assert!(matches!(
        store.store("../escape", 1, &signal),
        Err(RotoError::Config(_))
    ));
}

// ---------------------------------------------------------------------------
// Inventory / clear
// ---------------------------------------------------------------------------

#[test]
fn test_inventory_lists_stages() {
    let (_dir, store) = temp_store();
    put(&store, "masks", 3, Mask::filled(4, 4, 255));
    put(&store, "masks", 1, Mask::filled(4, 4, 255));
    put(&store, "frames", 1, gradient_color(4, 4));
    fs::create_dir_all(store.stage_dir("empty")).unwrap();

    let inventory = store.inventory();
    let names: Vec<&str> = inventory.iter().map(|s| s.stage.as_str()).collect();
    assert_eq!(names, vec!["empty", "frames", "masks"]);

    let masks = &inventory[2];
    assert_eq!(masks.frames, 2);
    assert_eq!(masks.first, Some(1));
    assert_eq!(masks.last, Some(3));
    assert!(masks.sample_bytes > 0);
    assert!(masks.sample_modified.is_some());

    assert_eq!(inventory[0].frames, 0);
    assert!(inventory[0].sample.is_none());
}

#[test]
fn test_clear_stage_only_touches_one_stage() {
    let (_dir, store) = temp_store();
    for i in 1..=3 {
        put(&store, "refined_masks", i, Mask::filled(4, 4, 255));
        put(&store, "masks", i, Mask::filled(4, 4, 255));
    }
    assert_eq!(store.clear_stage("refined_masks").unwrap(), 3);
    assert!(store.list_frames("refined_masks").is_empty());
    assert_eq!(store.list_frames("masks").len(), 3);
    assert_eq!(store.clear_stage("never_ran").unwrap(), 0);
}

#[test]
fn test_clear_stage_removes_stale_staging_files() {
    let (_dir, store) = temp_store();
    put(&store, "cutouts", 1, square_cutout(6, 6, [1, 1, 1], 2));
    let dir = store.stage_dir("cutouts");
    fs::write(dir.join(".abc123.tmp"), b"partial").unwrap();
    fs::write(dir.join("notes.txt"), b"keep me").unwrap();

    assert_eq!(store.clear_stage("cutouts").unwrap(), 1);
    let names: Vec<String> = fs::read_dir(&dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["notes.txt"]);
}

#[test]
fn test_custom_layout() {
    let dir = tempfile::TempDir::new().unwrap();
    let layout = FrameLayout {
        prefix: "img".into(),
        width: 6,
        extension: "bmp".into(),
        origin: 0,
    };
    let store = FrameStore::new(dir.path(), layout);
    put(&store, "frames", 0, gradient_color(3, 3));
    assert!(store.stage_dir("frames").join("img000000.bmp").is_file());
    assert_eq!(store.list_frames("frames"), vec![0]);
    assert_eq!(
        store.load("frames", 0).unwrap(),
        ImageSignal::Color(gradient_color(3, 3))
    );
}
