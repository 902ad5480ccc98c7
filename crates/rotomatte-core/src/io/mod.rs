pub mod image_io;
pub mod store;

pub use store::{FrameLayout, FrameStore, StageInventory, StoreOutcome};
