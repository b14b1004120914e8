//! Asset collection: the source image and prompt for a generation.

mod collector;
mod types;

pub use collector::{AssetCollector, Submission};
pub use types::{ImageFormat, ImagePayload};
