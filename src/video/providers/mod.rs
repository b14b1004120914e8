//! Video generation service implementations.

mod veo;

pub use veo::{VeoModel, VeoService, VeoServiceBuilder, DEFAULT_BASE_URL};
