//! Port traits defining external boundaries.
//!
//! Each trait represents a boundary between the batch loop and an
//! external system. Implementations live in `src/adapters/`.

pub mod artifact_store;
pub mod image_generator;
pub mod pacer;

pub use artifact_store::ArtifactStore;
pub use image_generator::{ImageGenerator, ImageRequest};
pub use pacer::Pacer;
