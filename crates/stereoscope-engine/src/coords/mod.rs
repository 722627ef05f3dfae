//! Pixel-space geometry types shared across the engine.
//!
//! Canonical GPU space:
//! - Physical pixels
//! - Origin bottom-left (GL convention)
//! - +X right, +Y up

mod viewport;

pub use viewport::Viewport;
