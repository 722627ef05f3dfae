//! Pointer-driven look camera for the mono presentation path.

mod controller;

pub use controller::{CameraRig, DragEvent, SurfaceId};
