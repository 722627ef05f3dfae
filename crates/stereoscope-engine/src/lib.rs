//! Stereoscope engine crate.
//!
//! A thin rendering layer for stereo-first applications: reflected shader
//! programs, streamed geometry and texture loading, and a frame scheduler
//! that presents to a stereo display or falls back to a drag-look mono view.

pub mod device;
pub mod shader;
pub mod resources;
pub mod frame;
pub mod camera;
pub mod time;

pub mod logging;
pub mod coords;
pub mod platform;
