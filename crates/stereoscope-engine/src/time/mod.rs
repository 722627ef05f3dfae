//! Frame timing utilities.
//!
//! Intended usage:
//! - one `FrameClock` per frame loop
//! - call `tick()` with the driver timestamp of each presented frame

mod frame_clock;

pub use frame_clock::{FrameClock, FrameTime};
