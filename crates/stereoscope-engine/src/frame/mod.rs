//! Frame scheduling.
//!
//! [`FrameScheduler`] owns the presentation lifecycle: it discovers a
//! stereo display, falls back to a mono camera view when allowed, and
//! drives an application's [`FrameApp`] hooks once per tick. All platform
//! touchpoints (ticks, displays, the render surface) are trait objects
//! injected at construction.

mod app;
mod display;
mod scheduler;
mod state;

pub use app::FrameApp;
pub use display::{
    DisplayError, DisplayProvider, PresentationSurface, StereoDisplay, StereoPose, TickSource,
};
pub use scheduler::{FrameScheduler, MonoFallback, SchedulerConfig, SchedulerState};
pub use state::{Eye, EyePass, FrameState, PresentationMode};
