use glam::Mat4;
use thiserror::Error;

use super::state::Eye;

/// Stereo display failure surfaced during discovery or presentation setup.
#[derive(Debug, Error)]
pub enum DisplayError {
    #[error("no stereo display is available")]
    Unavailable,

    #[error("display refused presentation: {0}")]
    PresentRequestFailed(String),
}

/// Per-frame eye transforms reported by a stereo display.
#[derive(Debug, Copy, Clone)]
pub struct StereoPose {
    pub left_projection: Mat4,
    pub left_view: Mat4,
    pub right_projection: Mat4,
    pub right_view: Mat4,
}

impl Default for StereoPose {
    fn default() -> Self {
        Self {
            left_projection: Mat4::IDENTITY,
            left_view: Mat4::IDENTITY,
            right_projection: Mat4::IDENTITY,
            right_view: Mat4::IDENTITY,
        }
    }
}

/// A presentable stereo display.
///
/// The scheduler drives one of these when discovery succeeds: ticks are
/// requested from the display so frames pace to its refresh, and each
/// rendered frame is handed back through `submit_frame`.
pub trait StereoDisplay {
    /// Recommended render size for one eye, in pixels.
    fn eye_extent(&self, eye: Eye) -> (u32, u32);

    /// Asks the display to start presenting the shared surface.
    fn request_present(&mut self) -> Result<(), DisplayError>;

    /// Schedules the next frame callback on the display's refresh.
    fn request_tick(&mut self);

    /// The pose to render the in-flight frame with.
    fn frame_pose(&mut self) -> StereoPose;

    /// Hands the rendered frame to the display.
    fn submit_frame(&mut self);
}

/// Source of stereo displays.
///
/// `Ok(None)` means discovery worked but nothing is connected; errors mean
/// the query itself failed. Both route to the mono fallback decision.
pub trait DisplayProvider {
    fn discover(&mut self) -> Result<Option<Box<dyn StereoDisplay>>, DisplayError>;
}

/// Schedules frame callbacks when no stereo display paces the loop.
pub trait TickSource {
    fn request_tick(&mut self);
}

/// The surface frames are rendered into.
///
/// `size` is the framebuffer; `client_size` is the layout size the mono
/// path mirrors each frame.
pub trait PresentationSurface {
    fn size(&self) -> (u32, u32);
    fn client_size(&self) -> (u32, u32);
    fn resize(&mut self, width: u32, height: u32);
}
