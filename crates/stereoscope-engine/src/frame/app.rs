use super::state::{EyePass, FrameState};
use crate::device::{GlApi, GraphicsContext};

/// Application hooks called by the [`FrameScheduler`](super::FrameScheduler).
///
/// Per frame the scheduler calls `pre_update` once, `update` once, and
/// `render` once per eye pass, in that order. The next frame is already
/// scheduled when `pre_update` runs, so a slow frame delays but never
/// stops the loop.
pub trait FrameApp<D: GlApi> {
    /// Runs before frame state is computed; a place to pump input or issue
    /// loads. The timestamp matches the one `update` will see.
    fn pre_update(&mut self, _timestamp: f64) {}

    /// Per-frame simulation step.
    fn update(&mut self, frame: &FrameState);

    /// Draws one eye pass. The viewport is already applied and the shared
    /// surface was cleared once before the first pass.
    fn render(&mut self, ctx: &GraphicsContext<D>, pass: &EyePass);
}
