use glam::Mat4;

use crate::coords::Viewport;
use crate::time::FrameTime;

/// Which eye a render pass targets.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Eye {
    Left,
    Right,
    /// The single pass of the mono fallback.
    Mono,
}

impl Eye {
    pub fn label(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
            Self::Mono => "mono",
        }
    }
}

/// How the current frame is being presented.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum PresentationMode {
    Stereo,
    Mono,
}

/// One render pass: an eye, its transforms, and the viewport it covers.
#[derive(Debug, Copy, Clone)]
pub struct EyePass {
    pub eye: Eye,
    pub projection: Mat4,
    pub view: Mat4,
    pub viewport: Viewport,
}

/// Everything an application sees about the frame being produced.
///
/// Stereo frames carry a left and a right pass over the two halves of the
/// surface; mono frames carry a single full-surface pass.
#[derive(Debug, Clone)]
pub struct FrameState {
    pub mode: PresentationMode,
    pub time: FrameTime,
    pub eyes: Vec<EyePass>,
}
