use super::api::{ClearFlags, GlApi};

/// Context configuration fixed at construction.
///
/// These are the per-frame clear rules; drawable creation attributes
/// (multisampling, alpha) belong to whichever embedder created the raw
/// context and are not duplicated here.
#[derive(Debug, Clone)]
pub struct ContextConfig {
    /// Clear the depth buffer at the top of every frame.
    pub clear_depth: bool,

    /// Clear color applied every frame; `None` skips the color clear.
    pub clear_color: Option<[f32; 4]>,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            clear_depth: true,
            clear_color: Some([0.0, 0.0, 0.0, 1.0]),
        }
    }
}

/// Owns the raw graphics device and its configuration.
///
/// Every other component draws through this adapter; the device itself is
/// injected so tests can substitute a scripted fake.
pub struct GraphicsContext<D: GlApi> {
    device: D,
    config: ContextConfig,
}

impl<D: GlApi> GraphicsContext<D> {
    pub fn new(device: D, config: ContextConfig) -> Self {
        Self { device, config }
    }

    #[inline]
    pub fn device(&self) -> &D {
        &self.device
    }

    #[inline]
    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    /// Clears the configured buffers. Called once per frame, before any eye
    /// is rendered, so stereo frames are not cleared twice.
    pub fn clear(&self) {
        let mut flags = ClearFlags::empty();

        if self.config.clear_depth {
            flags |= ClearFlags::DEPTH;
        }

        if let Some([r, g, b, a]) = self.config.clear_color {
            self.device.set_clear_color(r, g, b, a);
            flags |= ClearFlags::COLOR;
        }

        if !flags.is_empty() {
            self.device.clear(flags);
        }
    }
}
