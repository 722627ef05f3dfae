//! Graphics device abstraction.
//!
//! This module is responsible for:
//! - the [`GlApi`] command surface the rest of the engine draws through
//! - the production [`GlowDevice`] backend over a raw GL context
//! - the [`GraphicsContext`] adapter owning the device + clear configuration

mod api;
mod context;
mod glow_backend;

#[cfg(test)]
pub mod fake;

pub use api::{
    ActiveVar, BufferId, BufferKind, ClearFlags, CubeFace, FilterMode, GlApi, ProgramId,
    SamplerPolicy, ScalarKind, ShaderId, ShaderStage, TexImageTarget, TextureId, TextureTarget,
    Topology, UniformLocation, WrapMode,
};
pub use context::{ContextConfig, GraphicsContext};
pub use glow_backend::GlowDevice;
