//! Asynchronous geometry and texture loading.
//!
//! [`ResourceLoader`] hands out handles immediately and moves file reads and
//! image decodes to worker threads; GPU uploads happen on the frame thread
//! inside [`ResourceLoader::poll`]. Render code gates every draw on
//! [`ResourceLoader::is_loaded`] so frames keep presenting while assets
//! stream in.

mod geometry;
mod loader;
mod texture;

pub use geometry::{
    AttribDesc, BufferAttrib, GeometryDesc, GpuGeometry, IndexBuffer, VertexArrayDesc,
    VertexBuffer, VertexFormat,
};
pub use loader::{
    GeometryKey, GeometrySource, LoadError, LoadEvent, LoadState, ResourceKey, ResourceLoader,
    TextureKey,
};
pub use texture::{
    CanvasTextureConfig, ImageSource, PixelImage, SamplingConfig, Texture2dConfig,
    TextureCubeConfig,
};
