use std::path::PathBuf;

use slotmap::{new_key_type, SlotMap};
use thiserror::Error;

use super::geometry::{self, GeometryDesc, GpuGeometry};
use super::texture::{
    self, CanvasTextureConfig, ImageSource, PixelImage, SamplingConfig, Texture2dConfig,
    TextureCubeConfig,
};
use crate::device::{
    BufferKind, CubeFace, GlApi, GraphicsContext, SamplerPolicy, ScalarKind, TexImageTarget,
    TextureId, TextureTarget,
};
use crate::shader::Program;

new_key_type! {
    /// Handle to geometry owned by a [`ResourceLoader`].
    pub struct GeometryKey;
    /// Handle to a texture owned by a [`ResourceLoader`].
    pub struct TextureKey;
}

/// Either kind of resource handle, for the uniform readiness gate.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ResourceKey {
    Geometry(GeometryKey),
    Texture(TextureKey),
}

impl From<GeometryKey> for ResourceKey {
    fn from(key: GeometryKey) -> Self {
        Self::Geometry(key)
    }
}

impl From<TextureKey> for ResourceKey {
    fn from(key: TextureKey) -> Self {
        Self::Texture(key)
    }
}

/// Lifecycle of one resource handle.
///
/// `Loaded` is terminal and immutable; `Failed` is terminal and the handle
/// must never be drawn. There is no partially-loaded visible state.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum LoadState {
    #[default]
    Pending,
    Loaded,
    Failed,
}

/// Synchronous, caller-correctable load errors.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("missing required image source `{0}`")]
    MissingSource(&'static str),

    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),
}

/// Completion notification surfaced by [`ResourceLoader::poll`].
///
/// Polling `is_loaded` each frame is the primary gate; these events exist
/// for code that wants to react to completion or failure immediately.
#[derive(Debug, Clone)]
pub enum LoadEvent {
    GeometryLoaded(GeometryKey),
    GeometryFailed { key: GeometryKey, reason: String },
    TextureLoaded(TextureKey),
    TextureFailed { key: TextureKey, reason: String },
}

/// Where an asynchronous geometry description comes from.
#[derive(Debug, Clone)]
pub enum GeometrySource {
    /// JSON file on disk.
    Path(PathBuf),
    /// In-memory JSON.
    Json(String),
}

#[derive(Default)]
struct GeometrySlot {
    state: LoadState,
    gpu: Option<GpuGeometry>,
    error: Option<String>,
}

struct TextureSlot {
    texture: TextureId,
    target: TextureTarget,
    policy: SamplerPolicy,
    size: Option<(u32, u32)>,
    state: LoadState,
    error: Option<String>,
    canvas: Option<PixelImage>,
}

enum Completion {
    Geometry(GeometryKey, Result<GeometryDesc, String>),
    Texture2d(TextureKey, Result<PixelImage, String>),
    Cube(TextureKey, Result<Box<[PixelImage; 6]>, String>),
}

/// Issues asynchronous geometry and texture loads and owns the resulting
/// handles.
///
/// Image decode and file reads run on worker threads; GPU uploads happen on
/// the frame thread when [`poll`](Self::poll) drains the completion channel.
/// Issuing a load never blocks a frame, and there is no cancellation: an
/// in-flight load always runs to completion or failure.
pub struct ResourceLoader {
    geometries: SlotMap<GeometryKey, GeometrySlot>,
    textures: SlotMap<TextureKey, TextureSlot>,
    tx: flume::Sender<Completion>,
    rx: flume::Receiver<Completion>,
}

impl Default for ResourceLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceLoader {
    pub fn new() -> Self {
        let (tx, rx) = flume::unbounded();
        Self {
            geometries: SlotMap::with_key(),
            textures: SlotMap::with_key(),
            tx,
            rx,
        }
    }

    // ── geometry ──────────────────────────────────────────────────────────

    /// Begins an asynchronous geometry load. The returned handle reports
    /// `Pending` until a later `poll` observes the parsed description and
    /// uploads it.
    pub fn load_geometry(&mut self, source: GeometrySource) -> GeometryKey {
        let key = self.geometries.insert(GeometrySlot::default());
        let tx = self.tx.clone();
        std::thread::spawn(move || {
            let result = fetch_geometry(source);
            // The loader may be dropped before the worker finishes; the
            // completion is simply discarded then.
            let _ = tx.send(Completion::Geometry(key, result));
        });
        key
    }

    /// Uploads an in-memory description immediately; the handle is loaded on
    /// return.
    pub fn create_geometry<D: GlApi>(
        &mut self,
        ctx: &GraphicsContext<D>,
        desc: &GeometryDesc,
    ) -> Result<GeometryKey, LoadError> {
        let gpu = geometry::upload(ctx, desc).map_err(LoadError::InvalidGeometry)?;
        Ok(self.geometries.insert(GeometrySlot {
            state: LoadState::Loaded,
            gpu: Some(gpu),
            error: None,
        }))
    }

    // ── textures ──────────────────────────────────────────────────────────

    /// Begins an asynchronous 2D texture load.
    ///
    /// Fails synchronously when the config carries no source; decode errors
    /// surface later through `load_state`/`poll` events.
    pub fn load_texture_2d<D: GlApi>(
        &mut self,
        ctx: &GraphicsContext<D>,
        config: Texture2dConfig,
    ) -> Result<TextureKey, LoadError> {
        let Some(src) = config.src else {
            return Err(LoadError::MissingSource("src"));
        };

        let key = self.insert_texture(ctx, TextureTarget::Texture2d, &config.sampling, None);
        let tx = self.tx.clone();
        std::thread::spawn(move || {
            let _ = tx.send(Completion::Texture2d(key, texture::decode(&src)));
        });
        Ok(key)
    }

    /// Begins an asynchronous cube map load. All six faces must decode
    /// before anything is uploaded; one failure fails the whole handle.
    pub fn load_texture_cube<D: GlApi>(
        &mut self,
        ctx: &GraphicsContext<D>,
        config: TextureCubeConfig,
    ) -> Result<TextureKey, LoadError> {
        let faces = [
            config.pos_x,
            config.neg_x,
            config.pos_y,
            config.neg_y,
            config.pos_z,
            config.neg_z,
        ];
        let mut sources = Vec::with_capacity(6);
        for (face, source) in CubeFace::ALL.iter().zip(faces) {
            match source {
                Some(source) => sources.push(source),
                None => return Err(LoadError::MissingSource(face.label())),
            }
        }

        let key = self.insert_texture(ctx, TextureTarget::Cube, &config.sampling, None);
        let tx = self.tx.clone();
        std::thread::spawn(move || {
            let _ = tx.send(Completion::Cube(key, decode_faces(&sources)));
        });
        Ok(key)
    }

    /// Allocates a caller-drawn texture. Content is produced afterwards via
    /// [`canvas_mut`](Self::canvas_mut) + [`upload_canvas`](Self::upload_canvas),
    /// so the handle is loaded immediately.
    pub fn load_canvas_texture<D: GlApi>(
        &mut self,
        ctx: &GraphicsContext<D>,
        config: CanvasTextureConfig,
    ) -> TextureKey {
        let canvas = PixelImage::blank(config.width, config.height);
        let key = self.insert_texture(
            ctx,
            TextureTarget::Texture2d,
            &config.sampling,
            Some(canvas),
        );

        let slot = &mut self.textures[key];
        slot.size = Some((config.width, config.height));
        texture::apply_npot_rule(&mut slot.policy, config.width, config.height);

        let device = ctx.device();
        device.bind_texture(TextureTarget::Texture2d, Some(slot.texture));
        device.tex_image_2d(TexImageTarget::Texture2d, config.width, config.height, None);

        slot.state = LoadState::Loaded;
        key
    }

    /// The CPU-side pixels of a canvas texture, for the caller to draw into.
    pub fn canvas_mut(&mut self, key: TextureKey) -> Option<&mut PixelImage> {
        self.textures.get_mut(key)?.canvas.as_mut()
    }

    /// Re-uploads a canvas texture's pixels.
    pub fn upload_canvas<D: GlApi>(&self, ctx: &GraphicsContext<D>, key: TextureKey) {
        let Some(slot) = self.textures.get(key) else { return };
        let Some(canvas) = &slot.canvas else { return };

        let device = ctx.device();
        device.bind_texture(TextureTarget::Texture2d, Some(slot.texture));
        device.tex_image_2d(
            TexImageTarget::Texture2d,
            canvas.width,
            canvas.height,
            Some(&canvas.rgba),
        );
        if slot.policy.mipmaps {
            device.generate_mipmaps(TextureTarget::Texture2d);
        }
    }

    fn insert_texture<D: GlApi>(
        &mut self,
        ctx: &GraphicsContext<D>,
        target: TextureTarget,
        sampling: &SamplingConfig,
        canvas: Option<PixelImage>,
    ) -> TextureKey {
        self.textures.insert(TextureSlot {
            texture: ctx.device().create_texture(),
            target,
            policy: sampling.resolve(),
            size: None,
            state: LoadState::Pending,
            error: None,
            canvas,
        })
    }

    /// Releases a geometry handle and its GPU buffers. A completion still in
    /// flight for the key is discarded when it arrives.
    pub fn unload_geometry<D: GlApi>(&mut self, ctx: &GraphicsContext<D>, key: GeometryKey) {
        let Some(slot) = self.geometries.remove(key) else { return };
        let Some(gpu) = slot.gpu else { return };

        let device = ctx.device();
        for vb in gpu.vertex_buffers {
            device.delete_buffer(vb.buffer);
        }
        if let Some(index) = gpu.index {
            device.delete_buffer(index.buffer);
        }
    }

    /// Releases a texture handle and its GPU object.
    pub fn unload_texture<D: GlApi>(&mut self, ctx: &GraphicsContext<D>, key: TextureKey) {
        if let Some(slot) = self.textures.remove(key) {
            ctx.device().delete_texture(slot.texture);
        }
    }

    // ── readiness ─────────────────────────────────────────────────────────

    /// The uniform draw gate: true once the handle finished loading.
    /// Cheap, repeatable, side-effect free; poll it every frame and skip
    /// draws that depend on handles still in flight.
    pub fn is_loaded(&self, key: impl Into<ResourceKey>) -> bool {
        match key.into() {
            ResourceKey::Geometry(key) => self.geometry_state(key) == LoadState::Loaded,
            ResourceKey::Texture(key) => self.texture_state(key) == LoadState::Loaded,
        }
    }

    /// Lifecycle state of any handle. Stale keys read as `Pending`.
    pub fn load_state(&self, key: impl Into<ResourceKey>) -> LoadState {
        match key.into() {
            ResourceKey::Geometry(key) => self.geometry_state(key),
            ResourceKey::Texture(key) => self.texture_state(key),
        }
    }

    pub fn geometry_state(&self, key: GeometryKey) -> LoadState {
        self.geometries.get(key).map(|s| s.state).unwrap_or_default()
    }

    pub fn texture_state(&self, key: TextureKey) -> LoadState {
        self.textures.get(key).map(|s| s.state).unwrap_or_default()
    }

    /// The failure message for a handle in the `Failed` state.
    pub fn load_error(&self, key: impl Into<ResourceKey>) -> Option<&str> {
        match key.into() {
            ResourceKey::Geometry(key) => self.geometries.get(key)?.error.as_deref(),
            ResourceKey::Texture(key) => self.textures.get(key)?.error.as_deref(),
        }
    }

    /// Drains finished loads, performing GPU uploads on the calling (frame)
    /// thread. Call once per frame; returns the completions observed.
    pub fn poll<D: GlApi>(&mut self, ctx: &GraphicsContext<D>) -> Vec<LoadEvent> {
        let mut events = Vec::new();
        // Collect first: handling a completion needs &mut self.
        let completions: Vec<Completion> = self.rx.try_iter().collect();
        for completion in completions {
            match completion {
                Completion::Geometry(key, result) => self.finish_geometry(ctx, key, result, &mut events),
                Completion::Texture2d(key, result) => self.finish_texture_2d(ctx, key, result, &mut events),
                Completion::Cube(key, result) => self.finish_cube(ctx, key, result, &mut events),
            }
        }
        events
    }

    fn finish_geometry<D: GlApi>(
        &mut self,
        ctx: &GraphicsContext<D>,
        key: GeometryKey,
        result: Result<GeometryDesc, String>,
        events: &mut Vec<LoadEvent>,
    ) {
        let Some(slot) = self.geometries.get_mut(key) else { return };
        match result.and_then(|desc| geometry::upload(ctx, &desc)) {
            Ok(gpu) => {
                slot.gpu = Some(gpu);
                slot.state = LoadState::Loaded;
                events.push(LoadEvent::GeometryLoaded(key));
            }
            Err(reason) => {
                log::warn!("geometry load failed: {reason}");
                slot.state = LoadState::Failed;
                slot.error = Some(reason.clone());
                events.push(LoadEvent::GeometryFailed { key, reason });
            }
        }
    }

    fn finish_texture_2d<D: GlApi>(
        &mut self,
        ctx: &GraphicsContext<D>,
        key: TextureKey,
        result: Result<PixelImage, String>,
        events: &mut Vec<LoadEvent>,
    ) {
        let Some(slot) = self.textures.get_mut(key) else { return };
        match result {
            Ok(image) => {
                let device = ctx.device();
                device.bind_texture(TextureTarget::Texture2d, Some(slot.texture));
                device.tex_image_2d(
                    TexImageTarget::Texture2d,
                    image.width,
                    image.height,
                    Some(&image.rgba),
                );

                slot.size = Some((image.width, image.height));
                texture::apply_npot_rule(&mut slot.policy, image.width, image.height);
                if slot.policy.mipmaps {
                    device.generate_mipmaps(TextureTarget::Texture2d);
                }

                slot.state = LoadState::Loaded;
                events.push(LoadEvent::TextureLoaded(key));
            }
            Err(reason) => {
                log::warn!("texture load failed: {reason}");
                slot.state = LoadState::Failed;
                slot.error = Some(reason.clone());
                events.push(LoadEvent::TextureFailed { key, reason });
            }
        }
    }

    fn finish_cube<D: GlApi>(
        &mut self,
        ctx: &GraphicsContext<D>,
        key: TextureKey,
        result: Result<Box<[PixelImage; 6]>, String>,
        events: &mut Vec<LoadEvent>,
    ) {
        let Some(slot) = self.textures.get_mut(key) else { return };
        match result {
            Ok(faces) => {
                let device = ctx.device();
                device.bind_texture(TextureTarget::Cube, Some(slot.texture));
                for (face, image) in CubeFace::ALL.iter().zip(faces.iter()) {
                    device.tex_image_2d(
                        TexImageTarget::CubeFace(*face),
                        image.width,
                        image.height,
                        Some(&image.rgba),
                    );
                }

                let (width, height) = (faces[0].width, faces[0].height);
                slot.size = Some((width, height));
                texture::apply_npot_rule(&mut slot.policy, width, height);
                if slot.policy.mipmaps {
                    device.generate_mipmaps(TextureTarget::Cube);
                }

                slot.state = LoadState::Loaded;
                events.push(LoadEvent::TextureLoaded(key));
            }
            Err(reason) => {
                log::warn!("cube map load failed: {reason}");
                slot.state = LoadState::Failed;
                slot.error = Some(reason.clone());
                events.push(LoadEvent::TextureFailed { key, reason });
            }
        }
    }

    // ── drawing ───────────────────────────────────────────────────────────

    /// Uses the program and binds the geometry's buffers and attribute
    /// pointers. Attributes present in a buffer's format but absent from
    /// the program are silently skipped. Returns false (and binds nothing)
    /// while the geometry is not loaded.
    pub fn bind_geometry<D: GlApi>(
        &self,
        ctx: &GraphicsContext<D>,
        program: &Program,
        key: GeometryKey,
    ) -> bool {
        let Some(gpu) = self.loaded_geometry(key) else {
            return false;
        };

        let device = ctx.device();
        device.use_program(Some(program.id()));

        for vb in &gpu.vertex_buffers {
            device.bind_buffer(BufferKind::Array, Some(vb.buffer));
            for attrib in &vb.format.attribs {
                let Some(reflected) = program.attribs().get(&attrib.name) else {
                    continue;
                };
                device.enable_vertex_attrib(reflected.location);
                device.vertex_attrib_pointer(
                    reflected.location,
                    attrib.info.components as i32,
                    attrib.info.scalar.unwrap_or(ScalarKind::Float),
                    false,
                    vb.format.stride as i32,
                    attrib.offset as i32,
                );
            }
        }

        if let Some(index) = &gpu.index {
            device.bind_buffer(BufferKind::ElementArray, Some(index.buffer));
        }
        true
    }

    /// Draws previously bound geometry, indexed when an index buffer exists.
    pub fn draw_geometry<D: GlApi>(&self, ctx: &GraphicsContext<D>, key: GeometryKey) {
        let Some(gpu) = self.loaded_geometry(key) else { return };
        let device = ctx.device();
        match &gpu.index {
            Some(index) => {
                device.draw_elements(gpu.topology, index.count, ScalarKind::UnsignedShort)
            }
            None => device.draw_arrays(gpu.topology, 0, gpu.vertex_count),
        }
    }

    /// Binds a loaded texture to the given unit and applies its sampling
    /// policy. A handle still in flight is a no-op.
    pub fn bind_texture<D: GlApi>(&self, ctx: &GraphicsContext<D>, key: TextureKey, unit: u32) {
        let Some(slot) = self.textures.get(key) else { return };
        if slot.state != LoadState::Loaded {
            return;
        }

        let device = ctx.device();
        device.active_texture_unit(unit);
        device.bind_texture(slot.target, Some(slot.texture));
        device.tex_parameters(slot.target, &slot.policy);
    }

    /// The sampling policy a texture will be bound with.
    pub fn texture_policy(&self, key: TextureKey) -> Option<SamplerPolicy> {
        self.textures.get(key).map(|s| s.policy)
    }

    /// Loaded dimensions of a texture.
    pub fn texture_size(&self, key: TextureKey) -> Option<(u32, u32)> {
        self.textures.get(key)?.size
    }

    fn loaded_geometry(&self, key: GeometryKey) -> Option<&GpuGeometry> {
        let slot = self.geometries.get(key)?;
        if slot.state == LoadState::Loaded {
            slot.gpu.as_ref()
        } else {
            None
        }
    }
}

fn fetch_geometry(source: GeometrySource) -> Result<GeometryDesc, String> {
    let json = match source {
        GeometrySource::Path(path) => std::fs::read_to_string(&path)
            .map_err(|e| format!("failed to read geometry {}: {e}", path.display()))?,
        GeometrySource::Json(json) => json,
    };
    serde_json::from_str(&json).map_err(|e| format!("failed to parse geometry: {e}"))
}

fn decode_faces(sources: &[ImageSource]) -> Result<Box<[PixelImage; 6]>, String> {
    let mut faces = Vec::with_capacity(6);
    for source in sources {
        faces.push(texture::decode(source)?);
    }
    match <Box<[PixelImage; 6]>>::try_from(faces.into_boxed_slice()) {
        Ok(faces) => Ok(faces),
        Err(_) => Err("expected six cube faces".to_owned()),
    }
}
