use bitflags::bitflags;

use crate::coords::Viewport;

/// Opaque shader object handle issued by a [`GlApi`] implementation.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct ShaderId(pub u32);

/// Opaque linked-program handle.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct ProgramId(pub u32);

/// Opaque vertex/index buffer handle.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct BufferId(pub u32);

/// Opaque texture handle.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct TextureId(pub u32);

/// Opaque uniform location within a linked program.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct UniformLocation(pub u32);

/// Shader pipeline stage.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    pub fn label(self) -> &'static str {
        match self {
            Self::Vertex => "vertex",
            Self::Fragment => "fragment",
        }
    }
}

/// Buffer binding point.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum BufferKind {
    /// Vertex attribute data.
    Array,
    /// Index data.
    ElementArray,
}

/// Texture binding target.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum TextureTarget {
    Texture2d,
    Cube,
}

/// Cube map face, in upload order.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum CubeFace {
    PosX,
    NegX,
    PosY,
    NegY,
    PosZ,
    NegZ,
}

impl CubeFace {
    pub const ALL: [CubeFace; 6] = [
        CubeFace::PosX,
        CubeFace::NegX,
        CubeFace::PosY,
        CubeFace::NegY,
        CubeFace::PosZ,
        CubeFace::NegZ,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::PosX => "pos_x",
            Self::NegX => "neg_x",
            Self::PosY => "pos_y",
            Self::NegY => "neg_y",
            Self::PosZ => "pos_z",
            Self::NegZ => "neg_z",
        }
    }
}

/// Destination of a 2D pixel upload.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum TexImageTarget {
    Texture2d,
    CubeFace(CubeFace),
}

/// Texture coordinate wrap behavior.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum WrapMode {
    Repeat,
    MirroredRepeat,
    ClampToEdge,
}

/// Texture sampling filter.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum FilterMode {
    Nearest,
    Linear,
    NearestMipmapNearest,
    LinearMipmapNearest,
    NearestMipmapLinear,
    LinearMipmapLinear,
}

impl FilterMode {
    /// Whether this filter samples mipmap levels.
    pub fn uses_mipmaps(self) -> bool {
        !matches!(self, Self::Nearest | Self::Linear)
    }
}

/// Complete sampling policy for one texture.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct SamplerPolicy {
    pub wrap_s: WrapMode,
    pub wrap_t: WrapMode,
    pub min_filter: FilterMode,
    pub mag_filter: FilterMode,
    pub mipmaps: bool,
}

/// Primitive topology for draw calls.
#[derive(Debug, Copy, Clone, Eq, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Topology {
    Points,
    Lines,
    LineStrip,
    LineLoop,
    Triangles,
    TriangleStrip,
    TriangleFan,
}

impl Default for Topology {
    fn default() -> Self {
        Self::Triangles
    }
}

/// Primitive scalar type as understood by attribute pointers and index buffers.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ScalarKind {
    Byte,
    UnsignedByte,
    Short,
    UnsignedShort,
    Int,
    UnsignedInt,
    Float,
    Bool,
}

impl ScalarKind {
    /// Size of one scalar in bytes.
    pub fn byte_size(self) -> u32 {
        match self {
            Self::Byte | Self::UnsignedByte | Self::Bool => 1,
            Self::Short | Self::UnsignedShort => 2,
            Self::Int | Self::UnsignedInt | Self::Float => 4,
        }
    }
}

/// One active attribute or uniform as reported by program introspection.
///
/// `raw_type` is the GL type tag; decoding into component/size information is
/// the reflector's job, so unknown tags survive long enough to be reported.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ActiveVar {
    pub name: String,
    pub raw_type: u32,
    pub array_size: u32,
}

bitflags! {
    /// Buffers touched by a clear.
    #[derive(Debug, Copy, Clone, Eq, PartialEq)]
    pub struct ClearFlags: u32 {
        const DEPTH = 1 << 0;
        const COLOR = 1 << 1;
    }
}

/// The narrow GL-shaped command surface the engine renders through.
///
/// Everything above the device layer operates through this trait, which keeps
/// the rest of the engine testable against a scripted fake. Implementations
/// are used from a single thread; interior mutability is expected where the
/// backing API demands bookkeeping.
pub trait GlApi {
    // ── shaders & programs ────────────────────────────────────────────────

    fn create_shader(&self, stage: ShaderStage) -> ShaderId;
    fn shader_source(&self, shader: ShaderId, source: &str);
    /// Compiles; on failure returns the compiler's info log.
    fn compile_shader(&self, shader: ShaderId) -> Result<(), String>;
    fn delete_shader(&self, shader: ShaderId);

    fn create_program(&self) -> ProgramId;
    fn attach_shader(&self, program: ProgramId, shader: ShaderId);
    /// Links; on failure returns the linker's info log.
    fn link_program(&self, program: ProgramId) -> Result<(), String>;
    fn delete_program(&self, program: ProgramId);
    fn use_program(&self, program: Option<ProgramId>);

    fn active_attributes(&self, program: ProgramId) -> Vec<ActiveVar>;
    fn active_uniforms(&self, program: ProgramId) -> Vec<ActiveVar>;
    fn attrib_location(&self, program: ProgramId, name: &str) -> Option<u32>;
    fn uniform_location(&self, program: ProgramId, name: &str) -> Option<UniformLocation>;

    // ── uniform setters ───────────────────────────────────────────────────

    fn uniform_f32(&self, location: UniformLocation, value: f32);
    /// `components` is 2, 3 or 4.
    fn uniform_f32_vec(&self, location: UniformLocation, components: u8, values: &[f32]);
    fn uniform_i32(&self, location: UniformLocation, value: i32);
    /// `components` is 2, 3 or 4.
    fn uniform_i32_vec(&self, location: UniformLocation, components: u8, values: &[i32]);
    /// `rank` is 2, 3 or 4; column-major, never transposed.
    fn uniform_matrix(&self, location: UniformLocation, rank: u8, values: &[f32]);

    // ── buffers & draws ───────────────────────────────────────────────────

    fn create_buffer(&self) -> BufferId;
    fn bind_buffer(&self, kind: BufferKind, buffer: Option<BufferId>);
    /// Uploads to the currently bound buffer of `kind` (static usage).
    fn buffer_data(&self, kind: BufferKind, data: &[u8]);
    fn delete_buffer(&self, buffer: BufferId);

    fn enable_vertex_attrib(&self, location: u32);
    fn vertex_attrib_pointer(
        &self,
        location: u32,
        components: i32,
        scalar: ScalarKind,
        normalized: bool,
        stride: i32,
        offset: i32,
    );

    fn draw_arrays(&self, topology: Topology, first: i32, count: i32);
    fn draw_elements(&self, topology: Topology, count: i32, index_kind: ScalarKind);

    // ── textures ──────────────────────────────────────────────────────────

    fn create_texture(&self) -> TextureId;
    fn delete_texture(&self, texture: TextureId);
    fn active_texture_unit(&self, unit: u32);
    fn bind_texture(&self, target: TextureTarget, texture: Option<TextureId>);
    /// RGBA8 upload to the currently bound texture; `None` allocates storage.
    fn tex_image_2d(&self, target: TexImageTarget, width: u32, height: u32, pixels: Option<&[u8]>);
    fn tex_parameters(&self, target: TextureTarget, policy: &SamplerPolicy);
    fn generate_mipmaps(&self, target: TextureTarget);

    // ── frame ─────────────────────────────────────────────────────────────

    fn set_viewport(&self, viewport: Viewport);
    fn set_clear_color(&self, r: f32, g: f32, b: f32, a: f32);
    fn clear(&self, flags: ClearFlags);
}
