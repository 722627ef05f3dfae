use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use glow::HasContext;

use super::api::{
    ActiveVar, BufferId, BufferKind, ClearFlags, CubeFace, FilterMode, GlApi, ProgramId,
    SamplerPolicy, ScalarKind, ShaderId, ShaderStage, TexImageTarget, TextureId, TextureTarget,
    Topology, UniformLocation, WrapMode,
};
use crate::coords::Viewport;

type NShader = <glow::Context as HasContext>::Shader;
type NProgram = <glow::Context as HasContext>::Program;
type NBuffer = <glow::Context as HasContext>::Buffer;
type NTexture = <glow::Context as HasContext>::Texture;
type NUniform = <glow::Context as HasContext>::UniformLocation;

/// Production [`GlApi`] over a live OpenGL / OpenGL ES context.
///
/// The caller is responsible for having made the context current on this
/// thread; glow calls are raw GL calls and every entry point assumes a
/// current context.
///
/// Object handles handed to the rest of the engine are plain integers mapped
/// to the native objects here, which keeps the engine-facing types `Copy` and
/// backend-independent.
pub struct GlowDevice {
    gl: glow::Context,
    next_id: Cell<u32>,
    shaders: RefCell<HashMap<u32, NShader>>,
    programs: RefCell<HashMap<u32, NProgram>>,
    buffers: RefCell<HashMap<u32, NBuffer>>,
    textures: RefCell<HashMap<u32, NTexture>>,
    uniforms: RefCell<HashMap<u32, NUniform>>,
}

impl GlowDevice {
    pub fn new(gl: glow::Context) -> Self {
        Self {
            gl,
            next_id: Cell::new(1),
            shaders: RefCell::new(HashMap::new()),
            programs: RefCell::new(HashMap::new()),
            buffers: RefCell::new(HashMap::new()),
            textures: RefCell::new(HashMap::new()),
            uniforms: RefCell::new(HashMap::new()),
        }
    }

    /// Direct access to the underlying context for embedder-level work the
    /// engine does not cover (e.g. framebuffer blits).
    pub fn raw(&self) -> &glow::Context {
        &self.gl
    }

    fn alloc(&self) -> u32 {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        id
    }
}

fn gl_buffer_kind(kind: BufferKind) -> u32 {
    match kind {
        BufferKind::Array => glow::ARRAY_BUFFER,
        BufferKind::ElementArray => glow::ELEMENT_ARRAY_BUFFER,
    }
}

fn gl_texture_target(target: TextureTarget) -> u32 {
    match target {
        TextureTarget::Texture2d => glow::TEXTURE_2D,
        TextureTarget::Cube => glow::TEXTURE_CUBE_MAP,
    }
}

fn gl_image_target(target: TexImageTarget) -> u32 {
    match target {
        TexImageTarget::Texture2d => glow::TEXTURE_2D,
        TexImageTarget::CubeFace(face) => match face {
            CubeFace::PosX => glow::TEXTURE_CUBE_MAP_POSITIVE_X,
            CubeFace::NegX => glow::TEXTURE_CUBE_MAP_NEGATIVE_X,
            CubeFace::PosY => glow::TEXTURE_CUBE_MAP_POSITIVE_Y,
            CubeFace::NegY => glow::TEXTURE_CUBE_MAP_NEGATIVE_Y,
            CubeFace::PosZ => glow::TEXTURE_CUBE_MAP_POSITIVE_Z,
            CubeFace::NegZ => glow::TEXTURE_CUBE_MAP_NEGATIVE_Z,
        },
    }
}

fn gl_wrap(mode: WrapMode) -> i32 {
    (match mode {
        WrapMode::Repeat => glow::REPEAT,
        WrapMode::MirroredRepeat => glow::MIRRORED_REPEAT,
        WrapMode::ClampToEdge => glow::CLAMP_TO_EDGE,
    }) as i32
}

fn gl_filter(mode: FilterMode) -> i32 {
    (match mode {
        FilterMode::Nearest => glow::NEAREST,
        FilterMode::Linear => glow::LINEAR,
        FilterMode::NearestMipmapNearest => glow::NEAREST_MIPMAP_NEAREST,
        FilterMode::LinearMipmapNearest => glow::LINEAR_MIPMAP_NEAREST,
        FilterMode::NearestMipmapLinear => glow::NEAREST_MIPMAP_LINEAR,
        FilterMode::LinearMipmapLinear => glow::LINEAR_MIPMAP_LINEAR,
    }) as i32
}

fn gl_topology(topology: Topology) -> u32 {
    match topology {
        Topology::Points => glow::POINTS,
        Topology::Lines => glow::LINES,
        Topology::LineStrip => glow::LINE_STRIP,
        Topology::LineLoop => glow::LINE_LOOP,
        Topology::Triangles => glow::TRIANGLES,
        Topology::TriangleStrip => glow::TRIANGLE_STRIP,
        Topology::TriangleFan => glow::TRIANGLE_FAN,
    }
}

fn gl_scalar(kind: ScalarKind) -> u32 {
    match kind {
        ScalarKind::Byte => glow::BYTE,
        ScalarKind::UnsignedByte | ScalarKind::Bool => glow::UNSIGNED_BYTE,
        ScalarKind::Short => glow::SHORT,
        ScalarKind::UnsignedShort => glow::UNSIGNED_SHORT,
        ScalarKind::Int => glow::INT,
        ScalarKind::UnsignedInt => glow::UNSIGNED_INT,
        ScalarKind::Float => glow::FLOAT,
    }
}

impl GlApi for GlowDevice {
    fn create_shader(&self, stage: ShaderStage) -> ShaderId {
        let gl_stage = match stage {
            ShaderStage::Vertex => glow::VERTEX_SHADER,
            ShaderStage::Fragment => glow::FRAGMENT_SHADER,
        };
        // glow reports creation failure as a string; a dead context cannot be
        // recovered from here, so record an invalid slot and let compile fail.
        let id = self.alloc();
        if let Ok(native) = unsafe { self.gl.create_shader(gl_stage) } {
            self.shaders.borrow_mut().insert(id, native);
        }
        ShaderId(id)
    }

    fn shader_source(&self, shader: ShaderId, source: &str) {
        if let Some(native) = self.shaders.borrow().get(&shader.0) {
            unsafe { self.gl.shader_source(*native, source) };
        }
    }

    fn compile_shader(&self, shader: ShaderId) -> Result<(), String> {
        let Some(native) = self.shaders.borrow().get(&shader.0).copied() else {
            return Err("shader object creation failed".to_owned());
        };
        unsafe {
            self.gl.compile_shader(native);
            if self.gl.get_shader_compile_status(native) {
                Ok(())
            } else {
                Err(self.gl.get_shader_info_log(native))
            }
        }
    }

    fn delete_shader(&self, shader: ShaderId) {
        if let Some(native) = self.shaders.borrow_mut().remove(&shader.0) {
            unsafe { self.gl.delete_shader(native) };
        }
    }

    fn create_program(&self) -> ProgramId {
        let id = self.alloc();
        if let Ok(native) = unsafe { self.gl.create_program() } {
            self.programs.borrow_mut().insert(id, native);
        }
        ProgramId(id)
    }

    fn attach_shader(&self, program: ProgramId, shader: ShaderId) {
        let programs = self.programs.borrow();
        let shaders = self.shaders.borrow();
        if let (Some(p), Some(s)) = (programs.get(&program.0), shaders.get(&shader.0)) {
            unsafe { self.gl.attach_shader(*p, *s) };
        }
    }

    fn link_program(&self, program: ProgramId) -> Result<(), String> {
        let Some(native) = self.programs.borrow().get(&program.0).copied() else {
            return Err("program object creation failed".to_owned());
        };
        unsafe {
            self.gl.link_program(native);
            if self.gl.get_program_link_status(native) {
                Ok(())
            } else {
                Err(self.gl.get_program_info_log(native))
            }
        }
    }

    fn delete_program(&self, program: ProgramId) {
        if let Some(native) = self.programs.borrow_mut().remove(&program.0) {
            unsafe { self.gl.delete_program(native) };
        }
    }

    fn use_program(&self, program: Option<ProgramId>) {
        let native = program.and_then(|p| self.programs.borrow().get(&p.0).copied());
        unsafe { self.gl.use_program(native) };
    }

    fn active_attributes(&self, program: ProgramId) -> Vec<ActiveVar> {
        let Some(native) = self.programs.borrow().get(&program.0).copied() else {
            return Vec::new();
        };
        let count = unsafe { self.gl.get_active_attributes(native) };
        (0..count)
            .filter_map(|i| unsafe { self.gl.get_active_attribute(native, i) })
            .map(|a| ActiveVar {
                name: a.name,
                raw_type: a.atype,
                array_size: a.size.max(1) as u32,
            })
            .collect()
    }

    fn active_uniforms(&self, program: ProgramId) -> Vec<ActiveVar> {
        let Some(native) = self.programs.borrow().get(&program.0).copied() else {
            return Vec::new();
        };
        let count = unsafe { self.gl.get_active_uniforms(native) };
        (0..count)
            .filter_map(|i| unsafe { self.gl.get_active_uniform(native, i) })
            .map(|u| ActiveVar {
                name: u.name,
                raw_type: u.utype,
                array_size: u.size.max(1) as u32,
            })
            .collect()
    }

    fn attrib_location(&self, program: ProgramId, name: &str) -> Option<u32> {
        let native = self.programs.borrow().get(&program.0).copied()?;
        unsafe { self.gl.get_attrib_location(native, name) }
    }

    fn uniform_location(&self, program: ProgramId, name: &str) -> Option<UniformLocation> {
        let native = self.programs.borrow().get(&program.0).copied()?;
        let location = unsafe { self.gl.get_uniform_location(native, name) }?;
        let id = self.alloc();
        self.uniforms.borrow_mut().insert(id, location);
        Some(UniformLocation(id))
    }

    fn uniform_f32(&self, location: UniformLocation, value: f32) {
        if let Some(loc) = self.uniforms.borrow().get(&location.0) {
            unsafe { self.gl.uniform_1_f32(Some(loc), value) };
        }
    }

    fn uniform_f32_vec(&self, location: UniformLocation, components: u8, values: &[f32]) {
        let uniforms = self.uniforms.borrow();
        let Some(loc) = uniforms.get(&location.0) else { return };
        unsafe {
            match components {
                2 => self.gl.uniform_2_f32_slice(Some(loc), values),
                3 => self.gl.uniform_3_f32_slice(Some(loc), values),
                4 => self.gl.uniform_4_f32_slice(Some(loc), values),
                _ => debug_assert!(false, "vector arity {components} out of range"),
            }
        }
    }

    fn uniform_i32(&self, location: UniformLocation, value: i32) {
        if let Some(loc) = self.uniforms.borrow().get(&location.0) {
            unsafe { self.gl.uniform_1_i32(Some(loc), value) };
        }
    }

    fn uniform_i32_vec(&self, location: UniformLocation, components: u8, values: &[i32]) {
        let uniforms = self.uniforms.borrow();
        let Some(loc) = uniforms.get(&location.0) else { return };
        unsafe {
            match components {
                2 => self.gl.uniform_2_i32_slice(Some(loc), values),
                3 => self.gl.uniform_3_i32_slice(Some(loc), values),
                4 => self.gl.uniform_4_i32_slice(Some(loc), values),
                _ => debug_assert!(false, "vector arity {components} out of range"),
            }
        }
    }

    fn uniform_matrix(&self, location: UniformLocation, rank: u8, values: &[f32]) {
        let uniforms = self.uniforms.borrow();
        let Some(loc) = uniforms.get(&location.0) else { return };
        unsafe {
            match rank {
                2 => self.gl.uniform_matrix_2_f32_slice(Some(loc), false, values),
                3 => self.gl.uniform_matrix_3_f32_slice(Some(loc), false, values),
                4 => self.gl.uniform_matrix_4_f32_slice(Some(loc), false, values),
                _ => debug_assert!(false, "matrix rank {rank} out of range"),
            }
        }
    }

    fn create_buffer(&self) -> BufferId {
        let id = self.alloc();
        if let Ok(native) = unsafe { self.gl.create_buffer() } {
            self.buffers.borrow_mut().insert(id, native);
        }
        BufferId(id)
    }

    fn bind_buffer(&self, kind: BufferKind, buffer: Option<BufferId>) {
        let native = buffer.and_then(|b| self.buffers.borrow().get(&b.0).copied());
        unsafe { self.gl.bind_buffer(gl_buffer_kind(kind), native) };
    }

    fn buffer_data(&self, kind: BufferKind, data: &[u8]) {
        unsafe {
            self.gl
                .buffer_data_u8_slice(gl_buffer_kind(kind), data, glow::STATIC_DRAW)
        };
    }

    fn delete_buffer(&self, buffer: BufferId) {
        if let Some(native) = self.buffers.borrow_mut().remove(&buffer.0) {
            unsafe { self.gl.delete_buffer(native) };
        }
    }

    fn enable_vertex_attrib(&self, location: u32) {
        unsafe { self.gl.enable_vertex_attrib_array(location) };
    }

    fn vertex_attrib_pointer(
        &self,
        location: u32,
        components: i32,
        scalar: ScalarKind,
        normalized: bool,
        stride: i32,
        offset: i32,
    ) {
        unsafe {
            self.gl.vertex_attrib_pointer_f32(
                location,
                components,
                gl_scalar(scalar),
                normalized,
                stride,
                offset,
            )
        };
    }

    fn draw_arrays(&self, topology: Topology, first: i32, count: i32) {
        unsafe { self.gl.draw_arrays(gl_topology(topology), first, count) };
    }

    fn draw_elements(&self, topology: Topology, count: i32, index_kind: ScalarKind) {
        unsafe {
            self.gl
                .draw_elements(gl_topology(topology), count, gl_scalar(index_kind), 0)
        };
    }

    fn create_texture(&self) -> TextureId {
        let id = self.alloc();
        if let Ok(native) = unsafe { self.gl.create_texture() } {
            self.textures.borrow_mut().insert(id, native);
        }
        TextureId(id)
    }

    fn delete_texture(&self, texture: TextureId) {
        if let Some(native) = self.textures.borrow_mut().remove(&texture.0) {
            unsafe { self.gl.delete_texture(native) };
        }
    }

    fn active_texture_unit(&self, unit: u32) {
        unsafe { self.gl.active_texture(glow::TEXTURE0 + unit) };
    }

    fn bind_texture(&self, target: TextureTarget, texture: Option<TextureId>) {
        let native = texture.and_then(|t| self.textures.borrow().get(&t.0).copied());
        unsafe { self.gl.bind_texture(gl_texture_target(target), native) };
    }

    fn tex_image_2d(&self, target: TexImageTarget, width: u32, height: u32, pixels: Option<&[u8]>) {
        unsafe {
            self.gl.tex_image_2d(
                gl_image_target(target),
                0,
                glow::RGBA8 as i32,
                width as i32,
                height as i32,
                0,
                glow::RGBA,
                glow::UNSIGNED_BYTE,
                glow::PixelUnpackData::Slice(pixels),
            )
        };
    }

    fn tex_parameters(&self, target: TextureTarget, policy: &SamplerPolicy) {
        let target = gl_texture_target(target);
        unsafe {
            self.gl
                .tex_parameter_i32(target, glow::TEXTURE_WRAP_S, gl_wrap(policy.wrap_s));
            self.gl
                .tex_parameter_i32(target, glow::TEXTURE_WRAP_T, gl_wrap(policy.wrap_t));
            self.gl.tex_parameter_i32(
                target,
                glow::TEXTURE_MIN_FILTER,
                gl_filter(policy.min_filter),
            );
            self.gl.tex_parameter_i32(
                target,
                glow::TEXTURE_MAG_FILTER,
                gl_filter(policy.mag_filter),
            );
        }
    }

    fn generate_mipmaps(&self, target: TextureTarget) {
        unsafe { self.gl.generate_mipmap(gl_texture_target(target)) };
    }

    fn set_viewport(&self, viewport: Viewport) {
        unsafe {
            self.gl
                .viewport(viewport.x, viewport.y, viewport.width, viewport.height)
        };
    }

    fn set_clear_color(&self, r: f32, g: f32, b: f32, a: f32) {
        unsafe { self.gl.clear_color(r, g, b, a) };
    }

    fn clear(&self, flags: ClearFlags) {
        let mut mask = 0;
        if flags.contains(ClearFlags::DEPTH) {
            mask |= glow::DEPTH_BUFFER_BIT;
        }
        if flags.contains(ClearFlags::COLOR) {
            mask |= glow::COLOR_BUFFER_BIT;
        }
        unsafe { self.gl.clear(mask) };
    }
}
