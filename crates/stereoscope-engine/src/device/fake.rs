//! Scripted in-memory device for tests.
//!
//! The fake journals every call as a readable line so tests can assert on
//! ordering and arguments, and serves reflection results from a script set
//! up before `compile` runs.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use super::api::{
    ActiveVar, BufferId, BufferKind, ClearFlags, GlApi, ProgramId, SamplerPolicy, ScalarKind,
    ShaderId, ShaderStage, TexImageTarget, TextureId, TextureTarget, Topology, UniformLocation,
};
use crate::coords::Viewport;

/// Reflection and compile/link outcomes for the next program compiled on a
/// [`FakeDevice`].
#[derive(Debug, Clone)]
pub struct ProgramScript {
    pub vertex_ok: bool,
    pub fragment_ok: bool,
    pub link_ok: bool,
    pub info_log: String,
    pub attribs: Vec<ActiveVar>,
    pub uniforms: Vec<ActiveVar>,
}

impl Default for ProgramScript {
    fn default() -> Self {
        Self {
            vertex_ok: true,
            fragment_ok: true,
            link_ok: true,
            info_log: "0:1: scripted failure".to_owned(),
            attribs: Vec::new(),
            uniforms: Vec::new(),
        }
    }
}

#[derive(Default)]
pub struct FakeDevice {
    next_id: Cell<u32>,
    calls: RefCell<Vec<String>>,
    script: RefCell<ProgramScript>,
    shader_stages: RefCell<HashMap<u32, ShaderStage>>,
    uniform_names: RefCell<HashMap<u32, String>>,
}

impl FakeDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs the script consulted by the next compile/link/reflect pass.
    pub fn set_script(&self, script: ProgramScript) {
        *self.script.borrow_mut() = script;
    }

    /// Snapshot of the call journal.
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    /// Count of journal lines starting with `prefix`.
    pub fn count_calls(&self, prefix: &str) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    fn record(&self, line: String) {
        self.calls.borrow_mut().push(line);
    }

    fn alloc(&self) -> u32 {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        id + 1
    }
}

impl GlApi for FakeDevice {
    fn create_shader(&self, stage: ShaderStage) -> ShaderId {
        let id = self.alloc();
        self.shader_stages.borrow_mut().insert(id, stage);
        self.record(format!("create_shader {}", stage.label()));
        ShaderId(id)
    }

    fn shader_source(&self, _shader: ShaderId, _source: &str) {}

    fn compile_shader(&self, shader: ShaderId) -> Result<(), String> {
        let stage = self.shader_stages.borrow()[&shader.0];
        let script = self.script.borrow();
        let ok = match stage {
            ShaderStage::Vertex => script.vertex_ok,
            ShaderStage::Fragment => script.fragment_ok,
        };
        self.record(format!("compile_shader {}", stage.label()));
        if ok { Ok(()) } else { Err(script.info_log.clone()) }
    }

    fn delete_shader(&self, shader: ShaderId) {
        let stage = self.shader_stages.borrow()[&shader.0];
        self.record(format!("delete_shader {}", stage.label()));
    }

    fn create_program(&self) -> ProgramId {
        self.record("create_program".to_owned());
        ProgramId(self.alloc())
    }

    fn attach_shader(&self, _program: ProgramId, shader: ShaderId) {
        let stage = self.shader_stages.borrow()[&shader.0];
        self.record(format!("attach_shader {}", stage.label()));
    }

    fn link_program(&self, _program: ProgramId) -> Result<(), String> {
        let script = self.script.borrow();
        self.record("link_program".to_owned());
        if script.link_ok {
            Ok(())
        } else {
            Err(script.info_log.clone())
        }
    }

    fn delete_program(&self, _program: ProgramId) {
        self.record("delete_program".to_owned());
    }

    fn use_program(&self, program: Option<ProgramId>) {
        self.record(format!("use_program {:?}", program.map(|p| p.0)));
    }

    fn active_attributes(&self, _program: ProgramId) -> Vec<ActiveVar> {
        self.script.borrow().attribs.clone()
    }

    fn active_uniforms(&self, _program: ProgramId) -> Vec<ActiveVar> {
        self.script.borrow().uniforms.clone()
    }

    fn attrib_location(&self, _program: ProgramId, name: &str) -> Option<u32> {
        self.script
            .borrow()
            .attribs
            .iter()
            .position(|a| a.name == name)
            .map(|i| i as u32)
    }

    fn uniform_location(&self, _program: ProgramId, name: &str) -> Option<UniformLocation> {
        let id = self.alloc();
        self.uniform_names.borrow_mut().insert(id, name.to_owned());
        Some(UniformLocation(id))
    }

    fn uniform_f32(&self, location: UniformLocation, value: f32) {
        let name = self.uniform_names.borrow()[&location.0].clone();
        self.record(format!("uniform_f32 {name} {value}"));
    }

    fn uniform_f32_vec(&self, location: UniformLocation, components: u8, values: &[f32]) {
        let name = self.uniform_names.borrow()[&location.0].clone();
        self.record(format!("uniform_f32_vec{components} {name} {values:?}"));
    }

    fn uniform_i32(&self, location: UniformLocation, value: i32) {
        let name = self.uniform_names.borrow()[&location.0].clone();
        self.record(format!("uniform_i32 {name} {value}"));
    }

    fn uniform_i32_vec(&self, location: UniformLocation, components: u8, values: &[i32]) {
        let name = self.uniform_names.borrow()[&location.0].clone();
        self.record(format!("uniform_i32_vec{components} {name} {values:?}"));
    }

    fn uniform_matrix(&self, location: UniformLocation, rank: u8, values: &[f32]) {
        let name = self.uniform_names.borrow()[&location.0].clone();
        self.record(format!("uniform_matrix{rank} {name} len={}", values.len()));
    }

    fn create_buffer(&self) -> BufferId {
        self.record("create_buffer".to_owned());
        BufferId(self.alloc())
    }

    fn bind_buffer(&self, kind: BufferKind, buffer: Option<BufferId>) {
        self.record(format!("bind_buffer {kind:?} {:?}", buffer.map(|b| b.0)));
    }

    fn buffer_data(&self, kind: BufferKind, data: &[u8]) {
        self.record(format!("buffer_data {kind:?} {} bytes", data.len()));
    }

    fn delete_buffer(&self, buffer: BufferId) {
        self.record(format!("delete_buffer {}", buffer.0));
    }

    fn enable_vertex_attrib(&self, location: u32) {
        self.record(format!("enable_vertex_attrib {location}"));
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
        self.record(format!(
            "vertex_attrib_pointer loc={location} comps={components} {scalar:?} norm={normalized} stride={stride} offset={offset}"
        ));
    }

    fn draw_arrays(&self, topology: Topology, first: i32, count: i32) {
        self.record(format!("draw_arrays {topology:?} {first} {count}"));
    }

    fn draw_elements(&self, topology: Topology, count: i32, index_kind: ScalarKind) {
        self.record(format!("draw_elements {topology:?} {count} {index_kind:?}"));
    }

    fn create_texture(&self) -> TextureId {
        self.record("create_texture".to_owned());
        TextureId(self.alloc())
    }

    fn delete_texture(&self, texture: TextureId) {
        self.record(format!("delete_texture {}", texture.0));
    }

    fn active_texture_unit(&self, unit: u32) {
        self.record(format!("active_texture_unit {unit}"));
    }

    fn bind_texture(&self, target: TextureTarget, texture: Option<TextureId>) {
        self.record(format!("bind_texture {target:?} {:?}", texture.map(|t| t.0)));
    }

    fn tex_image_2d(&self, target: TexImageTarget, width: u32, height: u32, pixels: Option<&[u8]>) {
        self.record(format!(
            "tex_image_2d {target:?} {width}x{height} pixels={}",
            pixels.is_some()
        ));
    }

    fn tex_parameters(&self, target: TextureTarget, policy: &SamplerPolicy) {
        self.record(format!(
            "tex_parameters {target:?} wrap={:?}/{:?} filter={:?}/{:?}",
            policy.wrap_s, policy.wrap_t, policy.min_filter, policy.mag_filter
        ));
    }

    fn generate_mipmaps(&self, target: TextureTarget) {
        self.record(format!("generate_mipmaps {target:?}"));
    }

    fn set_viewport(&self, viewport: Viewport) {
        self.record(format!(
            "set_viewport {} {} {} {}",
            viewport.x, viewport.y, viewport.width, viewport.height
        ));
    }

    fn set_clear_color(&self, r: f32, g: f32, b: f32, a: f32) {
        self.record(format!("set_clear_color {r} {g} {b} {a}"));
    }

    fn clear(&self, flags: ClearFlags) {
        self.record(format!("clear {flags:?}"));
    }
}
