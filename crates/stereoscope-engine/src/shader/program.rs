use std::collections::HashMap;

use thiserror::Error;

use super::types::{GlslType, TypeInfo};
use crate::device::{GlApi, GraphicsContext, ProgramId, ShaderId, ShaderStage, UniformLocation};

/// Construction-time shader failure. A failed compile never yields a usable
/// program; all partially created native objects are released before the
/// error propagates.
#[derive(Debug, Error)]
pub enum ShaderError {
    #[error("{} shader failed to compile: {log}", stage.label())]
    Compile { stage: ShaderStage, log: String },

    #[error("program failed to link: {log}")]
    Link { log: String },

    #[error("uniform `{name}` has unsupported type {raw_type:#06x}")]
    UnsupportedUniformType { name: String, raw_type: u32 },
}

/// One attribute reflected from a linked program.
#[derive(Debug, Clone)]
pub struct ReflectedAttrib {
    /// Enumeration order slot.
    pub index: u32,
    /// Location to bind vertex data against.
    pub location: u32,
    pub ty: GlslType,
    pub info: TypeInfo,
}

/// Attribute layout reflected from a program: name → descriptor, plus the
/// summed stride of all active attributes.
#[derive(Debug, Clone, Default)]
pub struct AttribTable {
    pub stride: u32,
    attribs: HashMap<String, ReflectedAttrib>,
}

impl AttribTable {
    pub fn get(&self, name: &str) -> Option<&ReflectedAttrib> {
        self.attribs.get(name)
    }

    pub fn len(&self) -> usize {
        self.attribs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attribs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ReflectedAttrib)> {
        self.attribs.iter()
    }
}

/// How a uniform is set, decided once at reflection time.
///
/// Samplers, integers and booleans all set through the integer setters;
/// matrices set column-major with no transpose.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum UniformBinding {
    FloatScalar,
    /// Float vector of the given rank (2-4).
    FloatVec(u8),
    IntScalar,
    /// Integer/boolean vector of the given rank (2-4).
    IntVec(u8),
    /// Square float matrix of the given rank (2-4).
    Matrix(u8),
}

fn binding_for(ty: GlslType) -> UniformBinding {
    use GlslType::*;
    match ty {
        Float => UniformBinding::FloatScalar,
        FloatVec2 => UniformBinding::FloatVec(2),
        FloatVec3 => UniformBinding::FloatVec(3),
        FloatVec4 => UniformBinding::FloatVec(4),
        IntVec2 | BoolVec2 => UniformBinding::IntVec(2),
        IntVec3 | BoolVec3 => UniformBinding::IntVec(3),
        IntVec4 | BoolVec4 => UniformBinding::IntVec(4),
        Mat2 => UniformBinding::Matrix(2),
        Mat3 => UniformBinding::Matrix(3),
        Mat4 => UniformBinding::Matrix(4),
        // Samplers take a texture unit; every remaining scalar kind sets as
        // a single integer.
        Byte | UnsignedByte | Short | UnsignedShort | Int | UnsignedInt | Bool | Sampler2d
        | SamplerCube => UniformBinding::IntScalar,
    }
}

/// One uniform reflected from a linked program.
#[derive(Debug, Clone)]
pub struct Uniform {
    pub index: u32,
    pub location: UniformLocation,
    pub ty: GlslType,
    pub info: TypeInfo,
    pub binding: UniformBinding,
}

/// Uniform table reflected from a program: name → descriptor.
#[derive(Debug, Clone, Default)]
pub struct UniformTable {
    uniforms: HashMap<String, Uniform>,
}

impl UniformTable {
    pub fn get(&self, name: &str) -> Option<&Uniform> {
        self.uniforms.get(name)
    }

    pub fn len(&self) -> usize {
        self.uniforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.uniforms.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Uniform)> {
        self.uniforms.iter()
    }
}

/// Value passed to [`Program::set_uniform`].
#[derive(Debug, Copy, Clone)]
pub enum UniformValue<'a> {
    Float(f32),
    FloatVec(&'a [f32]),
    Int(i32),
    IntVec(&'a [i32]),
    /// Column-major matrix data.
    Matrix(&'a [f32]),
}

/// A compiled and linked program together with its reflected attribute and
/// uniform tables. Immutable after creation; destroyed with its context.
#[derive(Debug)]
pub struct Program {
    id: ProgramId,
    attribs: AttribTable,
    uniforms: UniformTable,
}

impl Program {
    #[inline]
    pub fn id(&self) -> ProgramId {
        self.id
    }

    #[inline]
    pub fn attribs(&self) -> &AttribTable {
        &self.attribs
    }

    #[inline]
    pub fn uniforms(&self) -> &UniformTable {
        &self.uniforms
    }

    /// Sets one uniform by name.
    ///
    /// The program must currently be in use. Unknown names and
    /// binding/payload mismatches are logged and skipped; reflection already
    /// validated every name this program can accept, so a miss here is an
    /// application bug rather than a render-loop error.
    pub fn set_uniform<D: GlApi>(&self, device: &D, name: &str, value: UniformValue<'_>) {
        let Some(uniform) = self.uniforms.get(name) else {
            log::warn!("uniform `{name}` is not active in this program");
            return;
        };

        match (uniform.binding, value) {
            (UniformBinding::FloatScalar, UniformValue::Float(v)) => {
                device.uniform_f32(uniform.location, v);
            }
            (UniformBinding::FloatVec(n), UniformValue::FloatVec(values)) => {
                device.uniform_f32_vec(uniform.location, n, values);
            }
            (UniformBinding::IntScalar, UniformValue::Int(v)) => {
                device.uniform_i32(uniform.location, v);
            }
            (UniformBinding::IntVec(n), UniformValue::IntVec(values)) => {
                device.uniform_i32_vec(uniform.location, n, values);
            }
            (UniformBinding::Matrix(rank), UniformValue::Matrix(values)) => {
                device.uniform_matrix(uniform.location, rank, values);
            }
            (binding, value) => {
                log::warn!("uniform `{name}` expects {binding:?}, got {value:?}");
            }
        }
    }
}

/// Compiles and links a vertex/fragment pair, then reflects the result.
///
/// Shader objects are released once the link outcome is known, success or
/// failure; the program object is released on any failure.
pub fn compile<D: GlApi>(
    ctx: &GraphicsContext<D>,
    vertex_source: &str,
    fragment_source: &str,
) -> Result<Program, ShaderError> {
    let device = ctx.device();
    let program = device.create_program();

    let vert = match compile_stage(device, ShaderStage::Vertex, vertex_source) {
        Ok(shader) => shader,
        Err(err) => {
            device.delete_program(program);
            return Err(err);
        }
    };
    device.attach_shader(program, vert);

    let frag = match compile_stage(device, ShaderStage::Fragment, fragment_source) {
        Ok(shader) => shader,
        Err(err) => {
            device.delete_shader(vert);
            device.delete_program(program);
            return Err(err);
        }
    };
    device.attach_shader(program, frag);

    let linked = device.link_program(program);

    // Shader objects are no longer needed once linked (or failed).
    device.delete_shader(vert);
    device.delete_shader(frag);

    if let Err(log) = linked {
        device.delete_program(program);
        return Err(ShaderError::Link { log });
    }

    match reflect(device, program) {
        Ok((attribs, uniforms)) => Ok(Program {
            id: program,
            attribs,
            uniforms,
        }),
        Err(err) => {
            device.delete_program(program);
            Err(err)
        }
    }
}

fn compile_stage<D: GlApi>(
    device: &D,
    stage: ShaderStage,
    source: &str,
) -> Result<ShaderId, ShaderError> {
    let shader = device.create_shader(stage);
    device.shader_source(shader, source);
    if let Err(log) = device.compile_shader(shader) {
        device.delete_shader(shader);
        return Err(ShaderError::Compile { stage, log });
    }
    Ok(shader)
}

fn reflect<D: GlApi>(
    device: &D,
    program: ProgramId,
) -> Result<(AttribTable, UniformTable), ShaderError> {
    let mut attribs = AttribTable::default();
    for (index, var) in device.active_attributes(program).into_iter().enumerate() {
        let ty = decode(&var)?;
        let info = ty.info(var.array_size);
        let Some(location) = device.attrib_location(program, &var.name) else {
            // Active but unlocatable attributes do not occur on conforming
            // implementations; skip rather than fail the whole program.
            log::warn!("active attribute `{}` has no location", var.name);
            continue;
        };
        attribs.stride += info.byte_size.unwrap_or(0);
        attribs.attribs.insert(
            var.name,
            ReflectedAttrib {
                index: index as u32,
                location,
                ty,
                info,
            },
        );
    }

    let mut uniforms = UniformTable::default();
    for (index, var) in device.active_uniforms(program).into_iter().enumerate() {
        let ty = decode(&var)?;
        let info = ty.info(var.array_size);
        let Some(location) = device.uniform_location(program, &var.name) else {
            log::warn!("active uniform `{}` has no location", var.name);
            continue;
        };
        uniforms.uniforms.insert(
            var.name,
            Uniform {
                index: index as u32,
                location,
                ty,
                info,
                binding: binding_for(ty),
            },
        );
    }

    Ok((attribs, uniforms))
}

fn decode(var: &crate::device::ActiveVar) -> Result<GlslType, ShaderError> {
    GlslType::from_raw(var.raw_type).ok_or_else(|| ShaderError::UnsupportedUniformType {
        name: var.name.clone(),
        raw_type: var.raw_type,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::fake::{FakeDevice, ProgramScript};
    use crate::device::{ActiveVar, ContextConfig};

    fn ctx() -> GraphicsContext<FakeDevice> {
        GraphicsContext::new(FakeDevice::new(), ContextConfig::default())
    }

    fn var(name: &str, ty: GlslType, size: u32) -> ActiveVar {
        ActiveVar {
            name: name.to_owned(),
            raw_type: ty.raw(),
            array_size: size,
        }
    }

    const VS: &str = "void main() { gl_Position = vec4(0.0); }";
    const FS: &str = "void main() { gl_FragColor = vec4(1.0); }";

    // ── reflection ────────────────────────────────────────────────────────

    #[test]
    fn reflects_one_descriptor_per_active_uniform() {
        let ctx = ctx();
        ctx.device().set_script(ProgramScript {
            attribs: vec![
                var("position", GlslType::FloatVec3, 1),
                var("uv", GlslType::FloatVec2, 1),
            ],
            uniforms: vec![
                var("projectionMat", GlslType::Mat4, 1),
                var("viewMat", GlslType::Mat4, 1),
                var("texture0", GlslType::Sampler2d, 1),
                var("intensity", GlslType::Float, 1),
            ],
            ..ProgramScript::default()
        });

        let program = compile(&ctx, VS, FS).unwrap();

        assert_eq!(program.uniforms().len(), 4);
        let proj = program.uniforms().get("projectionMat").unwrap();
        assert_eq!(proj.info.byte_size, Some(64));
        assert_eq!(proj.binding, UniformBinding::Matrix(4));

        let sampler = program.uniforms().get("texture0").unwrap();
        assert_eq!(sampler.info.byte_size, None);
        assert_eq!(sampler.binding, UniformBinding::IntScalar);

        let intensity = program.uniforms().get("intensity").unwrap();
        assert_eq!(intensity.info.byte_size, Some(4));
        assert_eq!(intensity.binding, UniformBinding::FloatScalar);
    }

    #[test]
    fn attrib_table_stride_is_sum_of_attribute_sizes() {
        let ctx = ctx();
        ctx.device().set_script(ProgramScript {
            attribs: vec![
                var("position", GlslType::FloatVec3, 1),
                var("uv", GlslType::FloatVec2, 1),
            ],
            ..ProgramScript::default()
        });

        let program = compile(&ctx, VS, FS).unwrap();
        assert_eq!(program.attribs().stride, 12 + 8);
        assert_eq!(program.attribs().get("position").unwrap().location, 0);
        assert_eq!(program.attribs().get("uv").unwrap().location, 1);
    }

    #[test]
    fn boolean_vectors_bind_through_integer_setters() {
        let ctx = ctx();
        ctx.device().set_script(ProgramScript {
            uniforms: vec![var("flags", GlslType::BoolVec3, 1)],
            ..ProgramScript::default()
        });

        let program = compile(&ctx, VS, FS).unwrap();
        assert_eq!(
            program.uniforms().get("flags").unwrap().binding,
            UniformBinding::IntVec(3)
        );
    }

    // ── failures ──────────────────────────────────────────────────────────

    #[test]
    fn vertex_compile_failure_releases_objects() {
        let ctx = ctx();
        ctx.device().set_script(ProgramScript {
            vertex_ok: false,
            ..ProgramScript::default()
        });

        let err = compile(&ctx, "bad", FS).unwrap_err();
        assert!(matches!(
            err,
            ShaderError::Compile { stage: ShaderStage::Vertex, .. }
        ));

        let calls = ctx.device().calls();
        assert!(calls.contains(&"delete_shader vertex".to_owned()));
        assert!(calls.contains(&"delete_program".to_owned()));
    }

    #[test]
    fn fragment_compile_failure_names_the_stage() {
        let ctx = ctx();
        ctx.device().set_script(ProgramScript {
            fragment_ok: false,
            ..ProgramScript::default()
        });

        let err = compile(&ctx, VS, "bad").unwrap_err();
        assert!(matches!(
            err,
            ShaderError::Compile { stage: ShaderStage::Fragment, .. }
        ));

        // Both the already-compiled vertex shader and the program must go.
        let calls = ctx.device().calls();
        assert!(calls.contains(&"delete_shader vertex".to_owned()));
        assert!(calls.contains(&"delete_shader fragment".to_owned()));
        assert!(calls.contains(&"delete_program".to_owned()));
    }

    #[test]
    fn link_failure_carries_the_log() {
        let ctx = ctx();
        ctx.device().set_script(ProgramScript {
            link_ok: false,
            info_log: "varying mismatch".to_owned(),
            ..ProgramScript::default()
        });

        match compile(&ctx, VS, FS) {
            Err(ShaderError::Link { log }) => assert_eq!(log, "varying mismatch"),
            other => panic!("expected link error, got {other:?}"),
        }
        assert_eq!(ctx.device().count_calls("delete_program"), 1);
        assert_eq!(ctx.device().count_calls("delete_shader"), 2);
    }

    #[test]
    fn unsupported_uniform_type_fails_reflection() {
        let ctx = ctx();
        ctx.device().set_script(ProgramScript {
            uniforms: vec![ActiveVar {
                name: "volume".to_owned(),
                raw_type: 0x8B5F, // SAMPLER_3D
                array_size: 1,
            }],
            ..ProgramScript::default()
        });

        match compile(&ctx, VS, FS) {
            Err(ShaderError::UnsupportedUniformType { name, raw_type }) => {
                assert_eq!(name, "volume");
                assert_eq!(raw_type, 0x8B5F);
            }
            other => panic!("expected unsupported-type error, got {other:?}"),
        }
        assert_eq!(ctx.device().count_calls("delete_program"), 1);
    }

    // ── setters ───────────────────────────────────────────────────────────

    #[test]
    fn set_uniform_dispatches_by_binding() {
        let ctx = ctx();
        ctx.device().set_script(ProgramScript {
            uniforms: vec![
                var("projectionMat", GlslType::Mat4, 1),
                var("texture0", GlslType::Sampler2d, 1),
                var("tint", GlslType::FloatVec4, 1),
            ],
            ..ProgramScript::default()
        });

        let program = compile(&ctx, VS, FS).unwrap();
        ctx.device().clear_calls();

        let mat = [0.0f32; 16];
        program.set_uniform(ctx.device(), "projectionMat", UniformValue::Matrix(&mat));
        program.set_uniform(ctx.device(), "texture0", UniformValue::Int(0));
        program.set_uniform(ctx.device(), "tint", UniformValue::FloatVec(&[1.0, 0.0, 0.0, 1.0]));

        let calls = ctx.device().calls();
        assert_eq!(calls[0], "uniform_matrix4 projectionMat len=16");
        assert_eq!(calls[1], "uniform_i32 texture0 0");
        assert!(calls[2].starts_with("uniform_f32_vec4 tint"));
    }

    #[test]
    fn mismatched_payload_is_skipped() {
        let ctx = ctx();
        ctx.device().set_script(ProgramScript {
            uniforms: vec![var("tint", GlslType::FloatVec4, 1)],
            ..ProgramScript::default()
        });

        let program = compile(&ctx, VS, FS).unwrap();
        ctx.device().clear_calls();

        program.set_uniform(ctx.device(), "tint", UniformValue::Int(3));
        program.set_uniform(ctx.device(), "missing", UniformValue::Float(1.0));
        assert!(ctx.device().calls().is_empty());
    }
}
