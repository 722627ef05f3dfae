//! Shader compilation and reflection.
//!
//! `compile` links a vertex/fragment pair and introspects the result so
//! callers never hand-declare attribute layouts or uniform setters; the
//! reflected tables drive attribute binding and `set_uniform` dispatch.

mod program;
mod types;

pub use program::{
    compile, AttribTable, Program, ReflectedAttrib, ShaderError, Uniform, UniformBinding,
    UniformTable, UniformValue,
};
pub use types::{GlslType, TypeInfo};
