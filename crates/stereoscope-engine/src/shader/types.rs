//! The fixed GLSL type table used by reflection.
//!
//! Attribute pointers and uniform setters only understand primitive scalar
//! types, while program introspection reports composite tags (`vec3`,
//! `mat4`, ...). This table decodes a composite tag into component count,
//! underlying scalar, and byte size.

use crate::device::ScalarKind;

// GL type tags, as reported by program introspection. These values are part
// of the GL ABI and stable across implementations.
pub(crate) mod gl_type {
    pub const BYTE: u32 = 0x1400;
    pub const UNSIGNED_BYTE: u32 = 0x1401;
    pub const SHORT: u32 = 0x1402;
    pub const UNSIGNED_SHORT: u32 = 0x1403;
    pub const INT: u32 = 0x1404;
    pub const UNSIGNED_INT: u32 = 0x1405;
    pub const FLOAT: u32 = 0x1406;
    pub const FLOAT_VEC2: u32 = 0x8B50;
    pub const FLOAT_VEC3: u32 = 0x8B51;
    pub const FLOAT_VEC4: u32 = 0x8B52;
    pub const INT_VEC2: u32 = 0x8B53;
    pub const INT_VEC3: u32 = 0x8B54;
    pub const INT_VEC4: u32 = 0x8B55;
    pub const BOOL: u32 = 0x8B56;
    pub const BOOL_VEC2: u32 = 0x8B57;
    pub const BOOL_VEC3: u32 = 0x8B58;
    pub const BOOL_VEC4: u32 = 0x8B59;
    pub const FLOAT_MAT2: u32 = 0x8B5A;
    pub const FLOAT_MAT3: u32 = 0x8B5B;
    pub const FLOAT_MAT4: u32 = 0x8B5C;
    pub const SAMPLER_2D: u32 = 0x8B5E;
    pub const SAMPLER_CUBE: u32 = 0x8B60;
}

/// Composite GLSL type of an active attribute or uniform.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GlslType {
    Byte,
    UnsignedByte,
    Short,
    UnsignedShort,
    Int,
    UnsignedInt,
    Float,
    Bool,
    FloatVec2,
    FloatVec3,
    FloatVec4,
    IntVec2,
    IntVec3,
    IntVec4,
    BoolVec2,
    BoolVec3,
    BoolVec4,
    Mat2,
    Mat3,
    Mat4,
    Sampler2d,
    SamplerCube,
}

/// Decoded layout of one attribute or uniform.
///
/// `scalar`/`byte_size` are `None` for opaque sampler types, which occupy no
/// client-visible memory.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct TypeInfo {
    pub components: u32,
    pub scalar: Option<ScalarKind>,
    pub byte_size: Option<u32>,
}

impl GlslType {
    /// Decodes a raw GL type tag; `None` for tags outside the supported set.
    pub fn from_raw(raw: u32) -> Option<Self> {
        use gl_type::*;
        Some(match raw {
            BYTE => Self::Byte,
            UNSIGNED_BYTE => Self::UnsignedByte,
            SHORT => Self::Short,
            UNSIGNED_SHORT => Self::UnsignedShort,
            INT => Self::Int,
            UNSIGNED_INT => Self::UnsignedInt,
            FLOAT => Self::Float,
            BOOL => Self::Bool,
            FLOAT_VEC2 => Self::FloatVec2,
            FLOAT_VEC3 => Self::FloatVec3,
            FLOAT_VEC4 => Self::FloatVec4,
            INT_VEC2 => Self::IntVec2,
            INT_VEC3 => Self::IntVec3,
            INT_VEC4 => Self::IntVec4,
            BOOL_VEC2 => Self::BoolVec2,
            BOOL_VEC3 => Self::BoolVec3,
            BOOL_VEC4 => Self::BoolVec4,
            FLOAT_MAT2 => Self::Mat2,
            FLOAT_MAT3 => Self::Mat3,
            FLOAT_MAT4 => Self::Mat4,
            SAMPLER_2D => Self::Sampler2d,
            SAMPLER_CUBE => Self::SamplerCube,
            _ => return None,
        })
    }

    pub fn raw(self) -> u32 {
        use gl_type::*;
        match self {
            Self::Byte => BYTE,
            Self::UnsignedByte => UNSIGNED_BYTE,
            Self::Short => SHORT,
            Self::UnsignedShort => UNSIGNED_SHORT,
            Self::Int => INT,
            Self::UnsignedInt => UNSIGNED_INT,
            Self::Float => FLOAT,
            Self::Bool => BOOL,
            Self::FloatVec2 => FLOAT_VEC2,
            Self::FloatVec3 => FLOAT_VEC3,
            Self::FloatVec4 => FLOAT_VEC4,
            Self::IntVec2 => INT_VEC2,
            Self::IntVec3 => INT_VEC3,
            Self::IntVec4 => INT_VEC4,
            Self::BoolVec2 => BOOL_VEC2,
            Self::BoolVec3 => BOOL_VEC3,
            Self::BoolVec4 => BOOL_VEC4,
            Self::Mat2 => FLOAT_MAT2,
            Self::Mat3 => FLOAT_MAT3,
            Self::Mat4 => FLOAT_MAT4,
            Self::Sampler2d => SAMPLER_2D,
            Self::SamplerCube => SAMPLER_CUBE,
        }
    }

    /// Vector rank (2-4), matrix rank squared, or 1 for scalars/samplers.
    fn rank_components(self) -> u32 {
        match self {
            Self::FloatVec2 | Self::IntVec2 | Self::BoolVec2 | Self::Mat2 => 2,
            Self::FloatVec3 | Self::IntVec3 | Self::BoolVec3 | Self::Mat3 => 3,
            Self::FloatVec4 | Self::IntVec4 | Self::BoolVec4 | Self::Mat4 => 4,
            _ => 1,
        }
    }

    fn scalar(self) -> Option<ScalarKind> {
        Some(match self {
            Self::Byte => ScalarKind::Byte,
            Self::UnsignedByte => ScalarKind::UnsignedByte,
            Self::Short => ScalarKind::Short,
            Self::UnsignedShort => ScalarKind::UnsignedShort,
            Self::Int | Self::IntVec2 | Self::IntVec3 | Self::IntVec4 => ScalarKind::Int,
            Self::UnsignedInt => ScalarKind::UnsignedInt,
            Self::Float
            | Self::FloatVec2
            | Self::FloatVec3
            | Self::FloatVec4
            | Self::Mat2
            | Self::Mat3
            | Self::Mat4 => ScalarKind::Float,
            Self::Bool | Self::BoolVec2 | Self::BoolVec3 | Self::BoolVec4 => ScalarKind::Bool,
            Self::Sampler2d | Self::SamplerCube => return None,
        })
    }

    /// Full layout for this type with the given array arity.
    ///
    /// Vectors contribute rank components, matrices rank² components; the
    /// array arity multiplies into both the component count and the byte
    /// size, matching how introspection reports arrayed variables.
    pub fn info(self, array_size: u32) -> TypeInfo {
        let arity = array_size.max(1);
        let scalar = self.scalar();

        let components = match self {
            Self::Mat2 | Self::Mat3 | Self::Mat4 => {
                let rank = self.rank_components();
                arity * rank * rank
            }
            _ => arity * self.rank_components(),
        };

        TypeInfo {
            components,
            scalar,
            byte_size: scalar.map(|s| s.byte_size() * components),
        }
    }
}
