use serde::Deserialize;

use crate::device::{BufferId, BufferKind, GlApi, GraphicsContext, Topology};
use crate::shader::{GlslType, TypeInfo};

fn default_array_size() -> u32 {
    1
}

/// One attribute in a vertex array's declared format.
#[derive(Debug, Clone, Deserialize)]
pub struct AttribDesc {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: GlslType,
    #[serde(default = "default_array_size")]
    pub size: u32,
}

/// One interleaved vertex array plus its format.
#[derive(Debug, Clone, Deserialize)]
pub struct VertexArrayDesc {
    pub array: Vec<f32>,
    pub format: Vec<AttribDesc>,
}

/// Complete geometry description: one or more vertex arrays, an optional
/// 16-bit index array, and a topology (triangles when unspecified).
///
/// This is also the on-disk JSON schema consumed by asynchronous loads.
#[derive(Debug, Clone, Deserialize)]
pub struct GeometryDesc {
    pub vertices: Vec<VertexArrayDesc>,
    #[serde(default)]
    pub indices: Option<Vec<u16>>,
    #[serde(default, rename = "primitive")]
    pub topology: Topology,
}

/// One attribute within an uploaded buffer's layout.
#[derive(Debug, Clone)]
pub struct BufferAttrib {
    pub name: String,
    /// Declaration-order slot.
    pub index: u32,
    /// Byte offset of this attribute within one vertex.
    pub offset: u32,
    pub ty: GlslType,
    pub info: TypeInfo,
}

/// Buffer-side vertex layout: declaration-ordered attributes with byte
/// offsets, and the total per-vertex stride.
#[derive(Debug, Clone, Default)]
pub struct VertexFormat {
    pub stride: u32,
    pub attribs: Vec<BufferAttrib>,
}

impl VertexFormat {
    /// Expands a declared format into offsets and a stride. Offsets
    /// accumulate in declaration order; stride is the running total.
    pub fn from_descs(descs: &[AttribDesc]) -> Self {
        let mut format = Self::default();
        for (index, desc) in descs.iter().enumerate() {
            let info = desc.ty.info(desc.size);
            format.attribs.push(BufferAttrib {
                name: desc.name.clone(),
                index: index as u32,
                offset: format.stride,
                ty: desc.ty,
                info,
            });
            format.stride += info.byte_size.unwrap_or(0);
        }
        format
    }
}

/// An uploaded vertex buffer with its layout.
#[derive(Debug)]
pub struct VertexBuffer {
    pub buffer: BufferId,
    pub format: VertexFormat,
}

/// An uploaded 16-bit index buffer.
#[derive(Debug)]
pub struct IndexBuffer {
    pub buffer: BufferId,
    pub count: i32,
}

/// GPU-resident geometry. Immutable once built.
#[derive(Debug)]
pub struct GpuGeometry {
    pub topology: Topology,
    pub vertex_buffers: Vec<VertexBuffer>,
    pub vertex_count: i32,
    pub index: Option<IndexBuffer>,
}

/// Uploads a geometry description, creating and filling its buffers.
///
/// The vertex count derives from the first array's length and stride; all
/// arrays are expected to describe the same number of vertices.
pub(crate) fn upload<D: GlApi>(
    ctx: &GraphicsContext<D>,
    desc: &GeometryDesc,
) -> Result<GpuGeometry, String> {
    if desc.vertices.is_empty() {
        return Err("at least one vertex array is required".to_owned());
    }

    let device = ctx.device();
    let mut vertex_buffers = Vec::with_capacity(desc.vertices.len());
    for array_desc in &desc.vertices {
        let format = VertexFormat::from_descs(&array_desc.format);
        if format.stride == 0 {
            return Err(format!(
                "vertex array {} has a zero-byte format",
                vertex_buffers.len()
            ));
        }

        let buffer = device.create_buffer();
        device.bind_buffer(BufferKind::Array, Some(buffer));
        device.buffer_data(BufferKind::Array, bytemuck::cast_slice(&array_desc.array));
        vertex_buffers.push(VertexBuffer { buffer, format });
    }

    // Arrays hold f32 data, so each vertex spans stride/4 elements.
    let first = &desc.vertices[0];
    let stride = vertex_buffers[0].format.stride;
    let vertex_count = (first.array.len() as u32 * 4 / stride) as i32;

    let index = match &desc.indices {
        Some(indices) => {
            let buffer = device.create_buffer();
            device.bind_buffer(BufferKind::ElementArray, Some(buffer));
            device.buffer_data(BufferKind::ElementArray, bytemuck::cast_slice(indices));
            Some(IndexBuffer {
                buffer,
                count: indices.len() as i32,
            })
        }
        None => None,
    };

    Ok(GpuGeometry {
        topology: desc.topology,
        vertex_buffers,
        vertex_count,
        index,
    })
}
