//! Static draw resources
//!
//! The vertex format, the indexed quad, SPIR-V shader loading and the GPU objects
//! that stay alive for the whole renderer lifetime (pipeline, vertex and index
//! buffers). None of these depend on the swapchain, so a rebuild never touches them.

use std::mem::{offset_of, size_of};
use std::path::Path;

use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};

use crate::error::{Error, Result};
use crate::graphics_device::{
    BufferHandle, BufferUsage, DrawBuffers, Format, GraphicsDevice, IndexType, PipelineDesc,
    PipelineHandle, RenderPassHandle, VertexAttribute, VertexLayout,
};
use crate::{engine_bail_warn, engine_debug, engine_error};

/// First word of every SPIR-V module
pub const SPIRV_MAGIC: u32 = 0x0723_0203;

// ============================================================================
// Vertex
// ============================================================================

/// Vertex with a 2D position and an RGB color
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: Vec2,
    pub color: Vec3,
}

impl Vertex {
    pub const fn new(position: Vec2, color: Vec3) -> Self {
        Self { position, color }
    }

    /// One binding, per-vertex rate: location 0 = position, location 1 = color
    pub fn layout() -> VertexLayout {
        VertexLayout {
            stride: size_of::<Vertex>() as u32,
            attributes: vec![
                VertexAttribute {
                    location: 0,
                    format: Format::R32G32_SFLOAT,
                    offset: offset_of!(Vertex, position) as u32,
                },
                VertexAttribute {
                    location: 1,
                    format: Format::R32G32B32_SFLOAT,
                    offset: offset_of!(Vertex, color) as u32,
                },
            ],
        }
    }
}

// ============================================================================
// Geometry
// ============================================================================

/// Indexed triangle list
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u16>,
}

impl Geometry {
    /// Unit quad centered on the origin, corners red, green, blue and white
    pub fn quad() -> Self {
        Self {
            vertices: vec![
                Vertex::new(Vec2::new(-0.5, -0.5), Vec3::new(1.0, 0.0, 0.0)),
                Vertex::new(Vec2::new(0.5, -0.5), Vec3::new(0.0, 1.0, 0.0)),
                Vertex::new(Vec2::new(0.5, 0.5), Vec3::new(0.0, 0.0, 1.0)),
                Vertex::new(Vec2::new(-0.5, 0.5), Vec3::new(1.0, 1.0, 1.0)),
            ],
            indices: vec![0, 1, 2, 2, 3, 0],
        }
    }

    /// Check the index list describes whole triangles over existing vertices
    pub fn validate(&self) -> Result<()> {
        if self.vertices.is_empty() || self.indices.is_empty() {
            engine_bail_warn!("quad::Geometry", "Geometry has no vertices or no indices");
        }
        index_count_for_len(self.indices.len())?;
        if self.indices.len() % 3 != 0 {
            engine_bail_warn!("quad::Geometry",
                "Index count {} is not a multiple of 3", self.indices.len());
        }
        if let Some(&index) = self.indices.iter().find(|&&i| i as usize >= self.vertices.len()) {
            engine_bail_warn!("quad::Geometry",
                "Index {} out of range ({} vertices)", index, self.vertices.len());
        }
        Ok(())
    }

    /// Index count of the single draw call
    pub fn index_count(&self) -> Result<u32> {
        index_count_for_len(self.indices.len())
    }

    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }
}

/// Draw calls take a 32-bit index count
fn index_count_for_len(len: usize) -> Result<u32> {
    match u32::try_from(len) {
        Ok(count) => Ok(count),
        Err(_) => engine_bail_warn!("quad::Geometry", "{} indices do not fit in one draw call", len),
    }
}

// ============================================================================
// Shaders
// ============================================================================

/// Vertex + fragment SPIR-V pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderSet {
    vertex: Vec<u8>,
    fragment: Vec<u8>,
}

impl ShaderSet {
    /// Read both modules from disk
    pub fn load(vertex_path: impl AsRef<Path>, fragment_path: impl AsRef<Path>) -> Result<Self> {
        let vertex = read_module(vertex_path.as_ref())?;
        let fragment = read_module(fragment_path.as_ref())?;
        Self::from_bytes(vertex, fragment)
    }

    /// Wrap in-memory modules after checking they look like SPIR-V
    pub fn from_bytes(vertex: Vec<u8>, fragment: Vec<u8>) -> Result<Self> {
        check_spirv("vertex", &vertex)?;
        check_spirv("fragment", &fragment)?;
        Ok(Self { vertex, fragment })
    }

    pub fn vertex(&self) -> &[u8] {
        &self.vertex
    }

    pub fn fragment(&self) -> &[u8] {
        &self.fragment
    }
}

fn read_module(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|e| {
        engine_error!("quad::ShaderSet", "Failed to read shader '{}': {}", path.display(), e);
        Error::InvalidResource(format!("failed to read shader '{}': {}", path.display(), e))
    })
}

fn check_spirv(stage: &str, code: &[u8]) -> Result<()> {
    if code.is_empty() || code.len() % 4 != 0 {
        engine_bail_warn!("quad::ShaderSet",
            "{} shader is {} bytes, expected a non-empty multiple of 4", stage, code.len());
    }
    let magic = u32::from_le_bytes([code[0], code[1], code[2], code[3]]);
    if magic != SPIRV_MAGIC {
        engine_bail_warn!("quad::ShaderSet",
            "{} shader does not start with the SPIR-V magic number (found {:#010x})", stage, magic);
    }
    Ok(())
}

// ============================================================================
// StaticResources
// ============================================================================

/// Pipeline and buffers created once at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticResources {
    pub pipeline: PipelineHandle,
    pub vertex_buffer: BufferHandle,
    pub index_buffer: BufferHandle,
    pub index_count: u32,
}

impl StaticResources {
    /// Create the pipeline against `render_pass` and upload `geometry`
    pub fn create<D: GraphicsDevice + ?Sized>(
        device: &mut D,
        render_pass: RenderPassHandle,
        shaders: &ShaderSet,
        geometry: &Geometry,
    ) -> Result<Self> {
        geometry.validate()?;
        let index_count = geometry.index_count()?;

        let pipeline = device.create_pipeline(&PipelineDesc {
            render_pass,
            vertex_shader: shaders.vertex(),
            fragment_shader: shaders.fragment(),
            vertex_layout: Vertex::layout(),
        })?;

        let vertex_buffer = match device.create_buffer(BufferUsage::Vertex, geometry.vertex_bytes()) {
            Ok(buffer) => buffer,
            Err(e) => {
                device.destroy_pipeline(pipeline);
                return Err(e);
            }
        };

        let index_buffer = match device.create_buffer(BufferUsage::Index, geometry.index_bytes()) {
            Ok(buffer) => buffer,
            Err(e) => {
                device.destroy_buffer(vertex_buffer);
                device.destroy_pipeline(pipeline);
                return Err(e);
            }
        };

        engine_debug!("quad::StaticResources",
            "Uploaded {} vertices and {} indices", geometry.vertices.len(), geometry.indices.len());

        Ok(Self {
            pipeline,
            vertex_buffer,
            index_buffer,
            index_count,
        })
    }

    pub fn draw_buffers(&self) -> DrawBuffers {
        DrawBuffers {
            vertex_buffer: self.vertex_buffer,
            index_buffer: self.index_buffer,
            index_type: IndexType::U16,
            index_count: self.index_count,
        }
    }

    /// Release buffers then the pipeline
    pub fn destroy<D: GraphicsDevice + ?Sized>(&self, device: &mut D) {
        device.destroy_buffer(self.index_buffer);
        device.destroy_buffer(self.vertex_buffer);
        device.destroy_pipeline(self.pipeline);
    }
}

#[cfg(test)]
#[path = "resources_tests.rs"]
mod tests;
