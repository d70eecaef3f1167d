/// Unit tests for the vertex layout, quad geometry, shader loading and static resources

use std::io::Write;

use crate::error::Error;
use crate::graphics_device::mock_graphics_device::*;
use crate::graphics_device::{BufferUsage, Format, GraphicsDevice, IndexType};
use crate::resources::*;
use glam::{Vec2, Vec3};

fn spirv(words: usize) -> Vec<u8> {
    let mut code = SPIRV_MAGIC.to_le_bytes().to_vec();
    code.resize(words * 4, 0);
    code
}

fn temp_file(name: &str, bytes: &[u8]) -> std::path::PathBuf {
    let path = std::env::temp_dir().join(format!("quad_engine_{}_{}", std::process::id(), name));
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(bytes).unwrap();
    path
}

// ============================================================================
// VERTEX LAYOUT
// ============================================================================

#[test]
fn test_vertex_is_tightly_packed() {
    assert_eq!(std::mem::size_of::<Vertex>(), 20);
}

#[test]
fn test_vertex_layout() {
    let layout = Vertex::layout();
    assert_eq!(layout.stride, 20);
    assert_eq!(layout.attributes.len(), 2);
    assert_eq!((layout.attributes[0].location, layout.attributes[0].format, layout.attributes[0].offset),
        (0, Format::R32G32_SFLOAT, 0));
    assert_eq!((layout.attributes[1].location, layout.attributes[1].format, layout.attributes[1].offset),
        (1, Format::R32G32B32_SFLOAT, 8));
}

// ============================================================================
// GEOMETRY
// ============================================================================

#[test]
fn test_quad_geometry() {
    let quad = Geometry::quad();
    assert_eq!(quad.vertices.len(), 4);
    assert_eq!(quad.indices, vec![0, 1, 2, 2, 3, 0]);
    assert_eq!(quad.vertices[0].color, Vec3::new(1.0, 0.0, 0.0));
    assert_eq!(quad.vertices[3].color, Vec3::ONE);
    assert!(quad.validate().is_ok());
}

#[test]
fn test_quad_byte_sizes() {
    let quad = Geometry::quad();
    assert_eq!(quad.vertex_bytes().len(), 4 * 20);
    assert_eq!(quad.index_bytes().len(), 6 * 2);
    assert_eq!(quad.index_count().unwrap(), 6);
}

#[test]
fn test_geometry_rejects_out_of_range_index() {
    let mut quad = Geometry::quad();
    quad.indices[4] = 4;
    assert!(matches!(quad.validate(), Err(Error::InvalidResource(_))));
}

#[test]
fn test_geometry_rejects_partial_triangle() {
    let mut quad = Geometry::quad();
    quad.indices.pop();
    assert!(matches!(quad.validate(), Err(Error::InvalidResource(_))));
}

#[test]
#[cfg(target_pointer_width = "64")]
fn test_index_count_must_fit_a_draw_call() {
    assert_eq!(super::index_count_for_len(6).unwrap(), 6);
    assert_eq!(super::index_count_for_len(u32::MAX as usize).unwrap(), u32::MAX);
    let too_many = u32::MAX as usize + 1;
    assert!(matches!(super::index_count_for_len(too_many), Err(Error::InvalidResource(_))));
}

#[test]
fn test_geometry_rejects_empty() {
    let empty = Geometry { vertices: vec![Vertex::new(Vec2::ZERO, Vec3::ZERO)], indices: vec![] };
    assert!(empty.validate().is_err());
}

// ============================================================================
// SHADERS
// ============================================================================

#[test]
fn test_shader_set_from_bytes() {
    let shaders = ShaderSet::from_bytes(spirv(8), spirv(4)).unwrap();
    assert_eq!(shaders.vertex().len(), 32);
    assert_eq!(shaders.fragment().len(), 16);
}

#[test]
fn test_shader_set_rejects_empty_module() {
    assert!(matches!(ShaderSet::from_bytes(Vec::new(), spirv(4)), Err(Error::InvalidResource(_))));
}

#[test]
fn test_shader_set_rejects_unaligned_module() {
    let mut code = spirv(4);
    code.push(0);
    assert!(matches!(ShaderSet::from_bytes(spirv(4), code), Err(Error::InvalidResource(_))));
}

#[test]
fn test_shader_set_rejects_missing_magic() {
    assert!(ShaderSet::from_bytes(vec![0u8; 16], spirv(4)).is_err());
}

#[test]
fn test_shader_set_load_from_disk() {
    let vert = temp_file("load.vert.spv", &spirv(6));
    let frag = temp_file("load.frag.spv", &spirv(5));
    let shaders = ShaderSet::load(&vert, &frag).unwrap();
    assert_eq!(shaders.vertex().len(), 24);
    assert_eq!(shaders.fragment().len(), 20);
    std::fs::remove_file(vert).ok();
    std::fs::remove_file(frag).ok();
}

#[test]
fn test_shader_set_load_missing_file() {
    let result = ShaderSet::load("does/not/exist.vert.spv", "does/not/exist.frag.spv");
    assert!(matches!(result, Err(Error::InvalidResource(_))));
}

#[test]
fn test_shader_set_load_truncated_file() {
    let vert = temp_file("truncated.vert.spv", &spirv(4)[..7]);
    let frag = temp_file("truncated.frag.spv", &spirv(4));
    assert!(ShaderSet::load(&vert, &frag).is_err());
    std::fs::remove_file(vert).ok();
    std::fs::remove_file(frag).ok();
}

// ============================================================================
// STATIC RESOURCES
// ============================================================================

#[test]
fn test_static_resources_create_and_destroy() {
    let mut device = MockGraphicsDevice::new(800, 600);
    let render_pass = device.create_render_pass(Format::B8G8R8A8_SRGB).unwrap();
    let shaders = ShaderSet::from_bytes(spirv(4), spirv(4)).unwrap();

    let resources = StaticResources::create(&mut device, render_pass, &shaders, &Geometry::quad()).unwrap();
    assert_eq!(device.live_count(ResourceKind::Pipeline), 1);
    assert_eq!(device.live_count(ResourceKind::Buffer), 2);

    let sizes: Vec<(BufferUsage, usize)> = device
        .calls
        .iter()
        .filter_map(|c| match c {
            MockCall::CreateBuffer { usage, size, .. } => Some((*usage, *size)),
            _ => None,
        })
        .collect();
    assert_eq!(sizes, vec![(BufferUsage::Vertex, 80), (BufferUsage::Index, 12)]);

    let draw = resources.draw_buffers();
    assert_eq!(draw.index_count, 6);
    assert_eq!(draw.index_type, IndexType::U16);

    resources.destroy(&mut device);
    assert_eq!(device.total_live(), 1);
    assert!(device.invalid_destroys.is_empty());
}

#[test]
fn test_static_resources_failure_releases_pipeline() {
    let mut device = MockGraphicsDevice::new(800, 600);
    let render_pass = device.create_render_pass(Format::B8G8R8A8_SRGB).unwrap();
    let shaders = ShaderSet::from_bytes(spirv(4), spirv(4)).unwrap();
    device.fail_after(MockOp::CreateBuffer, 1, Error::OutOfMemory);

    let result = StaticResources::create(&mut device, render_pass, &shaders, &Geometry::quad());
    assert_eq!(result.unwrap_err(), Error::OutOfMemory);
    assert_eq!(device.total_live(), 1);
}

#[test]
fn test_static_resources_reject_invalid_geometry_before_creating() {
    let mut device = MockGraphicsDevice::new(800, 600);
    let render_pass = device.create_render_pass(Format::B8G8R8A8_SRGB).unwrap();
    let shaders = ShaderSet::from_bytes(spirv(4), spirv(4)).unwrap();
    let mut geometry = Geometry::quad();
    geometry.indices = vec![0, 1, 9];

    assert!(StaticResources::create(&mut device, render_pass, &shaders, &geometry).is_err());
    assert_eq!(device.created_count(ResourceKind::Pipeline), 0);
}
