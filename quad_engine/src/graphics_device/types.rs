/// Plain data types exchanged across the graphics device seam

use crate::graphics_device::{
    BufferHandle, CommandBufferHandle, FenceHandle, RenderPassHandle, SemaphoreHandle,
};

/// Sentinel width/height meaning "the surface size is decided by the swapchain"
pub const UNDEFINED_EXTENT: u32 = u32::MAX;

/// 2D size in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Extent2D {
    pub width: u32,
    pub height: u32,
}

impl Extent2D {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// A minimized window reports a zero dimension
    pub fn has_zero_area(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// True for the `UNDEFINED_EXTENT` sentinel
    pub fn is_undefined(&self) -> bool {
        self.width == UNDEFINED_EXTENT
    }
}

/// Pixel formats used by the renderer
///
/// Formats the engine does not name are carried through as `Other(raw)`.
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    Undefined,
    B8G8R8A8_SRGB,
    B8G8R8A8_UNORM,
    R8G8B8A8_SRGB,
    R8G8B8A8_UNORM,
    R32G32_SFLOAT,
    R32G32B32_SFLOAT,
    Other(i32),
}

/// Color space of a surface format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorSpace {
    SrgbNonlinear,
    Other(i32),
}

/// Format + color space pair offered by a surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceFormat {
    pub format: Format,
    pub color_space: ColorSpace,
}

impl SurfaceFormat {
    pub const fn new(format: Format, color_space: ColorSpace) -> Self {
        Self { format, color_space }
    }
}

/// Presentation modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PresentMode {
    Immediate,
    /// Low-latency triple buffering
    Mailbox,
    /// Vsync, always supported
    Fifo,
    FifoRelaxed,
    Other(i32),
}

/// Raw surface transform flags, passed back unchanged as the swapchain pre-transform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SurfaceTransform(pub u32);

impl SurfaceTransform {
    pub const IDENTITY: SurfaceTransform = SurfaceTransform(1);
}

/// Snapshot of what a surface supports right now
///
/// Queried fresh for every swapchain build and never kept beyond it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceCapabilities {
    pub min_image_count: u32,
    /// 0 means no upper bound
    pub max_image_count: u32,
    pub current_extent: Extent2D,
    pub min_image_extent: Extent2D,
    pub max_image_extent: Extent2D,
    pub current_transform: SurfaceTransform,
    pub formats: Vec<SurfaceFormat>,
    pub present_modes: Vec<PresentMode>,
}

/// Queue family indices of the opened device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueFamilies {
    pub graphics: u32,
    pub present: u32,
}

/// How swapchain images are shared between queue families
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SharingMode {
    /// Owned by one family at a time
    Exclusive,
    /// Accessible from every listed family without ownership transfers
    Concurrent,
}

/// Parameters of one swapchain build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapchainDesc {
    pub image_count: u32,
    pub surface_format: SurfaceFormat,
    pub extent: Extent2D,
    pub present_mode: PresentMode,
    pub pre_transform: SurfaceTransform,
    pub sharing_mode: SharingMode,
    /// Families sharing the images, empty for `Exclusive`
    pub queue_family_indices: Vec<u32>,
}

/// Viewport transform
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub min_depth: f32,
    pub max_depth: f32,
}

impl Viewport {
    /// Viewport covering `extent` with depth range [0, 1]
    pub fn covering(extent: Extent2D) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: extent.width as f32,
            height: extent.height as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        }
    }
}

/// Scissor rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect2D {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect2D {
    /// Rectangle covering `extent` from the origin
    pub fn covering(extent: Extent2D) -> Self {
        Self { x: 0, y: 0, width: extent.width, height: extent.height }
    }
}

/// Index element type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexType {
    U16,
    U32,
}

/// Buffer usage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferUsage {
    Vertex,
    Index,
}

/// One vertex attribute of the single vertex binding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
    pub location: u32,
    pub format: Format,
    pub offset: u32,
}

/// Vertex input layout (one binding, per-vertex rate)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexLayout {
    pub stride: u32,
    pub attributes: Vec<VertexAttribute>,
}

/// Graphics pipeline descriptor
///
/// Shader code is opaque SPIR-V. Viewport and scissor are always dynamic.
#[derive(Debug, Clone)]
pub struct PipelineDesc<'a> {
    pub render_pass: RenderPassHandle,
    pub vertex_shader: &'a [u8],
    pub fragment_shader: &'a [u8],
    pub vertex_layout: VertexLayout,
}

/// One queue submission
///
/// Waits on `wait_semaphore` at the color-attachment-output stage, signals
/// `signal_semaphore` and `fence` on completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Submission {
    pub command_buffer: CommandBufferHandle,
    pub wait_semaphore: SemaphoreHandle,
    pub signal_semaphore: SemaphoreHandle,
    pub fence: FenceHandle,
}

/// Outcome of an acquire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireResult {
    /// An image is ready; `suboptimal` means it still presents but a rebuild is advisable
    Acquired { image_index: u32, suboptimal: bool },
    /// The surface changed and the swapchain can no longer present
    OutOfDate,
}

/// Outcome of a present
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentResult {
    Presented,
    Suboptimal,
    OutOfDate,
}

/// Buffers bound for the indexed draw
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawBuffers {
    pub vertex_buffer: BufferHandle,
    pub index_buffer: BufferHandle,
    pub index_type: IndexType,
    pub index_count: u32,
}
