/// Opaque GPU object handles
///
/// Handles are plain `Copy` newtypes over a backend-defined 64-bit value. The Vulkan
/// backend stores the raw Vulkan handle, the mock device stores a counter.

macro_rules! define_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(u64);

        impl $name {
            /// Wrap a backend value
            pub const fn from_raw(raw: u64) -> Self {
                Self(raw)
            }

            /// Backend value
            pub const fn as_raw(self) -> u64 {
                self.0
            }
        }
    };
}

define_handle!(
    /// Presentation swapchain
    SwapchainHandle
);
define_handle!(
    /// Image owned by a swapchain
    ImageHandle
);
define_handle!(
    /// 2D color view of a swapchain image
    ImageViewHandle
);
define_handle!(
    /// Framebuffer binding one image view to the render pass
    FramebufferHandle
);
define_handle!(
    /// Render pass with a single color attachment
    RenderPassHandle
);
define_handle!(
    /// Graphics pipeline (and its layout)
    PipelineHandle
);
define_handle!(
    /// Device-local buffer (and its memory)
    BufferHandle
);
define_handle!(
    /// GPU-side synchronization primitive
    SemaphoreHandle
);
define_handle!(
    /// CPU-observable completion primitive
    FenceHandle
);
define_handle!(
    /// Primary command buffer
    CommandBufferHandle
);
