//! Window collaborator seen from the renderer

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::graphics_device::Extent2D;

/// What the swapchain rebuild path needs from the window layer
pub trait WindowSurface {
    /// Current framebuffer size in pixels (zero while minimized)
    fn framebuffer_size(&self) -> Extent2D;

    /// Block until at least one window event has been delivered
    fn wait_events(&mut self);

    /// The window has been asked to close
    ///
    /// A rebuild stops waiting for a renderable surface once this returns true.
    fn is_closing(&self) -> bool {
        false
    }
}

/// Shared "framebuffer resized" flag
///
/// The window layer calls `notify` from its resize callback; the frame scheduler
/// consumes it with `take` once per present.
#[derive(Debug, Clone, Default)]
pub struct ResizeSignal {
    flag: Arc<AtomicBool>,
}

impl ResizeSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the framebuffer as resized
    pub fn notify(&self) {
        self.flag.store(true, Ordering::Release);
    }

    /// Read and clear the flag
    pub fn take(&self) -> bool {
        self.flag.swap(false, Ordering::AcqRel)
    }

    /// Read without clearing
    pub fn is_set(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}
