//! Error types for the Quad engine
//!
//! This module defines the error types used throughout the engine,
//! including device setup, swapchain lifecycle and frame submission.

use std::fmt;

/// Result type for Quad engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Quad engine errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Backend-specific error (Vulkan, mock device, etc.)
    BackendError(String),

    /// Out of GPU memory
    OutOfMemory,

    /// Invalid resource (buffer, shader, geometry, handle, etc.)
    InvalidResource(String),

    /// Initialization failed (instance, surface, device, static resources)
    InitializationFailed(String),

    /// The swapchain object could not be created with the negotiated parameters
    SwapchainCreationFailed(String),

    /// Image view creation failed for the swapchain image at `index`
    ImageViewCreationFailed { index: usize, reason: String },

    /// Framebuffer creation failed for the swapchain image at `index`
    FramebufferCreationFailed { index: usize, reason: String },

    /// The logical device was lost (unrecoverable)
    DeviceLost,

    /// No memory type satisfies the requirements of a buffer
    NoCompatibleMemoryType(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::OutOfMemory => write!(f, "Out of GPU memory"),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            Error::SwapchainCreationFailed(msg) => write!(f, "Swapchain creation failed: {}", msg),
            Error::ImageViewCreationFailed { index, reason } => {
                write!(f, "Image view creation failed for swapchain image {}: {}", index, reason)
            }
            Error::FramebufferCreationFailed { index, reason } => {
                write!(f, "Framebuffer creation failed for swapchain image {}: {}", index, reason)
            }
            Error::DeviceLost => write!(f, "Device lost"),
            Error::NoCompatibleMemoryType(msg) => write!(f, "No compatible memory type: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

impl Error {
    /// True for errors that leave the device in an unusable state
    ///
    /// Such errors end the frame loop; everything else is reported to the caller
    /// of the failing operation.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::DeviceLost | Error::OutOfMemory | Error::NoCompatibleMemoryType(_)
        )
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
