//! Device capability negotiation rules
//!
//! Backend-agnostic decisions made while opening a device: which queue families
//! to use, how suitable a physical device is, and which required layer or
//! extension names are missing. The Vulkan backend gathers the raw facts and
//! feeds them through these functions.

use crate::error::{Error, Result};
use crate::engine_error;

/// Device extension every candidate must support
pub const SWAPCHAIN_EXTENSION_NAME: &str = "VK_KHR_swapchain";

/// Validation layer enabled in debug builds
pub const VALIDATION_LAYER_NAME: &str = "VK_LAYER_KHRONOS_validation";

/// Score bonus for a discrete GPU
pub const DISCRETE_GPU_BONUS: u32 = 1000;

/// Queue family roles resolved on a physical device
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueFamilyIndices {
    pub graphics: Option<u32>,
    pub present: Option<u32>,
}

impl QueueFamilyIndices {
    /// Resolve both roles from per-family facts
    ///
    /// `families` yields `(supports_graphics, supports_present)` per family, in index order.
    /// Every family is visited once; the scan stops as soon as both roles are resolved.
    /// The last matching family wins for each role until then.
    pub fn find<I>(families: I) -> Self
    where
        I: IntoIterator<Item = (bool, bool)>,
    {
        let mut indices = Self::default();
        for (index, (graphics, present)) in families.into_iter().enumerate() {
            if graphics {
                indices.graphics = Some(index as u32);
            }
            if present {
                indices.present = Some(index as u32);
            }
            if indices.is_complete() {
                break;
            }
        }
        indices
    }

    /// Both roles resolved
    pub fn is_complete(&self) -> bool {
        self.graphics.is_some() && self.present.is_some()
    }

    /// Distinct family indices, sorted ascending
    ///
    /// One queue create info is requested per entry, so aliased roles yield one entry.
    pub fn unique_families(&self) -> Vec<u32> {
        let mut families: Vec<u32> = [self.graphics, self.present].into_iter().flatten().collect();
        families.sort_unstable();
        families.dedup();
        families
    }
}

/// Physical device type, as far as rating is concerned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceType {
    DiscreteGpu,
    IntegratedGpu,
    VirtualGpu,
    Cpu,
    Other,
}

/// Facts gathered about one physical device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceCandidate {
    pub name: String,
    pub device_type: DeviceType,
    pub max_image_dimension_2d: u32,
    pub geometry_shader: bool,
    pub queue_families: QueueFamilyIndices,
    pub extensions: Vec<String>,
    pub surface_format_count: usize,
    pub present_mode_count: usize,
}

/// Suitability score, 0 meaning unusable
///
/// Unusable when the geometry shader feature is missing, when graphics or present
/// queues are missing, when the swapchain extension is missing, or when the surface
/// offers no format or no present mode. Otherwise a discrete GPU earns
/// `DISCRETE_GPU_BONUS`, plus the largest supported 2D image dimension.
pub fn rate_device(candidate: &DeviceCandidate) -> u32 {
    if !candidate.geometry_shader {
        return 0;
    }
    if !candidate.queue_families.is_complete() {
        return 0;
    }
    if !candidate.extensions.iter().any(|e| e == SWAPCHAIN_EXTENSION_NAME) {
        return 0;
    }
    if candidate.surface_format_count == 0 || candidate.present_mode_count == 0 {
        return 0;
    }

    let mut score = 0u32;
    if candidate.device_type == DeviceType::DiscreteGpu {
        score += DISCRETE_GPU_BONUS;
    }
    score.saturating_add(candidate.max_image_dimension_2d)
}

/// Index of the highest-rated candidate
///
/// Ties keep the earliest candidate. Fails when no candidate scores above zero.
pub fn pick_best_device(candidates: &[DeviceCandidate]) -> Result<usize> {
    let mut best: Option<(usize, u32)> = None;
    for (index, candidate) in candidates.iter().enumerate() {
        let score = rate_device(candidate);
        if score > best.map(|(_, s)| s).unwrap_or(0) {
            best = Some((index, score));
        }
    }

    best.map(|(index, _)| index).ok_or_else(|| {
        engine_error!("quad::capabilities", "No suitable device among {} candidate(s)", candidates.len());
        Error::InitializationFailed("no suitable device".to_string())
    })
}

/// Required names absent from `available`, in `required` order
pub fn missing_names<'a>(required: &[&'a str], available: &[String]) -> Vec<&'a str> {
    required
        .iter()
        .copied()
        .filter(|name| !available.iter().any(|a| a == name))
        .collect()
}

#[cfg(test)]
#[path = "capabilities_tests.rs"]
mod tests;
