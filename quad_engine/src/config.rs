/// Renderer configuration and validation-layer debug options

use std::path::PathBuf;

/// Which validation messages reach the debug callback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugSeverity {
    /// Only errors
    ErrorsOnly,
    /// Errors and warnings
    ErrorsAndWarnings,
    /// Everything including info and verbose
    All,
}

/// Where validation messages are written
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DebugOutput {
    /// Colored output on stderr
    Console,
    /// Plain text appended to a file
    File(String),
    /// Both console and file
    Both(String),
}

/// Message categories shown by the debug callback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebugMessageFilter {
    /// General messages (loader, layer setup)
    pub show_general: bool,
    /// Specification violations
    pub show_validation: bool,
    /// Non-optimal API usage
    pub show_performance: bool,
}

impl Default for DebugMessageFilter {
    fn default() -> Self {
        Self {
            show_general: true,
            show_validation: true,
            show_performance: true,
        }
    }
}

/// Validation message counters collected by the debug callback
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationStats {
    pub errors: u32,
    pub warnings: u32,
    pub info: u32,
    pub verbose: u32,
}

impl ValidationStats {
    /// Total number of messages seen
    pub fn total(&self) -> u32 {
        self.errors + self.warnings + self.info + self.verbose
    }

    /// True when at least one validation error was reported
    pub fn has_errors(&self) -> bool {
        self.errors > 0
    }
}

/// Renderer configuration
///
/// Fields are public; override what you need and fill the rest with `..Default::default()`.
///
/// # Example
///
/// ```no_run
/// use quad_engine::quad::Config;
///
/// let config = Config {
///     width: 1280,
///     height: 720,
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Application name reported to the driver
    pub app_name: String,
    /// Application version (major, minor, patch)
    pub app_version: (u32, u32, u32),
    /// Window title
    pub window_title: String,
    /// Initial window width in logical pixels
    pub width: u32,
    /// Initial window height in logical pixels
    pub height: u32,
    /// Whether the window can be resized by the user
    pub resizable: bool,

    /// Enable validation layers (requires the `vulkan-validation` backend feature)
    pub enable_validation: bool,
    /// Validation message severity filter
    pub debug_severity: DebugSeverity,
    /// Validation message destination
    pub debug_output: DebugOutput,
    /// Validation message category filter
    pub debug_message_filter: DebugMessageFilter,
    /// Abort the process on the first validation error
    pub break_on_validation_error: bool,
    /// Panic on the first validation error (strict mode for tests)
    pub panic_on_error: bool,
    /// Count validation messages
    pub enable_validation_stats: bool,

    /// Compiled vertex shader (SPIR-V)
    pub vertex_shader_path: PathBuf,
    /// Compiled fragment shader (SPIR-V)
    pub fragment_shader_path: PathBuf,
    /// Clear color of the single render pass (RGBA)
    pub clear_color: [f32; 4],
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_name: "Hello Quad".to_string(),
            app_version: (1, 0, 0),
            window_title: "Vulkan".to_string(),
            width: 800,
            height: 800,
            resizable: true,
            enable_validation: cfg!(debug_assertions),
            debug_severity: DebugSeverity::ErrorsAndWarnings,
            debug_output: DebugOutput::Console,
            debug_message_filter: DebugMessageFilter::default(),
            break_on_validation_error: false,
            panic_on_error: false,
            enable_validation_stats: cfg!(debug_assertions),
            vertex_shader_path: PathBuf::from("shaders/quad.vert.spv"),
            fragment_shader_path: PathBuf::from("shaders/quad.frag.spv"),
            clear_color: [0.0, 0.0, 0.0, 1.0],
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
