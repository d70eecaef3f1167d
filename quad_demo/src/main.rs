//! Hello Quad
//!
//! Opens a window, draws one colored quad every frame and rebuilds the swapchain
//! when the window is resized or minimized. Exits when the window is closed.
//!
//! Set `RUST_LOG` (e.g. `RUST_LOG=quad=debug`) to route engine logs through env_logger.

use std::process::ExitCode;
use std::time::Duration;

use quad_engine::quad::log::LogCrateLogger;
use quad_engine::quad::render::{Extent2D, Geometry, ResizeSignal, ShaderSet, WindowSurface};
use quad_engine::quad::{Config, Engine, Error, FrameRenderer, Result};
use quad_engine_renderer_vulkan::{print_validation_stats_report, VulkanGraphicsDevice};
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::platform::pump_events::{EventLoopExtPumpEvents, PumpStatus};
use winit::window::{Window, WindowId};

/// Window state updated by the event loop
struct App {
    config: Config,
    window: Option<Window>,
    resize: Option<ResizeSignal>,
    close_requested: bool,
    window_error: Option<String>,
}

impl App {
    fn new(config: Config) -> Self {
        Self {
            config,
            window: None,
            resize: None,
            close_requested: false,
            window_error: None,
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attributes = Window::default_attributes()
            .with_title(self.config.window_title.clone())
            .with_inner_size(LogicalSize::new(self.config.width, self.config.height))
            .with_resizable(self.config.resizable);

        match event_loop.create_window(attributes) {
            Ok(window) => self.window = Some(window),
            Err(e) => {
                self.window_error = Some(e.to_string());
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested, shutting down");
                self.close_requested = true;
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                log::debug!("Window resized to {}x{}", size.width, size.height);
                if let Some(resize) = &self.resize {
                    resize.notify();
                }
            }
            _ => {}
        }
    }
}

/// `WindowSurface` backed by a pumped winit event loop
struct PumpedWindow<'a> {
    event_loop: &'a mut EventLoop<()>,
    app: &'a mut App,
}

impl PumpedWindow<'_> {
    fn pump(&mut self, timeout: Option<Duration>) -> PumpStatus {
        self.event_loop.pump_app_events(timeout, &mut *self.app)
    }

    fn should_close(&self) -> bool {
        self.app.close_requested
    }
}

impl WindowSurface for PumpedWindow<'_> {
    fn framebuffer_size(&self) -> Extent2D {
        match &self.app.window {
            Some(window) => {
                let size = window.inner_size();
                Extent2D::new(size.width, size.height)
            }
            None => Extent2D::new(0, 0),
        }
    }

    fn wait_events(&mut self) {
        if let PumpStatus::Exit(_) = self.pump(None) {
            self.app.close_requested = true;
        }
    }

    fn is_closing(&self) -> bool {
        self.app.close_requested
    }
}

fn run(config: Config) -> Result<()> {
    let mut event_loop = EventLoop::new()
        .map_err(|e| Error::InitializationFailed(format!("event loop: {}", e)))?;
    let mut app = App::new(config.clone());

    // The window is created on the first resume
    while app.window.is_none() {
        if let PumpStatus::Exit(_) = event_loop.pump_app_events(Some(Duration::ZERO), &mut app) {
            break;
        }
    }
    if let Some(reason) = app.window_error.take() {
        return Err(Error::InitializationFailed(format!("window: {}", reason)));
    }

    let shaders = ShaderSet::load(&config.vertex_shader_path, &config.fragment_shader_path)?;
    let device = match &app.window {
        Some(window) => VulkanGraphicsDevice::new(window, &config)?,
        None => return Ok(()),
    };
    let validation = device.validation_enabled();
    log::info!("Running on {}", device.device_name());

    let mut surface = PumpedWindow { event_loop: &mut event_loop, app: &mut app };
    let mut renderer = FrameRenderer::new(device, &mut surface, &shaders, &Geometry::quad(), &config)?;
    surface.app.resize = Some(renderer.resize_signal());

    let mut result: Result<()> = Ok(());
    loop {
        let status = surface.pump(Some(Duration::ZERO));
        if surface.should_close() || matches!(status, PumpStatus::Exit(_)) {
            break;
        }
        if let Err(e) = renderer.draw_frame(&mut surface) {
            // The surface may already be gone once the user closed the window
            if surface.should_close() && !e.is_fatal() {
                log::debug!("Frame abandoned while closing: {}", e);
                break;
            }
            if e.is_fatal() {
                log::error!("Device is unusable: {}", e);
            } else {
                log::error!("Frame failed: {}", e);
            }
            result = Err(e);
            break;
        }
    }

    let stats = renderer.stats();
    log::info!(
        "{} frames presented, {} skipped, {} swapchain rebuilds",
        stats.frames_presented, stats.frames_skipped, stats.swapchain_rebuilds
    );

    // The surface must go before the window that owns it
    let shutdown = renderer.shutdown();
    drop(renderer);

    if validation {
        print_validation_stats_report();
    }

    result.and(shutdown)
}

fn main() -> ExitCode {
    if std::env::var_os("RUST_LOG").is_some() {
        env_logger::init();
        Engine::set_logger(LogCrateLogger);
    }

    match run(Config::default()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
