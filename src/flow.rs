//! Application event loop.
//!
//! This module drives the viewer: it loads the scene, opens the window,
//! creates the [`Context`] and then renders at the profile's frame rate until
//! the window is closed or Escape is released.
//!
//! # Lifecycle
//!
//! 1. [`run`] loads the scene. A broken scene file aborts before any window
//!    is opened
//! 2. `resumed` opens the 800x600 window and builds the wgpu context
//! 3. key presses (auto-repeat included) move the camera or switch shading.
//!    They only change the [`Session`] state; the next paced frame shows it
//! 4. `about_to_wait` requests a redraw whenever the [`FramePacer`] says a
//!    frame is due and sleeps until the next deadline otherwise
//! 5. `RedrawRequested` traverses the scene and presents

use std::sync::{Arc, Once};

use anyhow::Context as _;
use instant::{Duration, Instant};
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::PhysicalKey,
    window::Window,
};

use crate::{
    camera::Projection,
    config::ViewerConfig,
    context::Context,
    data_structures::scene_graph::Scene,
    error::ViewerError,
    input::{Controls, ViewerKey},
    render::SceneRenderer,
    resources::load_scene,
};

/// Fixed-rate frame deadlines for `ControlFlow::WaitUntil`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FramePacer {
    frame_duration: Duration,
    next_frame: Instant,
}

impl FramePacer {
    /// The first frame is due immediately.
    pub fn new(frames_per_second: u32, now: Instant) -> Self {
        Self {
            frame_duration: Duration::from_secs_f64(1.0 / frames_per_second.max(1) as f64),
            next_frame: now,
        }
    }

    pub fn frame_duration(&self) -> Duration {
        self.frame_duration
    }

    /// Returns whether a frame is due at `now` and the deadline to wait for
    /// next. A late frame does not cause a burst of catch-up frames.
    pub fn poll(&mut self, now: Instant) -> (bool, Instant) {
        if now < self.next_frame {
            return (false, self.next_frame);
        }
        self.next_frame += self.frame_duration;
        if self.next_frame <= now {
            self.next_frame = now + self.frame_duration;
        }
        (true, self.next_frame)
    }
}

/// Viewer state between frames: what the keys changed and when the next
/// frame is due. Key presses never schedule a frame of their own.
#[derive(Clone, Debug)]
pub struct Session {
    controls: Controls,
    pacer: FramePacer,
}

impl Session {
    pub fn new(config: &ViewerConfig, now: Instant) -> Self {
        Self {
            controls: Controls::new(config),
            pacer: FramePacer::new(config.frame_rate, now),
        }
    }

    /// Applies a key press. Returns whether the next frame will look different.
    pub fn key_down(&mut self, key: ViewerKey) -> bool {
        self.controls.key_down(key)
    }

    /// Whether a frame is due at `now`, and the deadline to sleep until.
    pub fn poll_frame(&mut self, now: Instant) -> (bool, Instant) {
        self.pacer.poll(now)
    }

    pub fn controls(&self) -> &Controls {
        &self.controls
    }
}

pub struct App {
    config: ViewerConfig,
    scene: Scene,
    async_runtime: tokio::runtime::Runtime,
    ctx: Option<Context>,
    renderer: SceneRenderer,
    session: Session,
    /// First fatal error, returned from [`run`] once the loop has exited.
    error: Option<anyhow::Error>,
}

impl App {
    pub fn new(config: ViewerConfig, scene: Scene) -> anyhow::Result<Self> {
        let async_runtime =
            tokio::runtime::Runtime::new().context("Failed to start the async runtime")?;
        let renderer = SceneRenderer::new(&Projection::for_config(&config));
        let session = Session::new(&config, Instant::now());
        Ok(Self {
            config,
            scene,
            async_runtime,
            ctx: None,
            renderer,
            session,
            error: None,
        })
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        log::error!("{error:#}");
        if self.error.is_none() {
            self.error = Some(error);
        }
        event_loop.exit();
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<Context> {
        let [width, height] = self.config.viewport;
        let window_attributes = Window::default_attributes()
            .with_title("Scene Viewer")
            .with_inner_size(PhysicalSize::new(width, height))
            .with_resizable(false);
        let window = Arc::new(
            event_loop
                .create_window(window_attributes)
                .context("Failed to create the window")?,
        );
        let ctx = self
            .async_runtime
            .block_on(Context::new(window, &self.config.shaders))
            .context("Failed to initialise the graphics device")?;
        Ok(ctx)
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(ctx) = self.ctx.as_mut() else {
            return;
        };
        let controls = self.session.controls();
        let lighting = controls.lighting();
        match self.renderer.render_frame(
            ctx,
            &self.scene,
            controls.view_matrix(),
            &lighting,
        ) {
            Ok(_) => {}
            // Reconfigure the surface if it's lost or outdated
            Err(ViewerError::Surface(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated)) => {
                let size = ctx.window().inner_size();
                ctx.resize(size.width, size.height);
            }
            Err(ViewerError::Surface(wgpu::SurfaceError::OutOfMemory)) => {
                self.fail(event_loop, anyhow::anyhow!("The surface ran out of memory"));
            }
            Err(e) => {
                log::error!("Unable to render {}", e);
            }
        }
    }

    fn key_event(&mut self, event_loop: &ActiveEventLoop, event: &KeyEvent) {
        let PhysicalKey::Code(code) = event.physical_key else {
            return;
        };
        let Some(key) = ViewerKey::from_key_code(code) else {
            return;
        };
        match (event.state, key) {
            (ElementState::Released, ViewerKey::Escape) => event_loop.exit(),
            (ElementState::Pressed, key) => {
                self.session.key_down(key);
            }
            _ => {}
        }
    }
}

impl ApplicationHandler<()> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.ctx.is_some() {
            return;
        }
        match self.init(event_loop) {
            Ok(ctx) => self.ctx = Some(ctx),
            Err(e) => self.fail(event_loop, e),
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => {
                if let Some(ctx) = self.ctx.as_mut() {
                    ctx.resize(size.width, size.height);
                }
            }
            WindowEvent::KeyboardInput { event, .. } => self.key_event(event_loop, &event),
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let Some(ctx) = &self.ctx else {
            return;
        };
        let (due, next_frame) = self.session.poll_frame(Instant::now());
        if due {
            ctx.window().request_redraw();
        }
        event_loop.set_control_flow(ControlFlow::WaitUntil(next_frame));
    }
}

static LOGGER: Once = Once::new();

/// Installs `env_logger`. Safe to call more than once.
pub fn init_logging() {
    LOGGER.call_once(|| {
        if let Err(e) = env_logger::try_init() {
            println!("Warning: Could not initialize logger: {}", e);
        }
    });
}

pub fn run(config: ViewerConfig) -> anyhow::Result<()> {
    init_logging();

    let scene = load_scene(&config.model_path)
        .with_context(|| format!("Failed to load scene {:?}", config.model_path))?;

    let event_loop = EventLoop::new()?;
    let mut app = App::new(config, scene)?;
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
