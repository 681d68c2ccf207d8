use glutin::config::{Config as GlConfig, ConfigTemplateBuilder};
use glutin::context::{
    ContextApi, ContextAttributesBuilder, NotCurrentGlContextSurfaceAccessor,
    PossiblyCurrentContext, Version,
};
use glutin::display::{GetGlDisplay, GlDisplay};
use glutin::surface::{GlSurface, Surface, SurfaceAttributesBuilder, WindowSurface};

use glutin_winit::DisplayBuilder;

use raw_window_handle::HasRawWindowHandle;

use std::ffi::CString;
use std::num::NonZeroU32;
use std::rc::Rc;

use thiserror::Error;

use winit::dpi::{PhysicalSize, Size};
use winit::event::{Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::window::{Window, WindowBuilder};

use gl_wrapper::native::NativeGl;

use canvas2d::canvas::{Canvas, SurfaceId, SurfaceSize};
use canvas2d::config::ConfigError;
use canvas2d::resize::{ResizeError, ResizeTracker};
use canvas2d::shaders::ShaderSources;
use canvas2d::{Config, DrawMode, RenderSession, SessionError};

use crate::observer::WinitObserver;

pub struct App {
    event_loop: EventLoop<()>,
    gl_context: PossiblyCurrentContext,
    gl_window: GlWindow,
    session: RenderSession<NativeGl>,
    tracker: ResizeTracker,
    observer: WinitObserver,
    mode: DrawMode,
}

impl App {
    pub fn new(config: Config, mode: DrawMode, device_pixels: bool) -> Result<Self, AppError> {
        let event_loop = EventLoop::new();
        let window_builder = WindowBuilder::new()
            .with_inner_size(Size::Physical(PhysicalSize::new(
                config.window.width,
                config.window.height,
            )))
            .with_min_inner_size(Size::Physical(PhysicalSize::new(32, 32)))
            .with_title(config.window.title.as_str());
        let display_builder = DisplayBuilder::new().with_window_builder(Some(window_builder));
        let template = ConfigTemplateBuilder::new();

        let (window, gl_config) = display_builder
            .build(&event_loop, template, |mut configs| {
                configs
                    .next()
                    .expect("display offers at least one GL config")
            })
            .map_err(|e| AppError::Window(e.to_string()))?;

        let window = window.ok_or_else(|| AppError::Window("no window was created".to_string()))?;

        let handle = Some(window.raw_window_handle());
        let gl_display = gl_config.display();

        let gl_window = GlWindow::new(window, &gl_config)?;

        // `#version 300 es` sources need either a GLES 3.0 context or a
        // desktop context with ES 3 compatibility.
        let gles_attr = ContextAttributesBuilder::new()
            .with_context_api(ContextApi::Gles(Some(Version::new(3, 0))))
            .build(handle);
        let gl_attr = ContextAttributesBuilder::new()
            .with_context_api(ContextApi::OpenGl(Some(Version::new(4, 3))))
            .build(handle);

        let not_current = match unsafe { gl_display.create_context(&gl_config, &gles_attr) } {
            Ok(context) => context,
            Err(e) => {
                log::warn!("no GLES 3.0 context ({e}), trying OpenGL 4.3");
                unsafe { gl_display.create_context(&gl_config, &gl_attr)? }
            }
        };

        let gl_context = not_current.make_current(&gl_window.surface)?;

        let ctx = Rc::new(NativeGl::load_with(|s| match CString::new(s) {
            Ok(name) => gl_display.get_proc_address(name.as_c_str()).cast(),
            Err(_) => std::ptr::null(),
        }));

        let session = RenderSession::new(&ctx, ShaderSources::default(), config)?;

        let mut observer = WinitObserver::new(device_pixels);
        let mut tracker = ResizeTracker::new(gl_window.window.scale_factor());
        let mode_used = tracker.observe(gl_window.id, &mut observer)?;
        log::info!("observing window size with {mode_used:?}");

        tracker.on_resize(&[observer.entry(
            gl_window.id,
            gl_window.window.inner_size(),
            gl_window.window.scale_factor(),
        )]);

        Ok(Self {
            event_loop,
            gl_context,
            gl_window,
            session,
            tracker,
            observer,
            mode,
        })
    }

    pub fn run(mut self) -> ! {
        self.gl_window.window.request_redraw();

        self.event_loop
            .run(move |event, _window_target, control_flow| {
                *control_flow = ControlFlow::Wait;
                match event {
                    Event::WindowEvent { event, .. } => match event {
                        WindowEvent::Resized(size) => {
                            let id = self.gl_window.id;
                            let scale = self.gl_window.window.scale_factor();
                            self.tracker
                                .on_resize(&[self.observer.entry(id, size, scale)]);
                            self.gl_window.window.request_redraw();
                        }
                        WindowEvent::ScaleFactorChanged {
                            scale_factor,
                            new_inner_size,
                        } => {
                            let id = self.gl_window.id;
                            self.tracker.set_device_pixel_ratio(scale_factor);
                            self.tracker.on_resize(&[self.observer.entry(
                                id,
                                *new_inner_size,
                                scale_factor,
                            )]);
                            self.gl_window.window.request_redraw();
                        }
                        WindowEvent::CloseRequested => {
                            control_flow.set_exit();
                        }
                        _ => (),
                    },
                    Event::RedrawRequested(_) => {
                        let mut canvas = WindowCanvas {
                            gl_window: &mut self.gl_window,
                            context: &self.gl_context,
                        };

                        match self.session.frame(&mut canvas, &self.tracker, self.mode) {
                            Ok(stats) => log::debug!(
                                "frame: {} draw calls, resized: {}",
                                stats.draw_calls,
                                stats.resized
                            ),
                            Err(e) => {
                                log::error!("could not draw frame: {e}");
                                control_flow.set_exit_with_code(1);
                                return;
                            }
                        }

                        if let Err(e) = self.gl_window.surface.swap_buffers(&self.gl_context) {
                            log::error!("could not swap buffers: {e}");
                        }
                    }
                    _ => (),
                }
            })
    }
}

pub struct GlWindow {
    // XXX the surface must be dropped before the window.
    pub surface: Surface<WindowSurface>,
    pub window: Window,
    pub id: SurfaceId,
    allocated: SurfaceSize,
}

impl GlWindow {
    pub fn new(window: Window, config: &GlConfig) -> Result<Self, AppError> {
        let (width, height): (u32, u32) = window.inner_size().into();
        let raw_window_handle = window.raw_window_handle();

        let (w, h) = match (NonZeroU32::new(width), NonZeroU32::new(height)) {
            (Some(w), Some(h)) => (w, h),
            _ => return Err(AppError::Window(format!("window has no area ({width}x{height})"))),
        };

        let attrs = SurfaceAttributesBuilder::<WindowSurface>::new().build(raw_window_handle, w, h);

        let surface = unsafe { config.display().create_window_surface(config, &attrs)? };

        Ok(Self {
            window,
            surface,
            id: SurfaceId::next(),
            allocated: SurfaceSize::new(width, height),
        })
    }
}

/// The window surface seen as a canvas for one frame.
struct WindowCanvas<'a> {
    gl_window: &'a mut GlWindow,
    context: &'a PossiblyCurrentContext,
}

impl Canvas for WindowCanvas<'_> {
    fn surface_id(&self) -> SurfaceId {
        self.gl_window.id
    }

    fn size(&self) -> SurfaceSize {
        self.gl_window.allocated
    }

    fn set_size(&mut self, size: SurfaceSize) {
        // a minimized window reports zero, keep the old surface then
        if let (Some(w), Some(h)) = (NonZeroU32::new(size.width), NonZeroU32::new(size.height)) {
            self.gl_window.surface.resize(self.context, w, h);
        }
        self.gl_window.allocated = size;
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Window(String),
    #[error("gl: {0}")]
    Gl(#[from] glutin::error::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Resize(#[from] ResizeError),
}
