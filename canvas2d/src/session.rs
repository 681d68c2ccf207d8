use std::rc::Rc;

use rand::prelude::*;
use rand_xoshiro::Xoshiro256StarStar;
use thiserror::Error;

use gl_wrapper::context::{AttribLocation, BufferUsage, GlContext, UniformLocation};
use gl_wrapper::geometry::{GeometryError, Geometry, GeometryBuilder, VertexAttribute};
use gl_wrapper::program::{Program, ProgramBuilder, ProgramError};
use gl_wrapper::renderer::GlRenderer;

use crate::canvas::Canvas;
use crate::config::Config;
use crate::resize::{ResizeError, ResizeTracker};
use crate::shaders::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawMode {
    /// The configured triangle.
    Triangle,
    /// The configured rectangle.
    Rectangle,
    /// `count` rectangles with random placement, size and color.
    RandomRectangles { count: usize },
}

#[derive(Debug, Clone, Copy)]
pub struct Bindings {
    pub position: AttribLocation,
    pub resolution: UniformLocation,
    pub color: UniformLocation,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub draw_calls: usize,
    pub resized: bool,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Program(#[from] ProgramError),
    #[error(transparent)]
    Geometry(#[from] GeometryError),
    #[error(transparent)]
    Resize(#[from] ResizeError),
}

/// One linked program with its vertex buffer, set up once and drawn with
/// any number of times.
pub struct RenderSession<C: GlContext> {
    program: Program<C>,
    bindings: Bindings,
    geometry: Geometry<C>,
    renderer: GlRenderer<C>,
    config: Config,
}

impl<C: GlContext> RenderSession<C> {
    pub fn new(ctx: &Rc<C>, sources: ShaderSources, config: Config) -> Result<Self, SessionError> {
        let program = ProgramBuilder::new(sources.vertex, sources.fragment).build(ctx)?;

        let bindings = Bindings {
            position: program.attrib_location(POSITION_ATTRIBUTE)?,
            resolution: program.uniform_location(RESOLUTION_UNIFORM)?,
            color: program.uniform_location(COLOR_UNIFORM)?,
        };

        let geometry = GeometryBuilder::new(&[])
            .with_attribute(bindings.position, VertexAttribute::Vec2)
            .with_usage(BufferUsage::DynamicDraw)
            .build(ctx)?;

        log::info!("render session ready");

        Ok(Self {
            program,
            bindings,
            geometry,
            renderer: GlRenderer::new(ctx),
            config,
        })
    }

    pub fn bindings(&self) -> Bindings {
        self.bindings
    }

    pub fn geometry(&self) -> &Geometry<C> {
        &self.geometry
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Draws one frame into `canvas`, first resizing it to the size the
    /// tracker last saw.
    pub fn frame<K: Canvas + ?Sized>(
        &mut self,
        canvas: &mut K,
        tracker: &ResizeTracker,
        mode: DrawMode,
    ) -> Result<FrameStats, SessionError> {
        let resized = tracker.resize_canvas_to_display_size(canvas)?;
        let size = canvas.size();

        if resized {
            log::debug!("canvas resized to {}x{}", size.width, size.height);
        }

        self.renderer.resize(size.width, size.height);

        let [r, g, b, a] = self.config.clear_color;
        self.renderer.clear_color(r, g, b, a);

        self.renderer.use_program(&self.program);
        self.renderer.set_vec2(
            self.bindings.resolution,
            [size.width as f32, size.height as f32],
        );

        let draw_calls = match mode {
            DrawMode::Triangle => {
                self.geometry.write(&self.config.triangle.vertices)?;
                self.renderer
                    .set_vec4(self.bindings.color, self.config.triangle.color);
                self.renderer.draw(&self.geometry, &self.program);
                1
            }
            DrawMode::Rectangle => {
                let rect = &self.config.rectangle;
                self.geometry
                    .set_rectangle(rect.x, rect.y, rect.width, rect.height)?;
                self.renderer.set_vec4(self.bindings.color, rect.color);
                self.renderer.draw(&self.geometry, &self.program);
                1
            }
            DrawMode::RandomRectangles { count } => self.draw_random_rectangles(count)?,
        };

        Ok(FrameStats {
            draw_calls,
            resized,
        })
    }

    fn draw_random_rectangles(&mut self, count: usize) -> Result<usize, SessionError> {
        let range = self.config.random.range;
        // reseeded every frame so repaints look the same
        let mut rng = Xoshiro256StarStar::seed_from_u64(self.config.random.seed);

        for _ in 0..count {
            let x = random_int(&mut rng, range);
            let y = random_int(&mut rng, range);
            let width = random_int(&mut rng, range);
            let height = random_int(&mut rng, range);
            self.geometry.set_rectangle(x, y, width, height)?;

            let color = [rng.gen::<f32>(), rng.gen::<f32>(), rng.gen::<f32>(), 1.0];
            self.renderer.set_vec4(self.bindings.color, color);

            self.renderer.draw(&self.geometry, &self.program);
        }

        Ok(count)
    }
}

fn random_int<R: Rng>(rng: &mut R, range: u32) -> f32 {
    if range == 0 {
        0.0
    } else {
        rng.gen_range(0..range) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{OffscreenCanvas, SurfaceSize};
    use crate::resize::ResizeEntry;
    use gl_wrapper::geometry::rectangle_vertices;
    use gl_wrapper::recording::{GlCall, RecordingContext};

    fn setup(config: Config) -> (Rc<RecordingContext>, RenderSession<RecordingContext>) {
        let ctx = Rc::new(RecordingContext::new());
        let session = RenderSession::new(&ctx, ShaderSources::default(), config).unwrap();
        ctx.take_calls();
        (ctx, session)
    }

    fn tracked_canvas() -> (OffscreenCanvas, ResizeTracker) {
        let canvas = OffscreenCanvas::new();
        let mut tracker = ResizeTracker::default();
        tracker.register(canvas.surface_id());
        (canvas, tracker)
    }

    #[test]
    fn setup_configures_tight_vec2_layout() {
        let ctx = Rc::new(RecordingContext::new());
        let session = RenderSession::new(&ctx, ShaderSources::default(), Config::default()).unwrap();

        let layout = ctx.calls().into_iter().find_map(|c| match c {
            GlCall::VertexAttribPointer(loc, layout) => Some((loc, layout)),
            _ => None,
        });
        let (loc, layout) = layout.unwrap();

        assert_eq!(loc, session.bindings().position);
        assert_eq!(layout.components, 2);
        assert!(!layout.normalized);
        assert_eq!(layout.stride, 0);
        assert_eq!(layout.offset, 0);
    }

    #[test]
    fn fifty_random_rectangles() {
        let (ctx, mut session) = setup(Config::default());
        let (mut canvas, tracker) = tracked_canvas();
        let color = session.bindings().color;

        let stats = session
            .frame(&mut canvas, &tracker, DrawMode::RandomRectangles { count: 50 })
            .unwrap();
        assert_eq!(stats.draw_calls, 50);

        let calls = ctx.calls();
        let draws = calls
            .iter()
            .filter(|c| matches!(c, GlCall::DrawTriangles { count: 6, .. }))
            .count();
        assert_eq!(draws, 50);

        // every draw is preceded by one buffer rewrite and one color update
        let mut buffer_writes = 0;
        let mut color_updates = 0;
        for call in &calls {
            match call {
                GlCall::BufferData { len, .. } => {
                    assert_eq!(*len, 12);
                    buffer_writes += 1;
                }
                GlCall::Uniform4f(loc, rgba) if *loc == color => {
                    assert_eq!(rgba[3], 1.0);
                    assert!(rgba[..3].iter().all(|c| (0.0..1.0).contains(c)));
                    color_updates += 1;
                }
                GlCall::DrawTriangles { .. } => {
                    assert_eq!((buffer_writes, color_updates), (1, 1));
                    buffer_writes = 0;
                    color_updates = 0;
                }
                _ => {}
            }
        }
    }

    #[test]
    fn random_rectangles_stay_in_range() {
        let mut config = Config::default();
        config.random.range = 20;
        let (ctx, mut session) = setup(config);
        let (mut canvas, tracker) = tracked_canvas();

        session
            .frame(&mut canvas, &tracker, DrawMode::RandomRectangles { count: 1 })
            .unwrap();

        let data = ctx.buffer_contents(session.geometry().vbo()).unwrap();
        assert_eq!(data.len(), 12);
        // x1, y1 are the first vertex and x2, y2 the last one
        assert!(data[0] < 20.0 && data[1] < 20.0);
        assert!(data[10] - data[0] < 20.0 && data[11] - data[1] < 20.0);
    }

    #[test]
    fn same_seed_repaints_identically() {
        let (ctx, mut session) = setup(Config::default());
        let (mut canvas, tracker) = tracked_canvas();

        session
            .frame(&mut canvas, &tracker, DrawMode::RandomRectangles { count: 10 })
            .unwrap();
        let first = ctx.take_calls();

        session
            .frame(&mut canvas, &tracker, DrawMode::RandomRectangles { count: 10 })
            .unwrap();
        let second = ctx.take_calls();

        // the program stays current, so only the first frame selects it
        let repaint = |calls: Vec<GlCall>| -> Vec<GlCall> {
            calls
                .into_iter()
                .filter(|c| !matches!(c, GlCall::UseProgram(_)))
                .collect()
        };
        assert!(first.iter().any(|c| matches!(c, GlCall::UseProgram(Some(_)))));
        assert_eq!(repaint(first), repaint(second));

        let mut fresh = Config::default();
        fresh.random.count = 10;
        let (other_ctx, mut other) = setup(fresh);
        let (mut other_canvas, other_tracker) = tracked_canvas();
        other
            .frame(&mut other_canvas, &other_tracker, DrawMode::RandomRectangles { count: 10 })
            .unwrap();

        let last = ctx.buffer_contents(session.geometry().vbo()).unwrap();
        assert_eq!(last.len(), 12);
        assert_eq!(
            Some(last),
            other_ctx.buffer_contents(other.geometry().vbo())
        );
    }

    #[test]
    fn rewritten_buffer_is_dynamic() {
        let (ctx, mut session) = setup(Config::default());
        let (mut canvas, tracker) = tracked_canvas();

        session
            .frame(&mut canvas, &tracker, DrawMode::RandomRectangles { count: 3 })
            .unwrap();

        let usages: Vec<_> = ctx
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                GlCall::BufferData { usage, .. } => Some(usage),
                _ => None,
            })
            .collect();
        assert_eq!(usages, vec![BufferUsage::DynamicDraw; 3]);
    }

    #[test]
    fn rectangle_mode_draws_configured_rectangle() {
        let (ctx, mut session) = setup(Config::default());
        let (mut canvas, tracker) = tracked_canvas();

        let stats = session
            .frame(&mut canvas, &tracker, DrawMode::Rectangle)
            .unwrap();

        assert_eq!(stats.draw_calls, 1);
        assert_eq!(
            ctx.buffer_contents(session.geometry().vbo()).unwrap(),
            rectangle_vertices(10.0, 20.0, 70.0, 10.0).to_vec()
        );
        assert!(ctx
            .calls()
            .contains(&GlCall::DrawTriangles { first: 0, count: 6 }));
    }

    #[test]
    fn triangle_mode_draws_three_vertices() {
        let (ctx, mut session) = setup(Config::default());
        let (mut canvas, tracker) = tracked_canvas();

        session
            .frame(&mut canvas, &tracker, DrawMode::Triangle)
            .unwrap();

        let draws: Vec<_> = ctx
            .calls()
            .into_iter()
            .filter(|c| matches!(c, GlCall::DrawTriangles { .. }))
            .collect();
        assert_eq!(draws, vec![GlCall::DrawTriangles { first: 0, count: 3 }]);
    }

    #[test]
    fn frame_order_and_viewport_follow_tracked_size() {
        let (ctx, mut session) = setup(Config::default());
        let (mut canvas, mut tracker) = tracked_canvas();
        tracker.on_resize(&[ResizeEntry::device_pixels(canvas.surface_id(), 640, 480)]);

        let stats = session
            .frame(&mut canvas, &tracker, DrawMode::Rectangle)
            .unwrap();
        assert!(stats.resized);
        assert_eq!(canvas.size(), SurfaceSize::new(640, 480));

        let calls = ctx.take_calls();
        assert_eq!(calls[0], GlCall::Viewport([0, 0, 640, 480]));
        assert_eq!(calls[1], GlCall::ClearColor([0.0; 4]));
        assert_eq!(calls[2], GlCall::Clear);
        assert!(matches!(calls[3], GlCall::UseProgram(Some(_))));
        assert_eq!(
            calls[4],
            GlCall::Uniform2f(session.bindings().resolution, [640.0, 480.0])
        );

        let stats = session
            .frame(&mut canvas, &tracker, DrawMode::Rectangle)
            .unwrap();
        assert!(!stats.resized);
        // the program is already current
        assert!(!ctx
            .take_calls()
            .iter()
            .any(|c| matches!(c, GlCall::UseProgram(_))));
    }

    #[test]
    fn broken_shader_stops_setup() {
        let ctx = Rc::new(RecordingContext::new());
        let sources = ShaderSources {
            vertex: PIXEL_VERT,
            fragment: "#version 300 es\nvoid main( {\n}\n",
        };

        let err = RenderSession::new(&ctx, sources, Config::default()).err().unwrap();

        assert!(matches!(
            err,
            SessionError::Program(ProgramError::Compilation { .. })
        ));
        assert_eq!(ctx.live_programs(), 0);
        assert_eq!(ctx.live_shaders(), 0);
    }

    #[test]
    fn missing_uniform_stops_setup() {
        let ctx = Rc::new(RecordingContext::new());
        let sources = ShaderSources {
            vertex: PIXEL_VERT,
            fragment: "#version 300 es\nprecision highp float;\nout vec4 c;\nvoid main() {\n  c = vec4(1.0);\n}\n",
        };

        let err = RenderSession::new(&ctx, sources, Config::default()).err().unwrap();

        assert!(matches!(
            err,
            SessionError::Program(ProgramError::MissingUniform(_))
        ));
    }

    #[test]
    fn untracked_canvas_fails_fast() {
        let (ctx, mut session) = setup(Config::default());
        let mut canvas = OffscreenCanvas::new();

        let err = session
            .frame(&mut canvas, &ResizeTracker::default(), DrawMode::Triangle)
            .unwrap_err();

        assert!(matches!(err, SessionError::Resize(_)));
        assert!(ctx.calls().is_empty());
    }
}
