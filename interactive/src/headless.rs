use std::rc::Rc;

use gl_wrapper::recording::{GlCall, RecordingContext};

use canvas2d::canvas::{Canvas, OffscreenCanvas};
use canvas2d::resize::{ResizeEntry, ResizeTracker};
use canvas2d::shaders::ShaderSources;
use canvas2d::{Config, DrawMode, FrameStats, RenderSession};

use crate::app::AppError;

/// Runs one frame against a recording context sized like the configured
/// window, logging every recorded call at `trace` level.
pub fn run(config: Config, mode: DrawMode) -> Result<FrameStats, AppError> {
    let ctx = Rc::new(RecordingContext::new());

    let mut canvas = OffscreenCanvas::new();
    let mut tracker = ResizeTracker::default();
    tracker.register(canvas.surface_id());
    tracker.on_resize(&[ResizeEntry::device_pixels(
        canvas.surface_id(),
        config.window.width,
        config.window.height,
    )]);

    let mut session = RenderSession::new(&ctx, ShaderSources::default(), config)?;
    let stats = session.frame(&mut canvas, &tracker, mode)?;

    let calls = ctx.take_calls();
    for call in &calls {
        log::trace!("{call:?}");
    }

    let uploads = calls
        .iter()
        .filter(|c| matches!(c, GlCall::BufferData { .. }))
        .count();

    log::info!(
        "{:?}: {} draw calls, {} buffer uploads, {} gl calls into {}x{}",
        mode,
        stats.draw_calls,
        uploads,
        calls.len(),
        canvas.size().width,
        canvas.size().height
    );

    Ok(stats)
}
