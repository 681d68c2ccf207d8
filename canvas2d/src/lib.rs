pub mod canvas;
pub mod config;
pub mod logging;
pub mod resize;
pub mod session;
pub mod shaders;

pub use canvas::{Canvas, OffscreenCanvas, SurfaceId, SurfaceSize};
pub use config::Config;
pub use resize::ResizeTracker;
pub use session::{DrawMode, FrameStats, RenderSession, SessionError};
