use std::sync::atomic::{AtomicU64, Ordering};

/// Identity of an observed display surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceId(pub u64);

impl SurfaceId {
    /// A fresh id, unique within the process.
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Size in device pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize {
    /// What a surface reports before any resize notification arrives.
    pub const PLACEHOLDER: SurfaceSize = SurfaceSize::new(300, 150);

    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// A surface with an allocated pixel buffer that can be reallocated.
pub trait Canvas {
    fn surface_id(&self) -> SurfaceId;
    fn size(&self) -> SurfaceSize;
    fn set_size(&mut self, size: SurfaceSize);
}

/// A canvas with no backing window, used for headless runs.
#[derive(Debug)]
pub struct OffscreenCanvas {
    id: SurfaceId,
    size: SurfaceSize,
}

impl OffscreenCanvas {
    pub fn new() -> Self {
        Self {
            id: SurfaceId::next(),
            size: SurfaceSize::PLACEHOLDER,
        }
    }
}

impl Default for OffscreenCanvas {
    fn default() -> Self {
        Self::new()
    }
}

impl Canvas for OffscreenCanvas {
    fn surface_id(&self) -> SurfaceId {
        self.id
    }

    fn size(&self) -> SurfaceSize {
        self.size
    }

    fn set_size(&mut self, size: SurfaceSize) {
        self.size = size;
    }
}
