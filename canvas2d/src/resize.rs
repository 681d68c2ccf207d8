//! Tracking of display surface sizes in device pixels.
//!
//! Size change notifications arrive in batches, detached from drawing. The
//! tracker keeps the latest size per surface; the frame driver reads it right
//! before configuring the viewport.

use std::collections::HashMap;

use thiserror::Error;

use crate::canvas::{Canvas, SurfaceId, SurfaceSize};

/// Width and height of a box, in the host's units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxSize {
    pub inline_size: f64,
    pub block_size: f64,
}

impl BoxSize {
    pub fn new(inline_size: f64, block_size: f64) -> Self {
        Self {
            inline_size,
            block_size,
        }
    }
}

/// Content box as reported by the host. Older hosts hand out a single box
/// instead of a list of fragments.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentBoxSize {
    Fragments(Vec<BoxSize>),
    Single(BoxSize),
}

impl ContentBoxSize {
    fn first(&self) -> Option<BoxSize> {
        match self {
            ContentBoxSize::Fragments(boxes) => boxes.first().copied(),
            ContentBoxSize::Single(size) => Some(*size),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContentRect {
    pub width: f64,
    pub height: f64,
}

/// One size change record.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeEntry {
    pub target: SurfaceId,
    /// Exact size in device pixels, when the host can provide it.
    pub device_pixel_content_box: Option<Vec<BoxSize>>,
    /// Content box in logical pixels.
    pub content_box: Option<ContentBoxSize>,
    /// Content rectangle in logical pixels, always present.
    pub content_rect: ContentRect,
}

impl ResizeEntry {
    /// Record from a host that already measures in device pixels.
    pub fn device_pixels(target: SurfaceId, width: u32, height: u32) -> Self {
        let size = BoxSize::new(width as f64, height as f64);

        Self {
            target,
            device_pixel_content_box: Some(vec![size]),
            content_box: None,
            content_rect: ContentRect {
                width: width as f64,
                height: height as f64,
            },
        }
    }
}

/// Which measurement a record was resolved with, most precise first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeMetric {
    DevicePixelContentBox,
    ContentBox,
    ContentRect,
}

/// Observation modes a host can be asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObserveBox {
    DevicePixelContentBox,
    ContentBox,
}

#[derive(Debug, Error)]
pub enum ResizeError {
    #[error("surface {0:?} is not tracked")]
    UnknownSurface(SurfaceId),
    #[error("host rejected {0:?} observation: {1}")]
    Unsupported(ObserveBox, String),
}

/// Source of size change notifications.
pub trait ObserverHost {
    fn observe(&mut self, surface: SurfaceId, mode: ObserveBox) -> Result<(), ResizeError>;
}

/// Resolves a record into device pixels with the best available metric.
pub fn resolve_entry(entry: &ResizeEntry, device_pixel_ratio: f64) -> (SurfaceSize, SizeMetric) {
    let (width, height, dpr, metric) = if let Some(size) = entry
        .device_pixel_content_box
        .as_ref()
        .and_then(|boxes| boxes.first())
    {
        (size.inline_size, size.block_size, 1.0, SizeMetric::DevicePixelContentBox)
    } else if let Some(size) = entry.content_box.as_ref().and_then(ContentBoxSize::first) {
        (size.inline_size, size.block_size, device_pixel_ratio, SizeMetric::ContentBox)
    } else {
        (
            entry.content_rect.width,
            entry.content_rect.height,
            device_pixel_ratio,
            SizeMetric::ContentRect,
        )
    };

    let size = SurfaceSize::new(to_pixels(width * dpr), to_pixels(height * dpr));

    (size, metric)
}

fn to_pixels(value: f64) -> u32 {
    if value.is_finite() && value > 0.0 {
        value.round().min(u32::MAX as f64) as u32
    } else {
        0
    }
}

#[derive(Debug)]
pub struct ResizeTracker {
    sizes: HashMap<SurfaceId, SurfaceSize>,
    device_pixel_ratio: f64,
}

impl Default for ResizeTracker {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl ResizeTracker {
    pub fn new(device_pixel_ratio: f64) -> Self {
        Self {
            sizes: HashMap::new(),
            device_pixel_ratio,
        }
    }

    pub fn device_pixel_ratio(&self) -> f64 {
        self.device_pixel_ratio
    }

    pub fn set_device_pixel_ratio(&mut self, ratio: f64) {
        self.device_pixel_ratio = ratio;
    }

    /// Starts tracking `surface` at the placeholder size. Keeps an existing
    /// record untouched.
    pub fn register(&mut self, surface: SurfaceId) {
        self.sizes
            .entry(surface)
            .or_insert(SurfaceSize::PLACEHOLDER);
    }

    /// Registers `surface` and asks `host` for notifications, preferring
    /// exact device pixel sizes and falling back to the content box.
    pub fn observe<H: ObserverHost>(
        &mut self,
        surface: SurfaceId,
        host: &mut H,
    ) -> Result<ObserveBox, ResizeError> {
        self.register(surface);

        match host.observe(surface, ObserveBox::DevicePixelContentBox) {
            Ok(()) => Ok(ObserveBox::DevicePixelContentBox),
            Err(e) => {
                log::debug!("falling back to content-box observation: {e}");
                host.observe(surface, ObserveBox::ContentBox)?;
                Ok(ObserveBox::ContentBox)
            }
        }
    }

    pub fn display_size(&self, surface: SurfaceId) -> Option<SurfaceSize> {
        self.sizes.get(&surface).copied()
    }

    /// Applies a batch of size change records.
    pub fn on_resize(&mut self, entries: &[ResizeEntry]) {
        for entry in entries {
            let (size, metric) = resolve_entry(entry, self.device_pixel_ratio);

            log::debug!(
                "using {:?} for resize of {:?}: {}x{}",
                metric,
                entry.target,
                size.width,
                size.height
            );

            self.sizes.insert(entry.target, size);
        }
    }

    /// Reallocates the canvas to its tracked display size. Returns whether
    /// the canvas size changed.
    pub fn resize_canvas_to_display_size<C: Canvas + ?Sized>(
        &self,
        canvas: &mut C,
    ) -> Result<bool, ResizeError> {
        let id = canvas.surface_id();
        let display = self
            .display_size(id)
            .ok_or(ResizeError::UnknownSurface(id))?;

        let need_resize = canvas.size() != display;

        if need_resize {
            canvas.set_size(display);
        }

        Ok(need_resize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::OffscreenCanvas;

    fn logical(target: SurfaceId, content_box: Option<ContentBoxSize>, w: f64, h: f64) -> ResizeEntry {
        ResizeEntry {
            target,
            device_pixel_content_box: None,
            content_box,
            content_rect: ContentRect { width: w, height: h },
        }
    }

    struct Host {
        precise: bool,
        modes: Vec<ObserveBox>,
    }

    impl ObserverHost for Host {
        fn observe(&mut self, _surface: SurfaceId, mode: ObserveBox) -> Result<(), ResizeError> {
            if mode == ObserveBox::DevicePixelContentBox && !self.precise {
                return Err(ResizeError::Unsupported(mode, "not supported".to_string()));
            }
            self.modes.push(mode);
            Ok(())
        }
    }

    #[test]
    fn starts_at_placeholder() {
        let canvas = OffscreenCanvas::new();
        let mut tracker = ResizeTracker::default();
        tracker.register(canvas.surface_id());

        assert_eq!(
            tracker.display_size(canvas.surface_id()),
            Some(SurfaceSize::new(300, 150))
        );
    }

    #[test]
    fn device_pixels_win() {
        let id = SurfaceId(1);
        let entry = ResizeEntry {
            device_pixel_content_box: Some(vec![BoxSize::new(801.0, 603.0)]),
            content_box: Some(ContentBoxSize::Fragments(vec![BoxSize::new(400.0, 300.0)])),
            ..logical(id, None, 400.0, 300.0)
        };

        let (size, metric) = resolve_entry(&entry, 2.0);

        assert_eq!(metric, SizeMetric::DevicePixelContentBox);
        assert_eq!(size, SurfaceSize::new(801, 603));
    }

    #[test]
    fn content_box_is_scaled_and_rounded() {
        let id = SurfaceId(1);
        let entry = logical(
            id,
            Some(ContentBoxSize::Fragments(vec![BoxSize::new(100.3, 50.5)])),
            0.0,
            0.0,
        );

        let (size, metric) = resolve_entry(&entry, 1.5);

        assert_eq!(metric, SizeMetric::ContentBox);
        // 150.45 and 75.75
        assert_eq!(size, SurfaceSize::new(150, 76));
    }

    #[test]
    fn single_content_box_is_accepted() {
        let entry = logical(
            SurfaceId(1),
            Some(ContentBoxSize::Single(BoxSize::new(200.0, 100.0))),
            1.0,
            1.0,
        );

        assert_eq!(
            resolve_entry(&entry, 2.0),
            (SurfaceSize::new(400, 200), SizeMetric::ContentBox)
        );
    }

    #[test]
    fn content_rect_is_last_resort() {
        let entry = logical(SurfaceId(1), Some(ContentBoxSize::Fragments(vec![])), 640.0, 480.0);

        assert_eq!(
            resolve_entry(&entry, 1.25),
            (SurfaceSize::new(800, 600), SizeMetric::ContentRect)
        );
    }

    #[test]
    fn resize_once_per_change() {
        let mut canvas = OffscreenCanvas::new();
        let id = canvas.surface_id();
        let mut tracker = ResizeTracker::new(2.0);
        tracker.register(id);

        assert!(!tracker.resize_canvas_to_display_size(&mut canvas).unwrap());

        tracker.on_resize(&[logical(
            id,
            Some(ContentBoxSize::Fragments(vec![BoxSize::new(320.0, 200.0)])),
            320.0,
            200.0,
        )]);

        assert!(tracker.resize_canvas_to_display_size(&mut canvas).unwrap());
        assert_eq!(canvas.size(), SurfaceSize::new(640, 400));
        assert!(!tracker.resize_canvas_to_display_size(&mut canvas).unwrap());

        // same size again is not a genuine change
        tracker.on_resize(&[ResizeEntry::device_pixels(id, 640, 400)]);
        assert!(!tracker.resize_canvas_to_display_size(&mut canvas).unwrap());
    }

    #[test]
    fn scale_change_rescales_content_box() {
        let mut canvas = OffscreenCanvas::new();
        let id = canvas.surface_id();
        let mut tracker = ResizeTracker::new(1.0);
        tracker.register(id);

        tracker.set_device_pixel_ratio(2.5);
        assert_eq!(tracker.device_pixel_ratio(), 2.5);

        tracker.on_resize(&[logical(
            id,
            Some(ContentBoxSize::Fragments(vec![BoxSize::new(101.0, 33.0)])),
            101.0,
            33.0,
        )]);

        // 252.5 and 82.5 round away from zero
        assert!(tracker.resize_canvas_to_display_size(&mut canvas).unwrap());
        assert_eq!(canvas.size(), SurfaceSize::new(253, 83));
    }

    #[test]
    fn latest_record_in_batch_wins() {
        let mut canvas = OffscreenCanvas::new();
        let id = canvas.surface_id();
        let other = SurfaceId(u64::MAX);
        let mut tracker = ResizeTracker::default();
        tracker.register(id);

        tracker.on_resize(&[
            ResizeEntry::device_pixels(id, 10, 10),
            ResizeEntry::device_pixels(other, 99, 99),
            ResizeEntry::device_pixels(id, 20, 30),
        ]);

        tracker.resize_canvas_to_display_size(&mut canvas).unwrap();
        assert_eq!(canvas.size(), SurfaceSize::new(20, 30));
        assert_eq!(tracker.display_size(other), Some(SurfaceSize::new(99, 99)));
    }

    #[test]
    fn unknown_surface_fails() {
        let mut canvas = OffscreenCanvas::new();
        let tracker = ResizeTracker::default();

        assert!(matches!(
            tracker.resize_canvas_to_display_size(&mut canvas),
            Err(ResizeError::UnknownSurface(_))
        ));
    }

    #[test]
    fn observe_falls_back_to_content_box() {
        let id = SurfaceId(7);
        let mut tracker = ResizeTracker::default();

        let mut precise = Host {
            precise: true,
            modes: vec![],
        };
        assert_eq!(
            tracker.observe(id, &mut precise).unwrap(),
            ObserveBox::DevicePixelContentBox
        );

        let mut coarse = Host {
            precise: false,
            modes: vec![],
        };
        assert_eq!(tracker.observe(id, &mut coarse).unwrap(), ObserveBox::ContentBox);
        assert_eq!(coarse.modes, vec![ObserveBox::ContentBox]);
        assert_eq!(tracker.display_size(id), Some(SurfaceSize::PLACEHOLDER));
    }
}
