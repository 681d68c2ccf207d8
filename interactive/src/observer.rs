use winit::dpi::PhysicalSize;

use canvas2d::canvas::SurfaceId;
use canvas2d::resize::{BoxSize, ContentBoxSize, ContentRect, ObserveBox, ObserverHost, ResizeEntry, ResizeError};

/// Turns winit size notifications into resize records.
///
/// winit measures in physical pixels, so device pixel observation is always
/// available unless disabled. In content-box mode records carry logical sizes
/// and the tracker scales them back up.
pub struct WinitObserver {
    device_pixels: bool,
    mode: Option<ObserveBox>,
}

impl WinitObserver {
    pub fn new(device_pixels: bool) -> Self {
        Self {
            device_pixels,
            mode: None,
        }
    }

    pub fn entry(&self, target: SurfaceId, size: PhysicalSize<u32>, scale_factor: f64) -> ResizeEntry {
        match self.mode {
            Some(ObserveBox::DevicePixelContentBox) => {
                ResizeEntry::device_pixels(target, size.width, size.height)
            }
            _ => {
                let logical = size.to_logical::<f64>(scale_factor);

                ResizeEntry {
                    target,
                    device_pixel_content_box: None,
                    content_box: Some(ContentBoxSize::Fragments(vec![BoxSize::new(
                        logical.width,
                        logical.height,
                    )])),
                    content_rect: ContentRect {
                        width: logical.width,
                        height: logical.height,
                    },
                }
            }
        }
    }
}

impl ObserverHost for WinitObserver {
    fn observe(&mut self, _surface: SurfaceId, mode: ObserveBox) -> Result<(), ResizeError> {
        if mode == ObserveBox::DevicePixelContentBox && !self.device_pixels {
            return Err(ResizeError::Unsupported(
                mode,
                "device pixel observation disabled".to_string(),
            ));
        }

        self.mode = Some(mode);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use canvas2d::canvas::SurfaceSize;
    use canvas2d::resize::{resolve_entry, ResizeTracker};

    #[test]
    fn logical_records_round_trip_through_tracker() {
        let id = SurfaceId(1);
        let mut observer = WinitObserver::new(false);
        let mut tracker = ResizeTracker::new(1.5);

        assert_eq!(tracker.observe(id, &mut observer).unwrap(), ObserveBox::ContentBox);

        let entry = observer.entry(id, PhysicalSize::new(901, 451), 1.5);
        assert!(entry.device_pixel_content_box.is_none());

        let (size, _) = resolve_entry(&entry, tracker.device_pixel_ratio());
        assert_eq!(size, SurfaceSize::new(901, 451));
    }

    #[test]
    fn device_pixels_by_default() {
        let id = SurfaceId(1);
        let mut observer = WinitObserver::new(true);
        let mut tracker = ResizeTracker::default();

        tracker.observe(id, &mut observer).unwrap();
        tracker.on_resize(&[observer.entry(id, PhysicalSize::new(1280, 720), 2.0)]);

        assert_eq!(tracker.display_size(id), Some(SurfaceSize::new(1280, 720)));
    }
}
