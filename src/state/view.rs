/// Main image view transform
///
/// Turns the image size and the canvas size into the rectangle the image is
/// drawn in. Fit mode scales the whole image into the canvas; Actual mode
/// uses the zoom percentage and can be panned when the image overflows.

use cgmath::Vector2;
use iced::{Point, Rectangle, Size};

/// Smallest zoom percentage
pub const MIN_ZOOM: u32 = 10;

/// Largest zoom percentage
pub const MAX_ZOOM: u32 = 300;

/// Zoom change per mouse wheel notch
pub const ZOOM_STEP: i32 = 5;

/// Starting zoom percentage
pub const DEFAULT_ZOOM: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayMode {
    /// Scale to fit the canvas
    #[default]
    Fit,
    /// Scale by the zoom percentage
    Actual,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    pub mode: DisplayMode,
    /// Zoom in percent, always within MIN_ZOOM..=MAX_ZOOM
    pub zoom_percent: u32,
    /// Pan offset in screen pixels from the centred position
    pub offset: Vector2<f32>,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            mode: DisplayMode::Fit,
            zoom_percent: DEFAULT_ZOOM,
            offset: Vector2::new(0.0, 0.0),
        }
    }
}

impl ViewTransform {
    /// Scale factor from image pixels to screen pixels
    pub fn scale(&self, view: Size, image: Size) -> f32 {
        match self.mode {
            DisplayMode::Fit => {
                if image.width <= 0.0 || image.height <= 0.0 {
                    return 1.0;
                }
                (view.width / image.width).min(view.height / image.height)
            }
            DisplayMode::Actual => self.zoom_percent as f32 / 100.0,
        }
    }

    /// Drawn image size, never smaller than one pixel
    pub fn display_size(&self, view: Size, image: Size) -> Size {
        let scale = self.scale(view, image);
        Size::new(
            (image.width * scale).round().max(1.0),
            (image.height * scale).round().max(1.0),
        )
    }

    /// Where to draw the image inside a canvas of size `view`
    pub fn placement(&self, view: Size, image: Size) -> Rectangle {
        let size = self.display_size(view, image);
        let offset = self.clamped(self.offset, view, image);
        Rectangle::new(
            Point::new(
                (view.width - size.width) / 2.0 + offset.x,
                (view.height - size.height) / 2.0 + offset.y,
            ),
            size,
        )
    }

    /// Switch display mode; the pan is dropped
    pub fn set_mode(&mut self, mode: DisplayMode) {
        if self.mode != mode {
            self.mode = mode;
            self.reset_pan();
        }
    }

    /// Set the zoom percentage, clamped to the allowed range
    pub fn set_zoom(&mut self, percent: u32) {
        self.zoom_percent = percent.clamp(MIN_ZOOM, MAX_ZOOM);
    }

    /// Change the zoom by a signed step
    pub fn zoom_by(&mut self, step: i32) {
        let target = (self.zoom_percent as i64 + step as i64)
            .clamp(MIN_ZOOM as i64, MAX_ZOOM as i64);
        self.zoom_percent = target as u32;
    }

    /// Re-clamp the pan after the zoom or the canvas size changed
    pub fn reclamp(&mut self, view: Size, image: Size) {
        self.offset = self.clamped(self.offset, view, image);
    }

    /// Move the image by a screen-space delta
    pub fn pan(&mut self, delta: Vector2<f32>, view: Size, image: Size) {
        self.offset = self.clamped(self.offset + delta, view, image);
    }

    pub fn reset_pan(&mut self) {
        self.offset = Vector2::new(0.0, 0.0);
    }

    /// Keep the offset inside half the overflow on each axis
    fn clamped(&self, offset: Vector2<f32>, view: Size, image: Size) -> Vector2<f32> {
        let size = self.display_size(view, image);
        let limit_x = ((size.width - view.width) / 2.0).max(0.0);
        let limit_y = ((size.height - view.height) / 2.0).max(0.0);
        Vector2::new(
            offset.x.clamp(-limit_x, limit_x),
            offset.y.clamp(-limit_y, limit_y),
        )
    }
}
