//! Coordinate-space primitives.
//!
//! Three spaces are involved in pointer-driven annotation placement: the
//! display widget (pixels, origin top-left, y-down), the rendered page
//! raster (pixels, y-down) and PDF page space (points, 1/72 inch, y-down).
//! Each gets its own point type so a value can never silently cross spaces.

/// A point in the display widget's own pixel space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ViewPoint {
    pub x: f32,
    pub y: f32,
}

/// A point in the rendered page raster's pixel space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RasterPoint {
    pub x: f32,
    pub y: f32,
}

/// A point in PDF page space (points, 1/72 inch).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PagePoint {
    pub x: f32,
    pub y: f32,
}

impl ViewPoint {
    #[must_use]
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl RasterPoint {
    #[must_use]
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl PagePoint {
    #[must_use]
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned rectangle in page space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PageRect {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl PageRect {
    #[must_use]
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Build a normalized rectangle from two arbitrary corners.
    #[must_use]
    pub fn from_corners(a: PagePoint, b: PagePoint) -> Self {
        Self {
            x0: a.x.min(b.x),
            y0: a.y.min(b.y),
            x1: a.x.max(b.x),
            y1: a.y.max(b.y),
        }
    }

    #[must_use]
    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    #[must_use]
    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    /// True when the rectangle has no area.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.width() <= 0.0 || self.height() <= 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_corners_normalizes() {
        let r = PageRect::from_corners(PagePoint::new(10.0, 2.0), PagePoint::new(3.0, 8.0));
        assert_eq!(r, PageRect::new(3.0, 2.0, 10.0, 8.0));
        assert!(!r.is_empty());
    }

    #[test]
    fn degenerate_rect_is_empty() {
        let r = PageRect::from_corners(PagePoint::new(5.0, 5.0), PagePoint::new(5.0, 9.0));
        assert!(r.is_empty());
    }
}
