//! The three-space coordinate pipeline for pointer-driven annotation.
//!
//! A pointer position arrives in widget space, passes through the
//! scale-to-fit + center display transform into raster space, and is
//! divided by the render resolution into page space. Values stay floating
//! point end to end; only the engine call that needs a concrete rectangle
//! rounds anything.

use crate::geom::{PagePoint, RasterPoint, ViewPoint};

/// Scale-to-fit + center mapping from raster space to widget space,
/// computed once per render.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DisplayTransform {
    pub scale: f32,
    pub offset_x: f32,
    pub offset_y: f32,
}

impl DisplayTransform {
    pub const IDENTITY: Self = Self {
        scale: 1.0,
        offset_x: 0.0,
        offset_y: 0.0,
    };
}

/// Compute the display transform for a raster shown inside a widget.
///
/// A degenerate raster (zero width or height) yields the identity
/// transform rather than dividing by zero.
#[must_use]
pub fn compute_display_transform(widget: (f32, f32), raster: (f32, f32)) -> DisplayTransform {
    let (widget_w, widget_h) = widget;
    let (raster_w, raster_h) = raster;
    if raster_w == 0.0 || raster_h == 0.0 {
        return DisplayTransform::IDENTITY;
    }
    let scale = (widget_w / raster_w).min(widget_h / raster_h);
    DisplayTransform {
        scale,
        offset_x: (widget_w - raster_w * scale) / 2.0,
        offset_y: (widget_h - raster_h * scale) / 2.0,
    }
}

#[must_use]
pub fn view_to_raster(p: ViewPoint, t: DisplayTransform) -> RasterPoint {
    RasterPoint::new((p.x - t.offset_x) / t.scale, (p.y - t.offset_y) / t.scale)
}

#[must_use]
pub fn raster_to_view(p: RasterPoint, t: DisplayTransform) -> ViewPoint {
    ViewPoint::new(p.x * t.scale + t.offset_x, p.y * t.scale + t.offset_y)
}

#[must_use]
pub fn raster_to_page(p: RasterPoint, dpi: u32) -> PagePoint {
    let factor = 72.0 / dpi as f32;
    PagePoint::new(p.x * factor, p.y * factor)
}

#[must_use]
pub fn page_to_raster(p: PagePoint, dpi: u32) -> RasterPoint {
    let factor = dpi as f32 / 72.0;
    RasterPoint::new(p.x * factor, p.y * factor)
}

/// The full pipeline, used for every pointer-driven annotation.
#[must_use]
pub fn view_to_page(p: ViewPoint, t: DisplayTransform, dpi: u32) -> PagePoint {
    raster_to_page(view_to_raster(p, t), dpi)
}

#[must_use]
pub fn page_to_view(p: PagePoint, t: DisplayTransform, dpi: u32) -> ViewPoint {
    raster_to_view(page_to_raster(p, dpi), t)
}
