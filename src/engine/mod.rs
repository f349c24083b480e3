//! Contract required from the external PDF engine.
//!
//! Everything algorithmic in this crate is generic over these traits; the
//! real backend over the `mupdf` crate lives in [`mupdf`] behind the `pdf`
//! cargo feature, and the test suite runs against the in-memory engine in
//! `crate::test_utils`.

pub mod mupdf;

use std::path::Path;

use image::{DynamicImage, RgbImage};
use serde::Serialize;

use crate::error::Result;
use crate::geom::{PagePoint, PageRect};

/// Document metadata as reported by the engine. Missing entries are empty.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct DocMetadata {
    pub title: String,
    pub author: String,
    pub subject: String,
    pub keywords: String,
    pub creator: String,
    pub producer: String,
    pub creation_date: String,
    pub mod_date: String,
}

/// Color interpretation of an embedded image stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorMode {
    Rgb,
    Gray,
    /// Indexed, separation, alpha-carrying and anything else JPEG cannot
    /// represent.
    Other,
}

/// Encoding chosen when re-embedding an image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImageEncoding {
    Jpeg,
    Png,
}

/// An embedded raster image as enumerated on a page.
#[derive(Clone, Debug, PartialEq)]
pub struct EmbeddedImage {
    /// Engine object identifier, stable for the lifetime of the document.
    pub id: u32,
    pub width: u32,
    pub height: u32,
    /// Recorded render resolution; engines report 300 when unrecorded.
    pub dpi: f32,
    pub color: ColorMode,
}

/// Structural layout requested from a save.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SaveMode {
    /// Progressive-load layout; may fail on some documents, callers fall
    /// back to [`SaveMode::Compressed`].
    Linearized,
    /// Deflate-compressed streams, no linearization.
    Compressed,
}

/// Opens documents. One engine instance serves the whole process.
pub trait Engine {
    type Doc: Document;

    fn open(&self, path: &Path) -> Result<Self::Doc>;
    fn open_bytes(&self, bytes: &[u8]) -> Result<Self::Doc>;
    /// A fresh empty document.
    fn create(&self) -> Result<Self::Doc>;
}

/// A single open document. Exclusively owned by the session that opened
/// it; all mutation happens on one thread.
pub trait Document {
    fn page_count(&self) -> usize;
    fn is_encrypted(&self) -> bool;
    fn metadata(&self) -> DocMetadata;
    fn outline_len(&self) -> usize;

    /// Page size in points.
    fn page_size(&self, page: usize) -> Result<(f32, f32)>;
    /// Plain text of a page in reading order.
    fn page_text(&self, page: usize) -> Result<String>;
    /// Render a page to an RGB raster at the given resolution.
    fn render_page(&self, page: usize, dpi: u32) -> Result<RgbImage>;
    /// Case-insensitive, dehyphenation-aware occurrences of `needle` on a
    /// page, in the order the engine reports them.
    fn search_page(&self, page: usize, needle: &str) -> Result<Vec<PageRect>>;

    /// Absolute page rotation in degrees.
    fn page_rotation(&self, page: usize) -> Result<i32>;
    fn set_page_rotation(&mut self, page: usize, degrees: i32) -> Result<()>;

    fn delete_page(&mut self, page: usize) -> Result<()>;
    /// Relocate one page, preserving the relative order of all others.
    /// Destination is the index in the collection after removal.
    fn move_page(&mut self, from: usize, to: usize) -> Result<()>;
    /// Splice pages `from..=to` of `src` into this document at `at`.
    fn insert_pages(&mut self, src: &Self, from: usize, to: usize, at: usize) -> Result<()>;

    /// Embedded raster images referenced by a page.
    fn page_images(&self, page: usize) -> Result<Vec<EmbeddedImage>>;
    /// Decode an embedded image to pixels.
    fn image_pixels(&self, image: &EmbeddedImage) -> Result<DynamicImage>;
    /// Swap the stream behind an embedded image for newly encoded data.
    fn replace_image(
        &mut self,
        image: &EmbeddedImage,
        data: &[u8],
        encoding: ImageEncoding,
    ) -> Result<()>;

    fn add_highlight(&mut self, page: usize, rect: PageRect) -> Result<()>;
    fn add_ink(&mut self, page: usize, stroke: &[PagePoint]) -> Result<()>;
    fn add_note(&mut self, page: usize, at: PagePoint, text: &str) -> Result<()>;
    fn add_redaction(&mut self, page: usize, rect: PageRect) -> Result<()>;
    /// Apply all pending redaction annotations on a page, removing the
    /// underlying content. Images are left untouched.
    fn apply_redactions(&mut self, page: usize) -> Result<()>;

    /// Free text placed at a point (watermarks). `rotate` in degrees,
    /// `opacity` in `[0, 1]`.
    fn insert_text(
        &mut self,
        page: usize,
        at: PagePoint,
        text: &str,
        size: f32,
        rotate: i32,
        opacity: f32,
    ) -> Result<()>;
    /// Centered text constrained to a rectangle (headers/footers).
    fn insert_textbox(&mut self, page: usize, rect: PageRect, text: &str, size: f32)
        -> Result<()>;

    fn save(&mut self, path: &Path, mode: SaveMode) -> Result<()>;
}
