#![cfg(any(test, feature = "test-utils"))]
//! In-memory PDF engine for the test suite.
//!
//! `FakeDocument` implements the full engine contract over plain vectors:
//! page text, rotation, embedded images and an annotation log. Search is
//! case-insensitive and joins hyphen-broken line wraps, matching what the
//! real engine's flags provide. Saves snapshot the document into a shared
//! sink on the engine so command-level tests can inspect outputs by path.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use image::{DynamicImage, RgbImage};

use crate::engine::{
    ColorMode, DocMetadata, Document, EmbeddedImage, Engine, ImageEncoding, SaveMode,
};
use crate::error::{Error, Result};
use crate::geom::{PagePoint, PageRect};

const LETTER: (f32, f32) = (612.0, 792.0);

#[derive(Clone, Debug)]
pub struct FakeImage {
    pub meta: EmbeddedImage,
    /// `None` marks a corrupt stream; `image_pixels` fails on it.
    pub pixels: Option<DynamicImage>,
    pub replaced_with: Option<(Vec<u8>, ImageEncoding)>,
}

impl FakeImage {
    /// A square RGB image with the given recorded resolution.
    pub fn rgb(id: u32, side: u32, dpi: f32) -> Self {
        Self {
            meta: EmbeddedImage {
                id,
                width: side,
                height: side,
                dpi,
                color: ColorMode::Rgb,
            },
            pixels: Some(DynamicImage::ImageRgb8(RgbImage::from_pixel(
                side,
                side,
                image::Rgb([200, 200, 200]),
            ))),
            replaced_with: None,
        }
    }

    /// An image whose stream cannot be decoded.
    pub fn corrupt(id: u32) -> Self {
        Self {
            meta: EmbeddedImage {
                id,
                width: 16,
                height: 16,
                dpi: 300.0,
                color: ColorMode::Rgb,
            },
            pixels: None,
            replaced_with: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum FakeAnnotation {
    Highlight(PageRect),
    Ink(Vec<PagePoint>),
    Note(PagePoint, String),
    Redaction(PageRect),
    Text {
        at: PagePoint,
        text: String,
        size: f32,
        rotate: i32,
        opacity: f32,
    },
    TextBox {
        rect: PageRect,
        text: String,
        size: f32,
    },
}

#[derive(Clone, Debug)]
pub struct FakePage {
    pub text: String,
    pub rotation: i32,
    pub size: (f32, f32),
    pub images: Vec<FakeImage>,
    pub annotations: Vec<FakeAnnotation>,
    /// Number of `apply_redactions` calls on this page.
    pub redactions_applied: usize,
}

impl Default for FakePage {
    fn default() -> Self {
        Self {
            text: String::new(),
            rotation: 0,
            size: LETTER,
            images: Vec::new(),
            annotations: Vec::new(),
            redactions_applied: 0,
        }
    }
}

impl FakePage {
    pub fn with_text(text: &str) -> Self {
        Self {
            text: text.to_string(),
            ..Self::default()
        }
    }
}

type SavedSink = Arc<Mutex<HashMap<PathBuf, FakeDocument>>>;

#[derive(Clone, Debug, Default)]
pub struct FakeDocument {
    pub pages: Vec<FakePage>,
    pub encrypted: bool,
    pub metadata: DocMetadata,
    pub outline: usize,
    /// Every save issued against this document, in order.
    pub saves: Vec<(PathBuf, SaveMode)>,
    /// Makes linearized saves fail, to exercise the fallback path.
    pub reject_linearized: bool,
    sink: Option<SavedSink>,
}

impl FakeDocument {
    pub fn with_pages(n: usize) -> Self {
        Self {
            pages: (0..n).map(|_| FakePage::default()).collect(),
            ..Self::default()
        }
    }

    pub fn with_texts(texts: &[&str]) -> Self {
        Self {
            pages: texts.iter().map(|t| FakePage::with_text(t)).collect(),
            ..Self::default()
        }
    }

    fn page(&self, index: usize) -> Result<&FakePage> {
        self.pages
            .get(index)
            .ok_or_else(|| Error::engine(format!("page {index} out of range")))
    }

    fn page_mut(&mut self, index: usize) -> Result<&mut FakePage> {
        self.pages
            .get_mut(index)
            .ok_or_else(|| Error::engine(format!("page {index} out of range")))
    }
}

impl Document for FakeDocument {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn is_encrypted(&self) -> bool {
        self.encrypted
    }

    fn metadata(&self) -> DocMetadata {
        self.metadata.clone()
    }

    fn outline_len(&self) -> usize {
        self.outline
    }

    fn page_size(&self, page: usize) -> Result<(f32, f32)> {
        Ok(self.page(page)?.size)
    }

    fn page_text(&self, page: usize) -> Result<String> {
        Ok(self.page(page)?.text.clone())
    }

    fn render_page(&self, page: usize, dpi: u32) -> Result<RgbImage> {
        let (w, h) = self.page(page)?.size;
        let scale = dpi as f32 / 72.0;
        Ok(RgbImage::from_pixel(
            (w * scale).round() as u32,
            (h * scale).round() as u32,
            image::Rgb([255, 255, 255]),
        ))
    }

    fn search_page(&self, page: usize, needle: &str) -> Result<Vec<PageRect>> {
        let joined = self.page(page)?.text.replace("-\n", "");
        let haystack = joined.to_lowercase();
        let needle = needle.to_lowercase();
        if needle.is_empty() {
            return Ok(Vec::new());
        }

        let mut rects = Vec::new();
        let mut start = 0;
        while let Some(offset) = haystack[start..].find(&needle) {
            let at = start + offset;
            // Synthetic geometry: x spans the byte offsets of the hit.
            rects.push(PageRect::new(
                at as f32,
                0.0,
                (at + needle.len()) as f32,
                10.0,
            ));
            start = at + needle.len();
        }
        Ok(rects)
    }

    fn page_rotation(&self, page: usize) -> Result<i32> {
        Ok(self.page(page)?.rotation)
    }

    fn set_page_rotation(&mut self, page: usize, degrees: i32) -> Result<()> {
        self.page_mut(page)?.rotation = degrees;
        Ok(())
    }

    fn delete_page(&mut self, page: usize) -> Result<()> {
        self.page(page)?;
        self.pages.remove(page);
        Ok(())
    }

    fn move_page(&mut self, from: usize, to: usize) -> Result<()> {
        self.page(from)?;
        if to >= self.pages.len() {
            return Err(Error::engine(format!("page {to} out of range")));
        }
        let page = self.pages.remove(from);
        self.pages.insert(to, page);
        Ok(())
    }

    fn insert_pages(&mut self, src: &Self, from: usize, to: usize, at: usize) -> Result<()> {
        src.page(from)?;
        src.page(to)?;
        let at = at.min(self.pages.len());
        let slice: Vec<_> = src.pages[from..=to].to_vec();
        self.pages.splice(at..at, slice);
        Ok(())
    }

    fn page_images(&self, page: usize) -> Result<Vec<EmbeddedImage>> {
        Ok(self
            .page(page)?
            .images
            .iter()
            .map(|i| i.meta.clone())
            .collect())
    }

    fn image_pixels(&self, image: &EmbeddedImage) -> Result<DynamicImage> {
        for page in &self.pages {
            if let Some(img) = page.images.iter().find(|i| i.meta.id == image.id) {
                return img
                    .pixels
                    .clone()
                    .ok_or_else(|| Error::engine("unsupported image stream"));
            }
        }
        Err(Error::engine(format!("image {} not found", image.id)))
    }

    fn replace_image(
        &mut self,
        image: &EmbeddedImage,
        data: &[u8],
        encoding: ImageEncoding,
    ) -> Result<()> {
        for page in &mut self.pages {
            if let Some(img) = page.images.iter_mut().find(|i| i.meta.id == image.id) {
                img.replaced_with = Some((data.to_vec(), encoding));
                return Ok(());
            }
        }
        Err(Error::engine(format!("image {} not found", image.id)))
    }

    fn add_highlight(&mut self, page: usize, rect: PageRect) -> Result<()> {
        self.page_mut(page)?
            .annotations
            .push(FakeAnnotation::Highlight(rect));
        Ok(())
    }

    fn add_ink(&mut self, page: usize, stroke: &[PagePoint]) -> Result<()> {
        self.page_mut(page)?
            .annotations
            .push(FakeAnnotation::Ink(stroke.to_vec()));
        Ok(())
    }

    fn add_note(&mut self, page: usize, at: PagePoint, text: &str) -> Result<()> {
        self.page_mut(page)?
            .annotations
            .push(FakeAnnotation::Note(at, text.to_string()));
        Ok(())
    }

    fn add_redaction(&mut self, page: usize, rect: PageRect) -> Result<()> {
        self.page_mut(page)?
            .annotations
            .push(FakeAnnotation::Redaction(rect));
        Ok(())
    }

    fn apply_redactions(&mut self, page: usize) -> Result<()> {
        self.page_mut(page)?.redactions_applied += 1;
        Ok(())
    }

    fn insert_text(
        &mut self,
        page: usize,
        at: PagePoint,
        text: &str,
        size: f32,
        rotate: i32,
        opacity: f32,
    ) -> Result<()> {
        self.page_mut(page)?.annotations.push(FakeAnnotation::Text {
            at,
            text: text.to_string(),
            size,
            rotate,
            opacity,
        });
        Ok(())
    }

    fn insert_textbox(&mut self, page: usize, rect: PageRect, text: &str, size: f32) -> Result<()> {
        self.page_mut(page)?
            .annotations
            .push(FakeAnnotation::TextBox {
                rect,
                text: text.to_string(),
                size,
            });
        Ok(())
    }

    fn save(&mut self, path: &Path, mode: SaveMode) -> Result<()> {
        if mode == SaveMode::Linearized && self.reject_linearized {
            return Err(Error::engine("linearization not supported"));
        }
        self.saves.push((path.to_path_buf(), mode));
        if let Some(sink) = &self.sink {
            let snapshot = self.clone();
            sink.lock()
                .expect("saved-document sink poisoned")
                .insert(path.to_path_buf(), snapshot);
        }
        Ok(())
    }
}

/// Serves documents registered by path and collects everything saved.
#[derive(Clone, Debug, Default)]
pub struct FakeEngine {
    files: HashMap<PathBuf, FakeDocument>,
    saved: SavedSink,
}

impl FakeEngine {
    /// Register an input document under a path.
    pub fn insert(&mut self, path: impl Into<PathBuf>, mut doc: FakeDocument) {
        doc.sink = Some(self.saved.clone());
        self.files.insert(path.into(), doc);
    }

    /// The document most recently saved to `path`, if any.
    pub fn last_saved(&self, path: &Path) -> Option<FakeDocument> {
        self.saved
            .lock()
            .expect("saved-document sink poisoned")
            .get(path)
            .cloned()
    }

    pub fn saved_paths(&self) -> Vec<PathBuf> {
        self.saved
            .lock()
            .expect("saved-document sink poisoned")
            .keys()
            .cloned()
            .collect()
    }
}

impl Engine for FakeEngine {
    type Doc = FakeDocument;

    fn open(&self, path: &Path) -> Result<Self::Doc> {
        self.files
            .get(path)
            .cloned()
            .or_else(|| self.last_saved(path))
            .ok_or_else(|| Error::engine(format!("no such document: {}", path.display())))
    }

    /// Interprets the bytes as UTF-8 page text, yielding a one-page
    /// document. Lets recognizer pipelines round-trip without real PDFs.
    fn open_bytes(&self, bytes: &[u8]) -> Result<Self::Doc> {
        let text = String::from_utf8_lossy(bytes).into_owned();
        let mut doc = FakeDocument::with_texts(&[&text]);
        doc.sink = Some(self.saved.clone());
        Ok(doc)
    }

    fn create(&self) -> Result<Self::Doc> {
        Ok(FakeDocument {
            sink: Some(self.saved.clone()),
            ..FakeDocument::default()
        })
    }
}
