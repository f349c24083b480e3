//! Image downsampling policy and best-effort batch recompression.
//!
//! The policy is pure: given an image's recorded resolution, the DPI
//! budget and its color mode, it decides whether to downscale and which
//! encoding to re-embed with. The batch walks every embedded image,
//! applies the policy and records a per-image outcome; one broken image
//! never aborts the rest of the document.

use std::io::Cursor;
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use log::debug;

use crate::engine::{ColorMode, Document, EmbeddedImage, Engine, ImageEncoding};
use crate::error::{Error, Result};
use crate::ops::{CancelToken, save_linearized};

/// What to do with one embedded image.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResampleDecision {
    pub should_scale: bool,
    pub scale_factor: f32,
    pub encoding: ImageEncoding,
}

/// Decide the resample for an image against a `max_dpi` budget.
///
/// JPEG for RGB and grayscale; PNG preserves the modes JPEG cannot
/// represent (indexed, alpha).
#[must_use]
pub fn decide(image_dpi: f32, max_dpi: u32, color: ColorMode) -> ResampleDecision {
    let should_scale = image_dpi > max_dpi as f32;
    ResampleDecision {
        should_scale,
        scale_factor: if should_scale {
            max_dpi as f32 / image_dpi
        } else {
            1.0
        },
        encoding: match color {
            ColorMode::Rgb | ColorMode::Gray => ImageEncoding::Jpeg,
            ColorMode::Other => ImageEncoding::Png,
        },
    }
}

/// Scaled dimensions, never zero on either axis.
#[must_use]
pub fn target_dimensions(width: u32, height: u32, scale: f32) -> (u32, u32) {
    let dim = |d: u32| ((d as f32 * scale).round() as u32).max(1);
    (dim(width), dim(height))
}

/// Outcome for one embedded image.
#[derive(Clone, Debug, PartialEq)]
pub enum ResampleOutcome {
    Replaced { image: u32 },
    Skipped { image: u32, reason: String },
}

/// Aggregated result of a recompression pass.
#[derive(Debug, Default)]
pub struct CompressReport {
    pub outcomes: Vec<ResampleOutcome>,
    pub canceled: bool,
}

impl CompressReport {
    #[must_use]
    pub fn replaced(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, ResampleOutcome::Replaced { .. }))
            .count()
    }

    #[must_use]
    pub fn skipped(&self) -> usize {
        self.outcomes.len() - self.replaced()
    }
}

/// Recompress every embedded image in place, best-effort.
pub fn recompress_images<D: Document>(
    doc: &mut D,
    quality: u8,
    max_dpi: u32,
    cancel: &CancelToken,
) -> Result<CompressReport> {
    let mut report = CompressReport::default();
    'pages: for page in 0..doc.page_count() {
        let images = match doc.page_images(page) {
            Ok(images) => images,
            Err(err) => {
                debug!("cannot enumerate images on page {}: {err}", page + 1);
                continue;
            }
        };
        for img in images {
            if cancel.is_canceled() {
                report.canceled = true;
                break 'pages;
            }
            match recompress_one(doc, &img, quality, max_dpi) {
                Ok(()) => report.outcomes.push(ResampleOutcome::Replaced { image: img.id }),
                Err(err) => {
                    debug!("skipping image {} on page {}: {err}", img.id, page + 1);
                    report.outcomes.push(ResampleOutcome::Skipped {
                        image: img.id,
                        reason: err.to_string(),
                    });
                }
            }
        }
    }
    Ok(report)
}

fn recompress_one<D: Document>(
    doc: &mut D,
    img: &EmbeddedImage,
    quality: u8,
    max_dpi: u32,
) -> Result<()> {
    let decision = decide(img.dpi, max_dpi, img.color);
    let mut pixels = doc.image_pixels(img)?;
    if decision.should_scale {
        let (w, h) = target_dimensions(pixels.width(), pixels.height(), decision.scale_factor);
        pixels = pixels.resize_exact(w, h, FilterType::Triangle);
    }

    let mut buf = Vec::new();
    match decision.encoding {
        ImageEncoding::Jpeg => {
            let flat = match img.color {
                ColorMode::Gray => DynamicImage::ImageLuma8(pixels.to_luma8()),
                _ => DynamicImage::ImageRgb8(pixels.to_rgb8()),
            };
            let encoder = JpegEncoder::new_with_quality(&mut buf, quality);
            flat.write_with_encoder(encoder)
                .map_err(|e| Error::engine(e.to_string()))?;
        }
        ImageEncoding::Png => {
            pixels
                .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
                .map_err(|e| Error::engine(e.to_string()))?;
        }
    }
    doc.replace_image(img, &buf, decision.encoding)
}

/// The `compress` command: recompress images, then a structural save
/// (linearized with the usual fallback). A canceled run leaves the
/// source untouched and writes nothing.
pub fn compress_document<E: Engine>(
    engine: &E,
    input: &Path,
    output: &Path,
    quality: u8,
    max_dpi: u32,
    cancel: &CancelToken,
) -> Result<CompressReport> {
    let mut doc = engine.open(input)?;
    let report = recompress_images(&mut doc, quality, max_dpi, cancel)?;
    if !report.canceled {
        save_linearized(&mut doc, output)?;
    }
    Ok(report)
}
