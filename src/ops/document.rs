//! Whole-document batch operations: inspect, merge, split, rotate and
//! extraction of text and embedded images.

use std::fs;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use image::DynamicImage;
use log::info;
use serde::Serialize;

use crate::engine::{DocMetadata, Document, Engine, SaveMode};
use crate::error::{Error, Result};
use crate::ranges::parse_page_ranges;

/// Basic document facts, printed as JSON by the `info` command.
#[derive(Debug, Serialize)]
pub struct DocInfo {
    pub path: String,
    pub pages: usize,
    pub is_encrypted: bool,
    pub metadata: DocMetadata,
    pub toc_len: usize,
}

pub fn info<E: Engine>(engine: &E, path: &Path) -> Result<DocInfo> {
    let doc = engine.open(path)?;
    let resolved = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    Ok(DocInfo {
        path: resolved.display().to_string(),
        pages: doc.page_count(),
        is_encrypted: doc.is_encrypted(),
        metadata: doc.metadata(),
        toc_len: doc.outline_len(),
    })
}

/// Concatenate documents in argument order into one output file.
pub fn merge<E: Engine>(engine: &E, inputs: &[PathBuf], output: &Path) -> Result<()> {
    let mut out = engine.create()?;
    for input in inputs {
        let src = engine.open(input)?;
        append(&mut out, &src)?;
    }
    out.save(output, SaveMode::Compressed)
}

fn append<D: Document>(out: &mut D, src: &D) -> Result<()> {
    if src.page_count() == 0 {
        return Ok(());
    }
    let at = out.page_count();
    out.insert_pages(src, 0, src.page_count() - 1, at)
}

/// Export each selected page as its own single-page document, named
/// `page_NNNN.pdf` after the 1-based source page number.
pub fn split<E: Engine>(
    engine: &E,
    input: &Path,
    ranges: &str,
    output_dir: &Path,
) -> Result<Vec<PathBuf>> {
    let doc = engine.open(input)?;
    let pages = parse_page_ranges(ranges, doc.page_count())?;
    fs::create_dir_all(output_dir)?;

    let mut written = Vec::with_capacity(pages.len());
    for page in pages {
        let mut out = engine.create()?;
        out.insert_pages(&doc, page, page, 0)?;
        let path = output_dir.join(format!("page_{:04}.pdf", page + 1));
        out.save(&path, SaveMode::Compressed)?;
        written.push(path);
    }
    info!("split {} pages into {}", written.len(), output_dir.display());
    Ok(written)
}

/// Rotate the selected pages by `angle` degrees, accumulating on top of
/// each page's current rotation.
pub fn rotate<E: Engine>(
    engine: &E,
    input: &Path,
    pages: &str,
    angle: i32,
    output: &Path,
) -> Result<()> {
    let mut doc = engine.open(input)?;
    for page in parse_page_ranges(pages, doc.page_count())? {
        let current = doc.page_rotation(page)?;
        doc.set_page_rotation(page, (current + angle).rem_euclid(360))?;
    }
    doc.save(output, SaveMode::Compressed)
}

/// Concatenate per-page text with `----- Page N -----` separators.
pub fn collect_text<E: Engine>(engine: &E, input: &Path) -> Result<String> {
    let doc = engine.open(input)?;
    let mut text = String::new();
    for page in 0..doc.page_count() {
        let _ = writeln!(text, "----- Page {} -----", page + 1);
        text.push_str(&doc.page_text(page)?);
    }
    Ok(text)
}

pub fn extract_text<E: Engine>(engine: &E, input: &Path, output_txt: &Path) -> Result<()> {
    fs::write(output_txt, collect_text(engine, input)?)?;
    Ok(())
}

/// Dump every embedded raster as PNG, alpha flattened to RGB. Returns
/// the number of images written.
pub fn extract_images<E: Engine>(engine: &E, input: &Path, output_dir: &Path) -> Result<usize> {
    let doc = engine.open(input)?;
    fs::create_dir_all(output_dir)?;

    let mut count = 0;
    for page in 0..doc.page_count() {
        for img in doc.page_images(page)? {
            let pixels = doc.image_pixels(&img)?;
            let flattened = if pixels.color().has_alpha() {
                DynamicImage::ImageRgb8(pixels.to_rgb8())
            } else {
                pixels
            };
            let path = output_dir.join(format!("p{:04}_img{}.png", page + 1, img.id));
            flattened
                .save_with_format(&path, image::ImageFormat::Png)
                .map_err(|e| Error::engine(e.to_string()))?;
            count += 1;
        }
    }
    Ok(count)
}
