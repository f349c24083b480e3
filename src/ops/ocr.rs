//! OCR pipeline: render each page, hand the raster to a text recognizer
//! and stitch the recognized single-page documents into a searchable
//! output.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use image::{ImageFormat, RgbImage};
use log::info;

use crate::engine::{Document, Engine};
use crate::error::{Error, Result};
use crate::ops::{CancelToken, Progress, save_linearized};

/// Produces a searchable single-page PDF from a rendered page raster.
pub trait TextRecognizer {
    /// Name used in availability errors.
    fn name(&self) -> &str;
    /// Checked before any rendering starts.
    fn is_available(&self) -> bool;
    fn image_to_pdf(&self, image: &RgbImage, lang: &str) -> Result<Vec<u8>>;
}

/// Run OCR over the whole document. Returns `false` when the run was
/// canceled, in which case nothing is written.
pub fn ocr_document<E: Engine, R: TextRecognizer>(
    engine: &E,
    recognizer: &R,
    input: &Path,
    output: &Path,
    dpi: u32,
    lang: &str,
    cancel: &CancelToken,
    mut progress: Option<Progress<'_>>,
) -> Result<bool> {
    if !recognizer.is_available() {
        return Err(Error::DependencyUnavailable(recognizer.name().to_string()));
    }

    let doc = engine.open(input)?;
    let mut out = engine.create()?;
    let total = doc.page_count();
    for page in 0..total {
        if cancel.is_canceled() {
            info!("OCR canceled before page {}", page + 1);
            return Ok(false);
        }
        let raster = doc.render_page(page, dpi)?;
        let pdf_bytes = recognizer.image_to_pdf(&raster, lang)?;
        let recognized = engine.open_bytes(&pdf_bytes)?;
        if recognized.page_count() > 0 {
            let at = out.page_count();
            out.insert_pages(&recognized, 0, recognized.page_count() - 1, at)?;
        }
        if let Some(cb) = progress.as_mut() {
            cb(page + 1, total);
        }
    }

    save_linearized(&mut out, output)?;
    Ok(true)
}

/// The Tesseract CLI as a recognizer. The executable is taken from the
/// `TESSERACT_EXE` environment variable when set.
#[derive(Clone, Debug)]
pub struct TesseractRecognizer {
    program: PathBuf,
}

impl Default for TesseractRecognizer {
    fn default() -> Self {
        let program = std::env::var_os("TESSERACT_EXE")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("tesseract"));
        Self { program }
    }
}

impl TesseractRecognizer {
    #[must_use]
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl TextRecognizer for TesseractRecognizer {
    fn name(&self) -> &str {
        "tesseract"
    }

    fn is_available(&self) -> bool {
        Command::new(&self.program)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .is_ok()
    }

    fn image_to_pdf(&self, image: &RgbImage, lang: &str) -> Result<Vec<u8>> {
        let dir = tempfile::tempdir()?;
        let input = dir.path().join("page.png");
        image
            .save_with_format(&input, ImageFormat::Png)
            .map_err(|e| Error::engine(e.to_string()))?;

        // Tesseract appends ".pdf" to the output base name itself.
        let out_base = dir.path().join("page-ocr");
        let output = Command::new(&self.program)
            .arg(&input)
            .arg(&out_base)
            .arg("pdf")
            .arg("-l")
            .arg(lang)
            .output()?;
        if !output.status.success() {
            return Err(Error::engine(format!(
                "tesseract failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(fs::read(out_base.with_extension("pdf"))?)
    }
}
