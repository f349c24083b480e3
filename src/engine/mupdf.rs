#![cfg(feature = "pdf")]
//! Engine backend over the `mupdf` crate.
//!
//! Every document is opened through [`PdfDocument`] so structural edits
//! (page-tree splicing via graft maps, object dictionary access) are
//! available alongside the rendering and text APIs the `fz` layer derefs
//! to. Annotation properties the binding does not wrap directly are set
//! through the annotation's object dictionary, then materialized with
//! `PdfPage::update`.

use std::io::Write as _;
use std::path::Path;

use image::{DynamicImage, GrayImage, RgbImage};
use log::debug;
use mupdf::pdf::{PdfAnnotationType, PdfDocument, PdfObject, PdfPage, PdfWriteOptions};
use mupdf::{Buffer, Colorspace, Matrix, MetadataName, Page, Rect, TextPageFlags};

use crate::error::{Error, Result};
use crate::geom::{PagePoint, PageRect};

use super::{ColorMode, DocMetadata, Document, EmbeddedImage, Engine, ImageEncoding, SaveMode};

/// Resolution assumed for images whose placement is not tracked.
const DEFAULT_IMAGE_DPI: f32 = 300.0;
/// Per-page cap on reported search hits.
const SEARCH_HIT_MAX: u32 = 512;

fn engine_err(err: mupdf::Error) -> Error {
    Error::engine(err.to_string())
}

fn path_str(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

fn to_buffer(data: &[u8]) -> Result<Buffer> {
    let mut buf = Buffer::with_capacity(data.len());
    buf.write_all(data)?;
    Ok(buf)
}

pub struct MupdfEngine;

impl Engine for MupdfEngine {
    type Doc = MupdfDocument;

    fn open(&self, path: &Path) -> Result<Self::Doc> {
        let doc = PdfDocument::open(path).map_err(engine_err)?;
        Ok(MupdfDocument { doc })
    }

    fn open_bytes(&self, bytes: &[u8]) -> Result<Self::Doc> {
        let doc = PdfDocument::from_bytes(bytes).map_err(engine_err)?;
        Ok(MupdfDocument { doc })
    }

    fn create(&self) -> Result<Self::Doc> {
        Ok(MupdfDocument {
            doc: PdfDocument::new(),
        })
    }
}

pub struct MupdfDocument {
    doc: PdfDocument,
}

impl MupdfDocument {
    fn load_page(&self, page: usize) -> Result<Page> {
        self.doc.load_page(page as i32).map_err(engine_err)
    }

    fn load_pdf_page(&self, page: usize) -> Result<PdfPage> {
        PdfPage::try_from(self.load_page(page)?).map_err(engine_err)
    }

    fn metadata_entry(&self, name: MetadataName) -> String {
        self.doc.metadata(name).unwrap_or_default()
    }

    /// The page's /Resources /XObject dictionary, if it has one.
    fn xobjects(&self, page: usize) -> Result<Option<PdfObject>> {
        let page_obj = self.doc.find_page(page as i32).map_err(engine_err)?;
        let resources = match page_obj.get_dict("Resources").map_err(engine_err)? {
            Some(res) => res,
            None => return Ok(None),
        };
        resources.get_dict("XObject").map_err(engine_err)
    }

    fn image_object(&self, id: u32) -> Result<PdfObject> {
        self.doc
            .new_indirect(id as i32, 0)
            .map_err(engine_err)?
            .resolve()
            .map_err(engine_err)?
            .ok_or_else(|| Error::engine(format!("image object {id} not found")))
    }
}

fn quad_to_rect(quad: &mupdf::Quad) -> PageRect {
    let xs = [quad.ul.x, quad.ur.x, quad.ll.x, quad.lr.x];
    let ys = [quad.ul.y, quad.ur.y, quad.ll.y, quad.lr.y];
    let min = |v: [f32; 4]| v.into_iter().fold(f32::INFINITY, f32::min);
    let max = |v: [f32; 4]| v.into_iter().fold(f32::NEG_INFINITY, f32::max);
    PageRect::new(min(xs), min(ys), max(xs), max(ys))
}

fn to_mupdf_rect(rect: PageRect) -> Rect {
    Rect::new(rect.x0, rect.y0, rect.x1, rect.y1)
}

fn name_is(obj: Option<&PdfObject>, expected: &[u8]) -> bool {
    obj.and_then(|o| o.as_name().ok()).is_some_and(|n| n == expected)
}

/// First /Filter name of a stream object, whether the entry is a single
/// name or a decode-chain array.
fn stream_filter(obj: &PdfObject) -> Result<Option<Vec<u8>>> {
    let Some(filter) = obj.get_dict("Filter").map_err(engine_err)? else {
        return Ok(None);
    };
    if filter.is_name().map_err(engine_err)? {
        return Ok(Some(filter.as_name().map_err(engine_err)?.to_vec()));
    }
    if filter.is_array().map_err(engine_err)? {
        if let Some(first) = filter.get_array(0).map_err(engine_err)? {
            return Ok(Some(first.as_name().map_err(engine_err)?.to_vec()));
        }
    }
    Ok(None)
}

/// Dictionary of the newest annotation on a page.
///
/// `create_annotation` appends to /Annots but exposes no handle to the
/// annotation object itself, so entries the binding has no setter for
/// (/Contents, /DA, /CA, /QuadPoints, /InkList) go in through the array.
fn last_annot_dict(page: &PdfPage) -> Result<PdfObject> {
    let annots = page
        .object()
        .get_dict("Annots")
        .map_err(engine_err)?
        .ok_or_else(|| Error::engine("page has no annotations array"))?;
    let len = annots.len().map_err(engine_err)?;
    let entry = annots
        .get_array(len as i32 - 1)
        .map_err(engine_err)?
        .ok_or_else(|| Error::engine("empty annotations array"))?;
    if entry.is_indirect().map_err(engine_err)? {
        entry
            .resolve()
            .map_err(engine_err)?
            .ok_or_else(|| Error::engine("dangling annotation reference"))
    } else {
        Ok(entry)
    }
}

impl Document for MupdfDocument {
    fn page_count(&self) -> usize {
        self.doc.page_count().unwrap_or(0).max(0) as usize
    }

    fn is_encrypted(&self) -> bool {
        self.doc.needs_password().unwrap_or(false)
    }

    fn metadata(&self) -> DocMetadata {
        DocMetadata {
            title: self.metadata_entry(MetadataName::Title),
            author: self.metadata_entry(MetadataName::Author),
            subject: self.metadata_entry(MetadataName::Subject),
            keywords: self.metadata_entry(MetadataName::Keywords),
            creator: self.metadata_entry(MetadataName::Creator),
            producer: self.metadata_entry(MetadataName::Producer),
            creation_date: self.metadata_entry(MetadataName::CreationDate),
            mod_date: self.metadata_entry(MetadataName::ModDate),
        }
    }

    fn outline_len(&self) -> usize {
        self.doc.outlines().map(|o| o.len()).unwrap_or(0)
    }

    fn page_size(&self, page: usize) -> Result<(f32, f32)> {
        let bounds = self.load_page(page)?.bounds().map_err(engine_err)?;
        Ok((bounds.x1 - bounds.x0, bounds.y1 - bounds.y0))
    }

    fn page_text(&self, page: usize) -> Result<String> {
        let page = self.load_page(page)?;
        let text_page = page
            .to_text_page(TextPageFlags::empty())
            .map_err(engine_err)?;
        let mut out = String::new();
        for block in text_page.blocks() {
            for line in block.lines() {
                for ch in line.chars() {
                    if let Some(c) = ch.char() {
                        out.push(c);
                    }
                }
                out.push('\n');
            }
        }
        Ok(out)
    }

    fn render_page(&self, page: usize, dpi: u32) -> Result<RgbImage> {
        let page = self.load_page(page)?;
        let scale = dpi as f32 / 72.0;
        let pixmap = page
            .to_pixmap(
                &Matrix::new_scale(scale, scale),
                &Colorspace::device_rgb(),
                false,
                false,
            )
            .map_err(engine_err)?;
        let (width, height) = (pixmap.width(), pixmap.height());
        RgbImage::from_raw(width, height, pixmap.samples().to_vec())
            .ok_or_else(|| Error::engine("pixmap buffer size mismatch"))
    }

    fn search_page(&self, page: usize, needle: &str) -> Result<Vec<PageRect>> {
        let page = self.load_page(page)?;
        let quads = page.search(needle, SEARCH_HIT_MAX).map_err(engine_err)?;
        Ok(quads.iter().map(quad_to_rect).collect())
    }

    fn page_rotation(&self, page: usize) -> Result<i32> {
        self.load_pdf_page(page)?.rotation().map_err(engine_err)
    }

    fn set_page_rotation(&mut self, page: usize, degrees: i32) -> Result<()> {
        self.load_pdf_page(page)?
            .set_rotation(degrees)
            .map_err(engine_err)
    }

    fn delete_page(&mut self, page: usize) -> Result<()> {
        self.doc.delete_page(page as i32).map_err(engine_err)
    }

    fn move_page(&mut self, from: usize, to: usize) -> Result<()> {
        // The object survives removal from the page tree, so remove then
        // reinsert at the destination index of the shortened sequence.
        let page = self.doc.find_page(from as i32).map_err(engine_err)?;
        self.doc.delete_page(from as i32).map_err(engine_err)?;
        self.doc.insert_page(to as i32, &page).map_err(engine_err)
    }

    fn insert_pages(&mut self, src: &Self, from: usize, to: usize, at: usize) -> Result<()> {
        // One graft map for the whole splice so resources shared between
        // the copied pages are carried over once.
        let mut map = self.doc.new_graft_map().map_err(engine_err)?;
        for (offset, page) in (from..=to).enumerate() {
            let src_obj = src.doc.find_page(page as i32).map_err(engine_err)?;
            let grafted = map.graft_object(&src_obj).map_err(engine_err)?;
            self.doc
                .insert_page((at + offset) as i32, &grafted)
                .map_err(engine_err)?;
        }
        Ok(())
    }

    fn page_images(&self, page: usize) -> Result<Vec<EmbeddedImage>> {
        let xobjects = match self.xobjects(page)? {
            Some(dict) => dict,
            None => return Ok(Vec::new()),
        };
        let mut images = Vec::new();
        for i in 0..xobjects.dict_len().map_err(engine_err)? {
            let Some(entry) = xobjects.get_dict_val(i as i32).map_err(engine_err)? else {
                continue;
            };
            // Only indirect streams are addressable for later replacement.
            let Ok(id) = entry.as_indirect() else {
                continue;
            };
            let Some(resolved) = entry.resolve().map_err(engine_err)? else {
                continue;
            };
            let subtype = resolved.get_dict("Subtype").map_err(engine_err)?;
            if !name_is(subtype.as_ref(), b"Image") {
                continue;
            }

            let int_of = |key: &str| -> Result<i32> {
                Ok(resolved
                    .get_dict(key)
                    .map_err(engine_err)?
                    .and_then(|v| v.as_int().ok())
                    .unwrap_or(0))
            };
            let width = int_of("Width")?.max(0) as u32;
            let height = int_of("Height")?.max(0) as u32;
            if width == 0 || height == 0 {
                continue;
            }
            let colorspace = resolved.get_dict("ColorSpace").map_err(engine_err)?;
            let color = if name_is(colorspace.as_ref(), b"DeviceRGB") {
                ColorMode::Rgb
            } else if name_is(colorspace.as_ref(), b"DeviceGray") {
                ColorMode::Gray
            } else {
                ColorMode::Other
            };

            images.push(EmbeddedImage {
                id: id as u32,
                width,
                height,
                // Placement geometry is not tracked; assume the stream
                // default the way scanners record it.
                dpi: DEFAULT_IMAGE_DPI,
                color,
            });
        }
        Ok(images)
    }

    fn image_pixels(&self, image: &EmbeddedImage) -> Result<DynamicImage> {
        let obj = self.image_object(image.id)?;
        // DCT streams are complete JPEG files; everything else comes out
        // of the decode chain as bare samples.
        if stream_filter(&obj)?.as_deref() == Some(b"DCTDecode".as_slice()) {
            let data = obj.read_raw_stream().map_err(engine_err)?;
            return image::load_from_memory(&data).map_err(|e| Error::engine(e.to_string()));
        }

        let samples = obj.read_stream().map_err(engine_err)?;
        let (w, h) = (image.width, image.height);
        let expected_rgb = (w as usize) * (h as usize) * 3;
        let expected_gray = (w as usize) * (h as usize);
        if samples.len() == expected_rgb {
            RgbImage::from_raw(w, h, samples)
                .map(DynamicImage::ImageRgb8)
                .ok_or_else(|| Error::engine("image sample buffer size mismatch"))
        } else if samples.len() == expected_gray {
            GrayImage::from_raw(w, h, samples)
                .map(DynamicImage::ImageLuma8)
                .ok_or_else(|| Error::engine("image sample buffer size mismatch"))
        } else {
            Err(Error::engine("unsupported image stream"))
        }
    }

    fn replace_image(
        &mut self,
        image: &EmbeddedImage,
        data: &[u8],
        encoding: ImageEncoding,
    ) -> Result<()> {
        // The payload dictates the stream dictionary: dimensions may have
        // changed under downsampling.
        let decoded = image::load_from_memory(data).map_err(|e| Error::engine(e.to_string()))?;
        let mut obj = self.image_object(image.id)?;
        let int = |v: u32| PdfObject::new_int(v as i32).map_err(engine_err);
        obj.dict_put("Width", int(decoded.width())?).map_err(engine_err)?;
        obj.dict_put("Height", int(decoded.height())?).map_err(engine_err)?;
        obj.dict_put("BitsPerComponent", int(8)?).map_err(engine_err)?;
        let _ = obj.dict_delete("DecodeParms");
        // The replacement carries no soft mask.
        let _ = obj.dict_delete("SMask");

        match encoding {
            ImageEncoding::Jpeg => {
                let colorspace = match decoded {
                    DynamicImage::ImageLuma8(_) => "DeviceGray",
                    _ => "DeviceRGB",
                };
                obj.dict_put("ColorSpace", PdfObject::new_name(colorspace).map_err(engine_err)?)
                    .map_err(engine_err)?;
                obj.dict_put("Filter", PdfObject::new_name("DCTDecode").map_err(engine_err)?)
                    .map_err(engine_err)?;
                // Raw write: the payload is the already-encoded stream.
                obj.write_raw_stream_buffer(&to_buffer(data)?)
                    .map_err(engine_err)?;
            }
            ImageEncoding::Png => {
                // PNG is only an interchange container here; re-embed the
                // pixels as plain samples and let the writer deflate them.
                let rgb = decoded.to_rgb8();
                obj.dict_put("ColorSpace", PdfObject::new_name("DeviceRGB").map_err(engine_err)?)
                    .map_err(engine_err)?;
                obj.write_stream_buffer(&to_buffer(rgb.as_raw())?)
                    .map_err(engine_err)?;
            }
        }
        debug!("replaced image stream {}", image.id);
        Ok(())
    }

    fn add_highlight(&mut self, page: usize, rect: PageRect) -> Result<()> {
        let mut page = self.load_pdf_page(page)?;
        let mut annot = page
            .create_annotation(PdfAnnotationType::Highlight)
            .map_err(engine_err)?;
        annot.set_rect(to_mupdf_rect(rect)).map_err(engine_err)?;
        let mut quads = self.doc.new_array().map_err(engine_err)?;
        for v in [
            rect.x0, rect.y0, rect.x1, rect.y0, rect.x0, rect.y1, rect.x1, rect.y1,
        ] {
            quads
                .array_push(PdfObject::new_real(v).map_err(engine_err)?)
                .map_err(engine_err)?;
        }
        last_annot_dict(&page)?
            .dict_put("QuadPoints", quads)
            .map_err(engine_err)?;
        page.update().map_err(engine_err)?;
        Ok(())
    }

    fn add_ink(&mut self, page: usize, stroke: &[PagePoint]) -> Result<()> {
        let mut page = self.load_pdf_page(page)?;
        let mut annot = page
            .create_annotation(PdfAnnotationType::Ink)
            .map_err(engine_err)?;

        let xs = stroke.iter().map(|p| p.x);
        let ys = stroke.iter().map(|p| p.y);
        let bbox = PageRect::new(
            xs.clone().fold(f32::INFINITY, f32::min),
            ys.clone().fold(f32::INFINITY, f32::min),
            xs.fold(f32::NEG_INFINITY, f32::max),
            ys.fold(f32::NEG_INFINITY, f32::max),
        );
        annot.set_rect(to_mupdf_rect(bbox)).map_err(engine_err)?;

        let mut path = self.doc.new_array().map_err(engine_err)?;
        for p in stroke {
            path.array_push(PdfObject::new_real(p.x).map_err(engine_err)?)
                .map_err(engine_err)?;
            path.array_push(PdfObject::new_real(p.y).map_err(engine_err)?)
                .map_err(engine_err)?;
        }
        let mut ink_list = self.doc.new_array().map_err(engine_err)?;
        ink_list.array_push(path).map_err(engine_err)?;
        last_annot_dict(&page)?
            .dict_put("InkList", ink_list)
            .map_err(engine_err)?;
        page.update().map_err(engine_err)?;
        Ok(())
    }

    fn add_note(&mut self, page: usize, at: PagePoint, text: &str) -> Result<()> {
        let mut page = self.load_pdf_page(page)?;
        let mut annot = page
            .create_annotation(PdfAnnotationType::Text)
            .map_err(engine_err)?;
        annot
            .set_rect(Rect::new(at.x, at.y, at.x + 20.0, at.y + 20.0))
            .map_err(engine_err)?;
        last_annot_dict(&page)?
            .dict_put("Contents", PdfObject::new_string(text).map_err(engine_err)?)
            .map_err(engine_err)?;
        page.update().map_err(engine_err)?;
        Ok(())
    }

    fn add_redaction(&mut self, page: usize, rect: PageRect) -> Result<()> {
        let mut page = self.load_pdf_page(page)?;
        let mut annot = page
            .create_annotation(PdfAnnotationType::Redact)
            .map_err(engine_err)?;
        annot.set_rect(to_mupdf_rect(rect)).map_err(engine_err)?;
        page.update().map_err(engine_err)?;
        Ok(())
    }

    fn apply_redactions(&mut self, page: usize) -> Result<()> {
        self.load_pdf_page(page)?.redact().map_err(engine_err)?;
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
        let mut page = self.load_pdf_page(page)?;
        let mut annot = page
            .create_annotation(PdfAnnotationType::FreeText)
            .map_err(engine_err)?;
        annot
            .set_rect(Rect::new(
                at.x,
                at.y,
                at.x + size * text.len() as f32,
                at.y + size * 1.4,
            ))
            .map_err(engine_err)?;
        let mut obj = last_annot_dict(&page)?;
        obj.dict_put("Contents", PdfObject::new_string(text).map_err(engine_err)?)
            .map_err(engine_err)?;
        let da = format!("/Helv {size} Tf 0.5 0.5 0.5 rg");
        obj.dict_put("DA", PdfObject::new_string(&da).map_err(engine_err)?)
            .map_err(engine_err)?;
        obj.dict_put("Rotate", PdfObject::new_int(rotate).map_err(engine_err)?)
            .map_err(engine_err)?;
        obj.dict_put("CA", PdfObject::new_real(opacity).map_err(engine_err)?)
            .map_err(engine_err)?;
        page.update().map_err(engine_err)?;
        Ok(())
    }

    fn insert_textbox(&mut self, page: usize, rect: PageRect, text: &str, size: f32) -> Result<()> {
        let mut page = self.load_pdf_page(page)?;
        let mut annot = page
            .create_annotation(PdfAnnotationType::FreeText)
            .map_err(engine_err)?;
        annot.set_rect(to_mupdf_rect(rect)).map_err(engine_err)?;
        let mut obj = last_annot_dict(&page)?;
        obj.dict_put("Contents", PdfObject::new_string(text).map_err(engine_err)?)
            .map_err(engine_err)?;
        let da = format!("/Helv {size} Tf 0 g");
        obj.dict_put("DA", PdfObject::new_string(&da).map_err(engine_err)?)
            .map_err(engine_err)?;
        // 1 = centered quadding.
        obj.dict_put("Q", PdfObject::new_int(1).map_err(engine_err)?)
            .map_err(engine_err)?;
        page.update().map_err(engine_err)?;
        Ok(())
    }

    fn save(&mut self, path: &Path, mode: SaveMode) -> Result<()> {
        let mut options = PdfWriteOptions::default();
        options.set_garbage_level(3);
        options.set_compress(true);
        if mode == SaveMode::Linearized {
            options.set_linear(true);
        }
        self.doc
            .save_with_options(&path_str(path), options)
            .map_err(engine_err)
    }
}
