//! First-page rasterisation via pdfium.
//!
//! pdfium keeps thread-local state and is CPU-bound, so rendering runs on the
//! blocking pool rather than a tokio worker thread.

use std::io::Cursor;
use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;
use image::{DynamicImage, ImageFormat};
use pdfium_render::prelude::*;
use tracing::{debug, info};

use crate::clients::{ClientError, FileBlob, Rasterizer, PNG_MEDIA_TYPE};

#[derive(Debug, Clone)]
pub struct PdfiumRasterizer {
    lib_dir: Option<PathBuf>,
    max_pixels: u32,
}

impl PdfiumRasterizer {
    pub fn new(lib_dir: Option<impl Into<PathBuf>>, max_pixels: u32) -> Self {
        Self {
            lib_dir: lib_dir.map(Into::into),
            max_pixels,
        }
    }
}

#[async_trait]
impl Rasterizer for PdfiumRasterizer {
    async fn rasterize(&self, document: &FileBlob) -> Result<Option<FileBlob>, ClientError> {
        let lib_dir = self.lib_dir.clone();
        let max_pixels = self.max_pixels;
        let data = document.data.clone();

        let rendered = tokio::task::spawn_blocking(move || {
            render_first_page(lib_dir.as_deref(), &data, max_pixels)
        })
        .await
        .map_err(|e| ClientError::Render(format!("render task panicked: {e}")))??;

        let Some(image) = rendered else {
            return Ok(None);
        };

        let png = encode_png(&image)?;
        info!(
            "Rasterised {} → {}x{} px ({} bytes)",
            document.name,
            image.width(),
            image.height(),
            png.len()
        );

        Ok(Some(FileBlob::new(
            image_name(&document.name),
            PNG_MEDIA_TYPE,
            png,
        )))
    }
}

fn bind_pdfium(lib_dir: Option<&std::path::Path>) -> Result<Pdfium, ClientError> {
    let bindings = match lib_dir {
        Some(dir) => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(dir))
            .or_else(|_| Pdfium::bind_to_system_library()),
        None => Pdfium::bind_to_system_library(),
    }
    .map_err(|e| ClientError::Render(format!("pdfium unavailable: {e:?}")))?;
    Ok(Pdfium::new(bindings))
}

/// Renders page 1, capping both edges at `max_pixels`. `None` for a page-less document.
fn render_first_page(
    lib_dir: Option<&std::path::Path>,
    data: &[u8],
    max_pixels: u32,
) -> Result<Option<DynamicImage>, ClientError> {
    let pdfium = bind_pdfium(lib_dir)?;
    let document = pdfium
        .load_pdf_from_byte_slice(data, None)
        .map_err(|e| ClientError::Render(format!("cannot open PDF: {e:?}")))?;

    let pages = document.pages();
    if pages.len() == 0 {
        debug!("PDF has no pages; nothing to render");
        return Ok(None);
    }

    let page = pages
        .get(0)
        .map_err(|e| ClientError::Render(format!("cannot load page 1: {e:?}")))?;

    let render_config = PdfRenderConfig::new()
        .set_target_width(max_pixels as i32)
        .set_maximum_height(max_pixels as i32);

    let bitmap = page
        .render_with_config(&render_config)
        .map_err(|e| ClientError::Render(format!("cannot render page 1: {e:?}")))?;

    Ok(Some(bitmap.as_image()))
}

fn encode_png(image: &DynamicImage) -> Result<Bytes, ClientError> {
    let mut buf = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .map_err(|e| ClientError::Render(format!("PNG encoding failed: {e}")))?;
    Ok(Bytes::from(buf))
}

/// `resume.pdf` → `resume.png`; names without a `.pdf` suffix get `.png` appended.
fn image_name(document_name: &str) -> String {
    let lower = document_name.to_ascii_lowercase();
    match lower.strip_suffix(".pdf") {
        Some(_) => format!("{}.png", &document_name[..document_name.len() - 4]),
        None => format!("{document_name}.png"),
    }
}
