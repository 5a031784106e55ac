//! Pdf page rasterization.
//!
//! Rendering is behind [`PageRasterizer`] so the loader can be driven without
//! the native pdfium library (tests, headless deployments with a stub).

use std::io::Cursor;
use std::path::Path;

use anyhow::{Context, Result};
use bytes::Bytes;
use image::{DynamicImage, ImageFormat};
use pdfium_render::prelude::*;
use tracing::debug;

use crate::pdf::PageImage;

/// Renders every page of a pdf file, in page order.
pub trait PageRasterizer: Send + Sync {
    fn rasterize(&self, path: &Path) -> Result<Vec<PageImage>>;
}

/// Rasterizer backed by the pdfium shared library.
pub struct PdfiumRasterizer {
    /// Directory holding the pdfium library; system lookup when unset.
    library_dir: Option<String>,
    target_width: i32,
}

impl PdfiumRasterizer {
    pub fn new(library_dir: Option<String>, target_width: u32) -> Self {
        Self {
            library_dir,
            target_width: target_width as i32,
        }
    }

    /// Fails when the pdfium library cannot be loaded.
    pub fn check_library(&self) -> Result<()> {
        self.bind().map(|_| ())
    }

    fn bind(&self) -> Result<Pdfium> {
        let bindings = match &self.library_dir {
            Some(dir) => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(
                dir.as_str(),
            )),
            None => Pdfium::bind_to_system_library(),
        }
        .map_err(|e| anyhow::anyhow!("pdfium library unavailable: {e}"))?;
        Ok(Pdfium::new(bindings))
    }
}

impl PageRasterizer for PdfiumRasterizer {
    fn rasterize(&self, path: &Path) -> Result<Vec<PageImage>> {
        let pdfium = self.bind()?;
        let document = pdfium
            .load_pdf_from_file(path, None)
            .map_err(|e| anyhow::anyhow!("pdfium could not open document: {e}"))?;

        let config = PdfRenderConfig::new().set_target_width(self.target_width);
        let mut pages = Vec::new();
        for (index, page) in document.pages().iter().enumerate() {
            let image = page
                .render_with_config(&config)
                .map_err(|e| anyhow::anyhow!("failed to render page {}: {e}", index + 1))?
                .as_image();
            pages.push(encode_png(index + 1, &image)?);
        }
        debug!(pages = pages.len(), "Rendered pdf pages");
        Ok(pages)
    }
}

/// PNG-encode a rendered page.
pub fn encode_png(page_number: usize, image: &DynamicImage) -> Result<PageImage> {
    let mut buf = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .with_context(|| format!("failed to encode page {page_number} as png"))?;
    Ok(PageImage {
        page_number,
        width: image.width(),
        height: image.height(),
        png: Bytes::from(buf),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_png_with_dimensions() {
        let page = encode_png(2, &DynamicImage::new_rgb8(4, 5)).unwrap();
        assert_eq!(page.page_number, 2);
        assert_eq!((page.width, page.height), (4, 5));
        assert_eq!(&page.png[1..4], b"PNG");
    }
}
