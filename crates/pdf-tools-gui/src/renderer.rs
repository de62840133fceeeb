//! Page rasterization backends for thumbnails and previews

use pdf_merge::{MergeError, PageRenderer, RenderedPage};
use std::sync::Arc;

#[cfg(feature = "pdf-viewer")]
use image::RgbaImage;
#[cfg(feature = "pdf-viewer")]
use pdf_merge::target_size;
#[cfg(feature = "pdf-viewer")]
use pdfium_render::prelude::*;

/// Initialize Pdfium, trying the vendored library first, then falling back to system
#[cfg(feature = "pdf-viewer")]
pub fn init_pdfium() -> Result<Pdfium, PdfiumError> {
    // When running from cargo, the working directory is the workspace root
    let vendor_path = std::env::current_dir().ok().and_then(|mut p| {
        p.push("vendor/pdfium/lib");
        if p.exists() { Some(p) } else { None }
    });

    if let Some(vendor_path) = vendor_path
        && let Ok(binding) =
            Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(&vendor_path))
    {
        return Ok(Pdfium::new(binding));
    }

    Pdfium::bind_to_system_library().map(Pdfium::new)
}

#[cfg(feature = "pdf-viewer")]
fn render_error(e: PdfiumError) -> MergeError {
    MergeError::Render(e.to_string())
}

/// Renders pages with pdfium.
///
/// Pdfium is bound per call from the blocking thread that does the work, so the
/// renderer itself holds no library state.
#[cfg(feature = "pdf-viewer")]
pub struct PdfiumRenderer;

#[cfg(feature = "pdf-viewer")]
impl PageRenderer for PdfiumRenderer {
    fn render_page(
        &self,
        bytes: &[u8],
        page_index: usize,
        target_width: u32,
    ) -> pdf_merge::Result<RenderedPage> {
        let pdfium = init_pdfium().map_err(render_error)?;
        let document = pdfium
            .load_pdf_from_byte_slice(bytes, None)
            .map_err(render_error)?;
        let pages = document.pages();
        let page_count = pages.len() as usize;
        if page_index >= page_count {
            return Err(MergeError::Render(format!(
                "Page {} out of range ({} pages)",
                page_index + 1,
                page_count
            )));
        }

        let page = pages.get(page_index as u16).map_err(render_error)?;
        let (width, height) = target_size(page.width().value, page.height().value, target_width);
        let config = PdfRenderConfig::new()
            .set_target_width(width as i32)
            .set_target_height(height as i32);

        let bitmap = page.render_with_config(&config).map_err(render_error)?;
        let (width, height) = (bitmap.width() as u32, bitmap.height() as u32);
        let image = RgbaImage::from_raw(width, height, bitmap.as_rgba_bytes().to_vec())
            .ok_or_else(|| MergeError::Render("Bitmap size mismatch".to_string()))?;

        Ok(RenderedPage {
            image,
            page_index,
            page_count,
        })
    }
}

/// Stand-in used when no rendering library is available; every render fails
/// so items show an inline error instead of a thumbnail
pub struct UnavailableRenderer {
    reason: String,
}

impl UnavailableRenderer {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl PageRenderer for UnavailableRenderer {
    fn render_page(&self, _: &[u8], _: usize, _: u32) -> pdf_merge::Result<RenderedPage> {
        Err(MergeError::Render(self.reason.clone()))
    }
}

/// Pick the best renderer for this build and machine
pub fn create_renderer() -> Arc<dyn PageRenderer> {
    #[cfg(feature = "pdf-viewer")]
    {
        match init_pdfium() {
            Ok(_) => Arc::new(PdfiumRenderer),
            Err(e) => {
                log::warn!("Pdfium unavailable, previews disabled: {e}");
                Arc::new(UnavailableRenderer::new(format!("Pdfium unavailable: {e}")))
            }
        }
    }

    #[cfg(not(feature = "pdf-viewer"))]
    {
        Arc::new(UnavailableRenderer::new(
            "Page rendering not available (pdf-viewer feature disabled)",
        ))
    }
}
