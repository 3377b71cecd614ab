//! Bridge to the page-supplied `window.pdfSurface` renderer.
//!
//! The host page loads pdf.js and exposes a two-function surface; this module
//! owns the Rust side of that contract plus the bookkeeping around it: blob
//! URLs for locally selected files and the per-document record of natural
//! page sizes reported back by the renderer.

use std::collections::HashMap;

use signet_shared::geometry::RenderContext;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Blob, BlobPropertyBag, HtmlAnchorElement, Url};

#[wasm_bindgen]
extern "C" {
    /// `pdfSurface.openDocument(url)` resolves with the page count.
    #[wasm_bindgen(catch, js_namespace = pdfSurface, js_name = openDocument)]
    async fn surface_open_document(url: &str) -> Result<JsValue, JsValue>;

    /// `pdfSurface.renderPage(url, page, canvasId, renderWidth)` paints the
    /// 1-based page into the canvas and resolves with `[widthPts, heightPts]`,
    /// the page's natural size in PDF points.
    #[wasm_bindgen(catch, js_namespace = pdfSurface, js_name = renderPage)]
    async fn surface_render_page(
        url: &str,
        page: u32,
        canvas_id: &str,
        render_width: f64,
    ) -> Result<JsValue, JsValue>;
}

fn js_error(context: &str, err: JsValue) -> String {
    match err.as_string() {
        Some(message) => format!("{context}: {message}"),
        None => format!("{context}: {err:?}"),
    }
}

pub async fn open_document(url: &str) -> Result<u32, String> {
    let value = surface_open_document(url)
        .await
        .map_err(|e| js_error("failed to open document", e))?;
    value
        .as_f64()
        .map(|count| count as u32)
        .ok_or_else(|| "pdf surface returned a non-numeric page count".to_string())
}

pub async fn render_page(
    url: &str,
    page: u32,
    canvas_id: &str,
    render_width: f64,
) -> Result<PageDims, String> {
    let value = surface_render_page(url, page, canvas_id, render_width)
        .await
        .map_err(|e| js_error(&format!("failed to render page {page}"), e))?;
    let pair = js_sys::Array::from(&value);
    let width_points = pair.get(0).as_f64().unwrap_or(0.0);
    let height_points = pair.get(1).as_f64().unwrap_or(0.0);
    if width_points <= 0.0 || height_points <= 0.0 {
        return Err(format!("pdf surface reported no size for page {page}"));
    }
    Ok(PageDims {
        width_points,
        height_points,
    })
}

// ---------------------------------------------------------------------------

/// A `blob:` URL for a locally selected file, revoked when dropped.
#[derive(Debug)]
pub struct ObjectUrl {
    url: String,
}

impl ObjectUrl {
    pub fn from_blob(blob: &Blob) -> Option<Self> {
        let url = Url::create_object_url_with_blob(blob).ok()?;
        Some(Self { url })
    }

    pub fn from_bytes(bytes: &[u8], mime: &str) -> Option<Self> {
        let parts = js_sys::Array::new();
        parts.push(&js_sys::Uint8Array::from(bytes));
        let options = BlobPropertyBag::new();
        options.set_type(mime);
        let blob = Blob::new_with_u8_array_sequence_and_options(&parts, &options).ok()?;
        Self::from_blob(&blob)
    }

    pub fn as_str(&self) -> &str {
        &self.url
    }
}

impl Drop for ObjectUrl {
    fn drop(&mut self) {
        let _ = Url::revoke_object_url(&self.url);
    }
}

/// Click a synthetic anchor so the browser saves `url` under `file_name`.
pub fn trigger_download(url: &str, file_name: &str) {
    let Some(document) = web_sys::window().and_then(|w| w.document()) else {
        return;
    };
    let Ok(element) = document.create_element("a") else {
        return;
    };
    let Ok(anchor) = element.dyn_into::<HtmlAnchorElement>() else {
        return;
    };
    anchor.set_href(url);
    anchor.set_download(file_name);
    anchor.click();
}

// ---------------------------------------------------------------------------

/// Natural size of one page in PDF points, as reported by the renderer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageDims {
    pub width_points: f64,
    pub height_points: f64,
}

/// What we know about an open document: its page count and the natural
/// dimensions of every page rendered so far. Pages report their size the
/// first time they render; until then conversions for that page are not
/// meaningful and interaction stays disabled.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentPages {
    page_count: u32,
    dims: HashMap<u32, PageDims>,
}

impl DocumentPages {
    pub fn opened(page_count: u32) -> Self {
        Self {
            page_count,
            dims: HashMap::new(),
        }
    }

    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    pub fn record(&mut self, page: u32, dims: PageDims) {
        self.dims.insert(page, dims);
    }

    /// Whether a reported measurement differs from what is already stored.
    /// Repaints at an unchanged width report the same dimensions; skipping
    /// the store write keeps them from invalidating render state.
    pub fn needs_record(&self, page: u32, dims: PageDims) -> bool {
        self.dims.get(&page) != Some(&dims)
    }

    pub fn dims(&self, page: u32) -> Option<PageDims> {
        self.dims.get(&page).copied()
    }

    pub fn is_measured(&self, page: u32) -> bool {
        self.dims.contains_key(&page)
    }

    /// Conversion context for one page. Unmeasured pages yield zero natural
    /// dimensions, which the geometry layer scales against a unit width.
    pub fn render_context(&self, page: u32, render_width_px: f64) -> RenderContext {
        let dims = self.dims.get(&page).copied().unwrap_or(PageDims {
            width_points: 0.0,
            height_points: 0.0,
        });
        RenderContext {
            page_width_points: dims.width_points,
            page_height_points: dims.height_points,
            render_width_px,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_lookup_dims() {
        let mut pages = DocumentPages::opened(3);
        assert_eq!(pages.page_count(), 3);
        assert!(!pages.is_measured(1));

        pages.record(
            1,
            PageDims {
                width_points: 612.0,
                height_points: 792.0,
            },
        );
        assert!(pages.is_measured(1));
        assert_eq!(
            pages.dims(1),
            Some(PageDims {
                width_points: 612.0,
                height_points: 792.0,
            })
        );
        assert!(!pages.is_measured(2));
    }

    #[test]
    fn test_render_context_uses_recorded_dims() {
        let mut pages = DocumentPages::opened(1);
        pages.record(
            1,
            PageDims {
                width_points: 612.0,
                height_points: 792.0,
            },
        );
        let ctx = pages.render_context(1, 600.0);
        assert!((ctx.scale_factor() - 600.0 / 612.0).abs() < 1e-9);
        assert!((ctx.render_height_px() - 792.0 * (600.0 / 612.0)).abs() < 1e-9);
    }

    #[test]
    fn test_unmeasured_page_scales_against_unit_width() {
        let pages = DocumentPages::opened(2);
        let ctx = pages.render_context(2, 600.0);
        assert_eq!(ctx.page_width_points, 0.0);
        assert!((ctx.scale_factor() - 600.0).abs() < 1e-9);
    }

    #[test]
    fn test_needs_record_only_for_changed_dims() {
        let mut pages = DocumentPages::opened(2);
        let letter = PageDims {
            width_points: 612.0,
            height_points: 792.0,
        };
        assert!(pages.needs_record(1, letter));

        pages.record(1, letter);
        // A repaint reporting the same size has nothing new to store
        assert!(!pages.needs_record(1, letter));
        assert!(pages.needs_record(
            1,
            PageDims {
                width_points: 595.0,
                height_points: 842.0,
            }
        ));
        assert!(pages.needs_record(2, letter));
    }

    #[test]
    fn test_fresh_store_replaces_stale_measurements() {
        let mut pages = DocumentPages::opened(5);
        pages.record(
            4,
            PageDims {
                width_points: 595.0,
                height_points: 842.0,
            },
        );
        // Swapping documents starts from a new store
        pages = DocumentPages::opened(2);
        assert_eq!(pages.page_count(), 2);
        assert!(!pages.is_measured(4));
    }
}
