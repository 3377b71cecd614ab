use signet_shared::geometry::PixelPoint;

/// DOM id of a page's render surface. Overlay and canvas share the element,
/// so pointer events and drawn pixels agree on the same top-left origin.
pub fn page_surface_id(document_id: Option<i64>, page: u32) -> String {
    match document_id {
        Some(id) => format!("page-surface-{id}-{page}"),
        None => format!("page-surface-solo-{page}"),
    }
}

/// Pure conversion: client (viewport) coordinates to page-relative pixels.
/// Returns `None` while the surface has no measurable width (page still
/// loading or display:none), which callers treat as a silent no-op.
pub fn client_to_page_px(
    client_x: f64,
    client_y: f64,
    rect_left: f64,
    rect_top: f64,
    rect_width: f64,
) -> Option<PixelPoint> {
    if rect_width <= 0.0 {
        return None;
    }
    Some(PixelPoint {
        x: client_x - rect_left,
        y: client_y - rect_top,
    })
}

/// Bounding rect of an element by id.
pub fn element_rect(id: &str) -> Option<web_sys::DomRect> {
    let document = web_sys::window()?.document()?;
    let element = document.get_element_by_id(id)?;
    Some(element.get_bounding_client_rect())
}

/// Client coordinates to page-relative pixels for a live page surface.
pub fn click_to_page_px(client_x: f64, client_y: f64, surface_id: &str) -> Option<PixelPoint> {
    let rect = element_rect(surface_id)?;
    client_to_page_px(client_x, client_y, rect.left(), rect.top(), rect.width())
}
