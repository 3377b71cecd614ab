use std::cell::Cell;
use std::rc::Rc;

use dioxus::prelude::*;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;

use signet_shared::geometry;

/// Width the page layout falls back to before the window reports one.
const FALLBACK_VIEWPORT_WIDTH: f64 = 1280.0;

/// Current window inner width in CSS pixels.
pub fn viewport_width() -> f64 {
    web_sys::window()
        .and_then(|w| w.inner_width().ok())
        .and_then(|v| v.as_f64())
        .unwrap_or(FALLBACK_VIEWPORT_WIDTH)
}

pub fn is_mobile(viewport_width_px: f64, breakpoint_px: f64) -> bool {
    viewport_width_px < breakpoint_px
}

/// Window resize listener that detaches itself when dropped.
struct ResizeGuard {
    window: web_sys::EventTarget,
    closure: Closure<dyn FnMut()>,
}

impl ResizeGuard {
    fn install(on_resize: impl FnMut() + 'static) -> Option<Self> {
        let window = web_sys::window()?;
        let closure = Closure::<dyn FnMut()>::new(on_resize);
        let target: web_sys::EventTarget = window.into();
        target
            .add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref())
            .ok()?;
        Some(ResizeGuard {
            window: target,
            closure,
        })
    }
}

impl Drop for ResizeGuard {
    fn drop(&mut self) {
        let _ = self
            .window
            .remove_event_listener_with_callback("resize", self.closure.as_ref().unchecked_ref());
    }
}

/// Viewport width as a signal, refreshed on window resize. Updates are
/// coalesced through requestAnimationFrame so a resize storm produces one
/// write per frame.
pub fn use_viewport_width() -> Signal<f64> {
    let mut width = use_signal(viewport_width);
    use_hook(|| {
        let pending = Rc::new(Cell::new(false));
        let guard = ResizeGuard::install(move || {
            if pending.get() {
                return;
            }
            pending.set(true);
            let pending = pending.clone();
            let frame = Closure::once_into_js(move || {
                let mut width = width;
                pending.set(false);
                // The frame can land after the subscribing page unmounted
                if let Ok(mut current) = width.try_write() {
                    *current = viewport_width();
                };
            });
            if let Some(window) = web_sys::window() {
                let _ = window.request_animation_frame(frame.unchecked_ref());
            }
        });
        Rc::new(guard)
    });
    width
}

/// Page render width for the current viewport at a call site's breakpoint.
pub fn use_render_width(breakpoint_px: f64) -> Memo<f64> {
    let width = use_viewport_width();
    use_memo(move || {
        let vw = *width.read();
        geometry::compute_page_render_width(vw, is_mobile(vw, breakpoint_px))
    })
}

/// Device class for the current viewport at a call site's breakpoint.
pub fn use_is_mobile(breakpoint_px: f64) -> Memo<bool> {
    let width = use_viewport_width();
    use_memo(move || is_mobile(*width.read(), breakpoint_px))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_mobile_at_builder_breakpoint() {
        assert!(is_mobile(500.0, geometry::BUILDER_MOBILE_BREAKPOINT_PX));
        assert!(!is_mobile(768.0, geometry::BUILDER_MOBILE_BREAKPOINT_PX));
        assert!(!is_mobile(1200.0, geometry::BUILDER_MOBILE_BREAKPOINT_PX));
    }

    #[test]
    fn test_is_mobile_at_viewer_breakpoint() {
        // The signing viewer treats tablets as mobile
        assert!(is_mobile(900.0, geometry::VIEWER_MOBILE_BREAKPOINT_PX));
        assert!(!is_mobile(1024.0, geometry::VIEWER_MOBILE_BREAKPOINT_PX));
    }
}
