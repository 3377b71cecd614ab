use std::rc::Rc;

use dioxus::prelude::*;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;

use signet_shared::fields::{FieldId, PositionPatch};
use signet_shared::geometry::{
    self, NormalizedPosition, MIN_FIELD_HEIGHT_PX, MIN_FIELD_WIDTH_PX,
};

/// Drag threshold in pixels — movement below this is treated as a click.
/// Compared in normalized units, so the pixel threshold holds at any scale.
const DRAG_THRESHOLD: f64 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureMode {
    Dragging,
    Resizing,
}

/// One in-progress drag or resize. Created on pointer-down, fed every
/// pointer-move, dropped on pointer-up. Idle is the absence of a session.
#[derive(Debug, Clone, Copy)]
pub struct GestureSession {
    pub field_id: FieldId,
    mode: GestureMode,
    anchor_pointer_x: f64,
    anchor_pointer_y: f64,
    anchor: NormalizedPosition,
    scale_factor: f64,
    moved_beyond_threshold: bool,
}

impl GestureSession {
    pub fn begin_drag(
        field_id: FieldId,
        pointer: (f64, f64),
        position: NormalizedPosition,
        scale_factor: f64,
    ) -> Self {
        GestureSession {
            field_id,
            mode: GestureMode::Dragging,
            anchor_pointer_x: pointer.0,
            anchor_pointer_y: pointer.1,
            anchor: position,
            scale_factor,
            moved_beyond_threshold: false,
        }
    }

    pub fn begin_resize(
        field_id: FieldId,
        pointer: (f64, f64),
        position: NormalizedPosition,
        scale_factor: f64,
    ) -> Self {
        GestureSession {
            mode: GestureMode::Resizing,
            ..Self::begin_drag(field_id, pointer, position, scale_factor)
        }
    }

    pub fn mode(&self) -> GestureMode {
        self.mode
    }

    pub fn moved_beyond_threshold(&self) -> bool {
        self.moved_beyond_threshold
    }

    /// Whether the finished gesture counts as a plain click/tap.
    pub fn is_click(&self) -> bool {
        !self.moved_beyond_threshold
    }

    /// Advance the gesture to a new client pointer position and produce the
    /// patch for the owning field. Drags clamp the origin non-negative;
    /// resizes floor the extent at the 50x20 px minimum.
    pub fn pointer_move(&mut self, pointer: (f64, f64)) -> PositionPatch {
        let dx = (pointer.0 - self.anchor_pointer_x) / self.scale_factor;
        let dy = (pointer.1 - self.anchor_pointer_y) / self.scale_factor;

        let threshold = DRAG_THRESHOLD / self.scale_factor;
        if dx.abs() > threshold || dy.abs() > threshold {
            self.moved_beyond_threshold = true;
        }

        match self.mode {
            GestureMode::Dragging => PositionPatch::move_to(
                (self.anchor.x + dx).max(0.0),
                (self.anchor.y + dy).max(0.0),
            ),
            GestureMode::Resizing => PositionPatch::resize_to(
                (self.anchor.width + dx).max(MIN_FIELD_WIDTH_PX / self.scale_factor),
                (self.anchor.height + dy).max(MIN_FIELD_HEIGHT_PX / self.scale_factor),
            ),
        }
    }
}

/// Round-robin cursor over the tap-to-place anchors (mobile signing viewer).
#[derive(Debug, Clone, Copy, Default)]
pub struct TapCycle {
    next_index: usize,
}

impl TapCycle {
    /// Move a field to the next anchor and advance the cursor.
    pub fn advance(&mut self, page_width_points: f64, page_height_points: f64) -> PositionPatch {
        let (x, y) =
            geometry::tap_anchor_position(self.next_index, page_width_points, page_height_points);
        self.next_index = (self.next_index + 1) % geometry::TAP_ANCHORS.len();
        PositionPatch::move_to(x, y)
    }
}

// ---------------------------------------------------------------------------
// Scoped global listeners
// ---------------------------------------------------------------------------

/// Document-scope move/up listeners for one gesture.
///
/// Installed on gesture entry, removed when the guard drops — whether the
/// gesture ends on pointer-up or the owning component unmounts mid-drag.
/// Touch handlers read only the first touch point and prevent scrolling
/// while a gesture is live.
pub struct PointerCapture {
    target: web_sys::EventTarget,
    mouse_move: Closure<dyn FnMut(web_sys::MouseEvent)>,
    mouse_up: Closure<dyn FnMut(web_sys::MouseEvent)>,
    touch_move: Closure<dyn FnMut(web_sys::TouchEvent)>,
    touch_end: Closure<dyn FnMut(web_sys::TouchEvent)>,
    touch_cancel: Closure<dyn FnMut(web_sys::TouchEvent)>,
}

impl PointerCapture {
    pub fn install(
        on_move: impl Fn(f64, f64) + 'static,
        on_up: impl Fn() + 'static,
    ) -> Option<Self> {
        let document = web_sys::window()?.document()?;
        let target: web_sys::EventTarget = document.into();

        let on_move = Rc::new(on_move);
        let on_up = Rc::new(on_up);

        let mouse_move = {
            let on_move = on_move.clone();
            Closure::<dyn FnMut(web_sys::MouseEvent)>::new(move |evt: web_sys::MouseEvent| {
                on_move(evt.client_x() as f64, evt.client_y() as f64);
            })
        };
        let mouse_up = {
            let on_up = on_up.clone();
            Closure::<dyn FnMut(web_sys::MouseEvent)>::new(move |_: web_sys::MouseEvent| {
                on_up();
            })
        };
        let touch_move = Closure::<dyn FnMut(web_sys::TouchEvent)>::new(
            move |evt: web_sys::TouchEvent| {
                if let Some(touch) = evt.touches().get(0) {
                    evt.prevent_default();
                    on_move(touch.client_x() as f64, touch.client_y() as f64);
                }
            },
        );
        let touch_end = {
            let on_up = on_up.clone();
            Closure::<dyn FnMut(web_sys::TouchEvent)>::new(move |evt: web_sys::TouchEvent| {
                if evt.touches().length() == 0 {
                    on_up();
                }
            })
        };
        let touch_cancel = Closure::<dyn FnMut(web_sys::TouchEvent)>::new(
            move |_: web_sys::TouchEvent| {
                on_up();
            },
        );

        target
            .add_event_listener_with_callback("mousemove", mouse_move.as_ref().unchecked_ref())
            .ok()?;
        target
            .add_event_listener_with_callback("mouseup", mouse_up.as_ref().unchecked_ref())
            .ok()?;
        // passive:false so touchmove may prevent the page from scrolling
        let options = web_sys::AddEventListenerOptions::new();
        options.set_passive(false);
        target
            .add_event_listener_with_callback_and_add_event_listener_options(
                "touchmove",
                touch_move.as_ref().unchecked_ref(),
                &options,
            )
            .ok()?;
        target
            .add_event_listener_with_callback("touchend", touch_end.as_ref().unchecked_ref())
            .ok()?;
        target
            .add_event_listener_with_callback("touchcancel", touch_cancel.as_ref().unchecked_ref())
            .ok()?;

        Some(PointerCapture {
            target,
            mouse_move,
            mouse_up,
            touch_move,
            touch_end,
            touch_cancel,
        })
    }
}

impl Drop for PointerCapture {
    fn drop(&mut self) {
        let _ = self
            .target
            .remove_event_listener_with_callback("mousemove", self.mouse_move.as_ref().unchecked_ref());
        let _ = self
            .target
            .remove_event_listener_with_callback("mouseup", self.mouse_up.as_ref().unchecked_ref());
        let _ = self
            .target
            .remove_event_listener_with_callback("touchmove", self.touch_move.as_ref().unchecked_ref());
        let _ = self
            .target
            .remove_event_listener_with_callback("touchend", self.touch_end.as_ref().unchecked_ref());
        let _ = self.target.remove_event_listener_with_callback(
            "touchcancel",
            self.touch_cancel.as_ref().unchecked_ref(),
        );
    }
}

/// Clear a capture slot from inside one of its own listeners. The drop is
/// deferred a microtask because wasm-bindgen aborts if a closure is
/// destroyed while it executes.
pub fn release_capture(mut slot: Signal<Option<PointerCapture>>) {
    wasm_bindgen_futures::spawn_local(async move {
        slot.set(None);
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use signet_shared::fields::FieldId;

    fn position() -> NormalizedPosition {
        NormalizedPosition {
            x: 100.0,
            y: 150.0,
            width: 160.0,
            height: 50.0,
        }
    }

    #[test]
    fn test_small_movement_is_a_click() {
        let mut session =
            GestureSession::begin_drag(FieldId::Local(1), (10.0, 10.0), position(), 1.0);
        session.pointer_move((12.0, 13.0));
        session.pointer_move((11.0, 12.0));
        assert!(session.is_click());
        assert!(!session.moved_beyond_threshold());
    }

    #[test]
    fn test_threshold_is_exclusive_at_three_pixels() {
        let mut session =
            GestureSession::begin_drag(FieldId::Local(1), (10.0, 10.0), position(), 1.0);
        session.pointer_move((13.0, 10.0));
        assert!(session.is_click());
        session.pointer_move((13.1, 10.0));
        assert!(!session.is_click());
    }

    #[test]
    fn test_large_movement_suppresses_click() {
        let mut session =
            GestureSession::begin_drag(FieldId::Local(1), (10.0, 10.0), position(), 1.0);
        session.pointer_move((20.0, 10.0));
        assert!(session.moved_beyond_threshold());
        // The flag is sticky: moving back near the anchor stays a drag
        session.pointer_move((10.5, 10.0));
        assert!(!session.is_click());
    }

    #[test]
    fn test_threshold_scales_with_factor() {
        // At scale 2, a 5px movement is 2.5 normalized units against a
        // 1.5-unit threshold: still a drag.
        let mut session =
            GestureSession::begin_drag(FieldId::Local(1), (10.0, 10.0), position(), 2.0);
        session.pointer_move((15.0, 10.0));
        assert!(session.moved_beyond_threshold());

        // 2px of pointer travel stays below the pixel threshold at any scale
        let mut session =
            GestureSession::begin_drag(FieldId::Local(1), (10.0, 10.0), position(), 2.0);
        session.pointer_move((12.0, 10.0));
        assert!(session.is_click());
    }

    #[test]
    fn test_drag_moves_origin_and_preserves_extent() {
        let mut session =
            GestureSession::begin_drag(FieldId::Local(1), (10.0, 10.0), position(), 0.5);
        let patch = session.pointer_move((30.0, 25.0));
        // 20px right / 15px down at scale 0.5 = 40 / 30 normalized units
        assert!((patch.x.unwrap() - 140.0).abs() < 1e-9);
        assert!((patch.y.unwrap() - 180.0).abs() < 1e-9);
        assert!(patch.width.is_none());
        assert!(patch.height.is_none());
    }

    #[test]
    fn test_drag_clamps_non_negative() {
        let mut session =
            GestureSession::begin_drag(FieldId::Local(1), (500.0, 500.0), position(), 1.0);
        let patch = session.pointer_move((-2000.0, -2000.0));
        assert!((patch.x.unwrap() - 0.0).abs() < 1e-9);
        assert!((patch.y.unwrap() - 0.0).abs() < 1e-9);
    }

    #[test]
    fn test_resize_grows_extent_and_preserves_origin() {
        let mut session =
            GestureSession::begin_resize(FieldId::Local(1), (10.0, 10.0), position(), 1.0);
        let patch = session.pointer_move((50.0, 40.0));
        assert!((patch.width.unwrap() - 200.0).abs() < 1e-9);
        assert!((patch.height.unwrap() - 80.0).abs() < 1e-9);
        assert!(patch.x.is_none());
        assert!(patch.y.is_none());
    }

    #[test]
    fn test_resize_floors_at_min_pixel_extent() {
        // Shrinking hard at a range of factors never crosses 50x20 px
        for scale in [0.1, 0.5, 1.0, 2.0, 5.0] {
            let mut session =
                GestureSession::begin_resize(FieldId::Local(1), (10.0, 10.0), position(), scale);
            let patch = session.pointer_move((-5000.0, -5000.0));
            assert!(patch.width.unwrap() * scale >= MIN_FIELD_WIDTH_PX - 1e-9);
            assert!(patch.height.unwrap() * scale >= MIN_FIELD_HEIGHT_PX - 1e-9);
        }
    }

    #[test]
    fn test_tap_cycle_round_robin() {
        let mut cycle = TapCycle::default();
        let first = cycle.advance(612.0, 792.0);
        assert!((first.x.unwrap() - 61.2).abs() < 1e-9);
        assert!((first.y.unwrap() - 79.2).abs() < 1e-9);
        let second = cycle.advance(612.0, 792.0);
        assert!((second.x.unwrap() - 428.4).abs() < 1e-9);
        let third = cycle.advance(612.0, 792.0);
        assert!((third.y.unwrap() - 554.4).abs() < 1e-9);
        let fourth = cycle.advance(612.0, 792.0);
        assert!((fourth.x.unwrap() - 428.4).abs() < 1e-9);
        // Fifth tap wraps to the first anchor
        let fifth = cycle.advance(612.0, 792.0);
        assert!((fifth.x.unwrap() - first.x.unwrap()).abs() < 1e-9);
        assert!((fifth.y.unwrap() - first.y.unwrap()).abs() < 1e-9);
    }
}
