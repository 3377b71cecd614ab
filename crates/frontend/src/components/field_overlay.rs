use dioxus::html::input_data::MouseButton;
use dioxus::prelude::*;

use signet_shared::fields::{FieldType, SignatureField};
use signet_shared::geometry::PixelRect;

/// One placed field, absolutely positioned over its page surface.
///
/// The root area starts a drag; the resize handle starts a resize. Every
/// other sub-control (delete, open, the handle itself) stops propagation on
/// pointer-down, so pressing one never begins a gesture on the root — the
/// opt-out is carried by the element, not by inspecting class names.
#[component]
#[allow(clippy::too_many_arguments)]
pub fn FieldOverlay(
    field: SignatureField,
    rect: PixelRect,
    draggable: bool,
    show_resize: bool,
    show_delete: bool,
    show_open: bool,
    on_press: EventHandler<(f64, f64)>,
    on_resize_press: EventHandler<(f64, f64)>,
    on_open: EventHandler<()>,
    on_delete: EventHandler<()>,
) -> Element {
    let style = format!(
        "left:{:.1}px;top:{:.1}px;width:{:.1}px;height:{:.1}px;",
        rect.x, rect.y, rect.width, rect.height
    );

    let mut class = String::from("field-box");
    match field.field_type {
        FieldType::Signature => class.push_str(" field-signature"),
        FieldType::Initial => class.push_str(" field-initial"),
        FieldType::Date => class.push_str(" field-date"),
        FieldType::Text => class.push_str(" field-text"),
        FieldType::Checkbox => class.push_str(" field-checkbox"),
    }
    if field.signed {
        class.push_str(" field-signed");
    }
    if !field.editable {
        class.push_str(" field-locked");
    }
    if draggable {
        class.push_str(" field-draggable");
    }

    rsx! {
        div {
            class: "{class}",
            style: "{style}",

            onmousedown: move |evt: Event<MouseData>| {
                if !draggable {
                    return;
                }
                if evt.trigger_button() != Some(MouseButton::Primary) {
                    return;
                }
                evt.prevent_default();
                evt.stop_propagation();
                let client = evt.client_coordinates();
                on_press.call((client.x, client.y));
            },
            ontouchstart: move |evt: Event<TouchData>| {
                if !draggable {
                    return;
                }
                // First touch only; extra fingers are ignored
                let touches = evt.data().touches();
                if touches.len() != 1 {
                    return;
                }
                evt.stop_propagation();
                let c = touches[0].client_coordinates();
                on_press.call((c.x, c.y));
            },
            // A click that survives the drag threshold is handled by the
            // gesture exit, not here; swallowing it keeps the page-level
            // placement handler from seeing field clicks.
            onclick: move |evt: Event<MouseData>| {
                evt.stop_propagation();
            },

            if field.signed {
                if let Some(image) = &field.signature_data {
                    img { class: "field-image", src: "{image}", draggable: "false" }
                } else {
                    span { class: "field-label", "{field.name}" }
                }
            } else {
                span { class: "field-label", "{field.name}" }
            }

            if show_open {
                button {
                    class: "field-open",
                    onmousedown: move |evt: Event<MouseData>| evt.stop_propagation(),
                    ontouchstart: move |evt: Event<TouchData>| evt.stop_propagation(),
                    onclick: move |evt: Event<MouseData>| {
                        evt.stop_propagation();
                        on_open.call(());
                    },
                    if field.signed { "Edit" } else { "Sign" }
                }
            }

            if show_delete {
                button {
                    class: "field-delete",
                    onmousedown: move |evt: Event<MouseData>| evt.stop_propagation(),
                    ontouchstart: move |evt: Event<TouchData>| evt.stop_propagation(),
                    onclick: move |evt: Event<MouseData>| {
                        evt.stop_propagation();
                        on_delete.call(());
                    },
                    "\u{00d7}"
                }
            }

            if show_resize {
                div {
                    class: "field-resize",
                    onmousedown: move |evt: Event<MouseData>| {
                        if evt.trigger_button() != Some(MouseButton::Primary) {
                            return;
                        }
                        evt.prevent_default();
                        evt.stop_propagation();
                        let client = evt.client_coordinates();
                        on_resize_press.call((client.x, client.y));
                    },
                    ontouchstart: move |evt: Event<TouchData>| {
                        let touches = evt.data().touches();
                        if touches.len() != 1 {
                            return;
                        }
                        evt.stop_propagation();
                        let c = touches[0].client_coordinates();
                        on_resize_press.call((c.x, c.y));
                    },
                }
            }
        }
    }
}
