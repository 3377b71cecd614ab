use std::collections::HashMap;

use dioxus::prelude::*;
use gloo_timers::future::TimeoutFuture;
use tracing::warn;

use signet_shared::fields::{FieldId, PlacementError};
use signet_shared::geometry;
use signet_shared::models::Recipient;
use signet_shared::registry::FieldRegistry;

use crate::components::field_overlay::FieldOverlay;
use crate::coords;
use crate::gesture::{release_capture, GestureSession, PointerCapture, TapCycle};
use crate::notify::{push_transient, NoticeLevel, NoticeQueue};
use crate::pdf::{self, DocumentPages};
use crate::placement::PlacementSession;

/// The shared document viewer: every call site (builder, signing viewer,
/// self-sign and bulk-sign wizards) renders its pages through this one
/// component, so the page surface and the field overlay always agree on the
/// same render width and origin.
///
/// Callers `key` this component by document, so swapping documents rebuilds
/// it from scratch with a fresh page store.
#[component]
#[allow(clippy::too_many_arguments)]
pub fn PageView(
    doc_url: String,
    document_id: Option<i64>,
    render_width: ReadSignal<f64>,
    registry: Signal<FieldRegistry>,
    placement: Signal<PlacementSession>,
    notices: Signal<NoticeQueue>,
    recipients: Vec<Recipient>,
    new_fields_editable: bool,
    /// Builder-style interaction: drag, resize, delete.
    interactive: bool,
    /// Signing-style interaction: open the capture modal on editable fields.
    can_fill: bool,
    /// Mobile signing viewer: a tap cycles the field through the anchor
    /// positions instead of opening the modal.
    tap_to_place: bool,
    on_placed: EventHandler<FieldId>,
    on_open_field: EventHandler<FieldId>,
    on_delete_field: EventHandler<FieldId>,
) -> Element {
    let mut pages = use_signal(DocumentPages::default);
    let gesture = use_signal(|| None::<GestureSession>);
    let capture = use_signal(|| None::<PointerCapture>);
    let tap_cycles = use_signal(HashMap::<FieldId, TapCycle>::new);

    // Ask the render surface for the page count once per document.
    let open_url = doc_url.clone();
    let _opener = use_resource(move || {
        let url = open_url.clone();
        async move {
            match pdf::open_document(&url).await {
                Ok(count) => pages.set(DocumentPages::opened(count)),
                Err(err) => {
                    warn!("open failed for {url}: {err}");
                    push_transient(notices, NoticeLevel::Error, err);
                }
            }
        }
    });

    // Paint every page at the current width; repaints when the responsive
    // width changes. Natural page dimensions land in the page store the
    // first time each page renders. The count goes through a memo so that
    // recording dimensions below does not restart this resource.
    let page_count = use_memo(move || pages.read().page_count());
    let render_url = doc_url.clone();
    let _renderer = use_resource(move || {
        let url = render_url.clone();
        let count = *page_count.read();
        let width = *render_width.read();
        async move {
            if count == 0 {
                return;
            }
            // Yield once so the canvases below exist before painting
            TimeoutFuture::new(0).await;
            for page in 1..=count {
                let canvas_id = coords::page_surface_id(document_id, page);
                match pdf::render_page(&url, page, &canvas_id, width).await {
                    Ok(dims) => {
                        if pages.peek().needs_record(page, dims) {
                            pages.write().record(page, dims);
                        }
                    }
                    Err(err) => warn!("render failed on page {page}: {err}"),
                }
            }
        }
    });

    // Start a drag or resize on a field. Unmeasured pages ignore the press:
    // without natural dimensions there is no meaningful scale factor.
    let begin_gesture = move |field_id: FieldId, page: u32, client: (f64, f64), resize: bool| {
        if !pages.read().is_measured(page) {
            return;
        }
        let Some(position) = registry.read().get(field_id).map(|f| f.position) else {
            return;
        };
        let scale = pages
            .read()
            .render_context(page, *render_width.read())
            .scale_factor();

        let session = if resize {
            GestureSession::begin_resize(field_id, client, position, scale)
        } else {
            GestureSession::begin_drag(field_id, client, position, scale)
        };

        let mut gesture = gesture;
        let mut capture = capture;
        gesture.set(Some(session));

        let guard = PointerCapture::install(
            move |x, y| {
                let mut gesture = gesture;
                let mut registry = registry;
                if let Some(session) = gesture.write().as_mut() {
                    let patch = session.pointer_move((x, y));
                    registry.write().update_position(session.field_id, &patch);
                };
            },
            move || {
                let mut gesture = gesture;
                let mut registry = registry;
                let mut tap_cycles = tap_cycles;
                if let Some(finished) = gesture.write().take() {
                    if finished.is_click() && !resize {
                        if tap_to_place {
                            // Tap cycles the field through the anchors
                            let field_page =
                                registry.read().get(finished.field_id).map(|f| f.page);
                            let dims = field_page.and_then(|p| pages.read().dims(p));
                            if let Some(dims) = dims {
                                let patch = tap_cycles
                                    .write()
                                    .entry(finished.field_id)
                                    .or_default()
                                    .advance(dims.width_points, dims.height_points);
                                registry
                                    .write()
                                    .update_position(finished.field_id, &patch);
                            }
                        } else {
                            on_open_field.call(finished.field_id);
                        }
                    }
                }
                release_capture(capture);
            },
        );
        capture.set(guard);
    };

    let page_count = *page_count.read();
    let width = *render_width.read();
    let placing = placement.read().is_placing();

    rsx! {
        div { class: "document-view",
            if page_count == 0 {
                div { class: "document-loading", "Loading document\u{2026}" }
            }
            for page in 1..=page_count {
                {
                    let ctx = pages.read().render_context(page, width);
                    let height = if pages.read().is_measured(page) {
                        ctx.render_height_px()
                    } else {
                        // Placeholder aspect until the page reports its size
                        width * 1.294
                    };
                    let surface_id = coords::page_surface_id(document_id, page);
                    let overlay_class = if placing {
                        "page-overlay page-overlay-placing"
                    } else {
                        "page-overlay"
                    };
                    let page_fields: Vec<_> = registry
                        .read()
                        .fields_for_page(document_id, page)
                        .cloned()
                        .collect();
                    let recipients = recipients.clone();

                    rsx! {
                        div {
                            key: "{page}",
                            class: "page-wrap",
                            style: "width:{width}px;height:{height}px;",

                            canvas {
                                id: "{surface_id}",
                                class: "page-canvas",
                            }

                            div {
                                class: "{overlay_class}",
                                onclick: move |evt: Event<MouseData>| {
                                    if !placement.read().is_placing() {
                                        return;
                                    }
                                    let client = evt.client_coordinates();
                                    let surface = coords::page_surface_id(document_id, page);
                                    let Some(point) =
                                        coords::click_to_page_px(client.x, client.y, &surface)
                                    else {
                                        return;
                                    };
                                    let ctx = pages
                                        .read()
                                        .render_context(page, *render_width.read());
                                    let pending = placement.read().pending();
                                    let recipient = pending.and_then(|p| {
                                        recipients.iter().find(|r| r.order == p.recipient_id)
                                    });
                                    let result = placement.write().handle_page_click(
                                        point,
                                        page,
                                        document_id,
                                        &ctx,
                                        recipient,
                                        new_fields_editable,
                                        &mut registry.write(),
                                    );
                                    match result {
                                        Ok(id) => on_placed.call(id),
                                        Err(err @ PlacementError::RecipientIncomplete { .. }) => {
                                            push_transient(
                                                notices,
                                                NoticeLevel::Error,
                                                err.to_string(),
                                            );
                                        }
                                        // Load-timing window or no pending slot: quiet
                                        Err(_) => {}
                                    }
                                },

                                for field in page_fields {
                                    {
                                        let id = field.id;
                                        let rect = geometry::to_pixels(field.position, &ctx);
                                        let draggable =
                                            interactive || (can_fill && field.editable);
                                        rsx! {
                                            FieldOverlay {
                                                key: "{id:?}",
                                                field: field.clone(),
                                                rect,
                                                draggable,
                                                show_resize: interactive,
                                                show_delete: interactive,
                                                show_open: can_fill && field.editable,
                                                on_press: move |client: (f64, f64)| {
                                                    begin_gesture(id, page, client, false);
                                                },
                                                on_resize_press: move |client: (f64, f64)| {
                                                    begin_gesture(id, page, client, true);
                                                },
                                                on_open: move |_| on_open_field.call(id),
                                                on_delete: move |_| on_delete_field.call(id),
                                            }
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}
