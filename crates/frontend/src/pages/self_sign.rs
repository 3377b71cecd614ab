use std::rc::Rc;

use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine;
use dioxus::prelude::*;
use gloo_timers::future::TimeoutFuture;

use signet_shared::fields::{FieldId, FieldType};
use signet_shared::geometry::BUILDER_MOBILE_BREAKPOINT_PX;
use signet_shared::registry::FieldRegistry;

use crate::api::{self, UploadFile};
use crate::components::page_view::PageView;
use crate::components::signature_modal::SignatureModal;
use crate::notify::{push_transient, NoticeHost, NoticeLevel, NoticeQueue};
use crate::pdf::{self, ObjectUrl};
use crate::placement::PlacementSession;
use crate::viewport;

/// Turn a captured data URL back into an image upload for the wizard
/// endpoints.
pub(crate) fn signature_upload(data_url: &str) -> Option<UploadFile> {
    let bytes = B64.decode(api::strip_data_url(data_url)).ok()?;
    Some(UploadFile {
        name: "signature.png".to_string(),
        mime: "image/png".to_string(),
        bytes,
    })
}

/// Self-sign wizard: pick a PDF, drop one signature field on the preview,
/// sign synchronously and download the result.
#[component]
pub fn SelfSign() -> Element {
    let notices = use_signal(NoticeQueue::default);
    let mut file = use_signal(|| None::<UploadFile>);
    let mut doc_url = use_signal(|| None::<Rc<ObjectUrl>>);
    let mut registry = use_signal(FieldRegistry::new);
    let mut placement = use_signal(PlacementSession::default);
    let mut open_field = use_signal(|| None::<FieldId>);
    let mut busy = use_signal(|| false);
    let render_width = viewport::use_render_width(BUILDER_MOBILE_BREAKPOINT_PX);

    let url = doc_url.read().as_ref().map(|u| u.as_str().to_string());
    let placing = placement.read().is_placing();
    let field = registry.read().fields().first().cloned();
    let ready = field.as_ref().is_some_and(|f| f.signed);
    let modal_field = *open_field.read();
    let modal_name = modal_field
        .and_then(|fid| registry.read().get(fid).map(|f| f.name.clone()))
        .unwrap_or_default();

    rsx! {
        div { class: "app",
            NoticeHost { notices }

            div { class: "header",
                h1 { "Sign a document" }
            }

            div { class: "sidebar",
                div { class: "panel",
                    h3 { "1. Choose a PDF" }
                    input {
                        r#type: "file",
                        accept: "application/pdf",
                        onchange: move |evt: Event<FormData>| {
                            let Some(picked) = evt.files().into_iter().next() else { return };
                            spawn(async move {
                                let name = picked.name();
                                let Ok(bytes) = picked.read_bytes().await else { return };
                                let bytes = bytes.to_vec();
                                // New document: fresh fields, fresh URL
                                // (the old blob URL revokes on drop)
                                registry.set(FieldRegistry::new());
                                placement.write().cancel();
                                if let Some(url) =
                                    ObjectUrl::from_bytes(&bytes, "application/pdf")
                                {
                                    doc_url.set(Some(Rc::new(url)));
                                }
                                file.set(Some(UploadFile {
                                    name,
                                    mime: "application/pdf".to_string(),
                                    bytes,
                                }));
                            });
                        },
                    }
                }

                div { class: "panel",
                    h3 { "2. Place your signature" }
                    button {
                        disabled: url.is_none(),
                        class: if placing { "place-button active" } else { "place-button" },
                        onclick: move |_| {
                            if placement.read().is_placing() {
                                placement.write().cancel();
                            } else {
                                placement.write().begin(FieldType::Signature, 1);
                            }
                        },
                        if placing { "Click a page\u{2026}" } else { "Place signature" }
                    }
                    if let Some(field) = &field {
                        p { class: "placement-readout",
                            "Page {field.page}, "
                            if field.signed { "signed" } else { "awaiting signature" }
                        }
                    }
                }

                div { class: "panel",
                    h3 { "3. Download" }
                    button {
                        disabled: !ready || *busy.read(),
                        onclick: move |_| {
                            let Some(picked) = file.read().clone() else { return };
                            let Some(field) = registry.read().fields().first().cloned() else {
                                return;
                            };
                            let Some(image) = field
                                .signature_data
                                .as_deref()
                                .and_then(signature_upload)
                            else {
                                push_transient(
                                    notices,
                                    NoticeLevel::Error,
                                    "Add a signature image first",
                                );
                                return;
                            };
                            let placement_json =
                                api::build_placement(field.page, &field.position);
                            busy.set(true);
                            spawn(async move {
                                match api::self_sign_sync(&picked, &placement_json, &image)
                                    .await
                                {
                                    Ok(bytes) => {
                                        if let Some(url) =
                                            ObjectUrl::from_bytes(&bytes, "application/pdf")
                                        {
                                            let name = format!("signed-{}", picked.name);
                                            pdf::trigger_download(url.as_str(), &name);
                                            // Give the download a moment to start
                                            // before the blob URL revokes on drop
                                            TimeoutFuture::new(2_000).await;
                                        }
                                        push_transient(
                                            notices,
                                            NoticeLevel::Success,
                                            "Document signed",
                                        );
                                    }
                                    Err(err) => {
                                        push_transient(notices, NoticeLevel::Error, err);
                                    }
                                }
                                busy.set(false);
                            });
                        },
                        if *busy.read() { "Signing\u{2026}" } else { "Sign & download" }
                    }
                }
            }

            if let Some(url) = url.clone() {
                PageView {
                    doc_url: url,
                    document_id: None,
                    render_width,
                    registry,
                    placement,
                    notices,
                    recipients: Vec::new(),
                    new_fields_editable: true,
                    interactive: true,
                    can_fill: true,
                    tap_to_place: false,
                    // Placing your own field goes straight to capture
                    on_placed: move |field_id| open_field.set(Some(field_id)),
                    on_open_field: move |field_id| open_field.set(Some(field_id)),
                    on_delete_field: move |field_id| {
                        registry.write().remove_by_id(field_id);
                    },
                }
            }

            if let Some(field_id) = modal_field {
                SignatureModal {
                    field_name: modal_name,
                    saved: Vec::new(),
                    on_confirm: move |(image, _): (String, Option<i64>)| {
                        registry.write().set_signature(field_id, image);
                        open_field.set(None);
                    },
                    on_cancel: move |_| open_field.set(None),
                }
            }
        }
    }
}
