use std::rc::Rc;

use dioxus::prelude::*;
use gloo_timers::future::TimeoutFuture;
use tracing::info;

use signet_shared::fields::{FieldId, FieldType};
use signet_shared::geometry::BUILDER_MOBILE_BREAKPOINT_PX;
use signet_shared::registry::FieldRegistry;

use crate::api::{self, BatchJob, UploadFile, BATCH_POLL_INTERVAL_MS};
use crate::components::page_view::PageView;
use crate::components::signature_modal::SignatureModal;
use crate::notify::{push_transient, NoticeHost, NoticeLevel, NoticeQueue};
use crate::pages::self_sign::signature_upload;
use crate::pdf::{self, ObjectUrl};
use crate::placement::PlacementSession;
use crate::viewport;

/// Bulk-same-spot wizard: one signature placement, chosen on a preview of
/// the first file, stamped onto every uploaded document by a background job.
#[component]
pub fn BulkSign() -> Element {
    let notices = use_signal(NoticeQueue::default);
    let mut files = use_signal(Vec::<UploadFile>::new);
    let mut doc_url = use_signal(|| None::<Rc<ObjectUrl>>);
    let mut registry = use_signal(FieldRegistry::new);
    let mut placement = use_signal(PlacementSession::default);
    let mut open_field = use_signal(|| None::<FieldId>);
    let mut job = use_signal(|| None::<BatchJob>);
    let mut busy = use_signal(|| false);
    let render_width = viewport::use_render_width(BUILDER_MOBILE_BREAKPOINT_PX);

    let url = doc_url.read().as_ref().map(|u| u.as_str().to_string());
    let file_count = files.read().len();
    let placing = placement.read().is_placing();
    let field = registry.read().fields().first().cloned();
    let ready = field.as_ref().is_some_and(|f| f.signed) && file_count > 0;
    let modal_field = *open_field.read();
    let modal_name = modal_field
        .and_then(|fid| registry.read().get(fid).map(|f| f.name.clone()))
        .unwrap_or_default();
    let job_snapshot = job.read().clone();

    rsx! {
        div { class: "app",
            NoticeHost { notices }

            div { class: "header",
                h1 { "Sign many documents" }
            }

            div { class: "sidebar",
                div { class: "panel",
                    h3 { "1. Choose PDFs" }
                    input {
                        r#type: "file",
                        accept: "application/pdf",
                        multiple: true,
                        onchange: move |evt: Event<FormData>| {
                            let selected = evt.files();
                            if selected.is_empty() {
                                return;
                            }
                            spawn(async move {
                                let mut picked = Vec::new();
                                for file in selected {
                                    if let Ok(bytes) = file.read_bytes().await {
                                        picked.push(UploadFile {
                                            name: file.name(),
                                            mime: "application/pdf".to_string(),
                                            bytes: bytes.to_vec(),
                                        });
                                    }
                                }
                                if picked.is_empty() {
                                    return;
                                }
                                registry.set(FieldRegistry::new());
                                placement.write().cancel();
                                job.set(None);
                                // The first file stands in for the whole stack:
                                // the same spot lands on every document
                                if let Some(url) = ObjectUrl::from_bytes(
                                    &picked[0].bytes,
                                    "application/pdf",
                                ) {
                                    doc_url.set(Some(Rc::new(url)));
                                }
                                files.set(picked);
                            });
                        },
                    }
                    if file_count > 0 {
                        p { class: "placement-readout",
                            if file_count == 1 { "1 document" } else { "{file_count} documents" }
                        }
                    }
                }

                div { class: "panel",
                    h3 { "2. Place the signature" }
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
                }

                div { class: "panel",
                    h3 { "3. Sign everything" }
                    button {
                        disabled: !ready || *busy.read(),
                        onclick: move |_| {
                            let picked = files.read().clone();
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
                                let created =
                                    api::create_batch_sign(&picked, &placement_json, &image)
                                        .await;
                                let created = match created {
                                    Ok(created) => created,
                                    Err(err) => {
                                        push_transient(notices, NoticeLevel::Error, err);
                                        busy.set(false);
                                        return;
                                    }
                                };
                                info!("batch job {} started", created.id);
                                let job_id = created.id;
                                job.set(Some(created));

                                // Poll to a terminal status, surfacing progress
                                let finished = loop {
                                    TimeoutFuture::new(BATCH_POLL_INTERVAL_MS).await;
                                    match api::fetch_batch_job(job_id).await {
                                        Ok(current) => {
                                            let done = current.status.is_terminal();
                                            job.set(Some(current.clone()));
                                            if done {
                                                break Some(current);
                                            }
                                        }
                                        Err(err) => {
                                            push_transient(notices, NoticeLevel::Error, err);
                                            break None;
                                        }
                                    }
                                };

                                if let Some(finished) = finished {
                                    match api::fetch_batch_zip(finished.id).await {
                                        Ok(bytes) => {
                                            if let Some(url) = ObjectUrl::from_bytes(
                                                &bytes,
                                                "application/zip",
                                            ) {
                                                pdf::trigger_download(
                                                    url.as_str(),
                                                    "signed-documents.zip",
                                                );
                                                TimeoutFuture::new(2_000).await;
                                            }
                                        }
                                        Err(err) => {
                                            push_transient(notices, NoticeLevel::Error, err);
                                        }
                                    }
                                }
                                busy.set(false);
                            });
                        },
                        if *busy.read() { "Working\u{2026}" } else { "Sign all & download" }
                    }
                    if let Some(job) = &job_snapshot {
                        p { class: "placement-readout",
                            "{job.done}/{job.total} signed"
                            if job.failed > 0 { ", {job.failed} failed" }
                        }
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
