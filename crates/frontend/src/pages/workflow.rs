use std::rc::Rc;

use dioxus::prelude::*;
use tracing::info;

use signet_shared::geometry::BUILDER_MOBILE_BREAKPOINT_PX;
use signet_shared::models::{page_offset, total_pages, Envelope, EnvelopeStatus, FlowType, Recipient};
use signet_shared::registry::FieldRegistry;

use crate::api::{self, SignLink, UploadFile};
use crate::components::page_view::PageView;
use crate::components::recipient_panel::RecipientPanel;
use crate::notify::{push_transient, NoticeHost, NoticeLevel, NoticeQueue};
use crate::pdf::ObjectUrl;
use crate::placement::PlacementSession;
use crate::viewport;

/// Everything that must hold before an envelope goes out. Returns the first
/// problem so the notice names something actionable.
fn send_blocker(recipients: &[Recipient], registry: &FieldRegistry) -> Option<String> {
    if recipients.is_empty() {
        return Some("Add at least one recipient before sending".to_string());
    }
    for recipient in recipients {
        if !recipient.is_complete() {
            return Some(format!(
                "Recipient {} needs a name and a valid email",
                recipient.order
            ));
        }
        if !registry.has_field_for_recipient(recipient.order) {
            return Some(format!(
                "Recipient {} has no field placed yet",
                recipient.order
            ));
        }
    }
    None
}

/// Multi-recipient workflow builder: recipients, per-document field
/// placement, flow selection, save and send.
#[component]
pub fn Workflow(id: i64) -> Element {
    let notices = use_signal(NoticeQueue::default);
    let mut envelope = use_signal(|| None::<Envelope>);
    let recipients = use_signal(Vec::<Recipient>::new);
    let mut registry = use_signal(FieldRegistry::new);
    let placement = use_signal(PlacementSession::default);
    let flow_type = use_signal(FlowType::default);
    let mut selected_doc = use_signal(|| 0_usize);
    let mut doc_url = use_signal(|| None::<Rc<ObjectUrl>>);
    let mut busy = use_signal(|| false);
    let mut reload = use_signal(|| 0_u32);
    let sign_links = use_signal(Vec::<SignLink>::new);
    let render_width = viewport::use_render_width(BUILDER_MOBILE_BREAKPOINT_PX);

    // Load (and reload after file attach) the envelope and seed the signals
    let _loader = use_resource(move || {
        let _generation = *reload.read();
        async move {
            let mut envelope = envelope;
            let mut recipients = recipients;
            let mut registry = registry;
            let mut flow_type = flow_type;
            match api::fetch_envelope(id).await {
                Ok(detail) => {
                    recipients.set(detail.envelope.recipients.clone());
                    flow_type.set(detail.envelope.flow_type);
                    registry.set(api::registry_from_fields(
                        detail.fields,
                        &detail.envelope.recipients,
                    ));
                    envelope.set(Some(detail.envelope));
                }
                Err(err) => push_transient(notices, NoticeLevel::Error, err),
            }
        }
    });

    // Fetch the selected document's bytes; the fresh object URL replaces
    // (and thereby revokes) the previous one.
    let _doc_loader = use_resource(move || {
        let document = envelope
            .read()
            .as_ref()
            .and_then(|e| e.documents.get(*selected_doc.read()).cloned());
        async move {
            let mut doc_url = doc_url;
            let Some(document) = document else {
                doc_url.set(None);
                return;
            };
            match api::fetch_document_bytes(id, Some(document.id), None).await {
                Ok(bytes) => match ObjectUrl::from_bytes(&bytes, "application/pdf") {
                    Some(url) => doc_url.set(Some(Rc::new(url))),
                    None => doc_url.set(None),
                },
                Err(err) => push_transient(notices, NoticeLevel::Error, err),
            }
        }
    });

    let snapshot = envelope.read().clone();
    let Some(current) = snapshot else {
        return rsx! {
            div { class: "app",
                NoticeHost { notices }
                div { class: "document-loading", "Loading envelope\u{2026}" }
            }
        };
    };

    let editable = current.status.is_editable();
    let documents = current.documents.clone();
    let total = total_pages(&documents);
    let doc_index = (*selected_doc.read()).min(documents.len().saturating_sub(1));
    let current_doc = documents.get(doc_index).cloned();
    let url = doc_url.read().as_ref().map(|u| u.as_str().to_string());

    let save = move |_| {
        let payload = api::build_update_payload(
            &recipients.read(),
            registry.read().fields(),
            *flow_type.read(),
        );
        let mut busy = busy;
        busy.set(true);
        spawn(async move {
            match api::update_envelope(id, &payload).await {
                Ok(()) => push_transient(notices, NoticeLevel::Success, "Envelope saved"),
                Err(err) => push_transient(notices, NoticeLevel::Error, err),
            }
            busy.set(false);
        });
    };

    rsx! {
        div { class: "app",
            NoticeHost { notices }

            div { class: "header",
                h1 { "{current.title}" }
                span { class: "status-badge status-{current.status}", "{current.status}" }
                div { class: "header-actions",
                    button {
                        disabled: !editable || *busy.read(),
                        onclick: save,
                        "Save"
                    }
                    button {
                        disabled: !editable || *busy.read(),
                        onclick: move |_| {
                            let blocker =
                                send_blocker(&recipients.read(), &registry.read());
                            if let Some(message) = blocker {
                                push_transient(notices, NoticeLevel::Error, message);
                                return;
                            }
                            // Persist the latest builder state before sending
                            let payload = api::build_update_payload(
                                &recipients.read(),
                                registry.read().fields(),
                                *flow_type.read(),
                            );
                            let mut busy = busy;
                            let mut envelope = envelope;
                            let mut sign_links = sign_links;
                            busy.set(true);
                            spawn(async move {
                                let result = match api::update_envelope(id, &payload).await {
                                    Ok(()) => api::send_envelope(id).await,
                                    Err(err) => Err(err),
                                };
                                match result {
                                    Ok(links) => {
                                        info!("envelope {id} sent");
                                        if let Some(e) = envelope.write().as_mut() {
                                            e.status = EnvelopeStatus::Sent;
                                        }
                                        sign_links.set(links);
                                        push_transient(
                                            notices,
                                            NoticeLevel::Success,
                                            "Envelope sent to recipients",
                                        );
                                    }
                                    Err(err) => {
                                        push_transient(notices, NoticeLevel::Error, err);
                                    }
                                }
                                busy.set(false);
                            });
                        },
                        "Send"
                    }
                }
            }

            div { class: "sidebar",
                RecipientPanel {
                    recipients,
                    registry,
                    placement,
                    flow_type,
                    editable,
                }

                if !sign_links.read().is_empty() {
                    div { class: "panel",
                        h3 { "Signing links" }
                        for link in sign_links.read().iter() {
                            {
                                let url = api::build_sign_link(
                                    &api::window_origin(),
                                    id,
                                    &link.token,
                                );
                                let email = link.email.clone();
                                rsx! {
                                    div { key: "{email}", class: "sign-link-row",
                                        span { class: "sign-link-email", "{email}" }
                                        input {
                                            r#type: "text",
                                            readonly: true,
                                            value: "{url}",
                                        }
                                        button {
                                            class: "secondary",
                                            onclick: move |_| {
                                                let url = url.clone();
                                                spawn(async move {
                                                    if let Some(window) = web_sys::window() {
                                                        let clipboard =
                                                            window.navigator().clipboard();
                                                        let _ =
                                                            wasm_bindgen_futures::JsFuture::from(
                                                                clipboard.write_text(&url),
                                                            )
                                                            .await;
                                                    }
                                                });
                                            },
                                            "Copy"
                                        }
                                    }
                                }
                            }
                        }
                    }
                }

                div { class: "panel",
                    h3 { "Documents" }
                    if documents.len() > 1 {
                        for (index, document) in documents.iter().enumerate() {
                            {
                                let first = page_offset(&documents, index) + 1;
                                let last = page_offset(&documents, index) + document.page_count;
                                let name = document.name.clone();
                                rsx! {
                                    button {
                                        key: "{document.id}",
                                        class: if index == doc_index { "doc-tab active" } else { "doc-tab" },
                                        onclick: move |_| selected_doc.set(index),
                                        "{name} (pages {first}\u{2013}{last} of {total})"
                                    }
                                }
                            }
                        }
                    }
                    if editable {
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
                                    let mut files = Vec::new();
                                    for file in selected {
                                        if let Ok(bytes) = file.read_bytes().await {
                                            files.push(UploadFile {
                                                name: file.name(),
                                                mime: "application/pdf".to_string(),
                                                bytes: bytes.to_vec(),
                                            });
                                        }
                                    }
                                    if files.is_empty() {
                                        return;
                                    }
                                    match api::update_envelope_files(id, &files).await {
                                        Ok(()) => {
                                            let mut reload = reload;
                                            let next = *reload.peek() + 1;
                                            reload.set(next);
                                        }
                                        Err(err) => push_transient(
                                            notices,
                                            NoticeLevel::Error,
                                            err,
                                        ),
                                    }
                                });
                            },
                        }
                    }
                }
            }

            if let (Some(url), Some(document)) = (url, current_doc) {
                PageView {
                    key: "{document.id}",
                    doc_url: url,
                    document_id: Some(document.id),
                    render_width,
                    registry,
                    placement,
                    notices,
                    recipients: recipients.read().clone(),
                    new_fields_editable: false,
                    interactive: editable,
                    can_fill: false,
                    tap_to_place: false,
                    on_placed: move |_| {},
                    on_open_field: move |_| {},
                    on_delete_field: move |field_id| {
                        registry.write().remove_by_id(field_id);
                    },
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use signet_shared::fields::{FieldId, FieldType, SignatureField};
    use signet_shared::geometry::NormalizedPosition;

    fn recipient(order: u32, email: &str, name: &str) -> Recipient {
        Recipient {
            email: email.to_string(),
            full_name: name.to_string(),
            order,
            signed: false,
        }
    }

    fn registry_with_field_for(order: u32) -> FieldRegistry {
        let mut registry = FieldRegistry::new();
        let id = registry.next_id();
        registry.add_field(SignatureField {
            id,
            page: 1,
            document_id: Some(1),
            recipient_id: order,
            field_type: FieldType::Signature,
            position: NormalizedPosition {
                x: 10.0,
                y: 10.0,
                width: 160.0,
                height: 50.0,
            },
            required: true,
            name: "Signature".to_string(),
            recipient_name: String::new(),
            signed: false,
            signature_data: None,
            editable: false,
        });
        registry
    }

    #[test]
    fn test_send_blocked_without_recipients() {
        let blocker = send_blocker(&[], &FieldRegistry::new());
        assert!(blocker.unwrap().contains("at least one recipient"));
    }

    #[test]
    fn test_send_blocked_on_incomplete_recipient() {
        let recipients = vec![recipient(1, "not-an-email", "Jane Doe")];
        let blocker = send_blocker(&recipients, &registry_with_field_for(1));
        assert!(blocker.unwrap().contains("valid email"));
    }

    #[test]
    fn test_send_blocked_without_fields() {
        let recipients = vec![
            recipient(1, "jane@example.com", "Jane Doe"),
            recipient(2, "john@example.com", "John Smith"),
        ];
        let blocker = send_blocker(&recipients, &registry_with_field_for(1));
        assert_eq!(blocker.unwrap(), "Recipient 2 has no field placed yet");
    }

    #[test]
    fn test_send_allowed_when_complete() {
        let recipients = vec![recipient(1, "jane@example.com", "Jane Doe")];
        assert!(send_blocker(&recipients, &registry_with_field_for(1)).is_none());
    }
}
