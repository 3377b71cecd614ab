use std::rc::Rc;

use dioxus::prelude::*;
use tracing::info;

use signet_shared::fields::FieldId;
use signet_shared::geometry::VIEWER_MOBILE_BREAKPOINT_PX;
use signet_shared::models::Envelope;
use signet_shared::registry::FieldRegistry;

use crate::api::{self, SavedSignature};
use crate::components::otp_panel::OtpPanel;
use crate::components::page_view::PageView;
use crate::components::signature_modal::SignatureModal;
use crate::notify::{push_transient, NoticeHost, NoticeLevel, NoticeQueue};
use crate::otp::OtpGate;
use crate::pdf::ObjectUrl;
use crate::placement::PlacementSession;
use crate::viewport;

/// Guest and authenticated signing viewer. Guests arrive with a token in the
/// invitation link and clear the OTP gate before the envelope loads;
/// logged-in recipients load straight away. Fields belonging to other
/// recipients render read-only.
#[component]
pub fn Sign(id: i64, token: String) -> Element {
    let is_guest = !token.is_empty();
    let notices = use_signal(NoticeQueue::default);
    let gate = use_signal(OtpGate::default);
    let mut verified = use_signal(|| !is_guest);
    let mut envelope = use_signal(|| None::<Envelope>);
    let mut my_recipient_email = use_signal(String::new);
    let mut registry = use_signal(FieldRegistry::new);
    let placement = use_signal(PlacementSession::default);
    let mut doc_url = use_signal(|| None::<Rc<ObjectUrl>>);
    let mut open_field = use_signal(|| None::<FieldId>);
    let mut submitted = use_signal(|| false);
    let mut busy = use_signal(|| false);
    let render_width = viewport::use_render_width(VIEWER_MOBILE_BREAKPOINT_PX);
    let is_mobile = viewport::use_is_mobile(VIEWER_MOBILE_BREAKPOINT_PX);

    // Saved signatures only exist for logged-in signers
    let saved_resource = use_resource(move || async move {
        if is_guest {
            return Vec::<SavedSignature>::new();
        }
        api::fetch_saved_signatures().await.unwrap_or_default()
    });

    // Envelope + document load, once the gate is cleared
    let load_token = token.clone();
    let _loader = use_resource(move || {
        let token = load_token.clone();
        let ready = *verified.read();
        async move {
            if !ready {
                return;
            }
            let detail = if is_guest {
                api::fetch_guest_envelope(id, &token).await
            } else {
                api::fetch_sign_page(id).await
            };
            let detail = match detail {
                Ok(detail) => detail,
                Err(err) => {
                    push_transient(notices, NoticeLevel::Error, err);
                    return;
                }
            };

            if let Some(me) = detail
                .recipient_id
                .and_then(|rid| detail.envelope.recipients.iter().find(|r| r.order == rid))
            {
                my_recipient_email.set(me.email.clone());
            }
            registry.set(api::registry_from_fields(
                detail.fields,
                &detail.envelope.recipients,
            ));

            let guest_token = if is_guest { Some(token.as_str()) } else { None };
            let document_id = detail.envelope.documents.first().map(|d| d.id);
            match api::fetch_document_bytes(id, document_id, guest_token).await {
                Ok(bytes) => {
                    if let Some(url) = ObjectUrl::from_bytes(&bytes, "application/pdf") {
                        doc_url.set(Some(Rc::new(url)));
                    }
                }
                Err(err) => push_transient(notices, NoticeLevel::Error, err),
            }
            envelope.set(Some(detail.envelope));
        }
    });

    // --- OTP gate ---
    if is_guest && !*verified.read() {
        let send_token = token.clone();
        let verify_token = token.clone();
        return rsx! {
            div { class: "app app-narrow",
                NoticeHost { notices }
                OtpPanel {
                    gate,
                    recipient_email: my_recipient_email.read().clone(),
                    on_send: move |_| {
                        let token = send_token.clone();
                        spawn(async move {
                            let mut gate = gate;
                            match api::send_otp(id, &token).await {
                                Ok(()) => {
                                    gate.write().mark_sent(js_sys::Date::now());
                                    push_transient(
                                        notices,
                                        NoticeLevel::Info,
                                        "Code sent, check your inbox",
                                    );
                                }
                                Err(err) => push_transient(notices, NoticeLevel::Error, err),
                            }
                        });
                    },
                    on_verify: move |code: String| {
                        let token = verify_token.clone();
                        spawn(async move {
                            let mut gate = gate;
                            match api::verify_otp(id, &code, &token).await {
                                Ok(()) => verified.set(true),
                                Err(err) => {
                                    let left =
                                        gate.write().record_failure(js_sys::Date::now());
                                    let message = if left == 0 {
                                        format!("{err}. Try again in 30 seconds")
                                    } else {
                                        err
                                    };
                                    push_transient(notices, NoticeLevel::Error, message);
                                }
                            }
                        });
                    },
                }
            }
        };
    }

    let snapshot = envelope.read().clone();
    let Some(current) = snapshot else {
        return rsx! {
            div { class: "app",
                NoticeHost { notices }
                div { class: "document-loading", "Loading envelope\u{2026}" }
            }
        };
    };

    let signable = current.status.is_signable() && !*submitted.read();
    let url = doc_url.read().as_ref().map(|u| u.as_str().to_string());
    let document_id = current.documents.first().map(|d| d.id);
    let editable_total = registry.read().editable_count();
    let all_signed = registry.read().all_editable_signed();
    let saved = saved_resource.read().clone().unwrap_or_default();
    let modal_field = *open_field.read();
    let modal_name = modal_field
        .and_then(|fid| registry.read().get(fid).map(|f| f.name.clone()))
        .unwrap_or_default();

    rsx! {
        div { class: "app",
            NoticeHost { notices }

            div { class: "header",
                h1 { "{current.title}" }
                span { class: "status-badge status-{current.status}", "{current.status}" }
                if signable && editable_total > 0 {
                    button {
                        disabled: !all_signed || *busy.read(),
                        onclick: move |_| {
                            let payload = api::build_sign_payload(registry.read().fields());
                            let token = token.clone();
                            busy.set(true);
                            spawn(async move {
                                let guest_token =
                                    if token.is_empty() { None } else { Some(token.as_str()) };
                                match api::sign_envelope(id, &payload, guest_token).await {
                                    Ok(()) => {
                                        info!("envelope {id} signed");
                                        submitted.set(true);
                                        push_transient(
                                            notices,
                                            NoticeLevel::Success,
                                            "Signature submitted",
                                        );
                                    }
                                    Err(err) => {
                                        push_transient(notices, NoticeLevel::Error, err);
                                    }
                                }
                                busy.set(false);
                            });
                        },
                        if *busy.read() { "Submitting\u{2026}" } else { "Finish signing" }
                    }
                }
            }

            if *submitted.read() {
                div { class: "panel done-panel",
                    h3 { "All done" }
                    p { "Your signature was recorded. You can close this page." }
                }
            } else if signable && editable_total == 0 {
                div { class: "panel done-panel",
                    p { "Nothing left for you to sign on this envelope." }
                }
            }

            if let Some(url) = url {
                PageView {
                    key: "{id}",
                    doc_url: url,
                    document_id,
                    render_width,
                    registry,
                    placement,
                    notices,
                    recipients: Vec::new(),
                    new_fields_editable: true,
                    interactive: false,
                    can_fill: signable,
                    tap_to_place: signable && *is_mobile.read(),
                    on_placed: move |_| {},
                    on_open_field: move |field_id| open_field.set(Some(field_id)),
                    on_delete_field: move |_| {},
                }
            }

            if let Some(field_id) = modal_field {
                SignatureModal {
                    field_name: modal_name,
                    saved,
                    on_confirm: move |(image, _saved_id): (String, Option<i64>)| {
                        registry.write().set_signature(field_id, image);
                        open_field.set(None);
                    },
                    on_cancel: move |_| open_field.set(None),
                }
            }
        }
    }
}
