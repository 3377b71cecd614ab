use dioxus::prelude::*;
use uuid::Uuid;

use crate::api::{self, VerifyResult};
use crate::notify::{NoticeHost, NoticeQueue};

enum Proof {
    Checking,
    Valid(VerifyResult),
    Invalid(String),
}

/// Public verification page behind a printed QR code. The route carries the
/// print record's uuid plus the server-issued signature over it; anything
/// that fails the check renders as invalid, never as an error page.
#[component]
pub fn Verify(uuid: String, sig: String) -> Element {
    let notices = use_signal(NoticeQueue::default);

    let parsed = Uuid::parse_str(&uuid).ok();
    let check = use_resource(move || {
        let sig = sig.clone();
        async move {
            let Some(uuid) = parsed else {
                return Proof::Invalid("This verification link is malformed".to_string());
            };
            match api::verify_print(&uuid, &sig).await {
                Ok(result) => Proof::Valid(result),
                Err(_) => {
                    Proof::Invalid("This document could not be verified".to_string())
                }
            }
        }
    });

    let state = check.read();
    let proof = state.as_ref().unwrap_or(&Proof::Checking);

    rsx! {
        div { class: "app app-narrow",
            NoticeHost { notices }
            div { class: "header",
                h1 { "Document verification" }
            }
            {match proof {
                Proof::Checking => rsx! {
                    div { class: "document-loading", "Checking\u{2026}" }
                },
                Proof::Invalid(reason) => rsx! {
                    div { class: "verify-banner verify-invalid",
                        h2 { "Not verified" }
                        p { "{reason}" }
                    }
                },
                Proof::Valid(result) => rsx! {
                    div {
                        class: if result.completed {
                            "verify-banner verify-valid"
                        } else {
                            "verify-banner verify-pending"
                        },
                        h2 {
                            if result.completed { "Verified" } else { "Signing in progress" }
                        }
                        p { "{result.title}" }
                        p { class: "verify-status", "Status: {result.status}" }
                    }
                    div { class: "panel",
                        h3 { "Signers" }
                        if result.signers.is_empty() {
                            p { "No signers recorded." }
                        }
                        for (index, signer) in result.signers.iter().enumerate() {
                            div { key: "{index}", class: "verify-signer",
                                span { "{signer.full_name}" }
                                span { class: "verify-signer-email", "{signer.email}" }
                                if let Some(at) = &signer.signed_at {
                                    span { class: "verify-signer-time", "signed {at}" }
                                }
                            }
                        }
                    }
                    if let Some(hash) = &result.hash_sha256 {
                        div { class: "panel",
                            h3 { "Document fingerprint" }
                            code { class: "verify-hash", "{hash}" }
                        }
                    }
                    if let Some(doc) = &result.document_url {
                        div { class: "panel",
                            a {
                                href: api::absolute_url(&api::window_origin(), doc),
                                target: "_blank",
                                "View the signed document"
                            }
                        }
                    }
                },
            }}
        }
    }
}
