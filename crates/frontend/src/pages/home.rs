use dioxus::prelude::*;
use tracing::error;

use crate::api::{self, UploadFile};
use crate::notify::{push_transient, NoticeHost, NoticeLevel, NoticeQueue};
use crate::Route;

/// Landing page: start an envelope from a PDF, or jump to the wizards.
#[component]
pub fn Home() -> Element {
    let mut title = use_signal(String::new);
    let mut file = use_signal(|| None::<UploadFile>);
    let mut busy = use_signal(|| false);
    let notices = use_signal(NoticeQueue::default);
    let navigator = use_navigator();

    rsx! {
        div { class: "app",
            NoticeHost { notices }
            div { class: "hero",
                h1 { "signet" }
                p { "Send documents for signature, or sign them yourself." }
            }

            div { class: "panel start-panel",
                h3 { "New envelope" }
                input {
                    r#type: "text",
                    placeholder: "Envelope title",
                    value: "{title}",
                    oninput: move |evt: Event<FormData>| title.set(evt.value()),
                }
                input {
                    r#type: "file",
                    accept: "application/pdf",
                    onchange: move |evt: Event<FormData>| {
                        let Some(picked) = evt.files().into_iter().next() else { return };
                        spawn(async move {
                            let name = picked.name();
                            let Ok(bytes) = picked.read_bytes().await else { return };
                            if title.read().is_empty() {
                                title.set(name.trim_end_matches(".pdf").to_string());
                            }
                            file.set(Some(UploadFile {
                                name,
                                mime: "application/pdf".to_string(),
                                bytes: bytes.to_vec(),
                            }));
                        });
                    },
                }
                button {
                    disabled: *busy.read() || file.read().is_none(),
                    onclick: move |_| {
                        let Some(picked) = file.read().clone() else { return };
                        let name = title.read().clone();
                        let navigator = navigator;
                        busy.set(true);
                        spawn(async move {
                            let name = if name.is_empty() { picked.name.clone() } else { name };
                            match api::create_envelope(&name, &picked).await {
                                Ok(detail) => {
                                    navigator.push(Route::Workflow { id: detail.envelope.id });
                                }
                                Err(err) => {
                                    error!("envelope creation failed: {err}");
                                    push_transient(notices, NoticeLevel::Error, err);
                                }
                            }
                            busy.set(false);
                        });
                    },
                    if *busy.read() { "Creating\u{2026}" } else { "Create envelope" }
                }
            }

            div { class: "panel start-panel",
                h3 { "Quick signing" }
                div { class: "wizard-links",
                    Link { to: Route::SelfSign {}, "Sign a document yourself" }
                    Link { to: Route::BulkSign {}, "Stamp one signature on many documents" }
                }
            }
        }
    }
}
