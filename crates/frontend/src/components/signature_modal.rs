use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine;
use dioxus::prelude::*;

use crate::api::{self, SavedSignature};

/// Guess an image MIME type from a picked file's name. Unknown extensions
/// are treated as PNG, which is what the backend stamps anyway.
fn image_mime(file_name: &str) -> &'static str {
    let lower = file_name.to_ascii_lowercase();
    if lower.ends_with(".jpg") || lower.ends_with(".jpeg") {
        "image/jpeg"
    } else if lower.ends_with(".webp") {
        "image/webp"
    } else {
        "image/png"
    }
}

pub fn image_data_url(file_name: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", image_mime(file_name), B64.encode(bytes))
}

/// Capture modal for one field: upload an image or reuse a saved signature.
/// Confirm hands back `(data_url, saved_signature_id)`; drawing on a canvas
/// stays outside this component.
#[component]
pub fn SignatureModal(
    field_name: String,
    saved: Vec<SavedSignature>,
    on_confirm: EventHandler<(String, Option<i64>)>,
    on_cancel: EventHandler<()>,
) -> Element {
    let mut preview = use_signal(|| None::<String>);
    let mut selected_saved = use_signal(|| None::<i64>);
    let mut error = use_signal(|| None::<String>);

    rsx! {
        div {
            class: "modal-backdrop",
            onclick: move |_| on_cancel.call(()),
            div {
                class: "modal",
                onclick: move |evt: Event<MouseData>| evt.stop_propagation(),

                h3 { "Sign \u{201c}{field_name}\u{201d}" }

                div { class: "modal-section",
                    label { "Upload a signature image" }
                    input {
                        r#type: "file",
                        accept: "image/png,image/jpeg,image/webp",
                        onchange: move |evt: Event<FormData>| {
                            let Some(picked) = evt.files().into_iter().next() else { return };
                            spawn(async move {
                                if let Ok(bytes) = picked.read_bytes().await {
                                    preview.set(Some(image_data_url(&picked.name(), &bytes)));
                                    selected_saved.set(None);
                                    error.set(None);
                                }
                            });
                        },
                    }
                }

                if !saved.is_empty() {
                    div { class: "modal-section",
                        label { "Or reuse a saved signature" }
                        div { class: "saved-list",
                            for sig in saved {
                                {
                                    let id = sig.id;
                                    let title = if sig.name.is_empty() {
                                        format!("Signature #{id}")
                                    } else {
                                        sig.name.clone()
                                    };
                                    let active = *selected_saved.read() == Some(id);
                                    rsx! {
                                        button {
                                            key: "{id}",
                                            class: if active { "saved-item active" } else { "saved-item" },
                                            onclick: move |_| {
                                                spawn(async move {
                                                    match api::fetch_saved_signature_data(id).await {
                                                        Ok(data_url) => {
                                                            preview.set(Some(data_url));
                                                            selected_saved.set(Some(id));
                                                            error.set(None);
                                                        }
                                                        Err(err) => error.set(Some(err)),
                                                    }
                                                });
                                            },
                                            "{title}"
                                        }
                                    }
                                }
                            }
                        }
                    }
                }

                if let Some(image) = &*preview.read() {
                    div { class: "modal-preview",
                        img { src: "{image}", draggable: "false" }
                    }
                }

                if let Some(message) = &*error.read() {
                    div { class: "modal-error", "{message}" }
                }

                div { class: "modal-actions",
                    button {
                        class: "secondary",
                        onclick: move |_| on_cancel.call(()),
                        "Cancel"
                    }
                    button {
                        onclick: move |_| {
                            let image = preview.read().clone();
                            match image {
                                Some(image) => {
                                    on_confirm.call((image, *selected_saved.read()));
                                }
                                None => {
                                    error.set(Some(
                                        "Choose a signature image first".to_string(),
                                    ));
                                }
                            }
                        },
                        "Apply signature"
                    }
                }
            }
        }
    }
}
