use dioxus::prelude::*;
use gloo_timers::future::TimeoutFuture;

use crate::otp::{normalize_code, OtpGate, OTP_CODE_LEN};

/// One-time-code gate shown to guest signers before the envelope loads.
/// The [`OtpGate`] holds the attempt/cooldown state; this panel drives it
/// with the browser clock and hands send/verify up to the page.
#[component]
pub fn OtpPanel(
    gate: Signal<OtpGate>,
    recipient_email: String,
    on_send: EventHandler<()>,
    on_verify: EventHandler<String>,
) -> Element {
    let mut code = use_signal(String::new);
    let mut error = use_signal(|| None::<String>);
    let mut now_ms = use_signal(js_sys::Date::now);

    // One-second tick drives the resend countdown while the panel is up
    use_future(move || async move {
        loop {
            TimeoutFuture::new(1_000).await;
            now_ms.set(js_sys::Date::now());
        }
    });

    let now = *now_ms.read();
    let sent = gate.read().code_sent();
    let locked = gate.read().is_locked(now);
    let attempts = gate.read().attempts_left(now);
    let lock_wait = gate.read().lock_wait_secs(now);
    let wait = gate.read().resend_wait_secs(now);
    let can_send = gate.read().can_send(now);

    rsx! {
        div { class: "panel otp-panel",
            h3 { "Verify it's you" }
            p { class: "otp-hint",
                if recipient_email.is_empty() {
                    "We'll email a {OTP_CODE_LEN}-digit code to the address on this envelope."
                } else {
                    "We'll email a {OTP_CODE_LEN}-digit code to {recipient_email}."
                }
            }

            if !sent {
                button {
                    onclick: move |_| on_send.call(()),
                    "Email me a code"
                }
            } else {
                input {
                    r#type: "text",
                    inputmode: "numeric",
                    maxlength: "{OTP_CODE_LEN}",
                    placeholder: "123456",
                    value: "{code}",
                    oninput: move |evt: Event<FormData>| {
                        code.set(evt.value());
                        error.set(None);
                    },
                }
                button {
                    disabled: locked,
                    onclick: move |_| {
                        match normalize_code(&code.read()) {
                            Some(normalized) => {
                                error.set(None);
                                on_verify.call(normalized);
                            }
                            None => {
                                error.set(Some(format!(
                                    "Enter the {OTP_CODE_LEN}-digit code from the email"
                                )));
                            }
                        }
                    },
                    "Verify"
                }
                if locked {
                    p { class: "otp-locked",
                        "Too many attempts. Try again in {lock_wait}s."
                    }
                } else {
                    p { class: "otp-attempts",
                        if attempts == 1 { "1 attempt left" } else { "{attempts} attempts left" }
                    }
                }
                button {
                    class: "secondary",
                    disabled: !can_send,
                    onclick: move |_| {
                        code.set(String::new());
                        error.set(None);
                        on_send.call(());
                    },
                    if can_send { "Send again" } else { "Send again ({wait}s)" }
                }
            }

            if let Some(message) = &*error.read() {
                div { class: "otp-error", "{message}" }
            }
        }
    }
}
