use dioxus::prelude::*;

use signet_shared::fields::FieldType;
use signet_shared::models::{renumber_recipients, FlowType, Recipient};
use signet_shared::registry::FieldRegistry;

use crate::placement::PlacementSession;

const FIELD_TYPES: [FieldType; 5] = [
    FieldType::Signature,
    FieldType::Date,
    FieldType::Text,
    FieldType::Checkbox,
    FieldType::Initial,
];

fn field_type_wire(field_type: FieldType) -> &'static str {
    match field_type {
        FieldType::Signature => "signature",
        FieldType::Date => "date",
        FieldType::Text => "text",
        FieldType::Checkbox => "checkbox",
        FieldType::Initial => "initial",
    }
}

fn field_type_from_wire(value: &str) -> FieldType {
    FIELD_TYPES
        .into_iter()
        .find(|ft| field_type_wire(*ft) == value)
        .unwrap_or(FieldType::Signature)
}

/// Builder sidebar: recipient rows with rename/reorder/remove, the field
/// type picker and per-recipient place buttons, plus the flow toggle.
///
/// Every mutation that touches recipient identity flows through the registry
/// too: renames relabel fields, removals cascade, reorders remap ownership.
#[component]
pub fn RecipientPanel(
    recipients: Signal<Vec<Recipient>>,
    registry: Signal<FieldRegistry>,
    placement: Signal<PlacementSession>,
    flow_type: Signal<FlowType>,
    editable: bool,
) -> Element {
    let mut field_type = use_signal(|| FieldType::Signature);

    let move_recipient = move |index: usize, up: bool| {
        let mut recipients = recipients;
        let mut registry = registry;
        let mut list = recipients.write();
        let other = if up {
            let Some(other) = index.checked_sub(1) else { return };
            other
        } else {
            if index + 1 >= list.len() {
                return;
            }
            index + 1
        };
        list.swap(index, other);
        let mapping = renumber_recipients(&mut list);
        drop(list);
        registry.write().remap_recipients(&mapping);
    };

    let count = recipients.read().len();
    let rows = recipients.read().clone();
    let placing = placement.read().is_placing();
    let flow = *flow_type.read();

    rsx! {
        div { class: "panel recipient-panel",
            h3 { "Recipients" }

            div { class: "flow-toggle",
                button {
                    class: if flow == FlowType::Sequential { "active" } else { "" },
                    disabled: !editable,
                    onclick: move |_| flow_type.set(FlowType::Sequential),
                    "Sequential"
                }
                button {
                    class: if flow == FlowType::Parallel { "active" } else { "" },
                    disabled: !editable,
                    onclick: move |_| flow_type.set(FlowType::Parallel),
                    "Parallel"
                }
            }

            div { class: "field-type-row",
                label { "Field type:" }
                select {
                    disabled: !editable,
                    onchange: move |evt: Event<FormData>| {
                        field_type.set(field_type_from_wire(&evt.value()));
                    },
                    for ft in FIELD_TYPES {
                        option {
                            value: field_type_wire(ft),
                            selected: *field_type.read() == ft,
                            "{ft}"
                        }
                    }
                }
            }

            for (index, recipient) in rows.into_iter().enumerate() {
                {
                    let order = recipient.order;
                    let field_count = registry.read().fields_for_recipient(order).count();
                    let placing_here = placement.read().is_placing_for(order);
                    rsx! {
                        div { key: "{order}", class: "recipient-row",
                            span { class: "recipient-order", "{order}." }
                            input {
                                r#type: "text",
                                placeholder: "Full name",
                                value: "{recipient.full_name}",
                                disabled: !editable,
                                oninput: move |evt: Event<FormData>| {
                                    let value = evt.value();
                                    if let Some(r) = recipients.write().get_mut(index) {
                                        r.full_name = value.clone();
                                    }
                                    registry.write().rename_recipient(order, &value);
                                },
                            }
                            input {
                                r#type: "email",
                                placeholder: "email@example.com",
                                value: "{recipient.email}",
                                disabled: !editable,
                                oninput: move |evt: Event<FormData>| {
                                    if let Some(r) = recipients.write().get_mut(index) {
                                        r.email = evt.value();
                                    }
                                },
                            }
                            span { class: "recipient-fields",
                                if field_count == 1 { "1 field" } else { "{field_count} fields" }
                            }
                            button {
                                class: if placing_here { "place-button active" } else { "place-button" },
                                // One pending placement at a time: other rows
                                // lock until this one lands or is cancelled
                                disabled: !editable || (placing && !placing_here),
                                onclick: move |_| {
                                    if placing_here {
                                        placement.write().cancel();
                                    } else {
                                        placement.write().begin(*field_type.read(), order);
                                    }
                                },
                                if placing_here { "Click a page\u{2026}" } else { "Place field" }
                            }
                            button {
                                class: "secondary",
                                disabled: !editable || index == 0,
                                onclick: move |_| move_recipient(index, true),
                                "\u{2191}"
                            }
                            button {
                                class: "secondary",
                                disabled: !editable || index + 1 == count,
                                onclick: move |_| move_recipient(index, false),
                                "\u{2193}"
                            }
                            button {
                                class: "secondary danger",
                                disabled: !editable,
                                onclick: move |_| {
                                    let mut list = recipients.write();
                                    list.retain(|r| r.order != order);
                                    let mapping = renumber_recipients(&mut list);
                                    drop(list);
                                    let mut reg = registry.write();
                                    reg.remove_recipient(order);
                                    reg.remap_recipients(&mapping);
                                    if placement.read().is_placing_for(order) {
                                        placement.write().cancel();
                                    }
                                },
                                "\u{00d7}"
                            }
                        }
                    }
                }
            }

            button {
                disabled: !editable,
                onclick: move |_| {
                    let mut list = recipients.write();
                    let order = list.len() as u32 + 1;
                    list.push(Recipient {
                        email: String::new(),
                        full_name: String::new(),
                        order,
                        signed: false,
                    });
                },
                "+ Add recipient"
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_type_wire_round_trip() {
        for ft in FIELD_TYPES {
            assert_eq!(field_type_from_wire(field_type_wire(ft)), ft);
        }
        // Wire names match the serde representation
        assert_eq!(
            serde_json::to_string(&FieldType::Initial).unwrap(),
            format!("\"{}\"", field_type_wire(FieldType::Initial))
        );
        // Unknown values fall back to signature
        assert_eq!(field_type_from_wire("scribble"), FieldType::Signature);
    }
}
