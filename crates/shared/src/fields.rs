use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::NormalizedPosition;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Signature,
    Date,
    Text,
    Checkbox,
    Initial,
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldType::Signature => write!(f, "Signature"),
            FieldType::Date => write!(f, "Date"),
            FieldType::Text => write!(f, "Text"),
            FieldType::Checkbox => write!(f, "Checkbox"),
            FieldType::Initial => write!(f, "Initial"),
        }
    }
}

/// Identity of a field in the registry. Fields loaded from the backend keep
/// their persisted id; fields created in the browser get a session-local
/// counter id until the envelope is saved. Local ids never go on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldId {
    Persisted(i64),
    Local(u64),
}

/// A placed field: one signature/date/text/checkbox/initial region bound to
/// a page, document and recipient.
#[derive(Debug, Clone, PartialEq)]
pub struct SignatureField {
    pub id: FieldId,
    /// 1-based page number within the owning document.
    pub page: u32,
    /// Owning document; `None` for single-document envelopes.
    pub document_id: Option<i64>,
    /// Recipient order number this field belongs to.
    pub recipient_id: u32,
    pub field_type: FieldType,
    pub position: NormalizedPosition,
    pub required: bool,
    pub name: String,
    pub recipient_name: String,
    pub signed: bool,
    /// Data-URL image captured by the signature modal.
    pub signature_data: Option<String>,
    /// Whether the current viewer may fill this field.
    pub editable: bool,
}

/// Partial position update produced by one gesture step. Applying a patch
/// merges the set axes into the existing position and leaves the rest alone.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PositionPatch {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
}

impl PositionPatch {
    pub fn move_to(x: f64, y: f64) -> Self {
        PositionPatch {
            x: Some(x),
            y: Some(y),
            ..Default::default()
        }
    }

    pub fn resize_to(width: f64, height: f64) -> Self {
        PositionPatch {
            width: Some(width),
            height: Some(height),
            ..Default::default()
        }
    }

    pub fn apply(&self, position: &mut NormalizedPosition) {
        if let Some(x) = self.x {
            position.x = x;
        }
        if let Some(y) = self.y {
            position.y = y;
        }
        if let Some(width) = self.width {
            position.width = width;
        }
        if let Some(height) = self.height {
            position.height = height;
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlacementError {
    #[error("recipient {order} needs a name and a valid email before fields can be placed")]
    RecipientIncomplete { order: u32 },
    #[error("no placement is pending")]
    NothingPending,
    #[error("page {page} has not finished loading")]
    PageNotMeasured { page: u32 },
}

/// Strip characters with HTML significance out of a display label. Labels
/// travel into payloads and back onto other viewers' screens.
pub fn sanitize_label(raw: &str) -> String {
    raw.chars()
        .filter(|c| !matches!(c, '<' | '>' | '&' | '"' | '\'') && !c.is_control())
        .collect::<String>()
        .trim()
        .to_string()
}

/// Display label for a field, e.g. `Signature Jane Doe`.
pub fn field_label(field_type: FieldType, recipient_name: &str) -> String {
    let name = sanitize_label(recipient_name);
    if name.is_empty() {
        field_type.to_string()
    } else {
        format!("{field_type} {name}")
    }
}
