use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvelopeStatus {
    Draft,
    Sent,
    Pending,
    Completed,
    Cancelled,
    Expired,
    Purged,
}

impl EnvelopeStatus {
    /// Whether the builder may still edit recipients and fields.
    pub fn is_editable(&self) -> bool {
        matches!(self, EnvelopeStatus::Draft)
    }

    /// Whether the envelope can still collect signatures.
    pub fn is_signable(&self) -> bool {
        matches!(self, EnvelopeStatus::Sent | EnvelopeStatus::Pending)
    }
}

impl std::fmt::Display for EnvelopeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EnvelopeStatus::Draft => write!(f, "Draft"),
            EnvelopeStatus::Sent => write!(f, "Sent"),
            EnvelopeStatus::Pending => write!(f, "Pending"),
            EnvelopeStatus::Completed => write!(f, "Completed"),
            EnvelopeStatus::Cancelled => write!(f, "Cancelled"),
            EnvelopeStatus::Expired => write!(f, "Expired"),
            EnvelopeStatus::Purged => write!(f, "Purged"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowType {
    #[default]
    Sequential,
    Parallel,
}

impl std::fmt::Display for FlowType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FlowType::Sequential => write!(f, "Sequential"),
            FlowType::Parallel => write!(f, "Parallel"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipient {
    pub email: String,
    pub full_name: String,
    /// 1-based signing order.
    pub order: u32,
    #[serde(default)]
    pub signed: bool,
}

impl Recipient {
    /// Placement eligibility: a usable name plus a plausible email address.
    pub fn is_complete(&self) -> bool {
        if self.full_name.trim().is_empty() {
            return false;
        }
        match self.email.split_once('@') {
            Some((local, domain)) => !local.is_empty() && domain.contains('.'),
            None => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvelopeDocument {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub file_url: String,
    #[serde(default)]
    pub page_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub id: i64,
    pub title: String,
    pub status: EnvelopeStatus,
    #[serde(default)]
    pub flow_type: FlowType,
    #[serde(default)]
    pub documents: Vec<EnvelopeDocument>,
    #[serde(default)]
    pub recipients: Vec<Recipient>,
    /// Verification id printed on QR-stamped copies.
    #[serde(default)]
    pub doc_uuid: Option<Uuid>,
}

/// Page number (1-based, within the combined view) where a document starts.
pub fn page_offset(documents: &[EnvelopeDocument], index: usize) -> u32 {
    documents[..index.min(documents.len())]
        .iter()
        .map(|d| d.page_count)
        .sum()
}

/// Total page count of the combined multi-document view.
pub fn total_pages(documents: &[EnvelopeDocument]) -> u32 {
    documents.iter().map(|d| d.page_count).sum()
}

/// Which document a combined 1-based page number falls in.
pub fn document_index_for_page(documents: &[EnvelopeDocument], combined_page: u32) -> usize {
    let mut offset = 0;
    for (index, document) in documents.iter().enumerate() {
        offset += document.page_count;
        if combined_page <= offset {
            return index;
        }
    }
    documents.len().saturating_sub(1)
}

/// Renumber recipients to 1..=n by their current slice order and report the
/// (old_order, new_order) pairs that changed, for field remapping.
pub fn renumber_recipients(recipients: &mut [Recipient]) -> Vec<(u32, u32)> {
    let mut mapping = Vec::new();
    for (index, recipient) in recipients.iter_mut().enumerate() {
        let new_order = index as u32 + 1;
        if recipient.order != new_order {
            mapping.push((recipient.order, new_order));
            recipient.order = new_order;
        }
    }
    mapping
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(id: i64, pages: u32) -> EnvelopeDocument {
        EnvelopeDocument {
            id,
            name: format!("doc-{id}.pdf"),
            file_url: String::new(),
            page_count: pages,
        }
    }

    #[test]
    fn test_recipient_completeness() {
        let mut r = Recipient {
            email: "jane@example.com".to_string(),
            full_name: "Jane Doe".to_string(),
            order: 1,
            signed: false,
        };
        assert!(r.is_complete());
        r.email = "jane@nodot".to_string();
        assert!(!r.is_complete());
        r.email = "@example.com".to_string();
        assert!(!r.is_complete());
        r.email = "jane@example.com".to_string();
        r.full_name = "   ".to_string();
        assert!(!r.is_complete());
    }

    #[test]
    fn test_page_offsets() {
        let docs = vec![doc(1, 3), doc(2, 2), doc(3, 5)];
        assert_eq!(page_offset(&docs, 0), 0);
        assert_eq!(page_offset(&docs, 1), 3);
        assert_eq!(page_offset(&docs, 2), 5);
        assert_eq!(total_pages(&docs), 10);
    }

    #[test]
    fn test_document_index_for_page() {
        let docs = vec![doc(1, 3), doc(2, 2), doc(3, 5)];
        assert_eq!(document_index_for_page(&docs, 1), 0);
        assert_eq!(document_index_for_page(&docs, 3), 0);
        assert_eq!(document_index_for_page(&docs, 4), 1);
        assert_eq!(document_index_for_page(&docs, 5), 1);
        assert_eq!(document_index_for_page(&docs, 6), 2);
        assert_eq!(document_index_for_page(&docs, 10), 2);
        // Past the end clamps to the last document
        assert_eq!(document_index_for_page(&docs, 99), 2);
    }

    #[test]
    fn test_renumber_after_swap() {
        let mut recipients = vec![
            Recipient {
                email: "b@example.com".to_string(),
                full_name: "B".to_string(),
                order: 2,
                signed: false,
            },
            Recipient {
                email: "a@example.com".to_string(),
                full_name: "A".to_string(),
                order: 1,
                signed: false,
            },
        ];
        let mapping = renumber_recipients(&mut recipients);
        assert_eq!(recipients[0].order, 1);
        assert_eq!(recipients[1].order, 2);
        assert_eq!(mapping, vec![(2, 1), (1, 2)]);
    }

    #[test]
    fn test_status_guards() {
        assert!(EnvelopeStatus::Draft.is_editable());
        assert!(!EnvelopeStatus::Sent.is_editable());
        assert!(EnvelopeStatus::Sent.is_signable());
        assert!(EnvelopeStatus::Pending.is_signable());
        assert!(!EnvelopeStatus::Completed.is_signable());
    }

    #[test]
    fn test_envelope_wire_shape() {
        let json = r#"{
            "id": 12,
            "title": "Lease agreement",
            "status": "sent",
            "flow_type": "sequential",
            "documents": [{"id": 7, "name": "lease.pdf", "page_count": 4}],
            "recipients": [{"email": "jane@example.com", "full_name": "Jane Doe", "order": 1}]
        }"#;
        let envelope: Envelope = serde_json::from_str(json).unwrap();
        assert_eq!(envelope.status, EnvelopeStatus::Sent);
        assert_eq!(envelope.flow_type, FlowType::Sequential);
        assert_eq!(envelope.documents[0].page_count, 4);
        assert!(!envelope.recipients[0].signed);
        assert!(envelope.doc_uuid.is_none());
    }
}
