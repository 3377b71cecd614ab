use crate::fields::{field_label, FieldId, FieldType, PositionPatch, SignatureField};

/// In-memory collection of placed fields for one envelope.
///
/// The registry owns field identity (local counter ids for unsaved fields)
/// and every mutation the builder and viewers perform: merge-patch position
/// updates from gestures, signature image assignment, recipient rename
/// propagation, recipient removal cascade, and the order remap that keeps
/// fields attached to their recipients across drag-reorder.
#[derive(Debug, Clone, Default)]
pub struct FieldRegistry {
    fields: Vec<SignatureField>,
    next_local: u64,
}

impl FieldRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the registry with fields loaded from a persisted envelope.
    pub fn from_fields(fields: Vec<SignatureField>) -> Self {
        FieldRegistry {
            fields,
            next_local: 0,
        }
    }

    pub fn next_id(&mut self) -> FieldId {
        self.next_local += 1;
        FieldId::Local(self.next_local)
    }

    pub fn add_field(&mut self, field: SignatureField) {
        self.fields.push(field);
    }

    /// Add a field, first dropping any existing `signature`-type field for
    /// the same (recipient, document) pair. Other field types may repeat.
    pub fn add_replacing_signature(&mut self, field: SignatureField) {
        if field.field_type == FieldType::Signature {
            let recipient_id = field.recipient_id;
            let document_id = field.document_id;
            self.fields.retain(|f| {
                !(f.field_type == FieldType::Signature
                    && f.recipient_id == recipient_id
                    && f.document_id == document_id)
            });
        }
        self.fields.push(field);
    }

    pub fn remove_field(&mut self, predicate: impl Fn(&SignatureField) -> bool) {
        self.fields.retain(|f| !predicate(f));
    }

    pub fn remove_by_id(&mut self, id: FieldId) {
        self.fields.retain(|f| f.id != id);
    }

    /// Merge a gesture patch into a field's position. Attributes outside the
    /// patch are untouched.
    pub fn update_position(&mut self, id: FieldId, patch: &PositionPatch) {
        if let Some(field) = self.fields.iter_mut().find(|f| f.id == id) {
            patch.apply(&mut field.position);
        }
    }

    pub fn set_signature(&mut self, id: FieldId, data_url: String) {
        if let Some(field) = self.fields.iter_mut().find(|f| f.id == id) {
            field.signature_data = Some(data_url);
            field.signed = true;
        }
    }

    pub fn clear_signature(&mut self, id: FieldId) {
        if let Some(field) = self.fields.iter_mut().find(|f| f.id == id) {
            field.signature_data = None;
            field.signed = false;
        }
    }

    pub fn get(&self, id: FieldId) -> Option<&SignatureField> {
        self.fields.iter().find(|f| f.id == id)
    }

    pub fn fields(&self) -> &[SignatureField] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn fields_for_page(
        &self,
        document_id: Option<i64>,
        page: u32,
    ) -> impl Iterator<Item = &SignatureField> {
        self.fields
            .iter()
            .filter(move |f| f.document_id == document_id && f.page == page)
    }

    pub fn fields_for_recipient(&self, recipient_id: u32) -> impl Iterator<Item = &SignatureField> {
        self.fields
            .iter()
            .filter(move |f| f.recipient_id == recipient_id)
    }

    pub fn has_field_for_recipient(&self, recipient_id: u32) -> bool {
        self.fields.iter().any(|f| f.recipient_id == recipient_id)
    }

    /// Rename a recipient on every field they own. Positions are untouched.
    pub fn rename_recipient(&mut self, recipient_id: u32, new_name: &str) {
        for field in self
            .fields
            .iter_mut()
            .filter(|f| f.recipient_id == recipient_id)
        {
            field.name = field_label(field.field_type, new_name);
            field.recipient_name = crate::fields::sanitize_label(new_name);
        }
    }

    /// Drop every field owned by a recipient.
    pub fn remove_recipient(&mut self, recipient_id: u32) {
        self.fields.retain(|f| f.recipient_id != recipient_id);
    }

    /// Re-point fields at their recipients' new order numbers after a
    /// reorder. `mapping` holds (old_order, new_order) pairs; fields whose
    /// recipient kept its order are untouched.
    pub fn remap_recipients(&mut self, mapping: &[(u32, u32)]) {
        for field in self.fields.iter_mut() {
            if let Some((_, new_order)) = mapping.iter().find(|(old, _)| *old == field.recipient_id)
            {
                field.recipient_id = *new_order;
            }
        }
    }

    /// Whether every field the current viewer may fill has been signed.
    pub fn all_editable_signed(&self) -> bool {
        self.fields.iter().filter(|f| f.editable).all(|f| f.signed)
    }

    pub fn editable_count(&self) -> usize {
        self.fields.iter().filter(|f| f.editable).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::NormalizedPosition;

    fn field(
        id: FieldId,
        recipient_id: u32,
        document_id: Option<i64>,
        field_type: FieldType,
        x: f64,
    ) -> SignatureField {
        SignatureField {
            id,
            page: 1,
            document_id,
            recipient_id,
            field_type,
            position: NormalizedPosition {
                x,
                y: 40.0,
                width: 160.0,
                height: 50.0,
            },
            required: true,
            name: field_label(field_type, "Jane Doe"),
            recipient_name: "Jane Doe".to_string(),
            signed: false,
            signature_data: None,
            editable: false,
        }
    }

    #[test]
    fn test_local_ids_are_unique() {
        let mut registry = FieldRegistry::new();
        let a = registry.next_id();
        let b = registry.next_id();
        assert_ne!(a, b);
    }

    #[test]
    fn test_replace_on_reassign_keeps_size_one() {
        let mut registry = FieldRegistry::new();
        let first = registry.next_id();
        registry.add_replacing_signature(field(first, 1, Some(7), FieldType::Signature, 10.0));
        assert_eq!(registry.len(), 1);

        let second = registry.next_id();
        registry.add_replacing_signature(field(second, 1, Some(7), FieldType::Signature, 99.0));
        assert_eq!(registry.len(), 1);
        assert!((registry.fields()[0].position.x - 99.0).abs() < 1e-9);
        assert_eq!(registry.fields()[0].id, second);
    }

    #[test]
    fn test_replace_scoped_to_document_and_recipient() {
        let mut registry = FieldRegistry::new();
        let a = registry.next_id();
        registry.add_replacing_signature(field(a, 1, Some(7), FieldType::Signature, 10.0));
        let b = registry.next_id();
        registry.add_replacing_signature(field(b, 2, Some(7), FieldType::Signature, 20.0));
        let c = registry.next_id();
        registry.add_replacing_signature(field(c, 1, Some(8), FieldType::Signature, 30.0));
        // Different recipient or document: nothing replaced
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_non_signature_types_may_repeat() {
        let mut registry = FieldRegistry::new();
        let a = registry.next_id();
        registry.add_replacing_signature(field(a, 1, Some(7), FieldType::Date, 10.0));
        let b = registry.next_id();
        registry.add_replacing_signature(field(b, 1, Some(7), FieldType::Date, 20.0));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_update_position_merges() {
        let mut registry = FieldRegistry::new();
        let id = registry.next_id();
        registry.add_field(field(id, 1, None, FieldType::Signature, 10.0));

        registry.update_position(id, &PositionPatch::move_to(55.0, 66.0));
        let f = registry.get(id).unwrap();
        assert!((f.position.x - 55.0).abs() < 1e-9);
        assert!((f.position.y - 66.0).abs() < 1e-9);
        // Extent survives a move patch
        assert!((f.position.width - 160.0).abs() < 1e-9);
        assert!((f.position.height - 50.0).abs() < 1e-9);

        registry.update_position(id, &PositionPatch::resize_to(210.0, 75.0));
        let f = registry.get(id).unwrap();
        assert!((f.position.x - 55.0).abs() < 1e-9);
        assert!((f.position.width - 210.0).abs() < 1e-9);
    }

    #[test]
    fn test_rename_propagates_without_moving() {
        let mut registry = FieldRegistry::new();
        let id = registry.next_id();
        registry.add_field(field(id, 1, None, FieldType::Signature, 10.0));
        let other = registry.next_id();
        registry.add_field(field(other, 2, None, FieldType::Signature, 20.0));

        registry.rename_recipient(1, "John Smith");
        let f = registry.get(id).unwrap();
        assert_eq!(f.name, "Signature John Smith");
        assert_eq!(f.recipient_name, "John Smith");
        assert!((f.position.x - 10.0).abs() < 1e-9);
        // Other recipients keep their labels
        assert_eq!(registry.get(other).unwrap().recipient_name, "Jane Doe");
    }

    #[test]
    fn test_remove_recipient_cascades() {
        let mut registry = FieldRegistry::new();
        let a = registry.next_id();
        registry.add_field(field(a, 1, None, FieldType::Signature, 10.0));
        let b = registry.next_id();
        registry.add_field(field(b, 1, None, FieldType::Date, 20.0));
        let c = registry.next_id();
        registry.add_field(field(c, 2, None, FieldType::Signature, 30.0));

        registry.remove_recipient(1);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.fields()[0].recipient_id, 2);
    }

    #[test]
    fn test_reorder_remaps_recipient_ids() {
        let mut registry = FieldRegistry::new();
        let id = registry.next_id();
        registry.add_field(field(id, 2, None, FieldType::Signature, 10.0));

        // B moves from order 2 to order 1, A from 1 to 2
        registry.remap_recipients(&[(2, 1), (1, 2)]);
        assert_eq!(registry.get(id).unwrap().recipient_id, 1);
    }

    #[test]
    fn test_fields_for_page_filters_by_document() {
        let mut registry = FieldRegistry::new();
        let a = registry.next_id();
        registry.add_field(field(a, 1, Some(7), FieldType::Signature, 10.0));
        let b = registry.next_id();
        registry.add_field(field(b, 1, Some(8), FieldType::Signature, 20.0));
        let mut on_doc_seven = registry.fields_for_page(Some(7), 1);
        assert_eq!(on_doc_seven.next().unwrap().id, a);
        assert!(on_doc_seven.next().is_none());
    }

    #[test]
    fn test_all_editable_signed() {
        let mut registry = FieldRegistry::new();
        let a = registry.next_id();
        let mut mine = field(a, 1, None, FieldType::Signature, 10.0);
        mine.editable = true;
        registry.add_field(mine);
        let b = registry.next_id();
        registry.add_field(field(b, 2, None, FieldType::Signature, 20.0));

        assert!(!registry.all_editable_signed());
        registry.set_signature(a, "data:image/png;base64,AAAA".to_string());
        assert!(registry.all_editable_signed());
        assert!(registry.get(a).unwrap().signed);

        registry.clear_signature(a);
        assert!(!registry.all_editable_signed());
        assert!(registry.get(a).unwrap().signature_data.is_none());
    }
}
