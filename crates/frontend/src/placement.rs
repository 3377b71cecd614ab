use signet_shared::fields::{
    field_label, sanitize_label, FieldId, FieldType, PlacementError, SignatureField,
};
use signet_shared::geometry::{self, NormalizedPosition, PixelPoint, RenderContext};
use signet_shared::models::Recipient;
use signet_shared::registry::FieldRegistry;

/// A requested placement waiting for its page click.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingPlacement {
    pub field_type: FieldType,
    pub recipient_id: u32,
}

/// Page-level placing mode. Exactly one placement may be pending at a time;
/// beginning a new one replaces the previous request.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlacementSession {
    pending: Option<PendingPlacement>,
}

impl PlacementSession {
    pub fn begin(&mut self, field_type: FieldType, recipient_id: u32) {
        self.pending = Some(PendingPlacement {
            field_type,
            recipient_id,
        });
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn pending(&self) -> Option<PendingPlacement> {
        self.pending
    }

    pub fn is_placing(&self) -> bool {
        self.pending.is_some()
    }

    pub fn is_placing_for(&self, recipient_id: u32) -> bool {
        matches!(self.pending, Some(p) if p.recipient_id == recipient_id)
    }

    /// Turn a page click into a new field at the click point, with the
    /// default 160x50 px extent translated through the page's factor.
    ///
    /// `recipient` carries the builder's eligibility check; wizard flows
    /// that place for the current user pass `None`. A `signature` placement
    /// replaces any prior signature field for the same (recipient, document).
    /// The pending slot is cleared on every outcome except a missing slot.
    #[allow(clippy::too_many_arguments)]
    pub fn handle_page_click(
        &mut self,
        click: PixelPoint,
        page: u32,
        document_id: Option<i64>,
        ctx: &RenderContext,
        recipient: Option<&Recipient>,
        editable: bool,
        registry: &mut FieldRegistry,
    ) -> Result<FieldId, PlacementError> {
        let Some(pending) = self.pending else {
            return Err(PlacementError::NothingPending);
        };

        if ctx.page_width_points <= 0.0 {
            // Page still loading; keep the pending request for the next click
            return Err(PlacementError::PageNotMeasured { page });
        }

        if let Some(recipient) = recipient {
            if !recipient.is_complete() {
                self.pending = None;
                return Err(PlacementError::RecipientIncomplete {
                    order: pending.recipient_id,
                });
            }
        }

        let (x, y) = geometry::to_normalized(click, ctx);
        let (width, height) = geometry::default_extent(ctx.scale_factor());
        let position = geometry::clamp_non_negative(NormalizedPosition {
            x,
            y,
            width,
            height,
        });

        let recipient_name = recipient
            .map(|r| sanitize_label(&r.full_name))
            .unwrap_or_default();
        let id = registry.next_id();
        registry.add_replacing_signature(SignatureField {
            id,
            page,
            document_id,
            recipient_id: pending.recipient_id,
            field_type: pending.field_type,
            position,
            required: true,
            name: field_label(pending.field_type, &recipient_name),
            recipient_name,
            signed: false,
            signature_data: None,
            editable,
        });

        self.pending = None;
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn letter_at_600() -> RenderContext {
        RenderContext {
            page_width_points: 612.0,
            page_height_points: 792.0,
            render_width_px: 600.0,
        }
    }

    fn recipient(order: u32, email: &str, name: &str) -> Recipient {
        Recipient {
            email: email.to_string(),
            full_name: name.to_string(),
            order,
            signed: false,
        }
    }

    #[test]
    fn test_place_on_letter_page_at_600px() {
        // 612pt page at 600px render width: scale ~0.980
        let ctx = letter_at_600();
        let mut session = PlacementSession::default();
        let mut registry = FieldRegistry::new();
        let jane = recipient(1, "jane@example.com", "Jane Doe");

        session.begin(FieldType::Signature, 1);
        let id = session
            .handle_page_click(
                PixelPoint { x: 100.0, y: 200.0 },
                1,
                Some(7),
                &ctx,
                Some(&jane),
                false,
                &mut registry,
            )
            .unwrap();

        let field = registry.get(id).unwrap();
        assert_eq!(field.page, 1);
        assert_eq!(field.recipient_id, 1);
        assert!((field.position.x - 102.0).abs() < 1.0);
        assert!((field.position.y - 204.1).abs() < 1.0);
        assert_eq!(field.name, "Signature Jane Doe");
        assert!(field.required);
        // Pending slot cleared after a successful placement
        assert!(!session.is_placing());
    }

    #[test]
    fn test_default_extent_is_160_by_50_pixels() {
        let ctx = letter_at_600();
        let mut session = PlacementSession::default();
        let mut registry = FieldRegistry::new();

        session.begin(FieldType::Signature, 1);
        let id = session
            .handle_page_click(
                PixelPoint { x: 10.0, y: 10.0 },
                1,
                None,
                &ctx,
                None,
                true,
                &mut registry,
            )
            .unwrap();

        let field = registry.get(id).unwrap();
        let scale = ctx.scale_factor();
        assert!((field.position.width * scale - 160.0).abs() < 1e-6);
        assert!((field.position.height * scale - 50.0).abs() < 1e-6);
    }

    #[test]
    fn test_replace_on_reassign_same_pair() {
        let ctx = letter_at_600();
        let mut session = PlacementSession::default();
        let mut registry = FieldRegistry::new();
        let jane = recipient(1, "jane@example.com", "Jane Doe");

        session.begin(FieldType::Signature, 1);
        session
            .handle_page_click(
                PixelPoint { x: 100.0, y: 200.0 },
                1,
                Some(7),
                &ctx,
                Some(&jane),
                false,
                &mut registry,
            )
            .unwrap();
        session.begin(FieldType::Signature, 1);
        session
            .handle_page_click(
                PixelPoint { x: 300.0, y: 400.0 },
                2,
                Some(7),
                &ctx,
                Some(&jane),
                false,
                &mut registry,
            )
            .unwrap();

        assert_eq!(registry.len(), 1);
        let field = &registry.fields()[0];
        assert_eq!(field.page, 2);
        assert!((field.position.x - 306.0).abs() < 1.0);
    }

    #[test]
    fn test_incomplete_recipient_rejected_without_field() {
        let ctx = letter_at_600();
        let mut session = PlacementSession::default();
        let mut registry = FieldRegistry::new();
        let nameless = recipient(1, "jane@example.com", "");

        session.begin(FieldType::Signature, 1);
        let err = session
            .handle_page_click(
                PixelPoint { x: 100.0, y: 200.0 },
                1,
                None,
                &ctx,
                Some(&nameless),
                false,
                &mut registry,
            )
            .unwrap_err();

        assert_eq!(err, PlacementError::RecipientIncomplete { order: 1 });
        assert!(registry.is_empty());
        assert!(!session.is_placing());
    }

    #[test]
    fn test_click_without_pending_is_ignored() {
        let ctx = letter_at_600();
        let mut session = PlacementSession::default();
        let mut registry = FieldRegistry::new();

        let err = session
            .handle_page_click(
                PixelPoint { x: 100.0, y: 200.0 },
                1,
                None,
                &ctx,
                None,
                true,
                &mut registry,
            )
            .unwrap_err();
        assert_eq!(err, PlacementError::NothingPending);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_unmeasured_page_keeps_pending() {
        let ctx = RenderContext {
            page_width_points: 0.0,
            page_height_points: 0.0,
            render_width_px: 600.0,
        };
        let mut session = PlacementSession::default();
        let mut registry = FieldRegistry::new();

        session.begin(FieldType::Signature, 1);
        let err = session
            .handle_page_click(
                PixelPoint { x: 100.0, y: 200.0 },
                3,
                None,
                &ctx,
                None,
                true,
                &mut registry,
            )
            .unwrap_err();
        assert_eq!(err, PlacementError::PageNotMeasured { page: 3 });
        // The request survives for when the page finishes loading
        assert!(session.is_placing());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_begin_replaces_prior_pending() {
        let mut session = PlacementSession::default();
        session.begin(FieldType::Signature, 1);
        session.begin(FieldType::Date, 2);
        let pending = session.pending().unwrap();
        assert_eq!(pending.recipient_id, 2);
        assert_eq!(pending.field_type, FieldType::Date);
        assert!(session.is_placing_for(2));
        assert!(!session.is_placing_for(1));
    }
}
