pub mod field_overlay;
pub mod otp_panel;
pub mod page_view;
pub mod recipient_panel;
pub mod signature_modal;
