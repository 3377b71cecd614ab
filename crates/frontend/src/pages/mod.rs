pub mod bulk_sign;
pub mod home;
pub mod self_sign;
pub mod sign;
pub mod verify;
pub mod workflow;
