pub mod fields;
pub mod geometry;
pub mod models;
pub mod registry;
