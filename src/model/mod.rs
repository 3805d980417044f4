//! Entity layer: schema-bound records and the `Model` trait.

pub mod entity;
pub mod record;

pub use entity::{Model, SchemaCell};
pub use record::Record;
