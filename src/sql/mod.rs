//! Schema-derived SQL: field declarations, statement templates, raw clause assembly, parameter binding.

mod builder;
pub mod field;
pub mod params;
pub mod schema;
pub use builder::*;
pub use field::*;
pub use params::*;
pub use schema::*;
