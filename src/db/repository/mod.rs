//! Repository layer: entity-scoped database operations.

mod form_record;

pub use form_record::*;
