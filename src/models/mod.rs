pub mod enums;
pub mod form_record;

pub use enums::*;
pub use form_record::*;
