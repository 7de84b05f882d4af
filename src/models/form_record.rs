use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::RecordKind;
use crate::forms::Record;

/// A sanitized form record as held by the persistence layer.
///
/// `record` contains only schema-declared keys; identity lives beside it,
/// never inside it, so sanitizing a record can never strip its id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub id: Uuid,
    pub kind: RecordKind,
    pub patient_id: Uuid,
    pub record: Record,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}
