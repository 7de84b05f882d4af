//! Submission Sanitizer: the only path from an edit buffer to storage.

use serde_json::Value;

use super::reconcile::reconcile;
use super::record::{self, Record};
use super::schema::FormDefinition;

/// Reconcile, then keep only declared fields.
///
/// Idempotent: sanitizing a sanitized record returns an equal record.
pub fn sanitize(form: &FormDefinition, input: &Record) -> Record {
    let reconciled = reconcile(form, input);

    let mut clean = Record::new();
    for field in form.fields() {
        if let Some(value) = record::get(&reconciled, &field.key) {
            record::set(&mut clean, &field.key, value.clone());
        }
    }

    let stripped = count_leaves(&reconciled).saturating_sub(count_leaves(&clean));
    if stripped > 0 {
        // Counts only; record contents never reach the logs.
        tracing::warn!(form = form.name(), stripped, "Stripped undeclared keys from record");
    }
    clean
}

fn count_leaves(record: &Record) -> usize {
    record
        .values()
        .map(|v| match v {
            Value::Object(child) if !child.is_empty() => count_leaves(child),
            _ => 1,
        })
        .sum()
}
