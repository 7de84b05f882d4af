//! Concrete form bindings: one {fields, rules} pair per record kind.

pub mod antecedent;
pub mod clinical_exam;
pub mod driving_experience;
pub mod technical_exam;

use std::sync::Arc;

use super::schema::{FieldSpec, FormDefinition};
use super::SchemaConfigurationError;
use crate::models::RecordKind;

/// Every form schema, registered once at startup.
#[derive(Debug, Clone)]
pub struct FormCatalog {
    antecedent: Arc<FormDefinition>,
    clinical_exam: Arc<FormDefinition>,
    technical_exam: Arc<FormDefinition>,
    driving_experience: Arc<FormDefinition>,
}

impl FormCatalog {
    /// Register all four schemas, failing on the first misconfiguration.
    pub fn load() -> Result<Self, SchemaConfigurationError> {
        let catalog = Self {
            antecedent: Arc::new(antecedent::definition()?),
            clinical_exam: Arc::new(clinical_exam::definition()?),
            technical_exam: Arc::new(technical_exam::definition()?),
            driving_experience: Arc::new(driving_experience::definition()?),
        };
        tracing::info!("Form catalog loaded");
        Ok(catalog)
    }

    pub fn get(&self, kind: RecordKind) -> Arc<FormDefinition> {
        let definition = match kind {
            RecordKind::Antecedent => &self.antecedent,
            RecordKind::ClinicalExam => &self.clinical_exam,
            RecordKind::TechnicalExam => &self.technical_exam,
            RecordKind::DrivingExperience => &self.driving_experience,
        };
        Arc::clone(definition)
    }
}

/// Message for exam measurements and findings left blank.
pub const REQUIRED_VALUE_MESSAGE: &str = "Valeur requise";

/// Visit number shared by exams and questionnaires (1 to 3 per file).
pub(crate) fn visite() -> FieldSpec {
    FieldSpec::number("visite")
        .range(1.0, 3.0)
        .integer()
        .with_message("Numéro de visite requis")
}

/// A record with every always-required field set to a valid value.
#[cfg(test)]
pub(crate) fn filled(form: &FormDefinition) -> super::Record {
    use super::record;
    use super::schema::{FieldKind, Requirement};
    use serde_json::json;

    let mut r = super::Record::new();
    for field in form.fields() {
        if !matches!(field.required, Requirement::Always) {
            continue;
        }
        let value = match field.kind {
            FieldKind::Enum => json!(field.enum_values[0]),
            FieldKind::MultiEnum => json!([field.enum_values[0]]),
            FieldKind::Number => json!(1),
            FieldKind::Boolean => json!(false),
            FieldKind::Date => json!("2024-03-12"),
            FieldKind::Text => json!("RAS"),
        };
        record::set(&mut r, &field.key, value);
    }
    r
}
