//! Technical exam: visual acuity, refraction, ocular tension, pachymetry.

use super::{visite, REQUIRED_VALUE_MESSAGE};
use crate::forms::schema::{Condition, DependencyRule, FieldSpec, FormDefinition};
use crate::forms::SchemaConfigurationError;
use crate::models::{HypotonisantValue, RecordKind};

pub const TTT_HYPOTONISANT_MESSAGE: &str = "Veuillez préciser le traitement hypotonisant.";

const ACUITY_FIELDS: [&str; 6] = ["avsc_od", "avsc_og", "avsc_odg", "avac_od", "avac_og", "avac_odg"];
const REFRACTION_FIELDS: [&str; 6] = ["od_s", "og_s", "od_c", "og_c", "od_a", "og_a"];

pub fn definition() -> Result<FormDefinition, SchemaConfigurationError> {
    let measure = |key: String| FieldSpec::number(key).required().with_message(REQUIRED_VALUE_MESSAGE);
    let mut fields = vec![visite()];

    fields.extend(
        ACUITY_FIELDS
            .iter()
            .map(|name| measure(format!("visual_acuity.{name}")).range(0.0, 13.0)),
    );
    fields.extend(
        REFRACTION_FIELDS
            .iter()
            .map(|name| measure(format!("refraction.{name}")).range(-10.0, 10.0)),
    );
    fields.push(measure("refraction.dp".into()).at_least(0.0));

    fields.extend([
        measure("ocular_tension.od".into()).at_least(0.0),
        measure("ocular_tension.og".into()).at_least(0.0),
        FieldSpec::boolean("ocular_tension.ttt_hypotonisant")
            .required()
            .with_message(REQUIRED_VALUE_MESSAGE),
        FieldSpec::choice("ocular_tension.ttt_hypotonisant_value", HypotonisantValue::TOKENS),
        measure("pachymetry.od".into()).at_least(0.0),
        measure("pachymetry.og".into()).at_least(0.0),
    ]);

    let rules = vec![DependencyRule::new(
        "ttt_hypotonisant",
        Condition::is_true("ocular_tension.ttt_hypotonisant"),
        &["ocular_tension.ttt_hypotonisant_value"],
        TTT_HYPOTONISANT_MESSAGE,
    )];

    FormDefinition::new(RecordKind::TechnicalExam.as_str(), fields, rules)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::catalog::filled;
    use crate::forms::record::set;
    use crate::forms::{sanitize, validate, Record};
    use serde_json::{json, Value};

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    fn keys(form: &FormDefinition, r: &Record) -> Vec<String> {
        validate(form, r).into_iter().map(|e| e.field_key).collect()
    }

    #[test]
    fn empty_exam_reports_every_measurement_in_order() {
        let form = definition().unwrap();
        let errors = validate(&form, &Record::new());
        assert!(errors.iter().all(|e| e.message == REQUIRED_VALUE_MESSAGE));

        let mut expected: Vec<String> = ACUITY_FIELDS
            .iter()
            .map(|name| format!("visual_acuity.{name}"))
            .chain(REFRACTION_FIELDS.iter().map(|name| format!("refraction.{name}")))
            .collect();
        expected.extend(
            [
                "refraction.dp",
                "ocular_tension.od",
                "ocular_tension.og",
                "ocular_tension.ttt_hypotonisant",
                "pachymetry.od",
                "pachymetry.og",
            ]
            .map(String::from),
        );
        assert_eq!(keys(&form, &Record::new()), expected);
    }

    #[test]
    fn treatment_requires_its_value() {
        let form = definition().unwrap();
        let mut r = filled(&form);
        set(&mut r, "ocular_tension.ttt_hypotonisant", json!(true));
        let errors = validate(&form, &r);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field_key, "ocular_tension.ttt_hypotonisant_value");
        assert_eq!(errors[0].message, TTT_HYPOTONISANT_MESSAGE);

        set(&mut r, "ocular_tension.ttt_hypotonisant_value", json!("IAC"));
        assert!(validate(&form, &r).is_empty());
    }

    #[test]
    fn withdrawn_treatment_value_is_dropped() {
        let form = definition().unwrap();
        let clean = sanitize(
            &form,
            &record(json!({"ocular_tension": {
                "ttt_hypotonisant": false,
                "ttt_hypotonisant_value": "IAC",
            }})),
        );
        assert_eq!(clean, record(json!({"ocular_tension": {"ttt_hypotonisant": false}})));
    }

    #[test]
    fn measurements_are_range_checked() {
        let form = definition().unwrap();
        let mut r = filled(&form);
        set(&mut r, "visite", json!(4));
        set(&mut r, "visual_acuity.avsc_od", json!(10));
        set(&mut r, "visual_acuity.avac_odg", json!(14));
        set(&mut r, "refraction.od_s", json!(-10));
        set(&mut r, "refraction.og_c", json!(10.5));
        assert_eq!(keys(&form, &r), ["visite", "visual_acuity.avac_odg", "refraction.og_c"]);
    }
}
