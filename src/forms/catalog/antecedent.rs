//! Medical history: surgical and ophthalmic antecedents, addictions, family history.

use crate::forms::schema::{Condition, DependencyRule, FieldSpec, FormDefinition};
use crate::forms::SchemaConfigurationError;
use crate::models::{AddictionType, FamilialHistory, RecordKind};

pub const TYPE_ADDICTION_MESSAGE: &str = "Veuillez spécifier le type d'addiction.";
pub const TABAGISME_MESSAGE: &str = "Veuillez indiquer les détails pour le tabagisme.";
pub const AUTRE_ADDICTION_MESSAGE: &str = "Veuillez indiquer les détails pour l'autre addiction.";
pub const AUTRE_FAMILIAL_MESSAGE: &str = "Veuillez préciser les autres antécédents familiaux.";

pub fn definition() -> Result<FormDefinition, SchemaConfigurationError> {
    let fields = vec![
        FieldSpec::text("antecedents_medico_chirurgicaux")
            .required()
            .with_message("Antécédents médico-chirurgicaux requis"),
        FieldSpec::text("pathologie_ophtalmologique")
            .required()
            .with_message("Pathologies ophtalmologiques requises"),
        FieldSpec::boolean("addiction"),
        FieldSpec::multi_choice("type_addiction", AddictionType::TOKENS),
        FieldSpec::text("tabagisme_detail").max_length(50),
        FieldSpec::text("autre_addiction_detail").max_length(255),
        FieldSpec::multi_choice("familial", FamilialHistory::TOKENS),
        FieldSpec::text("autre_familial_detail").max_length(255),
    ];

    let rules = vec![
        DependencyRule::new(
            "addiction",
            Condition::is_true("addiction"),
            &["type_addiction"],
            TYPE_ADDICTION_MESSAGE,
        ),
        DependencyRule::new(
            "tabagisme",
            Condition::contains("type_addiction", AddictionType::Tabagisme.as_str()),
            &["tabagisme_detail"],
            TABAGISME_MESSAGE,
        ),
        DependencyRule::new(
            "autre_addiction",
            Condition::contains("type_addiction", AddictionType::Other.as_str()),
            &["autre_addiction_detail"],
            AUTRE_ADDICTION_MESSAGE,
        ),
        DependencyRule::new(
            "autre_familial",
            Condition::contains("familial", FamilialHistory::Other.as_str()),
            &["autre_familial_detail"],
            AUTRE_FAMILIAL_MESSAGE,
        ),
    ];

    FormDefinition::new(RecordKind::Antecedent.as_str(), fields, rules)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::{reconcile, validate, Record};
    use serde_json::{json, Value};

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn registers() {
        let form = definition().unwrap();
        assert_eq!(form.rules().len(), 4);
        assert_eq!(form.rules()[0].name, "addiction");
    }

    #[test]
    fn addiction_scenario() {
        let form = definition().unwrap();
        let mut r = record(json!({
            "antecedents_medico_chirurgicaux": "Appendicectomie",
            "pathologie_ophtalmologique": "Aucune",
            "addiction": true,
            "type_addiction": ["TABAGISME"],
            "tabagisme_detail": "",
            "autre_addiction_detail": "",
        }));

        let errors = validate(&form, &r);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field_key, "tabagisme_detail");
        assert_eq!(errors[0].message, TABAGISME_MESSAGE);

        r.insert("tabagisme_detail".into(), json!("10 cigarettes/jour"));
        assert!(validate(&form, &r).is_empty());

        r.insert("addiction".into(), json!(false));
        let reconciled = reconcile(&form, &r);
        assert_eq!(reconciled["type_addiction"], json!([]));
        assert_eq!(reconciled["tabagisme_detail"], json!(""));
    }

    #[test]
    fn tabagisme_detail_is_capped() {
        let form = definition().unwrap();
        let r = record(json!({
            "antecedents_medico_chirurgicaux": "RAS",
            "pathologie_ophtalmologique": "RAS",
            "addiction": true,
            "type_addiction": ["TABAGISME"],
            "tabagisme_detail": "x".repeat(51),
        }));
        let errors = validate(&form, &r);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field_key, "tabagisme_detail");
    }
}
