//! Driving-experience questionnaire.

use super::visite;
use crate::forms::schema::{Condition, DependencyRule, FieldSpec, FormDefinition};
use crate::forms::SchemaConfigurationError;
use crate::models::{DommageSeverity, EtatConducteur, RecordKind};

pub const DECES_CAUSE_MESSAGE: &str = "Cause du décès requise";
pub const INACTIF_CAUSE_MESSAGE: &str = "Cause de l'inactivité requise";
pub const CORPOREL_DOMMAGE_MESSAGE: &str = "Type de dommage corporel requis";
pub const MATERIEL_DOMMAGE_MESSAGE: &str = "Type de dommage matériel requis";
pub const DERNIER_ACCIDENT_MESSAGE: &str = "Date du dernier accident requise";

pub fn definition() -> Result<FormDefinition, SchemaConfigurationError> {
    let fields = vec![
        visite(),
        FieldSpec::choice("etat_conducteur", EtatConducteur::TOKENS)
            .required()
            .with_message("État du conducteur requis"),
        FieldSpec::text("deces_cause"),
        FieldSpec::text("inactif_cause"),
        FieldSpec::number("km_parcourus").at_least(0.0),
        FieldSpec::number("nombre_accidents").at_least(0.0).integer(),
        FieldSpec::text("tranche_horaire"),
        FieldSpec::boolean("corporel_dommage"),
        FieldSpec::choice("corporel_dommage_type", DommageSeverity::TOKENS),
        FieldSpec::boolean("materiel_dommage"),
        FieldSpec::choice("materiel_dommage_type", DommageSeverity::TOKENS),
        FieldSpec::date("date_visite"),
        FieldSpec::date("date_dernier_accident"),
    ];

    let rules = vec![
        DependencyRule::new(
            "deces",
            Condition::equals("etat_conducteur", EtatConducteur::Decede.as_str()),
            &["deces_cause"],
            DECES_CAUSE_MESSAGE,
        ),
        DependencyRule::new(
            "inactif",
            Condition::equals("etat_conducteur", EtatConducteur::Inactif.as_str()),
            &["inactif_cause"],
            INACTIF_CAUSE_MESSAGE,
        ),
        DependencyRule::new(
            "corporel_dommage",
            Condition::is_true("corporel_dommage"),
            &["corporel_dommage_type"],
            CORPOREL_DOMMAGE_MESSAGE,
        ),
        DependencyRule::new(
            "materiel_dommage",
            Condition::is_true("materiel_dommage"),
            &["materiel_dommage_type"],
            MATERIEL_DOMMAGE_MESSAGE,
        ),
        DependencyRule::new(
            "dernier_accident",
            Condition::greater_than("nombre_accidents", 0.0),
            &["date_dernier_accident"],
            DERNIER_ACCIDENT_MESSAGE,
        ),
    ];

    FormDefinition::new(RecordKind::DrivingExperience.as_str(), fields, rules)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::{sanitize, validate, Record, ValidationError};
    use serde_json::{json, Value};

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn driver_state_selects_the_cause_field() {
        let form = definition().unwrap();
        assert_eq!(
            validate(&form, &record(json!({"etat_conducteur": "DECEDE"}))),
            vec![ValidationError::new("deces_cause", DECES_CAUSE_MESSAGE)]
        );
        assert_eq!(
            validate(&form, &record(json!({"etat_conducteur": "INACTIF", "inactif_cause": "  "}))),
            vec![ValidationError::new("inactif_cause", INACTIF_CAUSE_MESSAGE)]
        );
        assert!(validate(&form, &record(json!({"etat_conducteur": "ACTIF"}))).is_empty());
    }

    #[test]
    fn damages_and_accidents_require_details() {
        let form = definition().unwrap();
        let r = record(json!({
            "etat_conducteur": "ACTIF",
            "nombre_accidents": 2,
            "corporel_dommage": true,
            "materiel_dommage": true,
            "materiel_dommage_type": "MODERE",
        }));
        let keys: Vec<String> = validate(&form, &r).into_iter().map(|e| e.field_key).collect();
        assert_eq!(keys, ["corporel_dommage_type", "date_dernier_accident"]);
    }

    #[test]
    fn changing_state_clears_stale_cause() {
        let form = definition().unwrap();
        let clean = sanitize(
            &form,
            &record(json!({
                "etat_conducteur": "ACTIF",
                "deces_cause": "accident",
                "inactif_cause": "retraite",
                "nombre_accidents": 0,
                "date_dernier_accident": "2020-01-01",
            })),
        );
        assert_eq!(clean["deces_cause"], json!(""));
        assert_eq!(clean["inactif_cause"], json!(""));
        assert!(!clean.contains_key("date_dernier_accident"));
        assert!(validate(&form, &clean).is_empty());
    }

    #[test]
    fn required_driver_state_and_date_format() {
        let form = definition().unwrap();
        let errors = validate(&form, &record(json!({"date_visite": "2024-13-01"})));
        let keys: Vec<&str> = errors.iter().map(|e| e.field_key.as_str()).collect();
        assert_eq!(keys, ["etat_conducteur", "date_visite"]);
    }
}
