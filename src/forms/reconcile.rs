//! Dependent-Field Controller.

use super::record::Record;
use super::schema::FormDefinition;

/// Recompute dependent fields from their triggers.
///
/// Rules run in registration order on the progressively updated record, so a
/// dependent cleared by an upstream rule is seen as cleared by the rules it
/// triggers. Dependents of inactive rules are reset to their kind's empty
/// default; dependents of active rules are left untouched. Rule activity is
/// the one [`FormDefinition::active_rules`] reports for the same input.
/// The input is never mutated, and a record whose inactive dependents are
/// already at default comes back equal to the input.
pub fn reconcile(form: &FormDefinition, input: &Record) -> Record {
    let settled = form.settle(input);
    if settled.cleared > 0 {
        tracing::trace!(form = form.name(), cleared = settled.cleared, "Reset hidden dependent fields");
    }
    settled.record
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::catalog::{antecedent, clinical_exam, driving_experience};
    use crate::forms::record::{get, is_at_default};
    use crate::forms::schema::{Condition, DependencyRule, FieldSpec};
    use serde_json::{json, Value};

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn withdrawn_trigger_clears_the_whole_chain() {
        let form = antecedent::definition().unwrap();
        let input = record(json!({
            "addiction": false,
            "type_addiction": ["TABAGISME", "OTHER"],
            "tabagisme_detail": "10 cigarettes/jour",
            "autre_addiction_detail": "jeux",
        }));
        let out = reconcile(&form, &input);
        assert_eq!(out["type_addiction"], json!([]));
        assert_eq!(out["tabagisme_detail"], json!(""));
        assert_eq!(out["autre_addiction_detail"], json!(""));
        // Input untouched.
        assert_eq!(input["tabagisme_detail"], json!("10 cigarettes/jour"));
    }

    #[test]
    fn active_dependents_are_left_alone() {
        let form = antecedent::definition().unwrap();
        let input = record(json!({
            "addiction": true,
            "type_addiction": ["TABAGISME"],
            "tabagisme_detail": "",
            "autre_addiction_detail": "stale",
        }));
        let out = reconcile(&form, &input);
        assert_eq!(out["tabagisme_detail"], json!(""));
        assert_eq!(out["type_addiction"], json!(["TABAGISME"]));
        // OTHER not selected: its detail is cleared.
        assert_eq!(out["autre_addiction_detail"], json!(""));
    }

    #[test]
    fn inactive_rules_at_default_return_an_equal_record() {
        let form = antecedent::definition().unwrap();
        let input = record(json!({
            "antecedents_medico_chirurgicaux": "RAS",
            "addiction": false,
            "type_addiction": [],
            "tabagisme_detail": "",
            "autre_addiction_detail": "",
            "familial": ["GPAO"],
            "autre_familial_detail": "",
        }));
        assert_eq!(reconcile(&form, &input), input);
    }

    #[test]
    fn absent_multi_choice_dependent_is_written_as_empty_list() {
        let form = antecedent::definition().unwrap();
        let out = reconcile(&form, &record(json!({"addiction": false})));
        assert_eq!(out["type_addiction"], json!([]));
    }

    #[test]
    fn undefined_defaults_remove_the_key() {
        let form = driving_experience::definition().unwrap();
        let input = record(json!({
            "etat_conducteur": "ACTIF",
            "corporel_dommage": false,
            "corporel_dommage_type": "LEGER",
            "nombre_accidents": 0,
            "date_dernier_accident": "2023-05-02",
            "deces_cause": "n/a",
        }));
        let out = reconcile(&form, &input);
        assert!(!out.contains_key("corporel_dommage_type"));
        assert!(!out.contains_key("date_dernier_accident"));
        assert_eq!(out["deces_cause"], json!(""));
    }

    #[test]
    fn nested_dependents_are_cleared_per_eye() {
        let form = clinical_exam::definition().unwrap();
        let input = record(json!({
            "od": {
                "plaintes": {"diplopie": false, "diplopie_type": "MONOCULAIRE"},
                "bp_sg_anterieur": {"transparence": "NORMAL", "quantite_anomalie": "MINIME"},
            },
            "og": {
                "plaintes": {"diplopie": true, "diplopie_type": "BINOCULAIRE"},
            },
        }));
        let out = reconcile(&form, &input);
        let od = &out["od"];
        assert!(od["plaintes"].get("diplopie_type").is_none());
        assert!(od["bp_sg_anterieur"].get("quantite_anomalie").is_none());
        assert_eq!(out["og"]["plaintes"]["diplopie_type"], json!("BINOCULAIRE"));
    }

    #[test]
    fn negated_chained_condition_agrees_with_reported_activity() {
        let fields = vec![
            FieldSpec::boolean("a"),
            FieldSpec::multi_choice("types", &["X", "Y"]),
            FieldSpec::text("detail"),
        ];
        let rules = vec![
            DependencyRule::new("a", Condition::is_true("a"), &["types"], "types?"),
            DependencyRule::new(
                "not_x",
                Condition::Not(Box::new(Condition::contains("types", "X"))),
                &["detail"],
                "detail?",
            ),
        ];
        let form = FormDefinition::new("f", fields, rules).unwrap();
        let input = record(json!({"a": false, "types": ["X"], "detail": "kept"}));

        let out = reconcile(&form, &input);
        let active = form.active_rules(&input);
        assert_eq!(active, vec![false, true]);
        assert_eq!(out["types"], json!([]));
        assert_eq!(out["detail"], json!("kept"));

        // Every rule reported inactive has its dependents at default.
        for (rule, on) in form.rules().iter().zip(&active) {
            for dependent in &rule.dependents {
                let kind = form.field(dependent).unwrap().kind;
                let at_default = is_at_default(kind, get(&out, dependent));
                assert!(*on || at_default, "{dependent} kept while its rule is inactive");
            }
        }
        assert_eq!(form.active_rules(&out), active);
    }
}
