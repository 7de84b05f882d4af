//! Clinical exam: per-eye complaints and biomicroscopy, binocular perimetry,
//! driving-fitness conclusion.

use super::{visite, REQUIRED_VALUE_MESSAGE};
use crate::forms::schema::{Condition, DependencyRule, FieldSpec, FormDefinition};
use crate::forms::SchemaConfigurationError;
use crate::models::*;

pub const EYES: [&str; 2] = ["od", "og"];

/// Complaint booleans and the detail field each one opens.
const SYMPTOM_DETAILS: [(&str, &str, &str); 4] = [
    ("diplopie", "diplopie_type", "Veuillez préciser le type de diplopie."),
    ("strabisme", "strabisme_eye", "Veuillez préciser l'œil affecté par le strabisme."),
    ("nystagmus", "nystagmus_eye", "Veuillez préciser l'œil affecté par le nystagmus."),
    ("ptosis", "ptosis_eye", "Veuillez préciser l'œil affecté par le ptosis."),
];

pub const TRANSPARENCE_MESSAGE: &str = "Veuillez préciser l'anomalie de transparence.";

pub fn definition() -> Result<FormDefinition, SchemaConfigurationError> {
    let mut fields = vec![visite().required()];
    let mut rules = Vec::new();

    for eye in EYES {
        fields.extend(eye_fields(eye));
        rules.extend(eye_rules(eye));
    }
    fields.extend(perimetry_fields());
    fields.extend(conclusion_fields());

    FormDefinition::new(RecordKind::ClinicalExam.as_str(), fields, rules)
}

fn eye_fields(eye: &str) -> Vec<FieldSpec> {
    let plaintes = |name: &str| format!("{eye}.plaintes.{name}");
    let anterieur = |name: &str| format!("{eye}.bp_sg_anterieur.{name}");
    let posterieur = |name: &str| format!("{eye}.bp_sg_posterieur.{name}");
    let finding = |key: String, tokens: &[&str]| required(FieldSpec::choice(key, tokens));

    let mut fields = vec![finding(plaintes("eye_symptom"), Symptome::TOKENS)];
    for (trigger, detail, _) in SYMPTOM_DETAILS {
        fields.push(required(FieldSpec::boolean(plaintes(trigger))));
        let detail_tokens = if detail == "diplopie_type" {
            DiplopieType::TOKENS
        } else {
            AffectedEye::TOKENS
        };
        fields.push(FieldSpec::choice(plaintes(detail), detail_tokens));
    }

    fields.extend([
        finding(anterieur("segment"), Segment::TOKENS),
        finding(anterieur("cornee"), Cornee::TOKENS),
        finding(anterieur("profondeur"), ChambreProfondeur::TOKENS),
        finding(anterieur("transparence"), ChambreTransparence::TOKENS),
        FieldSpec::choice(anterieur("type_anomalie_value"), TypeAnomalie::TOKENS),
        FieldSpec::choice(anterieur("quantite_anomalie"), QuantiteAnomalie::TOKENS),
        finding(anterieur("pupille"), Pupille::TOKENS),
        finding(anterieur("axe_visuel"), AxeVisuel::TOKENS),
        finding(anterieur("rpm"), Rpm::TOKENS),
        finding(anterieur("iris"), Iris::TOKENS),
        finding(anterieur("cristallin"), Cristallin::TOKENS),
        finding(anterieur("position_cristallin"), PositionCristallin::TOKENS),
        finding(posterieur("segment"), Segment::TOKENS),
        finding(posterieur("vitre"), Vitre::TOKENS),
        required(FieldSpec::number(posterieur("retine"))),
        finding(posterieur("papille"), Papille::TOKENS),
        finding(posterieur("macula"), Macula::TOKENS),
        finding(posterieur("retinien_peripherique"), ChampRetinienPeripherique::TOKENS),
        finding(posterieur("vaissaux"), Vaisseaux::TOKENS),
    ]);
    fields
}

fn required(field: FieldSpec) -> FieldSpec {
    field.required().with_message(REQUIRED_VALUE_MESSAGE)
}

fn eye_rules(eye: &str) -> Vec<DependencyRule> {
    let mut rules: Vec<DependencyRule> = SYMPTOM_DETAILS
        .iter()
        .map(|(trigger, detail, message)| {
            let dependent = format!("{eye}.plaintes.{detail}");
            DependencyRule::new(
                format!("{eye}.{trigger}"),
                Condition::is_true(format!("{eye}.plaintes.{trigger}")),
                &[dependent.as_str()],
                *message,
            )
        })
        .collect();

    let type_anomalie = format!("{eye}.bp_sg_anterieur.type_anomalie_value");
    let quantite = format!("{eye}.bp_sg_anterieur.quantite_anomalie");
    rules.push(DependencyRule::new(
        format!("{eye}.transparence"),
        Condition::equals(
            format!("{eye}.bp_sg_anterieur.transparence"),
            ChambreTransparence::Anormale.as_str(),
        ),
        &[type_anomalie.as_str(), quantite.as_str()],
        TRANSPARENCE_MESSAGE,
    ));
    rules
}

fn perimetry_fields() -> Vec<FieldSpec> {
    let limit = |key: &str, max: f64| required(FieldSpec::number(key)).range_above(0.0, max);
    vec![
        required(FieldSpec::choice("perimetry.pbo", PerimetrieBinoculaire::TOKENS)),
        limit("perimetry.limite_superieure", 90.0),
        limit("perimetry.limite_inferieure", 90.0),
        limit("perimetry.limite_temporale_droit", 120.0),
        limit("perimetry.limite_temporale_gauche", 120.0),
        limit("perimetry.limite_horizontal", 180.0),
        limit("perimetry.score_esternmen", 100.0),
    ]
}

fn conclusion_fields() -> Vec<FieldSpec> {
    vec![
        FieldSpec::choice("conclusion.vision", DrivingCompatibility::TOKENS),
        FieldSpec::text("conclusion.cat"),
        FieldSpec::text("conclusion.traitement"),
        FieldSpec::text("conclusion.observation"),
        required(FieldSpec::boolean("conclusion.rv")),
    ]
}
