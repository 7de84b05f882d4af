use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern.
/// `TOKENS` lists the wire values in declaration order; form schemas use it
/// as the allowed choice set.
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const TOKENS: &'static [&'static str] = &[$($s),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

// ── Records and users ────────────────────────────────────

str_enum!(RecordKind {
    Antecedent => "antecedent",
    ClinicalExam => "clinical_exam",
    TechnicalExam => "technical_exam",
    DrivingExperience => "driving_experience",
});

str_enum!(Role {
    Admin => "admin",
    Assistant => "assistant",
    Technician => "technician",
    Doctor => "doctor",
});

// ── Antecedent ───────────────────────────────────────────

str_enum!(AddictionType {
    Tabagisme => "TABAGISME",
    Alcool => "ALCOOL",
    Telephone => "TELEPHONE",
    Other => "OTHER",
});

str_enum!(FamilialHistory {
    Cecite => "CECITE",
    Gpao => "GPAO",
    Other => "OTHER",
});

// ── Technical exam ───────────────────────────────────────

str_enum!(HypotonisantValue {
    BBloquants => "BBLOQUANTS",
    Iac => "IAC",
    Prostaglandines => "PROSTAGLANDINES",
    Pilocarpine => "PILOCARPINE",
    Autres => "AUTRES",
});

// ── Clinical exam: complaints ────────────────────────────

str_enum!(Symptome {
    Aucun => "AUCUN",
    Bav => "BAV",
    Rougeur => "ROUGEUR",
    Douleur => "DOULEUR",
    Diplopie => "DIPLOPIE",
    Strabisme => "STARBISME",
    Nystagmus => "NYSTAGMUS",
    Ptosis => "PTOSIS",
    Autres => "AUTRES",
});

str_enum!(DiplopieType {
    Monoculaire => "MONOCULAIRE",
    Binoculaire => "BINOCULAIRE",
});

str_enum!(AffectedEye {
    Od => "OD",
    Og => "OG",
    Odg => "ODG",
});

// ── Clinical exam: biomicroscopy ─────────────────────────

str_enum!(Segment {
    Normal => "NORMAL",
    PresenceLesion => "PRESENCE_LESION",
    RemaniementTotal => "REMANIEMENT_TOTAL",
});

str_enum!(Cornee {
    Normal => "NORMAL",
    OpaciteAxe => "OPACITE_AXE",
    OpacitePeripherie => "OPACITE_PERIPHERIE",
    OpaciteTotale => "OPACITE_TOTALE",
    Autre => "AUTRE",
});

str_enum!(ChambreProfondeur {
    Normale => "NORMALE",
    Reduite => "REDUITE",
    Augmentee => "AUGMENTEE",
    Asymetrique => "ASYMETRIQUE",
});

str_enum!(ChambreTransparence {
    Normal => "NORMAL",
    Anormale => "ANORMALE",
});

str_enum!(TypeAnomalie {
    Pigments => "PIGMENTS",
    Hyphema => "HYPHEMA",
    Hypopion => "HYPOPION",
    Autre => "AUTRE",
});

str_enum!(QuantiteAnomalie {
    Minime => "MINIME",
    AtteignantAirPupillaire => "ATTEIGNANT_AIR_PUPILLAIRE",
    RecouvrantPupille => "RECOUVRANT_PUPILLE",
});

str_enum!(Pupille {
    Normal => "NORMAL",
    Myosis => "MYOSIS",
    Mydriase => "MYDRIASE",
});

str_enum!(AxeVisuel {
    Degage => "DEGAGE",
    Obstrue => "OBSTRUE",
    Leucocorie => "LEUCOCORIE",
});

str_enum!(Rpm {
    Normal => "NORMAL",
    Lent => "LENT",
    Aboli => "ABOLI",
});

str_enum!(Iris {
    Normal => "NORMAL",
    Iridodonesis => "IRIDODONESIS",
    Rubeose => "RUBEOSE",
    Synechies => "SYNECHIES",
    Autres => "AUTRES",
});

str_enum!(Cristallin {
    Normal => "NORMAL",
    Opaque => "OPAQUE",
    Colobome => "COLOBOME",
    Aphakie => "APHAKIE",
    Pseudophakie => "PSEUDOPHAKIE",
});

str_enum!(PositionCristallin {
    Normale => "NORMALE",
    Ectopie => "ECTOPIE",
    LuxationAnterieure => "LUXATION_ANTERIEURE",
    LuxationPosterieure => "LUXATION_POSTERIEURE",
});

str_enum!(Vitre {
    Normal => "NORMAL",
    CorpsFlottants => "CORPS_FLOTTANTS",
    Hemorragie => "HEMORRAGIE",
    Hyalite => "HYALITE",
    Pvr => "PVR",
    Autres => "AUTRES",
});

str_enum!(Papille {
    Normale => "NORMALE",
    ExcavationElargie => "EXCAVATION_ELARGIE",
    Atrophie => "ATROPHIE",
    Oedeme => "OEDEME",
    Dysmorphie => "DYSMORPHIE",
    Autres => "AUTRES",
});

str_enum!(Macula {
    Normal => "NORMAL",
    Cicatrice => "CICATRICE",
    Oedeme => "OEDEME",
    Dmla => "DMLA",
});

str_enum!(ChampRetinienPeripherique {
    Normal => "NORMAL",
    Cicatrice => "CICATRICE",
    Oedeme => "OEDEME",
    Hemorragie => "HEMORRAGIE",
    Exudats => "EXUDATS",
    Autre => "AUTRE",
});

str_enum!(Vaisseaux {
    Normaux => "NORMAUX",
    Arteriosclerose => "ARTERIOSCLEROSE",
    Ovr => "OVR",
    Oar => "OAR",
    Neovaisseaux => "NEOVAISSEAUX",
});

// ── Clinical exam: perimetry and conclusion ──────────────

str_enum!(PerimetrieBinoculaire {
    Normal => "NORMAL",
    ScotomeCentral => "SCOTOME_CENTRAL",
    ScotomePeripherique => "SCOTOME_PERIPHERIQUE",
    Amputation => "AMPUTATION",
});

str_enum!(DrivingCompatibility {
    Compatible => "compatible",
    Incompatible => "incompatible",
    ARisque => "a_risque",
});

// ── Driving experience ───────────────────────────────────

str_enum!(EtatConducteur {
    Actif => "ACTIF",
    Inactif => "INACTIF",
    Decede => "DECEDE",
    PerteDeVue => "PERTE_DE_VUE",
});

str_enum!(DommageSeverity {
    Leger => "LEGER",
    Modere => "MODERE",
    Important => "IMPORTANT",
});
