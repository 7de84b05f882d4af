//! Form schemas: field specs, dependency rules, and registration.
//!
//! A [`FormDefinition`] is the registered pair {fields, rules}. Registration
//! rejects misconfigured schemas (unknown keys, shared dependents, cycles)
//! and fixes the order in which rules are applied, so validation,
//! reconciliation and sanitization never see an inconsistent schema.

use std::collections::{BTreeSet, HashMap, HashSet};

use serde::Serialize;
use serde_json::Value;

use super::record::{self, Record, PATH_SEPARATOR};
use super::SchemaConfigurationError;

/// Message used when a required field has no schema-specific message.
pub const DEFAULT_REQUIRED_MESSAGE: &str = "This field is required.";

// ═══════════════════════════════════════════════════════════
// Field specs
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Number,
    Boolean,
    Enum,
    MultiEnum,
    Date,
}

impl FieldKind {
    /// Value a hidden dependent is reset to. `None` means the key is removed.
    pub fn empty_default(self) -> Option<Value> {
        match self {
            Self::Text => Some(Value::String(String::new())),
            Self::MultiEnum => Some(Value::Array(Vec::new())),
            Self::Boolean => Some(Value::Bool(false)),
            Self::Number | Self::Enum | Self::Date => None,
        }
    }
}

/// Base requiredness of a field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Requirement {
    Optional,
    Always,
    When(Condition),
}

impl Requirement {
    pub fn applies(&self, record: &Record) -> bool {
        match self {
            Self::Optional => false,
            Self::Always => true,
            Self::When(condition) => condition.evaluate(record),
        }
    }
}

/// Value constraint checked on non-empty values.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Constraint {
    /// Inclusive `max`; `min` is exclusive when `min_exclusive` is set.
    Range {
        min: Option<f64>,
        max: Option<f64>,
        min_exclusive: bool,
    },
    Integer,
    MaxLength(usize),
}

/// One form field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldSpec {
    pub key: String,
    pub kind: FieldKind,
    pub required: Requirement,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub constraints: Vec<Constraint>,
    pub message: String,
}

impl FieldSpec {
    fn new(key: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            key: key.into(),
            kind,
            required: Requirement::Optional,
            enum_values: Vec::new(),
            constraints: Vec::new(),
            message: DEFAULT_REQUIRED_MESSAGE.to_string(),
        }
    }

    pub fn text(key: impl Into<String>) -> Self {
        Self::new(key, FieldKind::Text)
    }

    pub fn number(key: impl Into<String>) -> Self {
        Self::new(key, FieldKind::Number)
    }

    pub fn boolean(key: impl Into<String>) -> Self {
        Self::new(key, FieldKind::Boolean)
    }

    pub fn date(key: impl Into<String>) -> Self {
        Self::new(key, FieldKind::Date)
    }

    pub fn choice(key: impl Into<String>, tokens: &[&str]) -> Self {
        let mut spec = Self::new(key, FieldKind::Enum);
        spec.enum_values = tokens.iter().map(|t| t.to_string()).collect();
        spec
    }

    pub fn multi_choice(key: impl Into<String>, tokens: &[&str]) -> Self {
        let mut spec = Self::new(key, FieldKind::MultiEnum);
        spec.enum_values = tokens.iter().map(|t| t.to_string()).collect();
        spec
    }

    pub fn required(mut self) -> Self {
        self.required = Requirement::Always;
        self
    }

    pub fn required_when(mut self, condition: Condition) -> Self {
        self.required = Requirement::When(condition);
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Inclusive range.
    pub fn range(mut self, min: f64, max: f64) -> Self {
        self.constraints.push(Constraint::Range {
            min: Some(min),
            max: Some(max),
            min_exclusive: false,
        });
        self
    }

    /// `min < value <= max`.
    pub fn range_above(mut self, min: f64, max: f64) -> Self {
        self.constraints.push(Constraint::Range {
            min: Some(min),
            max: Some(max),
            min_exclusive: true,
        });
        self
    }

    pub fn at_least(mut self, min: f64) -> Self {
        self.constraints.push(Constraint::Range {
            min: Some(min),
            max: None,
            min_exclusive: false,
        });
        self
    }

    pub fn integer(mut self) -> Self {
        self.constraints.push(Constraint::Integer);
        self
    }

    pub fn max_length(mut self, max: usize) -> Self {
        self.constraints.push(Constraint::MaxLength(max));
        self
    }

    pub fn allows_token(&self, token: &str) -> bool {
        self.enum_values.iter().any(|v| v == token)
    }
}

// ═══════════════════════════════════════════════════════════
// Conditions
// ═══════════════════════════════════════════════════════════

/// Pure predicate over a record snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    /// Boolean field is `true`.
    IsTrue(String),
    /// Single-choice field equals the token.
    Equals(String, String),
    /// Multi-choice field contains the token.
    Contains(String, String),
    /// Number field is strictly greater than the bound.
    GreaterThan(String, f64),
    All(Vec<Condition>),
    Any(Vec<Condition>),
    Not(Box<Condition>),
}

impl Condition {
    pub fn is_true(key: impl Into<String>) -> Self {
        Self::IsTrue(key.into())
    }

    pub fn equals(key: impl Into<String>, token: impl Into<String>) -> Self {
        Self::Equals(key.into(), token.into())
    }

    pub fn contains(key: impl Into<String>, token: impl Into<String>) -> Self {
        Self::Contains(key.into(), token.into())
    }

    pub fn greater_than(key: impl Into<String>, bound: f64) -> Self {
        Self::GreaterThan(key.into(), bound)
    }

    pub fn evaluate(&self, record: &Record) -> bool {
        match self {
            Self::IsTrue(key) => record::get(record, key) == Some(&Value::Bool(true)),
            Self::Equals(key, token) => {
                record::get(record, key).and_then(Value::as_str) == Some(token.as_str())
            }
            Self::Contains(key, token) => record::get(record, key)
                .and_then(Value::as_array)
                .is_some_and(|items| items.iter().any(|v| v.as_str() == Some(token.as_str()))),
            Self::GreaterThan(key, bound) => record::get(record, key)
                .and_then(Value::as_f64)
                .is_some_and(|n| n > *bound),
            Self::All(conditions) => conditions.iter().all(|c| c.evaluate(record)),
            Self::Any(conditions) => conditions.iter().any(|c| c.evaluate(record)),
            Self::Not(inner) => !inner.evaluate(record),
        }
    }

    /// Field keys inspected by this condition, in first-seen order.
    pub fn fields(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_fields(&mut out);
        out
    }

    fn collect_fields<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::IsTrue(key)
            | Self::Equals(key, _)
            | Self::Contains(key, _)
            | Self::GreaterThan(key, _) => {
                if !out.contains(&key.as_str()) {
                    out.push(key);
                }
            }
            Self::All(conditions) | Self::Any(conditions) => {
                for c in conditions {
                    c.collect_fields(out);
                }
            }
            Self::Not(inner) => inner.collect_fields(out),
        }
    }

    /// Check each leaf against the kind (and choices) of the field it reads.
    fn check_against<'f>(
        &self,
        rule: &str,
        lookup: &dyn Fn(&str) -> Option<&'f FieldSpec>,
    ) -> Result<(), SchemaConfigurationError> {
        let unknown = |key: &str| SchemaConfigurationError::UnknownField {
            rule: rule.to_string(),
            field: key.to_string(),
        };
        let mismatch = |key: &str| SchemaConfigurationError::ConditionKindMismatch {
            rule: rule.to_string(),
            field: key.to_string(),
        };
        let check_token = |spec: &FieldSpec, token: &str| {
            if spec.allows_token(token) {
                Ok(())
            } else {
                Err(SchemaConfigurationError::UnknownToken {
                    field: spec.key.clone(),
                    token: token.to_string(),
                })
            }
        };

        match self {
            Self::IsTrue(key) => {
                let spec = lookup(key.as_str()).ok_or_else(|| unknown(key.as_str()))?;
                if spec.kind != FieldKind::Boolean {
                    return Err(mismatch(key.as_str()));
                }
            }
            Self::Equals(key, token) => {
                let spec = lookup(key.as_str()).ok_or_else(|| unknown(key.as_str()))?;
                if spec.kind != FieldKind::Enum {
                    return Err(mismatch(key.as_str()));
                }
                check_token(spec, token)?;
            }
            Self::Contains(key, token) => {
                let spec = lookup(key.as_str()).ok_or_else(|| unknown(key.as_str()))?;
                if spec.kind != FieldKind::MultiEnum {
                    return Err(mismatch(key.as_str()));
                }
                check_token(spec, token)?;
            }
            Self::GreaterThan(key, _) => {
                let spec = lookup(key.as_str()).ok_or_else(|| unknown(key.as_str()))?;
                if spec.kind != FieldKind::Number {
                    return Err(mismatch(key.as_str()));
                }
            }
            Self::All(conditions) | Self::Any(conditions) => {
                for c in conditions {
                    c.check_against(rule, lookup)?;
                }
            }
            Self::Not(inner) => inner.check_against(rule, lookup)?,
        }
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════
// Dependency rules
// ═══════════════════════════════════════════════════════════

/// Trigger fields controlling dependent fields.
///
/// While `condition` holds, every dependent is required (with `message`);
/// otherwise every dependent is reset to its kind's empty default.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DependencyRule {
    pub name: String,
    triggers: Vec<String>,
    pub condition: Condition,
    pub dependents: Vec<String>,
    pub message: String,
}

impl DependencyRule {
    pub fn new(
        name: impl Into<String>,
        condition: Condition,
        dependents: &[&str],
        message: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            triggers: condition.fields().into_iter().map(str::to_string).collect(),
            condition,
            dependents: dependents.iter().map(|d| d.to_string()).collect(),
            message: message.into(),
        }
    }

    /// Fields read by the condition.
    pub fn triggers(&self) -> &[String] {
        &self.triggers
    }

    /// Whether the condition holds on `record` as given.
    pub fn is_active(&self, record: &Record) -> bool {
        self.condition.evaluate(record)
    }
}

// ═══════════════════════════════════════════════════════════
// Registration
// ═══════════════════════════════════════════════════════════

/// A registered schema: fields in declaration order, rules in application order.
#[derive(Debug, Clone)]
pub struct FormDefinition {
    name: String,
    fields: Vec<FieldSpec>,
    rules: Vec<DependencyRule>,
    field_index: HashMap<String, usize>,
    /// Dependent key → index (into `rules`) of the rule that owns it.
    owners: HashMap<String, usize>,
}

impl FormDefinition {
    /// Register a schema, failing fast on misconfiguration.
    pub fn new(
        name: impl Into<String>,
        fields: Vec<FieldSpec>,
        rules: Vec<DependencyRule>,
    ) -> Result<Self, SchemaConfigurationError> {
        let name = name.into();
        let field_index = index_fields(&fields)?;
        let lookup = |key: &str| field_index.get(key).map(|&i| &fields[i]);

        for field in &fields {
            if let Requirement::When(condition) = &field.required {
                condition.check_against(&field.key, &lookup)?;
            }
        }

        let mut rules = rules;
        for rule in &mut rules {
            rule.triggers = rule.condition.fields().into_iter().map(str::to_string).collect();
        }

        let mut claimed: HashMap<&str, &str> = HashMap::new();
        for rule in &rules {
            if rule.dependents.is_empty() {
                return Err(SchemaConfigurationError::EmptyRule(rule.name.clone()));
            }
            rule.condition.check_against(&rule.name, &lookup)?;
            for dependent in &rule.dependents {
                if lookup(dependent.as_str()).is_none() {
                    return Err(SchemaConfigurationError::UnknownField {
                        rule: rule.name.clone(),
                        field: dependent.clone(),
                    });
                }
                if let Some(first) = claimed.insert(dependent.as_str(), rule.name.as_str()) {
                    return Err(SchemaConfigurationError::SharedDependent {
                        field: dependent.clone(),
                        first_rule: first.to_string(),
                        second_rule: rule.name.clone(),
                    });
                }
            }
        }

        let order = application_order(&rules)?;
        let mut slots: Vec<Option<DependencyRule>> = rules.into_iter().map(Some).collect();
        let rules: Vec<DependencyRule> = order.into_iter().filter_map(|i| slots[i].take()).collect();

        let owners = rules
            .iter()
            .enumerate()
            .flat_map(|(i, rule)| rule.dependents.iter().map(move |d| (d.clone(), i)))
            .collect();

        tracing::debug!(
            form = %name,
            fields = fields.len(),
            rules = rules.len(),
            "Form schema registered"
        );

        Ok(Self {
            name,
            fields,
            rules,
            field_index,
            owners,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Rules in application order: every rule comes after the rules whose
    /// dependents it reads; otherwise declaration order is kept.
    pub fn rules(&self) -> &[DependencyRule] {
        &self.rules
    }

    pub fn field(&self, key: &str) -> Option<&FieldSpec> {
        self.field_index.get(key).map(|&i| &self.fields[i])
    }

    /// The rule controlling `key`, if `key` is a dependent field.
    pub fn controlling_rule(&self, key: &str) -> Option<&DependencyRule> {
        self.owners.get(key).map(|&i| &self.rules[i])
    }

    /// Activity of every rule, indexed like [`Self::rules`].
    ///
    /// Each condition is evaluated on the record as [`Self::settle`] leaves
    /// it when the rule is reached, so upstream resets are already applied.
    pub fn active_rules(&self, record: &Record) -> Vec<bool> {
        self.settle(record).activity
    }

    /// Apply the rules in order on a copy of `record`, resetting the
    /// dependents of every rule whose condition fails at that point.
    pub(crate) fn settle(&self, record: &Record) -> Settled {
        let mut settled = Settled {
            record: record.clone(),
            activity: Vec::with_capacity(self.rules.len()),
            cleared: 0,
        };
        for rule in &self.rules {
            let active = rule.is_active(&settled.record);
            settled.activity.push(active);
            if active {
                continue;
            }
            for dependent in &rule.dependents {
                let Some(spec) = self.field(dependent) else {
                    continue;
                };
                if record::reset_to_default(&mut settled.record, dependent, spec.kind) {
                    settled.cleared += 1;
                }
            }
        }
        settled
    }
}

/// Outcome of [`FormDefinition::settle`].
pub(crate) struct Settled {
    pub record: Record,
    pub activity: Vec<bool>,
    pub cleared: usize,
}

fn index_fields(fields: &[FieldSpec]) -> Result<HashMap<String, usize>, SchemaConfigurationError> {
    let mut index = HashMap::with_capacity(fields.len());
    for (i, field) in fields.iter().enumerate() {
        if field.key.is_empty() || field.key.split(PATH_SEPARATOR).any(str::is_empty) {
            return Err(SchemaConfigurationError::InvalidKey(field.key.clone()));
        }
        if index.insert(field.key.clone(), i).is_some() {
            return Err(SchemaConfigurationError::DuplicateField(field.key.clone()));
        }
    }
    for field in fields {
        let mut prefix = field.key.as_str();
        while let Some((parent, _)) = prefix.rsplit_once(PATH_SEPARATOR) {
            if index.contains_key(parent) {
                return Err(SchemaConfigurationError::NestedUnderField {
                    field: field.key.clone(),
                    parent: parent.to_string(),
                });
            }
            prefix = parent;
        }
    }
    Ok(index)
}

/// Stable topological order of rules. Edge A→B when a trigger of B is a
/// dependent of A; ties are broken by declaration index.
fn application_order(rules: &[DependencyRule]) -> Result<Vec<usize>, SchemaConfigurationError> {
    let owner: HashMap<&str, usize> = rules
        .iter()
        .enumerate()
        .flat_map(|(i, r)| r.dependents.iter().map(move |d| (d.as_str(), i)))
        .collect();

    let mut downstream: Vec<Vec<usize>> = vec![Vec::new(); rules.len()];
    let mut in_degree = vec![0usize; rules.len()];
    for (b, rule) in rules.iter().enumerate() {
        let upstream: HashSet<usize> = rule
            .triggers
            .iter()
            .filter_map(|t| owner.get(t.as_str()).copied())
            .collect();
        for a in upstream {
            downstream[a].push(b);
            in_degree[b] += 1;
        }
    }

    let mut ready: BTreeSet<usize> = (0..rules.len()).filter(|&i| in_degree[i] == 0).collect();
    let mut order = Vec::with_capacity(rules.len());
    while let Some(next) = ready.pop_first() {
        order.push(next);
        for &b in &downstream[next] {
            in_degree[b] -= 1;
            if in_degree[b] == 0 {
                ready.insert(b);
            }
        }
    }

    if order.len() < rules.len() {
        let stuck = (0..rules.len())
            .filter(|&i| in_degree[i] > 0)
            .map(|i| rules[i].name.clone())
            .collect();
        return Err(SchemaConfigurationError::CyclicDependency(stuck));
    }
    Ok(order)
}
