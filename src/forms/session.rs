//! Per-form-instance edit state machine.
//!
//! `Viewing → Editing → Submitting → (Viewing | EditingWithErrors)`.
//! Edits never leave the session unless they were sanitized and validated,
//! and a failed save keeps the draft so the user can retry.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use super::reconcile::reconcile;
use super::record::{self, Record};
use super::sanitize::sanitize;
use super::catalog::FormCatalog;
use super::schema::FormDefinition;
use super::validate::{validate, ValidationError};
use crate::authorization::{EditPolicy, UserSession};
use crate::db::{PersistenceError, RecordStore};
use crate::models::{RecordKind, Role, StoredRecord};

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Role {role} may not edit {kind} records")]
    EditNotPermitted { role: Role, kind: RecordKind },

    #[error("Form is not being edited")]
    NotEditing,

    #[error("Unknown field: {0}")]
    UnknownField(String),

    #[error("Save failed: {0}")]
    Persistence(#[from] PersistenceError),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "errors", rename_all = "snake_case")]
pub enum FormState {
    Viewing,
    Editing,
    Submitting,
    EditingWithErrors(Vec<ValidationError>),
}

impl FormState {
    pub fn is_editing(&self) -> bool {
        matches!(self, Self::Editing | Self::EditingWithErrors(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Saved(StoredRecord),
    Rejected(Vec<ValidationError>),
}

/// One form instance: the edit buffer of a single record.
pub struct FormSession {
    definition: Arc<FormDefinition>,
    kind: RecordKind,
    patient_id: Uuid,
    persisted: Option<StoredRecord>,
    draft: Record,
    state: FormState,
}

impl FormSession {
    /// Open a blank form of `kind` for a patient, in `Viewing`.
    pub fn new(catalog: &FormCatalog, kind: RecordKind, patient_id: Uuid) -> Self {
        Self {
            definition: catalog.get(kind),
            kind,
            patient_id,
            persisted: None,
            draft: Record::new(),
            state: FormState::Viewing,
        }
    }

    /// Open a saved record in `Viewing`; kind and patient come from the record.
    pub fn open(catalog: &FormCatalog, stored: StoredRecord) -> Self {
        Self {
            definition: catalog.get(stored.kind),
            kind: stored.kind,
            patient_id: stored.patient_id,
            draft: stored.record.clone(),
            persisted: Some(stored),
            state: FormState::Viewing,
        }
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    pub fn kind(&self) -> RecordKind {
        self.kind
    }

    pub fn patient_id(&self) -> Uuid {
        self.patient_id
    }

    /// The edit buffer (the persisted record while viewing).
    pub fn record(&self) -> &Record {
        &self.draft
    }

    pub fn persisted(&self) -> Option<&StoredRecord> {
        self.persisted.as_ref()
    }

    /// Errors on display, empty unless in `EditingWithErrors`.
    pub fn errors(&self) -> &[ValidationError] {
        match &self.state {
            FormState::EditingWithErrors(errors) => errors.as_slice(),
            _ => &[],
        }
    }

    /// Enter `Editing` if the policy lets `user` edit this kind of record.
    pub fn begin_edit(
        &mut self,
        user: &UserSession,
        policy: &dyn EditPolicy,
    ) -> Result<(), SessionError> {
        if self.state.is_editing() {
            return Ok(());
        }
        if !policy.can_edit(user.role, self.kind) {
            tracing::info!(role = %user.role, kind = %self.kind, "Edit not permitted");
            return Err(SessionError::EditNotPermitted {
                role: user.role,
                kind: self.kind,
            });
        }
        self.draft = reconcile(&self.definition, &self.draft);
        self.state = FormState::Editing;
        Ok(())
    }

    /// Write one field and reconcile its dependents.
    ///
    /// While errors are on display they are recomputed after each change;
    /// the form drops back to `Editing` once none remain.
    pub fn set_field(&mut self, path: &str, value: Value) -> Result<(), SessionError> {
        if !self.state.is_editing() {
            return Err(SessionError::NotEditing);
        }
        if self.definition.field(path).is_none() {
            return Err(SessionError::UnknownField(path.to_string()));
        }

        let mut next = self.draft.clone();
        record::set(&mut next, path, value);
        self.draft = reconcile(&self.definition, &next);

        if let FormState::EditingWithErrors(_) = self.state {
            let errors = validate(&self.definition, &self.draft);
            self.state = if errors.is_empty() {
                FormState::Editing
            } else {
                FormState::EditingWithErrors(errors)
            };
        }
        Ok(())
    }

    /// Drop the draft and return to the last persisted record.
    pub fn cancel_edit(&mut self) {
        self.draft = self
            .persisted
            .as_ref()
            .map(|stored| stored.record.clone())
            .unwrap_or_default();
        self.state = FormState::Viewing;
    }

    /// Sanitize, validate, and hand the clean record to `store`.
    ///
    /// Validation failures are returned as [`SubmitOutcome::Rejected`] and
    /// nothing is persisted. A store failure returns the session to
    /// `Editing` with the draft untouched.
    pub async fn submit<S>(&mut self, store: &S) -> Result<SubmitOutcome, SessionError>
    where
        S: RecordStore + ?Sized,
    {
        if !self.state.is_editing() {
            return Err(SessionError::NotEditing);
        }

        let clean = sanitize(&self.definition, &self.draft);
        let errors = validate(&self.definition, &clean);
        if !errors.is_empty() {
            tracing::debug!(kind = %self.kind, error_count = errors.len(), "Submission rejected");
            self.state = FormState::EditingWithErrors(errors.clone());
            return Ok(SubmitOutcome::Rejected(errors));
        }

        self.state = FormState::Submitting;
        let result = match &self.persisted {
            Some(existing) => store.update(self.kind, existing.id, clean).await,
            None => store.create(self.kind, self.patient_id, clean).await,
        };

        match result {
            Ok(stored) => {
                self.draft = stored.record.clone();
                self.persisted = Some(stored.clone());
                self.state = FormState::Viewing;
                Ok(SubmitOutcome::Saved(stored))
            }
            Err(e) => {
                tracing::warn!(kind = %self.kind, error = %e, "Record save failed, edits kept");
                self.state = FormState::Editing;
                Err(e.into())
            }
        }
    }

    /// Keys the renderer should show: fields with no controlling rule, and
    /// dependents whose rule is active.
    pub fn visible_fields(&self) -> Vec<&str> {
        let active = self.definition.active_rules(&self.draft);
        self.definition
            .fields()
            .iter()
            .filter(|field| {
                self.definition
                    .rules()
                    .iter()
                    .position(|rule| rule.dependents.contains(&field.key))
                    .map_or(true, |i| active[i])
            })
            .map(|field| field.key.as_str())
            .collect()
    }
}
