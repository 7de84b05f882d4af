//! Persistence collaborator for sanitized form records.
//!
//! `RecordStore` is the async boundary the form session awaits on save.
//! `SqliteRecordStore` runs the blocking repository calls on tokio's
//! blocking pool behind a shared connection.

use std::path::Path;
use std::sync::{Arc, Mutex};

use rusqlite::Connection;
use thiserror::Error;
use uuid::Uuid;

use super::repository::{
    get_form_record, insert_form_record, list_form_records, now_timestamp,
    update_form_record_payload,
};
use super::sqlite::{open_database, open_memory_database};
use super::DatabaseError;
use crate::config;
use crate::forms::Record;
use crate::models::{RecordKind, StoredRecord};

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Database lock poisoned")]
    LockPoisoned,

    #[error("Record store unavailable: {0}")]
    Unavailable(String),
}

/// Storage for sanitized records, keyed by record kind.
///
/// Implementations assign the record id on `create`. No retry logic lives
/// above this trait; a failed call is reported once to the caller.
#[allow(async_fn_in_trait)]
pub trait RecordStore: Send + Sync {
    async fn create(
        &self,
        kind: RecordKind,
        patient_id: Uuid,
        record: Record,
    ) -> Result<StoredRecord, PersistenceError>;

    async fn update(
        &self,
        kind: RecordKind,
        id: Uuid,
        record: Record,
    ) -> Result<StoredRecord, PersistenceError>;

    async fn get(&self, id: Uuid) -> Result<Option<StoredRecord>, PersistenceError>;

    async fn list_for_patient(
        &self,
        kind: RecordKind,
        patient_id: Uuid,
    ) -> Result<Vec<StoredRecord>, PersistenceError>;
}

/// SQLite-backed [`RecordStore`].
#[derive(Clone)]
pub struct SqliteRecordStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteRecordStore {
    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        Ok(Self::from_connection(open_database(path)?))
    }

    /// In-memory store (for testing)
    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        Ok(Self::from_connection(open_memory_database()?))
    }

    /// Open the store at [`config::database_path`], creating the data directory.
    pub fn open_default() -> Result<Self, DatabaseError> {
        let path = config::database_path().ok_or(DatabaseError::NoDataDirectory)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        tracing::info!("Opening record store");
        Self::open(&path)
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// Run `op` against the connection on the blocking pool.
    async fn with_conn<T, F>(&self, op: F) -> Result<T, PersistenceError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, DatabaseError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || -> Result<T, PersistenceError> {
            let guard = conn.lock().map_err(|_| PersistenceError::LockPoisoned)?;
            op(&*guard).map_err(PersistenceError::from)
        })
        .await
        .map_err(|e| PersistenceError::Unavailable(e.to_string()))?
    }
}

impl RecordStore for SqliteRecordStore {
    async fn create(
        &self,
        kind: RecordKind,
        patient_id: Uuid,
        record: Record,
    ) -> Result<StoredRecord, PersistenceError> {
        let now = now_timestamp();
        let stored = StoredRecord {
            id: Uuid::new_v4(),
            kind,
            patient_id,
            record,
            created_at: now,
            updated_at: now,
        };
        let saved = self
            .with_conn(move |conn| {
                insert_form_record(conn, &stored)?;
                Ok(stored)
            })
            .await?;
        tracing::info!(kind = %kind, id = %saved.id, "Form record created");
        Ok(saved)
    }

    async fn update(
        &self,
        kind: RecordKind,
        id: Uuid,
        record: Record,
    ) -> Result<StoredRecord, PersistenceError> {
        let saved = self
            .with_conn(move |conn| {
                let existing = get_form_record(conn, &id)?.ok_or_else(|| DatabaseError::NotFound {
                    entity_type: "FormRecord".into(),
                    id: id.to_string(),
                })?;
                if existing.kind != kind {
                    return Err(DatabaseError::ConstraintViolation(format!(
                        "Record {id} is a {} record, not {kind}",
                        existing.kind
                    )));
                }
                let updated_at = now_timestamp();
                update_form_record_payload(conn, &id, &record, updated_at)?;
                Ok(StoredRecord {
                    record,
                    updated_at,
                    ..existing
                })
            })
            .await?;
        tracing::info!(kind = %kind, id = %saved.id, "Form record updated");
        Ok(saved)
    }

    async fn get(&self, id: Uuid) -> Result<Option<StoredRecord>, PersistenceError> {
        self.with_conn(move |conn| get_form_record(conn, &id)).await
    }

    async fn list_for_patient(
        &self,
        kind: RecordKind,
        patient_id: Uuid,
    ) -> Result<Vec<StoredRecord>, PersistenceError> {
        self.with_conn(move |conn| list_form_records(conn, kind, &patient_id))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: serde_json::Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn create_assigns_id_and_get_finds_it() {
        let store = SqliteRecordStore::open_in_memory().unwrap();
        let patient = Uuid::new_v4();
        let saved = store
            .create(RecordKind::TechnicalExam, patient, record(json!({"visite": 1})))
            .await
            .unwrap();
        assert_eq!(saved.patient_id, patient);
        assert_eq!(store.get(saved.id).await.unwrap(), Some(saved));
    }

    #[tokio::test]
    async fn update_keeps_identity_and_creation_time() {
        let store = SqliteRecordStore::open_in_memory().unwrap();
        let saved = store
            .create(RecordKind::Antecedent, Uuid::new_v4(), record(json!({"addiction": false})))
            .await
            .unwrap();
        let updated = store
            .update(RecordKind::Antecedent, saved.id, record(json!({"addiction": true})))
            .await
            .unwrap();
        assert_eq!(updated.id, saved.id);
        assert_eq!(updated.created_at, saved.created_at);
        assert_eq!(updated.record, record(json!({"addiction": true})));
    }

    #[tokio::test]
    async fn update_rejects_unknown_id_and_kind_mismatch() {
        let store = SqliteRecordStore::open_in_memory().unwrap();
        let err = store
            .update(RecordKind::Antecedent, Uuid::new_v4(), Record::new())
            .await
            .unwrap_err();
        assert!(matches!(err, PersistenceError::Database(DatabaseError::NotFound { .. })));

        let saved = store
            .create(RecordKind::ClinicalExam, Uuid::new_v4(), Record::new())
            .await
            .unwrap();
        let err = store
            .update(RecordKind::Antecedent, saved.id, Record::new())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PersistenceError::Database(DatabaseError::ConstraintViolation(_))
        ));
    }

    #[tokio::test]
    async fn list_for_patient_returns_only_that_kind() {
        let store = SqliteRecordStore::open_in_memory().unwrap();
        let patient = Uuid::new_v4();
        store.create(RecordKind::Antecedent, patient, Record::new()).await.unwrap();
        store.create(RecordKind::DrivingExperience, patient, Record::new()).await.unwrap();
        let listed = store
            .list_for_patient(RecordKind::DrivingExperience, patient)
            .await
            .unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].kind, RecordKind::DrivingExperience);
    }

    #[tokio::test]
    async fn on_disk_store_is_shared_between_handles() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteRecordStore::open(&dir.path().join("records.db")).unwrap();
        let other = store.clone();
        let saved = store
            .create(RecordKind::Antecedent, Uuid::new_v4(), Record::new())
            .await
            .unwrap();
        assert!(other.get(saved.id).await.unwrap().is_some());
    }
}
