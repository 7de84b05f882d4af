use std::str::FromStr;

use chrono::{NaiveDateTime, Timelike};
use rusqlite::{params, Connection, ErrorCode};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::forms::Record;
use crate::models::*;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Current time at the precision stored in the database.
pub fn now_timestamp() -> NaiveDateTime {
    let now = chrono::Local::now().naive_local();
    now.with_nanosecond(0).unwrap_or(now)
}

pub fn insert_form_record(conn: &Connection, stored: &StoredRecord) -> Result<(), DatabaseError> {
    let payload = serde_json::to_string(&stored.record)?;
    conn.execute(
        "INSERT INTO form_records (id, kind, patient_id, payload, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            stored.id.to_string(),
            stored.kind.as_str(),
            stored.patient_id.to_string(),
            payload,
            stored.created_at.format(TIMESTAMP_FORMAT).to_string(),
            stored.updated_at.format(TIMESTAMP_FORMAT).to_string(),
        ],
    )
    .map_err(|e| map_constraint(e, stored.kind))?;
    Ok(())
}

/// Replace the payload of an existing record.
pub fn update_form_record_payload(
    conn: &Connection,
    id: &Uuid,
    record: &Record,
    updated_at: NaiveDateTime,
) -> Result<(), DatabaseError> {
    let payload = serde_json::to_string(record)?;
    let changed = conn.execute(
        "UPDATE form_records SET payload = ?1, updated_at = ?2 WHERE id = ?3",
        params![
            payload,
            updated_at.format(TIMESTAMP_FORMAT).to_string(),
            id.to_string()
        ],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "FormRecord".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

pub fn get_form_record(conn: &Connection, id: &Uuid) -> Result<Option<StoredRecord>, DatabaseError> {
    let result = conn.query_row(
        "SELECT id, kind, patient_id, payload, created_at, updated_at
         FROM form_records WHERE id = ?1",
        params![id.to_string()],
        |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
            ))
        },
    );

    match result {
        Ok(row) => Ok(Some(form_record_from_row(row)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// All records of `kind` for a patient, oldest first.
pub fn list_form_records(
    conn: &Connection,
    kind: RecordKind,
    patient_id: &Uuid,
) -> Result<Vec<StoredRecord>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, kind, patient_id, payload, created_at, updated_at
         FROM form_records WHERE kind = ?1 AND patient_id = ?2
         ORDER BY created_at ASC, rowid ASC",
    )?;

    let rows = stmt.query_map(params![kind.as_str(), patient_id.to_string()], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, String>(4)?,
            row.get::<_, String>(5)?,
        ))
    })?;

    let mut records = Vec::new();
    for row in rows {
        records.push(form_record_from_row(row?)?);
    }
    Ok(records)
}

type FormRecordRow = (String, String, String, String, String, String);

fn form_record_from_row(row: FormRecordRow) -> Result<StoredRecord, DatabaseError> {
    let (id, kind, patient_id, payload, created_at, updated_at) = row;
    Ok(StoredRecord {
        id: Uuid::parse_str(&id).map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        kind: RecordKind::from_str(&kind)?,
        patient_id: Uuid::parse_str(&patient_id)
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        record: serde_json::from_str(&payload)?,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

fn parse_timestamp(value: &str) -> Result<NaiveDateTime, DatabaseError> {
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S"))
        .map_err(|e| DatabaseError::ConstraintViolation(format!("Invalid timestamp {value}: {e}")))
}

/// A unique-index hit means the kind allows one record per patient; any
/// other constraint failure is reported as is.
fn map_constraint(err: rusqlite::Error, kind: RecordKind) -> DatabaseError {
    match &err {
        rusqlite::Error::SqliteFailure(code, _)
            if code.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            DatabaseError::ConstraintViolation(format!("{kind} record already exists for this patient"))
        }
        rusqlite::Error::SqliteFailure(code, detail) if code.code == ErrorCode::ConstraintViolation => {
            DatabaseError::ConstraintViolation(
                detail.clone().unwrap_or_else(|| format!("{kind} record rejected by a constraint")),
            )
        }
        _ => DatabaseError::Sqlite(err),
    }
}
