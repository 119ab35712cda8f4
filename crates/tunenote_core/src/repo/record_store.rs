//! Record store contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide the read/create/save surface the migration engine needs.
//! - Persist a migrated record and its rewritten notes atomically.
//!
//! # Invariants
//! - Note type names are unique; a conflicting save is `NameConflict`.
//! - Notes are listed in insertion order (`sort_order`).
//! - JSON columns must decode into typed model values or the read fails.

use crate::db::DbError;
use crate::model::metadata::Metadata;
use crate::model::note::{Note, NoteFields};
use crate::model::record::{ManagedRecord, RecordId, Template};
use rusqlite::{params, Connection, ErrorCode, Row, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const NOTE_TYPE_SELECT_SQL: &str = "SELECT
    id,
    name,
    fields_json,
    templates_json,
    metadata_json
FROM note_types";

pub type StoreResult<T> = Result<T, StoreError>;

/// Record store error.
#[derive(Debug)]
pub enum StoreError {
    Db(DbError),
    Encode(serde_json::Error),
    NameConflict(String),
    RecordNotFound(RecordId),
    InvalidData(String),
    MissingRequiredTable(&'static str),
}

impl StoreError {
    /// Stable machine-readable code used in log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Db(err) => err.code(),
            Self::Encode(_) => "store_encode_failed",
            Self::NameConflict(_) => "store_name_conflict",
            Self::RecordNotFound(_) => "store_record_not_found",
            Self::InvalidData(_) => "store_invalid_data",
            Self::MissingRequiredTable(_) => "store_missing_table",
        }
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Encode(err) => write!(f, "failed to encode record data: {err}"),
            Self::NameConflict(name) => write!(f, "note type name already in use: {name}"),
            Self::RecordNotFound(id) => write!(f, "note type not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted record data: {message}"),
            Self::MissingRequiredTable(table) => write!(f, "missing required table: {table}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Encode(err) => Some(err),
            Self::NameConflict(_)
            | Self::RecordNotFound(_)
            | Self::InvalidData(_)
            | Self::MissingRequiredTable(_) => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Encode(value)
    }
}

/// Store contract the migration engine is written against.
pub trait RecordStore {
    /// Returns every note type whose metadata satisfies `predicate`.
    fn find_by_tag(
        &self,
        predicate: &dyn Fn(&Metadata) -> bool,
    ) -> StoreResult<Vec<ManagedRecord>>;

    /// Looks up one note type by exact name.
    fn by_name(&self, name: &str) -> StoreResult<Option<ManagedRecord>>;

    /// Builds a fresh, unsaved note type skeleton.
    fn create(&self, name: &str) -> StoreResult<ManagedRecord> {
        Ok(ManagedRecord::new(name))
    }

    /// Inserts or replaces one note type.
    fn save(&mut self, record: &ManagedRecord) -> StoreResult<()>;

    /// Lists the notes of one note type in insertion order.
    fn notes_of(&self, record_id: RecordId) -> StoreResult<Vec<Note>>;

    /// Inserts or replaces one note.
    fn save_note(&mut self, note: &Note) -> StoreResult<()>;

    /// Saves `record` and `notes` as a single atomic unit.
    fn commit_step(&mut self, record: &ManagedRecord, notes: &[Note]) -> StoreResult<()>;
}

/// SQLite-backed record store.
pub struct SqliteRecordStore<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteRecordStore<'conn> {
    /// Constructs a store from a migrated/ready connection.
    pub fn try_new(conn: &'conn mut Connection) -> StoreResult<Self> {
        for table in ["note_types", "notes"] {
            if !table_exists(conn, table)? {
                return Err(StoreError::MissingRequiredTable(table));
            }
        }
        Ok(Self { conn })
    }

    /// Lists every note type ordered by creation time.
    pub fn all_records(&self) -> StoreResult<Vec<ManagedRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "{NOTE_TYPE_SELECT_SQL} ORDER BY created_at ASC, name ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(parse_record_row(row)?);
        }
        Ok(records)
    }
}

impl RecordStore for SqliteRecordStore<'_> {
    fn find_by_tag(
        &self,
        predicate: &dyn Fn(&Metadata) -> bool,
    ) -> StoreResult<Vec<ManagedRecord>> {
        let mut records = self.all_records()?;
        records.retain(|record| predicate(&record.metadata));
        Ok(records)
    }

    fn by_name(&self, name: &str) -> StoreResult<Option<ManagedRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{NOTE_TYPE_SELECT_SQL} WHERE name = ?1;"))?;
        let mut rows = stmt.query([name])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_record_row(row)?));
        }
        Ok(None)
    }

    fn save(&mut self, record: &ManagedRecord) -> StoreResult<()> {
        upsert_record(self.conn, record)
    }

    fn notes_of(&self, record_id: RecordId) -> StoreResult<Vec<Note>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, note_type_id, fields_json
             FROM notes
             WHERE note_type_id = ?1
             ORDER BY sort_order ASC, id ASC;",
        )?;
        let mut rows = stmt.query([record_id.to_string()])?;
        let mut notes = Vec::new();
        while let Some(row) = rows.next()? {
            notes.push(parse_note_row(row)?);
        }
        Ok(notes)
    }

    fn save_note(&mut self, note: &Note) -> StoreResult<()> {
        upsert_note(self.conn, note)
    }

    fn commit_step(&mut self, record: &ManagedRecord, notes: &[Note]) -> StoreResult<()> {
        if let Some(stray) = notes.iter().find(|note| note.record_id != record.id) {
            return Err(StoreError::InvalidData(format!(
                "note {} belongs to {} not {}",
                stray.id, stray.record_id, record.id
            )));
        }

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        upsert_record(&tx, record)?;
        for note in notes {
            upsert_note(&tx, note)?;
        }
        tx.commit()?;
        Ok(())
    }
}

fn upsert_record(conn: &Connection, record: &ManagedRecord) -> StoreResult<()> {
    let fields_json = serde_json::to_string(&record.fields)?;
    let templates_json = serde_json::to_string(&record.templates)?;
    let metadata_json = serde_json::to_string(&record.metadata)?;

    let result = conn.execute(
        "INSERT INTO note_types (id, name, fields_json, templates_json, metadata_json)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(id) DO UPDATE SET
            name = excluded.name,
            fields_json = excluded.fields_json,
            templates_json = excluded.templates_json,
            metadata_json = excluded.metadata_json,
            updated_at = (strftime('%s', 'now') * 1000);",
        params![
            record.id.to_string(),
            record.name.as_str(),
            fields_json,
            templates_json,
            metadata_json,
        ],
    );

    match result {
        Ok(_) => Ok(()),
        Err(rusqlite::Error::SqliteFailure(failure, _))
            if failure.code == ErrorCode::ConstraintViolation =>
        {
            Err(StoreError::NameConflict(record.name.clone()))
        }
        Err(err) => Err(err.into()),
    }
}

fn upsert_note(conn: &Connection, note: &Note) -> StoreResult<()> {
    let fields_json = serde_json::to_string(&note.fields)?;
    let record_id = note.record_id.to_string();

    let result = conn.execute(
        "INSERT INTO notes (id, note_type_id, fields_json, sort_order)
         VALUES (
            ?1,
            ?2,
            ?3,
            COALESCE((SELECT MAX(sort_order) + 1 FROM notes WHERE note_type_id = ?2), 0)
         )
         ON CONFLICT(id) DO UPDATE SET
            note_type_id = excluded.note_type_id,
            fields_json = excluded.fields_json,
            updated_at = (strftime('%s', 'now') * 1000);",
        params![note.id.to_string(), record_id, fields_json],
    );

    match result {
        Ok(_) => Ok(()),
        Err(rusqlite::Error::SqliteFailure(failure, _))
            if failure.code == ErrorCode::ConstraintViolation =>
        {
            Err(StoreError::RecordNotFound(note.record_id))
        }
        Err(err) => Err(err.into()),
    }
}

fn parse_record_row(row: &Row<'_>) -> StoreResult<ManagedRecord> {
    let id = parse_uuid(&row.get::<_, String>("id")?, "note_types.id")?;

    let fields: Vec<String> = decode_column(row, "fields_json", "note_types.fields_json")?;
    let templates: Vec<Template> =
        decode_column(row, "templates_json", "note_types.templates_json")?;
    let metadata: Metadata = decode_column(row, "metadata_json", "note_types.metadata_json")?;

    Ok(ManagedRecord {
        id,
        name: row.get("name")?,
        fields,
        templates,
        metadata,
    })
}

fn parse_note_row(row: &Row<'_>) -> StoreResult<Note> {
    let fields: NoteFields = decode_column(row, "fields_json", "notes.fields_json")?;
    Ok(Note {
        id: parse_uuid(&row.get::<_, String>("id")?, "notes.id")?,
        record_id: parse_uuid(&row.get::<_, String>("note_type_id")?, "notes.note_type_id")?,
        fields,
    })
}

fn decode_column<T: serde::de::DeserializeOwned>(
    row: &Row<'_>,
    column: &str,
    label: &str,
) -> StoreResult<T> {
    let text: String = row.get(column)?;
    serde_json::from_str(&text)
        .map_err(|err| StoreError::InvalidData(format!("cannot decode {label}: {err}")))
}

fn parse_uuid(value: &str, label: &str) -> StoreResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| StoreError::InvalidData(format!("invalid uuid value `{value}` in {label}")))
}

fn table_exists(conn: &Connection, table: &str) -> StoreResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}
