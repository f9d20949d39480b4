use crate::migrations;
use chrono::{DateTime, Utc};
use facereg_core::registry::normalize_name;
use facereg_core::{FaceId, FaceRegistry, Registration, RegistryError};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("cannot create database directory: {0}")]
    Io(#[from] std::io::Error),
    #[error("database schema version {found} is newer than supported version {supported}")]
    SchemaTooNew { found: i32, supported: i32 },
    #[error("no migration defined for schema version {0}")]
    UnknownMigration(i32),
    #[error("invalid registered_at timestamp {value:?}: {source}")]
    InvalidTimestamp {
        value: String,
        source: chrono::ParseError,
    },
}

impl From<StoreError> for RegistryError {
    fn from(err: StoreError) -> Self {
        RegistryError::Storage(err.to_string())
    }
}

fn storage(err: rusqlite::Error) -> RegistryError {
    StoreError::from(err).into()
}

/// Face registry persisted in a SQLite database.
pub struct SqliteRegistry {
    conn: Connection,
}

impl SqliteRegistry {
    /// Open (or create) the database at `path`, creating parent directories
    /// and applying schema migrations.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        tracing::info!(path = %path.display(), "opened face registry database");
        Self::from_connection(conn)
    }

    /// Non-persistent database, mainly for tests.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(mut conn: Connection) -> Result<Self, StoreError> {
        migrations::run_migrations(&mut conn)?;
        Ok(Self { conn })
    }

    /// Number of registered faces.
    pub fn count(&self) -> Result<usize, StoreError> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM faces", [], |row| row.get(0))?;
        Ok(n as usize)
    }
}

fn row_to_registration(row: &Row) -> rusqlite::Result<(String, String, String)> {
    Ok((row.get("face_id")?, row.get("name")?, row.get("registered_at")?))
}

fn parse_timestamp(value: String) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(&value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|source| StoreError::InvalidTimestamp { value, source })
}

impl FaceRegistry for SqliteRegistry {
    fn lookup(&self, face_id: &FaceId) -> Result<Option<String>, RegistryError> {
        self.conn
            .query_row(
                "SELECT name FROM faces WHERE face_id = ?1",
                params![face_id.as_str()],
                |row| row.get(0),
            )
            .optional()
            .map_err(storage)
    }

    fn register(&mut self, face_id: &FaceId, name: &str) -> Result<(), RegistryError> {
        let name = normalize_name(name)?;
        self.conn
            .execute(
                "INSERT INTO faces (face_id, name, registered_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(face_id) DO UPDATE SET
                     name = excluded.name,
                     registered_at = excluded.registered_at",
                params![face_id.as_str(), name, Utc::now().to_rfc3339()],
            )
            .map_err(storage)?;
        tracing::debug!(%face_id, "registration stored");
        Ok(())
    }

    fn entries(&self) -> Result<Vec<Registration>, RegistryError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT face_id, name, registered_at FROM faces
                 ORDER BY registered_at ASC, face_id ASC",
            )
            .map_err(storage)?;
        let rows = stmt
            .query_map([], row_to_registration)
            .map_err(storage)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(storage)?;

        let mut entries = Vec::with_capacity(rows.len());
        for (face_id, name, registered_at) in rows {
            entries.push(Registration {
                face_id: FaceId::new(face_id),
                name,
                registered_at: parse_timestamp(registered_at)?,
            });
        }
        Ok(entries)
    }

    fn remove(&mut self, face_id: &FaceId) -> Result<bool, RegistryError> {
        let deleted = self
            .conn
            .execute("DELETE FROM faces WHERE face_id = ?1", params![face_id.as_str()])
            .map_err(storage)?;
        Ok(deleted > 0)
    }
}
