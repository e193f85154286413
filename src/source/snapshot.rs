// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Read-only access to a FitNotes SQLite snapshot.
//!
//! The snapshot is opened with `mode=ro`: this crate never writes to it.
//! Each entity kind has one static query ([`EntityKind::query`]); rows are
//! decoded into [`LocalRow`] by column name.

use std::path::{Path, PathBuf};

use sqlx::sqlite::{Sqlite, SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use thiserror::Error;
use tracing::debug;

use crate::entity::EntityKind;
use crate::record::LocalRow;

#[derive(Error, Debug)]
pub enum LocalStoreError {
    #[error("Failed to open snapshot {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: sqlx::Error,
    },
    #[error("Query for {kind} rows failed: {source}")]
    Query {
        kind: EntityKind,
        #[source]
        source: sqlx::Error,
    },
    #[error("Malformed {kind} row: {source}")]
    Decode {
        kind: EntityKind,
        #[source]
        source: sqlx::Error,
    },
    #[error("{kind} row {origin_id} has no {column}")]
    NullColumn {
        kind: EntityKind,
        origin_id: i64,
        column: &'static str,
    },
}

pub struct SnapshotReader {
    pool: SqlitePool,
}

impl SnapshotReader {
    /// Open the snapshot read-only. Fails if the file does not exist.
    pub async fn open(path: &Path) -> Result<Self, LocalStoreError> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .read_only(true)
            .create_if_missing(false);

        // One connection: reads are strictly sequential.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|source| LocalStoreError::Open {
                path: path.to_path_buf(),
                source,
            })?;

        debug!(path = %path.display(), "Snapshot opened read-only");
        Ok(Self { pool })
    }

    /// All rows of a kind, in the kind's query order.
    pub async fn fetch_rows(&self, kind: EntityKind) -> Result<Vec<LocalRow>, LocalStoreError> {
        let rows = sqlx::query(kind.query())
            .fetch_all(&self.pool)
            .await
            .map_err(|source| LocalStoreError::Query { kind, source })?;

        rows.iter().map(|row| decode_row(kind, row)).collect()
    }

    /// Close the connection before the snapshot file goes away.
    pub async fn close(self) {
        self.pool.close().await;
    }
}

fn decode_row(kind: EntityKind, row: &SqliteRow) -> Result<LocalRow, LocalStoreError> {
    let id: i64 = row
        .try_get("_id")
        .map_err(|source| LocalStoreError::Decode { kind, source })?;
    let column = |name| Column { row, kind, id, name };

    Ok(match kind {
        EntityKind::Bodyweight => LocalRow::Bodyweight {
            id,
            date: column("date").get()?,
            value: column("value").get()?,
        },
        EntityKind::Exercise => LocalRow::Exercise {
            id,
            name: column("name").get()?,
        },
        EntityKind::Workout => LocalRow::Workout {
            id,
            date: column("date").get()?,
            exercise_id: column("exercise_id").get()?,
            weight_kg: column("metric_weight").get()?,
            reps: column("reps").get()?,
        },
    })
}

/// One named column of a decoded row. NULL is reported with the row's id.
struct Column<'r> {
    row: &'r SqliteRow,
    kind: EntityKind,
    id: i64,
    name: &'static str,
}

impl<'r> Column<'r> {
    fn get<T>(&self) -> Result<T, LocalStoreError>
    where
        T: sqlx::Decode<'r, Sqlite> + sqlx::Type<Sqlite>,
    {
        self.row
            .try_get::<Option<T>, _>(self.name)
            .map_err(|source| LocalStoreError::Decode { kind: self.kind, source })?
            .ok_or(LocalStoreError::NullColumn {
                kind: self.kind,
                origin_id: self.id,
                column: self.name,
            })
    }
}
