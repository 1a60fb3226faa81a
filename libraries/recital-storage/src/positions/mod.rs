//! Reading position queries
//!
//! One row per document, replaced on every save.

use chrono::{DateTime, Utc};
use recital_core::types::{DocumentId, PositionSnapshot};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use crate::error::{Result, StorageError};

/// Get the saved position for a document
pub async fn get(pool: &SqlitePool, document_id: &DocumentId) -> Result<Option<PositionSnapshot>> {
    let row = sqlx::query(
        "SELECT document_id, sentence_index, character_offset, captured_at
         FROM reading_positions WHERE document_id = ?",
    )
    .bind(document_id.as_str())
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(snapshot_from_row).transpose()
}

/// Create or replace the saved position for a document
pub async fn upsert(pool: &SqlitePool, snapshot: &PositionSnapshot) -> Result<()> {
    let sentence_index = to_column(snapshot.sentence_index, "sentence_index")?;
    let character_offset = to_column(snapshot.character_offset, "character_offset")?;
    let now = Utc::now().timestamp();

    sqlx::query(
        "INSERT INTO reading_positions
         (document_id, sentence_index, character_offset, captured_at, updated_at)
         VALUES (?, ?, ?, ?, ?)
         ON CONFLICT(document_id)
         DO UPDATE SET
            sentence_index = excluded.sentence_index,
            character_offset = excluded.character_offset,
            captured_at = excluded.captured_at,
            updated_at = excluded.updated_at",
    )
    .bind(snapshot.document_identity.as_str())
    .bind(sentence_index)
    .bind(character_offset)
    .bind(snapshot.captured_at.to_rfc3339())
    .bind(now)
    .execute(pool)
    .await?;

    Ok(())
}

/// Delete the saved position for a document
///
/// Returns whether a row was removed.
pub async fn delete(pool: &SqlitePool, document_id: &DocumentId) -> Result<bool> {
    let result = sqlx::query("DELETE FROM reading_positions WHERE document_id = ?")
        .bind(document_id.as_str())
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// List every saved position, most recently updated first
pub async fn list(pool: &SqlitePool) -> Result<Vec<PositionSnapshot>> {
    let rows = sqlx::query(
        "SELECT document_id, sentence_index, character_offset, captured_at
         FROM reading_positions ORDER BY updated_at DESC, document_id",
    )
    .fetch_all(pool)
    .await?;

    rows.iter().map(snapshot_from_row).collect()
}

fn snapshot_from_row(row: &SqliteRow) -> Result<PositionSnapshot> {
    let document_id: String = row.try_get("document_id")?;
    let sentence_index: i64 = row.try_get("sentence_index")?;
    let character_offset: i64 = row.try_get("character_offset")?;
    let captured_at: String = row.try_get("captured_at")?;

    let captured_at = DateTime::parse_from_rfc3339(&captured_at)
        .map_err(|e| StorageError::invalid_data(format!("captured_at for {document_id}: {e}")))?
        .with_timezone(&Utc);

    Ok(PositionSnapshot {
        sentence_index: from_column(sentence_index, "sentence_index")?,
        character_offset: from_column(character_offset, "character_offset")?,
        document_identity: DocumentId::new(document_id),
        captured_at,
    })
}

fn to_column(value: usize, name: &str) -> Result<i64> {
    i64::try_from(value).map_err(|_| StorageError::invalid_data(format!("{name} out of range: {value}")))
}

fn from_column(value: i64, name: &str) -> Result<usize> {
    usize::try_from(value).map_err(|_| StorageError::invalid_data(format!("{name} out of range: {value}")))
}
