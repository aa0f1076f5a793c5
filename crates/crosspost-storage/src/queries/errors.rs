// SPDX-FileCopyrightText: 2026 Crosspost Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Append-only diagnostic entries (`error_log`).

use chrono::{DateTime, Utc};
use crosspost_core::CrosspostError;
use crosspost_core::types::{ErrorRecord, to_db_timestamp};
use rusqlite::params;

use crate::database::{Database, map_tr_err};
use crate::queries::timestamp_column;

/// Append one entry.
pub async fn insert_error(db: &Database, record: &ErrorRecord) -> Result<(), CrosspostError> {
    let record = record.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO error_log (source_message_id, error_type, message, occurred_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    record.source_message_id,
                    record.error_type,
                    record.message,
                    to_db_timestamp(&record.occurred_at),
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Entries that occurred after `since`, newest first.
pub async fn recent_errors(
    db: &Database,
    since: DateTime<Utc>,
    limit: u32,
) -> Result<Vec<ErrorRecord>, CrosspostError> {
    let since = to_db_timestamp(&since);
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT source_message_id, error_type, message, occurred_at
                 FROM error_log WHERE occurred_at > ?1
                 ORDER BY occurred_at DESC, id DESC LIMIT ?2",
            )?;
            let rows = stmt.query_map(params![since, limit], |row| {
                Ok(ErrorRecord {
                    source_message_id: row.get(0)?,
                    error_type: row.get(1)?,
                    message: row.get(2)?,
                    occurred_at: timestamp_column(row, 3)?,
                })
            })?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(map_tr_err)
}

/// Number of entries that occurred after `since`.
pub async fn count_errors(db: &Database, since: DateTime<Utc>) -> Result<i64, CrosspostError> {
    let since = to_db_timestamp(&since);
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT COUNT(*) FROM error_log WHERE occurred_at > ?1",
                params![since],
                |row| row.get(0),
            )
        })
        .await
        .map_err(map_tr_err)
}
