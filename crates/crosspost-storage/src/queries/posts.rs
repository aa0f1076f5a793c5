// SPDX-FileCopyrightText: 2026 Crosspost Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Terminal post records (`posted_messages`).

use std::str::FromStr;

use crosspost_core::CrosspostError;
use crosspost_core::types::{InsertOutcome, PostRecord, PostStatus, to_db_timestamp};
use rusqlite::types::Type;
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, map_tr_err};
use crate::queries::timestamp_column;

const POST_COLUMNS: &str =
    "source_message_id, target_post_id, channel_id, final_text, media_type, status, posted_at";

fn row_to_post(row: &rusqlite::Row<'_>) -> rusqlite::Result<PostRecord> {
    let status: String = row.get(5)?;
    let status = PostStatus::from_str(&status)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(e)))?;
    Ok(PostRecord {
        source_message_id: row.get(0)?,
        target_post_id: row.get(1)?,
        channel_id: row.get(2)?,
        final_text: row.get(3)?,
        media_type: row.get(4)?,
        status,
        posted_at: timestamp_column(row, 6)?,
    })
}

/// Look up the record for a source message id.
pub async fn find_post(
    db: &Database,
    source_message_id: &str,
) -> Result<Option<PostRecord>, CrosspostError> {
    let id = source_message_id.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {POST_COLUMNS} FROM posted_messages WHERE source_message_id = ?1"),
                params![id],
                row_to_post,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Insert a record unless one already exists for the same source message id.
///
/// Existing rows are never overwritten, so a record's status is fixed once written.
pub async fn insert_post(
    db: &Database,
    record: &PostRecord,
) -> Result<InsertOutcome, CrosspostError> {
    let record = record.clone();
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                &format!(
                    "INSERT INTO posted_messages ({POST_COLUMNS})
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                     ON CONFLICT(source_message_id) DO NOTHING"
                ),
                params![
                    record.source_message_id,
                    record.target_post_id,
                    record.channel_id,
                    record.final_text,
                    record.media_type,
                    record.status.to_string(),
                    to_db_timestamp(&record.posted_at),
                ],
            )?;
            Ok(if changed == 0 {
                InsertOutcome::AlreadyExists
            } else {
                InsertOutcome::Inserted
            })
        })
        .await
        .map_err(map_tr_err)
}

/// Most recent records, newest first.
pub async fn recent_posts(db: &Database, limit: u32) -> Result<Vec<PostRecord>, CrosspostError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {POST_COLUMNS} FROM posted_messages
                 ORDER BY posted_at DESC, id DESC LIMIT ?1"
            ))?;
            let rows = stmt.query_map(params![limit], row_to_post)?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(map_tr_err)
}
