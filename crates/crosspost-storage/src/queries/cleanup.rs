// SPDX-FileCopyrightText: 2026 Crosspost Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Retention cleanup.

use chrono::{DateTime, Utc};
use crosspost_core::CrosspostError;
use crosspost_core::types::{CleanupReport, to_db_timestamp};
use rusqlite::params;

use crate::database::{Database, map_tr_err};

/// Delete post and error records strictly older than `cutoff` in one transaction.
pub async fn delete_older_than(
    db: &Database,
    cutoff: DateTime<Utc>,
) -> Result<CleanupReport, CrosspostError> {
    let cutoff = to_db_timestamp(&cutoff);
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let posts_deleted = tx.execute(
                "DELETE FROM posted_messages WHERE posted_at < ?1",
                params![cutoff],
            )?;
            let errors_deleted =
                tx.execute("DELETE FROM error_log WHERE occurred_at < ?1", params![cutoff])?;
            tx.commit()?;
            Ok(CleanupReport {
                posts_deleted,
                errors_deleted,
            })
        })
        .await
        .map_err(map_tr_err)
}
