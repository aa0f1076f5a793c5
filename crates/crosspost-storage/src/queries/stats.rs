// SPDX-FileCopyrightText: 2026 Crosspost Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reads of the derived `post_stats` view.

use crosspost_core::CrosspostError;
use crosspost_core::types::DailyStats;

use crate::database::{Database, map_tr_err};

/// Per-day statistics, newest day first.
pub async fn daily_stats(db: &Database) -> Result<Vec<DailyStats>, CrosspostError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare(
                "SELECT day, post_count, channel_count, media_count
                 FROM post_stats ORDER BY day DESC",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok(DailyStats {
                    day: row.get(0)?,
                    post_count: row.get(1)?,
                    channel_count: row.get(2)?,
                    media_count: row.get(3)?,
                })
            })?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(map_tr_err)
}
