// SPDX-FileCopyrightText: 2026 Crosspost Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed queries over the store's tables and views.

pub mod cleanup;
pub mod errors;
pub mod posts;
pub mod stats;

use chrono::{DateTime, Utc};
use rusqlite::types::Type;

/// Parse a stored timestamp column, surfacing failures as conversion errors.
pub(crate) fn timestamp_column(
    row: &rusqlite::Row<'_>,
    idx: usize,
) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    crosspost_core::types::from_db_timestamp(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
