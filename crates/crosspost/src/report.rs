// SPDX-FileCopyrightText: 2026 Crosspost Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `crosspost errors` and `crosspost stats` report commands.
//!
//! Both open the store through the regular storage adapter, read, and close
//! it again. If `--plain` is passed or stdout is not a TTY, colors are off.

use std::io::IsTerminal;

use chrono::{Duration, Utc};
use crosspost_config::model::CrosspostConfig;
use crosspost_core::StorageAdapter;
use crosspost_core::error::CrosspostError;
use crosspost_core::types::{DailyStats, ErrorRecord};
use crosspost_storage::SqliteStorage;

/// Longest error message shown per line.
const MESSAGE_WIDTH: usize = 100;

/// Run the `crosspost errors` command.
pub async fn run_errors(
    config: &CrosspostConfig,
    hours: Option<u32>,
    limit: Option<u32>,
    plain: bool,
) -> Result<(), CrosspostError> {
    let hours = hours.unwrap_or(config.report.default_hours);
    let limit = limit.unwrap_or(config.report.default_limit);
    let since = Utc::now() - Duration::hours(i64::from(hours));

    let storage = SqliteStorage::new(config.storage.clone());
    storage.initialize().await?;
    let count = storage.error_count(since).await?;
    let errors = storage.recent_errors(since, limit).await?;
    storage.close().await?;

    let use_color = !plain && std::io::stdout().is_terminal();
    print_errors(hours, count, &errors, use_color);
    Ok(())
}

/// Run the `crosspost stats` command.
pub async fn run_stats(config: &CrosspostConfig, plain: bool) -> Result<(), CrosspostError> {
    let storage = SqliteStorage::new(config.storage.clone());
    storage.initialize().await?;
    let stats = storage.daily_stats().await?;
    storage.close().await?;

    let use_color = !plain && std::io::stdout().is_terminal();
    print_stats(&stats, use_color);
    Ok(())
}

fn print_errors(hours: u32, count: i64, errors: &[ErrorRecord], use_color: bool) {
    println!();
    println!("  crosspost errors (last {hours}h)");
    println!("  {}", "-".repeat(35));

    let summary = format!("{count} error(s)");
    if use_color {
        use colored::Colorize;
        if count == 0 {
            println!("    {} {}", "✓".green(), summary.green());
        } else {
            println!("    {} {}", "✗".red(), summary.red());
        }
    } else {
        println!("    {summary}");
    }

    if !errors.is_empty() {
        println!();
        for record in errors {
            println!("    {}", format_error_line(record));
        }
    }
    println!();
}

fn print_stats(stats: &[DailyStats], use_color: bool) {
    println!();
    println!("  crosspost stats");
    println!("  {}", "-".repeat(35));

    if stats.is_empty() {
        println!("    no posts recorded");
        println!();
        return;
    }

    let header = format!(
        "{:<12} {:>7} {:>9} {:>7}",
        "day", "posts", "channels", "media"
    );
    if use_color {
        use colored::Colorize;
        println!("    {}", header.bold());
    } else {
        println!("    {header}");
    }
    for day in stats {
        println!("    {}", format_stats_line(day));
    }
    println!();
}

fn format_error_line(record: &ErrorRecord) -> String {
    format!(
        "{}  {:<10} {:<12} {}",
        record.occurred_at.format("%Y-%m-%d %H:%M:%S"),
        record.source_message_id.as_deref().unwrap_or("-"),
        record.error_type,
        shorten(&record.message, MESSAGE_WIDTH)
    )
}

fn format_stats_line(day: &DailyStats) -> String {
    format!(
        "{:<12} {:>7} {:>9} {:>7}",
        day.day, day.post_count, day.channel_count, day.media_count
    )
}

fn shorten(text: &str, width: usize) -> String {
    let single_line = text.replace('\n', " ");
    if single_line.chars().count() <= width {
        return single_line;
    }
    let cut: String = single_line.chars().take(width.saturating_sub(1)).collect();
    format!("{cut}…")
}
