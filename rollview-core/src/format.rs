//! Formatting helpers for human-readable summaries.

use crate::types::{ThreadItem, Turn};
use chrono::{DateTime, Utc};

/// Format Unix seconds as `YYYY-MM-DD HH:MM:SS UTC`, or `-` if out of range.
pub fn format_unix_seconds(secs: i64) -> String {
    match DateTime::<Utc>::from_timestamp(secs, 0) {
        Some(ts) => ts.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        None => "-".to_string(),
    }
}

/// Format a span of seconds compactly (e.g., "1h 5m", "42s").
pub fn format_duration_secs(secs: i64) -> String {
    let secs = secs.max(0);
    if secs < 60 {
        format!("{secs}s")
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    }
}

/// Shorten text to at most `max_chars` characters, single line.
pub fn truncate_preview(text: &str, max_chars: usize) -> String {
    let line = text.lines().next().unwrap_or_default();
    if line.chars().count() <= max_chars && line.len() == text.trim_end().len() {
        return line.to_string();
    }
    let kept: String = line.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{}...", kept.trim_end())
}

/// One-line description of an item for listings.
pub fn describe_item(item: &ThreadItem) -> String {
    let detail = match item {
        ThreadItem::UserMessage { content, .. } => content
            .iter()
            .find_map(|input| input.text())
            .map(|text| truncate_preview(text, 60))
            .unwrap_or_else(|| format!("{} attachment(s)", content.len())),
        ThreadItem::AgentMessage { text, .. } => truncate_preview(text, 60),
        ThreadItem::Reasoning { summary, content, .. } => {
            format!("{} summary, {} content", summary.len(), content.len())
        }
        _ => String::new(),
    };

    if detail.is_empty() {
        format!("{} {}", item.id(), item.kind())
    } else {
        format!("{} {}: {}", item.id(), item.kind(), detail)
    }
}

/// One-line description of a turn for listings.
pub fn describe_turn(index: usize, turn: &Turn) -> String {
    let mut line = format!(
        "turn {} [{}] {} ({} items)",
        index + 1,
        turn.status,
        turn.id,
        turn.items.len()
    );
    if let Some(error) = &turn.error {
        line.push_str(&format!(": {}", error.message));
    }
    line
}
